//! Endpoint credentials and driver selection.

use std::fmt;
use std::str::FromStr;

use crate::sql::Dialect;
use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_USER: &str = "root";

/// Database driver used to open sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Driver {
    /// MySQL server over the network.
    #[default]
    MySql,
    /// libsql: a local SQLite-compatible file, or a remote libsql URL.
    Libsql,
}

impl Driver {
    pub fn dialect(self) -> Dialect {
        match self {
            Driver::MySql => Dialect::MySql,
            Driver::Libsql => Dialect::Sqlite,
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::MySql => write!(f, "mysql"),
            Driver::Libsql => write!(f, "libsql"),
        }
    }
}

impl FromStr for Driver {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Driver::MySql),
            "libsql" | "sqlite" => Ok(Driver::Libsql),
            other => Err(Error::Config {
                details: format!("unknown database driver '{other}'"),
            }),
        }
    }
}

/// Credentials for a single database endpoint.
///
/// For [`Driver::Libsql`], `database` holds the file path or remote URL and
/// `password` doubles as the auth token for remote URLs.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub driver: Driver,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// MySQL endpoint with explicit credentials.
    pub fn mysql(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: Option<String>,
    ) -> Self {
        Self {
            driver: Driver::MySql,
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database,
        }
    }

    /// Local libsql database file.
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            driver: Driver::Libsql,
            database: Some(path.into()),
            ..Self::default()
        }
    }

    /// Remote libsql database.
    pub fn remote(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            driver: Driver::Libsql,
            password: auth_token.into(),
            database: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Read `DATABASE_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from a variable lookup, falling back to defaults for
    /// anything unset.
    ///
    /// Recognised keys: `DATABASE_DRIVER`, `DATABASE_HOST`, `DATABASE_PORT`,
    /// `DATABASE_USER`, `DATABASE_PASSWORD`, `DATABASE_NAME`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(driver) = lookup("DATABASE_DRIVER") {
            config.driver = driver.parse()?;
        }
        if let Some(host) = lookup("DATABASE_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("DATABASE_PORT") {
            config.port = port.trim().parse().map_err(|_| Error::Config {
                details: format!("DATABASE_PORT must be a port number, got '{port}'"),
            })?;
        }
        if let Some(user) = lookup("DATABASE_USER") {
            config.user = user;
        }
        if let Some(password) = lookup("DATABASE_PASSWORD") {
            config.password = password;
        }
        config.database = lookup("DATABASE_NAME").filter(|name| !name.trim().is_empty());

        Ok(config)
    }

    pub fn dialect(&self) -> Dialect {
        self.driver.dialect()
    }

    /// Printable endpoint description that never includes the password.
    pub fn endpoint(&self) -> String {
        match self.driver {
            Driver::MySql => format!(
                "mysql://{}@{}:{}/{}",
                self.user,
                self.host,
                self.port,
                self.database.as_deref().unwrap_or("")
            ),
            Driver::Libsql => format!("libsql:{}", self.database.as_deref().unwrap_or("")),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: Driver::MySql,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: String::new(),
            database: None,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}
