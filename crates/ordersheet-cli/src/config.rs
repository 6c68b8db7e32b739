//! Connection settings resolution: flags over the YAML file over the environment.

use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::Args;
use ordersheet_db::{ConnectionConfig, Driver};
use serde::Deserialize;

/// Connection overrides shared by the command line and the `--config` file.
#[derive(Args, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionArgs {
    /// Database driver: mysql or libsql
    #[arg(long, global = true)]
    pub driver: Option<String>,

    /// Database host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Database port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Database user
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Database password (libsql: remote auth token)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Database name (libsql: file path or remote URL)
    #[arg(long, global = true)]
    pub database: Option<String>,
}

impl ConnectionArgs {
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("invalid connection config")
    }

    pub fn apply(&self, config: &mut ConnectionConfig) -> anyhow::Result<()> {
        if let Some(driver) = &self.driver {
            config.driver = driver.parse::<Driver>()?;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(database) = &self.database {
            config.database = Some(database.clone());
        }
        Ok(())
    }
}

pub fn resolve(flags: &ConnectionArgs, file: Option<&Path>) -> anyhow::Result<ConnectionConfig> {
    let mut config = ConnectionConfig::from_env().context("invalid DATABASE_* environment")?;

    if let Some(path) = file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        ConnectionArgs::from_yaml(&text)
            .with_context(|| format!("in config file {}", path.display()))?
            .apply(&mut config)?;
    }

    flags.apply(&mut config)?;
    Ok(config)
}
