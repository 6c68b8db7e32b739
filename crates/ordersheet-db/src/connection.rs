//! Per-call database sessions.
//!
//! A [`Session`] owns one physical connection for the duration of a single
//! operation. Dropping it releases the connection; [`Session::close`] does the
//! same but lets the driver say goodbye to the server first.

use libsql::{Builder, params_from_iter};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlValueRef};
use sqlx::{Column, Connection, Executor, Row as _, Statement, TypeInfo, Value, ValueRef};
use tracing::{debug, warn};

use crate::config::{ConnectionConfig, Driver};
use crate::payload::{DbValue, TabularPayload};
use crate::sql::Dialect;
use crate::{Error, Result};

pub struct Session {
    backend: SessionBackend,
    dialect: Dialect,
}

enum SessionBackend {
    MySql(MySqlConnection),
    Libsql {
        connection: libsql::Connection,
        // Keep the Database alive for as long as the connection is in use.
        _database: libsql::Database,
    },
}

impl Session {
    /// Open a fresh physical connection for `config`.
    pub async fn open(config: &ConnectionConfig) -> Result<Self> {
        let backend = match config.driver {
            Driver::MySql => SessionBackend::MySql(connect_mysql(config).await?),
            Driver::Libsql => {
                let database = build_libsql(config).await?;
                let connection = database
                    .connect()
                    .map_err(|source| connection_error(config, source))?;
                SessionBackend::Libsql {
                    connection,
                    _database: database,
                }
            }
        };
        debug!(endpoint = %config.endpoint(), "opened database session");

        Ok(Self {
            backend,
            dialect: config.dialect(),
        })
    }

    /// Run a row-returning statement and materialize every row.
    ///
    /// Column names come from the driver's statement metadata, so an empty
    /// result still reports its columns.
    pub async fn query(&mut self, sql: &str) -> Result<TabularPayload> {
        debug!(%sql, "running query");
        match &mut self.backend {
            SessionBackend::MySql(conn) => {
                let statement = conn
                    .prepare(sql)
                    .await
                    .map_err(|source| Error::statement(sql, source))?;
                let columns: Vec<String> = statement
                    .columns()
                    .iter()
                    .map(|column| column.name().to_string())
                    .collect();
                let rows = statement
                    .query()
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(|source| Error::statement(sql, source))?;

                let mut payload = TabularPayload::new(columns)?;
                for row in &rows {
                    let mut cells = Vec::with_capacity(row.len());
                    for idx in 0..row.len() {
                        let raw = row
                            .try_get_raw(idx)
                            .map_err(|source| Error::statement(sql, source))?;
                        cells.push(mysql_value_to_db(raw).map_err(|source| Error::statement(sql, source))?);
                    }
                    payload.push_row(cells)?;
                }
                Ok(payload)
            }
            SessionBackend::Libsql { connection, .. } => {
                let mut rows = connection
                    .query(sql, ())
                    .await
                    .map_err(|source| Error::statement(sql, source))?;

                let column_count = rows.column_count();
                let columns: Vec<String> = (0..column_count)
                    .map(|idx| rows.column_name(idx).unwrap_or_default().to_string())
                    .collect();
                let mut payload = TabularPayload::new(columns)?;

                while let Some(row) = rows
                    .next()
                    .await
                    .map_err(|source| Error::statement(sql, source))?
                {
                    let mut cells = Vec::with_capacity(column_count.max(0) as usize);
                    for idx in 0..column_count {
                        let value = row
                            .get_value(idx)
                            .map_err(|source| Error::statement(sql, source))?;
                        cells.push(libsql_value_to_db(value));
                    }
                    payload.push_row(cells)?;
                }
                Ok(payload)
            }
        }
    }

    /// Run a statement without parameters and return the affected-row count.
    pub async fn execute(&mut self, sql: &str) -> Result<u64> {
        debug!(%sql, "executing statement");
        match &mut self.backend {
            SessionBackend::MySql(conn) => conn
                .execute(sql)
                .await
                .map(|done| done.rows_affected())
                .map_err(|source| Error::statement(sql, source)),
            SessionBackend::Libsql { connection, .. } => connection
                .execute(sql, ())
                .await
                .map_err(|source| Error::statement(sql, source)),
        }
    }

    /// Run a parameterised statement with positional values.
    pub async fn execute_with(&mut self, sql: &str, params: &[DbValue]) -> Result<u64> {
        match &mut self.backend {
            SessionBackend::MySql(conn) => {
                let mut query = sqlx::query(sql);
                for value in params {
                    query = match value {
                        DbValue::Null => query.bind(None::<String>),
                        DbValue::Integer(value) => query.bind(*value),
                        DbValue::Decimal(value) => query.bind(*value),
                        DbValue::Boolean(value) => query.bind(*value),
                        DbValue::String(value) => query.bind(value.clone()),
                    };
                }
                query
                    .execute(&mut *conn)
                    .await
                    .map(|done| done.rows_affected())
                    .map_err(|source| Error::statement(sql, source))
            }
            SessionBackend::Libsql { connection, .. } => {
                let values: Vec<libsql::Value> = params.iter().map(db_value_to_libsql).collect();
                connection
                    .execute(sql, params_from_iter(values))
                    .await
                    .map_err(|source| Error::statement(sql, source))
            }
        }
    }

    pub async fn begin(&mut self) -> Result<()> {
        let sql = self.dialect.begin();
        self.execute(sql).await.map(|_| ())
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.execute("COMMIT").await.map(|_| ())
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.execute("ROLLBACK").await.map(|_| ())
    }

    /// Release the connection. Close failures are logged, never returned: the
    /// connection is gone either way.
    pub async fn close(self) {
        match self.backend {
            SessionBackend::MySql(conn) => {
                if let Err(err) = conn.close().await {
                    warn!(error = %err, "failed to close mysql connection cleanly");
                }
            }
            SessionBackend::Libsql { connection, .. } => drop(connection),
        }
        debug!("closed database session");
    }
}

async fn connect_mysql(config: &ConnectionConfig) -> Result<MySqlConnection> {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password);
    if let Some(database) = &config.database {
        options = options.database(database);
    }

    MySqlConnection::connect_with(&options)
        .await
        .map_err(|source| connection_error(config, source))
}

async fn build_libsql(config: &ConnectionConfig) -> Result<libsql::Database> {
    let url = config
        .database
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| Error::Config {
            details: "libsql driver needs a database path or URL".to_string(),
        })?;

    if is_remote_url(url) {
        if config.password.is_empty() {
            return Err(Error::Config {
                details: "an auth token is required for remote libsql databases".to_string(),
            });
        }
        Builder::new_remote(url.to_string(), config.password.clone())
            .build()
            .await
            .map_err(|source| connection_error(config, source))
    } else {
        let path = url.strip_prefix("file:").unwrap_or(url);
        Builder::new_local(path)
            .build()
            .await
            .map_err(|source| connection_error(config, source))
    }
}

fn connection_error(config: &ConnectionConfig, source: impl Into<crate::DriverError>) -> Error {
    Error::Connection {
        endpoint: config.endpoint(),
        source: source.into(),
    }
}

fn is_remote_url(url: &str) -> bool {
    url.starts_with("libsql://") || url.starts_with("https://") || url.starts_with("http://")
}

fn mysql_value_to_db(value: MySqlValueRef<'_>) -> std::result::Result<DbValue, sqlx::Error> {
    if value.is_null() {
        return Ok(DbValue::Null);
    }
    let type_name = value.type_info().name().to_string();
    let owned = ValueRef::to_owned(&value);

    let cell = match type_name.as_str() {
        "BOOLEAN" => DbValue::Boolean(owned.try_decode()?),
        // YEAR is not in sqlx's integer compatibility list but decodes like one.
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            DbValue::Integer(owned.try_decode_unchecked()?)
        }
        name if name.ends_with("UNSIGNED") => unsigned_cell(owned.try_decode()?),
        "BIT" => unsigned_cell(bit_value(&owned.try_decode_unchecked::<Vec<u8>>()?)),
        "FLOAT" => DbValue::Decimal(f64::from(owned.try_decode::<f32>()?)),
        "DOUBLE" => DbValue::Decimal(owned.try_decode()?),
        "DATE" => DbValue::String(owned.try_decode::<chrono::NaiveDate>()?.to_string()),
        "DATETIME" | "TIMESTAMP" => {
            DbValue::String(owned.try_decode::<chrono::NaiveDateTime>()?.to_string())
        }
        "TIME" => DbValue::String(owned.try_decode::<chrono::NaiveTime>()?.to_string()),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "GEOMETRY" => {
            let bytes: Vec<u8> = owned.try_decode_unchecked()?;
            DbValue::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        // DECIMAL, character types, JSON, ENUM and friends arrive as text.
        _ => DbValue::String(owned.try_decode_unchecked()?),
    };
    Ok(cell)
}

/// Values past `i64::MAX` fall back to their decimal text.
fn unsigned_cell(value: u64) -> DbValue {
    i64::try_from(value).map_or_else(|_| DbValue::String(value.to_string()), DbValue::Integer)
}

/// BIT(n) arrives as big-endian bytes, at most eight of them.
fn bit_value(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

fn libsql_value_to_db(value: libsql::Value) -> DbValue {
    match value {
        libsql::Value::Null => DbValue::Null,
        libsql::Value::Integer(value) => DbValue::Integer(value),
        libsql::Value::Real(value) => DbValue::Decimal(value),
        libsql::Value::Text(value) => DbValue::String(value),
        libsql::Value::Blob(value) => DbValue::String(String::from_utf8_lossy(&value).into_owned()),
    }
}

fn db_value_to_libsql(value: &DbValue) -> libsql::Value {
    match value {
        DbValue::String(value) => libsql::Value::Text(value.clone()),
        DbValue::Integer(value) => libsql::Value::Integer(*value),
        DbValue::Decimal(value) => libsql::Value::Real(*value),
        DbValue::Boolean(value) => libsql::Value::Integer(i64::from(*value)),
        DbValue::Null => libsql::Value::Null,
    }
}
