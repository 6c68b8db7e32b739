//! Table-level operations against one endpoint.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, error, info, warn};

use crate::config::ConnectionConfig;
use crate::connection::Session;
use crate::payload::{DbValue, TabularPayload};
use crate::{Error, Result, sql};

/// Projection and filter for [`DataAccess::fetch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub columns: Option<Vec<String>>,
    /// Appended verbatim after the `FROM` clause, e.g. `WHERE id > 3 ORDER BY id`.
    pub filter: Option<String>,
}

impl FetchOptions {
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Result of a write whose failures are reported rather than raised.
///
/// [`WriteOutcome::succeeded`] carries the boolean contract; the statement
/// error, when there was one, is kept alongside it.
#[derive(Debug)]
pub struct WriteOutcome {
    succeeded: bool,
    rows_affected: u64,
    error: Option<Error>,
}

impl WriteOutcome {
    fn completed(succeeded: bool, rows_affected: u64) -> Self {
        Self {
            succeeded,
            rows_affected,
            error: None,
        }
    }

    fn failed(error: Error) -> Self {
        Self {
            succeeded: false,
            rows_affected: 0,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn into_error(self) -> Option<Error> {
        self.error
    }
}

/// Completed raw write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub rows_affected: u64,
}

impl WriteResult {
    /// Any statement that ran to completion counts as a success; the driver
    /// count is never negative once a statement has finished.
    pub fn succeeded(&self) -> bool {
        true
    }
}

/// Outcome of [`DataAccess::execute_raw`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutcome {
    Rows(TabularPayload),
    Write(WriteResult),
}

/// Access to one database endpoint. Holds configuration only; every call
/// opens and closes its own session.
#[derive(Clone)]
pub struct DataAccess {
    config: ConnectionConfig,
}

impl fmt::Debug for DataAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataAccess")
            .field("endpoint", &self.config.endpoint())
            .finish_non_exhaustive()
    }
}

impl DataAccess {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Replace the user and password used by subsequent calls.
    pub fn set_credentials(&mut self, user: impl Into<String>, password: impl Into<String>) {
        self.config.user = user.into();
        self.config.password = password.into();
    }

    async fn open_session(&self) -> Result<Session> {
        Session::open(&self.config).await.inspect_err(|err| {
            error!(endpoint = %self.config.endpoint(), error = %err, "failed to connect");
        })
    }

    /// `SELECT` the requested columns (or `*`) from `table`.
    ///
    /// Column names and order in the result follow what the database reports.
    pub async fn fetch(&self, table: &str, options: &FetchOptions) -> Result<TabularPayload> {
        let statement = sql::select(table, options.columns.as_deref(), options.filter.as_deref())?;

        let mut session = self.open_session().await?;
        let result = session.query(&statement).await;
        session.close().await;

        let payload = result?;
        debug!(table, rows = payload.len(), "fetched rows");
        Ok(payload)
    }

    /// Insert every row of `payload`, overwriting rows that collide on a key.
    ///
    /// Integers and nulls are bound as-is; every other cell is bound as its
    /// string form, so `2.75` is written as `"2.75"`. Statement failures roll
    /// the whole batch back and come back as an unsuccessful outcome.
    pub async fn upsert(&self, table: &str, payload: &TabularPayload) -> Result<WriteOutcome> {
        let statement = sql::upsert(self.config.dialect(), table, payload.columns())?;
        let rows: Vec<Vec<DbValue>> = payload
            .rows()
            .iter()
            .map(|row| row.iter().map(DbValue::to_bound).collect())
            .collect();

        let mut session = self.open_session().await?;
        let result = upsert_rows(&mut session, &statement, &rows).await;
        session.close().await;

        match result {
            Ok(affected) => {
                info!(table, rows = rows.len(), affected, "upsert committed");
                Ok(WriteOutcome::completed(true, affected))
            }
            Err(err) => {
                error!(table, error = %err, "database update failed");
                Ok(WriteOutcome::failed(err))
            }
        }
    }

    /// Delete rows whose `key_column` matches any key value in `payload`.
    ///
    /// Succeeds when the database reports exactly one deleted row per distinct
    /// key. Null keys and an unknown key column are rejected before any SQL is
    /// built. A payload without rows deletes nothing and never connects.
    pub async fn delete(
        &self,
        table: &str,
        payload: &TabularPayload,
        key_column: &str,
    ) -> Result<WriteOutcome> {
        let keys = payload.column(key_column).ok_or_else(|| {
            Error::validation(format!("payload has no key column '{key_column}'"))
        })?;
        let literals = keys
            .into_iter()
            .map(sql::literal)
            .collect::<Result<Vec<String>>>()?;
        if literals.is_empty() {
            debug!(table, "no delete keys given, nothing to do");
            return Ok(WriteOutcome::completed(true, 0));
        }
        let expected = literals.iter().collect::<BTreeSet<_>>().len() as u64;
        let statement = sql::delete_in(table, key_column, &literals);

        let mut session = self.open_session().await?;
        let result = execute_in_transaction(&mut session, &statement).await;
        session.close().await;

        match result {
            Ok(affected) => {
                if affected != expected {
                    warn!(table, affected, expected, "delete matched an unexpected number of rows");
                }
                Ok(WriteOutcome::completed(affected == expected, affected))
            }
            Err(err) => {
                error!(table, error = %err, "delete failed; check for invalid key values");
                Ok(WriteOutcome::failed(err))
            }
        }
    }

    /// Empty `table`.
    ///
    /// Returns whether the driver reported zero affected rows, which is the
    /// usual TRUNCATE convention. It is not a check that the table is empty.
    pub async fn truncate(&self, table: &str) -> Result<bool> {
        let statement = sql::truncate(self.config.dialect(), table);

        let mut session = self.open_session().await?;
        let result = execute_in_transaction(&mut session, &statement).await;
        session.close().await;

        let affected = result?;
        debug!(table, affected, "truncate finished");
        Ok(affected == 0)
    }

    /// Run arbitrary SQL. Text containing `SELECT` is read back as rows;
    /// anything else is executed and committed.
    pub async fn execute_raw(&self, query: &str) -> Result<RawOutcome> {
        let mut session = self.open_session().await?;
        let result = if sql::is_read_query(query) {
            session.query(query).await.map(RawOutcome::Rows)
        } else {
            execute_in_transaction(&mut session, query)
                .await
                .map(|rows_affected| RawOutcome::Write(WriteResult { rows_affected }))
        };
        session.close().await;
        result
    }
}

async fn upsert_rows(session: &mut Session, statement: &str, rows: &[Vec<DbValue>]) -> Result<u64> {
    session.begin().await?;
    let mut affected = 0u64;
    for row in rows {
        match session.execute_with(statement, row).await {
            Ok(count) => affected += count,
            Err(err) => {
                rollback(session).await;
                return Err(err);
            }
        }
    }
    session.commit().await?;
    Ok(affected)
}

async fn execute_in_transaction(session: &mut Session, statement: &str) -> Result<u64> {
    session.begin().await?;
    let affected = match session.execute(statement).await {
        Ok(affected) => affected,
        Err(err) => {
            rollback(session).await;
            return Err(err);
        }
    };
    session.commit().await?;
    Ok(affected)
}

async fn rollback(session: &mut Session) {
    if let Err(err) = session.rollback().await {
        warn!(error = %err, "rollback failed");
    }
}
