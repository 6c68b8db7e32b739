//! Cell values and the column/row payload shared by reads and writes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Database value used by read and write operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DbValue {
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Null,
}

impl DbValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DbValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DbValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DbValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Value as bound into an upsert: nulls and integers pass through,
    /// everything else is sent as its string form.
    pub fn to_bound(&self) -> DbValue {
        match self {
            DbValue::Null => DbValue::Null,
            DbValue::Integer(value) => DbValue::Integer(*value),
            other => DbValue::String(other.to_string()),
        }
    }
}

impl fmt::Display for DbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbValue::String(value) => f.write_str(value),
            DbValue::Integer(value) => write!(f, "{value}"),
            DbValue::Decimal(value) => write!(f, "{value}"),
            DbValue::Boolean(value) => write!(f, "{value}"),
            DbValue::Null => f.write_str("NULL"),
        }
    }
}

impl From<&str> for DbValue {
    fn from(value: &str) -> Self {
        DbValue::String(value.to_string())
    }
}

impl From<String> for DbValue {
    fn from(value: String) -> Self {
        DbValue::String(value)
    }
}

impl From<i64> for DbValue {
    fn from(value: i64) -> Self {
        DbValue::Integer(value)
    }
}

impl From<f64> for DbValue {
    fn from(value: f64) -> Self {
        DbValue::Decimal(value)
    }
}

impl From<bool> for DbValue {
    fn from(value: bool) -> Self {
        DbValue::Boolean(value)
    }
}

impl<T: Into<DbValue>> From<Option<T>> for DbValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DbValue::Null, Into::into)
    }
}

/// Single record keyed by column name.
pub type Row = BTreeMap<String, DbValue>;

/// Ordered, uniquely named columns plus ordered rows of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabularPayload {
    columns: Vec<String>,
    rows: Vec<Vec<DbValue>>,
}

impl TabularPayload {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(Error::validation(format!(
                    "duplicate column name '{column}'"
                )));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    pub fn with_row<I, V>(mut self, row: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<DbValue>,
    {
        self.push_row(row.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    pub fn push_row(&mut self, row: Vec<DbValue>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::validation(format!(
                "row has {} values but payload has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<DbValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&DbValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&DbValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|cells| &cells[idx])
    }

    /// Rows as name-keyed records.
    pub fn records(&self) -> impl Iterator<Item = Row> + '_ {
        self.rows.iter().map(|cells| {
            self.columns
                .iter()
                .cloned()
                .zip(cells.iter().cloned())
                .collect()
        })
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<DbValue>>) {
        (self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> TabularPayload {
        TabularPayload::new(["id", "total"])
            .unwrap()
            .with_row([DbValue::Integer(1), DbValue::from("10.50")])
            .unwrap()
            .with_row([DbValue::Integer(2), DbValue::Null])
            .unwrap()
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = TabularPayload::new(["id", "id"]).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_row_width_checked() {
        let mut payload = TabularPayload::new(["id", "total"]).unwrap();
        let err = payload.push_row(vec![DbValue::Integer(1)]).unwrap_err();
        assert!(err.to_string().contains("1 values"));
    }

    #[test]
    fn test_column_access() {
        let payload = orders();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.column_index("total"), Some(1));
        assert_eq!(
            payload.column("id").unwrap(),
            vec![&DbValue::Integer(1), &DbValue::Integer(2)]
        );
        assert_eq!(payload.get(1, "total"), Some(&DbValue::Null));
        assert!(payload.column("missing").is_none());
    }

    #[test]
    fn test_records() {
        let records: Vec<Row> = orders().records().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].get("total"),
            Some(&DbValue::String("10.50".to_string()))
        );
    }

    #[test]
    fn test_bound_coercion() {
        assert_eq!(DbValue::Null.to_bound(), DbValue::Null);
        assert_eq!(DbValue::Integer(7).to_bound(), DbValue::Integer(7));
        assert_eq!(
            DbValue::Decimal(2.75).to_bound(),
            DbValue::String("2.75".to_string())
        );
        assert_eq!(
            DbValue::Boolean(true).to_bound(),
            DbValue::String("true".to_string())
        );
    }
}
