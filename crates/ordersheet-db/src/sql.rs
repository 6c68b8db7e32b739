//! Statement text builders.
//!
//! Identifiers and filter fragments are interpolated verbatim. Values only
//! travel as bound parameters in upserts; delete key lists are rendered as
//! literals.

use crate::payload::DbValue;
use crate::{Error, Result};

/// SQL dialect spoken by the active driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Sqlite,
}

impl Dialect {
    pub(crate) fn begin(self) -> &'static str {
        match self {
            Dialect::MySql => "START TRANSACTION",
            Dialect::Sqlite => "BEGIN",
        }
    }
}

/// `SELECT <columns | *> FROM <table>[ <filter>]`.
pub fn select(table: &str, columns: Option<&[String]>, filter: Option<&str>) -> Result<String> {
    let projection = match columns {
        Some([]) => {
            return Err(Error::validation(format!(
                "column list for '{table}' cannot be empty"
            )));
        }
        Some(columns) => columns.join(", "),
        None => "*".to_string(),
    };

    let mut sql = format!("SELECT {projection} FROM {table}");
    if let Some(filter) = filter {
        sql.push(' ');
        sql.push_str(filter);
    }
    Ok(sql)
}

/// Parameterised insert that overwrites every column on key conflict.
pub fn upsert(dialect: Dialect, table: &str, columns: &[String]) -> Result<String> {
    if columns.is_empty() {
        return Err(Error::validation(format!(
            "upsert into '{table}' needs at least one column"
        )));
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let assignments: Vec<String> = columns
        .iter()
        .map(|column| match dialect {
            Dialect::MySql => format!("{column} = VALUES({column})"),
            Dialect::Sqlite => format!("{column} = excluded.{column}"),
        })
        .collect();

    let conflict = match dialect {
        Dialect::MySql => "ON DUPLICATE KEY UPDATE",
        Dialect::Sqlite => "ON CONFLICT DO UPDATE SET",
    };

    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders}) {conflict} {};",
        columns.join(", "),
        assignments.join(", ")
    ))
}

/// `DELETE FROM <table> WHERE <key> IN (<literals>)`.
pub fn delete_in(table: &str, key_column: &str, literals: &[String]) -> String {
    format!(
        "DELETE FROM {table} WHERE {key_column} IN ({})",
        literals.join(", ")
    )
}

/// SQLite has no TRUNCATE; an unqualified DELETE is its equivalent.
pub fn truncate(dialect: Dialect, table: &str) -> String {
    match dialect {
        Dialect::MySql => format!("TRUNCATE {table};"),
        Dialect::Sqlite => format!("DELETE FROM {table};"),
    }
}

/// Render a key value for an IN list. Strings are quoted but not escaped.
pub fn literal(value: &DbValue) -> Result<String> {
    match value {
        DbValue::Null => Err(Error::validation(
            "null values cannot be used as delete keys",
        )),
        DbValue::String(value) => Ok(format!("'{value}'")),
        DbValue::Integer(value) => Ok(value.to_string()),
        DbValue::Decimal(value) => Ok(value.to_string()),
        DbValue::Boolean(true) => Ok("TRUE".to_string()),
        DbValue::Boolean(false) => Ok("FALSE".to_string()),
    }
}

/// Raw statements are treated as reads whenever the text contains `SELECT`.
///
/// The match is case-sensitive and positional-blind, so an `UPDATE` whose
/// literal contains `SELECTED` is routed down the read path as well.
pub fn is_read_query(query: &str) -> bool {
    query.contains("SELECT")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_select_all_columns() {
        assert_eq!(select("orders", None, None).unwrap(), "SELECT * FROM orders");
    }

    #[test]
    fn test_select_columns_and_filter() {
        let sql = select(
            "orders",
            Some(&columns(&["id", "total"])),
            Some("WHERE id > 1 ORDER BY id DESC"),
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT id, total FROM orders WHERE id > 1 ORDER BY id DESC"
        );
    }

    #[test]
    fn test_select_rejects_empty_column_list() {
        let err = select("orders", Some(&[]), None).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_mysql_upsert() {
        let sql = upsert(Dialect::MySql, "orders", &columns(&["id", "total"])).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO orders (id, total) VALUES (?, ?) \
             ON DUPLICATE KEY UPDATE id = VALUES(id), total = VALUES(total);"
        );
    }

    #[test]
    fn test_sqlite_upsert() {
        let sql = upsert(Dialect::Sqlite, "orders", &columns(&["id"])).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO orders (id) VALUES (?) ON CONFLICT DO UPDATE SET id = excluded.id;"
        );
    }

    #[test]
    fn test_upsert_requires_columns() {
        assert!(upsert(Dialect::MySql, "orders", &[]).is_err());
    }

    #[test]
    fn test_delete_in() {
        let literals = vec![
            literal(&DbValue::Integer(1)).unwrap(),
            literal(&DbValue::String("A-2".to_string())).unwrap(),
        ];
        assert_eq!(
            delete_in("orders", "id", &literals),
            "DELETE FROM orders WHERE id IN (1, 'A-2')"
        );
    }

    #[test]
    fn test_null_literal_rejected() {
        let err = literal(&DbValue::Null).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_truncate_per_dialect() {
        assert_eq!(truncate(Dialect::MySql, "orders"), "TRUNCATE orders;");
        assert_eq!(truncate(Dialect::Sqlite, "orders"), "DELETE FROM orders;");
    }

    #[test]
    fn test_read_classification_is_literal_substring() {
        assert!(is_read_query("SELECT 1"));
        assert!(is_read_query("UPDATE t SET note='SELECTED'"));
        assert!(!is_read_query("select 1"));
        assert!(!is_read_query("DELETE FROM t"));
    }
}
