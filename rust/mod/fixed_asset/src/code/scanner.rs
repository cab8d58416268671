use std::sync::Arc;

use assetreg_core::ServiceError;
use assetreg_sql::{SQLError, SQLStore, Value};
use tracing::debug;

use super::format::CodeFormat;

/// Highest numeric suffix among `codes` for `format`, or 0 if none parse.
///
/// Codes that are not `prefix + digits` (legacy or hand-typed values) are
/// skipped.
pub fn max_suffix<'a, I>(format: &CodeFormat, codes: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    codes
        .into_iter()
        .filter_map(|code| {
            let n = format.parse_suffix(code);
            if n.is_none() {
                debug!(prefix = format.prefix(), code, "ignoring malformed code");
            }
            n
        })
        .max()
        .unwrap_or(0)
}

/// A collection holding unique human-readable codes.
pub trait CodeStore: Send + Sync {
    /// All stored codes starting with `prefix` (case-sensitive).
    fn codes_with_prefix(&self, prefix: &str) -> Result<Vec<String>, ServiceError>;

    /// Exact-match existence check.
    fn contains(&self, code: &str) -> Result<bool, ServiceError>;

    /// Whether a failed write was rejected by the store's uniqueness
    /// constraint on the code.
    fn is_duplicate(&self, err: &SQLError) -> bool;
}

/// A UNIQUE text column in a SQL table.
#[derive(Clone)]
pub struct CodeColumn {
    sql: Arc<dyn SQLStore>,
    table: &'static str,
    column: &'static str,
}

impl CodeColumn {
    pub fn new(sql: Arc<dyn SQLStore>, table: &'static str, column: &'static str) -> Self {
        Self { sql, table, column }
    }
}

impl CodeStore for CodeColumn {
    fn codes_with_prefix(&self, prefix: &str) -> Result<Vec<String>, ServiceError> {
        // LIKE folds ASCII case, substr does not.
        let sql = format!(
            "SELECT {col} AS code FROM {table} WHERE substr({col}, 1, length(?1)) = ?1",
            col = self.column,
            table = self.table,
        );
        let rows = self
            .sql
            .query(&sql, &[Value::from(prefix)])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("code").map(str::to_string))
            .collect())
    }

    fn contains(&self, code: &str) -> Result<bool, ServiceError> {
        let sql = format!(
            "SELECT COUNT(*) AS cnt FROM {} WHERE {} = ?1",
            self.table, self.column
        );
        let rows = self
            .sql
            .query(&sql, &[Value::from(code)])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) > 0)
    }

    fn is_duplicate(&self, err: &SQLError) -> bool {
        err.is_unique_violation(self.table, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::format::ASSET_CODE;
    use assetreg_sql::SqliteStore;

    fn column(codes: &[&str]) -> CodeColumn {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        sql.exec("CREATE TABLE items (code TEXT NOT NULL UNIQUE)", &[]).unwrap();
        for c in codes {
            sql.exec("INSERT INTO items (code) VALUES (?1)", &[Value::from(*c)]).unwrap();
        }
        CodeColumn::new(sql, "items", "code")
    }

    fn scan(store: &CodeColumn) -> u64 {
        let codes = store.codes_with_prefix(ASSET_CODE.prefix()).unwrap();
        max_suffix(&ASSET_CODE, codes.iter().map(String::as_str))
    }

    #[test]
    fn takes_numeric_max_not_lexical() {
        assert_eq!(max_suffix(&ASSET_CODE, ["TS00001", "TS00007", "TS00003"]), 7);
        assert_eq!(max_suffix(&ASSET_CODE, ["TS9", "TS00010"]), 10);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(max_suffix(&ASSET_CODE, []), 0);
        assert_eq!(max_suffix(&ASSET_CODE, ["TSxyz"]), 0);
    }

    #[test]
    fn skips_malformed() {
        assert_eq!(max_suffix(&ASSET_CODE, ["TS00001", "TSxyz", "TSA0002"]), 1);
    }

    #[test]
    fn column_scan_is_case_sensitive() {
        let store = column(&["TS00002", "ts00009", "GT00050", "XTS00070"]);
        assert_eq!(scan(&store), 2);
    }

    #[test]
    fn column_scan_over_mixed_codes() {
        let store = column(&["TS00001", "TS00007", "TS00003", "TSxyz", "LEGACY-1"]);
        assert_eq!(scan(&store), 7);
    }

    #[test]
    fn column_contains_is_exact() {
        let store = column(&["TS00001"]);
        assert!(store.contains("TS00001").unwrap());
        assert!(!store.contains("ts00001").unwrap());
        assert!(!store.contains("TS0000").unwrap());
    }

    #[test]
    fn column_recognizes_its_unique_violation() {
        let store = column(&["TS00001"]);
        let err = store
            .sql
            .exec("INSERT INTO items (code) VALUES ('TS00001')", &[])
            .unwrap_err();
        assert!(store.is_duplicate(&err));
        assert!(!store.is_duplicate(&SQLError::Execution("boom".into())));
    }
}
