use assetreg_core::ServiceError;
use assetreg_sql::SQLError;
use tracing::warn;

use super::format::CodeFormat;
use super::guard;
use super::scanner::{max_suffix, CodeStore};

/// Attempts made by [`Allocator::claim_next`] before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Derives the next code of a sequence from the codes already stored.
///
/// Previews are non-reserving: two calls with no write in between return
/// the same code.
pub struct Allocator<S> {
    format: CodeFormat,
    store: S,
    max_attempts: u32,
}

impl<S: CodeStore> Allocator<S> {
    pub fn new(format: CodeFormat, store: S) -> Self {
        Self {
            format,
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Bound on generated-code attempts; values below 1 are raised to 1.
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    pub fn format(&self) -> &CodeFormat {
        &self.format
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_suffix(&self) -> Result<u64, ServiceError> {
        let codes = self.store.codes_with_prefix(self.format.prefix())?;
        Ok(max_suffix(&self.format, codes.iter().map(String::as_str)))
    }

    /// Code following the current maximum.
    pub fn next_code(&self) -> Result<String, ServiceError> {
        Ok(self.format.format(self.max_suffix()?.saturating_add(1)))
    }

    /// Generate a code and write it with `insert`, regenerating when another
    /// writer takes the code first.
    ///
    /// Gives up with [`ServiceError::Conflict`] after `max_attempts` lost
    /// races. Errors other than a duplicate code are returned immediately.
    pub fn claim_next<T, F>(&self, mut insert: F) -> Result<T, ServiceError>
    where
        F: FnMut(&str) -> Result<T, SQLError>,
    {
        for attempt in 1..=self.max_attempts {
            let code = self.next_code()?;
            match guard::claim(&self.store, &code, &mut insert) {
                Err(ServiceError::DuplicateCode(taken)) => {
                    warn!(
                        code = %taken,
                        attempt,
                        max_attempts = self.max_attempts,
                        "generated code taken concurrently, retrying"
                    );
                }
                result => return result,
            }
        }
        Err(ServiceError::Conflict(format!(
            "could not allocate a unique {} code after {} attempts",
            self.format.prefix(),
            self.max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use assetreg_sql::{SQLStore, SqliteStore, Value};

    use super::*;
    use crate::code::format::ASSET_CODE;
    use crate::code::scanner::CodeColumn;

    fn setup() -> (Arc<dyn SQLStore>, Allocator<CodeColumn>) {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        sql.exec("CREATE TABLE items (code TEXT NOT NULL UNIQUE)", &[]).unwrap();
        let alloc = Allocator::new(ASSET_CODE, CodeColumn::new(sql.clone(), "items", "code"));
        (sql, alloc)
    }

    fn put(sql: &Arc<dyn SQLStore>, code: &str) -> Result<i64, SQLError> {
        sql.insert("INSERT INTO items (code) VALUES (?1)", &[Value::from(code)])
    }

    fn codes(sql: &Arc<dyn SQLStore>) -> Vec<String> {
        sql.query("SELECT code FROM items ORDER BY code", &[])
            .unwrap()
            .iter()
            .map(|r| r.get_str("code").unwrap().to_string())
            .collect()
    }

    #[test]
    fn first_code_on_empty_table() {
        let (_sql, alloc) = setup();
        assert_eq!(alloc.max_suffix().unwrap(), 0);
        assert_eq!(alloc.next_code().unwrap(), "TS00001");
    }

    #[test]
    fn next_follows_max() {
        let (sql, alloc) = setup();
        for c in ["TS00001", "TS00007", "TS00003", "TSxyz"] {
            put(&sql, c).unwrap();
        }
        assert_eq!(alloc.next_code().unwrap(), "TS00008");
    }

    #[test]
    fn preview_does_not_reserve() {
        let (sql, alloc) = setup();
        put(&sql, "TS00004").unwrap();
        let a = alloc.next_code().unwrap();
        let b = alloc.next_code().unwrap();
        assert_eq!(a, b);
        assert_eq!(codes(&sql), vec!["TS00004"]);
    }

    #[test]
    fn next_grows_past_width() {
        let (sql, alloc) = setup();
        put(&sql, "TS99999").unwrap();
        assert_eq!(alloc.next_code().unwrap(), "TS100000");
    }

    #[test]
    fn max_attempts_floor_is_one() {
        let (_sql, alloc) = setup();
        assert_eq!(alloc.max_attempts(), DEFAULT_MAX_ATTEMPTS);
        let alloc = alloc.with_max_attempts(0);
        assert_eq!(alloc.max_attempts(), 1);
    }

    #[test]
    fn claim_next_writes_generated_code() {
        let (sql, alloc) = setup();
        put(&sql, "TS00002").unwrap();
        let id = alloc.claim_next(|c| put(&sql, c)).unwrap();
        assert_eq!(id, 2);
        assert_eq!(codes(&sql), vec!["TS00002", "TS00003"]);
    }

    #[test]
    fn lost_race_retries_with_next_code() {
        let (sql, alloc) = setup();
        let mut calls = Vec::new();
        alloc
            .claim_next(|c| {
                calls.push(c.to_string());
                if calls.len() == 1 {
                    // A concurrent create computed the same code and won.
                    put(&sql, c)?;
                }
                put(&sql, c)
            })
            .unwrap();
        assert_eq!(calls, vec!["TS00001", "TS00002"]);
        assert_eq!(codes(&sql), vec!["TS00001", "TS00002"]);
    }

    #[test]
    fn exhausted_attempts_is_conflict() {
        let (sql, alloc) = setup();
        let alloc = alloc.with_max_attempts(2);
        let mut calls = 0;
        let err = alloc
            .claim_next(|c| {
                calls += 1;
                put(&sql, c)?;
                put(&sql, c)
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(calls, 2);
    }

    #[test]
    fn storage_errors_are_not_retried() {
        let (_sql, alloc) = setup();
        let mut calls = 0;
        let err = alloc
            .claim_next(|_| -> Result<(), SQLError> {
                calls += 1;
                Err(SQLError::Execution("disk I/O error".into()))
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn concurrent_claims_get_distinct_codes() {
        let (sql, alloc) = setup();
        let alloc = Arc::new(alloc);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let (sql, alloc, barrier) = (sql.clone(), alloc.clone(), barrier.clone());
                thread::spawn(move || {
                    barrier.wait();
                    alloc.claim_next(|c| put(&sql, c)).unwrap()
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(codes(&sql), vec!["TS00001", "TS00002"]);
    }
}
