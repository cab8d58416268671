use assetreg_core::ServiceError;
use assetreg_sql::SQLError;

use super::scanner::CodeStore;

/// Fail with [`ServiceError::DuplicateCode`] if `code` is already stored.
pub fn ensure_unused<S: CodeStore + ?Sized>(store: &S, code: &str) -> Result<(), ServiceError> {
    if store.contains(code)? {
        return Err(ServiceError::DuplicateCode(code.to_string()));
    }
    Ok(())
}

/// Write a row carrying `code`, rejecting it if the code is taken.
///
/// The existence check runs first and nothing is written on a hit. A
/// uniqueness violation raised by the write itself (another writer got in
/// between) is reported the same way. Other store errors become
/// [`ServiceError::Storage`].
pub fn claim<S, T, F>(store: &S, code: &str, write: F) -> Result<T, ServiceError>
where
    S: CodeStore + ?Sized,
    F: FnOnce(&str) -> Result<T, SQLError>,
{
    ensure_unused(store, code)?;
    write(code).map_err(|e| {
        if store.is_duplicate(&e) {
            ServiceError::DuplicateCode(code.to_string())
        } else {
            ServiceError::Storage(e.to_string())
        }
    })
}
