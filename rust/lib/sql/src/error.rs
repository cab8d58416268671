use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    /// A UNIQUE / FOREIGN KEY / NOT NULL constraint rejected the statement.
    /// The message carries SQLite's text, e.g.
    /// `UNIQUE constraint failed: assets.asset_code`.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl SQLError {
    /// True when this is a UNIQUE violation on `table.column`.
    pub fn is_unique_violation(&self, table: &str, column: &str) -> bool {
        match self {
            SQLError::Constraint(msg) => {
                msg.contains("UNIQUE") && msg.contains(&format!("{}.{}", table, column))
            }
            _ => false,
        }
    }
}
