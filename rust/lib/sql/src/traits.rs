use crate::error::SQLError;

/// A dynamically-typed SQL parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A row returned from a SQL query: column name to value.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a text column value by name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get an integer column value by name.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Get a numeric column value by name. Integers are widened, since
    /// aggregates such as `COALESCE(SUM(x), 0)` come back as INTEGER when
    /// the fallback wins.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Real(f)) => Some(*f),
            Some(Value::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }
}

/// SQLStore provides a SQL execution interface backed by an embedded database.
pub trait SQLStore: Send + Sync {
    /// Execute a query and return rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError>;

    /// Execute a statement (INSERT/UPDATE/DELETE) and return affected row count.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError>;

    /// Execute an INSERT and return the rowid of the new row.
    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64, SQLError>;

    /// Execute statements in order inside one transaction and return the
    /// total affected row count. Nothing is applied if any statement fails.
    fn exec_batch(&self, stmts: &[Statement]) -> Result<u64, SQLError>;

    /// Execute `head` (an INSERT), then the statements `children` builds from
    /// its rowid, inside one transaction. Returns the rowid. Nothing is
    /// applied if any statement fails.
    fn insert_batch(
        &self,
        head: &Statement,
        children: &dyn Fn(i64) -> Vec<Statement>,
    ) -> Result<i64, SQLError>;
}

/// A statement with its bound parameters, for [`SQLStore::exec_batch`].
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_accessors() {
        let row = Row {
            columns: vec![
                ("code".into(), Value::Text("TS00001".into())),
                ("n".into(), Value::Integer(3)),
                ("price".into(), Value::Real(12.5)),
                ("note".into(), Value::Null),
            ],
        };
        assert_eq!(row.get_str("code"), Some("TS00001"));
        assert_eq!(row.get_i64("n"), Some(3));
        assert_eq!(row.get_f64("price"), Some(12.5));
        assert_eq!(row.get_f64("n"), Some(3.0));
        assert_eq!(row.get_str("note"), None);
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn option_into_value() {
        let none: Option<String> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }
}
