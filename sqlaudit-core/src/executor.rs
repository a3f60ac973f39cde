use crate::audit::{AuditSink, TracingAuditSink};
use crate::clean_statement;
use crate::connection::Connection;
use crate::driver::KeyRetrieval;
use crate::options::AuditOptions;
use crate::rows::Rows;
use crate::statement::Statement;
use crate::values::{ArrayValue, Value};
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// Prepares and executes statements, recording each of them in an audit sink.
///
/// The audit entry of a statement is always recorded before the statement is handed to the driver, so the audit trail
/// contains every statement that was attempted, including the ones the database rejected.
///
/// The executor does not hold any state other than its sink and its options: it can be shared between threads, each
/// of them using its own connection.
///
/// ```rust,ignore
/// use sqlaudit_core::executor::AuditedExecutor;
/// use sqlaudit_core::params;
///
/// let executor = AuditedExecutor::default();
/// let mut stmt = executor.prepare_returning_generated_keys("INSERT INTO employee (name) VALUES (?)", &conn)?;
/// stmt.bind(params!("Alice"))?;
/// assert_eq!(executor.execute_update(&mut stmt)?, 1);
/// let id: i64 = executor.generated_keys(&mut stmt)?.first()?.unwrap().get(0);
/// ```
#[derive(Clone)]
pub struct AuditedExecutor {
    sink: Arc<dyn AuditSink>,
    options: AuditOptions,
}

/// An executor recording its entries with a [TracingAuditSink].
impl Default for AuditedExecutor {
    fn default() -> Self {
        Self::new(Arc::new(TracingAuditSink))
    }
}

impl AuditedExecutor {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink, options: AuditOptions::default() }
    }

    pub fn with_options(mut self, options: AuditOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AuditOptions {
        &self.options
    }

    /// Prepare a statement that does not report the keys it may generate.
    ///
    /// The statement text is recorded before the connection compiles it.
    pub fn prepare<'c>(&self, statement: &str, conn: &'c Connection) -> Result<Statement<'c>> {
        self.audit(Some(statement));
        conn.prepare_with(statement, KeyRetrieval::None)
    }

    /// Prepare a statement whose generated keys can be retrieved with [AuditedExecutor::generated_keys] after it
    /// has been executed.
    pub fn prepare_returning_generated_keys<'c>(&self, statement: &str, conn: &'c Connection) -> Result<Statement<'c>> {
        self.audit(Some(statement));
        conn.prepare_with(statement, KeyRetrieval::Generated)
    }

    /// Create a database-native array of the given element type.
    ///
    /// Nothing is recorded, the array only ends up in the database through a statement which is audited on its own.
    pub fn create_array_of(&self, type_name: &str, elements: Vec<Value>, conn: &Connection) -> Result<ArrayValue> {
        conn.create_array_of(type_name, elements)
    }

    /// Execute a statement returning rows.
    pub fn execute_query<'s>(&self, statement: &'s mut Statement<'_>) -> Result<Rows<'s>> {
        self.log_and_audit(statement);
        statement.query()
    }

    /// Execute a statement and return the number of rows affected.
    pub fn execute_update(&self, statement: &mut Statement<'_>) -> Result<u64> {
        self.log_and_audit(statement);
        statement.execute()
    }

    /// Get the keys generated by the last execution of a statement prepared with
    /// [AuditedExecutor::prepare_returning_generated_keys].
    ///
    /// Nothing is recorded, the statement has been recorded when it was prepared.
    pub fn generated_keys<'s>(&self, statement: &'s mut Statement<'_>) -> Result<Rows<'s>> {
        statement.generated_keys()
    }

    /// Record a statement text. `None` is ignored.
    pub fn audit(&self, statement: Option<&str>) {
        if let Some(statement) = statement {
            self.sink.record(statement);
        }
    }

    /// Record the text of a prepared statement. `None` is ignored.
    pub fn audit_statement(&self, statement: Option<&Statement<'_>>) {
        if let Some(statement) = statement {
            self.sink.record(&self.statement_text(statement));
        }
    }

    fn log_and_audit(&self, statement: &Statement<'_>) {
        let text = self.statement_text(statement);
        debug!("Executing {}", clean_statement(&text));
        self.sink.record(&text);
    }

    fn statement_text(&self, statement: &Statement<'_>) -> String {
        match self.options.include_bound_parameters {
            true => statement.expanded_sql().unwrap_or_else(|| statement.to_string()),
            false => statement.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{MemoryAuditSink, MockAuditSink};
    use crate::error::ErrorKind;
    use crate::{params, Error};

    fn executor() -> (AuditedExecutor, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        (AuditedExecutor::new(sink.clone()), sink)
    }

    #[test]
    fn test_prepare() {
        let (executor, sink) = executor();
        let conn = Connection::open("mock://").unwrap();

        let stmt = executor.prepare("INSERT INTO employee (id) VALUES (?)", &conn).unwrap();
        assert_eq!(stmt.key_retrieval(), KeyRetrieval::None);
        assert_eq!(sink.entries(), vec!["INSERT INTO employee (id) VALUES (?)".to_string()]);

        let stmt = executor.prepare_returning_generated_keys("INSERT INTO employee (id) VALUES (?)", &conn).unwrap();
        assert_eq!(stmt.key_retrieval(), KeyRetrieval::Generated);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_prepare_rejected_is_audited() {
        let (executor, sink) = executor();
        let conn = Connection::open("mock://").unwrap();

        let error = executor.prepare("XINSERT", &conn).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Database);
        assert!(executor.prepare_returning_generated_keys("XINSERT", &conn).is_err());
        assert_eq!(sink.entries(), vec!["XINSERT".to_string(), "XINSERT".to_string()]);
    }

    #[test]
    fn test_prepare_records_once() {
        let mut sink = MockAuditSink::new();
        sink.expect_record().withf(|text: &str| text == "SELECT 1").times(1).return_const(());
        let executor = AuditedExecutor::new(Arc::new(sink));
        let conn = Connection::open("mock://").unwrap();
        assert!(executor.prepare("SELECT 1", &conn).is_ok());
    }

    #[test]
    fn test_execute_query() {
        let (executor, sink) = executor();
        let conn = Connection::open("mock://").unwrap();

        let mut stmt = executor.prepare("SELECT 2", &conn).unwrap();
        let rows = executor.execute_query(&mut stmt).unwrap();
        let usernames: Vec<String> = rows.map(|row| row.unwrap().get::<_, String>("username")).collect();
        assert_eq!(usernames, vec!["user1", "user2"]);
        assert_eq!(executor.execute_query(&mut stmt).unwrap().count(), 2);

        // one entry for the preparation and one for each execution
        assert_eq!(sink.entries(), vec!["SELECT 2", "SELECT 2", "SELECT 2"]);
    }

    #[test]
    fn test_execute_update() {
        let (executor, sink) = executor();
        let conn = Connection::open("mock://").unwrap();

        let mut stmt = executor.prepare("UPDATE employee SET name = ? WHERE id = ?", &conn).unwrap();
        stmt.bind(params!("Alice", 1)).unwrap();
        assert_eq!(executor.execute_update(&mut stmt).unwrap(), 1);
        assert_eq!(sink.len(), 2);

        // Bound values are not audited by default.
        assert!(sink.entries().iter().all(|entry| entry == "UPDATE employee SET name = ? WHERE id = ?"));
    }

    #[test]
    fn test_execute_failure_is_audited() {
        let (executor, sink) = executor();
        let conn = Connection::open("mock://").unwrap();

        let mut stmt = executor.prepare("SELECT 1", &conn).unwrap();
        assert!(executor.execute_update(&mut stmt).is_err());
        drop(stmt);
        let mut stmt = executor.prepare("DELETE FROM employee", &conn).unwrap();
        assert!(executor.execute_query(&mut stmt).is_err());
        assert_eq!(sink.entries(), vec!["SELECT 1", "SELECT 1", "DELETE FROM employee", "DELETE FROM employee"]);
    }

    #[test]
    fn test_generated_keys() {
        let (executor, sink) = executor();
        let conn = Connection::open("mock://").unwrap();

        let mut stmt = executor.prepare_returning_generated_keys("INSERT INTO t(x) VALUES (?)", &conn).unwrap();
        stmt.bind(params!(42)).unwrap();
        assert_eq!(executor.execute_update(&mut stmt).unwrap(), 1);
        let key = executor.generated_keys(&mut stmt).unwrap().first().unwrap().unwrap();
        assert_eq!(key.get::<_, i64>(0), 1);

        // Retrieving the keys is not audited.
        assert_eq!(sink.len(), 2);

        let mut stmt = executor.prepare("INSERT INTO t(x) VALUES (1)", &conn).unwrap();
        executor.execute_update(&mut stmt).unwrap();
        assert!(matches!(executor.generated_keys(&mut stmt), Err(Error::GeneratedKeysNotRequested)));
    }

    #[test]
    fn test_create_array_of() {
        let (executor, sink) = executor();
        let conn = Connection::open("mock://").unwrap();

        let array = executor.create_array_of("TEXT", vec!["a".into(), "b".into()], &conn).unwrap();
        assert_eq!(array.len(), 2);

        let error = executor.create_array_of("UNKNOWN", vec!["a".into()], &conn).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Database);
        assert!(executor.create_array_of("", vec![], &conn).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_audit_none() {
        let mut sink = MockAuditSink::new();
        sink.expect_record().never();
        let executor = AuditedExecutor::new(Arc::new(sink));
        executor.audit(None);
        executor.audit_statement(None);
    }

    #[test]
    fn test_audit() {
        let (executor, sink) = executor();
        let conn = Connection::open("mock://").unwrap();

        executor.audit(Some("SELECT 1"));
        let stmt = conn.prepare("SELECT 2").unwrap();
        executor.audit_statement(Some(&stmt));
        assert_eq!(sink.entries(), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_include_bound_parameters() {
        let sink = Arc::new(MemoryAuditSink::new());
        let executor =
            AuditedExecutor::new(sink.clone()).with_options(AuditOptions::default().with_bound_parameters(true));
        assert!(executor.options().include_bound_parameters);
        let conn = Connection::open("mock://").unwrap();

        let mut stmt = executor.prepare("INSERT INTO employee (id, name) VALUES (?, ?)", &conn).unwrap();
        stmt.bind(params!(1, "Alice")).unwrap();
        executor.execute_update(&mut stmt).unwrap();
        executor.audit_statement(Some(&stmt));
        assert_eq!(
            sink.entries(),
            vec![
                "INSERT INTO employee (id, name) VALUES (?, ?)",
                "INSERT INTO employee (id, name) VALUES (1, 'Alice')",
                "INSERT INTO employee (id, name) VALUES (1, 'Alice')",
            ]
        );
    }

    #[test]
    fn test_shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AuditedExecutor>();

        let (executor, sink) = executor();
        let executor = Arc::new(executor);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let executor = executor.clone();
                std::thread::spawn(move || {
                    let conn = Connection::open("mock://").unwrap();
                    for _ in 0..5 {
                        let mut stmt = executor.prepare("INSERT 1", &conn).unwrap();
                        executor.execute_update(&mut stmt).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sink.len(), 40);
    }
}
