use crate::errors::driver_error;
use crate::statement::SqliteStatement;
use crate::value::type_affinity;
use crate::{Sqlite, DRIVER_NAME};
use sqlaudit_core::driver::{DriverConnection, DriverStatement, KeyRetrieval, Result};
use sqlaudit_core::values::{ArrayValue, Value};
use sqlaudit_core::Error;

impl DriverConnection for Sqlite {
    fn driver_name(&self) -> &str {
        DRIVER_NAME
    }

    fn prepare<'c, 's>(&'c self, statement: &str, key_retrieval: KeyRetrieval) -> Result<Box<dyn DriverStatement + 's>>
    where
        'c: 's,
    {
        let inner = self.conn.prepare(statement).map_err(driver_error)?;
        Ok(Box::new(SqliteStatement::new(inner, &self.conn, self.options.clone(), statement, key_retrieval)))
    }

    fn create_array(&self, type_name: &str, elements: Vec<Value>) -> Result<ArrayValue> {
        match type_affinity(type_name) {
            Some(element_type) => Ok(ArrayValue::try_new(type_name, element_type, elements)?),
            None => Err(Error::UnsupportedDataType { data_type: type_name.to_string() }.into()),
        }
    }

    fn close(self: Box<Self>) -> Result<()> {
        match self.conn.close() {
            Ok(()) => Ok(()),
            Err((_, e)) => Err(driver_error(e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::IN_MEMORY_URI;
    use ctor::ctor;
    use sqlaudit_core::audit::MemoryAuditSink;
    use sqlaudit_core::connection::Connection;
    use sqlaudit_core::error::{Error, ErrorKind};
    use sqlaudit_core::executor::AuditedExecutor;
    use sqlaudit_core::options::AuditOptions;
    use sqlaudit_core::values::Value;
    use sqlaudit_core::{execute, params};
    use std::sync::Arc;

    #[ctor]
    fn before_all() {
        crate::register_driver();
    }

    fn executor() -> (AuditedExecutor, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        (AuditedExecutor::new(sink.clone()), sink)
    }

    #[test]
    fn test_insert_returning_generated_keys() {
        let (executor, sink) = executor();
        let conn = Connection::open(IN_MEMORY_URI).unwrap();
        execute!(conn, "CREATE TABLE t (id INTEGER PRIMARY KEY, x INTEGER)").unwrap();

        let mut stmt = executor.prepare_returning_generated_keys("INSERT INTO t(x) VALUES (?)", &conn).unwrap();
        stmt.bind(params!(10)).unwrap();
        assert_eq!(executor.execute_update(&mut stmt).unwrap(), 1);
        let key = executor.generated_keys(&mut stmt).unwrap().first().unwrap().unwrap();
        assert_eq!(key.get::<_, i64>("rowid"), 1);

        stmt.bind(params!(20)).unwrap();
        assert_eq!(executor.execute_update(&mut stmt).unwrap(), 1);
        let key = executor.generated_keys(&mut stmt).unwrap().first().unwrap().unwrap();
        assert_eq!(key.get::<_, i64>(0), 2);
        drop(stmt);

        assert_eq!(
            sink.entries(),
            vec!["INSERT INTO t(x) VALUES (?)", "INSERT INTO t(x) VALUES (?)", "INSERT INTO t(x) VALUES (?)"]
        );

        let mut stmt = executor.prepare("SELECT id, x FROM t WHERE x = ?", &conn).unwrap();
        stmt.bind(params!(20)).unwrap();
        let row = executor.execute_query(&mut stmt).unwrap().first().unwrap().unwrap();
        assert_eq!(row.get::<_, i64>("id"), 2);
    }

    #[test]
    fn test_generated_keys_not_requested() {
        let (executor, _) = executor();
        let conn = Connection::open(IN_MEMORY_URI).unwrap();
        execute!(conn, "CREATE TABLE t (id INTEGER PRIMARY KEY, x INTEGER)").unwrap();

        let mut stmt = executor.prepare("INSERT INTO t(x) VALUES (1)", &conn).unwrap();
        assert_eq!(executor.execute_update(&mut stmt).unwrap(), 1);
        assert!(matches!(executor.generated_keys(&mut stmt), Err(Error::GeneratedKeysNotRequested)));
        drop(stmt);

        // An update does not generate keys.
        let mut stmt = executor.prepare_returning_generated_keys("UPDATE t SET x = 2", &conn).unwrap();
        assert_eq!(executor.execute_update(&mut stmt).unwrap(), 1);
        assert!(executor.generated_keys(&mut stmt).unwrap().next().is_none());
    }

    #[test]
    fn test_generated_keys_of_most_recent_execution() {
        let (executor, _) = executor();
        let conn = Connection::open(IN_MEMORY_URI).unwrap();
        execute!(conn, "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT UNIQUE)").unwrap();

        let mut stmt =
            executor.prepare_returning_generated_keys("INSERT OR IGNORE INTO t(name) VALUES (?)", &conn).unwrap();
        stmt.bind(params!("a")).unwrap();
        assert_eq!(executor.execute_update(&mut stmt).unwrap(), 1);
        assert_eq!(executor.execute_update(&mut stmt).unwrap(), 0);
        assert!(executor.generated_keys(&mut stmt).unwrap().next().is_none());
        drop(stmt);

        let mut stmt = executor
            .prepare_returning_generated_keys("WITH v(x) AS (SELECT ?) INSERT INTO t(name) SELECT x FROM v", &conn)
            .unwrap();
        stmt.bind(params!("b")).unwrap();
        assert_eq!(executor.execute_update(&mut stmt).unwrap(), 1);
        assert_eq!(executor.generated_keys(&mut stmt).unwrap().first().unwrap().unwrap().get::<_, i64>("rowid"), 2);
    }

    #[test]
    fn test_prepare_syntax_error() {
        let (executor, sink) = executor();
        let conn = Connection::open(IN_MEMORY_URI).unwrap();

        let error = executor.prepare("SELEC 1", &conn).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Database);
        assert_eq!(sink.entries(), vec!["SELEC 1"]);
    }

    #[test]
    fn test_constraint_violation() {
        let (executor, sink) = executor();
        let conn = Connection::open(IN_MEMORY_URI).unwrap();
        execute!(conn, "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL)").unwrap();

        let mut stmt = executor.prepare("INSERT INTO t(name) VALUES (?)", &conn).unwrap();
        stmt.bind(params!(None::<String>)).unwrap();
        assert!(matches!(executor.execute_update(&mut stmt), Err(Error::ConstraintViolation { .. })));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_create_array_of() {
        let (executor, sink) = executor();
        let conn = Connection::open(IN_MEMORY_URI).unwrap();
        execute!(conn, "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
        for name in ["Alice", "Bob", "Carol", "Dave"] {
            execute!(conn, "INSERT INTO t(name) VALUES (?)", name).unwrap();
        }

        let ids = executor.create_array_of("INTEGER", vec![1.into(), 3.into(), 4.into()], &conn).unwrap();
        let mut stmt = executor.prepare("SELECT name FROM t WHERE id IN rarray(?) ORDER BY id", &conn).unwrap();
        stmt.bind(params!(ids)).unwrap();
        let names: Vec<String> =
            executor.execute_query(&mut stmt).unwrap().map(|row| row.unwrap().get::<_, String>(0)).collect();
        assert_eq!(names, vec!["Alice", "Carol", "Dave"]);
        drop(stmt);

        let names = executor.create_array_of("VARCHAR(20)", vec!["Bob".into()], &conn).unwrap();
        let mut stmt = executor.prepare("SELECT id FROM t WHERE name IN rarray(?)", &conn).unwrap();
        stmt.bind(params!(names)).unwrap();
        assert_eq!(executor.execute_query(&mut stmt).unwrap().first().unwrap().unwrap().get::<_, i64>(0), 2);
        drop(stmt);
        assert_eq!(sink.len(), 4);

        // unrecognized type names are rejected and nothing is audited
        sink.clear();
        let error = executor.create_array_of("GEOMETRY", vec![1.into()], &conn).err().unwrap();
        assert!(matches!(error, Error::UnsupportedDataType { .. }));
        assert_eq!(error.kind(), ErrorKind::Database);
        assert!(matches!(executor.create_array_of("", vec![], &conn), Err(Error::UnsupportedDataType { .. })));
        assert!(matches!(
            executor.create_array_of("INTEGER", vec!["one".into()], &conn),
            Err(Error::InvalidType { .. })
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_include_bound_parameters() {
        let sink = Arc::new(MemoryAuditSink::new());
        let executor =
            AuditedExecutor::new(sink.clone()).with_options(AuditOptions::default().with_bound_parameters(true));
        let conn = Connection::open(IN_MEMORY_URI).unwrap();
        execute!(conn, "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)").unwrap();

        let mut stmt = executor.prepare("INSERT INTO t(id, name) VALUES (?, ?)", &conn).unwrap();
        stmt.bind(params!(7, "Alice")).unwrap();
        executor.execute_update(&mut stmt).unwrap();
        assert_eq!(sink.entries(), vec!["INSERT INTO t(id, name) VALUES (?, ?)", "INSERT INTO t(id, name) VALUES (7, 'Alice')"]);
    }

    #[test]
    fn test_close() {
        let conn = Connection::open(IN_MEMORY_URI).unwrap();
        let stmt = conn.prepare("SELECT 1").unwrap();
        drop(stmt);
        assert!(conn.close().is_ok());
    }

    #[test]
    fn test_bind_null_array_element() {
        let conn = Connection::open(IN_MEMORY_URI).unwrap();
        let array = conn.create_array_of("TEXT", vec!["a".into(), Value::Null]).unwrap();
        let mut stmt = conn.prepare("SELECT count(*) FROM rarray(?)").unwrap();
        stmt.bind(params!(array)).unwrap();
        assert_eq!(stmt.query().unwrap().first().unwrap().unwrap().get::<_, i64>(0), 2);
    }
}
