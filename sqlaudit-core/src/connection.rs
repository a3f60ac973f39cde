use crate::driver::{DriverConnection, KeyRetrieval};
use crate::factory::Factory;
use crate::parameters::Parameters;
use crate::statement::Statement;
use crate::values::{ArrayValue, Value};
use crate::{Error, Result};
use tracing::debug;

/// A connection to a data source.
///
/// ```rust,ignore
/// use sqlaudit_core::connection::Connection;
/// use sqlaudit_core::{execute, params};
///
/// let conn = Connection::open("sqlite:///:memory:")?;
///
/// execute!(conn, "CREATE TABLE employee (id INTEGER PRIMARY KEY, name TEXT)")?;
/// execute!(conn, "INSERT INTO employee (name) VALUES (?)", "Alice")?;
///
/// let mut stmt = conn.prepare("SELECT * FROM employee WHERE id = ?")?;
/// stmt.bind(params!(1))?;
/// let rows = stmt.query()?;
/// ```
pub struct Connection {
    inner: Box<dyn DriverConnection>,
}

impl Connection {
    /// Open a connection to the data source identified by the given URI.
    ///
    /// The scheme of the URI is used to look up the driver, see [Factory::open].
    pub fn open(uri: &str) -> Result<Self> {
        let inner = Factory::open(uri)?;
        debug!("Connection opened using the '{}' driver.", inner.driver_name());
        Ok(Self { inner })
    }

    /// Get the driver name used by the connection.
    pub fn driver_name(&self) -> &str {
        self.inner.driver_name()
    }

    /// Prepare a statement.
    ///
    /// Return a [Statement] that can be later used to by `query` or `execute` functions. A prepared statement can be
    /// used multiple times with different parameters. The statement does not report the keys it may generate, see
    /// [Connection::prepare_with].
    pub fn prepare<S: AsRef<str>>(&self, statement: S) -> Result<Statement<'_>> {
        self.prepare_with(statement, KeyRetrieval::None)
    }

    /// Prepare a statement, specifying whether the keys generated by its execution should be retrievable.
    pub fn prepare_with<S: AsRef<str>>(&self, statement: S, key_retrieval: KeyRetrieval) -> Result<Statement<'_>> {
        let sql = statement.as_ref();
        Ok(Statement { inner: self.inner.prepare(sql, key_retrieval)?, sql: sql.to_string(), key_retrieval })
    }

    /// Create a database-native array of the given element type.
    ///
    /// The type name must be recognized by the database.
    pub fn create_array_of(&self, type_name: &str, elements: Vec<Value>) -> Result<ArrayValue> {
        if type_name.trim().is_empty() {
            return Err(Error::UnsupportedDataType { data_type: type_name.to_string() });
        }
        self.inner.create_array(type_name, elements).map_err(Error::from)
    }

    /// Execute a statement.
    ///
    /// Returns the number of rows affected.
    pub fn execute<S: AsRef<str>>(&self, statement: S, parameters: Option<Parameters>) -> Result<u64> {
        let mut statement = self.prepare(statement)?;
        if let Some(parameters) = parameters {
            statement.bind(parameters)?;
        }
        statement.execute()
    }

    /// Close the connection.
    ///
    /// Because a {{Statement}} borrows the connection, all statements must be dropped before calling `close()`.
    pub fn close(self) -> Result<()> {
        self.inner.close().map_err(Error::from)
    }
}
