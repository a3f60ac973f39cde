use crate::parameters::Parameters;
use crate::values::{ArrayValue, Value};
use arrow_array::RecordBatch;

#[cfg(any(test, feature = "mock"))]
use mockall::automock;

/// The error type that the drivers will use to return errors.
///
/// It's a pass-through error type that the drivers will use to return errors. Because each driver may have to deal with
/// specific error types coming from the underlying crate used to interact with the database, the drivers will have to
/// convert those errors to this error type.
///
/// It doesn't prevent the drivers from using {{crate::error::Error}} when appropriate but it should be converted into
/// this error type using {{crate::error::Error::into}}.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, DriverError>;

/// Whether a prepared statement should make the keys generated by the database available after its execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyRetrieval {
    /// Generated keys are not reported (the default).
    #[default]
    None,

    /// Generated keys of the most recent insert are available through {{DriverStatement::generated_keys}}.
    Generated,
}

pub trait DriverConnection {
    /// Get the name of the driver.
    ///
    /// The name of the driver should be one of the schemes used to register the driver with the factory but it's not
    /// enforced. This name if mostly intended for logging and debugging purposes.
    fn driver_name(&self) -> &str;

    /// Prepare a statement for execution.
    ///
    /// If the statement used parameters, the statement should be prepared with placeholders for the parameters. The
    /// placeholders themselves are depending on the driver implementation. For example, the placeholders could be
    /// `$1, $2, ...` when using PostgtreSQL or `?` when using SQLite.
    fn prepare<'c, 's>(&'c self, statement: &str, key_retrieval: KeyRetrieval) -> Result<Box<dyn DriverStatement + 's>>
    where
        'c: 's;

    /// Create a database-native array whose elements are of the type named `type_name`.
    ///
    /// The type name must be one of the names recognized by the database, an unknown or empty name is an error.
    fn create_array(&self, type_name: &str, elements: Vec<Value>) -> Result<ArrayValue>;

    /// Close the connection.
    ///
    /// Since the connection may be borrowed, the connection should be closed when the last reference to the connection
    /// is dropped.
    fn close(self: Box<Self>) -> Result<()>;
}

/// A prepared statement ready to be executed.
///
/// A prepared statement can be executed multiple times with different parameters.
pub trait DriverStatement {
    /// Bind the parameters to the statement.
    ///
    /// The latest bound parameters will be used when the statement is executed via {{execute}} or {{query}}.
    /// The number of parameters must match the number of placeholders in the statement otherwise an error will be
    /// returned.
    fn bind(&mut self, parameters: Parameters) -> Result<()>;

    /// Execute the statement.
    ///
    /// Returns the number of rows affected by the statement.
    fn execute(&mut self) -> Result<u64>;

    /// Execute a `SELECT` statement.
    ///
    /// Returns an iterator over the record batches returned by the statement.
    fn query<'s>(&'s mut self) -> Result<Box<dyn Iterator<Item = Result<RecordBatch>> + 's>>;

    /// Get the keys generated by the most recent execution of the statement.
    ///
    /// Drivers must return {{crate::error::Error::GeneratedKeysNotRequested}} if the statement was prepared with
    /// {{KeyRetrieval::None}}, and an empty iterator if no key was generated yet.
    fn generated_keys<'s>(&'s mut self) -> Result<Box<dyn Iterator<Item = Result<RecordBatch>> + 's>>;

    /// The SQL text of the statement with the currently bound values in place of the placeholders.
    ///
    /// Returns `None` if the driver is not able to render it.
    fn expanded_sql(&self) -> Option<String>;
}

#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait DriverFactory: Sync + Send {
    /// Get the schemes associated with the driver.
    fn schemes(&self) -> &'static [&'static str];
    fn open(&self, uri: &str) -> Result<Box<dyn DriverConnection>>;
}
