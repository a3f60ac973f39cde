use crate::driver::{DriverStatement, KeyRetrieval};
use crate::parameters::Parameters;
use crate::rows::Rows;
use crate::{Error, Result};
use std::fmt;

/// A prepared statement.
///
/// A statement is a query that has been prepared for execution. It can be bound with parameters and executed. A
/// statement borrows the connection that prepared it and releases its driver resources when dropped.
pub struct Statement<'c> {
    pub(crate) inner: Box<dyn DriverStatement + 'c>,
    pub(crate) sql: String,
    pub(crate) key_retrieval: KeyRetrieval,
}

impl Statement<'_> {
    /// The SQL text used to prepare the statement.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn key_retrieval(&self) -> KeyRetrieval {
        self.key_retrieval
    }

    /// The SQL text of the statement with the currently bound values in place of the placeholders.
    ///
    /// Returns `None` if the driver is not able to render it.
    pub fn expanded_sql(&self) -> Option<String> {
        self.inner.expanded_sql()
    }

    pub fn bind(&mut self, parameters: Parameters) -> Result<()> {
        self.inner.bind(parameters).map_err(Error::from)
    }

    /// Execute the statement and return the number of rows affected.
    pub fn execute(&mut self) -> Result<u64> {
        self.inner.execute().map_err(Error::from)
    }

    /// Execute the statement and return a cursor over the rows it produced.
    pub fn query(&mut self) -> Result<Rows<'_>> {
        let iterator = self.inner.query().map_err(Error::from)?;
        let iterator: Box<dyn Iterator<Item = Result<_>> + '_> =
            Box::new(iterator.map(|result| result.map_err(Error::from)));
        Ok(Rows::from(iterator))
    }

    /// Get a cursor over the keys generated by the database during the last execution of the statement.
    ///
    /// The statement must have been prepared with [KeyRetrieval::Generated], otherwise
    /// [Error::GeneratedKeysNotRequested] is returned.
    pub fn generated_keys(&mut self) -> Result<Rows<'_>> {
        if self.key_retrieval != KeyRetrieval::Generated {
            return Err(Error::GeneratedKeysNotRequested);
        }
        let iterator = self.inner.generated_keys().map_err(Error::from)?;
        let iterator: Box<dyn Iterator<Item = Result<_>> + '_> =
            Box::new(iterator.map(|result| result.map_err(Error::from)));
        Ok(Rows::from(iterator))
    }
}

/// A statement is displayed as its SQL text, bound values are never rendered.
impl fmt::Display for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement").field("sql", &self.sql).field("key_retrieval", &self.key_retrieval).finish()
    }
}
