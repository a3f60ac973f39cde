use crate::driver::DriverConnection;
use crate::driver::DriverStatement;
use crate::driver::KeyRetrieval;
use crate::driver::MockDriverFactory;
use crate::driver::Result;
use crate::parameters::Parameters;
use crate::values::{ArrayElementType, ArrayValue, Value};
use crate::Error;
use arrow_array::RecordBatch;
use ctor::ctor;
use std::cell::Cell;
use std::sync::Arc;

/// A factory for mocking a {{DriverConnection}}.
///
/// # Example
/// ```rust
/// use sqlaudit_core::connection::Connection;
/// use sqlaudit_core::params;
///
/// // This should return a mock connection
/// let conn = Connection::open("mock://").unwrap();
///
/// // Opening a connection with the URI "mock://?error" should return an `InvalidUri` error
/// assert!(Connection::open("mock://?error").is_err());
///
/// // Calling `prepare` should return a mock statement unless the statement is "XINSERT"
/// assert!(conn.prepare("XINSERT").is_err());
/// assert!(conn.prepare("SELECT 1").is_ok());
///
/// // Calling `execute` should return an error if the statement starts with "SELECT"
/// let mut stmt = conn.prepare("INSERT").unwrap();
/// assert!(stmt.execute().is_ok());
/// let mut stmt = conn.prepare("SELECT 1").unwrap();
/// assert!(stmt.execute().is_err());
///
/// // Calling `query` should return an error if the statement does not start with "SELECT" followed by a number
/// let mut stmt = conn.prepare("SELECT 1").unwrap(); // positive number returns a single batch with the number of records
/// assert!(stmt.query().is_ok());
/// let mut stmt = conn.prepare("SELECT 0").unwrap(); // return an empty iterator
/// let mut rows = stmt.query().unwrap();
/// assert!(rows.next().is_none());
/// drop(rows);
/// let mut stmt = conn.prepare("SELECT -1").unwrap(); // negative number an iterator that will fail at the first iteration
/// let mut rows = stmt.query().unwrap();
/// assert!(rows.next().unwrap().is_err());
/// drop(rows);
/// let mut stmt = conn.prepare("INSERT 1").unwrap(); // anything else returns an error
/// assert!(stmt.query().is_err());
///
/// // Calling `bind` should return an error if the number of parameters does not match the number of placeholders
/// let mut stmt = conn.prepare("INSERT ?").unwrap();
/// assert!(stmt.bind(params!(1, 2)).is_err());
/// assert!(stmt.bind(params!(1)).is_ok());
/// ```
impl MockDriverFactory {
    pub fn register_with_default(schemes: &'static [&'static str]) {
        let mut mock_factory = MockDriverFactory::default();
        mock_factory.expect_open().returning(|uri| match uri.contains("?error") {
            false => Ok(Box::new(MockConnection::default())),
            true => {
                Err(Error::InvalidUri { uri: uri.to_string(), reason: "rejected by the mock driver".to_string() }.into())
            }
        });
        mock_factory.register(schemes);
    }

    pub fn register(mut self, schemes: &'static [&'static str]) {
        self.expect_schemes().returning(move || schemes);
        crate::factory::Factory::register(Box::new(self));
    }
}

/// A deterministic in-memory connection.
///
/// Keys generated by `INSERT` statements prepared with [KeyRetrieval::Generated] are taken from a sequence starting
/// at 1 and shared by all the statements of the connection.
#[derive(Default)]
pub struct MockConnection {
    sequence: Cell<i64>,
}

impl DriverConnection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    fn prepare<'c, 's>(&'c self, statement: &str, key_retrieval: KeyRetrieval) -> Result<Box<dyn DriverStatement + 's>>
    where
        'c: 's,
    {
        match statement {
            "XINSERT" => Err("Invalid statement".into()),
            _ => Ok(Box::new(MockStatement {
                sql: statement.to_string(),
                key_retrieval,
                parameters: None,
                last_key: None,
                sequence: &self.sequence,
            })),
        }
    }

    fn create_array(&self, type_name: &str, elements: Vec<Value>) -> Result<ArrayValue> {
        let element_type = match type_name.to_uppercase().as_str() {
            "INT" | "INTEGER" | "BIGINT" => ArrayElementType::Integer,
            "REAL" | "DOUBLE" => ArrayElementType::Real,
            "TEXT" | "VARCHAR" => ArrayElementType::Text,
            "BLOB" => ArrayElementType::Blob,
            "BOOLEAN" => ArrayElementType::Boolean,
            _ => return Err(Error::UnsupportedDataType { data_type: type_name.to_string() }.into()),
        };
        Ok(ArrayValue::try_new(type_name, element_type, elements)?)
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

pub struct MockStatement<'c> {
    sql: String,
    key_retrieval: KeyRetrieval,
    parameters: Option<Parameters>,
    last_key: Option<i64>,
    sequence: &'c Cell<i64>,
}

impl MockStatement<'_> {
    fn placeholders(&self) -> usize {
        self.sql.matches('?').count()
    }
}

impl DriverStatement for MockStatement<'_> {
    fn bind(&mut self, parameters: Parameters) -> Result<()> {
        if self.placeholders() != parameters.len() {
            return Err(Error::InvalidParameterCount { expected: self.placeholders(), actual: parameters.len() }.into());
        }
        self.parameters = Some(parameters);
        Ok(())
    }

    fn execute(&mut self) -> Result<u64> {
        self.last_key = None;
        if self.sql.starts_with("SELECT ") {
            return Err("Invalid statement".into());
        }
        if self.placeholders() > 0 && self.parameters.is_none() {
            return Err(Error::InvalidParameterCount { expected: self.placeholders(), actual: 0 }.into());
        }
        if self.key_retrieval == KeyRetrieval::Generated && self.sql.starts_with("INSERT") {
            let key = self.sequence.get() + 1;
            self.sequence.set(key);
            self.last_key = Some(key);
        }
        Ok(1)
    }

    fn query<'s>(&'s mut self) -> Result<Box<dyn Iterator<Item = Result<RecordBatch>> + 's>> {
        let captures = regex::Regex::new(r"^SELECT\s+(-?[0-9]+)")?.captures(self.sql.as_str());
        let count = match captures.and_then(|captures| captures.get(1)) {
            Some(count) => count.as_str().parse::<i64>()?,
            None => return Err(format!("Invalid statement: {}", self.sql).into()),
        };
        match count {
            _ if count < 0 => {
                // Fails at the first iteration
                Ok(Box::new(std::iter::once(Err("Invalid count".into()) as Result<RecordBatch>)))
            }
            0 => {
                // No records
                Ok(Box::new(std::iter::empty()))
            }
            _ => {
                // Returns a single batch that contains `count` of records
                let ids: Vec<Option<i32>> = (1..=count).map(|n| Some(n as i32)).collect();
                let usernames: Vec<Option<String>> = (1..=count).map(|n| Some(format!("user{}", n))).collect();
                let record_batch = RecordBatch::try_new(
                    Arc::new(arrow_schema::Schema::new(vec![
                        arrow_schema::Field::new("id", arrow_schema::DataType::Int32, true),
                        arrow_schema::Field::new("username", arrow_schema::DataType::Utf8, true),
                    ])),
                    vec![
                        Arc::new(arrow_array::Int32Array::from(ids)),
                        Arc::new(arrow_array::StringArray::from(usernames)),
                    ],
                )?;
                Ok(Box::new(std::iter::once(Ok(record_batch))))
            }
        }
    }

    fn generated_keys<'s>(&'s mut self) -> Result<Box<dyn Iterator<Item = Result<RecordBatch>> + 's>> {
        if self.key_retrieval != KeyRetrieval::Generated {
            return Err(Error::GeneratedKeysNotRequested.into());
        }
        match self.last_key {
            Some(key) => {
                let record_batch = RecordBatch::try_new(
                    Arc::new(arrow_schema::Schema::new(vec![arrow_schema::Field::new(
                        "id",
                        arrow_schema::DataType::Int64,
                        false,
                    )])),
                    vec![Arc::new(arrow_array::Int64Array::from(vec![key]))],
                )?;
                Ok(Box::new(std::iter::once(Ok(record_batch))))
            }
            None => Ok(Box::new(std::iter::empty())),
        }
    }

    fn expanded_sql(&self) -> Option<String> {
        let parameters = match &self.parameters {
            Some(parameters) => parameters,
            None => return Some(self.sql.clone()),
        };
        let mut values = parameters.iter();
        let mut expanded = String::with_capacity(self.sql.len());
        for c in self.sql.chars() {
            if c == '?' {
                if let Some(value) = values.next() {
                    expanded.push_str(&value.to_string());
                    continue;
                }
            }
            expanded.push(c);
        }
        Some(expanded)
    }
}

#[cfg(not(tarpaulin_include))]
#[ctor]
fn init() {
    MockDriverFactory::register_with_default(&["mock"]);
}
