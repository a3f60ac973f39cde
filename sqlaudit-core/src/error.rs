/// Error type for library.
///
/// This library is defining 2 error types:
/// - {Error}: is the main error type for the library and the one the users of the library will interact with.
/// - {DriverError}: is the error type that the drivers will use to return errors. Only developers of drivers will
///   interact with this error type.
///
/// Every {Error} belongs to one of the two [ErrorKind]s, see [Error::kind].
#[derive(Debug)]
pub enum Error {
    ArrowError {
        error: arrow_schema::ArrowError,
    },

    /// There is a constraint violation.
    /// This error is used when a constraint is violated. For example, when a unique constraint is violated.
    ConstraintViolation {
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The driver is reporting that there is no more space in the storage.
    StorageFull {
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No driver is registered for the scheme of the URI given to open a connection.
    DriverNotFound {
        scheme: String,
    },

    /// Generated keys were requested from a statement that was not prepared to return them.
    GeneratedKeysNotRequested,

    InternalError {
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    InvalidParameterCount {
        expected: usize,
        actual: usize,
    },

    InvalidType {
        expected: String,
        actual: String,
    },

    InvalidUri {
        uri: String,
        reason: String,
    },

    NotFound,

    OutOfBounds {
        index: usize,
    },

    /// The driver is reporting that it is out of memory.
    OutOfMemory {
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    UnsupportedDataType {
        data_type: String,
    },

    /// An error that doesn't fit in any of the other error types.
    DriverError {
        error: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// The two families of errors a caller has to deal with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The database or its driver reported a failure: malformed SQL, unsupported type conversion, execution failure...
    Database,

    /// The connection could not be resolved: the URI is invalid or no driver is registered for its scheme.
    ResourceLookup,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DriverNotFound { .. } | Error::InvalidUri { .. } => ErrorKind::ResourceLookup,
            _ => ErrorKind::Database,
        }
    }
}

impl From<crate::driver::DriverError> for Error {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        match err.downcast::<Error>() {
            Ok(error) => *error,
            Err(error) => Error::InternalError { error },
        }
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::InternalError { error: Box::new(e) }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::InternalError { error: Box::new(e) }
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::InternalError { error: e.into() }
    }
}

impl From<arrow_schema::ArrowError> for Error {
    fn from(e: arrow_schema::ArrowError) -> Self {
        Error::ArrowError { error: e }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ArrowError { error } => write!(f, "{}", error),
            Error::ConstraintViolation { error } => write!(f, "{}", error),
            Error::StorageFull { error } => write!(f, "{}", error),
            Error::DriverError { error } => write!(f, "{}", error),
            Error::DriverNotFound { scheme } => write!(f, "No driver found for scheme: {}", scheme),
            Error::GeneratedKeysNotRequested => {
                write!(f, "The statement was not prepared to return generated keys")
            }
            Error::InternalError { error } => write!(f, "{}", error),
            Error::InvalidParameterCount { expected, actual } => {
                write!(f, "Invalid parameter count: expected {}, actual {}", expected, actual)
            }
            Error::InvalidType { expected, actual } => {
                write!(f, "Invalid type: expected '{}', actual '{}'", expected, actual)
            }
            Error::InvalidUri { uri, reason } => write!(f, "Invalid URI: {} (reason: {})", uri, reason),
            Error::NotFound => write!(f, "Not found"),
            Error::OutOfBounds { index } => write!(f, "Out of bounds index {}", index),
            Error::OutOfMemory { error } => write!(f, "{}", error),
            Error::UnsupportedDataType { data_type } => write!(f, "Unsupported type: {}", data_type),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverError;

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::DriverNotFound { scheme: "foo".to_string() }.kind(), ErrorKind::ResourceLookup);
        assert_eq!(
            Error::InvalidUri { uri: "foo".to_string(), reason: "bar".to_string() }.kind(),
            ErrorKind::ResourceLookup
        );
        assert_eq!(Error::GeneratedKeysNotRequested.kind(), ErrorKind::Database);
        assert_eq!(Error::UnsupportedDataType { data_type: "FOO".to_string() }.kind(), ErrorKind::Database);
        assert_eq!(Error::from("syntax error").kind(), ErrorKind::Database);
    }

    #[test]
    fn test_from_driver_error() {
        // A crate error boxed by a driver is recovered as is.
        let driver_error: DriverError = Box::new(Error::InvalidParameterCount { expected: 1, actual: 2 });
        assert!(matches!(Error::from(driver_error), Error::InvalidParameterCount { expected: 1, actual: 2 }));

        // Any other error becomes an internal error.
        let driver_error: DriverError = "no such table: employee".into();
        let error = Error::from(driver_error);
        assert!(matches!(error, Error::InternalError { .. }));
        assert_eq!(error.to_string(), "no such table: employee");
    }
}
