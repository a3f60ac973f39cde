#![forbid(unsafe_code)]

pub mod audit;
pub mod connection;
pub mod decode;
pub mod driver;
pub mod error;
pub mod executor;
pub mod factory;
pub mod macros;
pub mod options;
pub mod parameters;
pub mod row;
pub mod rows;
pub mod statement;
pub mod values;

/// The mock module is only available when running test or when the `mock` feature is enabled.
/// It provides a mock implementation of the driver and connection to be used in tests.
#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// The error type used across the library.
///
/// All errors produced by the crates in this workspace are supposed to be {{Error}}. Only the drivers are allowed to
/// return their own error types {{DriverError}} which will be then converted to an {{Error}}.
pub type Error = error::Error;

/// A specialized `Result` type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Return a clean version of the input string for logging purposes.
/// The returned statement is cleaned by collapsing line breaks and the indentation that follows them into one space.
pub fn clean_statement(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.trim().chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            while let Some(' ' | '\t' | '\n' | '\r') = chars.peek() {
                chars.next();
            }
            if !result.ends_with(' ') {
                result.push(' ');
            }
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_statement() {
        assert_eq!(clean_statement("SELECT 1"), "SELECT 1");
        assert_eq!(clean_statement("SELECT *\n    FROM employee\n   WHERE id = ?"), "SELECT * FROM employee WHERE id = ?");
        assert_eq!(clean_statement("SELECT id \r\n FROM employee"), "SELECT id FROM employee");
        assert_eq!(clean_statement("\n  SELECT 1\n"), "SELECT 1");
    }
}
