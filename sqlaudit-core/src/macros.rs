/// Build positional [Parameters](crate::parameters::Parameters) from a list of values.
///
/// ```rust
/// use sqlaudit_core::params;
///
/// let parameters = params!(1, "Alice", None::<String>);
/// assert_eq!(parameters.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::parameters::Parameters::Positional(Vec::new())
    };
    ($($value:expr),+ $(,)?) => {
        $crate::parameters::Parameters::Positional(vec![$($crate::values::Value::from($value)),+])
    };
}

/// Execute a statement on a connection with the given values bound to its placeholders.
///
/// The statement is not audited, see [AuditedExecutor](crate::executor::AuditedExecutor) for audited executions.
#[macro_export]
macro_rules! execute {
    ($conn:expr, $statement:expr) => {
        $conn.execute($statement, None)
    };
    ($conn:expr, $statement:expr, $($value:expr),+ $(,)?) => {
        $conn.execute($statement, Some($crate::params!($($value),+)))
    };
}
