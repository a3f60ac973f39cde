/// Options of an [AuditedExecutor](crate::executor::AuditedExecutor).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditOptions {
    /// Whether the values bound to a statement are part of its audited and logged text.
    ///
    /// When enabled, the text of a statement is the SQL rendered by the driver with the bound values in place of the
    /// placeholders (or the SQL text if the driver cannot render it). Bound values may hold sensitive data so this is
    /// disabled by default.
    pub include_bound_parameters: bool,
}

impl AuditOptions {
    pub fn with_bound_parameters(mut self, include_bound_parameters: bool) -> Self {
        self.include_bound_parameters = include_bound_parameters;
        self
    }
}
