//! # Crate Topology
//!
//! The `sqlaudit` project is implemented as multiple sub-crates, which are then re-exported by this top-level crate.
//!
//! Crate authors can choose to depend on this top-level crate, or just the sub-crates they need.
//!
//! The current list of sub-crates is:
//!
//! * [`sqlaudit-core`][sqlaudit_core] - the audited executor, the audit sinks and the driver traits
//! * `sqlaudit-sqlite` - the [SQLite](https://www.sqlite.org) driver (feature `sqlite`)
//!
//! # Example
//! ```rust,ignore
//! use sqlaudit::{params, AuditedExecutor, Connection};
//!
//! sqlaudit::register_drivers();
//! let executor = AuditedExecutor::default();
//! let conn = Connection::open("sqlite:///:memory:")?;
//! let mut stmt = executor.prepare("SELECT ?", &conn)?;
//! stmt.bind(params!(1))?;
//! let rows = executor.execute_query(&mut stmt)?;
//! ```

pub use sqlaudit_core::audit::{
    AuditSink, ChannelAuditSink, FileAuditSink, MemoryAuditSink, NoopAuditSink, TracingAuditSink, AUDIT_TARGET,
};
pub use sqlaudit_core::clean_statement;
pub use sqlaudit_core::connection::Connection;
pub use sqlaudit_core::driver::KeyRetrieval;
pub use sqlaudit_core::error::ErrorKind;
pub use sqlaudit_core::executor::AuditedExecutor;
pub use sqlaudit_core::options::AuditOptions;
pub use sqlaudit_core::parameters::Parameters;
pub use sqlaudit_core::row::Row;
pub use sqlaudit_core::rows::Rows;
pub use sqlaudit_core::statement::Statement;
pub use sqlaudit_core::values::{ArrayElementType, ArrayValue, Value};
pub use sqlaudit_core::{Error, Result};

// Re-export the `params!` and `execute!` macros.
pub use sqlaudit_core::execute;
pub use sqlaudit_core::params;

/// Register the drivers enabled by the features of the crate.
pub fn register_drivers() {
    #[cfg(feature = "sqlite")]
    sqlaudit_sqlite::register_driver();
}
