use sqlaudit_core::factory::Factory;
use std::sync::Arc;

mod driver;
mod errors;
mod factory;
mod statement;
mod value;

/// The name of the driver for SQLite.
pub const DRIVER_NAME: &str = "sqlite";

/// The path in a URI for in-memory databases.
pub const IN_MEMORY_URI_PATH: &str = "/:memory:";

/// The URI for in-memory databases.
///
/// # Example
/// ```rust
/// # use sqlaudit_core::connection::Connection;
/// sqlaudit_sqlite::register_driver();
/// let conn = Connection::open(sqlaudit_sqlite::IN_MEMORY_URI);
/// assert!(conn.is_ok());
/// ```
pub const IN_MEMORY_URI: &str = "sqlite:///:memory:";

/// The default maximum number of rows in a record batch produced by a query.
///
/// Can be changed using the `max_batch_rows` URI parameter, i.e. `sqlite:///:memory:?max_batch_rows=100`.
pub const DEFAULT_MAX_BATCH_ROWS: usize = 10_000;

/// The name of the column holding the key returned by `generated_keys()`.
pub const GENERATED_KEY_COLUMN: &str = "rowid";

pub(crate) struct SqliteOptions {
    pub(crate) max_batch_rows: usize,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self { max_batch_rows: DEFAULT_MAX_BATCH_ROWS }
    }
}

pub(crate) type SqliteOptionsRef = Arc<SqliteOptions>;

pub(crate) struct Sqlite {
    conn: rusqlite::Connection,
    options: SqliteOptionsRef,
}

pub fn register_driver() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        Factory::register(Box::new(factory::SqliteFactory {}));
    });
}
