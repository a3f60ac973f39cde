use crate::errors::driver_error;
use crate::Sqlite;
use crate::SqliteOptions;
use crate::DRIVER_NAME;
use crate::IN_MEMORY_URI;
use crate::IN_MEMORY_URI_PATH;
use sqlaudit_core::driver::{DriverConnection, DriverFactory, Result};
use sqlaudit_core::Error;
use std::sync::Arc;
use tracing::debug;

pub(crate) struct SqliteFactory {}

impl SqliteFactory {
    /// Read the options of the driver from the query parameters of the URI.
    ///
    /// Parameters that are not known by the driver are left to SQLite (`mode`, `cache`...).
    fn parse_options(uri: &str, parsed_uri: &url::Url) -> std::result::Result<SqliteOptions, Error> {
        let mut options = SqliteOptions::default();
        for (key, value) in parsed_uri.query_pairs() {
            if key == "max_batch_rows" {
                options.max_batch_rows = match value.parse::<usize>() {
                    Ok(max_batch_rows) if max_batch_rows > 0 => max_batch_rows,
                    _ => {
                        return Err(Error::InvalidUri {
                            uri: uri.to_string(),
                            reason: format!("invalid value for max_batch_rows: '{}'", value),
                        })
                    }
                };
            }
        }
        Ok(options)
    }
}

impl DriverFactory for SqliteFactory {
    fn schemes(&self) -> &'static [&'static str] {
        &[DRIVER_NAME]
    }

    fn open(&self, uri: &str) -> Result<Box<dyn DriverConnection>> {
        let parsed_uri =
            url::Url::parse(uri).map_err(|e| Error::InvalidUri { uri: uri.to_string(), reason: e.to_string() })?;
        let options = Self::parse_options(uri, &parsed_uri)?;
        let mut sqlite_uri = uri.to_string();
        // SQLite id expecting to have some flags set when opening a database even if the `mode` URI parameter will
        // eventually override them.
        let flags = rusqlite::OpenFlags::SQLITE_OPEN_URI
            | rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
            | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
            | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if parsed_uri.path() == IN_MEMORY_URI_PATH {
            sqlite_uri.replace_range(0..IN_MEMORY_URI.len(), "file::memory:");
        } else {
            sqlite_uri.replace_range(0.."sqlite:".len(), "file:");
        }
        debug!("Opening SQLite database: {}", sqlite_uri);
        let conn = rusqlite::Connection::open_with_flags(&sqlite_uri, flags).map_err(driver_error)?;
        // Arrays are bound through the `rarray()` table-valued function.
        rusqlite::vtab::array::load_module(&conn).map_err(driver_error)?;
        Ok(Box::new(Sqlite { conn, options: Arc::new(options) }))
    }
}
