use lazy_static::lazy_static;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::driver::DriverConnection;
use crate::driver::DriverFactory;
use crate::{Error, Result};

lazy_static! {
    pub static ref DRIVER_FACTORIES: Factory = Factory { registered_factories: Mutex::new(Vec::new()) };
}

/// The registry of the drivers available to open connections.
///
/// Drivers are registered once for all their schemes and looked up by the scheme of the URI given to
/// [Factory::open].
pub struct Factory {
    registered_factories: Mutex<Vec<Arc<Box<dyn DriverFactory>>>>,
}

impl Factory {
    pub fn register(driver: Box<dyn DriverFactory>) {
        DRIVER_FACTORIES.factories().push(Arc::new(driver));
    }

    #[cfg(test)]
    pub fn unregister(scheme: &str) {
        DRIVER_FACTORIES.factories().retain(|f| !f.schemes().contains(&scheme));
    }

    pub fn open(uri: &str) -> Result<Box<dyn DriverConnection>> {
        let scheme = match uri.split_once(':') {
            Some((scheme, _)) => scheme,
            None => return Err(Error::InvalidUri { uri: uri.to_string(), reason: "missing scheme".to_string() }),
        };
        let scheme_regex = regex::Regex::new("^[a-zA-Z][a-zA-Z0-9+.-]*$")?;
        if !scheme_regex.is_match(scheme) {
            return Err(Error::InvalidUri { uri: uri.to_string(), reason: format!("invalid scheme '{}'", scheme) });
        }
        match DRIVER_FACTORIES.find(scheme) {
            Some(driver) => driver.open(uri).map_err(Error::from),
            None => Err(Error::DriverNotFound { scheme: scheme.to_string() }),
        }
    }

    fn find(&self, scheme: &str) -> Option<Arc<Box<dyn DriverFactory>>> {
        self.factories().iter().find(|factory| factory.schemes().contains(&scheme)).cloned()
    }

    // The registry only holds factories, a panic while holding the lock cannot leave it in an inconsistent state.
    fn factories(&self) -> MutexGuard<'_, Vec<Arc<Box<dyn DriverFactory>>>> {
        self.registered_factories.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
