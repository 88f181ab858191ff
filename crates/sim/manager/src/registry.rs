//! Driver registry
//!
//! The composition root registers one factory per driver backend and asks the
//! registry for a driver whenever a modem appears. Factories are probed most
//! recently registered first; the first one that accepts the modem wins.

use std::fmt;

use tracing::{debug, warn};

use crate::driver::SimDriver;
use crate::error::SimError;

/// Factory that returns a driver if it can handle the named modem
pub type DriverFactory = Box<dyn Fn(&str) -> Option<Box<dyn SimDriver>>>;

struct Entry {
    name: String,
    factory: DriverFactory,
}

/// Registry of SIM driver backends
#[derive(Default)]
pub struct DriverRegistry {
    entries: Vec<Entry>,
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}

impl DriverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver factory under `name`
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Option<Box<dyn SimDriver>> + 'static,
    {
        let name = name.into();
        if self.unregister(&name) {
            warn!(driver = %name, "Replacing registered SIM driver");
        }
        debug!(driver = %name, "Registering SIM driver");
        self.entries.push(Entry {
            name,
            factory: Box::new(factory),
        });
    }

    /// Remove the factory registered under `name`
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        self.entries.len() != before
    }

    /// Names of the registered drivers, most recent first
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().rev().map(|e| e.name.as_str()).collect()
    }

    /// Find a driver for `modem`
    ///
    /// With `driver` set only that factory is tried.
    pub fn probe(&self, modem: &str, driver: Option<&str>) -> Result<Box<dyn SimDriver>, SimError> {
        self.entries
            .iter()
            .rev()
            .filter(|entry| driver.is_none_or(|name| entry.name == name))
            .find_map(|entry| {
                let found = (entry.factory)(modem);
                debug!(driver = %entry.name, modem, accepted = found.is_some(), "Probed SIM driver");
                found
            })
            .ok_or_else(|| SimError::NoDriver(modem.to_string()))
    }
}
