use super::{checks::default_check, TestFunc};
use crate::error::{HcheckError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_TEST: &str = "default";

/// Named health tests, populated at startup.
///
/// Register everything before serving: once the registry is handed to a
/// [`HealthEndpoint`](crate::HealthEndpoint) it is shared read-only and cannot
/// be changed for the rest of the process.
#[derive(Clone)]
pub struct Registry {
    tests: BTreeMap<String, Arc<dyn TestFunc>>,
}

impl Registry {
    /// A registry holding only the always-available `"default"` test.
    pub fn new() -> Self {
        let mut tests: BTreeMap<String, Arc<dyn TestFunc>> = BTreeMap::new();
        tests.insert(DEFAULT_TEST.to_string(), Arc::new(default_check));
        Self { tests }
    }

    /// Adds `test` under `name`. Registering a name twice is a wiring mistake
    /// and is reported as [`HcheckError::DuplicateTest`].
    pub fn register<T>(&mut self, name: impl Into<String>, test: T) -> Result<&mut Self>
    where
        T: TestFunc + 'static,
    {
        let name = name.into();
        if self.tests.contains_key(&name) {
            return Err(HcheckError::DuplicateTest(name));
        }

        debug!("Registered health test '{}'", name);
        self.tests.insert(name, Arc::new(test));
        Ok(self)
    }

    pub fn with_test<T>(mut self, name: impl Into<String>, test: T) -> Result<Self>
    where
        T: TestFunc + 'static,
    {
        self.register(name, test)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tests.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tests.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn TestFunc>)> {
        self.tests.iter().map(|(name, test)| (name.as_str(), test))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tests", &self.tests.keys().collect::<Vec<_>>())
            .finish()
    }
}
