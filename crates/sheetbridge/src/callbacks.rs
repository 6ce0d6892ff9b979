//! Named functions the backend can invoke through `runMacro` and alert callbacks.

use std::collections::HashMap;
use std::fmt;

use sheetbridge_protocol::Value;

use crate::error::Result;
use crate::host::Host;

/// A registered callback. It receives the host and the arguments sent by the backend.
pub type Callback = Box<dyn Fn(&mut dyn Host, &[Value]) -> Result<()> + Send + Sync>;

/// Registry of callbacks by name.
#[derive(Default)]
pub struct Callbacks {
    map: HashMap<String, Callback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`, replacing any earlier registration
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut dyn Host, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        self.map.insert(name.into(), Box::new(f));
        self
    }

    /// Builder form of [`register`](Self::register)
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut dyn Host, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        self.register(name, f);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Callback> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.map.keys().collect();
        names.sort();
        f.debug_struct("Callbacks").field("names", &names).finish()
    }
}
