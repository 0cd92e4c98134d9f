use std::collections::BTreeMap;

use super::{Backend, BackendKind};
use crate::error::Result;

/// Process-memory map. Gone when the value is dropped.
#[derive(Debug, Default, Clone)]
pub struct SessionBackend {
    data: BTreeMap<String, String>,
}

impl SessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Backend for SessionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Session
    }

    fn set_item(&mut self, key: &str, value: &str, _expires_at: Option<i64>) -> Result<()> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).cloned())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.keys().cloned().collect())
    }
}
