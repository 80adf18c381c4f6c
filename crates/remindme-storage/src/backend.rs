//! Key-value persistence seam.

use std::collections::HashMap;
use std::sync::Mutex;

use remindme_core::error::{RemindmeError, Result};

/// Opaque string-valued persistence keyed by name.
///
/// Reads and writes are whole values; callers serialize their own state.
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local backend. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|e| RemindmeError::Storage(format!("Lock poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| RemindmeError::Storage(format!("Lock poisoned: {}", e)))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_get_missing() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("reminders").unwrap(), None);
    }

    #[test]
    fn test_memory_set_overwrites() {
        let backend = MemoryBackend::new();
        backend.set("k", "one").unwrap();
        backend.set("k", "two").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("two"));
    }
}
