//! Best-effort JSON persistence on top of the settings store.

use bridge_traits::storage::SettingsStore;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) struct JsonSlot<T> {
    settings: Arc<dyn SettingsStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSlot<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub(crate) fn new(settings: Arc<dyn SettingsStore>, key: &'static str) -> Self {
        Self {
            settings,
            key,
            _marker: PhantomData,
        }
    }

    /// Read the stored value. Missing, unreadable or corrupt data yields
    /// `T::default()`.
    pub(crate) async fn load(&self) -> T {
        let raw = match self.settings.get_string(self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to read persisted state");
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = self.key, error = %e, "Discarding corrupt persisted state");
                T::default()
            }
        }
    }

    /// Write the value. Failures are logged and swallowed.
    pub(crate) async fn save(&self, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to serialize state");
                return;
            }
        };

        match self.settings.set_string(self.key, &raw).await {
            Ok(()) => debug!(key = self.key, bytes = raw.len(), "Persisted state"),
            Err(e) => warn!(key = self.key, error = %e, "Failed to persist state"),
        }
    }
}
