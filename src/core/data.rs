//! Keyed data and global settings on top of the store.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::store::JsonStore;
use super::window::EventSink;
use crate::shared::events::AppEvent;
use crate::shared::settings::{GlobalSettings, SETTINGS_KEY};
use crate::shared::types::{LoadResult, SaveResult};
use crate::shared::AppResult;

/// Arbitrary JSON values addressed by string key, shared by all widgets.
#[derive(Clone)]
pub struct DataService {
    store: Arc<JsonStore>,
}

impl DataService {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    pub async fn save_data(&self, key: &str, value: Value) -> SaveResult {
        let result = self
            .store
            .update(|document| {
                document.data.insert(key.to_string(), value);
                true
            })
            .await;
        match result {
            Ok(_) => {
                tracing::debug!(key, "data saved");
                SaveResult::ok()
            }
            Err(e) => {
                tracing::error!(key, error = %e, "failed to save data");
                SaveResult::failed(e)
            }
        }
    }

    /// `data` is `null` when nothing is stored under `key`.
    pub async fn load_data(&self, key: &str) -> LoadResult {
        let document = self.store.read().await;
        LoadResult {
            success: true,
            data: document.data.get(key).cloned().unwrap_or(Value::Null),
            error: None,
        }
    }
}

/// In-memory settings, persisted under `data.__settings` and pushed to every
/// window whenever they change.
pub struct SettingsService<E> {
    store: Arc<JsonStore>,
    sink: E,
    current: Mutex<GlobalSettings>,
}

impl<E: EventSink> SettingsService<E> {
    /// Start from the stored settings, or the defaults.
    pub async fn load(store: Arc<JsonStore>, sink: E) -> Self {
        let document = store.read().await;
        let current = match document.data.get(SETTINGS_KEY) {
            Some(stored) => GlobalSettings::from_stored(stored),
            None => GlobalSettings::default(),
        };
        tracing::debug!(?current, "settings loaded");
        Self {
            store,
            sink,
            current: Mutex::new(current),
        }
    }

    /// Merge `partial` over the current settings, persist and broadcast the
    /// result. A failed write is logged; the new settings still apply for
    /// this session.
    pub async fn update(&self, partial: &Map<String, Value>) -> AppResult<GlobalSettings> {
        let merged = {
            let mut current = self.current.lock().await;
            let mut next = current.clone();
            next.merge(partial)?;

            let stored = next.to_value();
            let result = self
                .store
                .update(|document| {
                    document.data.insert(SETTINGS_KEY.to_string(), stored);
                    true
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "failed to persist settings");
            }

            *current = next.clone();
            next
        };

        if let Err(e) = self.sink.broadcast(&AppEvent::SettingsUpdated(merged.clone())) {
            tracing::warn!(error = %e, "failed to broadcast settings");
        }
        Ok(merged)
    }

    /// Stored settings if any, otherwise the in-memory copy.
    pub async fn get(&self) -> GlobalSettings {
        let document = self.store.read().await;
        match document.data.get(SETTINGS_KEY) {
            Some(stored) => GlobalSettings::from_stored(stored),
            None => self.current.lock().await.clone(),
        }
    }
}
