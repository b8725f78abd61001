use std::fmt;

use highvocab_core::{KeyValueStore, StoreError};
use serde_json::Value;

/// Store key of the translation service credential.
pub const API_KEY_STORAGE_KEY: &str = "deeplApiKey";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsStatus {
    Loaded,
    Missing,
    Saved,
    Empty,
    Failed(String),
}

impl SettingsStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, SettingsStatus::Empty | SettingsStatus::Failed(_))
    }
}

impl fmt::Display for SettingsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsStatus::Loaded => write!(f, "API key loaded."),
            SettingsStatus::Missing => write!(f, "Enter your DeepL API key."),
            SettingsStatus::Saved => write!(f, "DeepL API key saved."),
            SettingsStatus::Empty => write!(f, "Please enter a valid API key."),
            SettingsStatus::Failed(message) => write!(f, "{message}"),
        }
    }
}

/// Stored credential, `None` when absent or blank.
pub async fn read_api_key<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<String>, StoreError> {
    let key = match store.get(API_KEY_STORAGE_KEY).await? {
        Some(Value::String(key)) => key.trim().to_string(),
        Some(other) => {
            tracing::warn!("Ignoring non-string API key value: {other}");
            return Ok(None);
        }
        None => return Ok(None),
    };
    Ok((!key.is_empty()).then_some(key))
}

pub async fn load_api_key<S: KeyValueStore + ?Sized>(store: &S) -> (Option<String>, SettingsStatus) {
    match read_api_key(store).await {
        Ok(Some(key)) => (Some(key), SettingsStatus::Loaded),
        Ok(None) => (None, SettingsStatus::Missing),
        Err(e) => (None, SettingsStatus::Failed(format!("Could not read the key: {e}"))),
    }
}

/// Trim and persist a credential typed by the user.
pub async fn save_api_key<S: KeyValueStore + ?Sized>(store: &S, raw: &str) -> SettingsStatus {
    let key = raw.trim();
    if key.is_empty() {
        return SettingsStatus::Empty;
    }

    match store.set(API_KEY_STORAGE_KEY, Value::String(key.to_string())).await {
        Ok(()) => {
            tracing::info!("API key updated");
            SettingsStatus::Saved
        }
        Err(e) => SettingsStatus::Failed(format!("Could not save the key: {e}")),
    }
}
