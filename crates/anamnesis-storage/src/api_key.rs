use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StorageError;
use crate::store::LocalStore;

pub const API_KEY_KEY: &str = "api_key";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredApiKey {
    api_key: String,
    saved_at: jiff::Timestamp,
}

/// The Gemini API key saved on this machine.
#[derive(Debug, Clone)]
pub struct ApiKeyStore {
    store: LocalStore,
}

impl ApiKeyStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn load_api_key(&self) -> Result<Option<String>, StorageError> {
        let stored: Option<StoredApiKey> = self.store.load_state(API_KEY_KEY).await?;
        Ok(stored
            .map(|s| s.api_key)
            .filter(|key| !key.trim().is_empty()))
    }

    /// Save a key, trimmed. Blank keys are rejected.
    pub async fn save_api_key(&self, key: &str) -> Result<(), StorageError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(StorageError::EmptyApiKey);
        }
        let stored = StoredApiKey {
            api_key: key.to_string(),
            saved_at: jiff::Timestamp::now(),
        };
        self.store.save_state(API_KEY_KEY, &stored).await?;
        info!("API key saved");
        Ok(())
    }

    /// Forget the saved key. Returns whether one was stored.
    pub async fn clear_api_key(&self) -> Result<bool, StorageError> {
        let removed = self.store.delete_state(API_KEY_KEY).await?;
        if removed {
            info!("API key cleared");
        }
        Ok(removed)
    }
}
