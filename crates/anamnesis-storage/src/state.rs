use serde::{Serialize, de::DeserializeOwned};

use crate::error::StorageError;
use crate::objects;
use crate::store::LocalStore;

impl LocalStore {
    /// Load a JSON state value. Returns `None` when the key has never been
    /// written.
    pub async fn load_state<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let path = self.path_for(key)?;
        match objects::read_object(&path).await? {
            Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
            None => Ok(None),
        }
    }

    /// Save a JSON state value, replacing any previous one atomically.
    pub async fn save_state<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let body = serde_json::to_vec_pretty(value)?;
        objects::write_object(&path, &body).await
    }

    /// Remove a state value. Returns whether it existed.
    pub async fn delete_state(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        objects::delete_object(&path).await
    }
}
