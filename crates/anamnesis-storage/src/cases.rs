//! Case history: a newest-first list of saved cases in one state file.

use anamnesis_core::models::saved_case::SavedCase;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::StorageError;
use crate::store::LocalStore;

pub const CASES_KEY: &str = "saved_cases";

#[derive(Debug)]
pub struct CaseStore {
    store: LocalStore,
    // Serializes read-modify-write cycles on the cases file.
    write_lock: Mutex<()>,
}

impl CaseStore {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// All saved cases, newest first.
    ///
    /// A missing file is an empty history. An unreadable or corrupt file is
    /// logged and also treated as empty.
    pub async fn load_cases(&self) -> Vec<SavedCase> {
        match self.store.load_state::<Vec<SavedCase>>(CASES_KEY).await {
            Ok(cases) => cases.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "failed to load saved cases, starting with an empty history");
                Vec::new()
            }
        }
    }

    /// Put `case` at the front of the history and return the new list.
    ///
    /// A case without a chief complaint is refused. Saving a case whose id is
    /// already stored moves it to the front with the new contents.
    pub async fn save_case(&self, case: SavedCase) -> Result<Vec<SavedCase>, StorageError> {
        if case.anamnesis_data.chief_complaint.trim().is_empty() {
            return Err(StorageError::InvalidCase(
                "queixaPrincipal is required to save a case".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut cases = self.history_for_write().await?;
        cases.retain(|c| c.id != case.id);

        let id = case.id.clone();
        cases.insert(0, case);
        self.store.save_state(CASES_KEY, &cases).await?;

        info!(case_id = %id, total = cases.len(), "case saved");
        Ok(cases)
    }

    /// Remove a case and return the remaining list.
    pub async fn delete_case(&self, id: &str) -> Result<Vec<SavedCase>, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut cases = self.history_for_write().await?;

        let before = cases.len();
        cases.retain(|c| c.id != id);
        if cases.len() == before {
            return Err(StorageError::NotFound { key: id.to_string() });
        }

        self.store.save_state(CASES_KEY, &cases).await?;
        info!(case_id = %id, total = cases.len(), "case deleted");
        Ok(cases)
    }

    /// The history a save or delete builds on. A corrupt file is replaced;
    /// a file that cannot be read fails the write so it is never overwritten.
    async fn history_for_write(&self) -> Result<Vec<SavedCase>, StorageError> {
        match self.store.load_state::<Vec<SavedCase>>(CASES_KEY).await {
            Ok(cases) => Ok(cases.unwrap_or_default()),
            Err(StorageError::Serialization(e)) => {
                warn!(error = %e, "saved cases file is corrupt, replacing it");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_case(&self, id: &str) -> Option<SavedCase> {
        self.load_cases().await.into_iter().find(|c| c.id == id)
    }
}
