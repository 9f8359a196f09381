use anyhow::Result;
use async_trait::async_trait;
use storage::Storage;

use crate::theme::PreferenceStore;

/// Preference store backed by the local sqlite database.
pub struct DurablePreferenceStore {
    storage: Storage,
}

impl DurablePreferenceStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl PreferenceStore for DurablePreferenceStore {
    async fn load_preference(&self, key: &str) -> Result<Option<String>> {
        self.storage.load_preference(key).await
    }

    async fn save_preference(&self, key: &str, value: &str) -> Result<()> {
        self.storage.save_preference(key, value).await
    }
}
