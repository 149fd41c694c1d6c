use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, UserDocument};

/// In-process document store. Used by tests and the fake app state.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<Uuid, UserDocument>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read_user_document(&self, user_id: Uuid) -> anyhow::Result<Option<UserDocument>> {
        Ok(self.docs.read().await.get(&user_id).cloned())
    }

    async fn write_user_document(&self, user_id: Uuid, doc: &UserDocument) -> anyhow::Result<()> {
        self.docs.write().await.insert(user_id, doc.clone());
        Ok(())
    }
}
