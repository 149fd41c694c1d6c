//! Per-user document persistence: one document per user holding the whole
//! appointment array. Writes replace the array in one step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::appointments::model::AppointmentRecord;

mod memory;
mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    pub records: Vec<AppointmentRecord>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `None` when the user has never written anything.
    async fn read_user_document(&self, user_id: Uuid) -> anyhow::Result<Option<UserDocument>>;
    async fn write_user_document(&self, user_id: Uuid, doc: &UserDocument) -> anyhow::Result<()>;
}
