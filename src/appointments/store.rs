use std::collections::HashSet;

use tracing::{debug, error};
use uuid::Uuid;

use super::error::StoreError;
use super::model::{AppointmentRecord, NewAppointment, ValidPatch};
use crate::auth::extractors::IdentityResolver;
use crate::documents::{DocumentStore, UserDocument};

/// Appointment operations scoped to the caller's own collection.
///
/// Holds no records itself: every call reads the user's document, and every
/// mutation writes the whole array back. Two sessions mutating the same user
/// concurrently can therefore lose one of the updates.
pub struct RecordStore<'a> {
    documents: &'a dyn DocumentStore,
    user_id: Option<Uuid>,
}

impl<'a> RecordStore<'a> {
    pub fn new(documents: &'a dyn DocumentStore, identity: &dyn IdentityResolver) -> Self {
        Self {
            documents,
            user_id: identity.current_user_id(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid, StoreError> {
        self.user_id.ok_or(StoreError::Unauthenticated)
    }

    async fn load(&self, user_id: Uuid) -> Result<Vec<AppointmentRecord>, StoreError> {
        match self.documents.read_user_document(user_id).await {
            Ok(doc) => Ok(doc.map(|d| d.records).unwrap_or_default()),
            Err(e) => {
                error!(error = %e, %user_id, "read user document failed");
                Err(StoreError::Read(e))
            }
        }
    }

    async fn save(&self, user_id: Uuid, records: Vec<AppointmentRecord>) -> Result<(), StoreError> {
        let len = records.len();
        let doc = UserDocument { records };
        if let Err(e) = self.documents.write_user_document(user_id, &doc).await {
            error!(error = %e, %user_id, "write user document failed");
            return Err(StoreError::Write(e));
        }
        debug!(%user_id, records = len, "user document written");
        Ok(())
    }

    /// Whole collection in stored order; empty if the user has none yet.
    pub async fn list(&self) -> Result<Vec<AppointmentRecord>, StoreError> {
        let user_id = self.user_id()?;
        self.load(user_id).await
    }

    /// Appends a new record under a fresh id and returns that id.
    pub async fn create(&self, new: NewAppointment) -> Result<String, StoreError> {
        let user_id = self.user_id()?;
        let mut records = self.load(user_id).await?;

        let mut id = Uuid::new_v4().to_string();
        while records.iter().any(|r| r.id == id) {
            id = Uuid::new_v4().to_string();
        }
        records.push(new.into_record(id.clone()));
        self.save(user_id, records).await?;

        debug!(%user_id, %id, "appointment created");
        Ok(id)
    }

    /// Merges `patch` into the record with `id`. Unknown ids are ignored.
    pub async fn update(&self, id: &str, patch: ValidPatch) -> Result<(), StoreError> {
        let user_id = self.user_id()?;
        let mut records = self.load(user_id).await?;

        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            debug!(%user_id, %id, "update skipped, id not found");
            return Ok(());
        };
        patch.apply(record);
        self.save(user_id, records).await?;

        debug!(%user_id, %id, "appointment updated");
        Ok(())
    }

    /// Removes the record with `id`. Unknown ids are ignored.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let ids = HashSet::from([id.to_string()]);
        self.delete_batch(&ids).await
    }

    /// Removes every record whose id is in `ids`; absent ids are ignored.
    pub async fn delete_batch(&self, ids: &HashSet<String>) -> Result<(), StoreError> {
        let user_id = self.user_id()?;
        if ids.is_empty() {
            return Ok(());
        }
        let mut records = self.load(user_id).await?;

        let before = records.len();
        records.retain(|r| !ids.contains(&r.id));
        let removed = before - records.len();
        if removed == 0 {
            debug!(%user_id, requested = ids.len(), "delete skipped, no ids matched");
            return Ok(());
        }
        self.save(user_id, records).await?;

        debug!(%user_id, removed, "appointments deleted");
        Ok(())
    }
}
