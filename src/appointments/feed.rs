use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use super::error::StoreError;
use super::model::AppointmentRecord;
use super::store::RecordStore;

pub type Snapshot = Arc<Vec<AppointmentRecord>>;

/// Latest known collection per user, for clients that want to be told
/// when it changes instead of polling.
#[derive(Clone, Default)]
pub struct RecordFeed {
    channels: Arc<Mutex<HashMap<Uuid, watch::Sender<Snapshot>>>>,
}

impl RecordFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot for `user_id`. Users nobody is watching keep no
    /// channel; one whose last subscriber went away is dropped here.
    pub fn publish(&self, user_id: Uuid, records: Vec<AppointmentRecord>) {
        let len = records.len();
        let mut channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        match channels.get(&user_id).map(|tx| tx.receiver_count()) {
            Some(0) => {
                channels.remove(&user_id);
                debug!(%user_id, "no subscribers left, channel dropped");
            }
            Some(_) => {
                if let Some(tx) = channels.get(&user_id) {
                    tx.send_replace(Arc::new(records));
                }
                debug!(%user_id, records = len, "snapshot published");
            }
            None => {}
        }
    }

    /// Receiver starting at the most recent snapshot for `user_id`.
    pub fn subscribe(&self, user_id: Uuid) -> watch::Receiver<Snapshot> {
        let mut channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        channels
            .entry(user_id)
            .or_insert_with(|| watch::channel(Snapshot::default()).0)
            .subscribe()
    }

    #[cfg(test)]
    fn watched(&self) -> usize {
        self.channels.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Re-reads the collection through `store` and publishes it.
    pub async fn refresh(&self, store: &RecordStore<'_>) -> Result<Vec<AppointmentRecord>, StoreError> {
        let user_id = store.user_id()?;
        let records = store.list().await?;
        self.publish(user_id, records.clone());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::model::{AppointmentStatus, NewAppointment, ServiceType};
    use crate::documents::MemoryDocumentStore;

    fn record(name: &str) -> AppointmentRecord {
        NewAppointment {
            client_name: name.into(),
            phone: "(11) 9 1111-2222".into(),
            date: "01/01/2025".into(),
            time: "09:00".into(),
            service_type: ServiceType::Haircut,
            price: 35.0,
            status: AppointmentStatus::Scheduled,
        }
        .into_record(Uuid::new_v4().to_string())
    }

    #[tokio::test]
    async fn subscriber_sees_refreshed_snapshot() {
        let docs = MemoryDocumentStore::new();
        let user = Uuid::new_v4();
        let store = RecordStore::new(&docs, &Some(user));
        let feed = RecordFeed::new();

        let mut rx = feed.subscribe(user);
        assert!(rx.borrow_and_update().is_empty());

        store
            .create(NewAppointment {
                client_name: "Ana".into(),
                phone: "(11) 9 1111-2222".into(),
                date: "01/01/2025".into(),
                time: "09:00".into(),
                service_type: ServiceType::Beard,
                price: 25.0,
                status: AppointmentStatus::Scheduled,
            })
            .await
            .unwrap();
        let refreshed = feed.refresh(&store).await.unwrap();
        assert_eq!(refreshed.len(), 1);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
        assert_eq!(rx.borrow()[0].client_name, "Ana");
    }

    #[tokio::test]
    async fn subscriber_starts_from_latest_while_watched() {
        let feed = RecordFeed::new();
        let user = Uuid::new_v4();
        let first = feed.subscribe(user);
        feed.publish(user, vec![record("Ana")]);
        feed.publish(user, vec![record("Ana"), record("Bruno")]);

        let late = feed.subscribe(user);
        assert_eq!(late.borrow().len(), 2);
        assert_eq!(first.borrow().len(), 2);
        assert!(feed.subscribe(Uuid::new_v4()).borrow().is_empty());
    }

    #[tokio::test]
    async fn channels_are_dropped_once_unwatched() {
        let feed = RecordFeed::new();
        let user = Uuid::new_v4();

        feed.publish(user, vec![record("Ana")]);
        assert_eq!(feed.watched(), 0);

        let rx = feed.subscribe(user);
        feed.publish(user, vec![record("Ana")]);
        assert_eq!(feed.watched(), 1);

        drop(rx);
        feed.publish(user, Vec::new());
        assert_eq!(feed.watched(), 0);
    }

    #[tokio::test]
    async fn refresh_requires_identity() {
        let docs = MemoryDocumentStore::new();
        let store = RecordStore::new(&docs, &None::<Uuid>);
        let err = RecordFeed::new().refresh(&store).await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthenticated));
    }
}
