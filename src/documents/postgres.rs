use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::{DocumentStore, UserDocument};
use crate::appointments::model::AppointmentRecord;

#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn read_user_document(&self, user_id: Uuid) -> anyhow::Result<Option<UserDocument>> {
        let row = sqlx::query_as::<_, (Json<Vec<AppointmentRecord>>,)>(
            r#"
            SELECT records
              FROM user_documents
             WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("select user document")?;

        Ok(row.map(|(Json(records),)| UserDocument { records }))
    }

    async fn write_user_document(&self, user_id: Uuid, doc: &UserDocument) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_documents (user_id, records, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id)
            DO UPDATE SET records = EXCLUDED.records, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(Json(&doc.records))
        .execute(&self.db)
        .await
        .context("upsert user document")?;

        Ok(())
    }
}
