use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::entities::batches;

pub struct BatchRepository {
    conn: DatabaseConnection,
}

impl BatchRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<batches::Model>> {
        batches::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query batch")
    }

    pub async fn create(&self, name: &str, organization_id: i32) -> Result<batches::Model> {
        let batch = batches::ActiveModel {
            name: Set(name.to_string()),
            organization_id: Set(organization_id),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        batch.insert(&self.conn).await.context("Failed to create batch")
    }
}
