use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::organizations;

pub struct OrganizationRepository {
    conn: DatabaseConnection,
}

impl OrganizationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<organizations::Model>> {
        organizations::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query organization")
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<organizations::Model>> {
        organizations::Entity::find()
            .filter(organizations::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query organization by name")
    }

    pub async fn create(&self, name: &str) -> Result<organizations::Model> {
        let organization = organizations::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        organization
            .insert(&self.conn)
            .await
            .context("Failed to create organization")
    }
}
