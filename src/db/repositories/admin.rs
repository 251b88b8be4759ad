use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::admins;

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<admins::Model>> {
        admins::Entity::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin by username")
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<admins::Model>> {
        admins::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin by id")
    }

    /// New admins start unverified; verification is a manual step.
    pub async fn create(&self, username: &str, password_hash: &str) -> Result<admins::Model> {
        let now = Utc::now().to_rfc3339();

        let admin = admins::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            is_verified: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        admin.insert(&self.conn).await.context("Failed to create admin")
    }
}
