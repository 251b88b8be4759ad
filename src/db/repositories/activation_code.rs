use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::activation_codes;

pub struct ActivationCodeRepository {
    conn: DatabaseConnection,
}

impl ActivationCodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_email(&self, student_email: &str) -> Result<Option<activation_codes::Model>> {
        activation_codes::Entity::find()
            .filter(activation_codes::Column::StudentEmail.eq(student_email))
            .one(&self.conn)
            .await
            .context("Failed to query activation code by email")
    }

    /// One record per recipient: a re-invite replaces the stored code rather
    /// than stacking a second row (codes are never reused across records for
    /// the same email).
    pub async fn upsert(
        &self,
        organization_id: i32,
        student_email: &str,
        activation_code: &str,
    ) -> Result<activation_codes::Model> {
        let existing = self.get_by_email(student_email).await?;

        if let Some(existing) = existing {
            let mut active: activation_codes::ActiveModel = existing.into();
            active.organization_id = Set(organization_id);
            active.activation_code = Set(activation_code.to_string());
            return active
                .update(&self.conn)
                .await
                .context("Failed to replace activation code");
        }

        let record = activation_codes::ActiveModel {
            organization_id: Set(organization_id),
            student_email: Set(student_email.to_string()),
            activation_code: Set(activation_code.to_string()),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        record
            .insert(&self.conn)
            .await
            .context("Failed to create activation code")
    }

    pub async fn list(&self, skip: u64, limit: u64) -> Result<Vec<activation_codes::Model>> {
        activation_codes::Entity::find()
            .order_by_asc(activation_codes::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list activation codes")
    }

    pub async fn count(&self) -> Result<u64> {
        activation_codes::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count activation codes")
    }
}
