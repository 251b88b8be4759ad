use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::teachers;

pub struct TeacherRepository {
    conn: DatabaseConnection,
}

pub struct NewTeacher {
    pub email: String,
    pub phone_number: String,
    pub name: Option<String>,
    pub password_hash: String,
}

impl TeacherRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<teachers::Model>> {
        teachers::Entity::find()
            .filter(teachers::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query teacher by email")
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<teachers::Model>> {
        teachers::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query teacher by id")
    }

    /// New teachers are active but unverified until their phone is confirmed.
    pub async fn create(&self, new_teacher: NewTeacher) -> Result<teachers::Model> {
        let now = Utc::now().to_rfc3339();

        let teacher = teachers::ActiveModel {
            email: Set(new_teacher.email),
            phone_number: Set(new_teacher.phone_number),
            name: Set(new_teacher.name),
            password_hash: Set(new_teacher.password_hash),
            phone_verified: Set(false),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        teacher
            .insert(&self.conn)
            .await
            .context("Failed to create teacher")
    }
}
