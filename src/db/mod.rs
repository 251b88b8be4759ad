use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::student::StudentKey;
pub use repositories::teacher::NewTeacher;

use crate::entities::{activation_codes, admins, batches, organizations, students, teachers};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with("sqlite::memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    fn teacher_repo(&self) -> repositories::teacher::TeacherRepository {
        repositories::teacher::TeacherRepository::new(self.conn.clone())
    }

    fn student_repo(&self) -> repositories::student::StudentRepository {
        repositories::student::StudentRepository::new(self.conn.clone())
    }

    fn organization_repo(&self) -> repositories::organization::OrganizationRepository {
        repositories::organization::OrganizationRepository::new(self.conn.clone())
    }

    fn batch_repo(&self) -> repositories::batch::BatchRepository {
        repositories::batch::BatchRepository::new(self.conn.clone())
    }

    fn activation_code_repo(&self) -> repositories::activation_code::ActivationCodeRepository {
        repositories::activation_code::ActivationCodeRepository::new(self.conn.clone())
    }

    // Admins

    pub async fn get_admin_by_username(&self, username: &str) -> Result<Option<admins::Model>> {
        self.admin_repo().get_by_username(username).await
    }

    pub async fn get_admin(&self, id: i32) -> Result<Option<admins::Model>> {
        self.admin_repo().get_by_id(id).await
    }

    pub async fn create_admin(&self, username: &str, password_hash: &str) -> Result<admins::Model> {
        self.admin_repo().create(username, password_hash).await
    }

    // Teachers

    pub async fn get_teacher_by_email(&self, email: &str) -> Result<Option<teachers::Model>> {
        self.teacher_repo().get_by_email(email).await
    }

    pub async fn get_teacher(&self, id: i32) -> Result<Option<teachers::Model>> {
        self.teacher_repo().get_by_id(id).await
    }

    pub async fn create_teacher(&self, new_teacher: NewTeacher) -> Result<teachers::Model> {
        self.teacher_repo().create(new_teacher).await
    }

    // Students

    pub async fn get_student(&self, key: &StudentKey) -> Result<Option<students::Model>> {
        self.student_repo().get(key).await
    }

    pub async fn create_student_with_otp(
        &self,
        email: Option<String>,
        phone_number: Option<String>,
        otp: String,
        otp_expires_at: DateTime<Utc>,
    ) -> Result<students::Model> {
        self.student_repo()
            .create_with_otp(email, phone_number, otp, otp_expires_at)
            .await
    }

    pub async fn set_student_otp(
        &self,
        key: &StudentKey,
        otp: &str,
        otp_expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.student_repo().set_otp(key, otp, otp_expires_at).await
    }

    pub async fn bump_student_otp_attempts(&self, key: &StudentKey) -> Result<()> {
        self.student_repo().bump_otp_attempts(key).await
    }

    pub async fn mark_student_phone_verified(&self, phone_number: &str) -> Result<()> {
        self.student_repo().mark_phone_verified(phone_number).await
    }

    pub async fn mark_student_email_verified(&self, email: &str) -> Result<()> {
        self.student_repo().mark_email_verified(email).await
    }

    pub async fn set_student_web_otp(
        &self,
        student_id: i32,
        web_otp: &str,
        web_otp_expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.student_repo()
            .set_web_otp(student_id, web_otp, web_otp_expires_at)
            .await
    }

    pub async fn bump_student_web_otp_attempts(&self, student_id: i32) -> Result<()> {
        self.student_repo().bump_web_otp_attempts(student_id).await
    }

    pub async fn mark_student_web_login(&self, student_id: i32, login_at: &str) -> Result<()> {
        self.student_repo().mark_web_login(student_id, login_at).await
    }

    pub async fn bump_student_activation_attempts(&self, email: &str) -> Result<()> {
        self.student_repo().bump_activation_attempts(email).await
    }

    pub async fn join_student_to_organization(
        &self,
        email: &str,
        organization_id: i32,
    ) -> Result<()> {
        self.student_repo().join_organization(email, organization_id).await
    }

    pub async fn join_student_to_batch(&self, student_id: i32, batch_id: i32) -> Result<()> {
        self.student_repo().join_batch(student_id, batch_id).await
    }

    pub async fn remove_student_from_batch(&self, student_id: i32) -> Result<()> {
        self.student_repo().leave_batch(student_id).await
    }

    pub async fn deactivate_student(&self, student_id: i32) -> Result<()> {
        self.student_repo().deactivate(student_id).await
    }

    // Organizations & batches

    pub async fn get_organization(&self, id: i32) -> Result<Option<organizations::Model>> {
        self.organization_repo().get(id).await
    }

    pub async fn get_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<organizations::Model>> {
        self.organization_repo().get_by_name(name).await
    }

    pub async fn create_organization(&self, name: &str) -> Result<organizations::Model> {
        self.organization_repo().create(name).await
    }

    pub async fn get_batch(&self, id: i32) -> Result<Option<batches::Model>> {
        self.batch_repo().get(id).await
    }

    pub async fn create_batch(&self, name: &str, organization_id: i32) -> Result<batches::Model> {
        self.batch_repo().create(name, organization_id).await
    }

    // Activation codes

    pub async fn get_activation_code_by_email(
        &self,
        student_email: &str,
    ) -> Result<Option<activation_codes::Model>> {
        self.activation_code_repo().get_by_email(student_email).await
    }

    pub async fn upsert_activation_code(
        &self,
        organization_id: i32,
        student_email: &str,
        activation_code: &str,
    ) -> Result<activation_codes::Model> {
        self.activation_code_repo()
            .upsert(organization_id, student_email, activation_code)
            .await
    }

    pub async fn list_activation_codes(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<activation_codes::Model>> {
        self.activation_code_repo().list(skip, limit).await
    }

    pub async fn count_activation_codes(&self) -> Result<u64> {
        self.activation_code_repo().count().await
    }
}
