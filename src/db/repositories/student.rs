use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::students;

/// Lookup key for a student record; phone and email OTP flows address the
/// same row through different unique handles.
#[derive(Debug, Clone)]
pub enum StudentKey {
    Id(i32),
    Email(String),
    Phone(String),
}

impl StudentKey {
    fn condition(&self) -> Condition {
        match self {
            Self::Id(id) => Condition::all().add(students::Column::Id.eq(*id)),
            Self::Email(email) => Condition::all().add(students::Column::Email.eq(email.clone())),
            Self::Phone(phone) => {
                Condition::all().add(students::Column::PhoneNumber.eq(phone.clone()))
            }
        }
    }
}

pub struct StudentRepository {
    conn: DatabaseConnection,
}

impl StudentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &StudentKey) -> Result<Option<students::Model>> {
        students::Entity::find()
            .filter(key.condition())
            .one(&self.conn)
            .await
            .context("Failed to query student")
    }

    /// First OTP request creates the record; the issuance itself counts as
    /// attempt 1.
    pub async fn create_with_otp(
        &self,
        email: Option<String>,
        phone_number: Option<String>,
        otp: String,
        otp_expires_at: DateTime<Utc>,
    ) -> Result<students::Model> {
        let now = Utc::now().to_rfc3339();

        let student = students::ActiveModel {
            email: Set(email),
            phone_number: Set(phone_number),
            otp: Set(Some(otp)),
            otp_expires_at: Set(Some(otp_expires_at.to_rfc3339())),
            otp_attempts: Set(1),
            is_active: Set(true),
            phone_verified: Set(false),
            web_otp_attempts: Set(0),
            live_class_enabled: Set(false),
            activation_attempts: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        student
            .insert(&self.conn)
            .await
            .context("Failed to create student")
    }

    /// Overwrite the login OTP and bump the shared attempts counter.
    /// Issuance and failed verification both land here; the increment is a
    /// storage-level expression so concurrent calls cannot under-count.
    pub async fn set_otp(
        &self,
        key: &StudentKey,
        otp: &str,
        otp_expires_at: DateTime<Utc>,
    ) -> Result<()> {
        students::Entity::update_many()
            .col_expr(students::Column::Otp, Expr::value(otp))
            .col_expr(
                students::Column::OtpExpiresAt,
                Expr::value(otp_expires_at.to_rfc3339()),
            )
            .col_expr(
                students::Column::OtpAttempts,
                Expr::col(students::Column::OtpAttempts).add(1),
            )
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(key.condition())
            .exec(&self.conn)
            .await
            .context("Failed to set student OTP")?;

        Ok(())
    }

    /// Count a failed verification without touching the stored code.
    pub async fn bump_otp_attempts(&self, key: &StudentKey) -> Result<()> {
        students::Entity::update_many()
            .col_expr(
                students::Column::OtpAttempts,
                Expr::col(students::Column::OtpAttempts).add(1),
            )
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(key.condition())
            .exec(&self.conn)
            .await
            .context("Failed to bump student OTP attempts")?;

        Ok(())
    }

    /// Successful phone verification: attempts reset, phone marked verified.
    pub async fn mark_phone_verified(&self, phone_number: &str) -> Result<()> {
        students::Entity::update_many()
            .col_expr(students::Column::PhoneVerified, Expr::value(true))
            .col_expr(students::Column::OtpAttempts, Expr::value(0))
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(students::Column::PhoneNumber.eq(phone_number))
            .exec(&self.conn)
            .await
            .context("Failed to mark student phone verified")?;

        Ok(())
    }

    /// Successful email verification: attempts reset, account activated.
    pub async fn mark_email_verified(&self, email: &str) -> Result<()> {
        students::Entity::update_many()
            .col_expr(students::Column::IsActive, Expr::value(true))
            .col_expr(students::Column::OtpAttempts, Expr::value(0))
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(students::Column::Email.eq(email))
            .exec(&self.conn)
            .await
            .context("Failed to mark student email verified")?;

        Ok(())
    }

    /// Overwrite the web OTP; mirrors [`Self::set_otp`] for the web channel.
    pub async fn set_web_otp(
        &self,
        student_id: i32,
        web_otp: &str,
        web_otp_expires_at: DateTime<Utc>,
    ) -> Result<()> {
        students::Entity::update_many()
            .col_expr(students::Column::WebOtp, Expr::value(web_otp))
            .col_expr(
                students::Column::WebOtpExpiresAt,
                Expr::value(web_otp_expires_at.to_rfc3339()),
            )
            .col_expr(
                students::Column::WebOtpAttempts,
                Expr::col(students::Column::WebOtpAttempts).add(1),
            )
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(students::Column::Id.eq(student_id))
            .exec(&self.conn)
            .await
            .context("Failed to set student web OTP")?;

        Ok(())
    }

    pub async fn bump_web_otp_attempts(&self, student_id: i32) -> Result<()> {
        students::Entity::update_many()
            .col_expr(
                students::Column::WebOtpAttempts,
                Expr::col(students::Column::WebOtpAttempts).add(1),
            )
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(students::Column::Id.eq(student_id))
            .exec(&self.conn)
            .await
            .context("Failed to bump student web OTP attempts")?;

        Ok(())
    }

    /// Successful web login: attempts reset, login time recorded.
    pub async fn mark_web_login(&self, student_id: i32, login_at: &str) -> Result<()> {
        students::Entity::update_many()
            .col_expr(students::Column::WebOtpAttempts, Expr::value(0))
            .col_expr(students::Column::LastWebLoginAt, Expr::value(login_at))
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(students::Column::Id.eq(student_id))
            .exec(&self.conn)
            .await
            .context("Failed to record student web login")?;

        Ok(())
    }

    /// Failed organization-join attempt; atomic increment, same reasoning as
    /// the OTP counters.
    pub async fn bump_activation_attempts(&self, email: &str) -> Result<()> {
        students::Entity::update_many()
            .col_expr(
                students::Column::ActivationAttempts,
                Expr::col(students::Column::ActivationAttempts).add(1),
            )
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(students::Column::Email.eq(email))
            .exec(&self.conn)
            .await
            .context("Failed to bump student activation attempts")?;

        Ok(())
    }

    /// Successful redemption: membership flips and the join counter resets.
    pub async fn join_organization(&self, email: &str, organization_id: i32) -> Result<()> {
        students::Entity::update_many()
            .col_expr(students::Column::OrganizationId, Expr::value(organization_id))
            .col_expr(students::Column::LiveClassEnabled, Expr::value(true))
            .col_expr(students::Column::ActivationAttempts, Expr::value(0))
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(students::Column::Email.eq(email))
            .exec(&self.conn)
            .await
            .context("Failed to join student to organization")?;

        Ok(())
    }

    pub async fn join_batch(&self, student_id: i32, batch_id: i32) -> Result<()> {
        students::Entity::update_many()
            .col_expr(students::Column::BatchId, Expr::value(batch_id))
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(students::Column::Id.eq(student_id))
            .exec(&self.conn)
            .await
            .context("Failed to join student to batch")?;

        Ok(())
    }

    pub async fn leave_batch(&self, student_id: i32) -> Result<()> {
        students::Entity::update_many()
            .col_expr(students::Column::BatchId, Expr::value(Option::<i32>::None))
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(students::Column::Id.eq(student_id))
            .exec(&self.conn)
            .await
            .context("Failed to remove student from batch")?;

        Ok(())
    }

    /// Soft delete.
    pub async fn deactivate(&self, student_id: i32) -> Result<()> {
        students::Entity::update_many()
            .col_expr(students::Column::IsActive, Expr::value(false))
            .col_expr(students::Column::UpdatedAt, Expr::value(Utc::now().to_rfc3339()))
            .filter(students::Column::Id.eq(student_id))
            .exec(&self.conn)
            .await
            .context("Failed to deactivate student")?;

        Ok(())
    }
}
