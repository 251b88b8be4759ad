//! Domain service for the student OTP engine: three channels (phone login,
//! email login, post-enrollment web login) sharing one state-machine shape
//! with per-channel thresholds.

use serde::Serialize;
use thiserror::Error;

use crate::auth::TokenError;
use crate::services::StatusMessage;

#[derive(Debug, Error)]
pub enum StudentError {
    #[error("Could not find student")]
    NotFound,

    #[error("no otp found for student")]
    NoCodeFound,

    #[error("max otp attempts reached")]
    RateLimited,

    #[error("OTP is incorrect")]
    IncorrectCode,

    #[error("OTP has expired")]
    CodeExpired,

    /// Web login requires an organization membership first.
    #[error("User is not verified")]
    NotVerified,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Persistence(String),
}

impl From<anyhow::Error> for StudentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Verification success: status plus a standard-domain token pair.
#[derive(Debug, Serialize)]
pub struct OtpLogin {
    pub status: String,
    pub message: String,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct WebOtp {
    pub otp: String,
    pub expires_at: String,
}

/// Student record shaped for responses; OTP fields never leave the service.
#[derive(Debug, Clone, Serialize)]
pub struct StudentView {
    pub id: i32,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub is_active: bool,
    pub phone_verified: bool,
    pub organization_id: Option<i32>,
    pub batch_id: Option<i32>,
    pub live_class_enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::entities::students::Model> for StudentView {
    fn from(model: crate::entities::students::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            phone_number: model.phone_number,
            name: model.name,
            is_active: model.is_active,
            phone_verified: model.phone_verified,
            organization_id: model.organization_id,
            batch_id: model.batch_id,
            live_class_enabled: model.live_class_enabled,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Domain service trait for student identity and OTP flows.
#[async_trait::async_trait]
pub trait StudentService: Send + Sync {
    /// Issues a phone OTP, creating the student on first contact.
    ///
    /// # Errors
    ///
    /// [`StudentError::RateLimited`] once the channel threshold is reached;
    /// the stored code is left untouched in that case.
    async fn send_phone_otp(&self, phone_number: &str) -> Result<StatusMessage, StudentError>;

    /// Verifies a phone OTP and mints a token pair on success.
    async fn verify_phone_otp(&self, phone_number: &str, otp: &str)
    -> Result<OtpLogin, StudentError>;

    /// Issues an email OTP, creating the student on first contact. Returns
    /// the code alongside the status so the caller can hand it to the
    /// mailer; the code is never part of the HTTP response.
    async fn send_email_otp(&self, email: &str) -> Result<(String, StatusMessage), StudentError>;

    async fn verify_email_otp(&self, email: &str, otp: &str) -> Result<OtpLogin, StudentError>;

    /// Issues a web-login OTP for an already-authenticated student.
    async fn issue_web_otp(&self, student_id: i32) -> Result<WebOtp, StudentError>;

    /// Verifies a web OTP; the resulting tokens carry the student's
    /// organization id.
    async fn verify_web_otp(&self, student_email: &str, web_otp: &str)
    -> Result<OtpLogin, StudentError>;

    async fn get_student(&self, student_id: i32) -> Result<StudentView, StudentError>;

    /// Soft delete. Already-issued tokens stay valid until they expire.
    async fn deactivate(&self, student_id: i32) -> Result<StatusMessage, StudentError>;
}
