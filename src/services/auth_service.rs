//! Domain service for password-based authentication: admin and teacher
//! logins and role-gated signups.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{TokenError, TokenPair};

/// Errors specific to password-auth operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Could not validate credentials")]
    InvalidCredentials,

    #[error("User is not verified")]
    NotVerified,

    #[error("User is not active")]
    NotActive,

    #[error("Could not find user")]
    NotFound,

    #[error("role \"{0}\" is not allowed for this operation")]
    RoleNotAllowed(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Which identity table a handler instance operates on. Selected at
/// construction; signup requests for the other role are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRole {
    Admin,
    Teacher,
}

impl AuthRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeacher {
    pub email: String,
    pub phone_number: String,
    pub name: Option<String>,
    pub password: String,
}

/// Admin record shaped for responses; the hash never leaves the service.
#[derive(Debug, Clone, Serialize)]
pub struct AdminView {
    pub id: i32,
    pub username: String,
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::entities::admins::Model> for AdminView {
    fn from(model: crate::entities::admins::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            is_verified: model.is_verified,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Teacher record shaped for responses; the hash never leaves the service.
#[derive(Debug, Clone, Serialize)]
pub struct TeacherView {
    pub id: i32,
    pub email: String,
    pub phone_number: String,
    pub name: Option<String>,
    pub phone_verified: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::entities::teachers::Model> for TeacherView {
    fn from(model: crate::entities::teachers::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            phone_number: model.phone_number,
            name: model.name,
            phone_verified: model.phone_verified,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Domain service trait for password authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Admin login by username.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] on a missing user or hash mismatch,
    /// [`AuthError::NotVerified`] when the account awaits verification.
    async fn admin_login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Teacher login by email.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] for an unknown email,
    /// [`AuthError::InvalidCredentials`] on hash mismatch,
    /// [`AuthError::NotVerified`] / [`AuthError::NotActive`] per account state.
    async fn teacher_login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Creates an admin. Rejected with [`AuthError::RoleNotAllowed`] unless
    /// the handler was constructed for [`AuthRole::Admin`].
    async fn admin_signup(&self, request: CreateAdmin) -> Result<AdminView, AuthError>;

    /// Creates a teacher. Rejected with [`AuthError::RoleNotAllowed`] unless
    /// the handler was constructed for [`AuthRole::Teacher`].
    async fn teacher_signup(&self, request: CreateTeacher) -> Result<TeacherView, AuthError>;
}
