//! Domain service for organizations, batches and activation-code
//! redemption.

use serde::Serialize;
use thiserror::Error;

use crate::services::StatusMessage;

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("Could not find the requested record")]
    NotFound,

    #[error("max activation attempts reached")]
    TooManyAttempts,

    #[error("Activation code is incorrect")]
    IncorrectActivationCode,

    #[error("Batch does not belong to the student's organization")]
    BatchOutsideOrganization,

    #[error("Storage error: {0}")]
    Persistence(String),
}

impl From<anyhow::Error> for EnrollmentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationView {
    pub id: i32,
    pub name: String,
    pub created_at: String,
}

impl From<crate::entities::organizations::Model> for OrganizationView {
    fn from(model: crate::entities::organizations::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchView {
    pub id: i32,
    pub name: String,
    pub organization_id: i32,
    pub created_at: String,
}

impl From<crate::entities::batches::Model> for BatchView {
    fn from(model: crate::entities::batches::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            organization_id: model.organization_id,
            created_at: model.created_at,
        }
    }
}

/// Listing shape for activation codes. The code itself is omitted; it is
/// only ever delivered to the invited address.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationCodeView {
    pub id: i32,
    pub organization_id: i32,
    pub student_email: String,
    pub created_at: String,
}

impl From<crate::entities::activation_codes::Model> for ActivationCodeView {
    fn from(model: crate::entities::activation_codes::Model) -> Self {
        Self {
            id: model.id,
            organization_id: model.organization_id,
            student_email: model.student_email,
            created_at: model.created_at,
        }
    }
}

/// Activation-code page with the overall total for the caller's paging UI.
#[derive(Debug, Serialize)]
pub struct ActivationCodePage {
    pub items: Vec<ActivationCodeView>,
    pub total: u64,
}

/// Domain service trait for enrollment.
#[async_trait::async_trait]
pub trait EnrollmentService: Send + Sync {
    async fn create_organization(&self, name: &str) -> Result<OrganizationView, EnrollmentError>;

    async fn get_organization(&self, id: i32) -> Result<OrganizationView, EnrollmentError>;

    /// Invites a student into an organization. Returns the generated code
    /// for delivery alongside the redacted record; a repeat invite for the
    /// same email replaces the previous code.
    async fn create_activation_code(
        &self,
        organization_id: i32,
        student_email: &str,
    ) -> Result<(String, ActivationCodeView), EnrollmentError>;

    async fn list_activation_codes(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<ActivationCodePage, EnrollmentError>;

    /// Redeems an activation code for the student.
    ///
    /// # Errors
    ///
    /// [`EnrollmentError::TooManyAttempts`] once the join counter hits the
    /// configured limit, checked before the code itself;
    /// [`EnrollmentError::NotFound`] when no invite exists for the email and
    /// [`EnrollmentError::IncorrectActivationCode`] on a mismatch. Both
    /// failures count an attempt.
    async fn join_organization(
        &self,
        student_email: &str,
        activation_code: &str,
    ) -> Result<StatusMessage, EnrollmentError>;

    async fn create_batch(
        &self,
        name: &str,
        organization_id: i32,
    ) -> Result<BatchView, EnrollmentError>;

    /// Assigns a student to a batch inside their own organization.
    async fn add_student_to_batch(
        &self,
        student_id: i32,
        batch_id: i32,
    ) -> Result<StatusMessage, EnrollmentError>;

    async fn remove_student_from_batch(
        &self,
        student_id: i32,
    ) -> Result<StatusMessage, EnrollmentError>;
}
