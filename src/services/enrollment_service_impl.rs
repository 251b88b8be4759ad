//! `SeaORM` implementation of the `EnrollmentService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::auth::otp::generate_activation_code;
use crate::config::AuthConfig;
use crate::db::{Store, StudentKey};
use crate::services::StatusMessage;
use crate::services::enrollment_service::{
    ActivationCodePage, ActivationCodeView, BatchView, EnrollmentError, EnrollmentService,
    OrganizationView,
};

pub struct SeaOrmEnrollmentService {
    store: Store,
    auth: AuthConfig,
}

impl SeaOrmEnrollmentService {
    #[must_use]
    pub const fn new(store: Store, auth: AuthConfig) -> Self {
        Self { store, auth }
    }
}

#[async_trait]
impl EnrollmentService for SeaOrmEnrollmentService {
    /// Organization names are unique; creating an existing name returns the
    /// existing record instead of a constraint error.
    async fn create_organization(&self, name: &str) -> Result<OrganizationView, EnrollmentError> {
        if let Some(existing) = self.store.get_organization_by_name(name).await? {
            return Ok(OrganizationView::from(existing));
        }

        let organization = self.store.create_organization(name).await?;

        info!(organization_id = organization.id, "organization created");
        Ok(OrganizationView::from(organization))
    }

    async fn get_organization(&self, id: i32) -> Result<OrganizationView, EnrollmentError> {
        self.store
            .get_organization(id)
            .await?
            .map(OrganizationView::from)
            .ok_or(EnrollmentError::NotFound)
    }

    async fn create_activation_code(
        &self,
        organization_id: i32,
        student_email: &str,
    ) -> Result<(String, ActivationCodeView), EnrollmentError> {
        self.store
            .get_organization(organization_id)
            .await?
            .ok_or(EnrollmentError::NotFound)?;

        let code = generate_activation_code();
        let record = self
            .store
            .upsert_activation_code(organization_id, student_email, &code)
            .await?;

        info!(organization_id, "activation code issued");
        Ok((code, ActivationCodeView::from(record)))
    }

    async fn list_activation_codes(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<ActivationCodePage, EnrollmentError> {
        let items = self
            .store
            .list_activation_codes(skip, limit)
            .await?
            .into_iter()
            .map(ActivationCodeView::from)
            .collect();
        let total = self.store.count_activation_codes().await?;

        Ok(ActivationCodePage { items, total })
    }

    async fn join_organization(
        &self,
        student_email: &str,
        activation_code: &str,
    ) -> Result<StatusMessage, EnrollmentError> {
        let student = self
            .store
            .get_student(&StudentKey::Email(student_email.to_string()))
            .await?
            .ok_or(EnrollmentError::NotFound)?;

        // Checked before the code so the lockout holds even for invites
        // that never existed.
        if student.activation_attempts >= self.auth.max_activation_attempts {
            return Err(EnrollmentError::TooManyAttempts);
        }

        let record = self.store.get_activation_code_by_email(student_email).await?;

        // Both failure shapes count an attempt; the bump outlives the error.
        let record = match record {
            None => {
                self.store
                    .bump_student_activation_attempts(student_email)
                    .await?;
                return Err(EnrollmentError::NotFound);
            }
            Some(record) if record.activation_code != activation_code => {
                self.store
                    .bump_student_activation_attempts(student_email)
                    .await?;
                return Err(EnrollmentError::IncorrectActivationCode);
            }
            Some(record) => record,
        };
        self.store
            .join_student_to_organization(student_email, record.organization_id)
            .await?;

        info!(
            student_id = student.id,
            organization_id = record.organization_id,
            "student joined organization"
        );
        Ok(StatusMessage::success("Organization joined successfully"))
    }

    async fn create_batch(
        &self,
        name: &str,
        organization_id: i32,
    ) -> Result<BatchView, EnrollmentError> {
        self.store
            .get_organization(organization_id)
            .await?
            .ok_or(EnrollmentError::NotFound)?;

        let batch = self.store.create_batch(name, organization_id).await?;

        info!(batch_id = batch.id, organization_id, "batch created");
        Ok(BatchView::from(batch))
    }

    async fn add_student_to_batch(
        &self,
        student_id: i32,
        batch_id: i32,
    ) -> Result<StatusMessage, EnrollmentError> {
        let student = self
            .store
            .get_student(&StudentKey::Id(student_id))
            .await?
            .ok_or(EnrollmentError::NotFound)?;

        let batch = self
            .store
            .get_batch(batch_id)
            .await?
            .ok_or(EnrollmentError::NotFound)?;

        if student.organization_id != Some(batch.organization_id) {
            return Err(EnrollmentError::BatchOutsideOrganization);
        }

        self.store.join_student_to_batch(student_id, batch_id).await?;

        info!(student_id, batch_id, "student added to batch");
        Ok(StatusMessage::success("Student added to batch"))
    }

    async fn remove_student_from_batch(
        &self,
        student_id: i32,
    ) -> Result<StatusMessage, EnrollmentError> {
        self.store
            .get_student(&StudentKey::Id(student_id))
            .await?
            .ok_or(EnrollmentError::NotFound)?;

        self.store.remove_student_from_batch(student_id).await?;

        info!(student_id, "student removed from batch");
        Ok(StatusMessage::success("Student removed from batch"))
    }
}
