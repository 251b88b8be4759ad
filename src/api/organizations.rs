//! Organization, batch and activation-code handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;
use tracing::warn;

use super::extract::{CurrentAdmin, CurrentStudent};
use super::{
    ApiError, ApiResponse, AppState, BatchMembershipRequest, CreateActivationCodeRequest,
    CreateBatchRequest, CreateOrganizationRequest, JoinOrganizationRequest, PageQuery,
    RemoveFromBatchRequest,
};
use crate::services::StatusMessage;
use crate::services::enrollment_service::{
    ActivationCodePage, ActivationCodeView, BatchView, OrganizationView,
};

/// POST /organization/create
pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Json(payload): Json<CreateOrganizationRequest>,
) -> Result<Json<ApiResponse<OrganizationView>>, ApiError> {
    if payload.name.is_empty() {
        return Err(ApiError::BadRequest(
            "Organization name is required".to_string(),
        ));
    }

    let organization = state.enrollment.create_organization(&payload.name).await?;
    Ok(Json(ApiResponse::success(organization)))
}

/// GET /organization/{id}
pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrganizationView>>, ApiError> {
    let organization = state.enrollment.get_organization(id).await?;
    Ok(Json(ApiResponse::success(organization)))
}

/// POST /organization/activation_code/new
///
/// The generated code travels only in the invitation email; the response
/// carries the redacted record.
pub async fn create_activation_code(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Json(payload): Json<CreateActivationCodeRequest>,
) -> Result<Json<ApiResponse<ActivationCodeView>>, ApiError> {
    let organization = state
        .enrollment
        .get_organization(payload.organization_id)
        .await?;

    let (code, record) = state
        .enrollment
        .create_activation_code(payload.organization_id, &payload.student_email)
        .await?;

    let mailer = state.mailer.clone();
    let email = payload.student_email;
    tokio::spawn(async move {
        if let Err(err) = mailer
            .send_activation_code_email(&email, &organization.name, &code)
            .await
        {
            warn!("Failed to send activation code email: {err:#}");
        }
    });

    Ok(Json(ApiResponse::success(record)))
}

/// GET /organization/activation_code/all
pub async fn list_activation_codes(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<ActivationCodePage>>, ApiError> {
    let codes = state
        .enrollment
        .list_activation_codes(page.skip, page.limit)
        .await?;

    Ok(Json(ApiResponse::success(codes)))
}

/// POST /organization/join/student
///
/// The invite is keyed on the email inside the student's token, not on a
/// request field.
pub async fn join_organization(
    State(state): State<Arc<AppState>>,
    current: CurrentStudent,
    Json(payload): Json<JoinOrganizationRequest>,
) -> Result<Json<ApiResponse<StatusMessage>>, ApiError> {
    let email = current
        .claims
        .email
        .ok_or_else(|| ApiError::BadRequest("Account has no email on record".to_string()))?;

    let status = state
        .enrollment
        .join_organization(&email, &payload.activation_code)
        .await?;

    Ok(Json(ApiResponse::success(status)))
}

/// POST /organization/batch/create
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Json(payload): Json<CreateBatchRequest>,
) -> Result<Json<ApiResponse<BatchView>>, ApiError> {
    if payload.name.is_empty() {
        return Err(ApiError::BadRequest("Batch name is required".to_string()));
    }

    let batch = state
        .enrollment
        .create_batch(&payload.name, payload.organization_id)
        .await?;

    Ok(Json(ApiResponse::success(batch)))
}

/// POST /organization/batch/add/student
pub async fn add_student_to_batch(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Json(payload): Json<BatchMembershipRequest>,
) -> Result<Json<ApiResponse<StatusMessage>>, ApiError> {
    let status = state
        .enrollment
        .add_student_to_batch(payload.student_id, payload.batch_id)
        .await?;

    Ok(Json(ApiResponse::success(status)))
}

/// POST /organization/batch/remove/student
pub async fn remove_student_from_batch(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Json(payload): Json<RemoveFromBatchRequest>,
) -> Result<Json<ApiResponse<StatusMessage>>, ApiError> {
    let status = state
        .enrollment
        .remove_student_from_batch(payload.student_id)
        .await?;

    Ok(Json(ApiResponse::success(status)))
}
