//! Password login, signup and token-refresh handlers.

use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, RefreshRequest, RefreshResponse};
use super::{AdminLoginRequest, TeacherLoginRequest};
use crate::auth::{Role, Subject, TokenDomain, TokenPair};
use crate::services::auth_service::{AdminView, CreateAdmin, CreateTeacher, TeacherView};

/// POST /auth/admin/login
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let pair = state
        .admin_auth
        .admin_login(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(pair)))
}

/// POST /auth/teacher/login
pub async fn teacher_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TeacherLoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let pair = state
        .teacher_auth
        .teacher_login(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(pair)))
}

/// POST /auth/admin/signup
pub async fn admin_signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAdmin>,
) -> Result<Json<ApiResponse<AdminView>>, ApiError> {
    let admin = state.admin_auth.admin_signup(payload).await?;
    Ok(Json(ApiResponse::success(admin)))
}

/// POST /auth/teacher/signup
pub async fn teacher_signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTeacher>,
) -> Result<Json<ApiResponse<TeacherView>>, ApiError> {
    let teacher = state.teacher_auth.teacher_signup(payload).await?;
    Ok(Json(ApiResponse::success(teacher)))
}

/// POST /auth/admin/token
///
/// Exchanges a valid admin refresh token for a fresh access token.
pub async fn admin_refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    let claims = state
        .tokens
        .validate(&payload.refresh_token, TokenDomain::Admin)?;

    let token = state
        .tokens
        .issue_admin(claims.id, state.tokens.access_expire_minutes())?;

    Ok(Json(ApiResponse::success(RefreshResponse { token })))
}

/// POST /auth/teacher/token
pub async fn teacher_refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    refresh_standard(&state, &payload.refresh_token, Role::Teacher)
}

/// POST /auth/student/token
pub async fn student_refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    refresh_standard(&state, &payload.refresh_token, Role::Student)
}

fn refresh_standard(
    state: &AppState,
    refresh_token: &str,
    expected_role: Role,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    let claims = state
        .tokens
        .validate(refresh_token, TokenDomain::Standard)?;

    if claims.role != expected_role {
        return Err(ApiError::unauthorized(format!(
            "role \"{}\" is not allowed for this operation",
            claims.role.as_str()
        )));
    }

    let subject = Subject {
        id: claims.id,
        email: claims.email,
        phone_number: claims.phone_number,
        organization_id: claims.organization_id,
    };

    let token = state
        .tokens
        .issue(&subject, expected_role, state.tokens.access_expire_minutes())?;

    Ok(Json(ApiResponse::success(RefreshResponse { token })))
}
