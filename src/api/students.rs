//! Student OTP and profile handlers.

use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::warn;

use super::extract::CurrentStudent;
use super::{
    ApiError, ApiResponse, AppState, SendEmailOtpRequest, SendPhoneOtpRequest,
    VerifyEmailOtpRequest, VerifyPhoneOtpRequest, VerifyWebOtpRequest,
};
use crate::services::student_service::{OtpLogin, StudentView, WebOtp};
use crate::services::StatusMessage;

/// POST /student/otp/send
pub async fn send_phone_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendPhoneOtpRequest>,
) -> Result<Json<ApiResponse<StatusMessage>>, ApiError> {
    if payload.phone_number.is_empty() {
        return Err(ApiError::BadRequest("Phone number is required".to_string()));
    }

    let status = state.students.send_phone_otp(&payload.phone_number).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /student/otp/verify
pub async fn verify_phone_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyPhoneOtpRequest>,
) -> Result<Json<ApiResponse<OtpLogin>>, ApiError> {
    let login = state
        .students
        .verify_phone_otp(&payload.phone_number, &payload.otp)
        .await?;

    Ok(Json(ApiResponse::success(login)))
}

/// POST /student/email/otp/send
///
/// The code is handed to the mailer in the background; the response carries
/// only the status envelope.
pub async fn send_email_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendEmailOtpRequest>,
) -> Result<Json<ApiResponse<StatusMessage>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }

    let (otp, status) = state.students.send_email_otp(&payload.email).await?;

    let mailer = state.mailer.clone();
    let email = payload.email;
    tokio::spawn(async move {
        if let Err(err) = mailer.send_otp_email(&email, &otp).await {
            warn!("Failed to send OTP email: {err:#}");
        }
    });

    Ok(Json(ApiResponse::success(status)))
}

/// POST /student/email/otp/verify
pub async fn verify_email_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyEmailOtpRequest>,
) -> Result<Json<ApiResponse<OtpLogin>>, ApiError> {
    let login = state
        .students
        .verify_email_otp(&payload.email, &payload.otp)
        .await?;

    Ok(Json(ApiResponse::success(login)))
}

/// GET /student/web/otp
///
/// Issues a short code the already-authenticated student types into the web
/// client.
pub async fn get_web_otp(
    State(state): State<Arc<AppState>>,
    current: CurrentStudent,
) -> Result<Json<ApiResponse<WebOtp>>, ApiError> {
    let web_otp = state.students.issue_web_otp(current.claims.id).await?;
    Ok(Json(ApiResponse::success(web_otp)))
}

/// POST /student/web/otp/verify
pub async fn verify_web_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyWebOtpRequest>,
) -> Result<Json<ApiResponse<OtpLogin>>, ApiError> {
    let login = state
        .students
        .verify_web_otp(&payload.email, &payload.web_otp)
        .await?;

    Ok(Json(ApiResponse::success(login)))
}

/// GET /student/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    current: CurrentStudent,
) -> Result<Json<ApiResponse<StudentView>>, ApiError> {
    let student = state.students.get_student(current.claims.id).await?;
    Ok(Json(ApiResponse::success(student)))
}

/// POST /student/deactivate
pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    current: CurrentStudent,
) -> Result<Json<ApiResponse<StatusMessage>>, ApiError> {
    let status = state.students.deactivate(current.claims.id).await?;
    Ok(Json(ApiResponse::success(status)))
}
