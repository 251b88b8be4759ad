use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TeacherLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// New access token minted from a refresh token. The refresh token itself is
/// never rotated here.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct SendPhoneOtpRequest {
    pub phone_number: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPhoneOtpRequest {
    pub phone_number: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct SendEmailOtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyWebOtpRequest {
    pub email: String,
    pub web_otp: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateActivationCodeRequest {
    pub organization_id: i32,
    pub student_email: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinOrganizationRequest {
    pub activation_code: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBatchRequest {
    pub name: String,
    pub organization_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct BatchMembershipRequest {
    pub student_id: i32,
    pub batch_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromBatchRequest {
    pub student_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_page_limit")]
    pub limit: u64,
}

const fn default_page_limit() -> u64 {
    100
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub database: String,
}
