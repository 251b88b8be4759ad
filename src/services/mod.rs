pub mod auth_service;
pub use auth_service::{AdminView, AuthError, AuthRole, AuthService, TeacherView};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod student_service;
pub use student_service::{OtpLogin, StudentError, StudentService, StudentView, WebOtp};

pub mod student_service_impl;
pub use student_service_impl::SeaOrmStudentService;

pub mod enrollment_service;
pub use enrollment_service::{
    ActivationCodePage, ActivationCodeView, BatchView, EnrollmentError, EnrollmentService,
    OrganizationView,
};

pub mod enrollment_service_impl;
pub use enrollment_service_impl::SeaOrmEnrollmentService;

use serde::Serialize;

/// Status envelope returned by state-changing flows.
#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "Success".to_string(),
            message: message.into(),
        }
    }
}
