//! `SeaORM` implementation of the `StudentService` trait.
//!
//! All three OTP channels run through one verification ladder: missing code,
//! attempt limit, code equality, expiry, in that order. A wrong code on an
//! expired record therefore reports `IncorrectCode`, and a correct code past
//! its window reports `CodeExpired`. Only the equality failure bumps the
//! attempt counter; the bump persists even though the request fails. The web
//! channel additionally requires organization membership, checked right
//! after the missing-code step.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::auth::otp::{expires_at, generate_otp, is_expired};
use crate::auth::{Role, Subject, TokenPair, TokenService};
use crate::config::AuthConfig;
use crate::db::{Store, StudentKey};
use crate::entities::students;
use crate::services::StatusMessage;
use crate::services::student_service::{
    OtpLogin, StudentError, StudentService, StudentView, WebOtp,
};

pub struct SeaOrmStudentService {
    store: Store,
    tokens: TokenService,
    auth: AuthConfig,
}

impl SeaOrmStudentService {
    #[must_use]
    pub const fn new(store: Store, tokens: TokenService, auth: AuthConfig) -> Self {
        Self {
            store,
            tokens,
            auth,
        }
    }

    /// The demo account skips the equality step on the email channel only.
    /// Disabled when the config entry is empty.
    fn is_demo_bypass(&self, email: &str) -> bool {
        !self.auth.demo_bypass_email.is_empty() && email == self.auth.demo_bypass_email
    }

    /// The guest account always receives the fixed configured code instead
    /// of a random one.
    fn issue_code_for(&self, email: &str) -> String {
        if !self.auth.guest_email.is_empty() && email == self.auth.guest_email {
            self.auth.guest_otp.clone()
        } else {
            generate_otp()
        }
    }

    fn login_pair(&self, student: &students::Model) -> Result<TokenPair, StudentError> {
        let subject = Subject {
            id: student.id,
            email: student.email.clone(),
            phone_number: student.phone_number.clone(),
            organization_id: student.organization_id,
        };
        Ok(self.tokens.issue_pair(&subject, Role::Student)?)
    }

    async fn send_login_otp(
        &self,
        key: StudentKey,
        otp: String,
        max_attempts: i32,
    ) -> Result<(), StudentError> {
        let expiry = expires_at(self.auth.otp_expire_minutes);

        match self.store.get_student(&key).await? {
            None => {
                let (email, phone_number) = match &key {
                    StudentKey::Email(email) => (Some(email.clone()), None),
                    StudentKey::Phone(phone) => (None, Some(phone.clone())),
                    StudentKey::Id(_) => return Err(StudentError::NotFound),
                };
                self.store
                    .create_student_with_otp(email, phone_number, otp, expiry)
                    .await?;
            }
            Some(student) => {
                // At the limit the stored code stays untouched.
                if student.otp_attempts >= max_attempts {
                    return Err(StudentError::RateLimited);
                }
                self.store.set_student_otp(&key, &otp, expiry).await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl StudentService for SeaOrmStudentService {
    async fn send_phone_otp(&self, phone_number: &str) -> Result<StatusMessage, StudentError> {
        let otp = generate_otp();
        self.send_login_otp(
            StudentKey::Phone(phone_number.to_string()),
            otp,
            self.auth.max_phone_otp_attempts,
        )
        .await?;

        info!(channel = "phone", "login OTP issued");
        Ok(StatusMessage::success("OTP sent successfully"))
    }

    async fn verify_phone_otp(
        &self,
        phone_number: &str,
        otp: &str,
    ) -> Result<OtpLogin, StudentError> {
        let key = StudentKey::Phone(phone_number.to_string());
        let student = self
            .store
            .get_student(&key)
            .await?
            .ok_or(StudentError::NotFound)?;

        let outcome = check_code(
            student.otp.as_deref(),
            parse_expiry(student.otp_expires_at.as_deref()),
            student.otp_attempts,
            self.auth.max_phone_otp_attempts,
            otp,
            false,
        );

        if matches!(outcome, Err(StudentError::IncorrectCode)) {
            self.store.bump_student_otp_attempts(&key).await?;
        }
        outcome?;

        self.store.mark_student_phone_verified(phone_number).await?;
        let pair = self.login_pair(&student)?;

        info!(channel = "phone", student_id = student.id, "OTP verified");
        Ok(OtpLogin {
            status: "Success".to_string(),
            message: "OTP verified successfully".to_string(),
            token: pair.token,
            refresh_token: pair.refresh_token,
        })
    }

    async fn send_email_otp(&self, email: &str) -> Result<(String, StatusMessage), StudentError> {
        let otp = self.issue_code_for(email);
        self.send_login_otp(
            StudentKey::Email(email.to_string()),
            otp.clone(),
            self.auth.max_email_otp_attempts,
        )
        .await?;

        info!(channel = "email", "login OTP issued");
        Ok((otp, StatusMessage::success("OTP sent successfully")))
    }

    async fn verify_email_otp(&self, email: &str, otp: &str) -> Result<OtpLogin, StudentError> {
        let key = StudentKey::Email(email.to_string());
        let student = self
            .store
            .get_student(&key)
            .await?
            .ok_or(StudentError::NotFound)?;

        let outcome = check_code(
            student.otp.as_deref(),
            parse_expiry(student.otp_expires_at.as_deref()),
            student.otp_attempts,
            self.auth.max_email_otp_attempts,
            otp,
            self.is_demo_bypass(email),
        );

        if matches!(outcome, Err(StudentError::IncorrectCode)) {
            self.store.bump_student_otp_attempts(&key).await?;
        }
        outcome?;

        self.store.mark_student_email_verified(email).await?;
        let pair = self.login_pair(&student)?;

        info!(channel = "email", student_id = student.id, "OTP verified");
        Ok(OtpLogin {
            status: "Success".to_string(),
            message: "OTP verified successfully".to_string(),
            token: pair.token,
            refresh_token: pair.refresh_token,
        })
    }

    async fn issue_web_otp(&self, student_id: i32) -> Result<WebOtp, StudentError> {
        let student = self
            .store
            .get_student(&StudentKey::Id(student_id))
            .await?
            .ok_or(StudentError::NotFound)?;

        if student.web_otp_attempts >= self.auth.max_web_otp_attempts {
            return Err(StudentError::RateLimited);
        }

        let otp = generate_otp();
        let expiry = expires_at(self.auth.otp_expire_minutes);
        self.store
            .set_student_web_otp(student_id, &otp, expiry)
            .await?;

        info!(channel = "web", student_id, "web OTP issued");
        Ok(WebOtp {
            otp,
            expires_at: expiry.to_rfc3339(),
        })
    }

    async fn verify_web_otp(
        &self,
        student_email: &str,
        web_otp: &str,
    ) -> Result<OtpLogin, StudentError> {
        let student = self
            .store
            .get_student(&StudentKey::Email(student_email.to_string()))
            .await?
            .ok_or(StudentError::NotFound)?;

        if student.web_otp.is_none() {
            return Err(StudentError::NoCodeFound);
        }

        // Web sessions are scoped to an organization; unenrolled students
        // are refused before any attempt accounting.
        if student.organization_id.is_none() {
            return Err(StudentError::NotVerified);
        }

        // No demo bypass on this channel; the code is always compared.
        let outcome = check_code(
            student.web_otp.as_deref(),
            parse_expiry(student.web_otp_expires_at.as_deref()),
            student.web_otp_attempts,
            self.auth.max_web_otp_attempts,
            web_otp,
            false,
        );

        if matches!(outcome, Err(StudentError::IncorrectCode)) {
            self.store
                .bump_student_web_otp_attempts(student.id)
                .await?;
        }
        outcome?;

        self.store
            .mark_student_web_login(student.id, &Utc::now().to_rfc3339())
            .await?;
        let pair = self.login_pair(&student)?;

        info!(channel = "web", student_id = student.id, "web OTP verified");
        Ok(OtpLogin {
            status: "Success".to_string(),
            message: "OTP verified successfully".to_string(),
            token: pair.token,
            refresh_token: pair.refresh_token,
        })
    }

    async fn get_student(&self, student_id: i32) -> Result<StudentView, StudentError> {
        let student = self
            .store
            .get_student(&StudentKey::Id(student_id))
            .await?
            .ok_or(StudentError::NotFound)?;

        Ok(StudentView::from(student))
    }

    async fn deactivate(&self, student_id: i32) -> Result<StatusMessage, StudentError> {
        self.store
            .get_student(&StudentKey::Id(student_id))
            .await?
            .ok_or(StudentError::NotFound)?;

        self.store.deactivate_student(student_id).await?;

        info!(student_id, "student deactivated");
        Ok(StatusMessage::success("Student deactivated successfully"))
    }
}

fn parse_expiry(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// The shared verification ladder. `bypass` skips only the equality step;
/// a bypassed code still has to be unexpired.
fn check_code(
    stored: Option<&str>,
    expiry: Option<DateTime<Utc>>,
    attempts: i32,
    max_attempts: i32,
    submitted: &str,
    bypass: bool,
) -> Result<(), StudentError> {
    let stored = stored.ok_or(StudentError::NoCodeFound)?;

    if attempts >= max_attempts {
        return Err(StudentError::RateLimited);
    }

    if !bypass && stored != submitted {
        return Err(StudentError::IncorrectCode);
    }

    match expiry {
        Some(at) if !is_expired(at) => Ok(()),
        _ => Err(StudentError::CodeExpired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn future() -> Option<DateTime<Utc>> {
        Some(Utc::now() + Duration::minutes(10))
    }

    fn past() -> Option<DateTime<Utc>> {
        Some(Utc::now() - Duration::minutes(1))
    }

    #[test]
    fn missing_code_wins_over_everything() {
        assert!(matches!(
            check_code(None, None, 500, 20, "123456", true),
            Err(StudentError::NoCodeFound)
        ));
    }

    #[test]
    fn rate_limit_precedes_equality() {
        assert!(matches!(
            check_code(Some("123456"), future(), 20, 20, "123456", false),
            Err(StudentError::RateLimited)
        ));
    }

    #[test]
    fn wrong_code_on_expired_record_reports_incorrect() {
        assert!(matches!(
            check_code(Some("123456"), past(), 0, 20, "654321", false),
            Err(StudentError::IncorrectCode)
        ));
    }

    #[test]
    fn correct_code_past_window_reports_expired() {
        assert!(matches!(
            check_code(Some("123456"), past(), 0, 20, "123456", false),
            Err(StudentError::CodeExpired)
        ));
    }

    #[test]
    fn correct_code_in_window_passes() {
        assert!(check_code(Some("123456"), future(), 19, 20, "123456", false).is_ok());
    }

    #[test]
    fn bypass_skips_equality_but_not_expiry() {
        assert!(check_code(Some("123456"), future(), 0, 20, "000000", true).is_ok());
        assert!(matches!(
            check_code(Some("123456"), past(), 0, 20, "000000", true),
            Err(StudentError::CodeExpired)
        ));
    }

    #[test]
    fn missing_expiry_counts_as_expired() {
        assert!(matches!(
            check_code(Some("123456"), None, 0, 20, "123456", false),
            Err(StudentError::CodeExpired)
        ));
    }
}
