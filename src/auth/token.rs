use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Configuration fault: the domain's signing secret is unset.
    #[error("No signing key configured for this token domain")]
    MissingSigningKey,

    /// id/role missing, or neither email nor phone number supplied.
    #[error("Token not created: phone number/email/id/role missing")]
    IncompleteSubject,

    #[error("Could not validate credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

/// Signing scope for a token. Tokens from one domain are meaningless in the
/// other, even when the claims are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDomain {
    /// Students and teachers.
    Standard,
    /// Admins only; backed by a separate secret.
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub role: Role,
    /// Absolute expiry as a unix epoch, not a relative TTL.
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Subject claims for a standard-domain token.
#[derive(Debug, Clone, Default)]
pub struct Subject {
    pub id: i32,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub organization_id: Option<i32>,
}

/// Creates and validates signed identity tokens (HS256) with two independent
/// signing domains.
#[derive(Clone)]
pub struct TokenService {
    standard_secret: Option<String>,
    admin_secret: Option<String>,
    access_expire_minutes: i64,
    refresh_expire_minutes: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            standard_secret: config.jwt_secret.clone(),
            admin_secret: config.jwt_admin_secret.clone(),
            access_expire_minutes: config.access_token_expire_minutes,
            refresh_expire_minutes: config.refresh_token_expire_minutes,
        }
    }

    fn secret(&self, domain: TokenDomain) -> Result<&str, TokenError> {
        let secret = match domain {
            TokenDomain::Standard => self.standard_secret.as_deref(),
            TokenDomain::Admin => self.admin_secret.as_deref(),
        };
        secret.ok_or(TokenError::MissingSigningKey)
    }

    /// Issues a standard-domain token for a student or teacher.
    pub fn issue(
        &self,
        subject: &Subject,
        role: Role,
        expires_in_minutes: i64,
    ) -> Result<String, TokenError> {
        let secret = self.secret(TokenDomain::Standard)?;

        if subject.id == 0 || (subject.email.is_none() && subject.phone_number.is_none()) {
            return Err(TokenError::IncompleteSubject);
        }

        let claims = Claims {
            id: subject.id,
            role,
            exp: expiry_epoch(expires_in_minutes),
            email: subject.email.clone(),
            phone_number: subject.phone_number.clone(),
            organization_id: subject.organization_id,
        };

        sign(&claims, secret)
    }

    /// Issues an admin-domain token. Only the id is required.
    pub fn issue_admin(&self, id: i32, expires_in_minutes: i64) -> Result<String, TokenError> {
        let secret = self.secret(TokenDomain::Admin)?;

        if id == 0 {
            return Err(TokenError::IncompleteSubject);
        }

        let claims = Claims {
            id,
            role: Role::Admin,
            exp: expiry_epoch(expires_in_minutes),
            email: None,
            phone_number: None,
            organization_id: None,
        };

        sign(&claims, secret)
    }

    /// Access + refresh token sharing the same subject claims; the refresh
    /// token gets the longer configured window.
    pub fn issue_pair(&self, subject: &Subject, role: Role) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            token: self.issue(subject, role, self.access_expire_minutes)?,
            refresh_token: self.issue(subject, role, self.refresh_expire_minutes)?,
        })
    }

    pub fn issue_admin_pair(&self, id: i32) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            token: self.issue_admin(id, self.access_expire_minutes)?,
            refresh_token: self.issue_admin(id, self.refresh_expire_minutes)?,
        })
    }

    #[must_use]
    pub const fn access_expire_minutes(&self) -> i64 {
        self.access_expire_minutes
    }

    /// Decodes and checks a token against one domain's secret.
    ///
    /// The library's own exp validation is disabled; expiry is checked here
    /// against the claim so the `Expired` / `InvalidCredentials` distinction
    /// is deterministic.
    pub fn validate(&self, token: &str, domain: TokenDomain) -> Result<Claims, TokenError> {
        let secret = self.secret(domain)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|_| TokenError::InvalidCredentials)?;

        if data.claims.exp < Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

fn expiry_epoch(minutes: i64) -> i64 {
    (Utc::now() + Duration::minutes(minutes)).timestamp()
}

fn sign(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| TokenError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        let mut config = AuthConfig::default();
        config.jwt_secret = Some("standard-secret".to_string());
        config.jwt_admin_secret = Some("admin-secret".to_string());
        TokenService::new(&config)
    }

    fn subject() -> Subject {
        Subject {
            id: 7,
            email: Some("teacher@example.com".to_string()),
            phone_number: Some("9876543210".to_string()),
            organization_id: Some(5),
        }
    }

    #[test]
    fn issue_then_validate_round_trips_subject_claims() {
        let service = service();
        let token = service.issue(&subject(), Role::Teacher, 30).unwrap();
        let claims = service.validate(&token, TokenDomain::Standard).unwrap();

        assert_eq!(claims.id, 7);
        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(claims.email.as_deref(), Some("teacher@example.com"));
        assert_eq!(claims.phone_number.as_deref(), Some("9876543210"));
        assert_eq!(claims.organization_id, Some(5));
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn domains_are_mutually_exclusive() {
        let service = service();

        let standard = service.issue(&subject(), Role::Student, 30).unwrap();
        assert!(matches!(
            service.validate(&standard, TokenDomain::Admin),
            Err(TokenError::InvalidCredentials)
        ));

        let admin = service.issue_admin(3, 30).unwrap();
        assert!(matches!(
            service.validate(&admin, TokenDomain::Standard),
            Err(TokenError::InvalidCredentials)
        ));
        assert!(service.validate(&admin, TokenDomain::Admin).is_ok());
    }

    #[test]
    fn missing_secret_is_a_configuration_fault() {
        let config = AuthConfig::default();
        let service = TokenService::new(&config);

        assert!(matches!(
            service.issue(&subject(), Role::Student, 30),
            Err(TokenError::MissingSigningKey)
        ));
        assert!(matches!(
            service.issue_admin(1, 30),
            Err(TokenError::MissingSigningKey)
        ));
    }

    #[test]
    fn subject_needs_email_or_phone() {
        let service = service();
        let bare = Subject {
            id: 1,
            ..Subject::default()
        };

        assert!(matches!(
            service.issue(&bare, Role::Student, 30),
            Err(TokenError::IncompleteSubject)
        ));
    }

    #[test]
    fn expired_token_reports_expired_not_invalid() {
        let service = service();
        let token = service.issue(&subject(), Role::Student, -5).unwrap();

        assert!(matches!(
            service.validate(&token, TokenDomain::Standard),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn garbage_token_reports_invalid_credentials() {
        let service = service();
        assert!(matches!(
            service.validate("not.a.token", TokenDomain::Standard),
            Err(TokenError::InvalidCredentials)
        ));
    }

    #[test]
    fn pair_shares_subject_and_refresh_lives_longer() {
        let service = service();
        let pair = service.issue_pair(&subject(), Role::Student).unwrap();

        let access = service.validate(&pair.token, TokenDomain::Standard).unwrap();
        let refresh = service
            .validate(&pair.refresh_token, TokenDomain::Standard)
            .unwrap();

        assert_eq!(access.id, refresh.id);
        assert_eq!(access.email, refresh.email);
        assert!(refresh.exp > access.exp);
    }
}
