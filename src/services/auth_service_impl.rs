//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::{Role, Subject, TokenPair, TokenService};
use crate::config::SecurityConfig;
use crate::db::{NewTeacher, Store};
use crate::services::auth_service::{
    AdminView, AuthError, AuthRole, AuthService, CreateAdmin, CreateTeacher, TeacherView,
};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenService,
    security: SecurityConfig,
    role: AuthRole,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        tokens: TokenService,
        security: SecurityConfig,
        role: AuthRole,
    ) -> Self {
        Self {
            store,
            tokens,
            security,
            role,
        }
    }

    async fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        verify_password_blocking(password.to_string(), password_hash.to_string())
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash_password_blocking(password.to_string(), self.security.clone())
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn admin_login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let admin = self
            .store
            .get_admin_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify(password, &admin.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        if !admin.is_verified {
            return Err(AuthError::NotVerified);
        }

        Ok(self.tokens.issue_admin_pair(admin.id)?)
    }

    async fn teacher_login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let teacher = self
            .store
            .get_teacher_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !self.verify(password, &teacher.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        if !teacher.phone_verified {
            return Err(AuthError::NotVerified);
        }

        if !teacher.is_active {
            return Err(AuthError::NotActive);
        }

        let subject = Subject {
            id: teacher.id,
            email: Some(teacher.email),
            phone_number: Some(teacher.phone_number),
            organization_id: None,
        };

        Ok(self.tokens.issue_pair(&subject, Role::Teacher)?)
    }

    async fn admin_signup(&self, request: CreateAdmin) -> Result<AdminView, AuthError> {
        if self.role != AuthRole::Admin {
            return Err(AuthError::RoleNotAllowed(self.role.as_str().to_string()));
        }

        let password_hash = self.hash(&request.password).await?;
        let admin = self.store.create_admin(&request.username, &password_hash).await?;

        Ok(AdminView::from(admin))
    }

    async fn teacher_signup(&self, request: CreateTeacher) -> Result<TeacherView, AuthError> {
        if self.role != AuthRole::Teacher {
            return Err(AuthError::RoleNotAllowed(self.role.as_str().to_string()));
        }

        let password_hash = self.hash(&request.password).await?;
        let teacher = self
            .store
            .create_teacher(NewTeacher {
                email: request.email,
                phone_number: request.phone_number,
                name: request.name,
                password_hash,
            })
            .await?;

        Ok(TeacherView::from(teacher))
    }
}
