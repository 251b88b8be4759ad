use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::TokenService;
use crate::clients::Mailer;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthRole, AuthService, EnrollmentService, SeaOrmAuthService, SeaOrmEnrollmentService,
    SeaOrmStudentService, StudentService,
};

pub mod auth;
mod error;
pub mod extract;
mod observability;
mod organizations;
mod students;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub tokens: TokenService,

    pub mailer: Mailer,

    pub admin_auth: Arc<dyn AuthService>,

    pub teacher_auth: Arc<dyn AuthService>,

    pub students: Arc<dyn StudentService>,

    pub enrollment: Arc<dyn EnrollmentService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    create_app_state(config, store, prometheus_handle)
}

pub fn create_app_state(
    config: Config,
    store: Store,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let tokens = TokenService::new(&config.auth);
    let mailer = Mailer::new(config.mail.clone())?;

    let admin_auth: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        tokens.clone(),
        config.security.clone(),
        AuthRole::Admin,
    ));
    let teacher_auth: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        tokens.clone(),
        config.security.clone(),
        AuthRole::Teacher,
    ));
    let students: Arc<dyn StudentService> = Arc::new(SeaOrmStudentService::new(
        store.clone(),
        tokens.clone(),
        config.auth.clone(),
    ));
    let enrollment: Arc<dyn EnrollmentService> = Arc::new(SeaOrmEnrollmentService::new(
        store.clone(),
        config.auth.clone(),
    ));

    Ok(Arc::new(AppState {
        config,
        store,
        tokens,
        mailer,
        admin_auth,
        teacher_auth,
        students,
        enrollment,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/auth/admin/login", post(auth::admin_login))
        .route("/auth/admin/signup", post(auth::admin_signup))
        .route("/auth/admin/token", post(auth::admin_refresh))
        .route("/auth/teacher/login", post(auth::teacher_login))
        .route("/auth/teacher/signup", post(auth::teacher_signup))
        .route("/auth/teacher/token", post(auth::teacher_refresh))
        .route("/auth/student/token", post(auth::student_refresh))
        .route("/student/otp/send", post(students::send_phone_otp))
        .route("/student/otp/verify", post(students::verify_phone_otp))
        .route("/student/email/otp/send", post(students::send_email_otp))
        .route("/student/email/otp/verify", post(students::verify_email_otp))
        .route("/student/web/otp", get(students::get_web_otp))
        .route("/student/web/otp/verify", post(students::verify_web_otp))
        .route("/student/me", get(students::get_me))
        .route("/student/deactivate", post(students::deactivate))
        .route("/organization/create", post(organizations::create_organization))
        .route("/organization/{id}", get(organizations::get_organization))
        .route(
            "/organization/activation_code/new",
            post(organizations::create_activation_code),
        )
        .route(
            "/organization/activation_code/all",
            get(organizations::list_activation_codes),
        )
        .route(
            "/organization/join/student",
            post(organizations::join_organization),
        )
        .route(
            "/organization/batch/create",
            post(organizations::create_batch),
        )
        .route(
            "/organization/batch/add/student",
            post(organizations::add_student_to_batch),
        )
        .route(
            "/organization/batch/remove/student",
            post(organizations::remove_student_from_batch),
        )
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_requests))
}
