use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use edhub::config::Config;
use edhub::db::Store;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Default admin seeded by the initial migration.
const SEEDED_ADMIN: &str = "admin";
const SEEDED_PASSWORD: &str = "password";

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.auth.jwt_secret = Some("test-standard-secret".to_string());
    config.auth.jwt_admin_secret = Some("test-admin-secret".to_string());
    // Keep hashing cheap for tests.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.mail.enabled = false;
    config
}

async fn spawn_app_with(config: Config) -> (Router, Store) {
    let store = Store::with_pool_options(&config.general.database_path, 1, 1)
        .await
        .expect("Failed to open in-memory store");

    let state = edhub::api::create_app_state(config, store.clone(), None)
        .expect("Failed to create app state");
    (edhub::api::router(state), store)
}

async fn spawn_app() -> (Router, Store) {
    spawn_app_with(test_config()).await
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_system_status_is_public() {
    let (app, _store) = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["database"], "ok");
}

#[tokio::test]
async fn test_admin_login_issues_token_pair() {
    let (app, _store) = spawn_app().await;

    let response = app
        .oneshot(post_json(
            "/api/auth/admin/login",
            &serde_json::json!({ "username": SEEDED_ADMIN, "password": SEEDED_PASSWORD }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["data"]["token"].is_string());
    assert!(json["data"]["refresh_token"].is_string());
}

#[tokio::test]
async fn test_admin_login_rejects_bad_credentials() {
    let (app, _store) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/admin/login",
            &serde_json::json!({ "username": SEEDED_ADMIN, "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(post_json(
            "/api/auth/admin/login",
            &serde_json::json!({ "username": "nobody", "password": SEEDED_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_new_admin_cannot_login_until_verified() {
    let (app, _store) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/admin/signup",
            &serde_json::json!({ "username": "second", "password": "hunter22" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["is_verified"], false);
    assert!(json["data"]["password_hash"].is_null());

    // Correct credentials, but verification is a manual step.
    let response = app
        .oneshot(post_json(
            "/api/auth/admin/login",
            &serde_json::json!({ "username": "second", "password": "hunter22" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_token_is_rejected_on_student_routes() {
    let (app, _store) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/admin/login",
            &serde_json::json!({ "username": SEEDED_ADMIN, "password": SEEDED_PASSWORD }),
        ))
        .await
        .unwrap();
    let token = body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Admin tokens come from a different signing domain.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/student/me")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/student/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_teacher_signup_then_login_ladder() {
    let (app, store) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/teacher/signup",
            &serde_json::json!({
                "email": "teacher@example.com",
                "phone_number": "9876543210",
                "name": "Test Teacher",
                "password": "hunter22"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "teacher@example.com");
    assert!(json["data"]["password_hash"].is_null());
    assert!(json["data"]["password"].is_null());

    // Unverified phone blocks login.
    let login = serde_json::json!({ "email": "teacher@example.com", "password": "hunter22" });
    let response = app
        .clone()
        .oneshot(post_json("/api/auth/teacher/login", &login))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    {
        use edhub::entities::teachers;
        use sea_orm::sea_query::Expr;
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

        teachers::Entity::update_many()
            .col_expr(teachers::Column::PhoneVerified, Expr::value(true))
            .filter(teachers::Column::Email.eq("teacher@example.com"))
            .exec(&store.conn)
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/teacher/login", &login))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let refresh = json["data"]["refresh_token"].as_str().unwrap().to_string();

    // Wrong password still fails after verification.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/teacher/login",
            &serde_json::json!({ "email": "teacher@example.com", "password": "nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown email is a lookup failure, not a credential failure.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/teacher/login",
            &serde_json::json!({ "email": "ghost@example.com", "password": "hunter22" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Refresh mints a new access token from the teacher refresh token.
    let response = app
        .oneshot(post_json(
            "/api/auth/teacher/token",
            &serde_json::json!({ "refresh_token": refresh }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["token"].is_string());
    assert!(json["data"]["refresh_token"].is_null());
}

#[tokio::test]
async fn test_refresh_rejects_wrong_domain_and_role() {
    let (app, _store) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/admin/login",
            &serde_json::json!({ "username": SEEDED_ADMIN, "password": SEEDED_PASSWORD }),
        ))
        .await
        .unwrap();
    let admin_refresh = body_json(response).await["data"]["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();

    // Admin-domain token on the teacher refresh endpoint.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/teacher/token",
            &serde_json::json!({ "refresh_token": admin_refresh }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(post_json(
            "/api/auth/admin/token",
            &serde_json::json!({ "refresh_token": "not.a.token" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_role_gate_at_service_level() {
    use edhub::auth::TokenService;
    use edhub::services::auth_service::{AuthError, AuthService, CreateAdmin};
    use edhub::services::{AuthRole, SeaOrmAuthService};

    let config = test_config();
    let store = Store::with_pool_options("sqlite::memory:", 1, 1).await.unwrap();
    let tokens = TokenService::new(&config.auth);

    // A teacher-scoped handler must refuse admin signups.
    let teacher_scoped =
        SeaOrmAuthService::new(store, tokens, config.security.clone(), AuthRole::Teacher);

    let result = teacher_scoped
        .admin_signup(CreateAdmin {
            username: "intruder".to_string(),
            password: "secret".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AuthError::RoleNotAllowed(_))));
}
