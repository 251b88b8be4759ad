use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use edhub::config::Config;
use edhub::db::{Store, StudentKey};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.auth.jwt_secret = Some("test-standard-secret".to_string());
    config.auth.jwt_admin_secret = Some("test-admin-secret".to_string());
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

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn post_json_auth(uri: &str, token: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn admin_token(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/admin/login",
            &serde_json::json!({ "username": "admin", "password": "password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn student_token(app: &Router, email: &str, otp: &str) -> String {
    app.clone()
        .oneshot(post_json(
            "/api/student/email/otp/send",
            &serde_json::json!({ "email": email }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/student/email/otp/verify",
            &serde_json::json!({ "email": email, "otp": otp }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn create_organization(app: &Router, admin: &str, name: &str) -> i32 {
    let response = app
        .clone()
        .oneshot(post_json_auth(
            "/api/organization/create",
            admin,
            &serde_json::json!({ "name": name }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    i32::try_from(body_json(response).await["data"]["id"].as_i64().unwrap()).unwrap()
}

#[tokio::test]
async fn test_organization_endpoints_require_admin_token() {
    let config = test_config();
    let guest_email = config.auth.guest_email.clone();
    let guest_otp = config.auth.guest_otp.clone();
    let (app, _store) = spawn_app_with(config).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/organization/create",
            &serde_json::json!({ "name": "No Auth School" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Standard-domain student tokens are not valid on admin routes.
    let student = student_token(&app, &guest_email, &guest_otp).await;
    let response = app
        .oneshot(post_json_auth(
            "/api/organization/create",
            &student,
            &serde_json::json!({ "name": "Student School" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_activation_code_flow_joins_organization() {
    let config = test_config();
    let guest_email = config.auth.guest_email.clone();
    let guest_otp = config.auth.guest_otp.clone();
    let (app, store) = spawn_app_with(config).await;

    let admin = admin_token(&app).await;
    let org_id = create_organization(&app, &admin, "Evolve Academy").await;

    let response = app
        .clone()
        .oneshot(post_json_auth(
            "/api/organization/activation_code/new",
            &admin,
            &serde_json::json!({ "organization_id": org_id, "student_email": guest_email }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The code only travels by email, never in the response.
    let json = body_json(response).await;
    assert_eq!(json["data"]["student_email"], guest_email.clone());
    assert!(json["data"]["activation_code"].is_null());

    let code = store
        .get_activation_code_by_email(&guest_email)
        .await
        .unwrap()
        .unwrap()
        .activation_code;

    let student = student_token(&app, &guest_email, &guest_otp).await;

    // A wrong code fails and the failure is counted.
    let response = app
        .clone()
        .oneshot(post_json_auth(
            "/api/organization/join/student",
            &student,
            &serde_json::json!({ "activation_code": "WrongCode1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let record = store
        .get_student(&StudentKey::Email(guest_email.clone()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.activation_attempts, 1);

    let response = app
        .clone()
        .oneshot(post_json_auth(
            "/api/organization/join/student",
            &student,
            &serde_json::json!({ "activation_code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = store
        .get_student(&StudentKey::Email(guest_email))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.organization_id, Some(org_id));
    assert!(record.live_class_enabled);
    assert_eq!(record.activation_attempts, 0);
}

#[tokio::test]
async fn test_join_without_invite_is_not_found_but_counted() {
    let config = test_config();
    let guest_email = config.auth.guest_email.clone();
    let guest_otp = config.auth.guest_otp.clone();
    let (app, store) = spawn_app_with(config).await;

    let student = student_token(&app, &guest_email, &guest_otp).await;

    let response = app
        .oneshot(post_json_auth(
            "/api/organization/join/student",
            &student,
            &serde_json::json!({ "activation_code": "NoInvite99" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let record = store
        .get_student(&StudentKey::Email(guest_email))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.activation_attempts, 1);
}

#[tokio::test]
async fn test_join_locks_out_after_too_many_attempts() {
    let mut config = test_config();
    config.auth.max_activation_attempts = 2;
    let guest_email = config.auth.guest_email.clone();
    let guest_otp = config.auth.guest_otp.clone();
    let (app, store) = spawn_app_with(config).await;

    let admin = admin_token(&app).await;
    let org_id = create_organization(&app, &admin, "Lockout School").await;

    app.clone()
        .oneshot(post_json_auth(
            "/api/organization/activation_code/new",
            &admin,
            &serde_json::json!({ "organization_id": org_id, "student_email": guest_email }),
        ))
        .await
        .unwrap();

    let code = store
        .get_activation_code_by_email(&guest_email)
        .await
        .unwrap()
        .unwrap()
        .activation_code;

    let student = student_token(&app, &guest_email, &guest_otp).await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json_auth(
                "/api/organization/join/student",
                &student,
                &serde_json::json!({ "activation_code": "WrongCode1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // At the limit even the correct code is refused.
    let response = app
        .oneshot(post_json_auth(
            "/api/organization/join/student",
            &student,
            &serde_json::json!({ "activation_code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_activation_code_listing_is_redacted_and_paginated() {
    let (app, _store) = spawn_app_with(test_config()).await;

    let admin = admin_token(&app).await;
    let org_id = create_organization(&app, &admin, "Listing School").await;

    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        let response = app
            .clone()
            .oneshot(post_json_auth(
                "/api/organization/activation_code/new",
                &admin,
                &serde_json::json!({ "organization_id": org_id, "student_email": email }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/organization/activation_code/all?skip=1&limit=2")
                .header("Authorization", format!("Bearer {admin}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 3);
    let items = json["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    for item in items {
        assert!(item["student_email"].is_string());
        assert!(item["activation_code"].is_null());
    }
}

#[tokio::test]
async fn test_reinvite_replaces_existing_code() {
    let (app, store) = spawn_app_with(test_config()).await;

    let admin = admin_token(&app).await;
    let org_id = create_organization(&app, &admin, "Reinvite School").await;

    for _ in 0..2 {
        app.clone()
            .oneshot(post_json_auth(
                "/api/organization/activation_code/new",
                &admin,
                &serde_json::json!({ "organization_id": org_id, "student_email": "re@example.com" }),
            ))
            .await
            .unwrap();
    }

    assert_eq!(store.count_activation_codes().await.unwrap(), 1);
}

#[tokio::test]
async fn test_batch_membership_is_scoped_to_the_organization() {
    let config = test_config();
    let guest_email = config.auth.guest_email.clone();
    let guest_otp = config.auth.guest_otp.clone();
    let (app, store) = spawn_app_with(config).await;

    let admin = admin_token(&app).await;
    let home_org = create_organization(&app, &admin, "Home Org").await;
    let other_org = create_organization(&app, &admin, "Other Org").await;

    app.clone()
        .oneshot(post_json_auth(
            "/api/organization/activation_code/new",
            &admin,
            &serde_json::json!({ "organization_id": home_org, "student_email": guest_email }),
        ))
        .await
        .unwrap();

    let code = store
        .get_activation_code_by_email(&guest_email)
        .await
        .unwrap()
        .unwrap()
        .activation_code;

    let student = student_token(&app, &guest_email, &guest_otp).await;
    app.clone()
        .oneshot(post_json_auth(
            "/api/organization/join/student",
            &student,
            &serde_json::json!({ "activation_code": code }),
        ))
        .await
        .unwrap();

    let student_id = store
        .get_student(&StudentKey::Email(guest_email.clone()))
        .await
        .unwrap()
        .unwrap()
        .id;

    let make_batch = |name: &str, org: i32| {
        serde_json::json!({ "name": name, "organization_id": org })
    };

    let response = app
        .clone()
        .oneshot(post_json_auth(
            "/api/organization/batch/create",
            &admin,
            &make_batch("Home Batch", home_org),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let home_batch =
        i32::try_from(body_json(response).await["data"]["id"].as_i64().unwrap()).unwrap();

    let response = app
        .clone()
        .oneshot(post_json_auth(
            "/api/organization/batch/create",
            &admin,
            &make_batch("Other Batch", other_org),
        ))
        .await
        .unwrap();
    let other_batch =
        i32::try_from(body_json(response).await["data"]["id"].as_i64().unwrap()).unwrap();

    // A batch from another organization is rejected.
    let response = app
        .clone()
        .oneshot(post_json_auth(
            "/api/organization/batch/add/student",
            &admin,
            &serde_json::json!({ "student_id": student_id, "batch_id": other_batch }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post_json_auth(
            "/api/organization/batch/add/student",
            &admin,
            &serde_json::json!({ "student_id": student_id, "batch_id": home_batch }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = store
        .get_student(&StudentKey::Id(student_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.batch_id, Some(home_batch));

    let response = app
        .oneshot(post_json_auth(
            "/api/organization/batch/remove/student",
            &admin,
            &serde_json::json!({ "student_id": student_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = store
        .get_student(&StudentKey::Id(student_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.batch_id, None);
}
