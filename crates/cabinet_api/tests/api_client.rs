use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use cabinet_api::{ApiClient, ApiError};
use core_types::{PasswordChange, ProfileUpdate, RolePayload};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const TOKEN: &str = "token-123";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some("Bearer token-123")
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    match (form.get("username").map(String::as_str), form.get("password").map(String::as_str)) {
        (Some("admin"), Some("secret")) => Json(json!({
            "access_token": TOKEN,
            "token_type": "bearer",
            "user": {"id": 1, "username": "admin", "first_name": "Amina", "last_name": "Idrissi",
                     "role": "Admin", "is_doctor": "true", "department_id": 3}
        }))
        .into_response(),
        (Some("ghost"), _) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Account is deactivated"})),
        )
            .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid username or password"})),
        )
            .into_response(),
    }
}

async fn me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"id": 1, "username": "admin", "full_name": "Amina Idrissi", "role": "Admin"}))
        .into_response()
}

async fn roles(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        {"id": 1, "name": "SuperAdmin", "status": "Active"},
        {"id": 2, "name": "Nurse", "description": "Ward care", "created_at": "2024-01-05T10:30:00"},
        {"id": 3, "name": "Receptionist", "status": "Inactive"}
    ]))
    .into_response()
}

async fn create_role(Json(body): Json<Value>) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({"id": 9, "name": body["name"], "description": body["description"]})),
    )
        .into_response()
}

async fn update_role(Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    Json(json!({"id": id, "name": body["name"], "description": body["description"], "status": "Active"}))
        .into_response()
}

async fn delete_role(Path(id): Path<i64>) -> StatusCode {
    if id == 2 {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn change_password(Json(body): Json<Value>) -> Response {
    if body["current_password"] == "old-password" {
        Json(json!({"message": "Password changed"})).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Current password is incorrect"})),
        )
            .into_response()
    }
}

async fn update_profile(Json(body): Json<Value>) -> Response {
    if body.get("fax").is_some() {
        return (StatusCode::UNPROCESSABLE_ENTITY, "unexpected fax").into_response();
    }
    Json(json!({
        "first_name": body["first_name"],
        "last_name": body["last_name"],
        "email": body["email"],
        "is_doctor": body["is_doctor"]
    }))
    .into_response()
}

async fn spawn() -> Result<ApiClient> {
    let app = Router::new()
        .route("/auth/token", post(token))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(|| async { StatusCode::OK }))
        .route("/auth/change-password", post(change_password))
        .route("/api/roles", get(roles).post(create_role))
        .route("/api/roles/:id", put(update_role).delete(delete_role))
        .route(
            "/api/departments/",
            get(|| async { Json(json!([{"id": 3, "name": "Cardiology"}, {"id": 4, "name": "Radiology"}])) }),
        )
        .route("/api/staff/me/update", put(update_profile));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(ApiClient::new(&format!("http://{addr}/"), Duration::from_secs(5))?)
}

#[tokio::test]
async fn login_and_current_user() -> Result<()> {
    let api = spawn().await?;

    let login = api.login("admin", "secret").await?;
    assert_eq!(login.access_token, TOKEN);
    let user = login.user.expect("user in login response");
    assert!(user.is_doctor);
    assert_eq!(user.department_id, Some(3));

    let me = api.current_user(TOKEN).await?;
    assert_eq!(me.full_name.as_deref(), Some("Amina Idrissi"));

    let err = api.current_user("stale").await.expect_err("stale token");
    assert!(err.is_unauthorized());
    api.logout(TOKEN).await?;
    Ok(())
}

#[tokio::test]
async fn login_failures_carry_detail() -> Result<()> {
    let api = spawn().await?;

    let err = api.login("admin", "wrong").await.expect_err("bad password");
    assert_eq!(err.detail(), Some("Invalid username or password"));

    let err = api.login("ghost", "secret").await.expect_err("deactivated");
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(err.detail(), Some("Account is deactivated"));
    Ok(())
}

#[tokio::test]
async fn roles_crud_hides_superadmin() -> Result<()> {
    let api = spawn().await?;

    let roles = api.list_roles(TOKEN).await?;
    let names: Vec<&str> = roles.iter().map(|role| role.name.as_str()).collect();
    assert_eq!(names, ["Nurse", "Receptionist"]);
    assert_eq!(roles[0].status, "Active");
    assert_eq!(roles[1].status, "Inactive");

    let payload = RolePayload {
        name: "Doctor".into(),
        description: "Consultations".into(),
    };
    let created = api.create_role(TOKEN, &payload).await?;
    assert_eq!(created.id, 9);
    assert_eq!(created.name, "Doctor");

    let updated = api.update_role(TOKEN, 2, &payload).await?;
    assert_eq!(updated.id, 2);

    api.delete_role(TOKEN, 2).await?;
    let err = api.delete_role(TOKEN, 77).await.expect_err("missing role");
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
    Ok(())
}

#[tokio::test]
async fn departments_password_and_profile() -> Result<()> {
    let api = spawn().await?;

    let departments = api.list_departments(TOKEN).await?;
    assert_eq!(departments.len(), 2);
    assert_eq!(departments[1].name, "Radiology");

    let change = PasswordChange {
        current_password: "nope".into(),
        new_password: "new-password".into(),
    };
    let err = api.change_password(TOKEN, &change).await.expect_err("wrong current");
    assert!(matches!(err, ApiError::BadRequest { .. }));
    assert_eq!(err.detail(), Some("Current password is incorrect"));

    let change = PasswordChange {
        current_password: "old-password".into(),
        ..change
    };
    api.change_password(TOKEN, &change).await?;

    let update = ProfileUpdate {
        first_name: "Amina".into(),
        last_name: "Idrissi".into(),
        email: Some("amina@example.ma".into()),
        ..ProfileUpdate::default()
    };
    let user = api.update_profile(TOKEN, &update).await?;
    assert_eq!(user.email.as_deref(), Some("amina@example.ma"));
    assert!(!user.is_doctor);
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_distinguished() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let api = ApiClient::new(&format!("http://{addr}"), Duration::from_secs(2))?;
    let err = api.current_user(TOKEN).await.expect_err("nothing listening");
    assert!(err.is_unreachable());
    Ok(())
}
