use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use cabinet_api::{ApiClient, LoginForm, PasswordForm, ProfileForm, RoleForm};
use core_types::UiLanguage;
use i18n::I18n;
use navigation::{HttpNavigationBackend, MemoryHost, NavigationHelper, NavigationSettings};
use page_controller::{
    AlertKind, GuardOutcome, LOGIN_ROUTE, PageController, Rejection, ResumeOutcome,
};
use serde_json::{Value, json};
use session::SessionStore;
use tempfile::TempDir;
use tokio::net::TcpListener;

const TOKEN: &str = "good-token";

#[derive(Clone)]
struct Backend {
    roles: Arc<Mutex<Vec<Value>>>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            roles: Arc::new(Mutex::new(vec![
                json!({"id": 1, "name": "superadmin", "status": "Active"}),
                json!({"id": 2, "name": "Nurse", "status": "Active", "created_at": "2024-01-05T10:30:00"}),
            ])),
        }
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn rejected(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({"detail": detail}))).into_response()
}

fn check(headers: &HeaderMap) -> Result<(), Response> {
    if bearer(headers) == Some(TOKEN) {
        Ok(())
    } else {
        Err(rejected(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    match (form.get("username").map(String::as_str), form.get("password").map(String::as_str)) {
        (Some("admin"), Some("secret")) => Json(json!({
            "access_token": TOKEN,
            "token_type": "bearer",
            "user": {"first_name": "Amina", "last_name": "Idrissi", "role": "Admin"}
        }))
        .into_response(),
        (Some("ghost"), _) => rejected(StatusCode::UNAUTHORIZED, "Account is deactivated"),
        (Some("crash"), _) => rejected(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
        (Some("teapot"), _) => rejected(StatusCode::IM_A_TEAPOT, "Short and stout"),
        _ => rejected(StatusCode::UNAUTHORIZED, "Invalid username or password"),
    }
}

async fn me(headers: HeaderMap) -> Response {
    if let Err(response) = check(&headers) {
        return response;
    }
    Json(json!({
        "first_name": "Amina",
        "last_name": "Idrissi",
        "role": "Admin",
        "date_of_birth": "1988-03-14T00:00:00",
        "city": "Rabat",
        "department_id": 3,
        "is_doctor": "true",
        "doctor_code": "D-77"
    }))
    .into_response()
}

async fn list_roles(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if let Err(response) = check(&headers) {
        return response;
    }
    let roles = backend.roles.lock().map(|roles| roles.clone()).unwrap_or_default();
    Json(Value::Array(roles)).into_response()
}

async fn create_role(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = check(&headers) {
        return response;
    }
    if body["name"] == "Forbidden" {
        return rejected(StatusCode::BAD_REQUEST, "Role name is reserved");
    }
    let Ok(mut roles) = backend.roles.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let role = json!({"id": roles.len() as i64 + 10, "name": body["name"], "description": body["description"]});
    roles.push(role.clone());
    Json(role).into_response()
}

async fn delete_role(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = check(&headers) {
        return response;
    }
    let Ok(mut roles) = backend.roles.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    roles.retain(|role| role["id"] != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn update_profile(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(response) = check(&headers) {
        return response;
    }
    if body["email"] == "taken@example.ma" {
        return rejected(StatusCode::BAD_REQUEST, "Email already exists");
    }
    Json(json!({
        "first_name": body["first_name"],
        "last_name": body["last_name"],
        "department_id": body["department_id"],
        "is_doctor": body["is_doctor"]
    }))
    .into_response()
}

async fn change_password(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(response) = check(&headers) {
        return response;
    }
    if body["current_password"] == "old-password" {
        Json(json!({"message": "ok"})).into_response()
    } else {
        rejected(StatusCode::BAD_REQUEST, "Current password is incorrect")
    }
}

async fn spawn_server() -> Result<String> {
    let app = Router::new()
        .route("/auth/token", post(token))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(|| async { StatusCode::OK }))
        .route("/auth/change-password", post(change_password))
        .route("/api/roles", get(list_roles).post(create_role))
        .route("/api/roles/:id", axum::routing::delete(delete_role))
        .route(
            "/api/departments/",
            get(|| async { Json(json!([{"id": 3, "name": "Cardiology"}])) }),
        )
        .route("/api/staff/me/update", put(update_profile))
        .route(
            "/app/routes",
            get(|| async {
                Json(json!({
                    "categories": {"settings": {"name": "Settings", "pages": [
                        {"route": "/roles", "title": "Roles", "description": "Role management"}
                    ]}},
                    "all_routes": [{"route": "/roles", "title": "Roles", "description": "Role management"}]
                }))
            }),
        )
        .route(
            "/app/page-info/*route",
            get(|| async { Json(json!({"title": "Roles", "route": "/roles"})) }),
        )
        .with_state(Backend::default());
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn dead_server() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

struct Fixture {
    controller: PageController,
    host: Arc<MemoryHost>,
    _dir: TempDir,
}

impl Fixture {
    fn new(server: &str, lang: UiLanguage) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let host = Arc::new(MemoryHost::new(server, "/app/roles"));
        let backend = HttpNavigationBackend::new(server, "/app", Duration::from_secs(2))?;
        let navigation = Arc::new(NavigationHelper::new(
            NavigationSettings::default(),
            Arc::new(backend),
            host.clone(),
        ));
        let api = ApiClient::new(server, Duration::from_secs(2))?;
        let controller =
            PageController::new(navigation, api, SessionStore::new(dir.path()), I18n::new(lang));
        Ok(Self {
            controller,
            host,
            _dir: dir,
        })
    }

    fn token(&self) -> Result<Option<String>> {
        self.controller.session().access_token()
    }

    fn last_url(&self) -> String {
        self.host.last_assigned().unwrap_or_default()
    }
}

fn login_form(username: &str, password: &str) -> LoginForm {
    LoginForm {
        username: username.into(),
        password: password.into(),
    }
}

fn alert_message(rejection: Rejection) -> String {
    match rejection {
        Rejection::Alert(alert) => alert.message,
        Rejection::Invalid(fields) => panic!("unexpected field errors: {fields:?}"),
    }
}

#[tokio::test]
async fn guard_redirects_without_session() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::FrFr)?;

    assert_eq!(fixture.controller.guard().await, GuardOutcome::RedirectLogin);
    assert!(fixture.last_url().ends_with("/app/login"));
    Ok(())
}

#[tokio::test]
async fn guard_clears_rejected_token_but_keeps_it_during_outage() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::FrFr)?;
    fixture.controller.session().set_access_token("stale")?;
    assert_eq!(fixture.controller.guard().await, GuardOutcome::RedirectLogin);
    assert_eq!(fixture.token()?, None);

    let offline = Fixture::new(&dead_server().await?, UiLanguage::FrFr)?;
    offline.controller.session().set_access_token(TOKEN)?;
    assert_eq!(offline.controller.guard().await, GuardOutcome::ServerError);
    assert!(offline.last_url().ends_with("/app/error-500"));
    assert_eq!(offline.token()?.as_deref(), Some(TOKEN));
    Ok(())
}

#[tokio::test]
async fn login_stores_session_and_welcomes_user() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::FrFr)?;

    let alert = fixture.controller.login(&login_form(" admin ", "secret")).await;
    let alert = alert.map_err(|rejection| anyhow::anyhow!("{rejection}"))?;
    assert_eq!(alert.kind, AlertKind::Success);
    assert_eq!(
        alert.message,
        "Bon retour, Amina ! Redirection vers votre tableau de bord..."
    );
    assert!(fixture.last_url().ends_with("/app/"));

    let snapshot = fixture.controller.session().snapshot()?;
    assert_eq!(snapshot.access_token.as_deref(), Some(TOKEN));
    assert_eq!(snapshot.user_name.as_deref(), Some("Amina Idrissi"));
    assert_eq!(snapshot.user_role.as_deref(), Some("Admin"));

    match fixture.controller.guard().await {
        GuardOutcome::Authenticated(user) => assert_eq!(user.role.as_deref(), Some("Admin")),
        other => panic!("expected authenticated, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn login_failures_are_localized() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::FrFr)?;
    let failure = |username: &'static str| {
        let form = login_form(username, "whatever");
        let controller = &fixture.controller;
        async move { controller.login(&form).await.map(|_| ()).map_err(alert_message) }
    };

    assert_eq!(
        failure("admin").await,
        Err("Échec de la connexion. Le nom d'utilisateur ou le mot de passe est incorrect. Veuillez réessayer.".to_string())
    );
    assert_eq!(
        failure("ghost").await,
        Err("Échec de la connexion. Votre compte a été désactivé. Veuillez contacter votre administrateur.".to_string())
    );
    assert_eq!(
        failure("crash").await,
        Err("Échec de la connexion. Nos serveurs rencontrent des problèmes. Veuillez réessayer dans quelques instants.".to_string())
    );
    assert_eq!(
        failure("teapot").await,
        Err("Échec de la connexion. Short and stout".to_string())
    );

    let missing = fixture.controller.login(&login_form("", "secret")).await;
    match missing {
        Err(Rejection::Invalid(fields)) => assert_eq!(fields[0].field, "username"),
        other => panic!("expected field errors, got {other:?}"),
    }
    assert_eq!(fixture.token()?, None);

    let offline = Fixture::new(&dead_server().await?, UiLanguage::EnUs)?;
    let err = offline.controller.login(&login_form("admin", "secret")).await;
    assert_eq!(
        err.map_err(alert_message),
        Err("Network error. Please check your connection and try again.".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn resume_session_outcomes() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::EnUs)?;
    assert_eq!(fixture.controller.resume_session().await, ResumeOutcome::NoSession);

    fixture.controller.session().set_access_token(TOKEN)?;
    let outcome = fixture.controller.resume_session().await;
    assert!(matches!(outcome, ResumeOutcome::Resumed(_)));
    assert!(fixture.last_url().ends_with("/app/"));

    fixture.controller.session().set_access_token("stale")?;
    let outcome = fixture.controller.resume_session().await;
    assert_eq!(
        outcome.alert().map(|alert| alert.message.as_str()),
        Some("Your session has expired. Please log in again.")
    );
    assert_eq!(fixture.token()?, None);

    let offline = Fixture::new(&dead_server().await?, UiLanguage::EnUs)?;
    offline.controller.session().set_access_token(TOKEN)?;
    let outcome = offline.controller.resume_session().await;
    assert!(matches!(outcome, ResumeOutcome::Unreachable(ref alert) if alert.kind == AlertKind::Error));
    assert_eq!(offline.token()?, None);
    Ok(())
}

#[tokio::test]
async fn header_and_logout() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::EnUs)?;
    assert_eq!(fixture.controller.header_info().await?, None);

    fixture.controller.session().set_access_token(TOKEN)?;
    let header = fixture.controller.header_info().await?.expect("header");
    assert_eq!(header.full_name, "Amina Idrissi");
    assert_eq!(header.role, "Admin");

    fixture.controller.session().set_access_token("stale")?;
    let header = fixture.controller.header_info().await?.expect("header");
    assert_eq!((header.full_name.as_str(), header.role.as_str()), ("User", "Guest"));

    let url = fixture.controller.logout().await;
    assert!(url.ends_with(&format!("/app{LOGIN_ROUTE}")));
    assert_eq!(fixture.token()?, None);

    let offline = Fixture::new(&dead_server().await?, UiLanguage::EnUs)?;
    offline.controller.session().set_access_token(TOKEN)?;
    assert!(offline.controller.header_info().await.is_err());
    assert!(offline.last_url().ends_with("/app/error-500"));
    Ok(())
}

#[tokio::test]
async fn role_management_round() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::EnUs)?;
    let controller = &fixture.controller;
    controller.session().set_access_token(TOKEN)?;

    let roles = controller.load_roles().await.map_err(|r| anyhow::anyhow!("{r}"))?;
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, "Nurse");

    let duplicate = RoleForm {
        name: "NURSE".into(),
        description: String::new(),
    };
    match controller.create_role(&duplicate).await {
        Err(Rejection::Invalid(fields)) => {
            assert_eq!(fields[0].message, "A role with this name already exists")
        }
        other => panic!("expected duplicate rejection, got {other:?}"),
    }

    let doctor = RoleForm {
        name: "Doctor".into(),
        description: "Consultations".into(),
    };
    let alert = controller.create_role(&doctor).await.map_err(|r| anyhow::anyhow!("{r}"))?;
    assert_eq!(alert.message, "Role created successfully");
    assert_eq!(controller.cached_roles().len(), 2);

    let reserved = RoleForm {
        name: "Forbidden".into(),
        description: String::new(),
    };
    assert_eq!(
        controller.create_role(&reserved).await.map_err(alert_message),
        Err("Role name is reserved".to_string())
    );

    let alert = controller.delete_role(2).await.map_err(|r| anyhow::anyhow!("{r}"))?;
    assert_eq!(alert.message, "Role deleted successfully");
    let names: Vec<String> = controller.cached_roles().into_iter().map(|role| role.name).collect();
    assert_eq!(names, ["Doctor"]);
    Ok(())
}

#[tokio::test]
async fn expired_token_ends_role_session() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::FrFr)?;
    fixture.controller.session().set_access_token("stale")?;

    let err = fixture.controller.load_roles().await.map_err(alert_message);
    assert_eq!(
        err,
        Err("Votre session a expiré. Veuillez vous reconnecter.".to_string())
    );
    assert_eq!(fixture.token()?, None);
    assert!(fixture.last_url().ends_with("/app/login"));
    Ok(())
}

#[tokio::test]
async fn profile_and_departments() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::EnUs)?;
    let controller = &fixture.controller;
    controller.session().set_access_token(TOKEN)?;

    let options = controller
        .department_options_html()
        .await
        .map_err(|r| anyhow::anyhow!("{r}"))?;
    assert_eq!(
        options,
        r#"<option value="">Select a department</option><option value="3">Cardiology</option>"#
    );

    let form = ProfileForm {
        first_name: "Amina".into(),
        last_name: "Idrissi".into(),
        department_id: "3".into(),
        ..ProfileForm::default()
    };
    let alert = controller.save_profile(&form).await.map_err(|r| anyhow::anyhow!("{r}"))?;
    assert_eq!(alert.message, "Profile updated successfully!");
    let snapshot = controller.session().snapshot()?;
    assert_eq!(snapshot.user_department_id, Some(3));
    assert_eq!(snapshot.user_is_doctor, Some(false));

    let taken = ProfileForm {
        email: "taken@example.ma".into(),
        ..form.clone()
    };
    assert_eq!(
        controller.save_profile(&taken).await.map_err(alert_message),
        Err("Failed to update profile. The email address is already in use.".to_string())
    );

    let invalid = ProfileForm {
        first_name: String::new(),
        ..form
    };
    match controller.save_profile(&invalid).await {
        Err(Rejection::Invalid(fields)) => {
            assert_eq!(fields[0].field, "first_name");
            assert_eq!(fields[0].message, "This field is required");
        }
        other => panic!("expected field errors, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn profile_page_fills_form_from_current_user() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::FrFr)?;
    let controller = &fixture.controller;

    assert_eq!(
        controller.load_profile().await.map(|_| ()).map_err(alert_message),
        Err("Veuillez vous connecter pour accéder à votre profil.".to_string())
    );
    assert!(fixture.last_url().ends_with("/app/login"));

    controller.session().set_access_token(TOKEN)?;
    let (form, departments) = controller
        .load_profile()
        .await
        .map_err(|r| anyhow::anyhow!("{r}"))?;
    assert_eq!(form.first_name, "Amina");
    assert_eq!(form.date_of_birth, "1988-03-14");
    assert_eq!(form.city, "Rabat");
    assert_eq!(form.department_id, "3");
    assert!(form.is_doctor);
    assert_eq!(form.doctor_code, "D-77");
    assert_eq!(departments[0].name, "Cardiology");

    controller.session().set_access_token("stale")?;
    assert_eq!(
        controller.load_profile().await.map(|_| ()).map_err(alert_message),
        Err("Votre session a expiré. Veuillez vous reconnecter.".to_string())
    );
    assert_eq!(fixture.token()?, None);

    let offline = Fixture::new(&dead_server().await?, UiLanguage::FrFr)?;
    offline.controller.session().set_access_token(TOKEN)?;
    assert_eq!(
        offline.controller.load_profile().await.map(|_| ()).map_err(alert_message),
        Err("Impossible de se connecter au serveur. Veuillez vérifier votre connexion et réessayer.".to_string())
    );
    assert_eq!(offline.token()?.as_deref(), Some(TOKEN));
    Ok(())
}

#[tokio::test]
async fn password_change_forces_new_login() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::EnUs)?;
    let controller = &fixture.controller;
    controller
        .login(&login_form("admin", "secret"))
        .await
        .map_err(|r| anyhow::anyhow!("{r}"))?;

    let wrong = PasswordForm {
        current_password: "nope".into(),
        new_password: "new-password".into(),
        confirm_password: "new-password".into(),
    };
    assert_eq!(
        controller.change_password(&wrong).await.map_err(alert_message),
        Err("Current password is incorrect".to_string())
    );
    assert_eq!(fixture.token()?.as_deref(), Some(TOKEN));

    let right = PasswordForm {
        current_password: "old-password".into(),
        ..wrong
    };
    let alert = controller.change_password(&right).await.map_err(|r| anyhow::anyhow!("{r}"))?;
    assert_eq!(alert.message, "Password changed successfully");
    assert_eq!(fixture.token()?, None);
    let snapshot = controller.session().snapshot()?;
    assert_eq!(snapshot.user_name.as_deref(), Some("Amina Idrissi"));
    assert!(fixture.last_url().ends_with("/app/login"));
    Ok(())
}

#[tokio::test]
async fn init_navigation_sets_title() -> Result<()> {
    let server = spawn_server().await?;
    let fixture = Fixture::new(&server, UiLanguage::EnUs)?;
    fixture.controller.init_navigation().await;
    assert_eq!(fixture.host.title(), "Roles - Cabinet Management");
    assert!(fixture.controller.navigation().is_listening());
    Ok(())
}
