mod markup;
mod settings;

use std::fmt;
use std::sync::Arc;

use cabinet_api::{ApiClient, ApiError, FieldError, LoginForm};
use core_types::{CurrentUser, Role};
use i18n::I18n;
use navigation::NavigationHelper;
use parking_lot::RwLock;
use session::SessionStore;
use tracing::{debug, error, info, warn};

pub use markup::{department_options_html, role_rows_html};

pub const LOGIN_ROUTE: &str = "/login";
pub const DASHBOARD_ROUTE: &str = "/";
pub const SERVER_ERROR_ROUTE: &str = "/error-500";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Invalid(Vec<FieldMessage>),
    Alert(Alert),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(fields) => {
                let messages: Vec<&str> = fields.iter().map(|field| field.message.as_str()).collect();
                f.write_str(&messages.join(" "))
            }
            Self::Alert(alert) => alert.fmt(f),
        }
    }
}

pub type PageResult<T> = Result<T, Rejection>;

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Authenticated(CurrentUser),
    RedirectLogin,
    ServerError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    NoSession,
    Resumed(Alert),
    Expired(Alert),
    Unreachable(Alert),
}

impl ResumeOutcome {
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            Self::NoSession => None,
            Self::Resumed(alert) | Self::Expired(alert) | Self::Unreachable(alert) => Some(alert),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub full_name: String,
    pub role: String,
    pub avatar: Option<String>,
}

pub struct PageController {
    navigation: Arc<NavigationHelper>,
    api: ApiClient,
    session: SessionStore,
    i18n: I18n,
    roles: RwLock<Vec<Role>>,
}

impl PageController {
    pub fn new(
        navigation: Arc<NavigationHelper>,
        api: ApiClient,
        session: SessionStore,
        i18n: I18n,
    ) -> Self {
        Self {
            navigation,
            api,
            session,
            i18n,
            roles: RwLock::new(Vec::new()),
        }
    }

    pub fn navigation(&self) -> &Arc<NavigationHelper> {
        &self.navigation
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn init_navigation(&self) {
        self.navigation.init().await;
    }

    // Runs before any protected page renders. Redirects to the login page
    // when there is no usable session and to the error page when the
    // server cannot be reached; the token survives an outage.
    pub async fn guard(&self) -> GuardOutcome {
        let Some(token) = self.stored_token() else {
            self.navigation.navigate_to(LOGIN_ROUTE);
            return GuardOutcome::RedirectLogin;
        };

        match self.api.current_user(&token).await {
            Ok(user) => GuardOutcome::Authenticated(user),
            Err(err) if err.is_unreachable() => {
                warn!(error = %err, "auth check could not reach the server");
                self.navigation.navigate_to(SERVER_ERROR_ROUTE);
                GuardOutcome::ServerError
            }
            Err(err) => {
                info!(error = %err, "stored token rejected");
                self.forget_token();
                self.navigation.navigate_to(LOGIN_ROUTE);
                GuardOutcome::RedirectLogin
            }
        }
    }

    pub async fn resume_session(&self) -> ResumeOutcome {
        let Some(token) = self.stored_token() else {
            return ResumeOutcome::NoSession;
        };

        match self.api.current_user(&token).await {
            Ok(_) => {
                self.navigation.navigate_to(DASHBOARD_ROUTE);
                ResumeOutcome::Resumed(Alert::success(self.i18n.t("session.resumed")))
            }
            Err(err) => {
                debug!(error = %err, "token check failed");
                self.forget_token();
                match err {
                    ApiError::Unreachable(_) => ResumeOutcome::Unreachable(Alert::error(
                        self.i18n.t("session.unreachable"),
                    )),
                    ApiError::Transport(_) | ApiError::Decode(_) => ResumeOutcome::Expired(
                        Alert::info(self.i18n.t("session.check_failed")),
                    ),
                    _ => ResumeOutcome::Expired(Alert::info(self.i18n.t("session.expired"))),
                }
            }
        }
    }

    pub async fn login(&self, form: &LoginForm) -> PageResult<Alert> {
        let (username, password) = form.validate().map_err(|errors| self.invalid(&errors))?;

        let login = match self.api.login(&username, &password).await {
            Ok(login) => login,
            Err(err) => {
                warn!(%username, error = %err, "login failed");
                return Err(Rejection::Alert(Alert::error(self.login_failure(&err))));
            }
        };

        self.session
            .remember_login(&login)
            .map_err(|err| self.storage_failure(err))?;

        let name = login
            .user
            .as_ref()
            .and_then(|user| user.first_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or(username);
        info!(user = %name, "logged in");
        self.navigation.navigate_to(DASHBOARD_ROUTE);
        Ok(Alert::success(
            self.i18n.format("login.welcome", &[("name", name.as_str())]),
        ))
    }

    pub async fn logout(&self) -> String {
        let token = self.stored_token();
        self.forget_token();
        if let Some(token) = token {
            if let Err(err) = self.api.logout(&token).await {
                debug!(error = %err, "logout endpoint not available");
            }
        }
        self.navigation.navigate_to(LOGIN_ROUTE)
    }

    pub async fn header_info(&self) -> Result<Option<HeaderInfo>, ApiError> {
        let Some(token) = self.stored_token() else {
            return Ok(None);
        };

        match self.api.current_user(&token).await {
            Ok(user) => Ok(Some(self.header_from(user))),
            Err(err) if err.is_unreachable() => {
                self.navigation.navigate_to(SERVER_ERROR_ROUTE);
                Err(err)
            }
            Err(err) => {
                debug!(error = %err, "failed to fetch user info");
                Ok(Some(HeaderInfo {
                    full_name: self.i18n.t("header.default_name").to_string(),
                    role: self.i18n.t("header.guest").to_string(),
                    avatar: None,
                }))
            }
        }
    }

    fn header_from(&self, user: CurrentUser) -> HeaderInfo {
        let full_name = user
            .full_name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| user.display_name())
            .unwrap_or_else(|| self.i18n.t("header.default_name").to_string());
        let role = user
            .role
            .filter(|role| !role.is_empty())
            .unwrap_or_else(|| self.i18n.t("header.default_role").to_string());
        HeaderInfo {
            full_name,
            role,
            avatar: user.profile_image,
        }
    }

    fn login_failure(&self, err: &ApiError) -> String {
        let reason = match err {
            ApiError::Unauthorized { detail } => {
                let detail = detail.as_deref().unwrap_or_default();
                if detail.contains("Invalid username or password") {
                    self.i18n.t("login.invalid_credentials")
                } else if detail.contains("Account is deactivated") {
                    self.i18n.t("login.account_deactivated")
                } else {
                    self.i18n.t("login.check_credentials")
                }
            }
            ApiError::BadRequest { .. } => self.i18n.t("login.check_input"),
            ApiError::Server { .. } => self.i18n.t("login.server_trouble"),
            ApiError::Status { detail, .. } => {
                detail.as_deref().unwrap_or(self.i18n.t("login.retry"))
            }
            ApiError::Unreachable(_) | ApiError::Transport(_) | ApiError::Decode(_) => {
                return self.i18n.t("login.network").to_string();
            }
        };
        format!("{} {reason}", self.i18n.t("login.failed"))
    }

    fn stored_token(&self) -> Option<String> {
        self.session
            .access_token()
            .inspect_err(|err| error!(error = %err, "failed to read session"))
            .ok()
            .flatten()
    }

    fn forget_token(&self) {
        if let Err(err) = self.session.clear_access_token() {
            error!(error = %err, "failed to clear session token");
        }
    }

    fn require_token(&self) -> PageResult<String> {
        match self.session.access_token() {
            Ok(Some(token)) => Ok(token),
            Ok(None) => {
                self.navigation.navigate_to(LOGIN_ROUTE);
                Err(Rejection::Alert(Alert::error(
                    self.i18n.t("session.login_required"),
                )))
            }
            Err(err) => Err(self.storage_failure(err)),
        }
    }

    fn invalid(&self, errors: &[FieldError]) -> Rejection {
        Rejection::Invalid(
            errors
                .iter()
                .map(|err| FieldMessage {
                    field: err.field,
                    message: self.i18n.t(err.message_key).to_string(),
                })
                .collect(),
        )
    }

    fn storage_failure(&self, err: impl fmt::Display) -> Rejection {
        error!(error = %err, "session storage failed");
        Rejection::Alert(Alert::error(self.i18n.t("session.storage_failed")))
    }

    // Common handling of a failed authenticated call: an expired token
    // ends the session, anything else reports the server's reason or
    // `fallback_key`.
    fn api_failure(&self, err: ApiError, fallback_key: &str) -> Rejection {
        if err.is_unauthorized() {
            self.forget_token();
            self.navigation.navigate_to(LOGIN_ROUTE);
            return Rejection::Alert(Alert::error(self.i18n.t("session.expired")));
        }
        let message = err
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| self.i18n.t(fallback_key).to_string());
        Rejection::Alert(Alert::error(message))
    }
}
