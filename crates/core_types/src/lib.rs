use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub type RoleId = i64;
pub type DepartmentId = i64;
pub type CategoryKey = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UiLanguage {
    FrFr,
    EnUs,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    #[default]
    Hard,
    Soft,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageEntry {
    pub route: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageEntry {
    pub fn new(
        route: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            route: route.into(),
            title: title.into(),
            description: description.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteCategory {
    pub name: String,
    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

// Category order follows the order of the JSON object the server sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RouteManifest {
    #[serde(default)]
    pub all_routes: Vec<PageEntry>,
    #[serde(default)]
    pub categories: IndexMap<CategoryKey, RouteCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct BreadcrumbItem {
    pub title: String,
    pub route: String,
    pub active: bool,
}

impl BreadcrumbItem {
    pub fn home() -> Self {
        Self {
            title: "Home".to_string(),
            route: "/".to_string(),
            active: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct NavPage {
    pub title: String,
    pub route: String,
    pub description: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct NavCategory {
    pub name: String,
    pub key: CategoryKey,
    pub pages: Vec<NavPage>,
}

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum NavigationError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("response from {url} could not be decoded: {message}")]
    Decode { url: String, message: String },
    #[error("invalid navigation url: {0}")]
    InvalidUrl(String),
}

// `route` arguments are already normalized to start with `/`.
#[async_trait]
pub trait NavigationBackend: Send + Sync {
    async fn fetch_manifest(&self) -> Result<RouteManifest, NavigationError>;
    async fn fetch_page_info(&self, route: &str) -> Result<PageInfo, NavigationError>;
    async fn fetch_category(&self, category: &str) -> Result<RouteCategory, NavigationError>;
}

pub trait PageHost: Send + Sync {
    fn origin(&self) -> String;
    fn pathname(&self) -> String;
    fn assign(&self, url: &str);
    fn push_state(&self, url: &str);
    fn set_title(&self, title: &str);
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_role_status")]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_role_status() -> String {
    "Active".to_string()
}

impl Role {
    pub fn is_superadmin(&self) -> bool {
        self.name.eq_ignore_ascii_case("superadmin")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct RolePayload {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub head_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CurrentUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub marital_status: Option<String>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub home_phone: Option<String>,
    #[serde(default)]
    pub fax: Option<String>,
    #[serde(default)]
    pub line: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub doctor_code: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_doctor: bool,
}

impl CurrentUser {
    pub fn display_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                Some(format!("{first} {last}"))
            }
            _ => None,
        }
    }
}

// The backend has sent both `true` and `"true"` for this flag.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => flag,
        Some(Value::String(text)) => text == "true",
        _ => false,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<CurrentUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

// Body of `PUT /api/staff/me/update`. Absent fields are left untouched
// by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    pub is_doctor: bool,
}
