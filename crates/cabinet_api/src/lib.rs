pub mod cities;
mod client;
mod error;
pub mod roles;
pub mod validation;

pub use cities::{CITIES, city_options_html};
pub use client::ApiClient;
pub use error::ApiError;
pub use roles::{format_role_date, status_badge_html};
pub use validation::{FieldError, LoginForm, PasswordForm, ProfileForm, RoleForm};
