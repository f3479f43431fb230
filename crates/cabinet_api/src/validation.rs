use std::sync::LazyLock;

use core_types::{
    CurrentUser, DepartmentId, PasswordChange, ProfileUpdate, Role, RoleId, RolePayload,
};
use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_ROLE_NAME_LEN: usize = 2;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());
static PHONE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[\d\s()\-.+]+$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message_key: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message_key: &'static str) -> Self {
        Self { field, message_key }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(String, String), Vec<FieldError>> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            return Err(vec![FieldError::new("username", "login.missing_fields")]);
        }
        Ok((username.to_string(), self.password.clone()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoleForm {
    pub name: String,
    pub description: String,
}

impl RoleForm {
    // `editing` is the id of the role being updated; it does not clash
    // with its own name.
    pub fn validate(
        &self,
        existing: &[Role],
        editing: Option<RoleId>,
    ) -> Result<RolePayload, Vec<FieldError>> {
        let name = self.name.trim();
        let failure = if name.is_empty() {
            Some("role.name_required")
        } else if name.chars().count() < MIN_ROLE_NAME_LEN {
            Some("role.name_too_short")
        } else if existing
            .iter()
            .any(|role| Some(role.id) != editing && role.name.to_lowercase() == name.to_lowercase())
        {
            Some("role.name_taken")
        } else {
            None
        };

        match failure {
            Some(key) => Err(vec![FieldError::new("name", key)]),
            None => Ok(RolePayload {
                name: name.to_string(),
                description: self.description.trim().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordForm {
    pub fn validate(&self) -> Result<PasswordChange, Vec<FieldError>> {
        if self.current_password.is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(vec![FieldError::new(
                "current_password",
                "password.all_required",
            )]);
        }
        if self.new_password != self.confirm_password {
            return Err(vec![FieldError::new("confirm_password", "password.mismatch")]);
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(vec![FieldError::new("new_password", "password.too_short")]);
        }
        Ok(PasswordChange {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub marital_status: String,
    pub mobile_phone: String,
    pub home_phone: String,
    pub fax: String,
    pub email: String,
    pub line: String,
    pub city: String,
    pub department_id: String,
    pub specialization: String,
    pub is_doctor: bool,
    pub doctor_code: String,
    pub license_number: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ProfileUpdate, Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.first_name.trim().is_empty() {
            errors.push(FieldError::new("first_name", "form.required"));
        }
        if self.last_name.trim().is_empty() {
            errors.push(FieldError::new("last_name", "form.required"));
        }
        if let Some(email) = present(&self.email) {
            if !matches(&EMAIL, &email) {
                errors.push(FieldError::new("email", "form.invalid_email"));
            }
        }
        for (field, value) in [
            ("mobile_phone", &self.mobile_phone),
            ("home_phone", &self.home_phone),
        ] {
            if let Some(phone) = present(value) {
                if !matches(&PHONE, &phone) {
                    errors.push(FieldError::new(field, "form.invalid_phone"));
                }
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let (doctor_code, license_number) = if self.is_doctor {
            (present(&self.doctor_code), present(&self.license_number))
        } else {
            (None, None)
        };
        Ok(ProfileUpdate {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            date_of_birth: present(&self.date_of_birth),
            gender: present(&self.gender),
            marital_status: present(&self.marital_status),
            mobile_phone: present(&self.mobile_phone),
            home_phone: present(&self.home_phone),
            fax: present(&self.fax),
            email: present(&self.email),
            line: present(&self.line),
            city: present(&self.city),
            department_id: present(&self.department_id)
                .and_then(|id| id.parse::<DepartmentId>().ok()),
            specialization: present(&self.specialization),
            doctor_code,
            license_number,
            is_doctor: self.is_doctor,
        })
    }
}

// Doctor fields stay blank unless the account is flagged as a doctor.
impl From<&CurrentUser> for ProfileForm {
    fn from(user: &CurrentUser) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let (doctor_code, license_number) = if user.is_doctor {
            (text(&user.doctor_code), text(&user.license_number))
        } else {
            (String::new(), String::new())
        };
        Self {
            first_name: text(&user.first_name),
            last_name: text(&user.last_name),
            date_of_birth: user
                .date_of_birth
                .as_deref()
                .and_then(|date| date.split(['T', ' ']).next())
                .unwrap_or_default()
                .to_string(),
            gender: text(&user.gender),
            marital_status: text(&user.marital_status),
            mobile_phone: text(&user.mobile_phone),
            home_phone: text(&user.home_phone),
            fax: text(&user.fax),
            email: text(&user.email),
            line: text(&user.line),
            city: text(&user.city),
            department_id: user
                .department_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            specialization: text(&user.specialization),
            is_doctor: user.is_doctor,
            doctor_code,
            license_number,
        }
    }
}

fn present(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn matches(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}
