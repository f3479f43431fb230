use cabinet_api::{PasswordForm, ProfileForm, RoleForm};
use core_types::{Department, Role, RoleId};
use tracing::{debug, info, warn};

use crate::{Alert, LOGIN_ROUTE, PageController, PageResult, Rejection};

impl PageController {
    pub async fn load_roles(&self) -> PageResult<Vec<Role>> {
        let token = self.require_token()?;
        match self.api.list_roles(&token).await {
            Ok(roles) => {
                *self.roles.write() = roles.clone();
                Ok(roles)
            }
            Err(err) => {
                warn!(error = %err, "failed to load roles");
                self.roles.write().clear();
                Err(self.api_failure(err, "role.load_failed"))
            }
        }
    }

    pub fn cached_roles(&self) -> Vec<Role> {
        self.roles.read().clone()
    }

    pub async fn create_role(&self, form: &RoleForm) -> PageResult<Alert> {
        let payload = form
            .validate(&self.cached_roles(), None)
            .map_err(|errors| self.invalid(&errors))?;
        let token = self.require_token()?;

        match self.api.create_role(&token, &payload).await {
            Ok(role) => {
                info!(role = %role.name, "role created");
                self.reload_roles().await;
                Ok(Alert::success(self.i18n.t("role.created")))
            }
            Err(err) => Err(self.api_failure(err, "role.create_failed")),
        }
    }

    pub async fn update_role(&self, id: RoleId, form: &RoleForm) -> PageResult<Alert> {
        let payload = form
            .validate(&self.cached_roles(), Some(id))
            .map_err(|errors| self.invalid(&errors))?;
        let token = self.require_token()?;

        match self.api.update_role(&token, id, &payload).await {
            Ok(_) => {
                info!(id, "role updated");
                self.reload_roles().await;
                Ok(Alert::success(self.i18n.t("role.updated")))
            }
            Err(err) => Err(self.api_failure(err, "role.update_failed")),
        }
    }

    pub async fn delete_role(&self, id: RoleId) -> PageResult<Alert> {
        let token = self.require_token()?;
        match self.api.delete_role(&token, id).await {
            Ok(()) => {
                info!(id, "role deleted");
                self.reload_roles().await;
                Ok(Alert::success(self.i18n.t("role.deleted")))
            }
            Err(err) => Err(self.api_failure(err, "role.delete_failed")),
        }
    }

    // A failed refresh after a successful write keeps the write's alert.
    async fn reload_roles(&self) {
        if let Err(rejection) = self.load_roles().await {
            warn!(%rejection, "role list refresh failed");
        }
    }

    pub async fn load_departments(&self) -> PageResult<Vec<Department>> {
        let token = self.require_token()?;
        self.api.list_departments(&token).await.map_err(|err| {
            warn!(error = %err, "failed to load departments");
            self.api_failure(err, "department.load_failed")
        })
    }

    pub async fn department_options_html(&self) -> PageResult<String> {
        let departments = self.load_departments().await?;
        Ok(crate::department_options_html(
            self.i18n.t("department.placeholder"),
            &departments,
        ))
    }

    pub async fn load_profile(&self) -> PageResult<(ProfileForm, Vec<Department>)> {
        let token = match self.session.access_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.navigation.navigate_to(LOGIN_ROUTE);
                return Err(Rejection::Alert(Alert::error(
                    self.i18n.t("profile.view_login_required"),
                )));
            }
            Err(err) => return Err(self.storage_failure(err)),
        };

        // Without departments the select keeps only its placeholder.
        let departments = match self.api.list_departments(&token).await {
            Ok(departments) => departments,
            Err(err) => {
                warn!(error = %err, "failed to load departments");
                Vec::new()
            }
        };

        match self.api.current_user(&token).await {
            Ok(user) => {
                debug!(departments = departments.len(), "profile loaded");
                Ok((ProfileForm::from(&user), departments))
            }
            Err(err) if err.is_unauthorized() => Err(self.api_failure(err, "profile.load_failed")),
            Err(err) => {
                warn!(error = %err, "failed to load profile");
                let key = if err.is_unreachable() {
                    "profile.load_unreachable"
                } else {
                    "profile.load_failed"
                };
                Err(Rejection::Alert(Alert::error(self.i18n.t(key))))
            }
        }
    }

    pub async fn save_profile(&self, form: &ProfileForm) -> PageResult<Alert> {
        let token = match self.session.access_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                return Err(Rejection::Alert(Alert::error(
                    self.i18n.t("profile.login_required"),
                )));
            }
            Err(err) => return Err(self.storage_failure(err)),
        };
        let update = form.validate().map_err(|errors| self.invalid(&errors))?;

        let user = match self.api.update_profile(&token, &update).await {
            Ok(user) => user,
            Err(err) if err.is_unauthorized() => return Err(self.api_failure(err, "profile.update_failed")),
            Err(err) => {
                warn!(error = %err, "failed to update profile");
                return Err(Rejection::Alert(Alert::error(self.profile_failure(&err))));
            }
        };

        self.session
            .remember_profile(&user)
            .map_err(|err| self.storage_failure(err))?;
        info!("profile updated");
        Ok(Alert::success(self.i18n.t("profile.updated")))
    }

    fn profile_failure(&self, err: &cabinet_api::ApiError) -> String {
        let reason = if err.is_unreachable() {
            self.i18n.t("profile.unreachable").to_string()
        } else {
            match err.detail() {
                Some(detail) if detail.contains("Email already exists") => {
                    self.i18n.t("profile.email_taken").to_string()
                }
                Some(detail) => detail.to_string(),
                None => self.i18n.t("login.retry").to_string(),
            }
        };
        format!("{} {reason}", self.i18n.t("profile.update_failed"))
    }

    // A successful change drops the token; the user signs in again.
    pub async fn change_password(&self, form: &PasswordForm) -> PageResult<Alert> {
        let change = form.validate().map_err(|errors| self.invalid(&errors))?;
        let token = self.require_token()?;

        match self.api.change_password(&token, &change).await {
            Ok(()) => {
                info!("password changed");
                if let Err(err) = self.session.clear_access_token() {
                    return Err(self.storage_failure(err));
                }
                self.navigation.navigate_to(LOGIN_ROUTE);
                Ok(Alert::success(self.i18n.t("password.changed")))
            }
            Err(err) => Err(self.api_failure(err, "password.change_failed")),
        }
    }
}
