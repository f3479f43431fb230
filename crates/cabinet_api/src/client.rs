use std::time::Duration;

use core_types::{
    CurrentUser, Department, LoginResponse, PasswordChange, ProfileUpdate, Role, RoleId,
    RolePayload,
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::ApiError;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    server_url: String,
}

impl ApiClient {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self::with_client(client, server_url))
    }

    pub fn with_client(client: reqwest::Client, server_url: &str) -> Self {
        Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .request(Method::POST, "/auth/token", None)
            .form(&[("username", username), ("password", password)]);
        self.send_json(request).await
    }

    pub async fn current_user(&self, token: &str) -> Result<CurrentUser, ApiError> {
        self.send_json(self.request(Method::GET, "/auth/me", Some(token)))
            .await
    }

    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::POST, "/auth/logout", Some(token)))
            .await
    }

    pub async fn change_password(
        &self,
        token: &str,
        change: &PasswordChange,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "/auth/change-password", Some(token))
            .json(change);
        self.send_empty(request).await
    }

    pub async fn list_roles(&self, token: &str) -> Result<Vec<Role>, ApiError> {
        let roles: Vec<Role> = self
            .send_json(self.request(Method::GET, "/api/roles", Some(token)))
            .await?;
        Ok(roles.into_iter().filter(|role| !role.is_superadmin()).collect())
    }

    pub async fn create_role(&self, token: &str, payload: &RolePayload) -> Result<Role, ApiError> {
        let request = self
            .request(Method::POST, "/api/roles", Some(token))
            .json(payload);
        self.send_json(request).await
    }

    pub async fn update_role(
        &self,
        token: &str,
        id: RoleId,
        payload: &RolePayload,
    ) -> Result<Role, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/api/roles/{id}"), Some(token))
            .json(payload);
        self.send_json(request).await
    }

    pub async fn delete_role(&self, token: &str, id: RoleId) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::DELETE, &format!("/api/roles/{id}"), Some(token)))
            .await
    }

    pub async fn list_departments(&self, token: &str) -> Result<Vec<Department>, ApiError> {
        self.send_json(self.request(Method::GET, "/api/departments/", Some(token)))
            .await
    }

    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<CurrentUser, ApiError> {
        let request = self
            .request(Method::PUT, "/api/staff/me/update", Some(token))
            .json(update);
        self.send_json(request).await
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{path}", self.server_url);
        debug!(%method, %url, "api request");
        let request = self.client.request(method, url);
        match token {
            Some(token) => request.bearer_auth(token.trim()),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let text = self.send(request).await?;
        serde_json::from_str(&text).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_response(status, &text));
        }
        Ok(text)
    }
}
