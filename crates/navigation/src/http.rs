use std::time::Duration;

use async_trait::async_trait;
use core_types::{NavigationBackend, NavigationError, PageInfo, RouteCategory, RouteManifest};
use serde::de::DeserializeOwned;
use tracing::debug;

pub struct HttpNavigationBackend {
    client: reqwest::Client,
    root: String,
}

impl HttpNavigationBackend {
    pub fn new(
        server_url: &str,
        base_path: &str,
        timeout: Duration,
    ) -> Result<Self, NavigationError> {
        let root = join_root(server_url, base_path);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NavigationError::Transport {
                url: root.clone(),
                message: err.to_string(),
            })?;
        Ok(Self { client, root })
    }

    pub fn with_client(client: reqwest::Client, server_url: &str, base_path: &str) -> Self {
        Self {
            client,
            root: join_root(server_url, base_path),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NavigationError> {
        let url = format!("{}{path}", self.root);
        debug!(%url, "navigation request");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| NavigationError::Transport {
                url: url.clone(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NavigationError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|err| NavigationError::Transport {
                url: url.clone(),
                message: err.to_string(),
            })?;
        serde_json::from_str(&text).map_err(|err| NavigationError::Decode {
            url,
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl NavigationBackend for HttpNavigationBackend {
    async fn fetch_manifest(&self) -> Result<RouteManifest, NavigationError> {
        self.get_json("/routes").await
    }

    async fn fetch_page_info(&self, route: &str) -> Result<PageInfo, NavigationError> {
        self.get_json(&format!("/page-info{route}")).await
    }

    async fn fetch_category(&self, category: &str) -> Result<RouteCategory, NavigationError> {
        self.get_json(&format!("/routes/{category}")).await
    }
}

fn join_root(server_url: &str, base_path: &str) -> String {
    format!(
        "{}{}",
        server_url.trim_end_matches('/'),
        base_path.trim_end_matches('/')
    )
}
