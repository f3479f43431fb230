mod cache;
pub mod host;
pub mod http;
pub mod path;
mod render;

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use core_types::{
    BreadcrumbItem, CategoryKey, NavCategory, NavPage, NavigationBackend, NavigationError,
    NavigationMode, PageEntry, PageHost, PageInfo, RouteCategory, RouteManifest,
};
use futures::FutureExt;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use cache::{Begin, ManifestResult, RouteCacheCell};
pub use cache::RouteStatus;
pub use host::MemoryHost;
pub use http::HttpNavigationBackend;
pub use path::{normalize_route, route_from_pathname};
pub use render::{NavLink, NavLinkOptions, breadcrumb_markup, navigation_markup};

#[derive(Debug, Clone)]
pub struct NavigationSettings {
    pub base_path: String,
    pub title_suffix: String,
    pub link_mode: NavigationMode,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            base_path: "/app".to_string(),
            title_suffix: "Cabinet Management".to_string(),
            link_mode: NavigationMode::Hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    LinkClicked { route: Option<String> },
    PopState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Ignored,
    Intercepted { url: String },
    Resynced { route: String },
}

pub struct NavigationHelper {
    settings: NavigationSettings,
    backend: Arc<dyn NavigationBackend>,
    host: Arc<dyn PageHost>,
    current_route: RwLock<String>,
    routes: RouteCacheCell,
    listening: AtomicBool,
}

impl NavigationHelper {
    pub fn new(
        mut settings: NavigationSettings,
        backend: Arc<dyn NavigationBackend>,
        host: Arc<dyn PageHost>,
    ) -> Self {
        settings.base_path = settings.base_path.trim_end_matches('/').to_string();
        let current = route_from_pathname(&host.pathname(), &settings.base_path);
        Self {
            settings,
            backend,
            host,
            current_route: RwLock::new(current),
            routes: RouteCacheCell::new(),
            listening: AtomicBool::new(false),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.settings.base_path
    }

    pub fn current_route(&self) -> String {
        self.current_route.read().clone()
    }

    pub fn route_state(&self) -> RouteStatus {
        self.routes.status()
    }

    pub fn last_route_error(&self) -> Option<NavigationError> {
        self.routes.last_error()
    }

    // Fetches the manifest again and overwrites the cache with the
    // outcome, failures included. Joins a fetch that is already running.
    pub async fn load_routes(&self) -> Result<Arc<RouteManifest>, NavigationError> {
        self.resolve_manifest(true).await
    }

    pub async fn manifest(&self) -> Result<Arc<RouteManifest>, NavigationError> {
        self.resolve_manifest(false).await
    }

    async fn resolve_manifest(&self, reload: bool) -> ManifestResult {
        let backend = self.backend.clone();
        let begin = self.routes.begin(reload, move || {
            async move { backend.fetch_manifest().await.map(Arc::new) }.boxed()
        });

        let (generation, fetch) = match begin {
            Begin::Ready(manifest) => return Ok(manifest),
            Begin::Wait { generation, fetch } => (generation, fetch),
        };

        let outcome = fetch.await;
        if self.routes.settle(generation, &outcome) {
            match &outcome {
                Ok(manifest) => info!(
                    routes = manifest.all_routes.len(),
                    categories = manifest.categories.len(),
                    "route manifest loaded"
                ),
                Err(err) => warn!(error = %err, "failed to load routes"),
            }
        }
        outcome
    }

    pub async fn all_routes(&self) -> Vec<PageEntry> {
        self.manifest()
            .await
            .map(|manifest| manifest.all_routes.clone())
            .unwrap_or_default()
    }

    pub async fn routes_by_category(&self) -> IndexMap<CategoryKey, RouteCategory> {
        self.manifest()
            .await
            .map(|manifest| manifest.categories.clone())
            .unwrap_or_default()
    }

    pub fn navigate_to(&self, route: &str) -> String {
        let url = self.route_url(route);
        debug!(%url, "hard navigation");
        self.host.assign(&url);
        url
    }

    // Full navigation with query parameters. A key given twice keeps its
    // last value at its first position.
    pub fn navigate_to_with_params<K, V>(
        &self,
        route: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<String, NavigationError>
    where
        K: Into<String>,
        V: Display,
    {
        let mut query = IndexMap::<String, String>::new();
        for (key, value) in params {
            query.insert(key.into(), value.to_string());
        }

        let origin = self.host.origin();
        let mut url = Url::parse(&origin)
            .and_then(|origin| origin.join(&self.route_url(route)))
            .map_err(|err| NavigationError::InvalidUrl(format!("{origin}: {err}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        let url = url.to_string();
        debug!(%url, "hard navigation with params");
        self.host.assign(&url);
        Ok(url)
    }

    pub async fn navigate(&self, route: &str, mode: NavigationMode) -> String {
        match mode {
            NavigationMode::Hard => self.navigate_to(route),
            NavigationMode::Soft => {
                let route = normalize_route(route);
                let url = self.route_url(&route);
                debug!(%url, "soft navigation");
                self.host.push_state(&url);
                *self.current_route.write() = route;
                self.update_page_title().await;
                url
            }
        }
    }

    pub async fn page_info(&self, route: &str) -> Result<PageInfo, NavigationError> {
        let route = normalize_route(route);
        self.backend
            .fetch_page_info(&route)
            .await
            .inspect_err(|err| warn!(%route, error = %err, "failed to get page info"))
    }

    pub async fn breadcrumb(&self, route: Option<&str>) -> Vec<BreadcrumbItem> {
        let route = route
            .map(normalize_route)
            .unwrap_or_else(|| self.current_route());
        let mut trail = vec![BreadcrumbItem::home()];
        if let Ok(info) = self.page_info(&route).await {
            trail.push(BreadcrumbItem {
                title: info.title,
                route,
                active: true,
            });
        }
        trail
    }

    pub async fn navigation_menu(&self) -> Vec<NavCategory> {
        let categories = self.routes_by_category().await;
        let current = self.current_route();
        categories
            .into_iter()
            .map(|(key, category)| NavCategory {
                name: category.name,
                key,
                pages: category
                    .pages
                    .into_iter()
                    .map(|page| NavPage {
                        is_active: page.route == current,
                        title: page.title,
                        route: page.route,
                        description: page.description,
                    })
                    .collect(),
            })
            .collect()
    }

    pub async fn route_exists(&self, route: &str) -> bool {
        self.all_routes().await.iter().any(|entry| entry.route == route)
    }

    pub async fn routes_for_category(
        &self,
        category: &str,
    ) -> Result<RouteCategory, NavigationError> {
        self.backend
            .fetch_category(category)
            .await
            .inspect_err(|err| warn!(%category, error = %err, "failed to get category routes"))
    }

    pub async fn update_page_title(&self) -> bool {
        let route = self.current_route();
        match self.page_info(&route).await {
            Ok(info) => {
                self.host
                    .set_title(&format!("{} - {}", info.title, self.settings.title_suffix));
                true
            }
            Err(_) => false,
        }
    }

    pub async fn init(&self) {
        // Failure is already logged and leaves the cache in `Failed`.
        let _ = self.load_routes().await;
        self.update_page_title().await;
        self.add_navigation_listeners();
    }

    pub fn add_navigation_listeners(&self) {
        if !self.listening.swap(true, Ordering::SeqCst) {
            debug!("navigation listeners installed");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub async fn handle_event(&self, event: NavEvent) -> EventOutcome {
        if !self.is_listening() {
            return EventOutcome::Ignored;
        }
        match event {
            NavEvent::LinkClicked { route: Some(route) } => {
                let url = self.navigate(&route, self.settings.link_mode).await;
                EventOutcome::Intercepted { url }
            }
            NavEvent::LinkClicked { route: None } => EventOutcome::Ignored,
            NavEvent::PopState => {
                let route = route_from_pathname(&self.host.pathname(), &self.settings.base_path);
                *self.current_route.write() = route.clone();
                self.update_page_title().await;
                EventOutcome::Resynced { route }
            }
        }
    }

    pub fn create_nav_link(&self, route: &str, title: &str, options: NavLinkOptions) -> NavLink {
        NavLink {
            href: format!("{}{route}", self.settings.base_path),
            text: title.to_string(),
            data_route: route.to_string(),
            class_name: options.class_name,
            active: options.active && route == self.current_route(),
        }
    }

    pub async fn breadcrumb_html(&self) -> String {
        let trail = self.breadcrumb(None).await;
        breadcrumb_markup(&self.settings.base_path, &trail).into_string()
    }

    pub async fn navigation_html(&self) -> String {
        let menu = self.navigation_menu().await;
        navigation_markup(&self.settings.base_path, &menu).into_string()
    }

    fn route_url(&self, route: &str) -> String {
        format!("{}{}", self.settings.base_path, normalize_route(route))
    }
}
