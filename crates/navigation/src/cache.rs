use std::sync::Arc;

use core_types::{NavigationError, RouteManifest};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

pub(crate) type ManifestResult = Result<Arc<RouteManifest>, NavigationError>;
type SharedFetch = Shared<BoxFuture<'static, ManifestResult>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStatus {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

enum RouteCache {
    Unloaded,
    Loading { generation: u64, fetch: SharedFetch },
    Loaded(Arc<RouteManifest>),
    Failed(NavigationError),
}

struct CacheInner {
    state: RouteCache,
    generation: u64,
}

pub(crate) enum Begin {
    Ready(Arc<RouteManifest>),
    Wait { generation: u64, fetch: SharedFetch },
}

// Single-flight cell around the manifest. At most one fetch is in flight;
// every caller that arrives while it runs awaits the same future.
pub(crate) struct RouteCacheCell {
    inner: Mutex<CacheInner>,
}

impl RouteCacheCell {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                state: RouteCache::Unloaded,
                generation: 0,
            }),
        }
    }

    pub(crate) fn status(&self) -> RouteStatus {
        match self.inner.lock().state {
            RouteCache::Unloaded => RouteStatus::Unloaded,
            RouteCache::Loading { .. } => RouteStatus::Loading,
            RouteCache::Loaded(_) => RouteStatus::Loaded,
            RouteCache::Failed(_) => RouteStatus::Failed,
        }
    }

    pub(crate) fn last_error(&self) -> Option<NavigationError> {
        match &self.inner.lock().state {
            RouteCache::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    pub(crate) fn begin(
        &self,
        reload: bool,
        start: impl FnOnce() -> BoxFuture<'static, ManifestResult>,
    ) -> Begin {
        let mut inner = self.inner.lock();
        match &inner.state {
            RouteCache::Loading { generation, fetch } => {
                return Begin::Wait {
                    generation: *generation,
                    fetch: fetch.clone(),
                };
            }
            RouteCache::Loaded(manifest) if !reload => return Begin::Ready(manifest.clone()),
            _ => {}
        }

        inner.generation += 1;
        let generation = inner.generation;
        let fetch = start().shared();
        inner.state = RouteCache::Loading {
            generation,
            fetch: fetch.clone(),
        };
        Begin::Wait { generation, fetch }
    }

    // Stores the outcome of fetch `generation`. Returns `true` for the one
    // caller that actually moved the state out of `Loading`.
    pub(crate) fn settle(&self, generation: u64, outcome: &ManifestResult) -> bool {
        let mut inner = self.inner.lock();
        let current = matches!(
            inner.state,
            RouteCache::Loading { generation: g, .. } if g == generation
        );
        if !current {
            return false;
        }
        inner.state = match outcome {
            Ok(manifest) => RouteCache::Loaded(manifest.clone()),
            Err(err) => RouteCache::Failed(err.clone()),
        };
        true
    }
}
