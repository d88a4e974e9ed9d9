//! Router Module Index
//!
//! Client-side navigation over an in-memory history. Every `push` is checked by the
//! auth guard before the destination view is loaded.

/// Pre-navigation auth check.
pub mod guard;

/// The static route table.
pub mod routes;

/// Views and their lazy loaders.
pub mod views;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::auth::TokenValidator;
pub use guard::{GuardDecision, LOGIN_ROUTE, OPEN_PATHS, before_each};
pub use routes::{RouteMeta, RouteRecord, routes};
pub use views::{LazyView, View};

/// Redirect chains longer than this are treated as a loop.
const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("route path {0} is declared more than once")]
    DuplicatePath(String),
    #[error("route name {0} is declared more than once")]
    DuplicateName(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("no route matches {0}")]
    NotFound(String),
    #[error("no route is named {0}")]
    UnknownRouteName(String),
    #[error("navigation to {0} redirected too many times")]
    TooManyRedirects(String),
}

/// A completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Name of the route that was reached.
    pub name: &'static str,
    pub path: String,
    /// The originally requested location when the guard redirected.
    pub redirected_from: Option<String>,
    pub view: Arc<View>,
}

/// MemoryHistory
///
/// A browser-style history stack kept in memory. Pushing after going back drops the
/// forward entries.
#[derive(Debug, Default)]
struct MemoryHistory {
    entries: Vec<String>,
    position: usize,
}

impl MemoryHistory {
    fn push(&mut self, location: String) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.position + 1);
        }
        self.entries.push(location);
        self.position = self.entries.len() - 1;
    }

    fn current(&self) -> Option<&str> {
        self.entries.get(self.position).map(String::as_str)
    }

    fn back(&mut self) -> Option<&str> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        self.current()
    }

    fn forward(&mut self) -> Option<&str> {
        if self.position + 1 >= self.entries.len() {
            return None;
        }
        self.position += 1;
        self.current()
    }
}

/// Router
///
/// Holds the route table and the navigation history. The table is fixed at construction;
/// the history is the only state that changes.
#[derive(Debug)]
pub struct Router {
    routes: Vec<RouteRecord>,
    history: Mutex<MemoryHistory>,
}

impl Router {
    /// Fails if two records share a path or a name.
    pub fn new(routes: Vec<RouteRecord>) -> Result<Self, RouterError> {
        let mut paths = HashSet::new();
        let mut names = HashSet::new();
        for route in &routes {
            if !paths.insert(route.path) {
                return Err(RouterError::DuplicatePath(route.path.to_string()));
            }
            if !names.insert(route.name) {
                return Err(RouterError::DuplicateName(route.name.to_string()));
            }
        }

        Ok(Self {
            routes,
            history: Mutex::new(MemoryHistory::default()),
        })
    }

    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    pub fn resolve(&self, path: &str) -> Option<&RouteRecord> {
        self.routes.iter().find(|route| route.path == path)
    }

    pub fn resolve_name(&self, name: &str) -> Option<&RouteRecord> {
        self.routes.iter().find(|route| route.name == name)
    }

    /// Routes that carry menu metadata, in declaration order.
    pub fn menu(&self) -> impl Iterator<Item = (&RouteRecord, RouteMeta)> {
        self.routes
            .iter()
            .filter_map(|route| route.meta.map(|meta| (route, meta)))
    }

    /// push
    ///
    /// Navigates to `to`. The guard runs first with the caller's `validator`; a redirect
    /// starts a new guarded navigation to the named route. On success the view is loaded
    /// (once per route) and the location is pushed onto the history.
    pub async fn push(
        &self,
        to: &str,
        validator: &dyn TokenValidator,
    ) -> Result<Navigation, NavigationError> {
        let mut target = to.to_string();
        let mut redirected_from = None;

        for _ in 0..=MAX_REDIRECTS {
            let path = location_path(&target).to_string();

            match guard::before_each(&path, validator).await {
                GuardDecision::Proceed => {
                    let route = self
                        .resolve(&path)
                        .ok_or_else(|| NavigationError::NotFound(path.clone()))?;
                    let view = route.component.load();
                    self.history().push(target);

                    tracing::debug!(route = route.name, path = %path, "navigated");
                    return Ok(Navigation {
                        name: route.name,
                        path,
                        redirected_from,
                        view,
                    });
                }
                GuardDecision::Redirect { name } => {
                    let route = self
                        .resolve_name(name)
                        .ok_or_else(|| NavigationError::UnknownRouteName(name.to_string()))?;
                    redirected_from.get_or_insert_with(|| to.to_string());
                    target = route.path.to_string();
                }
            }
        }

        Err(NavigationError::TooManyRedirects(to.to_string()))
    }

    /// The location currently shown, if any navigation has happened.
    pub fn current(&self) -> Option<String> {
        self.history().current().map(str::to_string)
    }

    /// Steps back through the history without re-running the guard.
    pub fn back(&self) -> Option<String> {
        self.history().back().map(str::to_string)
    }

    pub fn forward(&self) -> Option<String> {
        self.history().forward().map(str::to_string)
    }

    fn history(&self) -> MutexGuard<'_, MemoryHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// create_router
///
/// Builds the application router over the default route table.
pub fn create_router() -> Result<Router, RouterError> {
    Router::new(routes::routes())
}

/// Drops the query string and fragment from a location.
fn location_path(location: &str) -> &str {
    location
        .split(['?', '#'])
        .next()
        .unwrap_or(location)
}
