use super::views::{self, LazyView, ViewFactory};

/// Title and icon shown for a route in the navigation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
    pub title: &'static str,
    pub icon: &'static str,
}

/// RouteRecord
///
/// Maps a path to a named, lazily loaded view. Routes without `meta` (login, register)
/// stay out of the navigation menu.
#[derive(Debug)]
pub struct RouteRecord {
    pub path: &'static str,
    pub name: &'static str,
    pub component: LazyView,
    pub meta: Option<RouteMeta>,
}

impl RouteRecord {
    pub const fn new(path: &'static str, name: &'static str, factory: ViewFactory) -> Self {
        Self {
            path,
            name,
            component: LazyView::new(factory),
            meta: None,
        }
    }

    pub fn with_meta(mut self, title: &'static str, icon: &'static str) -> Self {
        self.meta = Some(RouteMeta { title, icon });
        self
    }
}

/// routes
///
/// The application's route table, in declaration order.
pub fn routes() -> Vec<RouteRecord> {
    vec![
        // Landing page after login.
        RouteRecord::new("/", "Home", views::home).with_meta("首页", "HomeFilled"),
        // Login and registration are reachable without a token (see guard).
        RouteRecord::new("/login", "Login", views::login),
        RouteRecord::new("/register", "Register", views::register),
        // User administration.
        RouteRecord::new("/user", "User", views::user).with_meta("用户管理", "User"),
        // Archive browsing and lending.
        RouteRecord::new("/borrow", "Borrow", views::borrow).with_meta("文献借阅", "Reading"),
    ]
}
