use std::sync::{Arc, OnceLock};

/// View
///
/// A page the router can display. `module` names the view's source module so the
/// front end knows what to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub name: &'static str,
    pub module: &'static str,
}

pub type ViewFactory = fn() -> View;

/// LazyView
///
/// Defers building a view until the first navigation that needs it, then hands out the
/// cached instance.
#[derive(Debug)]
pub struct LazyView {
    factory: ViewFactory,
    loaded: OnceLock<Arc<View>>,
}

impl LazyView {
    pub const fn new(factory: ViewFactory) -> Self {
        Self {
            factory,
            loaded: OnceLock::new(),
        }
    }

    pub fn load(&self) -> Arc<View> {
        self.loaded
            .get_or_init(|| {
                let view = (self.factory)();
                tracing::debug!(view = view.name, module = view.module, "view loaded");
                Arc::new(view)
            })
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }
}

// --- Application Views ---

pub fn home() -> View {
    View {
        name: "Home",
        module: "views/Home",
    }
}

pub fn login() -> View {
    View {
        name: "Login",
        module: "views/Login",
    }
}

pub fn register() -> View {
    View {
        name: "Register",
        module: "views/Register",
    }
}

pub fn user() -> View {
    View {
        name: "User",
        module: "views/User",
    }
}

pub fn borrow() -> View {
    View {
        name: "Borrow",
        module: "views/borrow/Borrow",
    }
}
