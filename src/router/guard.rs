use crate::auth::TokenValidator;

/// Name of the route unauthenticated navigations are sent to.
pub const LOGIN_ROUTE: &str = "Login";

/// Paths that never require a token.
pub const OPEN_PATHS: [&str; 2] = ["/login", "/register"];

/// Outcome of the pre-navigation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect { name: &'static str },
}

/// before_each
///
/// Runs before every navigation to `to`.
/// Login and registration always proceed. Anything else proceeds only with a valid
/// token; otherwise the navigation is redirected to the `Login` route. A validator that
/// fails is treated like an invalid token.
pub async fn before_each(to: &str, validator: &dyn TokenValidator) -> GuardDecision {
    if OPEN_PATHS.contains(&to) {
        return GuardDecision::Proceed;
    }

    match validator.is_token_valid().await {
        Ok(true) => GuardDecision::Proceed,
        Ok(false) => {
            tracing::debug!(to, "no valid token, redirecting to login");
            GuardDecision::Redirect { name: LOGIN_ROUTE }
        }
        Err(e) => {
            tracing::warn!(to, error = %e, "token check failed, redirecting to login");
            GuardDecision::Redirect { name: LOGIN_ROUTE }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        valid: bool,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(valid: bool) -> Self {
            Self {
                valid,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TokenValidator for Fixed {
        async fn is_token_valid(&self) -> Result<bool, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.valid)
        }
    }

    struct Broken;

    #[async_trait]
    impl TokenValidator for Broken {
        async fn is_token_valid(&self) -> Result<bool, AuthError> {
            Err(AuthError::Storage {
                path: "/nonexistent/token".into(),
                source: std::io::Error::other("disk on fire"),
            })
        }
    }

    #[tokio::test]
    async fn open_paths_skip_the_token_check() {
        let validator = Fixed::new(false);
        for path in OPEN_PATHS {
            assert_eq!(before_each(path, &validator).await, GuardDecision::Proceed);
        }
        assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_token_redirects_to_login() {
        let decision = before_each("/user", &Fixed::new(false)).await;
        assert_eq!(decision, GuardDecision::Redirect { name: "Login" });
    }

    #[tokio::test]
    async fn valid_token_proceeds() {
        assert_eq!(
            before_each("/borrow", &Fixed::new(true)).await,
            GuardDecision::Proceed
        );
    }

    #[tokio::test]
    async fn failing_check_fails_closed() {
        assert_eq!(
            before_each("/", &Broken).await,
            GuardDecision::Redirect { name: LOGIN_ROUTE }
        );
    }

    #[tokio::test]
    async fn evaluates_fresh_every_time() {
        let validator = Fixed::new(true);
        before_each("/user", &validator).await;
        before_each("/user", &validator).await;
        assert_eq!(validator.calls.load(Ordering::SeqCst), 2);
    }
}
