//! Navigation guard.
//!
//! Views are addressed by path (`/files`, `/analysis/7?tab=trend`). Before a
//! transition the guard looks the path up in the [`RouteTable`] and decides,
//! from the route's metadata and the current authentication state alone,
//! whether to proceed or redirect:
//!
//! - signed in and heading for `/login` or `/register`: redirect home,
//! - signed out and heading for a protected view: redirect to `/login`,
//!   carrying the intended destination in the `redirect` query parameter,
//! - otherwise proceed.
//!
//! [`evaluate`] is the pure decision. [`Navigator`] applies it, follows the
//! redirects, tracks the current location and title, and reacts to
//! [`ClientEvent::Unauthorized`] by sending the user to the login view.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::client::{ClientEvent, ClientListener};
use crate::session::SessionState;

/// Application name used in every window title.
pub const APP_TITLE: &str = "Log Situational Awareness";

/// Path of the login view.
pub const LOGIN_PATH: &str = "/login";

/// Path of the registration view.
pub const REGISTER_PATH: &str = "/register";

/// Path of the home view.
pub const HOME_PATH: &str = "/";

/// Query parameter carrying the intended destination through a login.
pub const REDIRECT_PARAM: &str = "redirect";

/// Upper bound on redirects followed for a single navigation.
const MAX_REDIRECTS: usize = 4;

/// Route metadata consulted by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    /// Human-readable view title.
    pub title: Option<String>,
    /// Whether the view needs a signed-in user.
    pub requires_auth: bool,
}

impl RouteMeta {
    /// A view anyone may open.
    pub fn public(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            requires_auth: false,
        }
    }

    /// A view that needs a signed-in user.
    pub fn protected(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            requires_auth: true,
        }
    }
}

/// One entry in the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Route name.
    pub name: String,
    /// Path pattern; segments starting with `:` capture a parameter.
    pub pattern: String,
    /// Guard metadata.
    pub meta: RouteMeta,
}

impl Route {
    /// Create a route.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, meta: RouteMeta) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            meta,
        }
    }

    fn capture(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let pattern: Vec<&str> = segments(&self.pattern).collect();
        let actual: Vec<&str> = segments(path).collect();
        if pattern.len() != actual.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (want, got) in pattern.iter().zip(&actual) {
            if let Some(name) = want.strip_prefix(':') {
                params.insert(name.to_string(), (*got).to_string());
            } else if want != got {
                return None;
            }
        }
        Some(params)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// A route matched against a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The matching route.
    pub route: &'a Route,
    /// Captured path parameters.
    pub params: BTreeMap<String, String>,
}

/// Ordered set of routes plus the path unknown locations fall back to.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    fallback: String,
}

impl RouteTable {
    /// Empty table falling back to `fallback`.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            routes: Vec::new(),
            fallback: fallback.into(),
        }
    }

    /// Append a route. Earlier routes win.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// The console's views.
    #[must_use]
    pub fn console() -> Self {
        Self::new(HOME_PATH)
            .route(Route::new("home", HOME_PATH, RouteMeta::protected("Home")))
            .route(Route::new("login", LOGIN_PATH, RouteMeta::public("Sign In")))
            .route(Route::new("register", REGISTER_PATH, RouteMeta::public("Register")))
            .route(Route::new("upload", "/upload", RouteMeta::protected("Upload Logs")))
            .route(Route::new("files", "/files", RouteMeta::protected("Log Files")))
            .route(Route::new("analysis", "/analysis/:id", RouteMeta::protected("Log Analysis")))
            .route(Route::new(
                "dashboard",
                "/dashboard",
                RouteMeta::protected("Situational Awareness"),
            ))
            .route(Route::new("profile", "/profile", RouteMeta::protected("Profile")))
    }

    /// All routes in match order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Where unknown paths are sent.
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Find the first route matching `path`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route
                .capture(path)
                .map(|params| RouteMatch { route, params })
        })
    }
}

/// A path plus query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Absolute path, always starting with `/`.
    pub path: String,
    /// Decoded query pairs in order.
    pub query: Vec<(String, String)>,
}

impl Location {
    /// Parse `path?query`. A missing leading slash is added.
    #[must_use]
    pub fn parse(target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let query = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { path, query }
    }

    /// A bare path.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Add a query pair.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// First value of query parameter `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path plus encoded query string.
    #[must_use]
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        format!("{}?{query}", self.path)
    }

    fn is_auth_view(&self) -> bool {
        self.path == LOGIN_PATH || self.path == REGISTER_PATH
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

/// Outcome of the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Continue to the requested location.
    Proceed,
    /// Go somewhere else instead.
    Redirect(Location),
}

/// Decide a transition to `target`, whose route carries `meta`.
#[must_use]
pub fn evaluate(target: &Location, meta: &RouteMeta, authenticated: bool) -> GuardDecision {
    if authenticated && target.is_auth_view() {
        return GuardDecision::Redirect(Location::path(HOME_PATH));
    }
    if meta.requires_auth && !authenticated {
        return GuardDecision::Redirect(
            Location::path(LOGIN_PATH).with_query(REDIRECT_PARAM, target.full_path()),
        );
    }
    GuardDecision::Proceed
}

/// Window title for a view.
#[must_use]
pub fn document_title(meta: Option<&RouteMeta>) -> String {
    match meta.and_then(|m| m.title.as_deref()) {
        Some(title) => format!("{title} - {APP_TITLE}"),
        None => APP_TITLE.to_string(),
    }
}

/// Navigation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// Redirects kept bouncing between views.
    #[error("navigation to {target} did not settle after {hops} redirects")]
    RedirectLoop {
        /// The originally requested location.
        target: String,
        /// Redirects followed before giving up.
        hops: usize,
    },
}

/// Where the navigator currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    /// Current location.
    pub location: Location,
    /// Name of the matched route.
    pub route: Option<String>,
    /// Captured path parameters.
    pub params: BTreeMap<String, String>,
    /// Window title.
    pub title: String,
}

/// Applies the guard to every transition and tracks the current view.
pub struct Navigator {
    table: RouteTable,
    session: Arc<SessionState>,
    current: RwLock<NavigationState>,
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("current", &*self.current.read())
            .finish_non_exhaustive()
    }
}

impl Navigator {
    /// Start at the root with nothing rendered yet.
    pub fn new(table: RouteTable, session: Arc<SessionState>) -> Self {
        Self {
            table,
            session,
            current: RwLock::new(NavigationState {
                location: Location::path(HOME_PATH),
                route: None,
                params: BTreeMap::new(),
                title: APP_TITLE.to_string(),
            }),
        }
    }

    /// The route table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Snapshot of the current view.
    #[must_use]
    pub fn current(&self) -> NavigationState {
        self.current.read().clone()
    }

    /// Work out where a transition to `target` would land, without moving.
    pub fn resolve(&self, target: &str) -> Result<NavigationState, NavigationError> {
        let authenticated = self.session.is_authenticated();
        let mut location = Location::parse(target);

        for _ in 0..=MAX_REDIRECTS {
            let Some(matched) = self.table.resolve(&location.path) else {
                debug!(path = %location.path, "unknown path, falling back");
                location = Location::path(self.table.fallback());
                continue;
            };

            match evaluate(&location, &matched.route.meta, authenticated) {
                GuardDecision::Proceed => {
                    return Ok(NavigationState {
                        title: document_title(Some(&matched.route.meta)),
                        route: Some(matched.route.name.clone()),
                        params: matched.params,
                        location,
                    });
                }
                GuardDecision::Redirect(next) => {
                    debug!(from = %location, to = %next, "guard redirect");
                    location = next;
                }
            }
        }

        Err(NavigationError::RedirectLoop {
            target: target.to_string(),
            hops: MAX_REDIRECTS,
        })
    }

    /// Move to `target`, following guard redirects. Returns the view that
    /// was actually entered.
    pub fn navigate(&self, target: &str) -> Result<NavigationState, NavigationError> {
        let state = self.resolve(target)?;
        info!(to = %state.location, title = %state.title, "navigated");
        *self.current.write() = state.clone();
        Ok(state)
    }

    /// After a successful sign-in, continue to the destination remembered
    /// in the current location's `redirect` parameter, or home.
    pub fn resume(&self) -> Result<NavigationState, NavigationError> {
        let target = self
            .current
            .read()
            .location
            .query_value(REDIRECT_PARAM)
            .map_or_else(|| HOME_PATH.to_string(), str::to_string);
        self.navigate(&target)
    }
}

impl ClientListener for Navigator {
    fn on_event(&self, event: &ClientEvent) {
        match event {
            ClientEvent::Unauthorized { .. } => {
                if self.current.read().location.path == LOGIN_PATH {
                    return;
                }
                if let Err(e) = self.navigate(LOGIN_PATH) {
                    warn!(error = %e, "cannot move to login after unauthorized response");
                }
            }
        }
    }
}
