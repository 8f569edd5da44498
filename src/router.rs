//! URL routes and the navigation state machine.
//!
//! ARCHITECTURE
//! ============
//! Four view-states: `home`, `posts/{id}`, `login`, `register`. Anything
//! else falls back to `home`. Entering a state first runs its pre-load
//! (post list, single post, login check); the router only moves once the
//! pre-load has succeeded, so a failed fetch leaves it where it was.

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;

use std::fmt;

use crate::error::NavigationError;
use crate::pages::auth::{AuthMode, AuthPage};
use crate::pages::home::HomePage;
use crate::pages::post::PostPage;
use crate::state::Session;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Post(String),
    Login,
    Register,
}

impl Route {
    /// Parse a URL path. Unknown paths resolve to [`Route::Home`].
    ///
    /// Accepts `/home`, `home`, `#/home`, `/#/home`, trailing slashes and
    /// query strings. A `#/...` fragment is the route; any other fragment
    /// is dropped.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = match path.split_once('#') {
            Some((before, fragment)) if fragment.starts_with('/') || before.trim_matches('/').is_empty() => fragment,
            Some((before, _)) => before,
            None => path,
        };
        let path = path.split('?').next().unwrap_or_default().trim_matches('/');
        let mut segments = path.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some("posts"), Some(id), None) if !id.is_empty() => Self::Post(id.to_owned()),
            (Some("login"), None, None) => Self::Login,
            (Some("register"), None, None) => Self::Register,
            _ => Self::Home,
        }
    }

    /// Canonical URL path.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/home".to_owned(),
            Self::Post(id) => format!("/posts/{id}"),
            Self::Login => "/login".to_owned(),
            Self::Register => "/register".to_owned(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// A view that finished its pre-load and is ready to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    Home(HomePage),
    Post(PostPage),
    Login(AuthPage),
    Register(AuthPage),
}

impl View {
    #[must_use]
    pub fn route(&self) -> Route {
        match self {
            Self::Home(_) => Route::Home,
            Self::Post(page) => Route::Post(page.post.id.clone()),
            Self::Login(_) => Route::Login,
            Self::Register(_) => Route::Register,
        }
    }

    #[must_use]
    pub fn render(&self, session: &Session) -> String {
        match self {
            Self::Home(page) => page.render(session),
            Self::Post(page) => page.render(session),
            Self::Login(page) | Self::Register(page) => page.render(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Router {
    current: Option<Route>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route of the last completed transition.
    #[must_use]
    pub fn current(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    /// Navigate to a URL path.
    ///
    /// # Errors
    ///
    /// See [`Router::go`].
    pub async fn go_to_path(&mut self, session: &mut Session, path: &str) -> Result<View, NavigationError> {
        self.go(session, Route::parse(path)).await
    }

    /// Enter `route`, running its pre-load first.
    ///
    /// `login` and `register` redirect to `home` for a logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` when the pre-load fails; the current route
    /// is left unchanged.
    pub async fn go(&mut self, session: &mut Session, route: Route) -> Result<View, NavigationError> {
        let target = if matches!(route, Route::Login | Route::Register) && session.auth.is_logged_in()? {
            tracing::debug!(requested = %route, "already logged in; redirecting home");
            Route::Home
        } else {
            route
        };

        match target {
            Route::Home => self.home(session).await.map(View::Home),
            Route::Post(id) => self.post(session, &id).await.map(View::Post),
            Route::Login => {
                self.arrive(Route::Login);
                Ok(View::Login(AuthPage::new(AuthMode::Login)))
            }
            Route::Register => {
                self.arrive(Route::Register);
                Ok(View::Register(AuthPage::new(AuthMode::Register)))
            }
        }
    }

    /// Enter `home` after loading the post list.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Posts` if the list cannot be fetched.
    pub async fn home(&mut self, session: &mut Session) -> Result<HomePage, NavigationError> {
        session.posts.get_all().await?;
        self.arrive(Route::Home);
        Ok(HomePage::default())
    }

    /// Enter `posts/{id}` after fetching the post.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Posts` if the post cannot be fetched.
    pub async fn post(&mut self, session: &Session, id: &str) -> Result<PostPage, NavigationError> {
        let post = session.posts.get(id).await?;
        self.arrive(Route::Post(id.to_owned()));
        Ok(PostPage::new(post))
    }

    fn arrive(&mut self, route: Route) {
        tracing::debug!(from = ?self.current, to = %route, "navigated");
        self.current = Some(route);
    }
}
