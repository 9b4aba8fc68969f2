//! The routing table.
//!
//! A [`Router`] owns every [`Route`] and the global middleware stack. It is filled in
//! during registration and finalized exactly once, which installs a dispatch handler per
//! route into a [`PathMux`]. After that the router is read only: registration attempts
//! fail with [`RouteError::Finalized`].

use crate::error::RouteError;
use crate::middleware::{BoxMiddleware, GlobalStack};
use crate::route::Route;
use lightmux_http::handler::BoxHandler;
use lightmux_http::mux::PathMux;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct Router {
    routes: BTreeMap<String, Route>,
    global: GlobalStack,
    finalized: bool,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the route for `path` with `middleware`, outermost first.
    ///
    /// Fails if `path` is already registered, leaving the existing route untouched.
    pub fn route<I>(&mut self, path: impl Into<String>, middleware: I) -> Result<&mut Route, RouteError>
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        if self.finalized {
            return Err(RouteError::Finalized { operation: "create route" });
        }

        match self.routes.entry(path.into()) {
            Entry::Occupied(entry) => Err(RouteError::duplicate_path(entry.key())),
            Entry::Vacant(entry) => {
                debug!(path = %entry.key(), "create route");
                let route = Route::new(entry.key().clone(), middleware.into_iter().collect());
                Ok(entry.insert(route))
            }
        }
    }

    /// Appends `middleware` to the global stack, which wraps every request this router
    /// sees, including the ones no route matches.
    pub fn use_global<I>(&mut self, middleware: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        if self.finalized {
            return Err(RouteError::Finalized { operation: "add global middleware" });
        }

        self.global.extend(middleware);
        Ok(self)
    }

    /// Installs one dispatch handler per route into `mux`.
    ///
    /// Each handler runs the route's middleware then the handler bound to the request
    /// method, or answers `405 Method Not Allowed`. Can only succeed once.
    ///
    /// On error `mux` is left as it was and the router stays unfinalized.
    pub fn finalize(&mut self, mux: &mut PathMux) -> Result<(), RouteError> {
        if self.finalized {
            return Err(RouteError::AlreadyFinalized);
        }

        let mut staged = mux.clone();
        for (path, route) in &self.routes {
            staged.handle(path.clone(), route.dispatch())?;
        }

        *mux = staged;
        self.finalized = true;
        info!(routes = self.routes.len(), "routes applied");
        Ok(())
    }

    /// Wraps `inner` with the global middleware stack.
    pub fn apply_global(&self, inner: BoxHandler) -> BoxHandler {
        self.global.apply(inner)
    }

    /// Finalizes into `mux` and wraps the result with the global stack.
    pub(crate) fn build_handler(&mut self, mut mux: PathMux) -> Result<BoxHandler, RouteError> {
        self.finalize(&mut mux)?;
        Ok(self.apply_global(Arc::new(mux)))
    }

    /// Finalizes into a fresh [`PathMux`] and returns the complete request handler.
    pub fn into_handler(mut self) -> Result<BoxHandler, RouteError> {
        self.build_handler(PathMux::new())
    }

    /// The registered routes, ordered by path.
    ///
    /// The iterator can be cloned to walk the routes again, and is usable before and
    /// after finalization.
    pub fn enumerate(&self) -> impl Iterator<Item = &Route> + Clone {
        self.routes.values()
    }

    pub fn global_middleware(&self) -> &GlobalStack {
        &self.global
    }

    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}
