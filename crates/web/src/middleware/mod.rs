//! Middleware: functions from "next handler" to "handler".
//!
//! A middleware sees the request before the handler it wraps and the response after it,
//! and may answer on its own without calling the inner handler at all.
//!
//! Wherever a list of middleware is accepted, the first one is the outermost wrapper: it
//! runs first on the way in and last on the way out. Registering `[auth, log]` means
//! `auth` may reject a request before `log` ever sees it.
//!
//! Three ways to write one:
//!
//! - [`middleware_fn`] for an async closure of `(request, next)`,
//! - a closure `Fn(BoxHandler) -> BoxHandler`,
//! - a type implementing [`Middleware`].

mod chain;
mod global;
mod middleware_fn;

pub use chain::MiddlewareChain;
pub use global::GlobalStack;
pub use middleware_fn::{FnMiddleware, Next, middleware_fn};

use lightmux_http::handler::BoxHandler;
use std::fmt;
use std::sync::Arc;

pub trait Middleware: Send + Sync {
    /// Wraps `next`, returning the handler that runs in its place.
    fn wrap(&self, next: BoxHandler) -> BoxHandler;

    /// A caller supplied name, only used in diagnostics.
    fn label(&self) -> Option<&str> {
        None
    }
}

/// A shared, type erased middleware.
pub type BoxMiddleware = Arc<dyn Middleware>;

impl<F> Middleware for F
where
    F: Fn(BoxHandler) -> BoxHandler + Send + Sync,
{
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        self(next)
    }
}

/// A middleware with a name attached, see [`named`].
pub struct Named {
    label: String,
    inner: BoxMiddleware,
}

/// Attaches `label` to `middleware` so route listings can show it.
pub fn named(label: impl Into<String>, middleware: BoxMiddleware) -> BoxMiddleware {
    Arc::new(Named { label: label.into(), inner: middleware })
}

impl Middleware for Named {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        self.inner.wrap(next)
    }

    fn label(&self) -> Option<&str> {
        Some(&self.label)
    }
}

impl fmt::Debug for Named {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Named").field("label", &self.label).finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Order recording helpers shared by the tests of this crate.

    use super::{BoxMiddleware, Next, middleware_fn};
    use crate::handler_fn;
    use http::{Request, StatusCode};
    use lightmux_http::body::ReqBody;
    use lightmux_http::handler::BoxHandler;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub(crate) struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        pub(crate) fn record(&self, name: &str) {
            self.calls.lock().unwrap().push(name.to_owned());
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        /// A middleware appending `name` to the record, then calling the next handler.
        pub(crate) fn middleware(&self, name: &'static str) -> BoxMiddleware {
            let recorder = self.clone();
            middleware_fn(move |req: Request<ReqBody>, next: Next| {
                recorder.record(name);
                next.run(req)
            })
        }

        /// A terminal handler appending `name` to the record.
        pub(crate) fn handler(&self, name: &'static str) -> BoxHandler {
            let recorder = self.clone();
            Arc::new(handler_fn(move |_req: Request<ReqBody>| {
                recorder.record(name);
                async move { name }
            }))
        }
    }

    /// A middleware answering 401 without calling the next handler.
    pub(crate) fn reject() -> BoxMiddleware {
        middleware_fn(|_req: Request<ReqBody>, _next: Next| async { StatusCode::UNAUTHORIZED })
    }
}
