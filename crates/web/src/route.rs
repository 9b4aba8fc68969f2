//! A single path with its per-method handlers and its own middleware.

use crate::error::RouteError;
use crate::middleware::{BoxMiddleware, MiddlewareChain};
use crate::responder::with_content_type;
use async_trait::async_trait;
use http::header::{ALLOW, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use lightmux_http::body::{ReqBody, ResponseBody};
use lightmux_http::handler::{BoxHandler, Handler};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

static KNOWN_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

/// One registered path.
///
/// Routes are created through [`Router::route`](crate::Router::route) or
/// [`RouteGroup::route`](crate::RouteGroup::route) and configured through the returned
/// `&mut Route`. Middleware is composed when the router is finalized, so middleware added
/// after a method was bound still applies to it.
pub struct Route {
    path: String,
    // insertion ordered, at most one entry per method
    methods: Vec<(Method, BoxHandler)>,
    middleware: MiddlewareChain,
}

macro_rules! method_binding {
    ($fn_name:ident, $method:ident) => {
        #[doc = concat!("Binds `handler` to `", stringify!($method), "`, see [`Route::handle`].")]
        pub fn $fn_name<H: Handler + 'static>(&mut self, handler: H) -> Result<&mut Self, RouteError> {
            self.bind(Method::$method, Arc::new(handler))
        }
    };
}

impl Route {
    pub(crate) fn new(path: String, middleware: MiddlewareChain) -> Self {
        Self { path, methods: Vec::new(), middleware }
    }

    /// Binds `handler` to the method named `method`.
    ///
    /// `method` must be one of the nine standard method tokens, spelled in upper case.
    /// A method can be bound once; a second attempt fails and the first handler stays.
    pub fn handle<H>(&mut self, method: impl AsRef<str>, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Handler + 'static,
    {
        let method = method.as_ref();
        let Some(method) = KNOWN_METHODS.iter().find(|known| known.as_str() == method) else {
            return Err(RouteError::invalid_method(method));
        };

        self.bind(method.clone(), Arc::new(handler))
    }

    method_binding!(get, GET);
    method_binding!(post, POST);
    method_binding!(put, PUT);
    method_binding!(delete, DELETE);
    method_binding!(patch, PATCH);
    method_binding!(head, HEAD);
    method_binding!(options, OPTIONS);
    method_binding!(connect, CONNECT);
    method_binding!(trace, TRACE);

    fn bind(&mut self, method: Method, handler: BoxHandler) -> Result<&mut Self, RouteError> {
        if self.methods.iter().any(|(bound, _)| *bound == method) {
            return Err(RouteError::duplicate_method(method.as_str(), &self.path));
        }

        debug!(path = %self.path, %method, "bind method");
        self.methods.push((method, handler));
        Ok(self)
    }

    /// Appends `middleware` after the middleware this route already has.
    pub fn add_middleware<I>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        self.middleware.extend(middleware);
        self
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bound methods, in the order they were bound.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().map(|(method, _)| method)
    }

    #[inline]
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }

    /// Labels of the labelled middleware, see [`named`](crate::middleware::named).
    pub fn middleware_labels(&self) -> impl Iterator<Item = &str> {
        self.middleware.labels()
    }

    pub(crate) fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    /// Composes every bound handler with this route's middleware.
    pub(crate) fn dispatch(&self) -> RouteDispatch {
        let handlers = self
            .methods
            .iter()
            .map(|(method, handler)| (method.clone(), self.middleware.compose(Arc::clone(handler))))
            .collect();

        let allowed = self.methods().map(Method::as_str).collect::<Vec<_>>().join(", ");

        RouteDispatch { handlers, allowed }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("methods", &self.methods().collect::<Vec<_>>())
            .field("middleware", &self.middleware)
            .finish()
    }
}

/// The handler installed for a route's path once the router is finalized.
pub(crate) struct RouteDispatch {
    handlers: Vec<(Method, BoxHandler)>,
    allowed: String,
}

#[async_trait]
impl Handler for RouteDispatch {
    async fn call(&self, req: Request<ReqBody>) -> Response<ResponseBody> {
        let handler = self.handlers.iter().find(|(method, _)| method == req.method()).map(|(_, handler)| handler);

        match handler {
            Some(handler) => handler.call(req).await,
            None => method_not_allowed(req.method(), req.uri().path(), &self.allowed),
        }
    }
}

fn method_not_allowed(method: &Method, path: &str, allowed: &str) -> Response<ResponseBody> {
    let message = format!("{method} method is not allowed, allowed methods for {path}:[{allowed}]");
    // newline terminated, like a streaming json encoder writes it
    let mut body = serde_json::json!({ "error": message }).to_string();
    body.push('\n');

    let mut response = with_content_type(ResponseBody::from(body), &mime::APPLICATION_JSON);
    *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
    if let Ok(value) = HeaderValue::from_str(allowed) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}
