use crate::middleware::{BoxMiddleware, Middleware};
use crate::responder::Responder;
use async_trait::async_trait;
use http::{Request, Response};
use lightmux_http::body::{ReqBody, ResponseBody};
use lightmux_http::handler::{BoxHandler, Handler};
use std::fmt;
use std::sync::Arc;

/// The rest of the chain, as seen from inside a [`middleware_fn`].
#[derive(Clone)]
pub struct Next {
    inner: BoxHandler,
}

impl Next {
    /// Passes the request on to the next middleware, or to the handler.
    pub async fn run(self, req: Request<ReqBody>) -> Response<ResponseBody> {
        self.inner.call(req).await
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

pub struct FnMiddleware<F> {
    f: Arc<F>,
}

/// Builds a middleware from an async function of the request and the rest of the chain.
///
/// ```
/// use http::{Request, StatusCode};
/// use lightmux::middleware::{middleware_fn, Next};
/// use lightmux_http::body::ReqBody;
///
/// let auth = middleware_fn(|req: Request<ReqBody>, next: Next| async move {
///     if req.headers().contains_key(http::header::AUTHORIZATION) {
///         Ok(next.run(req).await)
///     } else {
///         Err(StatusCode::UNAUTHORIZED)
///     }
/// });
/// ```
pub fn middleware_fn<F, Fut>(f: F) -> BoxMiddleware
where
    F: Fn(Request<ReqBody>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    Arc::new(FnMiddleware { f: Arc::new(f) })
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request<ReqBody>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(FnMiddlewareHandler { f: Arc::clone(&self.f), next })
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware").finish_non_exhaustive()
    }
}

struct FnMiddlewareHandler<F> {
    f: Arc<F>,
    next: BoxHandler,
}

#[async_trait]
impl<F, Fut> Handler for FnMiddlewareHandler<F>
where
    F: Fn(Request<ReqBody>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    async fn call(&self, req: Request<ReqBody>) -> Response<ResponseBody> {
        let next = Next { inner: Arc::clone(&self.next) };
        (self.f)(req, next).await.into_response()
    }
}
