use crate::responder::Responder;
use async_trait::async_trait;
use http::{Request, Response};
use lightmux_http::body::{ReqBody, ResponseBody};
use lightmux_http::handler::Handler;
use std::fmt;

/// An async function holder, see [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Turns an async function of the request into a [`Handler`].
///
/// The function may return anything implementing [`Responder`]:
///
/// ```
/// use http::Request;
/// use lightmux::handler_fn;
/// use lightmux_http::body::ReqBody;
///
/// let hello = handler_fn(|_req: Request<ReqBody>| async { "Hello, world!" });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    async fn call(&self, req: Request<ReqBody>) -> Response<ResponseBody> {
        (self.f)(req).await.into_response()
    }
}
