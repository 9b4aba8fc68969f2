//! The dispatch function shape shared by the listener, the path map and everything
//! layered above them.

use crate::body::{ReqBody, ResponseBody};
use async_trait::async_trait;
use http::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// Turns a request into a response.
///
/// A handler never fails: anything that goes wrong is expressed as a response, the
/// same way a 405 or a 404 is.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, req: Request<ReqBody>) -> Response<ResponseBody>;
}

/// A type erased, cheaply cloneable handler.
pub type BoxHandler = Arc<dyn Handler>;

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn call(&self, req: Request<ReqBody>) -> Response<ResponseBody> {
        (**self).call(req).await
    }
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Box<H> {
    async fn call(&self, req: Request<ReqBody>) -> Response<ResponseBody> {
        (**self).call(req).await
    }
}

pub struct HandlerFn<F> {
    f: F,
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync,
    Fut: Future<Output = Response<ResponseBody>> + Send + 'static,
{
    async fn call(&self, req: Request<ReqBody>) -> Response<ResponseBody> {
        (self.f)(req).await
    }
}

/// Build a [`Handler`] from an async function taking the whole request.
pub fn make_handler<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync,
    Fut: Future<Output = Response<ResponseBody>> + Send + 'static,
{
    HandlerFn { f }
}
