use crate::middleware::{BoxMiddleware, MiddlewareChain};
use lightmux_http::handler::BoxHandler;

/// Middleware wrapping the whole dispatch surface of a router, not-found responses included.
///
/// The stack only grows; it is applied once, after every route is installed.
#[derive(Clone, Debug, Default)]
pub struct GlobalStack {
    chain: MiddlewareChain,
}

impl GlobalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: BoxMiddleware) {
        self.chain.push(middleware);
    }

    pub fn extend<I>(&mut self, middleware: I)
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        self.chain.extend(middleware);
    }

    /// Wraps `inner` with every registered middleware, the earliest registered outermost.
    pub fn apply(&self, inner: BoxHandler) -> BoxHandler {
        self.chain.compose(inner)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.chain.labels()
    }

    pub(crate) fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }
}
