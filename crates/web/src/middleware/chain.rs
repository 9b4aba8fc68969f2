use crate::middleware::BoxMiddleware;
use lightmux_http::handler::BoxHandler;
use std::fmt;

/// An ordered list of middleware, outermost first.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    inner: Vec<BoxMiddleware>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: BoxMiddleware) {
        self.inner.push(middleware);
    }

    pub fn extend<I>(&mut self, middleware: I)
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        self.inner.extend(middleware);
    }

    /// A new chain holding `self` followed by `tail`; neither input is touched.
    pub fn concat<I>(&self, tail: I) -> Self
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        let mut chain = self.clone();
        chain.extend(tail);
        chain
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoxMiddleware> {
        self.inner.iter()
    }

    /// Labels of the middleware that carry one, in chain order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().filter_map(|middleware| middleware.label())
    }

    /// Wraps `handler` so that the first middleware of the chain runs first.
    ///
    /// For `[m0, m1, m2]` the result is `m0(m1(m2(handler)))`.
    pub fn compose(&self, handler: BoxHandler) -> BoxHandler {
        self.inner.iter().rev().fold(handler, |next, middleware| middleware.wrap(next))
    }
}

impl FromIterator<BoxMiddleware> for MiddlewareChain {
    fn from_iter<T: IntoIterator<Item = BoxMiddleware>>(iter: T) -> Self {
        Self { inner: iter.into_iter().collect() }
    }
}

impl IntoIterator for MiddlewareChain {
    type Item = BoxMiddleware;
    type IntoIter = std::vec::IntoIter<BoxMiddleware>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.inner.len())
            .field("labels", &self.labels().collect::<Vec<_>>())
            .finish()
    }
}
