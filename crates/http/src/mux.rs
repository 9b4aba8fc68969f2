//! Path based dispatch map.
//!
//! A [`PathMux`] maps patterns to handlers with two kinds of patterns:
//!
//! - a pattern that does not end in `/` matches exactly that path,
//! - a pattern ending in `/` names a subtree and matches every path it prefixes.
//!
//! An exact match always wins; otherwise the longest subtree pattern wins. Requests
//! matching nothing go to the not-found handler.

use crate::body::{ReqBody, ResponseBody};
use crate::error::MuxError;
use crate::handler::{BoxHandler, Handler, make_handler};
use async_trait::async_trait;
use http::{Request, Response, StatusCode, header};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

type InnerRouter<T> = matchit::Router<T>;

#[derive(Clone)]
pub struct PathMux {
    exact: InnerRouter<BoxHandler>,
    // kept sorted by descending pattern length
    subtrees: Vec<(String, BoxHandler)>,
    patterns: Vec<String>,
    not_found: BoxHandler,
}

impl PathMux {
    pub fn new() -> Self {
        Self { exact: InnerRouter::new(), subtrees: Vec::new(), patterns: Vec::new(), not_found: Arc::new(not_found()) }
    }

    /// Registers `handler` for `pattern`.
    ///
    /// A pattern must start with `/`; registering the same pattern twice is an error.
    pub fn handle<H>(&mut self, pattern: impl Into<String>, handler: H) -> Result<(), MuxError>
    where
        H: Handler + 'static,
    {
        let pattern = pattern.into();
        if !pattern.starts_with('/') {
            return Err(MuxError::invalid_pattern(&pattern, "pattern must start with '/'"));
        }

        if self.patterns.contains(&pattern) {
            return Err(MuxError::duplicate_pattern(&pattern));
        }

        let handler: BoxHandler = Arc::new(handler);
        if pattern.ends_with('/') {
            let index = self.subtrees.partition_point(|(existing, _)| existing.len() >= pattern.len());
            self.subtrees.insert(index, (pattern.clone(), handler));
        } else {
            self.exact.insert(escape(&pattern), handler).map_err(|e| match e {
                matchit::InsertError::Conflict { .. } => MuxError::duplicate_pattern(&pattern),
                other => MuxError::invalid_pattern(&pattern, other),
            })?;
        }

        self.patterns.push(pattern);
        Ok(())
    }

    /// Replaces the handler answering requests that match no pattern.
    pub fn set_not_found<H>(&mut self, handler: H)
    where
        H: Handler + 'static,
    {
        self.not_found = Arc::new(handler);
    }

    /// Finds the handler registered for `path`, if any.
    pub fn lookup(&self, path: &str) -> Option<&BoxHandler> {
        if let Ok(matched) = self.exact.at(path) {
            return Some(matched.value);
        }

        self.subtrees.iter().find(|(pattern, _)| path.starts_with(pattern.as_str())).map(|(_, handler)| handler)
    }

    /// Registered patterns, in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PathMux {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PathMux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMux").field("patterns", &self.patterns).finish_non_exhaustive()
    }
}

#[async_trait]
impl Handler for PathMux {
    async fn call(&self, req: Request<ReqBody>) -> Response<ResponseBody> {
        let handler = match self.lookup(req.uri().path()) {
            Some(handler) => handler,
            None => {
                trace!(path = req.uri().path(), "no pattern matched");
                &self.not_found
            }
        };

        handler.call(req).await
    }
}

/// The default not-found handler: a plain text 404.
pub fn not_found() -> impl Handler {
    make_handler(|_req: Request<ReqBody>| async {
        let mut response = Response::new(ResponseBody::from("404 page not found\n"));
        *response.status_mut() = StatusCode::NOT_FOUND;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain; charset=utf-8"));
        response
    })
}

// matchit reserves braces for parameters, patterns here are always literal
fn escape(pattern: &str) -> String {
    pattern.replace('{', "{{").replace('}', "}}")
}

#[cfg(test)]
mod tests {
    use super::PathMux;
    use crate::body::{ReqBody, ResponseBody};
    use crate::error::MuxError;
    use crate::handler::{Handler, make_handler};
    use http::{Request, Response, StatusCode};
    use http_body_util::BodyExt;

    fn named(name: &'static str) -> impl Handler {
        make_handler(move |_req: Request<ReqBody>| async move { Response::new(ResponseBody::from(name)) })
    }

    async fn dispatch(mux: &PathMux, path: &str) -> (StatusCode, String) {
        let request = Request::get(path).body(ReqBody::empty()).unwrap();
        let response = mux.call(request).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn mux() -> PathMux {
        let mut mux = PathMux::new();
        mux.handle("/hello", named("hello")).unwrap();
        mux.handle("/api/", named("api")).unwrap();
        mux.handle("/api/users/", named("users")).unwrap();
        mux.handle("/api/status", named("status")).unwrap();
        mux
    }

    #[tokio::test]
    async fn test_exact_match() {
        let mux = mux();
        assert_eq!(dispatch(&mux, "/hello").await, (StatusCode::OK, "hello".into()));
        assert_eq!(dispatch(&mux, "/api/status").await, (StatusCode::OK, "status".into()));
    }

    #[tokio::test]
    async fn test_longest_subtree_wins() {
        let mux = mux();
        assert_eq!(dispatch(&mux, "/api/").await, (StatusCode::OK, "api".into()));
        assert_eq!(dispatch(&mux, "/api/orders/1").await, (StatusCode::OK, "api".into()));
        assert_eq!(dispatch(&mux, "/api/users/42").await, (StatusCode::OK, "users".into()));
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut mux = mux();
        let (status, body) = dispatch(&mux, "/hello/world").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "404 page not found\n");

        mux.set_not_found(named("custom"));
        assert_eq!(dispatch(&mux, "/missing").await, (StatusCode::OK, "custom".into()));
    }

    #[test]
    fn test_duplicate_pattern() {
        let mut mux = mux();
        assert!(matches!(mux.handle("/hello", named("again")), Err(MuxError::DuplicatePattern { .. })));
        assert!(matches!(mux.handle("/api/", named("again")), Err(MuxError::DuplicatePattern { .. })));
        assert_eq!(mux.len(), 4);
    }

    #[test]
    fn test_invalid_pattern() {
        let mut mux = PathMux::new();
        assert!(matches!(mux.handle("hello", named("hello")), Err(MuxError::InvalidPattern { .. })));
        assert!(mux.is_empty());
    }
}
