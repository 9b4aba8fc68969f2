use crate::error::RouteError;
use crate::middleware::{BoxMiddleware, MiddlewareChain};
use crate::route::Route;
use crate::router::Router;

/// A path prefix plus middleware shared by every route created through it.
///
/// Groups hold no routes themselves: [`RouteGroup::route`] registers into a [`Router`].
/// A group is never changed after creation, [`RouteGroup::extend`] returns a new one.
///
/// ```
/// use lightmux::{RouteGroup, Router};
///
/// let mut router = Router::new();
/// let api = RouteGroup::new("/api", []);
/// let v1 = api.extend("/v1", []);
///
/// v1.route(&mut router, "/users", []).unwrap();
/// assert!(router.enumerate().any(|route| route.path() == "/api/v1/users"));
/// ```
#[derive(Clone, Debug)]
pub struct RouteGroup {
    prefix: String,
    middleware: MiddlewareChain,
}

impl RouteGroup {
    pub fn new<I>(prefix: impl Into<String>, middleware: I) -> Self
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        Self { prefix: prefix.into(), middleware: middleware.into_iter().collect() }
    }

    /// Registers `prefix + path` in `router`.
    ///
    /// The route gets the group's middleware followed by `middleware`.
    pub fn route<'r, I>(&self, router: &'r mut Router, path: &str, middleware: I) -> Result<&'r mut Route, RouteError>
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        router.route(format!("{}{path}", self.prefix), self.middleware.concat(middleware))
    }

    /// A child group under `prefix + suffix`, with the group's middleware followed by `middleware`.
    #[must_use]
    pub fn extend<I>(&self, suffix: &str, middleware: I) -> Self
    where
        I: IntoIterator<Item = BoxMiddleware>,
    {
        Self { prefix: format!("{}{suffix}", self.prefix), middleware: self.middleware.concat(middleware) }
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[inline]
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }
}

#[cfg(test)]
mod tests {
    use super::RouteGroup;
    use crate::Router;
    use crate::error::RouteError;
    use crate::middleware::testing::Recorder;
    use http::Request;
    use lightmux_http::body::ReqBody;
    use lightmux_http::handler::Handler;

    #[tokio::test]
    async fn test_group_middleware_runs_before_call_site_middleware() {
        let recorder = Recorder::default();
        let mut router = Router::new();
        let group = RouteGroup::new("/api", [recorder.middleware("g1"), recorder.middleware("g2")]);

        group.route(&mut router, "/users", [recorder.middleware("c1")]).unwrap().get(recorder.handler("h")).unwrap();

        let handler = router.into_handler().unwrap();
        handler.call(Request::get("/api/users").body(ReqBody::empty()).unwrap()).await;

        assert_eq!(recorder.calls(), ["g1", "g2", "c1", "h"]);
    }

    #[tokio::test]
    async fn test_extend_leaves_parent_unchanged() {
        let recorder = Recorder::default();
        let mut router = Router::new();
        let parent = RouteGroup::new("/api", [recorder.middleware("parent")]);
        let child = parent.extend("/admin", [recorder.middleware("child")]);

        assert_eq!(parent.prefix(), "/api");
        assert_eq!(parent.middleware_count(), 1);
        assert_eq!(child.prefix(), "/api/admin");
        assert_eq!(child.middleware_count(), 2);

        parent.route(&mut router, "/status", []).unwrap().get(recorder.handler("status")).unwrap();
        child.route(&mut router, "/users", []).unwrap().get(recorder.handler("users")).unwrap();

        let handler = router.into_handler().unwrap();
        handler.call(Request::get("/api/status").body(ReqBody::empty()).unwrap()).await;
        assert_eq!(recorder.calls(), ["parent", "status"]);

        handler.call(Request::get("/api/admin/users").body(ReqBody::empty()).unwrap()).await;
        assert_eq!(recorder.calls(), ["parent", "status", "parent", "child", "users"]);
    }

    #[test]
    fn test_same_prefix_twice_is_fine() {
        let mut router = Router::new();
        let first = RouteGroup::new("/api", []);
        let second = RouteGroup::new("/api", []);

        first.route(&mut router, "/a", []).unwrap();
        second.route(&mut router, "/b", []).unwrap();
        assert!(matches!(second.route(&mut router, "/a", []), Err(RouteError::DuplicatePath { .. })));
    }
}
