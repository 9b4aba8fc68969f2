//! Human readable listing of a router's routes and middleware.

use crate::middleware::MiddlewareChain;
use crate::router::Router;
use std::fmt;
use tracing::info;

const UNNAMED: &str = "<unnamed>";

/// A [`Display`](fmt::Display) view of a router, one block per route:
///
/// ```text
/// Global middleware: 1
///     1: logger
/// Route: /hello
///     - GET
///     - POST
///     Middleware: 1
///         1: auth
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RoutesReport<'a> {
    router: &'a Router,
}

impl Router {
    pub fn routes_report(&self) -> RoutesReport<'_> {
        RoutesReport { router: self }
    }

    /// Emits one `info` event for the global stack and one per route.
    pub fn log_routes(&self) {
        let global = self.global_middleware();
        info!(count = global.len(), labels = ?global.labels().collect::<Vec<_>>(), "global middleware");

        for route in self.enumerate() {
            let methods = route.methods().map(http::Method::as_str).collect::<Vec<_>>();
            info!(
                path = route.path(),
                methods = %methods.join(", "),
                middleware = route.middleware_count(),
                labels = ?route.middleware_labels().collect::<Vec<_>>(),
                "route"
            );
        }
    }
}

fn write_middleware(f: &mut fmt::Formatter<'_>, chain: &MiddlewareChain, indent: &str) -> fmt::Result {
    for (index, middleware) in chain.iter().enumerate() {
        writeln!(f, "{indent}{}: {}", index + 1, middleware.label().unwrap_or(UNNAMED))?;
    }
    Ok(())
}

impl fmt::Display for RoutesReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let global = self.router.global_middleware();
        writeln!(f, "Global middleware: {}", global.len())?;
        write_middleware(f, global.chain(), "    ")?;

        for route in self.router.enumerate() {
            writeln!(f, "Route: {}", route.path())?;
            for method in route.methods() {
                writeln!(f, "    - {method}")?;
            }
            writeln!(f, "    Middleware: {}", route.middleware_count())?;
            write_middleware(f, route.middleware(), "        ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Router;
    use crate::middleware::named;
    use crate::middleware::testing::Recorder;
    use indoc::indoc;

    #[test]
    fn test_report() {
        let recorder = Recorder::default();
        let mut router = Router::new();
        router.use_global([named("logger", recorder.middleware("logger"))]).unwrap();
        router
            .route("/hello", [named("auth", recorder.middleware("auth")), recorder.middleware("anonymous")])
            .unwrap()
            .get(recorder.handler("get"))
            .unwrap()
            .post(recorder.handler("post"))
            .unwrap();
        router.route("/empty", []).unwrap();

        let expected = indoc! {"
            Global middleware: 1
                1: logger
            Route: /empty
                Middleware: 0
            Route: /hello
                - GET
                - POST
                Middleware: 2
                    1: auth
                    2: <unnamed>
        "};
        assert_eq!(router.routes_report().to_string(), expected);
    }

    #[test]
    fn test_report_of_empty_router() {
        assert_eq!(Router::new().routes_report().to_string(), "Global middleware: 0\n");
    }
}
