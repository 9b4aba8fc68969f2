//! A lightweight HTTP multiplexer: routes with one handler per method, middleware at three
//! scopes, and a server that shuts down gracefully.
//!
//! Middleware runs outermost first, in this order:
//!
//! 1. global middleware, registered with [`Router::use_global`], around every request,
//! 2. group middleware, inherited from a [`RouteGroup`],
//! 3. middleware given when the route was created or added with [`Route::add_middleware`],
//!
//! then the handler bound to the request method. Requests for a known path with an unbound
//! method get `405 Method Not Allowed` with a JSON body listing the bound methods.
//!
//! ```no_run
//! use http::Request;
//! use lightmux::{Router, Server, handler_fn};
//! use lightmux_http::body::ReqBody;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router.route("/hello", [])?.get(handler_fn(|_req: Request<ReqBody>| async { "Hello, world!" }))?;
//!
//!     Server::builder().router(router).address("127.0.0.1:8080").build()?.run().await?;
//!     Ok(())
//! }
//! ```

mod diagnostics;
mod error;
mod group;
mod handler;
mod responder;
mod route;
mod router;
mod server;

pub mod middleware;

pub use diagnostics::RoutesReport;
pub use error::{RouteError, ServerBuildError, ServerError};
pub use group::RouteGroup;
pub use handler::{FnHandler, handler_fn};
pub use middleware::{BoxMiddleware, Middleware, Next, middleware_fn, named};
pub use responder::{Json, Responder};
pub use route::Route;
pub use router::Router;
pub use server::{DEFAULT_GRACE_PERIOD, LifecycleState, Server, ServerBuilder};

pub use lightmux_http::body::{ReqBody, ResponseBody};
pub use lightmux_http::handler::{BoxHandler, Handler};
pub use lightmux_http::mux::PathMux;
