//! The HTTP listener underneath `lightmux`.
//!
//! This crate knows nothing about routes, methods or middleware. It offers the small
//! capability a routing layer needs from a server:
//!
//! - a dispatch function shape, [`handler::Handler`], turning a request into a response,
//! - a path keyed dispatch map, [`mux::PathMux`], with exact and longest-prefix matching,
//! - an accept loop, [`server::HttpServer`], serving HTTP/1.1 over plain TCP or TLS,
//! - a [`server::ServerHandle`] to shut that loop down within a deadline.
//!
//! # Example
//!
//! ```no_run
//! use http::{Request, Response};
//! use lightmux_http::body::{ReqBody, ResponseBody};
//! use lightmux_http::handler::make_handler;
//! use lightmux_http::mux::PathMux;
//! use lightmux_http::server::{bind, HttpServer};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::time::Instant;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut mux = PathMux::new();
//!     mux.handle("/hello", make_handler(|_req: Request<ReqBody>| async {
//!         Response::new(ResponseBody::from("Hello, world!"))
//!     }))?;
//!
//!     let listener = bind("127.0.0.1:8080").await?;
//!     let handle = HttpServer::new(listener, Arc::new(mux)).start()?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown(Instant::now() + Duration::from_secs(5)).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Limitations
//!
//! - HTTP/1.1 only
//! - no path cleaning or redirects, the request path is matched as received

pub mod body;
mod connection;
pub mod error;
pub mod handler;
pub mod mux;
pub mod server;
pub mod tls;

pub use error::{MuxError, ServeError, TlsError};
