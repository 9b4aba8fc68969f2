//! Server lifecycle: finalize the router, listen, and shut down gracefully.
//!
//! ```text
//! Idle -> Finalizing -> Serving -> ShuttingDown -> Stopped
//!    \________\____________\____________\-------> Failed
//! ```
//!
//! A [`Server`] is run once. It leaves `Serving` on ctrl-c, on `SIGTERM` (unix only), when
//! the caller's [`CancellationToken`] is cancelled, or when the accept loop fails, whichever
//! comes first. Open connections then get the grace period to finish their requests.

use crate::error::{ServerBuildError, ServerError};
use crate::router::Router;
use lightmux_http::handler::{BoxHandler, Handler};
use lightmux_http::mux::PathMux;
use lightmux_http::server::{Drained, HttpServer, bind};
use lightmux_http::tls::load_server_config;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How long open connections may take to finish once shutdown starts.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Finalizing,
    Serving,
    ShuttingDown,
    Stopped,
    Failed,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

#[derive(Debug, Clone)]
struct TlsFiles {
    cert: PathBuf,
    key: PathBuf,
}

pub struct ServerBuilder {
    router: Option<Router>,
    address: Option<Result<Vec<SocketAddr>, ServerBuildError>>,
    grace_period: Duration,
    tls: Option<TlsFiles>,
    not_found: Option<BoxHandler>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { router: None, address: None, grace_period: DEFAULT_GRACE_PERIOD, tls: None, not_found: None }
    }

    /// The address to listen on. Resolution failures are reported by [`build`](Self::build).
    #[must_use]
    pub fn address<A: ToSocketAddrs + fmt::Debug>(mut self, address: A) -> Self {
        let resolved = address
            .to_socket_addrs()
            .map(|resolved| resolved.collect())
            .map_err(|source| ServerBuildError::InvalidAddress { address: format!("{address:?}"), source });
        self.address = Some(resolved);
        self
    }

    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    #[must_use]
    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Serve HTTPS with the PEM encoded certificate chain and private key at these paths.
    #[must_use]
    pub fn tls(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.tls = Some(TlsFiles { cert: cert.into(), key: key.into() });
        self
    }

    /// Handles requests matching no route, before global middleware is applied.
    #[must_use]
    pub fn not_found(mut self, handler: impl Handler + 'static) -> Self {
        self.not_found = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let router = self.router.ok_or(ServerBuildError::MissingRouter)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)??;
        let (state, _) = watch::channel(LifecycleState::Idle);

        Ok(Server {
            router,
            address,
            grace_period: self.grace_period,
            tls: self.tls,
            not_found: self.not_found,
            state,
        })
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("router", &self.router)
            .field("grace_period", &self.grace_period)
            .field("tls", &self.tls)
            .finish_non_exhaustive()
    }
}

pub struct Server {
    router: Router,
    address: Vec<SocketAddr>,
    grace_period: Duration,
    tls: Option<TlsFiles>,
    not_found: Option<BoxHandler>,
    state: watch::Sender<LifecycleState>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Follows the lifecycle of this server, including after it was consumed by `run`.
    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Serves on the configured address until ctrl-c or `SIGTERM`.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), also stopping once `token` is cancelled.
    pub async fn run_with_cancellation(self, token: CancellationToken) -> Result<(), ServerError> {
        self.launch(None, token).await
    }

    /// Serves HTTPS with the given certificate chain and private key, see [`ServerBuilder::tls`].
    pub async fn run_tls(mut self, cert: impl AsRef<Path>, key: impl AsRef<Path>) -> Result<(), ServerError> {
        self.tls = Some(TlsFiles { cert: cert.as_ref().to_path_buf(), key: key.as_ref().to_path_buf() });
        self.run().await
    }

    /// Serves on an already bound listener instead of the configured address.
    pub async fn serve(self, listener: TcpListener, token: CancellationToken) -> Result<(), ServerError> {
        self.launch(Some(listener), token).await
    }

    async fn launch(mut self, listener: Option<TcpListener>, token: CancellationToken) -> Result<(), ServerError> {
        self.transition(LifecycleState::Finalizing);
        let handler = self.finalize().map_err(|e| self.fail(e.into()))?;

        let tls = match &self.tls {
            Some(files) => Some(
                load_server_config(&files.cert, &files.key)
                    .await
                    .map_err(|e| self.fail(ServerError::ListenStart { source: e.into() }))?,
            ),
            None => None,
        };

        let listener = match listener {
            Some(listener) => listener,
            None => bind(self.address.as_slice()).await.map_err(|source| self.fail(ServerError::ListenStart { source }))?,
        };

        let mut server = HttpServer::new(listener, handler);
        if let Some(config) = tls {
            server = server.with_tls(config);
        }

        let mut handle = server.start().map_err(|source| self.fail(ServerError::ListenStart { source }))?;
        self.transition(LifecycleState::Serving);

        let listener_error = tokio::select! {
            () = shutdown_signal(&token) => None,
            e = handle.failed() => {
                error!(cause = %e, "listener stopped unexpectedly");
                Some(e)
            }
        };

        self.transition(LifecycleState::ShuttingDown);
        let deadline = Instant::now() + self.grace_period;
        match handle.shutdown(deadline).await {
            Ok(Drained::Completed) => info!("all connections finished"),
            Ok(Drained::Aborted(aborted)) => warn!(aborted, "grace period elapsed, aborted open connections"),
            Err(source) => return Err(self.fail(ServerError::Shutdown { source })),
        }

        if let Some(source) = listener_error {
            return Err(self.fail(ServerError::Listener { source }));
        }

        self.transition(LifecycleState::Stopped);
        Ok(())
    }

    /// Routes first, global middleware around them.
    fn finalize(&mut self) -> Result<BoxHandler, crate::error::RouteError> {
        let mut mux = PathMux::new();
        if let Some(not_found) = self.not_found.take() {
            mux.set_not_found(not_found);
        }
        self.router.build_handler(mux)
    }

    fn transition(&self, state: LifecycleState) {
        info!(?state, "server state changed");
        self.state.send_replace(state);
    }

    fn fail(&self, error: ServerError) -> ServerError {
        error!(cause = %error, "server failed");
        self.state.send_replace(LifecycleState::Failed);
        error
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("address", &self.address)
            .field("grace_period", &self.grace_period)
            .field("tls", &self.tls)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

async fn shutdown_signal(token: &CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(cause = %e, "can't listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                warn!(cause = %e, "can't listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c"),
        () = terminate => info!("received SIGTERM"),
        () = token.cancelled() => info!("cancellation requested"),
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecycleState, Server};
    use crate::error::{ServerBuildError, ServerError};
    use crate::{Router, handler_fn};
    use http::Request;
    use lightmux_http::body::ReqBody;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio_util::sync::CancellationToken;

    fn hello_router() -> Router {
        let mut router = Router::new();
        router
            .route("/hello", [])
            .unwrap()
            .get(handler_fn(|_req: Request<ReqBody>| async { "Hello, world!" }))
            .unwrap();
        router
    }

    async fn get(address: std::net::SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(address).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_build_requires_router_and_address() {
        assert!(matches!(Server::builder().address("127.0.0.1:0").build(), Err(ServerBuildError::MissingRouter)));
        assert!(matches!(Server::builder().router(Router::new()).build(), Err(ServerBuildError::MissingAddress)));
        assert!(matches!(
            Server::builder().router(Router::new()).address("not an address").build(),
            Err(ServerBuildError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_serve_then_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = Server::builder().router(hello_router()).address(address).build().unwrap();
        let mut state = server.state();
        let token = CancellationToken::new();

        let running = tokio::spawn(server.serve(listener, token.clone()));
        state.wait_for(|state| *state == LifecycleState::Serving).await.unwrap();

        let response = get(address, "/hello").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
        assert!(response.ends_with("Hello, world!"), "{response}");

        let response = get(address, "/missing").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"), "{response}");

        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), running).await.unwrap().unwrap().unwrap();
        assert_eq!(*state.borrow(), LifecycleState::Stopped);
        assert!(TcpStream::connect(address).await.is_err());
    }

    #[tokio::test]
    async fn test_short_grace_period_stops_with_request_in_flight() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let mut router = hello_router();
        router
            .route("/stall", [])
            .unwrap()
            .get(handler_fn(|_req: Request<ReqBody>| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "too late"
            }))
            .unwrap();

        let server = Server::builder()
            .router(router)
            .address(address)
            .grace_period(Duration::from_millis(300))
            .build()
            .unwrap();
        let mut state = server.state();
        let token = CancellationToken::new();
        let running = tokio::spawn(server.serve(listener, token.clone()));
        state.wait_for(|state| *state == LifecycleState::Serving).await.unwrap();

        let mut stream = TcpStream::connect(address).await.unwrap();
        stream.write_all(b"GET /stall HTTP/1.1\r\nhost: localhost\r\n\r\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let start = tokio::time::Instant::now();
        token.cancel();
        tokio::time::timeout(Duration::from_secs(2), running).await.unwrap().unwrap().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300), "took {:?}", start.elapsed());
        assert_eq!(*state.borrow(), LifecycleState::Stopped);

        let mut response = Vec::new();
        let _ = stream.read_to_end(&mut response).await;
        assert!(response.is_empty(), "{}", String::from_utf8_lossy(&response));
    }

    #[tokio::test]
    async fn test_custom_not_found_is_wrapped_by_global_middleware() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let mut router = hello_router();
        router
            .use_global([crate::middleware_fn(|req: Request<ReqBody>, next: crate::Next| async move {
                let mut response = next.run(req).await;
                response.headers_mut().insert("x-global", http::HeaderValue::from_static("1"));
                response
            })])
            .unwrap();

        let server = Server::builder()
            .router(router)
            .address(address)
            .not_found(handler_fn(|_req: Request<ReqBody>| async { (http::StatusCode::NOT_FOUND, "nothing here") }))
            .build()
            .unwrap();
        let mut state = server.state();
        let token = CancellationToken::new();
        let running = tokio::spawn(server.serve(listener, token.clone()));
        state.wait_for(|state| *state == LifecycleState::Serving).await.unwrap();

        let response = get(address, "/missing").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"), "{response}");
        assert!(response.contains("x-global: 1\r\n"), "{response}");
        assert!(response.ends_with("nothing here"), "{response}");

        token.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = taken.local_addr().unwrap();

        let server = Server::builder().router(hello_router()).address(address).build().unwrap();
        let state = server.state();

        let result = server.run_with_cancellation(CancellationToken::new()).await;
        assert!(matches!(result, Err(ServerError::ListenStart { .. })), "{result:?}");
        assert_eq!(*state.borrow(), LifecycleState::Failed);
    }

    #[tokio::test]
    async fn test_route_error_fails_before_listening() {
        let mut router = Router::new();
        router.route("relative", []).unwrap();

        let server = Server::builder().router(router).address("127.0.0.1:0").build().unwrap();
        let state = server.state();

        let result = server.run_with_cancellation(CancellationToken::new()).await;
        assert!(matches!(result, Err(ServerError::Routes { .. })), "{result:?}");
        assert_eq!(*state.borrow(), LifecycleState::Failed);
    }

    #[tokio::test]
    async fn test_missing_tls_files() {
        let server = Server::builder().router(hello_router()).address("127.0.0.1:0").build().unwrap();

        let result = server.run_tls("/nonexistent/cert.pem", "/nonexistent/key.pem").await;
        assert!(matches!(result, Err(ServerError::ListenStart { .. })), "{result:?}");
    }
}
