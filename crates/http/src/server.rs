//! The accept loop and its shutdown handle.
//!
//! [`HttpServer::start`] moves the accept loop onto its own task and hands back a
//! [`ServerHandle`]. The handle is the only way to stop it: [`ServerHandle::shutdown`]
//! closes the listening socket, lets every open connection finish the request it is
//! working on, and aborts whatever is still running when the deadline passes.

use crate::connection::serve_connection;
use crate::error::ServeError;
use crate::handler::BoxHandler;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Binds a TCP listener, reporting the address in the error when it fails.
pub async fn bind<A>(address: A) -> Result<TcpListener, ServeError>
where
    A: ToSocketAddrs + std::fmt::Debug,
{
    let description = format!("{address:?}");
    TcpListener::bind(address).await.map_err(|e| ServeError::bind(description, e))
}

pub struct HttpServer {
    listener: TcpListener,
    handler: BoxHandler,
    tls: Option<TlsAcceptor>,
}

impl HttpServer {
    pub fn new(listener: TcpListener, handler: BoxHandler) -> Self {
        Self { listener, handler, tls: None }
    }

    /// Terminate TLS on every accepted connection with `config`.
    pub fn with_tls(mut self, config: Arc<rustls::ServerConfig>) -> Self {
        self.tls = Some(TlsAcceptor::from(config));
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Spawns the accept loop on the current tokio runtime.
    pub fn start(self) -> Result<ServerHandle, ServeError> {
        let local_addr = self.listener.local_addr().map_err(|source| ServeError::LocalAddr { source })?;
        let stop = CancellationToken::new();

        info!(address = %local_addr, tls = self.tls.is_some(), "start listening");
        let task = tokio::spawn(accept_loop(self.listener, self.handler, self.tls, stop.clone()));

        Ok(ServerHandle { local_addr, stop, task: Some(task) })
    }
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("listener", &self.listener)
            .field("tls", &self.tls.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    stop: CancellationToken,
    // taken once the loop has been observed to finish on its own
    task: Option<JoinHandle<Result<Connections, ServeError>>>,
}

/// How a shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drained {
    /// Every connection finished before the deadline.
    Completed,
    /// The deadline passed and this many connections were aborted.
    Aborted(usize),
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolves only if the accept loop gives up on its own, with the error that made it
    /// stop. Cancel safe: dropping the future leaves the loop running.
    ///
    /// Once this resolved the accept loop is gone and its connections were dropped, a
    /// later [`shutdown`](Self::shutdown) has nothing left to drain.
    pub async fn failed(&mut self) -> ServeError {
        let Some(task) = self.task.as_mut() else {
            return std::future::pending().await;
        };

        let result = task.await;
        self.task = None;
        match result {
            Ok(Err(e)) => e,
            // the loop returns Ok only after a stop request, which needs the handle by value
            Ok(Ok(_)) => std::future::pending().await,
            Err(e) => ServeError::from(e),
        }
    }

    /// Stops accepting, then waits for open connections until `deadline`.
    pub async fn shutdown(self, deadline: Instant) -> Result<Drained, ServeError> {
        self.stop.cancel();
        let Some(task) = self.task else {
            return Ok(Drained::Completed);
        };

        let connections = task.await??;
        Ok(connections.drain(deadline).await)
    }
}

#[derive(Debug)]
struct Connections {
    tasks: JoinSet<()>,
}

impl Connections {
    async fn drain(mut self, deadline: Instant) -> Drained {
        let open = self.tasks.len();
        debug!(open, "waiting for open connections");

        let joined = tokio::time::timeout_at(deadline, async {
            while self.tasks.join_next().await.is_some() {}
        })
        .await;

        if joined.is_ok() {
            return Drained::Completed;
        }

        let remaining = self.tasks.len();
        warn!(remaining, "grace period elapsed, aborting remaining connections");
        self.tasks.shutdown().await;
        Drained::Aborted(remaining)
    }
}

async fn accept_loop(
    listener: TcpListener,
    handler: BoxHandler,
    tls: Option<TlsAcceptor>,
    stop: CancellationToken,
) -> Result<Connections, ServeError> {
    let mut tasks = JoinSet::new();

    loop {
        let accepted = tokio::select! {
            () = stop.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        let (tcp_stream, remote_addr) = match accepted {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) if is_transient(&e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
            Err(e) => {
                error!(cause = %e, "accept loop stopped");
                return Err(ServeError::accept(e));
            }
        };

        // reap connections that already finished
        while tasks.try_join_next().is_some() {}

        let handler = Arc::clone(&handler);
        let shutdown = stop.clone();
        let tls = tls.clone();

        tasks.spawn(async move {
            let result = match tls {
                Some(acceptor) => match acceptor.accept(tcp_stream).await {
                    Ok(tls_stream) => serve_connection(tls_stream, handler, shutdown).await,
                    Err(e) => {
                        warn!(cause = %e, %remote_addr, "tls handshake failed");
                        return;
                    }
                },
                None => serve_connection(tcp_stream, handler, shutdown).await,
            };

            match result {
                Ok(()) => debug!(%remote_addr, "finished process, connection shutdown"),
                Err(e) => warn!(cause = %e, %remote_addr, "connection error, connection shutdown"),
            }
        });
    }

    drop(listener);
    info!(open = tasks.len(), "stopped accepting connections");
    Ok(Connections { tasks })
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}
