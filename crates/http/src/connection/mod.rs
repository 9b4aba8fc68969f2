//! Serving a single accepted connection.

use crate::body::ReqBody;
use crate::handler::{BoxHandler, Handler};
use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Drives HTTP/1.1 on `io` until the peer closes it or `shutdown` fires.
///
/// Once `shutdown` is cancelled the connection stops reading new requests, finishes the
/// one in flight (if any) and closes.
pub(crate) async fn serve_connection<I>(io: I, handler: BoxHandler, shutdown: CancellationToken) -> Result<(), hyper::Error>
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req: Request<Incoming>| {
        let handler = Arc::clone(&handler);
        async move { Ok::<_, Infallible>(handler.call(req.map(ReqBody::from)).await) }
    });

    let connection = http1::Builder::new().timer(TokioTimer::new()).serve_connection(TokioIo::new(io), service);
    tokio::pin!(connection);

    tokio::select! {
        result = connection.as_mut() => result,
        () = shutdown.cancelled() => {
            debug!("shutdown requested, closing connection after in-flight request");
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    }
}
