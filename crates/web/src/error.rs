use lightmux_http::{MuxError, ServeError};
use thiserror::Error;

/// A registration mistake. These describe a broken configuration rather than a runtime
/// condition, callers are expected to give up on the configuration when they see one.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route with path {path} already exists")]
    DuplicatePath { path: String },

    #[error("duplicate method for path: {method} {path}")]
    DuplicateMethod { method: String, path: String },

    #[error("invalid HTTP method: {method}")]
    InvalidMethod { method: String },

    #[error("routes are already applied, can't {operation}")]
    Finalized { operation: &'static str },

    #[error("routes are already applied")]
    AlreadyFinalized,

    #[error("can't install route: {source}")]
    Install {
        #[from]
        source: MuxError,
    },
}

impl RouteError {
    pub(crate) fn duplicate_path(path: &str) -> Self {
        Self::DuplicatePath { path: path.to_owned() }
    }

    pub(crate) fn duplicate_method(method: &str, path: &str) -> Self {
        Self::DuplicateMethod { method: method.to_owned(), path: path.to_owned() }
    }

    pub(crate) fn invalid_method(method: &str) -> Self {
        Self::InvalidMethod { method: method.to_owned() }
    }
}

#[derive(Debug, Error)]
pub enum ServerBuildError {
    #[error("router must be set")]
    MissingRouter,

    #[error("address must be set")]
    MissingAddress,

    #[error("can't resolve address {address}: {source}")]
    InvalidAddress { address: String, source: std::io::Error },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("can't apply routes: {source}")]
    Routes {
        #[from]
        source: RouteError,
    },

    #[error("failed to start listening: {source}")]
    ListenStart { source: ServeError },

    #[error("listener stopped unexpectedly: {source}")]
    Listener { source: ServeError },

    #[error("shutdown failed: {source}")]
    Shutdown { source: ServeError },
}
