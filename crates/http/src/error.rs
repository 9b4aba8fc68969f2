use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("listener has no local address: {source}")]
    LocalAddr { source: io::Error },

    #[error("accept loop failed: {source}")]
    Accept { source: io::Error },

    #[error("tls error: {source}")]
    Tls {
        #[from]
        source: TlsError,
    },

    #[error("server task failed: {source}")]
    Task {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl ServeError {
    pub fn bind<A: ToString>(address: A, source: io::Error) -> Self {
        Self::Bind { address: address.to_string(), source }
    }

    pub fn accept(source: io::Error) -> Self {
        Self::Accept { source }
    }
}

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("can't read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid pem data: {source}")]
    InvalidPem { source: io::Error },

    #[error("no certificate found in pem data")]
    NoCertificates,

    #[error("no private key found in pem data")]
    NoPrivateKey,

    #[error("rustls rejected the configuration: {source}")]
    Rustls {
        #[from]
        source: rustls::Error,
    },
}

#[derive(Debug, Error)]
pub enum MuxError {
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("a handler is already registered for pattern '{pattern}'")]
    DuplicatePattern { pattern: String },
}

impl MuxError {
    pub fn invalid_pattern<S: ToString>(pattern: &str, reason: S) -> Self {
        Self::InvalidPattern { pattern: pattern.to_owned(), reason: reason.to_string() }
    }

    pub fn duplicate_pattern(pattern: &str) -> Self {
        Self::DuplicatePattern { pattern: pattern.to_owned() }
    }
}
