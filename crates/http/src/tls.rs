//! TLS server configuration from PEM encoded certificate chain and private key.

use crate::error::TlsError;
use rustls::ServerConfig;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Reads `cert_path` and `key_path` and builds a [`ServerConfig`] from them.
pub async fn load_server_config(cert_path: &Path, key_path: &Path) -> Result<Arc<ServerConfig>, TlsError> {
    let cert_pem = read(cert_path).await?;
    let key_pem = read(key_path).await?;
    build_server_config(&cert_pem, &key_pem)
}

/// Build a [`ServerConfig`] from PEM-encoded certificate chain and private key bytes.
///
/// The config only offers `http/1.1` through ALPN, the listener speaks nothing else.
pub fn build_server_config(cert_pem: &[u8], key_pem: &[u8]) -> Result<Arc<ServerConfig>, TlsError> {
    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_pem))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::InvalidPem { source })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates);
    }

    let key = rustls_pemfile::private_key(&mut BufReader::new(key_pem))
        .map_err(|source| TlsError::InvalidPem { source })?
        .ok_or(TlsError::NoPrivateKey)?;

    let mut config = ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

async fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| TlsError::Read { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::{build_server_config, load_server_config};
    use crate::error::TlsError;
    use std::path::Path;

    #[test]
    fn test_rejects_empty_cert_pem() {
        let result = build_server_config(b"", b"");
        assert!(matches!(result, Err(TlsError::NoCertificates)));
    }

    #[test]
    fn test_rejects_garbage_pem() {
        let result = build_server_config(b"not a pem", b"also not a pem");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_reports_missing_files() {
        let result = load_server_config(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem")).await;
        assert!(matches!(result, Err(TlsError::Read { .. })));
    }
}
