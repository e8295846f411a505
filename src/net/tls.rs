//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::{ConfigError, TlsConfig};

/// Load TLS for a listener.
///
/// Returns `None` when neither path is configured. A half-configured pair
/// or an unreadable bundle is an error.
pub async fn load_tls_config(tls: &TlsConfig) -> Result<Option<RustlsConfig>, ConfigError> {
    let cert = tls.cert_path.trim();
    let key = tls.key_path.trim();

    match (cert.is_empty(), key.is_empty()) {
        (true, true) => {
            tracing::info!("Listener configured without TLS");
            return Ok(None);
        }
        (false, true) => {
            tracing::warn!("Received TLS certificate bundle WITHOUT key");
            return Err(ConfigError::Tls("certificate bundle given without a key".into()));
        }
        (true, false) => {
            tracing::warn!("Received TLS key WITHOUT certificate bundle");
            return Err(ConfigError::Tls("key given without a certificate bundle".into()));
        }
        (false, false) => {
            tracing::info!(cert_path = %cert, key_path = %key, "Received TLS credential paths");
        }
    }

    let cert_path = Path::new(cert);
    let key_path = Path::new(key);
    check_pem(cert_path, key_path)?;

    RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map(Some)
        .map_err(|e| ConfigError::Tls(format!("failed to build TLS config: {}", e)))
}

/// Verify the files exist and hold at least one certificate and a key.
fn check_pem(cert_path: &Path, key_path: &Path) -> Result<(), ConfigError> {
    let open = |path: &Path| {
        File::open(path)
            .map(BufReader::new)
            .map_err(|e| ConfigError::Tls(format!("cannot open {:?}: {}", path, e)))
    };

    let mut reader = open(cert_path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::Tls(format!("invalid certificate bundle {:?}: {}", cert_path, e)))?;
    if certs.is_empty() {
        return Err(ConfigError::Tls(format!(
            "no certificates found in {:?}",
            cert_path
        )));
    }

    let mut reader = open(key_path)?;
    match rustls_pemfile::private_key(&mut reader) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(ConfigError::Tls(format!(
            "no private key found in {:?}",
            key_path
        ))),
        Err(e) => Err(ConfigError::Tls(format!(
            "invalid private key {:?}: {}",
            key_path, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tls(cert: &str, key: &str) -> TlsConfig {
        TlsConfig {
            cert_path: cert.into(),
            key_path: key.into(),
        }
    }

    #[tokio::test]
    async fn no_paths_means_plain() {
        assert!(load_tls_config(&tls("", "  ")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn half_configured_pair_is_rejected() {
        assert!(matches!(
            load_tls_config(&tls("bundle.crt", "")).await,
            Err(ConfigError::Tls(_))
        ));
        assert!(matches!(
            load_tls_config(&tls("", "server.key")).await,
            Err(ConfigError::Tls(_))
        ));
    }

    #[tokio::test]
    async fn missing_files_are_reported() {
        let err = load_tls_config(&tls("/nonexistent/bundle.crt", "/nonexistent/server.key"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bundle.crt"));
    }

    #[tokio::test]
    async fn file_without_certificates_is_rejected() {
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        writeln!(cert, "not a pem file").unwrap();
        let key = tempfile::NamedTempFile::new().unwrap();

        let err = load_tls_config(&tls(
            cert.path().to_str().unwrap(),
            key.path().to_str().unwrap(),
        ))
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no certificates found"));
    }
}
