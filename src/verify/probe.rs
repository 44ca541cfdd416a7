// src/verify/probe.rs
//! TLS dial that only retrieves the server's leaf certificate.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::{self, pki_types::ServerName};
use tracing::debug;

use crate::error::ProbeError;

/// Fetches the certificate a site presents during the TLS handshake
#[async_trait]
pub trait LeafProbe: Send + Sync {
    /// DER of the first certificate the server sent, `None` if it sent none
    async fn leaf_certificate(&self, host: &str) -> Result<Option<Vec<u8>>, ProbeError>;
}

/// Real TLS probe.
///
/// Chain and hostname validation are off: the presented certificate is
/// read, never trusted. The host is still sent as SNI so virtual hosts
/// return the right certificate.
pub struct TlsProbe {
    connector: TlsConnector,
    port: u16,
    timeout: Duration,
}

impl TlsProbe {
    pub fn new(port: u16, timeout: Duration) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .context("Failed to select TLS protocol versions")?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(danger::NoCertificateVerification))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            port,
            timeout,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl LeafProbe for TlsProbe {
    async fn leaf_certificate(&self, host: &str) -> Result<Option<Vec<u8>>, ProbeError> {
        let addr = format!("{}:{}", host, self.port);
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| ProbeError::InvalidServerName(host.to_string()))?;

        // Timeout covers connect and handshake together
        let dial = async {
            let tcp = TcpStream::connect(&addr)
                .await
                .map_err(|source| ProbeError::Connect {
                    addr: addr.clone(),
                    source,
                })?;

            let mut tls = self
                .connector
                .connect(server_name, tcp)
                .await
                .map_err(|source| ProbeError::Handshake {
                    addr: addr.clone(),
                    source,
                })?;

            let leaf = tls
                .get_ref()
                .1
                .peer_certificates()
                .and_then(|certs| certs.first())
                .map(|cert| cert.as_ref().to_vec());

            if let Err(e) = tls.shutdown().await {
                debug!("Error closing TLS connection to {}: {}", addr, e);
            }

            Ok::<_, ProbeError>(leaf)
        };

        match tokio::time::timeout(self.timeout, dial).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout {
                addr: addr.clone(),
                timeout: self.timeout,
            }),
        }
    }
}

mod danger {
    use tokio_rustls::rustls::client::danger::{
        HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
    };
    use tokio_rustls::rustls::{DigitallySignedStruct, Error, SignatureScheme, pki_types};

    #[derive(Debug)]
    pub struct NoCertificateVerification;

    impl ServerCertVerifier for NoCertificateVerification {
        fn verify_server_cert(
            &self,
            _: &pki_types::CertificateDer<'_>,
            _: &[pki_types::CertificateDer<'_>],
            _: &pki_types::ServerName<'_>,
            _: &[u8],
            _: pki_types::UnixTime,
        ) -> Result<ServerCertVerified, Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _: &[u8],
            _: &pki_types::CertificateDer<'_>,
            _: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _: &[u8],
            _: &pki_types::CertificateDer<'_>,
            _: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            vec![
                SignatureScheme::RSA_PKCS1_SHA1,
                SignatureScheme::ECDSA_SHA1_Legacy,
                SignatureScheme::RSA_PKCS1_SHA256,
                SignatureScheme::ECDSA_NISTP256_SHA256,
                SignatureScheme::RSA_PKCS1_SHA384,
                SignatureScheme::ECDSA_NISTP384_SHA384,
                SignatureScheme::RSA_PKCS1_SHA512,
                SignatureScheme::ECDSA_NISTP521_SHA512,
                SignatureScheme::RSA_PSS_SHA256,
                SignatureScheme::RSA_PSS_SHA384,
                SignatureScheme::RSA_PSS_SHA512,
                SignatureScheme::ED25519,
                SignatureScheme::ED448,
            ]
        }
    }
}
