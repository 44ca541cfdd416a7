// Integration tests for live verification against a local TLS server
use chrono::{TimeZone, Utc};
use crt_expiry::crtsh::CrtShEntry;
use crt_expiry::dedupe::{Dedupe, FilterPolicy};
use crt_expiry::normalize::normalize_entry;
use crt_expiry::report::{build_report, Severity};
use crt_expiry::verify::{LeafProbe, LeafValidity, LiveVerifier, TlsProbe};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_rustls::rustls::{self, pki_types};
use tokio_rustls::TlsAcceptor;

/// Self-signed leaf for 127.0.0.1 with the given validity window
fn leaf(not_before: (i32, u8, u8), not_after: (i32, u8, u8)) -> (Vec<u8>, Vec<u8>) {
    let mut params = rcgen::CertificateParams::new(vec!["127.0.0.1".to_string()]).unwrap();
    params.not_before = rcgen::date_time_ymd(not_before.0, not_before.1, not_before.2);
    params.not_after = rcgen::date_time_ymd(not_after.0, not_after.1, not_after.2);
    let key = rcgen::KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    (cert.der().to_vec(), key.serialize_der())
}

/// Serve TLS with the given certificate on an ephemeral port
async fn start_tls_server(cert_der: Vec<u8>, key_der: Vec<u8>) -> u16 {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(
            vec![pki_types::CertificateDer::from(cert_der)],
            pki_types::PrivateKeyDer::Pkcs8(pki_types::PrivatePkcs8KeyDer::from(key_der)),
        )
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    let _ = tls.shutdown().await;
                }
            });
        }
    });

    port
}

fn record(not_before: &str, not_after: &str) -> crt_expiry::normalize::CertRecord {
    let entry = CrtShEntry {
        issuer_ca_id: 1,
        issuer_name: "Test CA".to_string(),
        min_cert_id: 1,
        min_entry_timestamp: "2025-01-01T00:00:00".to_string(),
        name_value: "127.0.0.1".to_string(),
        not_before: not_before.to_string(),
        not_after: not_after.to_string(),
    };
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    normalize_entry(entry, now).unwrap()
}

#[tokio::test]
async fn test_probe_returns_presented_leaf() {
    let (cert_der, key_der) = leaf((2025, 1, 1), (2025, 9, 1));
    let port = start_tls_server(cert_der.clone(), key_der).await;

    let probe = TlsProbe::new(port, Duration::from_secs(5)).unwrap();
    let presented = probe.leaf_certificate("127.0.0.1").await.unwrap();

    assert_eq!(presented, Some(cert_der));
}

#[tokio::test]
async fn test_self_signed_leaf_is_accepted_and_parsed() {
    let (cert_der, key_der) = leaf((2025, 1, 1), (2025, 9, 1));
    let port = start_tls_server(cert_der, key_der).await;

    let probe = TlsProbe::new(port, Duration::from_secs(5)).unwrap();
    let der = probe.leaf_certificate("127.0.0.1").await.unwrap().unwrap();
    let validity = LeafValidity::from_der(&der).unwrap();

    assert_eq!(validity.not_before, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(validity.not_after, Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap());
}

#[tokio::test]
async fn test_matching_certificate_is_clean() {
    let (cert_der, key_der) = leaf((2025, 1, 1), (2025, 9, 1));
    let port = start_tls_server(cert_der, key_der).await;

    let verifier = LiveVerifier::new(Arc::new(TlsProbe::new(port, Duration::from_secs(5)).unwrap()));
    let actual = verifier
        .check("127.0.0.1", &record("2025-01-01T00:00:00", "2025-09-01T00:00:00"))
        .await;

    assert_eq!(actual, None);
}

#[tokio::test]
async fn test_not_after_mismatch_reports_error() {
    // Site already serves a renewed certificate
    let (cert_der, key_der) = leaf((2025, 1, 1), (2025, 12, 1));
    let port = start_tls_server(cert_der, key_der).await;

    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let mut sites = Dedupe::new(FilterPolicy::default(), now)
        .run(vec![record("2025-01-01T00:00:00", "2025-09-01T00:00:00")]);

    let verifier = LiveVerifier::new(Arc::new(TlsProbe::new(port, Duration::from_secs(5)).unwrap()));
    verifier.verify_all(&mut sites).await;

    let report = build_report(&sites);
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].actual.as_deref(), Some("NotAfter mismatch"));
    assert_eq!(report[0].severity, Severity::Error);
}

#[tokio::test]
async fn test_not_before_mismatch() {
    let (cert_der, key_der) = leaf((2024, 12, 1), (2025, 9, 1));
    let port = start_tls_server(cert_der, key_der).await;

    let verifier = LiveVerifier::new(Arc::new(TlsProbe::new(port, Duration::from_secs(5)).unwrap()));
    let actual = verifier
        .check("127.0.0.1", &record("2025-01-01T00:00:00", "2025-09-01T00:00:00"))
        .await;

    assert_eq!(actual.as_deref(), Some("NotBefore mismatch"));
}

#[tokio::test]
async fn test_dial_timeout_keeps_site_in_report() {
    // Accepts TCP but never completes a handshake
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let mut sites = Dedupe::new(FilterPolicy::default(), now)
        .run(vec![record("2025-01-01T00:00:00", "2025-09-01T00:00:00")]);

    let probe = TlsProbe::new(port, Duration::from_millis(300)).unwrap();
    LiveVerifier::new(Arc::new(probe)).verify_all(&mut sites).await;

    let report = build_report(&sites);
    assert_eq!(report.len(), 1);
    let actual = report[0].actual.as_deref().unwrap();
    assert!(actual.contains("timeout"), "{}", actual);
    assert_eq!(report[0].severity, Severity::Error);

    server.abort();
}
