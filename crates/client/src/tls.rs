//! TLS-Konfiguration fuer den Control-Port (mutual TLS)
//!
//! Der Client weist sich mit Zertifikat und Schluessel aus. Vertraut wird den
//! WebPKI-Roots und optional einem eigenen Server-/CA-Zertifikat, mit dem sich
//! auf eine private CA pinnen laesst (NSD erzeugt per `nsd-control-setup`
//! selbstsignierte Zertifikate).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pemfile::{certs, private_key};

use crate::error::{ControlError, ControlResult};
use crate::params::ConnectionParams;

/// Baut die rustls-Konfiguration aus den Verbindungsparametern.
///
/// Die PEM-Dateien werden bei jedem Aufruf neu gelesen, damit ausgetauschte
/// Zertifikate ohne neuen Client greifen.
pub fn client_config(params: &ConnectionParams) -> ControlResult<Arc<ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| ControlError::Configuration(format!("TLS-Konfiguration: {e}")))?;

    let cert_chain = load_certificates(&params.client_cert)?;
    let private_key = load_private_key(&params.client_key)?;

    let builder = if params.ssl_verify {
        builder.with_root_certificates(root_store(params.server_cert.as_deref())?)
    } else {
        tracing::warn!(
            host = %params.host,
            "Zertifikatspruefung deaktiviert (ssl_verify = false), Verbindung ist nicht authentifiziert"
        );
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(InsecureCertVerifier::new(provider)))
    };

    let config = builder
        .with_client_auth_cert(cert_chain, private_key)
        .map_err(|e| ControlError::Configuration(format!("Client-Zertifikat ungueltig: {e}")))?;

    Ok(Arc::new(config))
}

/// SNI-Name fuer den Handshake; IP-Adressen sind erlaubt
pub fn server_name(host: &str) -> ControlResult<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|e| ControlError::Connection(format!("Ungueltiger Hostname '{host}': {e}")))
}

fn root_store(server_cert: Option<&Path>) -> ControlResult<RootCertStore> {
    let mut roots = RootCertStore::empty();
    // webpki-roots einbinden
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if let Some(pfad) = server_cert {
        for cert in load_certificates(pfad)? {
            roots.add(cert).map_err(|e| {
                ControlError::Configuration(format!(
                    "Server-Zertifikat '{}' nicht verwendbar: {e}",
                    pfad.display()
                ))
            })?;
        }
    }
    Ok(roots)
}

fn pem_reader(pfad: &Path) -> ControlResult<BufReader<File>> {
    File::open(pfad).map(BufReader::new).map_err(|e| {
        ControlError::Configuration(format!("'{}' nicht lesbar: {e}", pfad.display()))
    })
}

pub(crate) fn load_certificates(pfad: &Path) -> ControlResult<Vec<CertificateDer<'static>>> {
    let mut reader = pem_reader(pfad)?;
    let chain = certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            ControlError::Configuration(format!(
                "Zertifikat-Parsing fehlgeschlagen ({}): {e}",
                pfad.display()
            ))
        })?;

    if chain.is_empty() {
        return Err(ControlError::Configuration(format!(
            "Keine Zertifikate in '{}' gefunden",
            pfad.display()
        )));
    }
    Ok(chain)
}

pub(crate) fn load_private_key(pfad: &Path) -> ControlResult<PrivateKeyDer<'static>> {
    let mut reader = pem_reader(pfad)?;
    private_key(&mut reader)
        .map_err(|e| {
            ControlError::Configuration(format!(
                "Schluessel-Parsing fehlgeschlagen ({}): {e}",
                pfad.display()
            ))
        })?
        .ok_or_else(|| {
            ControlError::Configuration(format!(
                "Kein privater Schluessel in '{}' gefunden",
                pfad.display()
            ))
        })
}

/// Verifier ohne Zertifikats- und Hostnamenpruefung (`ssl_verify = false`).
///
/// Die Handshake-Signaturen werden weiterhin geprueft, nur die Kette zum
/// Vertrauensanker und der Name im Zertifikat nicht.
#[derive(Debug)]
struct InsecureCertVerifier {
    provider: Arc<CryptoProvider>,
}

impl InsecureCertVerifier {
    fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for InsecureCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
