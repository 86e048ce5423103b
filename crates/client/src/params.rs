//! Verbindungsparameter des Control-Clients

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ControlError, ControlResult};

/// Standard-Host des Control-Ports
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Standard-Port des NSD Control-Ports
pub const DEFAULT_PORT: u16 = 8952;

/// Groesse eines einzelnen Lesevorgangs
pub const DEFAULT_BUFSIZE: usize = 8192;

/// Obergrenze fuer `bufsize`, der Lesepuffer wird in voller Groesse angelegt
pub const MAX_BUFSIZE: usize = 1024 * 1024;

/// Zeitlimit fuer Verbindungsaufbau und jede einzelne I/O-Operation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameter fuer Verbindungen zum Control-Port
///
/// Nach dem Erzeugen des Clients unveraenderlich, nur Host und Port koennen
/// beim Verbinden ueberschrieben werden.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionParams {
    /// Client-Zertifikat (PEM), z.B. `nsd_control.pem`
    pub client_cert: PathBuf,
    /// Privater Schluessel zum Client-Zertifikat (PEM)
    pub client_key: PathBuf,
    /// Server- oder CA-Zertifikat (PEM) als zusaetzlicher Vertrauensanker
    pub server_cert: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub bufsize: usize,
    pub timeout: Duration,
    /// `false` schaltet Zertifikats- und Hostnamenpruefung ab (unsicher!)
    pub ssl_verify: bool,
    /// Whitespace am Anfang und Ende der Rohantwort entfernen
    pub strip: bool,
}

impl ConnectionParams {
    pub fn new(client_cert: impl Into<PathBuf>, client_key: impl Into<PathBuf>) -> Self {
        Self {
            client_cert: client_cert.into(),
            client_key: client_key.into(),
            server_cert: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            bufsize: DEFAULT_BUFSIZE,
            timeout: DEFAULT_TIMEOUT,
            ssl_verify: true,
            strip: false,
        }
    }

    pub fn with_server_cert(mut self, server_cert: impl Into<PathBuf>) -> Self {
        self.server_cert = Some(server_cert.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_bufsize(mut self, bufsize: usize) -> Self {
        self.bufsize = bufsize;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_ssl_verify(mut self, ssl_verify: bool) -> Self {
        self.ssl_verify = ssl_verify;
        self
    }

    pub fn with_strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    /// Prueft die Parameter ohne Netzwerkzugriff.
    ///
    /// Zertifikat und Schluessel muessen existieren und lesbar sein. Alle
    /// Dateisystemfehler werden zu [`ControlError::Configuration`].
    pub fn validate(&self) -> ControlResult<()> {
        datei_pruefen(&self.client_cert, "Zertifikatsdatei")?;
        datei_pruefen(&self.client_key, "Schluesseldatei")?;
        if let Some(server_cert) = &self.server_cert {
            datei_pruefen(server_cert, "Server-Zertifikatsdatei")?;
        }

        if self.bufsize == 0 {
            return Err(ControlError::Configuration(
                "Puffergroesse muss groesser als 0 sein".into(),
            ));
        }
        if self.bufsize > MAX_BUFSIZE {
            return Err(ControlError::Configuration(format!(
                "Puffergroesse {} ueberschreitet das Maximum von {MAX_BUFSIZE} Bytes",
                self.bufsize
            )));
        }
        if self.timeout.is_zero() {
            return Err(ControlError::Configuration(
                "Zeitlimit muss groesser als 0 sein".into(),
            ));
        }
        Ok(())
    }
}

fn datei_pruefen(pfad: &Path, art: &str) -> ControlResult<()> {
    if !pfad.exists() {
        return Err(ControlError::Configuration(format!(
            "{art} nicht gefunden: {}",
            pfad.display()
        )));
    }
    std::fs::read(pfad).map(|_| ()).map_err(|e| {
        ControlError::Configuration(format!(
            "{art} '{}' nicht lesbar: {e}",
            pfad.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dateien() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("client.pem");
        let key = dir.path().join("client.key");
        std::fs::write(&cert, "cert").unwrap();
        std::fs::write(&key, "key").unwrap();
        (dir, cert, key)
    }

    #[test]
    fn standardwerte() {
        let p = ConnectionParams::new("a.pem", "a.key");
        assert_eq!(p.host, "127.0.0.1");
        assert_eq!(p.port, 8952);
        assert_eq!(p.bufsize, 8192);
        assert_eq!(p.timeout, Duration::from_secs(30));
        assert!(p.ssl_verify);
        assert!(!p.strip);
        assert!(p.server_cert.is_none());
    }

    #[test]
    fn gueltige_dateien() {
        let (_dir, cert, key) = dateien();
        assert!(ConnectionParams::new(cert, key).validate().is_ok());
    }

    #[test]
    fn fehlendes_zertifikat() {
        let (dir, _cert, key) = dateien();
        let err = ConnectionParams::new(dir.path().join("fehlt.pem"), key)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ControlError::Configuration(_)));
        assert!(err.to_string().contains("Zertifikatsdatei nicht gefunden"));
    }

    #[test]
    fn fehlender_schluessel_und_server_cert() {
        let (dir, cert, key) = dateien();
        let err = ConnectionParams::new(&cert, dir.path().join("fehlt.key"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ControlError::Configuration(_)));

        let err = ConnectionParams::new(cert, key)
            .with_server_cert(dir.path().join("server.pem"))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("Server-Zertifikatsdatei"));
    }

    #[test]
    fn verzeichnis_ist_nicht_lesbar() {
        let (dir, _cert, key) = dateien();
        let err = ConnectionParams::new(dir.path(), key).validate().unwrap_err();
        assert!(matches!(err, ControlError::Configuration(_)));
    }

    #[test]
    fn puffer_obergrenze() {
        let (_dir, cert, key) = dateien();
        let p = ConnectionParams::new(&cert, &key).with_bufsize(MAX_BUFSIZE);
        assert!(p.validate().is_ok());

        let err = ConnectionParams::new(cert, key)
            .with_bufsize(usize::MAX)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ControlError::Configuration(_)));
        assert!(err.to_string().contains("Maximum"));
    }

    #[test]
    fn puffer_und_zeitlimit_null() {
        let (_dir, cert, key) = dateien();
        let p = ConnectionParams::new(&cert, &key).with_bufsize(0);
        assert!(matches!(p.validate(), Err(ControlError::Configuration(_))));
        let p = ConnectionParams::new(cert, key).with_timeout(Duration::ZERO);
        assert!(matches!(p.validate(), Err(ControlError::Configuration(_))));
    }
}
