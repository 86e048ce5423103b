//! CLI-Konfiguration
//!
//! Wird aus einer TOML-Datei geladen. Alle Felder haben Standardwerte, die
//! einer Standardinstallation von NSD entsprechen; ohne Konfigurationsdatei
//! ist der Client damit auf dem NSD-Host direkt lauffaehig.

use std::path::{Path, PathBuf};
use std::time::Duration;

use nsdctl_client::{ConnectionParams, DEFAULT_BUFSIZE, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};

use crate::logging::{log_format_gueltig, log_level_gueltig};

/// Umgebungsvariable mit dem Pfad der Konfigurationsdatei
pub const ENV_CONFIG: &str = "NSDCTL_CONFIG";

/// Konfigurationsdatei, wenn weder `--config` noch `NSDCTL_CONFIG` gesetzt ist
pub const STANDARD_PFAD: &str = "nsdctl.toml";

/// Vollstaendige CLI-Konfiguration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Verbindung zum Control-Port
    pub verbindung: VerbindungsEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Verbindungs-Einstellungen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsEinstellungen {
    pub host: String,
    pub port: u16,
    /// Client-Zertifikat (PEM)
    pub client_cert: PathBuf,
    /// Privater Schluessel zum Client-Zertifikat (PEM)
    pub client_key: PathBuf,
    /// Server- oder CA-Zertifikat (PEM), optional
    pub server_cert: Option<PathBuf>,
    /// Zeitlimit pro Operation in Sekunden
    pub timeout_secs: u64,
    pub bufsize: usize,
    /// `false` schaltet die Zertifikatspruefung ab (unsicher!)
    pub ssl_verify: bool,
    pub strip: bool,
}

impl Default for VerbindungsEinstellungen {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            client_cert: "/etc/nsd/nsd_control.pem".into(),
            client_key: "/etc/nsd/nsd_control.key".into(),
            server_cert: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            bufsize: DEFAULT_BUFSIZE,
            ssl_verify: true,
            strip: false,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl CliConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt).map_err(|e| {
                anyhow::anyhow!("Konfigurationsfehler in '{}': {e}", pfad.display())
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{}' nicht lesbar: {e}",
                pfad.display()
            )),
        }
    }

    /// Prueft Werte, die erst beim Start auffallen wuerden
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            anyhow::bail!("Ungueltiger Log-Level '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            anyhow::bail!("Ungueltiges Log-Format '{}'", self.logging.format);
        }
        if self.verbindung.timeout_secs == 0 {
            anyhow::bail!("timeout_secs muss groesser als 0 sein");
        }
        Ok(())
    }

    /// Baut die Verbindungsparameter fuer den Client
    pub fn connection_params(&self) -> ConnectionParams {
        let v = &self.verbindung;
        let params = ConnectionParams::new(&v.client_cert, &v.client_key)
            .with_host(&v.host)
            .with_port(v.port)
            .with_bufsize(v.bufsize)
            .with_timeout(Duration::from_secs(v.timeout_secs))
            .with_ssl_verify(v.ssl_verify)
            .with_strip(v.strip);

        match &v.server_cert {
            Some(server_cert) => params.with_server_cert(server_cert),
            None => params,
        }
    }
}
