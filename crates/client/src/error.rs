//! Fehlertypen fuer den Control-Client
//!
//! Geschlossene Taxonomie: jede Operation des Clients liefert genau eine
//! dieser Varianten. Transportfehler schliessen die Verbindung, bevor sie
//! zurueckgegeben werden.

use nsdctl_protocol::Response;
use thiserror::Error;

/// Alle moeglichen Fehler im Client-Crate
#[derive(Debug, Error)]
pub enum ControlError {
    /// Zertifikat oder Schluessel fehlt, ist unlesbar oder ungueltig
    #[error("Konfigurationsfehler: {0}")]
    Configuration(String),

    /// Namensaufloesung, Verbindungsaufbau oder Verbindung abgebrochen
    #[error("Verbindungsfehler: {0}")]
    Connection(String),

    #[error("Zeitlimit ueberschritten: {0}")]
    Timeout(String),

    /// TLS-Handshake fehlgeschlagen, Originalfehler von rustls
    #[error("TLS-Handshake fehlgeschlagen: {0}")]
    Tls(#[source] rustls::Error),

    /// Der Server hat den Befehl angenommen, meldet aber einen Fehler
    #[error("{message}")]
    Command {
        message: String,
        response: Box<Response>,
    },

    #[error("Ungueltige Eingabe: {0}")]
    InvalidInput(String),

    #[error("Protokollfehler: {0:#}")]
    Internal(#[from] anyhow::Error),
}

pub type ControlResult<T> = Result<T, ControlError>;

impl ControlError {
    /// Fehler nach denen ein erneuter Versuch sinnvoll sein kann
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }

    /// Geparste Antwort bei `Command`-Fehlern
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Command { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn command(command: &str, response: Response) -> Self {
        let mut message = format!("Befehl '{command}' fehlgeschlagen");
        if let Some(zeilen) = response.message() {
            if !zeilen.is_empty() {
                message.push_str(": ");
                message.push_str(&zeilen.join(" "));
            }
        }
        Self::Command {
            message,
            response: Box::new(response),
        }
    }
}
