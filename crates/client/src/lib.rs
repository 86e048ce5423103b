//! nsdctl-client – Client fuer den NSD Control-Port
//!
//! TLS-gesicherter Transport (mutual TLS) fuer das zeilenbasierte
//! Control-Protokoll von NSD:
//! - `params`: Verbindungsparameter und ihre Pruefung
//! - `tls`: Zertifikate, Vertrauensanker, rustls-Konfiguration
//! - `connection`: genau eine TLS-Verbindung (Senden, Lesen bis EOF, Abbau)
//! - `client`: [`ControlClient`] mit Anfragen, bekannten Befehlen und [`Session`]
//! - `error`: Fehlertaxonomie
//!
//! Das Parsen der Antworten uebernimmt `nsdctl-protocol`.

pub mod client;
pub mod connection;
pub mod error;
pub mod params;
pub mod tls;

pub use client::{ControlClient, Session};
pub use error::{ControlError, ControlResult};
pub use params::{
    ConnectionParams, DEFAULT_BUFSIZE, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT,
    MAX_BUFSIZE,
};

// Bequeme Re-Exports
pub use nsdctl_protocol::{Command, Outcome, Response};
