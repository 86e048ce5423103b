//! Control-Client fuer NSD
//!
//! Ein Client haelt hoechstens eine Verbindung. Jede Anfrage sendet genau eine
//! Befehlszeile, liest bis der Server die Verbindung schliesst und gibt die
//! Verbindung danach frei. Das Protokoll kennt kein Ende-Kennzeichen, eine
//! zweite Antwort auf demselben Stream waere nicht abgrenzbar.
//!
//! ```rust,no_run
//! use nsdctl_client::{ConnectionParams, ControlClient};
//!
//! # async fn beispiel() -> nsdctl_client::ControlResult<()> {
//! let params = ConnectionParams::new("/etc/nsd/nsd_control.pem", "/etc/nsd/nsd_control.key")
//!     .with_server_cert("/etc/nsd/nsd_server.pem");
//! let mut client = ControlClient::new(params)?;
//! let status = client.status().await?;
//! println!("{:?}", status.get("version"));
//! # Ok(())
//! # }
//! ```

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use nsdctl_protocol::{build_frame, decode_lossy, parse, Command, Response};

use crate::connection::Connection;
use crate::error::{ControlError, ControlResult};
use crate::params::ConnectionParams;
use crate::tls;

const KEINE_ARGS: [&str; 0] = [];

/// Client fuer den NSD Control-Port
///
/// Nicht fuer gleichzeitige Nutzung gedacht: alle Operationen brauchen
/// `&mut self`. Parallele Aufrufer verwenden je einen eigenen Client.
pub struct ControlClient {
    params: ConnectionParams,
    verbindung: Option<Connection>,
}

impl ControlClient {
    /// Erstellt einen Client und prueft Zertifikat und Schluessel.
    ///
    /// Es wird noch keine Verbindung aufgebaut.
    pub fn new(params: ConnectionParams) -> ControlResult<Self> {
        params.validate()?;
        tracing::debug!(
            host = %params.host,
            port = params.port,
            cert = %params.client_cert.display(),
            key = %params.client_key.display(),
            "NSD-Control-Client initialisiert"
        );
        Ok(Self {
            params,
            verbindung: None,
        })
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn is_connected(&self) -> bool {
        self.verbindung.is_some()
    }

    /// Verbindet mit Host und Port aus den Parametern
    pub async fn connect(&mut self) -> ControlResult<()> {
        self.connect_to(None, None).await
    }

    /// Verbindet, optional mit abweichendem Host/Port.
    ///
    /// Abweichende Werte werden uebernommen und gelten auch fuer spaetere
    /// automatische Verbindungen. Eine bestehende Verbindung wird vorher
    /// geschlossen.
    pub async fn connect_to(&mut self, host: Option<&str>, port: Option<u16>) -> ControlResult<()> {
        if let Some(host) = host {
            self.params.host = host.to_string();
        }
        if let Some(port) = port {
            self.params.port = port;
        }

        if self.verbindung.is_some() {
            tracing::debug!("Bestehende Verbindung wird geschlossen");
            self.close().await;
        }

        let host = self.params.host.clone();
        let port = self.params.port;
        tracing::info!(%host, port, "Verbinde mit NSD Control-Port");

        let ergebnis = match tls::client_config(&self.params) {
            Ok(config) => Connection::open(&host, port, config, self.params.timeout).await,
            Err(e) => Err(e),
        };

        match ergebnis {
            Ok(verbindung) => {
                self.verbindung = Some(verbindung);
                Ok(())
            }
            Err(e) => {
                tracing::error!(%host, port, fehler = %e, "Verbindung fehlgeschlagen");
                Err(e)
            }
        }
    }

    /// Schliesst die Verbindung, falls offen. Mehrfacher Aufruf ist harmlos.
    pub async fn close(&mut self) {
        // Handle zuerst entfernen, danach erst abbauen
        let Some(verbindung) = self.verbindung.take() else {
            return;
        };
        tracing::debug!(peer = %verbindung.peer_addr(), "Schliesse Verbindung");
        verbindung.shutdown(self.params.timeout).await;
    }

    /// Verwirft die Verbindung ohne geordneten TLS-Abbau.
    ///
    /// Synchron, fuer Pfade auf denen nicht gewartet werden kann (`Drop`).
    pub fn abort(&mut self) {
        if let Some(verbindung) = self.verbindung.take() {
            tracing::debug!(peer = %verbindung.peer_addr(), "Verbindung verworfen");
        }
    }

    /// Verbindet und liefert einen Guard, der die Verbindung beim Verlassen
    /// des Scopes auf jeden Fall freigibt.
    pub async fn session(&mut self) -> ControlResult<Session<'_>> {
        self.connect().await?;
        Ok(Session { client: self })
    }

    /// Sendet einen beliebigen Befehl und parst die Antwort.
    ///
    /// `timeout` ersetzt das Zeitlimit fuer Senden und Empfangen nur fuer
    /// diesen Aufruf. Meldet die Antwort einen Fehler, wird
    /// [`ControlError::Command`] mit der geparsten Antwort zurueckgegeben.
    pub async fn request<S: AsRef<str>>(
        &mut self,
        command: &str,
        args: &[S],
        timeout: Option<Duration>,
    ) -> ControlResult<Response> {
        let raw = self.request_raw(command, args, timeout).await?;
        let antwort = parse(command, &raw);
        if antwort.is_failure() {
            let fehler = ControlError::command(command, antwort);
            tracing::debug!(command, fehler = %fehler, "Befehl fehlgeschlagen");
            return Err(fehler);
        }
        Ok(antwort)
    }

    /// Wie [`request`](Self::request), liefert aber den dekodierten Rohtext
    pub async fn request_raw<S: AsRef<str>>(
        &mut self,
        command: &str,
        args: &[S],
        timeout: Option<Duration>,
    ) -> ControlResult<String> {
        if command.trim().is_empty() {
            return Err(ControlError::InvalidInput(
                "Befehl darf nicht leer sein".into(),
            ));
        }

        if self.verbindung.is_none() {
            self.connect().await?;
        }
        // Die Anfrage besitzt die Verbindung ab hier; bei jedem Fehler ist der
        // Handle damit bereits geraeumt und der Socket wird beim Drop geschlossen.
        let mut verbindung = self.verbindung.take().ok_or_else(|| {
            ControlError::Connection("Nicht mit dem Control-Port verbunden".into())
        })?;

        let zeitlimit = timeout.unwrap_or(self.params.timeout);
        let frame = build_frame(command, args);
        tracing::debug!(command, frame = frame.trim_end(), "Sende Befehl");

        verbindung.write_frame(frame.as_bytes(), zeitlimit).await?;
        let bytes = verbindung
            .read_to_end(self.params.bufsize, zeitlimit)
            .await?;
        verbindung.shutdown(zeitlimit).await;

        let (text, ersetzt) = decode_lossy(bytes);
        if ersetzt {
            tracing::warn!(command, "Antwort ist kein gueltiges UTF-8, Ersatzzeichen eingefuegt");
        }

        if self.params.strip {
            Ok(text.trim().to_string())
        } else {
            Ok(text)
        }
    }

    /// Sendet einen bekannten Befehl
    pub async fn call<S: AsRef<str>>(&mut self, command: Command, args: &[S]) -> ControlResult<Response> {
        self.request(command.as_str(), args, None).await
    }

    async fn call_optional(&mut self, command: Command, arg: Option<&str>) -> ControlResult<Response> {
        match arg {
            Some(arg) => self.call(command, &[arg]).await,
            None => self.call(command, &KEINE_ARGS).await,
        }
    }

    // -----------------------------------------------------------------------
    // Bekannte Befehle
    // -----------------------------------------------------------------------

    pub async fn status(&mut self) -> ControlResult<Response> {
        self.call(Command::Status, &KEINE_ARGS).await
    }

    pub async fn stats(&mut self) -> ControlResult<Response> {
        self.call(Command::Stats, &KEINE_ARGS).await
    }

    pub async fn stats_noreset(&mut self) -> ControlResult<Response> {
        self.call(Command::StatsNoreset, &KEINE_ARGS).await
    }

    /// Status einer Zone oder aller Zonen
    pub async fn zonestatus(&mut self, zone: Option<&str>) -> ControlResult<Response> {
        self.call_optional(Command::Zonestatus, zone).await
    }

    pub async fn addzone(&mut self, zone: &str, pattern: &str) -> ControlResult<Response> {
        self.call(Command::Addzone, &[zone, pattern]).await
    }

    pub async fn delzone(&mut self, zone: &str) -> ControlResult<Response> {
        self.call(Command::Delzone, &[zone]).await
    }

    pub async fn changezone(&mut self, zone: &str, pattern: &str) -> ControlResult<Response> {
        self.call(Command::Changezone, &[zone, pattern]).await
    }

    pub async fn reload(&mut self, zone: Option<&str>) -> ControlResult<Response> {
        self.call_optional(Command::Reload, zone).await
    }

    pub async fn reconfig(&mut self) -> ControlResult<Response> {
        self.call(Command::Reconfig, &KEINE_ARGS).await
    }

    pub async fn notify(&mut self, zone: Option<&str>) -> ControlResult<Response> {
        self.call_optional(Command::Notify, zone).await
    }

    pub async fn transfer(&mut self, zone: Option<&str>) -> ControlResult<Response> {
        self.call_optional(Command::Transfer, zone).await
    }

    pub async fn force_transfer(&mut self, zone: Option<&str>) -> ControlResult<Response> {
        self.call_optional(Command::ForceTransfer, zone).await
    }

    pub async fn log_reopen(&mut self) -> ControlResult<Response> {
        self.call(Command::LogReopen, &KEINE_ARGS).await
    }

    pub async fn write(&mut self, zone: Option<&str>) -> ControlResult<Response> {
        self.call_optional(Command::Write, zone).await
    }

    pub async fn print_tsig(&mut self, key: Option<&str>) -> ControlResult<Response> {
        self.call_optional(Command::PrintTsig, key).await
    }

    pub async fn print_cookie_secrets(&mut self) -> ControlResult<Response> {
        self.call(Command::PrintCookieSecrets, &KEINE_ARGS).await
    }
}

impl std::fmt::Debug for ControlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlClient")
            .field("host", &self.params.host)
            .field("port", &self.params.port)
            .field("verbunden", &self.verbindung.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Scoped-Verbindung: verbunden beim Erzeugen, freigegeben beim Verlassen.
///
/// [`Session::finish`] baut die Verbindung geordnet ab. Wird der Guard auf
/// einem anderen Weg verlassen (Fehler, fruehes `return`, abgebrochener
/// Task), wird die Verbindung im `Drop` verworfen und der Socket geschlossen.
pub struct Session<'a> {
    client: &'a mut ControlClient,
}

impl Session<'_> {
    /// Geordneter Abbau der Verbindung
    pub async fn finish(mut self) {
        self.client.close().await;
    }
}

impl Deref for Session<'_> {
    type Target = ControlClient;

    fn deref(&self) -> &Self::Target {
        self.client
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.client
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.client.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (tempfile::TempDir, ControlClient) {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("c.pem");
        let key = dir.path().join("c.key");
        std::fs::write(&cert, "x").unwrap();
        std::fs::write(&key, "x").unwrap();
        let client = ControlClient::new(ConnectionParams::new(cert, key)).unwrap();
        (dir, client)
    }

    #[tokio::test]
    async fn close_ohne_verbindung() {
        let (_dir, mut client) = client();
        client.close().await;
        client.close().await;
        client.abort();
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn leerer_befehl_wird_abgelehnt() {
        let (_dir, mut client) = client();
        let err = client.request("  ", &KEINE_ARGS, None).await.unwrap_err();
        assert!(matches!(err, ControlError::InvalidInput(_)));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn ungueltiges_pem_faellt_beim_verbinden_auf() {
        let (_dir, mut client) = client();
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, ControlError::Configuration(_)));
        assert!(!client.is_connected());
    }

    #[test]
    fn debug_zeigt_ziel() {
        let (_dir, client) = client();
        let text = format!("{client:?}");
        assert!(text.contains("127.0.0.1"));
        assert!(text.contains("8952"));
    }
}
