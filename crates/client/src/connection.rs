//! Eine einzelne TLS-Verbindung zum Control-Port
//!
//! Kapselt genau einen Socket. Aufbau, Schreiben der Befehlszeile, Lesen bis
//! zum Verbindungsende und Abbau. Alle Operationen sind durch ein Zeitlimit
//! begrenzt; Fehler werden hier in die [`ControlError`]-Taxonomie einsortiert.

use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls::ClientConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::error::{ControlError, ControlResult};
use crate::tls::server_name;

/// Offene, authentifizierte TLS-Sitzung
pub struct Connection {
    stream: TlsStream<TcpStream>,
    peer: SocketAddr,
}

impl Connection {
    /// Loest `host` auf, baut die TCP-Verbindung auf und fuehrt den
    /// TLS-Handshake durch.
    pub async fn open(
        host: &str,
        port: u16,
        tls: Arc<ClientConfig>,
        zeitlimit: Duration,
    ) -> ControlResult<Self> {
        let sni = server_name(host)?;
        let (tcp, peer) = tcp_verbinden(host, port, zeitlimit).await?;

        let connector = TlsConnector::from(tls);
        let stream = match timeout(zeitlimit, connector.connect(sni, tcp)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(handshake_fehler(e, host, port)),
            Err(_) => {
                return Err(ControlError::Timeout(format!(
                    "TLS-Handshake mit {host}:{port} nach {zeitlimit:?} abgebrochen"
                )))
            }
        };

        tracing::debug!(%peer, "TLS-Verbindung hergestellt");
        Ok(Self { stream, peer })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Sendet eine komplette Befehlszeile in einem Stueck
    pub async fn write_frame(&mut self, frame: &[u8], zeitlimit: Duration) -> ControlResult<()> {
        let senden = async {
            self.stream.write_all(frame).await?;
            self.stream.flush().await
        };
        match timeout(zeitlimit, senden).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(io_fehler(e, "Senden")),
            Err(_) => Err(ControlError::Timeout(format!(
                "Senden nach {zeitlimit:?} abgebrochen"
            ))),
        }
    }

    /// Liest bis der Server die Verbindung schliesst.
    ///
    /// Ein Ende ohne TLS close_notify (`UnexpectedEof`) gilt ebenfalls als
    /// regulaeres Ende der Antwort.
    pub async fn read_to_end(&mut self, bufsize: usize, zeitlimit: Duration) -> ControlResult<Vec<u8>> {
        let mut antwort = Vec::new();
        let mut puffer = vec![0u8; bufsize];

        loop {
            let n = match timeout(zeitlimit, self.stream.read(&mut puffer)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) if e.kind() == ErrorKind::UnexpectedEof => 0,
                Ok(Err(e)) => return Err(io_fehler(e, "Empfangen")),
                Err(_) => {
                    return Err(ControlError::Timeout(format!(
                        "Lesen nach {zeitlimit:?} abgebrochen"
                    )))
                }
            };
            if n == 0 {
                break;
            }
            antwort.extend_from_slice(&puffer[..n]);
        }

        tracing::debug!(peer = %self.peer, bytes = antwort.len(), "Antwort empfangen");
        Ok(antwort)
    }

    /// Versucht einen geordneten Abbau (close_notify + TCP-Shutdown).
    ///
    /// Fehler werden nur protokolliert, der Socket wird in jedem Fall mit
    /// `self` freigegeben.
    pub async fn shutdown(mut self, zeitlimit: Duration) {
        match timeout(zeitlimit, self.stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(peer = %self.peer, fehler = %e, "Fehler beim Shutdown"),
            Err(_) => tracing::debug!(peer = %self.peer, "Shutdown abgebrochen (Zeitlimit)"),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("peer", &self.peer).finish()
    }
}

/// Versucht jede aufgeloeste Adresse der Reihe nach
async fn tcp_verbinden(
    host: &str,
    port: u16,
    zeitlimit: Duration,
) -> ControlResult<(TcpStream, SocketAddr)> {
    let adressen: Vec<SocketAddr> = match timeout(zeitlimit, lookup_host((host, port))).await {
        Ok(Ok(adressen)) => adressen.collect(),
        Ok(Err(e)) => {
            return Err(ControlError::Connection(format!(
                "Hostname {host} konnte nicht aufgeloest werden: {e}"
            )))
        }
        Err(_) => {
            return Err(ControlError::Timeout(format!(
                "Namensaufloesung fuer {host} nach {zeitlimit:?} abgebrochen"
            )))
        }
    };

    let mut letzter_fehler = ControlError::Connection(format!(
        "Hostname {host} lieferte keine Adressen"
    ));

    for adresse in adressen {
        match tcp_verbinden_mit(adresse, zeitlimit).await {
            Ok(stream) => return Ok((stream, adresse)),
            Err(fehler) => {
                tracing::debug!(%adresse, %fehler, "Verbindungsversuch fehlgeschlagen");
                letzter_fehler = fehler;
            }
        }
    }
    Err(letzter_fehler)
}

async fn tcp_verbinden_mit(adresse: SocketAddr, zeitlimit: Duration) -> ControlResult<TcpStream> {
    let socket = if adresse.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .and_then(|s| s.set_keepalive(true).map(|_| s))
    .map_err(|e| ControlError::Connection(format!("Socket konnte nicht erstellt werden: {e}")))?;

    match timeout(zeitlimit, socket.connect(adresse)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => Err(ControlError::Connection(
            format!("Verbindung von {adresse} abgelehnt - laeuft NSD?"),
        )),
        Ok(Err(e)) if e.kind() == ErrorKind::TimedOut => Err(ControlError::Timeout(format!(
            "Verbindung zu {adresse} nach {zeitlimit:?} abgebrochen"
        ))),
        Ok(Err(e)) => Err(ControlError::Connection(format!(
            "Verbindung zu {adresse} fehlgeschlagen: {e}"
        ))),
        Err(_) => Err(ControlError::Timeout(format!(
            "Verbindung zu {adresse} nach {zeitlimit:?} abgebrochen"
        ))),
    }
}

/// TLS-Fehler bleiben als `rustls::Error` erhalten, alles andere wird wie ein
/// Verbindungsfehler behandelt.
fn handshake_fehler(e: io::Error, host: &str, port: u16) -> ControlError {
    match rustls_fehler(&e) {
        Some(tls) => ControlError::Tls(tls),
        None if e.kind() == ErrorKind::TimedOut => {
            ControlError::Timeout(format!("TLS-Handshake mit {host}:{port}: {e}"))
        }
        None => ControlError::Connection(format!("TLS-Handshake mit {host}:{port}: {e}")),
    }
}

fn rustls_fehler(e: &io::Error) -> Option<rustls::Error> {
    e.get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        .cloned()
}

/// Ordnet I/O-Fehler waehrend einer Anfrage ein.
///
/// Unter TLS 1.3 kommt die Ablehnung des Client-Zertifikats erst nach dem
/// Handshake als Alert beim Lesen an; auch dann bleibt der rustls-Fehler erhalten.
fn io_fehler(e: io::Error, vorgang: &str) -> ControlError {
    if let Some(tls) = rustls_fehler(&e) {
        return ControlError::Tls(tls);
    }
    match e.kind() {
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
            ControlError::Connection(format!("Verbindung beim {vorgang} verloren: {e}"))
        }
        ErrorKind::TimedOut | ErrorKind::WouldBlock => {
            ControlError::Timeout(format!("Zeitlimit beim {vorgang}: {e}"))
        }
        _ => ControlError::Internal(anyhow::Error::new(e).context(format!("Fehler beim {vorgang}"))),
    }
}
