//! Wire-Format des NSD Control-Ports
//!
//! Eine Anfrage ist genau eine Zeile:
//!
//! ```text
//! NSDCT<version> <befehl> [<arg> ...]\n
//! ```
//!
//! Die Antwort hat kein eigenes Framing. Sie endet, wenn der Server die
//! Verbindung schliesst. Pro Verbindung wird deshalb nur ein Befehl gesendet.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Praefix jeder Befehlszeile
pub const PROTOCOL_TAG: &str = "NSDCT";

/// Version des Control-Protokolls, die dieser Client spricht
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Eine zerlegte Befehlszeile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub version: u32,
    pub command: String,
    pub args: Vec<String>,
}

/// Fehler beim Zerlegen einer Befehlszeile
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Befehlszeile endet nicht mit Newline")]
    KeinZeilenende,

    #[error("Unbekanntes Protokoll-Praefix: {0}")]
    UnbekanntesPraefix(String),

    #[error("Ungueltige Protokollversion: {0}")]
    UngueltigeVersion(String),

    #[error("Befehlsname fehlt")]
    KeinBefehl,
}

/// Baut die Befehlszeile fuer `command` mit den gegebenen Argumenten.
///
/// Argumente werden unveraendert uebernommen und nur durch ein Leerzeichen
/// getrennt. Es findet keine Validierung oder Maskierung statt.
pub fn build_frame<S: AsRef<str>>(command: &str, args: &[S]) -> String {
    let mut zeile = format!("{PROTOCOL_TAG}{PROTOCOL_VERSION} {command}");
    for arg in args {
        zeile.push(' ');
        zeile.push_str(arg.as_ref());
    }
    zeile.push('\n');
    zeile
}

/// Zerlegt eine Befehlszeile wieder in ihre Bestandteile.
///
/// Gegenstueck zu [`build_frame`]; der Client selbst braucht das nur fuer
/// Diagnose und Tests.
pub fn parse_frame(line: &str) -> Result<Frame, FrameError> {
    let inhalt = line.strip_suffix('\n').ok_or(FrameError::KeinZeilenende)?;
    let mut teile = inhalt.split(' ');

    let kopf = teile.next().unwrap_or_default();
    let version = kopf
        .strip_prefix(PROTOCOL_TAG)
        .ok_or_else(|| FrameError::UnbekanntesPraefix(kopf.to_string()))?;
    let version = version
        .parse::<u32>()
        .map_err(|_| FrameError::UngueltigeVersion(version.to_string()))?;

    let command = match teile.next() {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => return Err(FrameError::KeinBefehl),
    };

    Ok(Frame {
        version,
        command,
        args: teile.map(str::to_string).collect(),
    })
}

/// Dekodiert eine Antwort als UTF-8.
///
/// Ungueltige Sequenzen werden durch U+FFFD ersetzt statt den Aufruf scheitern
/// zu lassen. Der zweite Wert meldet, ob ersetzt werden musste.
pub fn decode_lossy(bytes: Vec<u8>) -> (String, bool) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, false),
        Err(e) => (String::from_utf8_lossy(e.as_bytes()).into_owned(), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_ohne_argumente() {
        let args: [&str; 0] = [];
        assert_eq!(build_frame("status", &args), "NSDCT1 status\n");
    }

    #[test]
    fn frame_mit_argument() {
        assert_eq!(
            build_frame("notify", &["example.com"]),
            "NSDCT1 notify example.com\n"
        );
    }

    #[test]
    fn addzone_frame_hin_und_zurueck() {
        let zeile = build_frame("addzone", &["example.com", "primary"]);
        assert_eq!(zeile, "NSDCT1 addzone example.com primary\n");

        let frame = parse_frame(&zeile).unwrap();
        assert_eq!(frame.version, PROTOCOL_VERSION);
        assert_eq!(frame.command, "addzone");
        assert_eq!(frame.args, vec!["example.com", "primary"]);
    }

    #[test]
    fn argumente_werden_nicht_maskiert() {
        let zeile = build_frame("zonestatus", &[String::from("a b")]);
        assert_eq!(zeile, "NSDCT1 zonestatus a b\n");
    }

    #[test]
    fn parse_frame_fehlerfaelle() {
        assert_eq!(parse_frame("NSDCT1 status"), Err(FrameError::KeinZeilenende));
        assert_eq!(
            parse_frame("UBCT1 status\n"),
            Err(FrameError::UnbekanntesPraefix("UBCT1".into()))
        );
        assert_eq!(
            parse_frame("NSDCTx status\n"),
            Err(FrameError::UngueltigeVersion("x".into()))
        );
        assert_eq!(parse_frame("NSDCT1\n"), Err(FrameError::KeinBefehl));
    }

    #[test]
    fn dekodierung_mit_ersatzzeichen() {
        assert_eq!(decode_lossy(b"ok\n".to_vec()), ("ok\n".to_string(), false));

        let (text, ersetzt) = decode_lossy(b"zone \xc3\x28".to_vec());
        assert!(ersetzt);
        assert!(text.starts_with("zone "));
        assert!(text.contains('\u{FFFD}'));
    }
}
