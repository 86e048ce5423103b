//! Antwort-Parser fuer das NSD Control-Protokoll
//!
//! Zustandslos: [`parse`] bildet (Befehlsname, Rohtext) deterministisch auf
//! eine [`Response`] ab. Die Auswahl der Auswertung haengt nur am Befehlsnamen.
//!
//! Alle Muster werden zeilenweise angewendet, `^` und `$` binden also an
//! Zeilengrenzen und nicht an den gesamten Text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::command::Command;
use crate::response::{Outcome, Response};
use crate::wire::decode_lossy;

/// `key: value`
static KV_DOPPELPUNKT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+):\s*(.+)$").expect("gueltige Regex"));

/// `key=value`
static KV_GLEICH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^=]+)=\s*(.+)$").expect("gueltige Regex"));

/// `3 zones` / `1 zone`, Gross-/Kleinschreibung egal
static ZONENANZAHL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+zones?").expect("gueltige Regex"));

/// Uebersetzt die Rohantwort eines Befehls in eine [`Response`].
///
/// Schlaegt nie fehl. Leere Eingaben ergeben eine fehlgeschlagene Antwort mit
/// Diagnose, unbekannte Befehle eine Antwort mit [`Outcome::Indeterminate`].
pub fn parse(command: &str, raw: &str) -> Response {
    if command.trim().is_empty() {
        return Response::failure("kein Befehlsname angegeben");
    }
    if raw.trim().is_empty() {
        return Response::failure(format!("leere Antwort auf '{command}'"));
    }

    match Command::from(command) {
        Command::Status => status(raw),
        Command::Stats | Command::StatsNoreset => stats(raw),
        Command::Zonestatus => zonestatus(raw),
        Command::Transfer | Command::ForceTransfer => transfer(raw),
        Command::PrintTsig => print_tsig(raw),
        Command::PrintCookieSecrets => print_cookie_secrets(raw),
        c if c.is_ok_command() => ok_check(raw),
        _ => Response::new(Outcome::Indeterminate, Some(zeilen(raw)), None),
    }
}

/// Wie [`parse`], fuer noch nicht dekodierte Bytes (UTF-8, notfalls mit
/// Ersatzzeichen).
pub fn parse_bytes(command: &str, raw: &[u8]) -> Response {
    let (text, _) = decode_lossy(raw.to_vec());
    parse(command, &text)
}

// ---------------------------------------------------------------------------
// Einzelne Befehle
// ---------------------------------------------------------------------------

fn status(raw: &str) -> Response {
    let data = key_values(raw, &KV_DOPPELPUNKT);
    let erfolg = data.contains_key("version");
    mit_daten(erfolg, raw, data)
}

fn stats(raw: &str) -> Response {
    let data = key_values(raw, &KV_GLEICH);
    let erfolg = data.contains_key("time.elapsed");
    mit_daten(erfolg, raw, data)
}

/// Abschnitte beginnen mit einer Kopfzeile ohne `:`/`=` oder mit
/// `zone: <name>` (NSD 4). Ein Feld namens `zone` unter einer Kopfzeile
/// oeffnet damit ebenfalls einen neuen Abschnitt.
fn zonestatus(raw: &str) -> Response {
    let mut zonen: BTreeMap<String, Value> = BTreeMap::new();
    let mut aktuell: Option<String> = None;

    for zeile in raw.lines().map(str::trim).filter(|z| !z.is_empty()) {
        if ist_abschnittskopf(zeile) {
            zonen.insert(zeile.to_string(), Value::Object(Map::new()));
            aktuell = Some(zeile.to_string());
            continue;
        }

        let Some((key, value)) = key_value(zeile, &KV_DOPPELPUNKT) else {
            continue;
        };

        // NSD 4 leitet jede Zone mit "zone: <name>" ein
        if key == "zone" {
            zonen.insert(value.clone(), Value::Object(Map::new()));
            aktuell = Some(value);
            continue;
        }

        if let Some(Value::Object(felder)) = aktuell.as_ref().and_then(|z| zonen.get_mut(z)) {
            felder.insert(key, Value::String(value));
        }
    }

    let erfolg = !zonen.is_empty();
    mit_daten(erfolg, raw, zonen)
}

fn transfer(raw: &str) -> Response {
    let ok = ok_check(raw);
    if !ok.is_success() {
        return ok;
    }

    let anzahl = ZONENANZAHL
        .captures(raw)
        .and_then(|c| c[1].parse::<u64>().ok())
        .map(Value::from)
        .unwrap_or(Value::Null);

    let mut data = BTreeMap::new();
    data.insert("zones".to_string(), anzahl);
    Response::new(Outcome::Success, ok.message().map(<[String]>::to_vec), Some(data))
}

fn print_tsig(raw: &str) -> Response {
    let mut schluessel: BTreeMap<String, Value> = BTreeMap::new();
    let mut aktuell: Option<String> = None;

    for zeile in raw.lines().map(str::trim).filter(|z| !z.is_empty()) {
        if !zeile.contains(':') {
            schluessel.insert(zeile.to_string(), Value::Object(Map::new()));
            aktuell = Some(zeile.to_string());
            continue;
        }

        if let Some((key, value)) = key_value(zeile, &KV_DOPPELPUNKT) {
            if let Some(Value::Object(felder)) =
                aktuell.as_ref().and_then(|k| schluessel.get_mut(k))
            {
                felder.insert(key, Value::String(value));
            }
        }
    }

    Response::new(Outcome::Success, None, Some(schluessel))
}

fn print_cookie_secrets(raw: &str) -> Response {
    let secrets: Vec<Value> = raw
        .lines()
        .filter_map(|zeile| key_value(zeile, &KV_GLEICH))
        .map(|(secret, status)| {
            let mut eintrag = Map::new();
            eintrag.insert("secret".to_string(), Value::String(secret));
            eintrag.insert("status".to_string(), Value::String(status));
            Value::Object(eintrag)
        })
        .collect();

    let mut data = BTreeMap::new();
    data.insert("secrets".to_string(), Value::Array(secrets));
    Response::new(Outcome::Success, None, Some(data))
}

/// Generische Pruefung fuer Befehle die nur `ok` zurueckmelden
fn ok_check(raw: &str) -> Response {
    let nachricht: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|z| !z.is_empty())
        .map(str::to_string)
        .collect();

    let erfolg = nachricht.iter().any(|z| z == "ok" || z.starts_with("ok,"));
    Response::new(outcome(erfolg), Some(nachricht), None)
}

// ---------------------------------------------------------------------------
// Hilfsfunktionen
// ---------------------------------------------------------------------------

fn outcome(erfolg: bool) -> Outcome {
    if erfolg {
        Outcome::Success
    } else {
        Outcome::Failure
    }
}

/// Antwort mit Daten; bei Misserfolg wird der Rohtext als Nachricht angehaengt,
/// damit die Fehlermeldung des Servers nicht verloren geht.
fn mit_daten(erfolg: bool, raw: &str, data: BTreeMap<String, Value>) -> Response {
    let nachricht = if erfolg { None } else { Some(zeilen(raw)) };
    Response::new(outcome(erfolg), nachricht, Some(data))
}

fn zeilen(raw: &str) -> Vec<String> {
    raw.trim().lines().map(str::to_string).collect()
}

fn ist_abschnittskopf(zeile: &str) -> bool {
    !zeile.contains(':') && !zeile.contains('=') && !zeile.starts_with('[')
}

fn key_value(zeile: &str, muster: &Regex) -> Option<(String, String)> {
    let c = muster.captures(zeile)?;
    let key = c[1].trim();
    let value = c[2].trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

fn key_values(raw: &str, muster: &Regex) -> BTreeMap<String, Value> {
    raw.lines()
        .filter_map(|zeile| key_value(zeile, muster))
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BEFEHLE: &[&str] = &[
        "addzone",
        "delzone",
        "changezone",
        "reconfig",
        "reload",
        "repattern",
        "log_reopen",
        "notify",
        "write",
        "verbosity",
        "add_tsig",
        "update_tsig",
        "del_tsig",
        "assoc_tsig",
        "add_cookie_secret",
        "drop_cookie_secret",
        "activate_cookie_secret",
        "stop",
    ];

    #[test]
    fn ok_befehle_mit_ok() {
        for cmd in OK_BEFEHLE {
            let r = parse(cmd, "ok\n");
            assert!(r.is_success(), "{cmd}");
            assert_eq!(r.message(), Some(&["ok".to_string()][..]));
        }
    }

    #[test]
    fn ok_befehle_ohne_ok() {
        for cmd in OK_BEFEHLE {
            let r = parse(cmd, "error zone example.com already exists\n");
            assert!(r.is_failure(), "{cmd}");
            let r = parse(cmd, "okay\nnot ok\n");
            assert!(r.is_failure(), "{cmd}");
        }
    }

    #[test]
    fn ok_mit_komma_und_leerzeilen() {
        let r = parse("reload", "\n  ok, 2 zones reloaded  \n\n");
        assert!(r.is_success());
        assert_eq!(r.message(), Some(&["ok, 2 zones reloaded".to_string()][..]));
    }

    #[test]
    fn status_beispiel() {
        let r = parse("status", "version: 4.3.1\nzonecount: 12");
        assert!(r.is_success());
        let data = r.data().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["version"], "4.3.1");
        assert_eq!(data["zonecount"], "12");
        assert!(r.message().is_none());
    }

    #[test]
    fn status_ohne_version_schlaegt_fehl() {
        let r = parse("status", "error could not connect\n");
        assert!(r.is_failure());
        assert_eq!(
            r.message(),
            Some(&["error could not connect".to_string()][..])
        );
    }

    #[test]
    fn status_mit_crlf_und_doppelpunkt_im_wert() {
        let r = parse("status", "version: 4.8.0\r\nstarted: 12:00:01\r\n");
        assert!(r.is_success());
        assert_eq!(r.get("version").unwrap(), "4.8.0");
        assert_eq!(r.get("started").unwrap(), "12:00:01");
    }

    #[test]
    fn stats_beispiel() {
        for cmd in ["stats", "stats_noreset"] {
            let r = parse(cmd, "time.elapsed=86400\nnum.queries=500");
            assert!(r.is_success(), "{cmd}");
            assert_eq!(r.get("time.elapsed").unwrap(), "86400");
            assert_eq!(r.get("num.queries").unwrap(), "500");
        }
    }

    #[test]
    fn stats_ohne_elapsed() {
        let r = parse("stats", "num.queries=500\n");
        assert!(r.is_failure());
        assert_eq!(r.get("num.queries").unwrap(), "500");
    }

    #[test]
    fn zonestatus_abschnitte() {
        let raw = "example.com\n\tstate: ok\n\tserved-serial: \"2024010101\"\nexample.org\n\tstate: refreshing\n";
        let r = parse("zonestatus", raw);
        assert!(r.is_success());
        let data = r.data().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["example.com"]["state"], "ok");
        assert_eq!(data["example.com"]["served-serial"], "\"2024010101\"");
        assert_eq!(data["example.org"]["state"], "refreshing");
    }

    #[test]
    fn zonestatus_nsd4_format() {
        let raw = "zone:\texample.com\n\tpattern: primary\n\tstate: primary\n";
        let r = parse("zonestatus", raw);
        assert!(r.is_success());
        assert_eq!(r.data().unwrap()["example.com"]["pattern"], "primary");
    }

    #[test]
    fn zonestatus_feld_zone_oeffnet_abschnitt() {
        let raw = "example.com\n\tzone: example.net\n\tstate: ok\n";
        let data = parse("zonestatus", raw).data().cloned().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["example.com"], serde_json::json!({}));
        assert_eq!(data["example.net"]["state"], "ok");
    }

    #[test]
    fn zonestatus_ignoriert_klammern_und_fehlt_ohne_zone() {
        let r = parse("zonestatus", "[notify]\nstate: ok\n");
        assert!(r.is_failure());
        assert!(r.data().unwrap().is_empty());

        let r = parse("zonestatus", "error zone not found\n");
        // Zeile ohne ':' und '=' zaehlt als Abschnittskopf
        assert!(r.is_success());
    }

    #[test]
    fn transfer_mit_zonenanzahl() {
        let r = parse("transfer", "ok\n3 zones transferred");
        assert!(r.is_success());
        assert_eq!(r.zone_count(), Some(3));

        let r = parse("force_transfer", "ok, 1 Zone scheduled\n");
        assert!(r.is_success());
        assert_eq!(r.zone_count(), Some(1));
    }

    #[test]
    fn transfer_ohne_anzahl() {
        let r = parse("transfer", "ok\n");
        assert!(r.is_success());
        assert_eq!(r.zone_count(), None);
        assert_eq!(r.get("zones"), Some(&Value::Null));

        let r = parse("transfer", "ok\n99999999999999999999999 zones\n");
        assert!(r.is_success());
        assert_eq!(r.zone_count(), None);
    }

    #[test]
    fn transfer_fehlgeschlagen() {
        let r = parse("transfer", "error zone not found\n");
        assert!(r.is_failure());
        assert!(r.data().is_none());
    }

    #[test]
    fn print_tsig_abschnitte() {
        let raw = "key1\nalgorithm: hmac-sha256\nsecret: abc=\nkey2\nalgorithm: hmac-sha1\n";
        let r = parse("print_tsig", raw);
        assert!(r.is_success());
        let data = r.data().unwrap();
        assert_eq!(data["key1"]["algorithm"], "hmac-sha256");
        assert_eq!(data["key1"]["secret"], "abc=");
        assert_eq!(data["key2"]["algorithm"], "hmac-sha1");
    }

    #[test]
    fn print_cookie_secrets_liste() {
        let r = parse("print_cookie_secrets", "aabbcc=active\nddeeff=staging\n");
        assert!(r.is_success());
        let secrets = r.get("secrets").unwrap().as_array().unwrap();
        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets[0]["secret"], "aabbcc");
        assert_eq!(secrets[0]["status"], "active");
        assert_eq!(secrets[1]["secret"], "ddeeff");
        assert_eq!(secrets[1]["status"], "staging");
    }

    #[test]
    fn unbekannter_befehl_ist_unbestimmt() {
        let r = parse("serverpid", "1234\n");
        assert_eq!(r.outcome(), Outcome::Indeterminate);
        assert_eq!(r.message(), Some(&["1234".to_string()][..]));
        assert!(r.data().is_none());
    }

    #[test]
    fn leere_eingaben() {
        let r = parse("status", "");
        assert!(r.is_failure());
        assert!(r.message().is_some());

        let r = parse("", "ok\n");
        assert!(r.is_failure());

        let r = parse("serverpid", "   \n");
        assert!(r.is_failure());
    }

    #[test]
    fn parse_ist_deterministisch() {
        let raw = "version: 4.3.1\nzonecount: 12";
        assert_eq!(parse("status", raw), parse("status", raw));
    }

    #[test]
    fn parse_bytes_mit_ungueltigem_utf8() {
        let r = parse_bytes("notify", b"ok\n\xff\xfe\n");
        assert!(r.is_success());
        assert_eq!(r.message().unwrap()[1], "\u{FFFD}\u{FFFD}");
    }
}
