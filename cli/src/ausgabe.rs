//! Ausgabe einer geparsten Antwort als Text oder JSON

use std::fmt;

use nsdctl_protocol::Response;
use serde_json::Value;

/// Menschenlesbare Darstellung: erst die Meldungszeilen, dann die Daten.
///
/// Verschachtelte Abschnitte (`zonestatus`, `print_tsig`) werden eingerueckt,
/// Listen (`print_cookie_secrets`) als ein Eintrag pro Zeile ausgegeben.
pub fn text(antwort: &Response) -> String {
    Textform(antwort).to_string()
}

struct Textform<'a>(&'a Response);

impl fmt::Display for Textform<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for zeile in self.0.message().unwrap_or_default() {
            writeln!(f, "{zeile}")?;
        }

        for (key, wert) in self.0.data().into_iter().flatten() {
            match wert {
                Value::Object(felder) => {
                    writeln!(f, "{key}:")?;
                    for (feld, inhalt) in felder {
                        writeln!(f, "\t{feld}: {}", skalar(inhalt))?;
                    }
                }
                Value::Array(eintraege) => {
                    writeln!(f, "{key}:")?;
                    for eintrag in eintraege {
                        writeln!(f, "\t{}", skalar(eintrag))?;
                    }
                }
                _ => writeln!(f, "{key}: {}", skalar(wert))?,
            }
        }
        Ok(())
    }
}

/// Antwort als eingeruecktes JSON
pub fn json(antwort: &Response) -> serde_json::Result<String> {
    serde_json::to_string_pretty(antwort)
}

fn skalar(wert: &Value) -> String {
    match wert {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        // {"secret": .., "status": ..} -> "secret=.. status=.."
        Value::Object(felder) => felder
            .iter()
            .map(|(k, v)| format!("{k}={}", skalar(v)))
            .collect::<Vec<_>>()
            .join(" "),
        anderes => anderes.to_string(),
    }
}
