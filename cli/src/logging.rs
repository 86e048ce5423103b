//! Logging der CLI (tracing-subscriber)
//!
//! Konfigurierbar per Umgebungsvariable, die Werte aus `[logging]` dienen als
//! Rueckfall:
//! - `NSDCTL_LOG_LEVEL`: Log-Level oder Filter-Direktiven
//! - `NSDCTL_LOG_FORMAT`: Format (text/json)
//!
//! Logs gehen nach stderr, stdout bleibt der Antwort vorbehalten.

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "NSDCTL_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "NSDCTL_LOG_FORMAT";

/// Richtet den globalen Subscriber ein; nur einmal pro Prozess aufrufen.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let format = wert_waehlen(std::env::var(ENV_LOG_FORMAT).ok(), format);

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .init();
        }
    }
}

/// Wert aus der Umgebung, falls gesetzt und nicht leer, sonst der konfigurierte
pub fn wert_waehlen(aus_env: Option<String>, konfiguriert: &str) -> String {
    aus_env
        .filter(|wert| !wert.trim().is_empty())
        .unwrap_or_else(|| konfiguriert.to_string())
}

/// Level, die `[logging] level` annehmen darf
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Ausgabeformate fuer `[logging] format`
pub const LOG_FORMATE: &[&str] = &["text", "json"];

/// Nur exakte Namen in Kleinschreibung; Filter-Direktiven gehen ueber
/// `NSDCTL_LOG_LEVEL`.
pub fn log_level_gueltig(level: &str) -> bool {
    LOG_LEVELS.contains(&level)
}

pub fn log_format_gueltig(format: &str) -> bool {
    LOG_FORMATE.contains(&format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_werte_werden_exakt_verglichen() {
        assert!(LOG_LEVELS.iter().all(|l| log_level_gueltig(l)));
        assert!(!log_level_gueltig("Warn"));
        assert!(!log_level_gueltig("nsdctl=debug"));
        assert!(log_format_gueltig("json"));
        assert!(!log_format_gueltig("pretty"));
    }

    #[test]
    fn umgebung_hat_vorrang() {
        assert_eq!(wert_waehlen(Some("json".into()), "text"), "json");
        assert_eq!(wert_waehlen(None, "text"), "text");
        assert_eq!(wert_waehlen(Some("  ".into()), "text"), "text");
    }
}
