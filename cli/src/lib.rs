//! nsdctl – Kommandozeilen-Client fuer den NSD Control-Port
//!
//! Die Bibliothek stellt Konfiguration, Logging-Setup und Ausgabeformate
//! bereit; `main.rs` verbindet sie mit den Argumenten der Kommandozeile.

pub mod ausgabe;
pub mod config;
pub mod logging;
