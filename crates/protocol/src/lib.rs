//! nsdctl-protocol – NSD Control-Protokoll ohne I/O
//!
//! Enthaelt alles was sich ohne Socket beschreiben laesst:
//! - `command`: bekannte Befehle des Control-Ports
//! - `wire`: Aufbau (und Zerlegung) einer Befehlszeile
//! - `response`: strukturiertes Ergebnis eines Befehls
//! - `parser`: Uebersetzung der Rohantwort in eine [`Response`]

pub mod command;
pub mod parser;
pub mod response;
pub mod wire;

pub use command::Command;
pub use parser::{parse, parse_bytes};
pub use response::{Outcome, Response};
pub use wire::{
    build_frame, decode_lossy, parse_frame, Frame, FrameError, PROTOCOL_TAG, PROTOCOL_VERSION,
};
