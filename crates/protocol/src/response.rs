//! Strukturiertes Ergebnis eines Control-Befehls

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ergebnis-Status einer Antwort
///
/// `Indeterminate` heisst nicht "fehlgeschlagen": der Befehl ist dem Parser
/// unbekannt und die Antwort wurde nicht bewertet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    Indeterminate,
}

/// Geparste Antwort auf genau einen Befehl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    success: Outcome,
    message: Option<Vec<String>>,
    data: Option<BTreeMap<String, Value>>,
}

impl Response {
    pub fn new(
        success: Outcome,
        message: Option<Vec<String>>,
        data: Option<BTreeMap<String, Value>>,
    ) -> Self {
        Self {
            success,
            message,
            data,
        }
    }

    /// Fehlgeschlagene Antwort mit einer einzelnen Diagnosezeile
    pub fn failure(diagnose: impl Into<String>) -> Self {
        Self::new(Outcome::Failure, Some(vec![diagnose.into()]), None)
    }

    pub fn outcome(&self) -> Outcome {
        self.success
    }

    pub fn is_success(&self) -> bool {
        self.success == Outcome::Success
    }

    pub fn is_failure(&self) -> bool {
        self.success == Outcome::Failure
    }

    pub fn message(&self) -> Option<&[String]> {
        self.message.as_deref()
    }

    pub fn data(&self) -> Option<&BTreeMap<String, Value>> {
        self.data.as_ref()
    }

    /// Einzelner Eintrag aus `data`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }

    /// Anzahl transferierter Zonen (nur `transfer` / `force_transfer`)
    pub fn zone_count(&self) -> Option<u64> {
        self.get("zones").and_then(Value::as_u64)
    }
}

impl fmt::Display for Response {
    /// Nachrichtenzeilen, durch Newline getrennt
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(zeilen) => f.write_str(&zeilen.join("\n")),
            None => Ok(()),
        }
    }
}
