//! Befehle des NSD Control-Ports
//!
//! Die bekannten Befehle sind als Enum modelliert. Alles andere laeuft ueber
//! [`Command::Other`] und wird unveraendert an den Server geschickt.

use std::fmt;
use std::str::FromStr;

/// Ein Befehl des Control-Protokolls
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    Status,
    Stats,
    StatsNoreset,
    Zonestatus,
    Transfer,
    ForceTransfer,
    PrintTsig,
    PrintCookieSecrets,
    Addzone,
    Delzone,
    Changezone,
    Reconfig,
    Reload,
    Repattern,
    LogReopen,
    Notify,
    Write,
    Verbosity,
    AddTsig,
    UpdateTsig,
    DelTsig,
    AssocTsig,
    AddCookieSecret,
    DropCookieSecret,
    ActivateCookieSecret,
    Stop,
    /// Befehl ohne eigene Variante (z.B. neuere Protokollversionen)
    Other(String),
}

impl Command {
    /// Name des Befehls wie er auf der Leitung steht
    pub fn as_str(&self) -> &str {
        match self {
            Self::Status => "status",
            Self::Stats => "stats",
            Self::StatsNoreset => "stats_noreset",
            Self::Zonestatus => "zonestatus",
            Self::Transfer => "transfer",
            Self::ForceTransfer => "force_transfer",
            Self::PrintTsig => "print_tsig",
            Self::PrintCookieSecrets => "print_cookie_secrets",
            Self::Addzone => "addzone",
            Self::Delzone => "delzone",
            Self::Changezone => "changezone",
            Self::Reconfig => "reconfig",
            Self::Reload => "reload",
            Self::Repattern => "repattern",
            Self::LogReopen => "log_reopen",
            Self::Notify => "notify",
            Self::Write => "write",
            Self::Verbosity => "verbosity",
            Self::AddTsig => "add_tsig",
            Self::UpdateTsig => "update_tsig",
            Self::DelTsig => "del_tsig",
            Self::AssocTsig => "assoc_tsig",
            Self::AddCookieSecret => "add_cookie_secret",
            Self::DropCookieSecret => "drop_cookie_secret",
            Self::ActivateCookieSecret => "activate_cookie_secret",
            Self::Stop => "stop",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Befehle deren Erfolg nur mit einem schlichten `ok` bestaetigt wird
    pub fn is_ok_command(&self) -> bool {
        matches!(
            self,
            Self::Addzone
                | Self::Delzone
                | Self::Changezone
                | Self::Reconfig
                | Self::Reload
                | Self::Repattern
                | Self::LogReopen
                | Self::Notify
                | Self::Write
                | Self::Verbosity
                | Self::AddTsig
                | Self::UpdateTsig
                | Self::DelTsig
                | Self::AssocTsig
                | Self::AddCookieSecret
                | Self::DropCookieSecret
                | Self::ActivateCookieSecret
                | Self::Stop
        )
    }

    /// Alle Befehle mit eigener Variante
    pub fn known() -> &'static [Command] {
        KNOWN
    }
}

const KNOWN: &[Command] = &[
    Command::Status,
    Command::Stats,
    Command::StatsNoreset,
    Command::Zonestatus,
    Command::Transfer,
    Command::ForceTransfer,
    Command::PrintTsig,
    Command::PrintCookieSecrets,
    Command::Addzone,
    Command::Delzone,
    Command::Changezone,
    Command::Reconfig,
    Command::Reload,
    Command::Repattern,
    Command::LogReopen,
    Command::Notify,
    Command::Write,
    Command::Verbosity,
    Command::AddTsig,
    Command::UpdateTsig,
    Command::DelTsig,
    Command::AssocTsig,
    Command::AddCookieSecret,
    Command::DropCookieSecret,
    Command::ActivateCookieSecret,
    Command::Stop,
];

impl From<&str> for Command {
    fn from(name: &str) -> Self {
        Self::known()
            .iter()
            .find(|c| c.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Self::Other(name.to_string()))
    }
}

impl FromStr for Command {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bekannte_namen_werden_erkannt() {
        for cmd in Command::known() {
            assert_eq!(&Command::from(cmd.as_str()), cmd);
        }
    }

    #[test]
    fn unbekannter_name_wird_other() {
        let cmd = Command::from("serverpid");
        assert_eq!(cmd, Command::Other("serverpid".into()));
        assert_eq!(cmd.as_str(), "serverpid");
        assert!(!cmd.is_ok_command());
    }

    #[test]
    fn ok_befehle_enthalten_zonenverwaltung() {
        for name in ["addzone", "delzone", "reconfig", "notify", "log_reopen"] {
            assert!(Command::from(name).is_ok_command(), "{name}");
        }
        assert!(!Command::Status.is_ok_command());
        assert!(!Command::Transfer.is_ok_command());
    }

    #[test]
    fn gross_kleinschreibung_zaehlt() {
        assert_eq!(Command::from("Status"), Command::Other("Status".into()));
    }
}
