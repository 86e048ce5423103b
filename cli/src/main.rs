//! nsdctl – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und sendet genau einen
//! Befehl an den NSD Control-Port.
//!
//! ```bash
//! nsdctl status
//! nsdctl --json zonestatus example.com
//! nsdctl --config /etc/nsdctl.toml addzone example.com primary
//! nsdctl --host 192.0.2.1 --server-cert nsd_server.pem --raw stats_noreset
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use nsdctl::config::{CliConfig, VerbindungsEinstellungen, ENV_CONFIG, STANDARD_PFAD};
use nsdctl::{ausgabe, logging};
use nsdctl_client::{ControlClient, ControlError, Outcome};

/// Sendet einen Befehl an den NSD Control-Port und gibt die Antwort aus
#[derive(Parser, Debug)]
#[command(name = "nsdctl", version, about, long_about = None)]
struct Args {
    /// Konfigurationsdatei (Standard: $NSDCTL_CONFIG oder nsdctl.toml)
    #[arg(short, long, value_name = "DATEI")]
    config: Option<PathBuf>,

    /// Host des Control-Ports
    #[arg(long)]
    host: Option<String>,

    /// Port des Control-Ports
    #[arg(short, long)]
    port: Option<u16>,

    /// Client-Zertifikat (PEM)
    #[arg(long, value_name = "DATEI")]
    client_cert: Option<PathBuf>,

    /// Privater Schluessel zum Client-Zertifikat (PEM)
    #[arg(long, value_name = "DATEI")]
    client_key: Option<PathBuf>,

    /// Server- oder CA-Zertifikat (PEM) als Vertrauensanker
    #[arg(long, value_name = "DATEI")]
    server_cert: Option<PathBuf>,

    /// Zeitlimit pro Operation
    #[arg(long, value_name = "SEKUNDEN")]
    timeout: Option<u64>,

    /// Zertifikatspruefung abschalten (unsicher)
    #[arg(long)]
    insecure: bool,

    /// Rohantwort ohne Parsing ausgeben
    #[arg(long, conflicts_with = "json")]
    raw: bool,

    /// Geparste Antwort als JSON ausgeben
    #[arg(long)]
    json: bool,

    /// Befehl, z.B. status, zonestatus, addzone
    #[arg(value_name = "BEFEHL")]
    command: String,

    /// Argumente des Befehls
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Args {
    /// Angegebene Flags haben Vorrang vor der Konfigurationsdatei
    fn anwenden(&self, v: &mut VerbindungsEinstellungen) {
        if let Some(host) = &self.host {
            v.host = host.clone();
        }
        if let Some(port) = self.port {
            v.port = port;
        }
        if let Some(cert) = &self.client_cert {
            v.client_cert = cert.clone();
        }
        if let Some(key) = &self.client_key {
            v.client_key = key.clone();
        }
        if let Some(server_cert) = &self.server_cert {
            v.server_cert = Some(server_cert.clone());
        }
        if let Some(timeout) = self.timeout {
            v.timeout_secs = timeout;
        }
        if self.insecure {
            v.ssl_verify = false;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match ausfuehren(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(fehler = ?e, "nsdctl beendet mit Fehler");
            eprintln!("Fehler: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn ausfuehren(args: &Args) -> Result<()> {
    let config_pfad = args
        .config
        .clone()
        .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(STANDARD_PFAD));

    let mut config = CliConfig::laden(&config_pfad)?;
    args.anwenden(&mut config.verbindung);
    config.pruefen()?;

    logging::logging_initialisieren(&config.logging.level, &config.logging.format);

    if !config_pfad.exists() {
        tracing::warn!(
            pfad = %config_pfad.display(),
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad.display(),
        command = %args.command,
        "nsdctl gestartet"
    );

    let mut client =
        ControlClient::new(config.connection_params()).context("Client konnte nicht erstellt werden")?;

    if args.raw {
        let text = client.request_raw(&args.command, &args.args, None).await?;
        print!("{text}");
        if !text.is_empty() && !text.ends_with('\n') {
            println!();
        }
        return Ok(());
    }

    let antwort = match client.request(&args.command, &args.args, None).await {
        Ok(antwort) => antwort,
        Err(ControlError::Command { message, response }) => {
            if args.json {
                println!("{}", ausgabe::json(&response)?);
            }
            anyhow::bail!(message);
        }
        Err(e) => return Err(e.into()),
    };

    if antwort.outcome() == Outcome::Indeterminate {
        tracing::warn!(command = %args.command, "Unbekannter Befehl, Antwort wurde nicht bewertet");
    }

    if args.json {
        println!("{}", ausgabe::json(&antwort)?);
    } else {
        print!("{}", ausgabe::text(&antwort));
    }
    Ok(())
}
