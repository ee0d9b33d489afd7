//! # certreg CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use certreg_cli::commands::{
    cmd_admin, cmd_issue, cmd_pending, cmd_recover, cmd_revoke, cmd_verify, cmd_whoami,
    failure_lines,
};
use certreg_cli::{default_pending_file, exit};
use certreg_cli::keys::cmd_keygen;
use certreg_client::{
    ClientConfig, HttpTransport, IdentitySession, KeyPairAgent, RegistryClient,
};
use certreg_registry::CertificateFields;

/// Academic certificate registry CLI.
///
/// Issues, verifies, and revokes certificates against a certreg-api server.
/// Mutating commands are signed with the key given by `--key`.
#[derive(Parser, Debug)]
#[command(name = "certreg", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Registry API base URL. Defaults to $CERTREG_URL or http://127.0.0.1:8080.
    #[arg(long, global = true)]
    url: Option<String>,

    /// Path to a hex Ed25519 seed file written by `certreg keygen`.
    #[arg(long, global = true)]
    key: Option<PathBuf>,

    /// File tracking requests whose outcome is unknown. Defaults to
    /// `<key>.pending.json` next to the key file.
    #[arg(long, global = true)]
    pending: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new Ed25519 key pair.
    Keygen {
        /// Output directory for the key files.
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
        /// Prefix for the key filenames.
        #[arg(long, default_value = "certreg")]
        prefix: String,
    },

    #[command(flatten)]
    Registry(RegistryCommand),
}

/// Commands that talk to a registry server.
#[derive(Subcommand, Debug)]
enum RegistryCommand {
    /// Show the identity of the configured key.
    Whoami,

    /// Show the registry admin identity.
    Admin,

    /// Issue a certificate (admin only).
    Issue {
        /// Student name.
        student_name: String,
        /// Course.
        course: String,
        /// Issuing institution.
        institution: String,
    },

    /// Verify a certificate by id.
    Verify {
        /// Certificate id, 0x followed by 64 hex characters.
        id: String,
    },

    /// Revoke a certificate (admin only).
    Revoke {
        /// Certificate id.
        id: String,
    },

    /// Look up the committed record of a transaction.
    Recover {
        /// Transaction id.
        tx_id: String,
    },

    /// List requests whose outcome is unknown.
    Pending {
        /// Stop tracking this transaction id.
        #[arg(long)]
        discard: Option<String>,
        /// Stop tracking requests at least this many seconds old.
        #[arg(long)]
        expire_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let command = match cli.command {
        Commands::Keygen { output, prefix } => {
            return match cmd_keygen(&output, &prefix) {
                Ok(report) => ExitCode::from(report.emit()),
                Err(e) => {
                    eprintln!("error: {e:#}");
                    ExitCode::from(exit::FAILURE)
                }
            };
        }
        Commands::Registry(command) => command,
    };

    let pending = cli.pending.or_else(|| cli.key.as_deref().map(default_pending_file));
    let client = match build_client(cli.url.as_deref(), cli.key.as_deref(), pending.as_deref()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(exit::FAILURE);
        }
    };

    let result = match command {
        RegistryCommand::Whoami => cmd_whoami(&client).await,
        RegistryCommand::Admin => cmd_admin(&client).await,
        RegistryCommand::Issue {
            student_name,
            course,
            institution,
        } => {
            cmd_issue(
                &client,
                CertificateFields::new(student_name, course, institution),
            )
            .await
        }
        RegistryCommand::Verify { id } => cmd_verify(&client, &id).await,
        RegistryCommand::Revoke { id } => cmd_revoke(&client, &id).await,
        RegistryCommand::Recover { tx_id } => cmd_recover(&client, &tx_id).await,
        RegistryCommand::Pending {
            discard,
            expire_secs,
        } => cmd_pending(&client, discard.as_deref(), expire_secs),
    };

    match result {
        Ok(report) => ExitCode::from(report.emit()),
        Err(e) => {
            tracing::debug!("{e:?}");
            for line in failure_lines(&client, &e) {
                eprintln!("{line}");
            }
            ExitCode::from(exit::code_for(&e))
        }
    }
}

fn build_client(
    url: Option<&str>,
    key: Option<&Path>,
    pending: Option<&Path>,
) -> anyhow::Result<RegistryClient> {
    let config = match url {
        Some(url) => ClientConfig::for_url(url)?,
        None => ClientConfig::from_env()?,
    };
    tracing::debug!(url = %config.base_url, "registry endpoint");

    let session = match key {
        Some(path) => IdentitySession::new(Arc::new(
            KeyPairAgent::from_key_file(path)
                .with_context(|| format!("loading key {}", path.display()))?,
        )),
        None => IdentitySession::without_agent(),
    };

    let transport = HttpTransport::new(&config)?;
    let client = RegistryClient::new(session, Arc::new(transport));
    match pending {
        Some(path) => Ok(client.with_pending_file(path)?),
        None => Ok(client),
    }
}
