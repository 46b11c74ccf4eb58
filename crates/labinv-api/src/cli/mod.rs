//! CLI command definitions and dispatch for the `labinv` binary.
//!
//! Uses clap derive macros for argument parsing. Commands follow a
//! noun-verb pattern (e.g., `labinv user create`, `labinv import chemicals`).

pub mod status;
pub mod transfer;
pub mod user;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Laboratory inventory of chemicals and studies.
#[derive(Parser)]
#[command(name = "labinv", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit structured JSON logs.
    #[arg(long, global = true, env = "LABINV_LOG_JSON")]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "LABINV_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on. Defaults to the configured port.
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to. Defaults to the configured host.
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage user accounts.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Import records from a CSV file.
    Import {
        /// What the file contains.
        kind: RecordKind,

        /// Path to the CSV file.
        file: PathBuf,
    },

    /// Export records to a CSV file.
    Export {
        /// What to export.
        kind: RecordKind,

        /// Output path. Defaults to a dated file name in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record counts and storage location.
    Status,
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user account.
    Create {
        #[arg(long)]
        username: String,

        /// Password. Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,

        /// Grant the ADMIN role.
        #[arg(long)]
        admin: bool,
    },

    /// List user accounts.
    #[command(alias = "ls")]
    List,

    /// Set a new password for an account.
    #[command(name = "reset-password")]
    ResetPassword {
        username: String,

        /// New password. Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },
}

/// Record type for import and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    #[value(alias = "chemical")]
    Chemicals,
    #[value(alias = "study")]
    Studies,
}

impl RecordKind {
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Chemicals => "chemicals",
            RecordKind::Studies => "studies",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_import_and_user_commands() {
        let cli = Cli::parse_from(["labinv", "import", "study", "in.csv", "--json"]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Import { kind: RecordKind::Studies, ref file } if file == &PathBuf::from("in.csv")
        ));

        let cli = Cli::parse_from(["labinv", "-vv", "user", "create", "--username", "jo", "--admin"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::User { action: UserCommand::Create { ref username, password: None, admin: true } }
                if username == "jo"
        ));
    }
}
