use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::CacheBackend;

/// Usage accounting and billing-period reconciliation.
#[derive(Debug, Parser)]
#[command(name = "usage-ledger", version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a usage snapshot from a directory of collaborator payloads
    Snapshot {
        /// Directory holding individual-usage.json, invoice-YYYY-MM.json, ...
        #[arg(long)]
        fixtures: PathBuf,

        /// Session token; the subject claim keys the membership cache
        #[arg(long, env = "USAGE_LEDGER_SESSION_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Subject id to use when no token is available
        #[arg(long, conflicts_with = "token")]
        subject: Option<String>,

        /// Evaluate as of this instant instead of now
        #[arg(long)]
        now: Option<String>,

        /// Membership cache backend for this run
        #[arg(long, value_enum)]
        cache: Option<CacheBackend>,

        /// Directory for the membership cache
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the current and previous billing periods for a subscription start
    Periods {
        /// Subscription start (RFC 3339, YYYY-MM-DD or epoch)
        start: String,

        /// Evaluate as of this instant instead of now
        #[arg(long)]
        now: Option<String>,
    },

    /// Classify a single invoice description
    Parse {
        description: String,

        /// Line amount in cents
        #[arg(long, allow_hyphen_values = true)]
        cents: Option<i64>,
    },
}
