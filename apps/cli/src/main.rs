mod args;
mod config;
mod dirs;
mod fixtures;

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use ingest::{LineItemParser, UnknownModelDetector};
use ledger_app::{
    InMemoryMembershipStore, JsonFileMembershipStore, MembershipStore,
    SessionIdentity, SqliteMembershipStore, UsageEngine, parse_timestamp,
};
use ledger_core::{RawInvoiceLine, billing_periods};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use args::{Cli, Command};
use config::CacheBackend;
use fixtures::FixtureSource;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    match cli.command {
        Command::Snapshot {
            fixtures,
            token,
            subject,
            now,
            cache,
            data_dir,
            compact,
        } => {
            let config = config::load_or_create(cli.config.as_deref()).map_err(io::Error::other)?;
            if config.created {
                eprintln!("Created config at {}.", config.file.display());
            }
            let session = match (token, subject) {
                (Some(token), _) => SessionIdentity::from_token(&token),
                (None, Some(subject)) => SessionIdentity::with_subject(subject),
                (None, None) => SessionIdentity::anonymous(),
            };
            info!(
                subject = session.subject_id().unwrap_or("-"),
                user_id = session.user_id().unwrap_or("-"),
                "building usage snapshot"
            );
            let now = resolve_now(now.as_deref())?;
            let backend = cache.unwrap_or(config.config.cache);
            let store = open_store(backend, data_dir)?;
            let engine = UsageEngine::new(FixtureSource::new(fixtures), store, config.config.engine);
            let mut detector = UnknownModelDetector::new();
            let snapshot = engine.build_snapshot_at(&session, &mut detector, now).await?;
            print_json(&snapshot, compact)?;
        }
        Command::Periods { start, now } => {
            let start = parse_timestamp(&start)?;
            let now = resolve_now(now.as_deref())?;
            let periods = billing_periods(start, now).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "billing period out of range")
            })?;
            print_json(&periods, false)?;
        }
        Command::Parse { description, cents } => {
            let config = config::load_or_create(cli.config.as_deref()).map_err(io::Error::other)?;
            let parser = LineItemParser::with_known_models(&config.config.engine.known_models);
            let parsed = parser.parse(&RawInvoiceLine::new(description, cents));
            print_json(&parsed, false)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}

fn resolve_now(value: Option<&str>) -> CliResult<DateTime<Utc>> {
    match value {
        Some(value) => Ok(parse_timestamp(value)?),
        None => Ok(Utc::now()),
    }
}

fn open_store(
    backend: CacheBackend,
    data_dir: Option<PathBuf>,
) -> CliResult<Box<dyn MembershipStore>> {
    let resolved = dirs::resolve_data_dir(data_dir).map_err(io::Error::other)?;
    let Some(path) = resolved.cache_path(backend) else {
        return Ok(Box::new(InMemoryMembershipStore::new()));
    };
    std::fs::create_dir_all(&resolved.dir)?;
    info!(
        path = %path.display(),
        existing = resolved.matched_existing,
        "using membership cache"
    );
    let store: Box<dyn MembershipStore> = match backend {
        CacheBackend::Json => Box::new(JsonFileMembershipStore::new(path)),
        _ => Box::new(SqliteMembershipStore::open(path)?),
    };
    Ok(store)
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> CliResult<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}

