use std::fs;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use ledger_app::{SourceError, SourceResult, UsageSource};
use ledger_core::{
    HardLimit, IndividualUsage, MonthlyInvoice, TeamDetails, TeamSpend, TeamsPayload,
    UsageBasedStatus,
};
use serde::de::DeserializeOwned;
use tracing::debug;

pub const INDIVIDUAL_USAGE_FILE: &str = "individual-usage.json";
pub const TEAMS_FILE: &str = "teams.json";
pub const TEAM_DETAILS_FILE: &str = "team-details.json";
pub const TEAM_SPEND_FILE: &str = "team-spend.json";
pub const USAGE_BASED_FILE: &str = "usage-based.json";
pub const HARD_LIMIT_FILE: &str = "hard-limit.json";

pub fn invoice_file_name(month: u32, year: i32) -> String {
    format!("invoice-{:04}-{:02}.json", year, month)
}

/// Serves collaborator payloads from JSON files in one directory.
///
/// A missing file fails the corresponding call with `NotFound`.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> SourceResult<T> {
        let path = self.dir.join(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(path.display().to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), "loaded fixture");
        Ok(serde_json::from_str(&contents)?)
    }
}

#[async_trait]
impl UsageSource for FixtureSource {
    async fn individual_usage(&self) -> SourceResult<IndividualUsage> {
        self.read(INDIVIDUAL_USAGE_FILE)
    }

    async fn monthly_invoice(&self, month: u32, year: i32) -> SourceResult<MonthlyInvoice> {
        self.read(&invoice_file_name(month, year))
    }

    async fn teams(&self) -> SourceResult<TeamsPayload> {
        self.read(TEAMS_FILE)
    }

    async fn team_details(&self, _team_id: i64) -> SourceResult<TeamDetails> {
        self.read(TEAM_DETAILS_FILE)
    }

    async fn team_spend(&self, _team_id: i64) -> SourceResult<TeamSpend> {
        self.read(TEAM_SPEND_FILE)
    }

    async fn usage_based_status(&self, _team_id: Option<i64>) -> SourceResult<UsageBasedStatus> {
        self.read(USAGE_BASED_FILE)
    }

    async fn hard_limit(&self, _team_id: Option<i64>) -> SourceResult<HardLimit> {
        self.read(HARD_LIMIT_FILE)
    }
}
