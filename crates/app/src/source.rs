use async_trait::async_trait;
use ledger_core::{
    HardLimit, IndividualUsage, MonthlyInvoice, TeamDetails, TeamSpend, TeamsPayload,
    UsageBasedStatus,
};

use crate::error::SourceResult;

/// Collaborator that fetches raw payloads from the billing backend.
///
/// Authentication, transport, retries and timeouts belong to implementors.
#[async_trait]
pub trait UsageSource: Send + Sync {
    async fn individual_usage(&self) -> SourceResult<IndividualUsage>;

    async fn monthly_invoice(&self, month: u32, year: i32) -> SourceResult<MonthlyInvoice>;

    async fn teams(&self) -> SourceResult<TeamsPayload>;

    async fn team_details(&self, team_id: i64) -> SourceResult<TeamDetails>;

    async fn team_spend(&self, team_id: i64) -> SourceResult<TeamSpend>;

    async fn usage_based_status(&self, team_id: Option<i64>) -> SourceResult<UsageBasedStatus>;

    async fn hard_limit(&self, team_id: Option<i64>) -> SourceResult<HardLimit>;
}
