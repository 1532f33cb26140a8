#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ledger_app::{SourceError, SourceResult, UsageSource};
use ledger_core::{
    HardLimit, IndividualUsage, MonthlyInvoice, TeamDetails, TeamSpend, TeamsPayload,
    UsageBasedStatus,
};

/// Canned collaborator; absent payloads fail with `NotFound`.
#[derive(Default)]
pub struct StubSource {
    pub individual: Option<IndividualUsage>,
    pub invoices: HashMap<(u32, i32), MonthlyInvoice>,
    pub teams: Option<TeamsPayload>,
    pub team_details: Option<TeamDetails>,
    pub team_spend: Option<TeamSpend>,
    pub usage_based: Option<UsageBasedStatus>,
    pub hard_limit: Option<HardLimit>,
    pub team_lookups: AtomicUsize,
    pub invoice_fetches: AtomicUsize,
}

fn canned<T: Clone>(value: &Option<T>, what: &str) -> SourceResult<T> {
    value
        .clone()
        .ok_or_else(|| SourceError::NotFound(what.to_string()))
}

#[async_trait]
impl UsageSource for StubSource {
    async fn individual_usage(&self) -> SourceResult<IndividualUsage> {
        canned(&self.individual, "individual usage")
    }

    async fn monthly_invoice(&self, month: u32, year: i32) -> SourceResult<MonthlyInvoice> {
        self.invoice_fetches.fetch_add(1, Ordering::SeqCst);
        self.invoices
            .get(&(month, year))
            .cloned()
            .ok_or_else(|| SourceError::Transport(format!("invoice {}-{:02} unavailable", year, month)))
    }

    async fn teams(&self) -> SourceResult<TeamsPayload> {
        self.team_lookups.fetch_add(1, Ordering::SeqCst);
        canned(&self.teams, "teams")
    }

    async fn team_details(&self, _team_id: i64) -> SourceResult<TeamDetails> {
        canned(&self.team_details, "team details")
    }

    async fn team_spend(&self, _team_id: i64) -> SourceResult<TeamSpend> {
        canned(&self.team_spend, "team spend")
    }

    async fn usage_based_status(&self, _team_id: Option<i64>) -> SourceResult<UsageBasedStatus> {
        canned(&self.usage_based, "usage-based status")
    }

    async fn hard_limit(&self, _team_id: Option<i64>) -> SourceResult<HardLimit> {
        canned(&self.hard_limit, "hard limit")
    }
}

/// Subscription anchored on the 31st; at `now()` the current period starts
/// 2025-03-31 and the previous one 2025-02-28.
pub fn subscription_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap()
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 20, 9, 0, 0).unwrap()
}

pub fn individual(num_requests: u64) -> IndividualUsage {
    serde_json::from_value(serde_json::json!({
        "gpt-4": {"numRequests": num_requests, "numTokens": 0, "maxRequestUsage": 500},
        "gpt-3.5-turbo": {"numRequests": 4, "numTokens": 0, "maxRequestUsage": null},
        "startOfMonth": "2025-01-31T12:00:00.000Z"
    }))
    .expect("individual usage")
}

pub fn invoice(raw: &str) -> MonthlyInvoice {
    serde_json::from_str(raw).expect("invoice")
}

pub fn current_invoice() -> MonthlyInvoice {
    invoice(
        r#"{"items": [
            {"description": "142 token-based usage calls to claude-4-sonnet, totalling: $9.94", "cents": 994},
            {"description": "3 extra fast premium requests (haiku)", "cents": 150},
            {"description": "Mid-month usage paid", "cents": -500}
        ], "hasUnpaidMidMonthInvoice": true}"#,
    )
}

pub fn previous_invoice() -> MonthlyInvoice {
    invoice(
        r#"{"items": [
            {"description": "300 gpt-4 requests * 4 cents per such request", "cents": 1200},
            {"description": "Pro", "cents": 2000}
        ]}"#,
    )
}

pub fn team_spend(user_id: i64, cents: i64) -> TeamSpend {
    serde_json::from_value(serde_json::json!({
        "teamMemberSpend": [
            {"userId": 1, "name": "Admin", "email": "admin@example.com", "role": "owner", "spendCents": 99999, "fastPremiumRequests": 0},
            {"userId": user_id, "name": "Dev", "email": "dev@example.com", "role": "member", "spendCents": cents, "fastPremiumRequests": 250, "hardLimitOverrideDollars": 0}
        ],
        "totalMembers": 2
    }))
    .expect("team spend")
}

/// Individual subscriber with both invoices available.
pub fn individual_source() -> StubSource {
    let mut invoices = HashMap::new();
    invoices.insert((3, 2025), current_invoice());
    invoices.insert((2, 2025), previous_invoice());
    StubSource {
        individual: Some(individual(212)),
        invoices,
        teams: Some(TeamsPayload::default()),
        usage_based: Some(UsageBasedStatus {
            usage_based_premium_requests: true,
        }),
        hard_limit: Some(HardLimit {
            hard_limit: Some(150.0),
        }),
        ..StubSource::default()
    }
}

/// Team member 42 of team 7 with team spend available.
pub fn team_source() -> StubSource {
    StubSource {
        teams: Some(serde_json::from_str(r#"{"teams":[{"id":7,"name":"Platform"}]}"#).expect("teams")),
        team_details: Some(
            serde_json::from_str(r#"{"userId":42,"teamMembers":[{"id":42,"name":"Dev"}]}"#)
                .expect("team details"),
        ),
        team_spend: Some(team_spend(42, 2150)),
        ..individual_source()
    }
}
