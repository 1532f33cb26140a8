mod payloads;
mod period;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use payloads::{
    HardLimit, IndividualUsage, MembershipCacheRecord, ModelUsage, MonthlyInvoice, TeamDetails,
    TeamMember, TeamMemberSpend, TeamSpend, TeamSummary, TeamsPayload, UsageBasedStatus,
};
pub use period::{BillingPeriod, BillingPeriods, billing_periods, shift_months};

/// Model id assigned to lines that could not be attributed to a known model.
pub const UNKNOWN_MODEL: &str = "unknown";
pub const TOOL_CALLS_MODEL: &str = "tool calls";

/// One billed line as it appears in a monthly invoice payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInvoiceLine {
    pub description: String,
    #[serde(default)]
    pub cents: Option<i64>,
}

impl RawInvoiceLine {
    pub fn new(description: impl Into<String>, cents: Option<i64>) -> Self {
        Self {
            description: description.into(),
            cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedUsageItem {
    pub request_count: u64,
    pub model_id: String,
    pub cost_dollars: f64,
    pub cost_per_request: f64,
    pub is_discounted: bool,
    pub source_description: String,
}

impl ParsedUsageItem {
    pub fn is_unknown_model(&self) -> bool {
        self.model_id == UNKNOWN_MODEL
    }
}

/// Synthetic running-total line emitted for every mid-month prepayment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidMonthLine {
    pub description: String,
    pub amount_dollars: f64,
    pub running_total_dollars: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodUsage {
    pub period: BillingPeriod,
    pub items: Vec<ParsedUsageItem>,
    pub mid_month_payment: f64,
    pub mid_month_lines: Vec<MidMonthLine>,
    pub has_unpaid_mid_month_invoice: bool,
    pub total_cost_dollars: f64,
    pub unresolved_models: Vec<String>,
}

impl PeriodUsage {
    pub fn empty(period: BillingPeriod) -> Self {
        Self {
            period,
            items: Vec::new(),
            mid_month_payment: 0.0,
            mid_month_lines: Vec::new(),
            has_unpaid_mid_month_invoice: false,
            total_cost_dollars: 0.0,
            unresolved_models: Vec::new(),
        }
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn unpaid_dollars(&self) -> f64 {
        unpaid_balance(self.total_cost_dollars, self.mid_month_payment)
    }
}

/// Remaining balance after prepayments, floored at zero.
pub fn unpaid_balance(total_cost: f64, prepaid: f64) -> f64 {
    let unpaid = total_cost - prepaid;
    if unpaid > 0.0 { unpaid } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumRequestCounter {
    pub current: u64,
    pub limit: u64,
    pub period_start: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivePeriod {
    Current,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageBasedPricing {
    pub enabled: bool,
    pub hard_limit_dollars: Option<f64>,
}

/// Normalized accounting view produced by one snapshot build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub current_period: PeriodUsage,
    pub previous_period: PeriodUsage,
    pub premium_requests: PremiumRequestCounter,
    pub is_team_sourced: bool,
    pub team_id: Option<i64>,
    pub team_spend_cents: Option<i64>,
    pub active_period: ActivePeriod,
    pub actual_cost_dollars: f64,
    pub unpaid_dollars: f64,
    pub usage_based_pricing: Option<UsageBasedPricing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_model_report: Option<Vec<String>>,
    pub generated_at: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn active_usage(&self) -> &PeriodUsage {
        match self.active_period {
            ActivePeriod::Current => &self.current_period,
            ActivePeriod::Previous => &self.previous_period,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembershipRecord {
    pub subject_id: String,
    pub is_team_member: bool,
    pub team_id: Option<i64>,
    pub team_user_id: Option<i64>,
    pub period_anchor: DateTime<Utc>,
    pub last_checked: DateTime<Utc>,
}

impl TeamMembershipRecord {
    pub fn individual(
        subject_id: impl Into<String>,
        period_anchor: DateTime<Utc>,
        last_checked: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            is_team_member: false,
            team_id: None,
            team_user_id: None,
            period_anchor,
            last_checked,
        }
    }

    /// Team id and team user id, present only for confirmed team members.
    pub fn team_ids(&self) -> Option<(i64, i64)> {
        if !self.is_team_member {
            return None;
        }
        Some((self.team_id?, self.team_user_id?))
    }
}
