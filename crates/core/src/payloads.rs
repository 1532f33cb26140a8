use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{RawInvoiceLine, TeamMembershipRecord};

/// Per-model request counters from the individual usage endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    #[serde(default)]
    pub num_requests: u64,
    #[serde(default)]
    pub max_request_usage: Option<u64>,
    #[serde(default)]
    pub num_tokens: u64,
}

/// Individual usage payload. Model entries use dynamic keys next to `startOfMonth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualUsage {
    pub start_of_month: DateTime<Utc>,
    #[serde(flatten)]
    pub models: BTreeMap<String, Value>,
}

impl IndividualUsage {
    /// Counters for `model`, or `None` when the entry is absent or malformed.
    pub fn model(&self, model: &str) -> Option<ModelUsage> {
        let value = self.models.get(model)?;
        serde_json::from_value(value.clone()).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyInvoice {
    #[serde(default)]
    pub items: Vec<RawInvoiceLine>,
    #[serde(default)]
    pub has_unpaid_mid_month_invoice: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamsPayload {
    #[serde(default)]
    pub teams: Vec<TeamSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetails {
    pub user_id: i64,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberSpend {
    pub user_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub spend_cents: i64,
    #[serde(default)]
    pub fast_premium_requests: u64,
    #[serde(default)]
    pub hard_limit_override_dollars: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSpend {
    #[serde(default)]
    pub team_member_spend: Vec<TeamMemberSpend>,
    #[serde(default)]
    pub total_members: u64,
}

impl TeamSpend {
    pub fn member(&self, user_id: i64) -> Option<&TeamMemberSpend> {
        self.team_member_spend
            .iter()
            .find(|entry| entry.user_id == user_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBasedStatus {
    #[serde(default)]
    pub usage_based_premium_requests: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardLimit {
    #[serde(default)]
    pub hard_limit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipCacheRecord {
    pub user_id: i64,
    pub jwt_sub: String,
    pub is_team_member: bool,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_checked: DateTime<Utc>,
    pub start_of_month: DateTime<Utc>,
}

impl From<&TeamMembershipRecord> for MembershipCacheRecord {
    fn from(record: &TeamMembershipRecord) -> Self {
        Self {
            user_id: record.team_user_id.unwrap_or(0),
            jwt_sub: record.subject_id.clone(),
            is_team_member: record.is_team_member,
            team_id: record.team_id,
            last_checked: record.last_checked,
            start_of_month: record.period_anchor,
        }
    }
}

impl From<MembershipCacheRecord> for TeamMembershipRecord {
    fn from(record: MembershipCacheRecord) -> Self {
        Self {
            subject_id: record.jwt_sub,
            is_team_member: record.is_team_member,
            team_id: record.team_id,
            team_user_id: (record.user_id != 0).then_some(record.user_id),
            period_anchor: record.start_of_month,
            last_checked: record.last_checked,
        }
    }
}
