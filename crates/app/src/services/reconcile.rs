use chrono::{DateTime, Utc};
use ledger_core::{
    ActivePeriod, IndividualUsage, PeriodUsage, PremiumRequestCounter, TeamMembershipRecord,
    TeamSpend, UsageSnapshot, unpaid_balance,
};
use tracing::{debug, warn};

use crate::config::EngineConfig;

/// Decides which spend figure is authoritative and which period is shown.
#[derive(Debug, Clone)]
pub struct SpendReconciler {
    config: EngineConfig,
}

impl SpendReconciler {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Premium request counters from the primary model entry.
    ///
    /// These always come from individual usage, team members included.
    pub fn premium_requests(&self, individual: &IndividualUsage) -> PremiumRequestCounter {
        let primary = self.config.primary_model.as_str();
        let (current, limit) = match individual.model(primary) {
            Some(usage) => (
                usage.num_requests,
                usage
                    .max_request_usage
                    .unwrap_or(self.config.default_request_limit),
            ),
            None => {
                warn!(model = primary, "primary model missing from individual usage");
                (0, self.config.default_request_limit)
            }
        };
        PremiumRequestCounter {
            current,
            limit,
            period_start: individual.start_of_month,
        }
    }

    pub fn reconcile(
        &self,
        membership: &TeamMembershipRecord,
        individual: &IndividualUsage,
        team_spend: Option<&TeamSpend>,
        current_period: PeriodUsage,
        previous_period: PeriodUsage,
        generated_at: DateTime<Utc>,
    ) -> UsageSnapshot {
        let team_id = membership.team_ids().map(|(team_id, _)| team_id);
        let team_spend_cents = membership.team_ids().and_then(|(team_id, team_user_id)| {
            let entry = team_spend?.member(team_user_id);
            if entry.is_none() {
                debug!(team_id, team_user_id, "no team spend entry for member");
            }
            entry.map(|entry| entry.spend_cents)
        });
        let is_team_sourced = team_spend_cents.is_some();

        let active_period = if current_period.has_items() || is_team_sourced {
            ActivePeriod::Current
        } else {
            ActivePeriod::Previous
        };
        let active = match active_period {
            ActivePeriod::Current => &current_period,
            ActivePeriod::Previous => &previous_period,
        };
        let actual_cost_dollars = match team_spend_cents {
            Some(cents) => cents as f64 / 100.0,
            None => active.total_cost_dollars,
        };
        let unpaid_dollars = unpaid_balance(actual_cost_dollars, active.mid_month_payment);

        UsageSnapshot {
            premium_requests: self.premium_requests(individual),
            is_team_sourced,
            team_id,
            team_spend_cents,
            active_period,
            actual_cost_dollars,
            unpaid_dollars,
            usage_based_pricing: None,
            unknown_model_report: None,
            generated_at,
            current_period,
            previous_period,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;
    use ledger_core::{BillingPeriod, ParsedUsageItem, TeamMemberSpend};
    use serde_json::json;

    use super::*;

    fn ts(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, 0, 0, 0).unwrap()
    }

    fn period_usage(month: u32, total: f64, prepaid: f64) -> PeriodUsage {
        let mut usage = PeriodUsage::empty(BillingPeriod {
            month,
            year: 2025,
            start: ts(month, 10),
            end: ts(month + 1, 10),
        });
        if total > 0.0 {
            usage.items.push(ParsedUsageItem {
                request_count: 10,
                model_id: "gpt-4".to_string(),
                cost_dollars: total,
                cost_per_request: total / 10.0,
                is_discounted: false,
                source_description: "10 gpt-4 requests".to_string(),
            });
        }
        usage.total_cost_dollars = total;
        usage.mid_month_payment = prepaid;
        usage
    }

    fn individual(primary: Option<serde_json::Value>) -> IndividualUsage {
        let mut models = BTreeMap::new();
        if let Some(primary) = primary {
            models.insert("gpt-4".to_string(), primary);
        }
        IndividualUsage {
            start_of_month: ts(3, 10),
            models,
        }
    }

    fn member() -> TeamMembershipRecord {
        TeamMembershipRecord {
            subject_id: "auth0|a".to_string(),
            is_team_member: true,
            team_id: Some(7),
            team_user_id: Some(42),
            period_anchor: ts(1, 10),
            last_checked: ts(3, 12),
        }
    }

    fn spend(user_id: i64, cents: i64) -> TeamSpend {
        TeamSpend {
            team_member_spend: vec![TeamMemberSpend {
                user_id,
                name: None,
                email: None,
                role: None,
                spend_cents: cents,
                fast_premium_requests: 0,
                hard_limit_override_dollars: None,
            }],
            total_members: 1,
        }
    }

    fn reconciler() -> SpendReconciler {
        SpendReconciler::new(EngineConfig::default())
    }

    #[test]
    fn team_spend_overrides_invoice_total() {
        let spend = spend(42, 1234);
        let snapshot = reconciler().reconcile(
            &member(),
            &individual(Some(json!({"numRequests": 120, "maxRequestUsage": 500}))),
            Some(&spend),
            period_usage(3, 0.0, 0.0),
            period_usage(2, 40.0, 0.0),
            ts(3, 20),
        );
        assert!(snapshot.is_team_sourced);
        assert_eq!(snapshot.team_id, Some(7));
        assert_eq!(snapshot.team_spend_cents, Some(1234));
        assert_eq!(snapshot.active_period, ActivePeriod::Current);
        assert!((snapshot.actual_cost_dollars - 12.34).abs() < 1e-9);
        assert_eq!(snapshot.premium_requests.current, 120);
    }

    #[test]
    fn missing_member_entry_falls_back_to_invoice() {
        let spend = spend(99, 1234);
        let snapshot = reconciler().reconcile(
            &member(),
            &individual(None),
            Some(&spend),
            period_usage(3, 8.0, 0.0),
            period_usage(2, 0.0, 0.0),
            ts(3, 20),
        );
        assert!(!snapshot.is_team_sourced);
        assert_eq!(snapshot.team_id, Some(7));
        assert_eq!(snapshot.team_spend_cents, None);
        assert!((snapshot.actual_cost_dollars - 8.0).abs() < 1e-9);
    }

    #[test]
    fn empty_current_period_shows_previous() {
        let snapshot = reconciler().reconcile(
            &TeamMembershipRecord::individual("auth0|a", ts(1, 10), ts(3, 12)),
            &individual(None),
            None,
            period_usage(3, 0.0, 0.0),
            period_usage(2, 15.0, 5.0),
            ts(3, 20),
        );
        assert_eq!(snapshot.active_period, ActivePeriod::Previous);
        assert_eq!(snapshot.active_usage().period.month, 2);
        assert!((snapshot.actual_cost_dollars - 15.0).abs() < 1e-9);
        assert!((snapshot.unpaid_dollars - 10.0).abs() < 1e-9);
    }

    #[test]
    fn overpayment_never_goes_negative() {
        let snapshot = reconciler().reconcile(
            &TeamMembershipRecord::individual("auth0|a", ts(1, 10), ts(3, 12)),
            &individual(None),
            None,
            period_usage(3, 3.0, 5.0),
            period_usage(2, 0.0, 0.0),
            ts(3, 20),
        );
        assert_eq!(snapshot.unpaid_dollars, 0.0);
    }

    #[test]
    fn counters_fall_back_to_default_limit() {
        let counter = reconciler().premium_requests(&individual(Some(
            json!({"numRequests": 37, "maxRequestUsage": null}),
        )));
        assert_eq!((counter.current, counter.limit), (37, 500));
        assert_eq!(counter.period_start, ts(3, 10));

        let counter = reconciler().premium_requests(&individual(None));
        assert_eq!((counter.current, counter.limit), (0, 500));
    }
}
