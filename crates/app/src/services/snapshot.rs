use chrono::{DateTime, Utc};
use ingest::{LineItemParser, UnknownModelDetector, UsageAggregator};
use ledger_core::{
    BillingPeriod, MonthlyInvoice, PeriodUsage, TeamMembershipRecord, TeamSpend,
    UsageBasedPricing, UsageSnapshot, billing_periods,
};
use tracing::{debug, info, warn};

use super::membership::{MembershipStore, TeamMembershipCache};
use super::reconcile::SpendReconciler;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, SourceResult};
use crate::session::SessionIdentity;
use crate::source::UsageSource;

/// Builds usage snapshots from a collaborator and a membership store.
pub struct UsageEngine<S, M> {
    source: S,
    membership: TeamMembershipCache<M>,
    parser: LineItemParser,
    reconciler: SpendReconciler,
}

impl<S: UsageSource, M: MembershipStore> UsageEngine<S, M> {
    pub fn new(source: S, store: M, config: EngineConfig) -> Self {
        Self {
            source,
            membership: TeamMembershipCache::new(store),
            parser: LineItemParser::with_known_models(&config.known_models),
            reconciler: SpendReconciler::new(config),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn build_snapshot(
        &self,
        session: &SessionIdentity,
        detector: &mut UnknownModelDetector,
    ) -> EngineResult<UsageSnapshot> {
        self.build_snapshot_at(session, detector, Utc::now()).await
    }

    /// Snapshot as of `now`.
    ///
    /// Only a failed individual-usage fetch aborts the build; every other
    /// collaborator failure degrades to its fallback.
    pub async fn build_snapshot_at(
        &self,
        session: &SessionIdentity,
        detector: &mut UnknownModelDetector,
        now: DateTime<Utc>,
    ) -> EngineResult<UsageSnapshot> {
        let individual = self
            .source
            .individual_usage()
            .await
            .map_err(EngineError::IndividualUsage)?;
        let anchor = individual.start_of_month;
        let periods =
            billing_periods(anchor, now).ok_or(EngineError::PeriodOutOfRange(anchor))?;
        debug!(
            current_start = %periods.current.start,
            previous_start = %periods.previous.start,
            "resolved billing periods"
        );

        let (current_invoice, previous_invoice, membership) = tokio::join!(
            self.fetch_invoice(periods.current),
            self.fetch_invoice(periods.previous),
            self.resolve_membership(session, anchor, now),
        );
        let team_id = membership.team_ids().map(|(team_id, _)| team_id);
        let (team_spend, usage_based_pricing) = tokio::join!(
            self.fetch_team_spend(team_id),
            self.fetch_usage_based_pricing(team_id),
        );

        let aggregator = UsageAggregator::new(&self.parser);
        let current_period = match current_invoice {
            Some(invoice) => aggregator.aggregate(periods.current, &invoice, detector),
            None => PeriodUsage::empty(periods.current),
        };
        let previous_period = match previous_invoice {
            Some(invoice) => aggregator.aggregate(periods.previous, &invoice, detector),
            None => PeriodUsage::empty(periods.previous),
        };

        let mut snapshot = self.reconciler.reconcile(
            &membership,
            &individual,
            team_spend.as_ref(),
            current_period,
            previous_period,
            now,
        );
        snapshot.usage_based_pricing = usage_based_pricing;
        snapshot.unknown_model_report = detector.take_report();
        if let Some(terms) = &snapshot.unknown_model_report {
            info!(terms = ?terms, "unrecognised models in invoice descriptions");
        }
        Ok(snapshot)
    }

    async fn fetch_invoice(&self, period: BillingPeriod) -> Option<MonthlyInvoice> {
        match self.source.monthly_invoice(period.month, period.year).await {
            Ok(invoice) => Some(invoice),
            Err(err) => {
                warn!(
                    month = period.month,
                    year = period.year,
                    "invoice fetch failed, treating period as empty: {}",
                    err
                );
                None
            }
        }
    }

    async fn resolve_membership(
        &self,
        session: &SessionIdentity,
        anchor: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> TeamMembershipRecord {
        let resolved = match session.subject_id() {
            Some(subject) => {
                self.membership
                    .resolve(subject, || self.load_membership(subject, anchor, now))
                    .await
            }
            None => {
                debug!("session has no subject, skipping membership cache");
                self.load_membership("", anchor, now).await
            }
        };
        resolved.unwrap_or_else(|err| {
            warn!("team membership lookup failed, using individual usage: {}", err);
            TeamMembershipRecord::individual(session.subject_id().unwrap_or_default(), anchor, now)
        })
    }

    async fn load_membership(
        &self,
        subject: &str,
        anchor: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> SourceResult<TeamMembershipRecord> {
        let teams = self.source.teams().await?;
        let Some(team) = teams.teams.first() else {
            return Ok(TeamMembershipRecord::individual(subject, anchor, now));
        };
        let details = self.source.team_details(team.id).await?;
        Ok(TeamMembershipRecord {
            subject_id: subject.to_string(),
            is_team_member: true,
            team_id: Some(team.id),
            team_user_id: Some(details.user_id),
            period_anchor: anchor,
            last_checked: now,
        })
    }

    async fn fetch_team_spend(&self, team_id: Option<i64>) -> Option<TeamSpend> {
        let team_id = team_id?;
        match self.source.team_spend(team_id).await {
            Ok(spend) => Some(spend),
            Err(err) => {
                warn!(team_id, "team spend fetch failed, using invoice totals: {}", err);
                None
            }
        }
    }

    async fn fetch_usage_based_pricing(&self, team_id: Option<i64>) -> Option<UsageBasedPricing> {
        let (status, limit) = tokio::join!(
            self.source.usage_based_status(team_id),
            self.source.hard_limit(team_id),
        );
        match (status, limit) {
            (Ok(status), Ok(limit)) => Some(UsageBasedPricing {
                enabled: status.usage_based_premium_requests,
                hard_limit_dollars: limit.hard_limit,
            }),
            (Err(err), _) | (_, Err(err)) => {
                warn!("usage-based pricing status unavailable: {}", err);
                None
            }
        }
    }
}
