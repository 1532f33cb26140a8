mod membership;
mod reconcile;
mod snapshot;

pub use membership::{MembershipStore, TeamMembershipCache};
pub use reconcile::SpendReconciler;
pub use snapshot::UsageEngine;
