pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod source;
pub mod stores;
pub mod util;

pub use config::EngineConfig;
pub use error::{AppError, EngineError, EngineResult, Result, SourceError, SourceResult};
pub use services::{MembershipStore, SpendReconciler, TeamMembershipCache, UsageEngine};
pub use session::{SessionIdentity, subject_from_token};
pub use source::UsageSource;
pub use stores::{InMemoryMembershipStore, JsonFileMembershipStore, SqliteMembershipStore};
pub use util::time::parse_timestamp;
