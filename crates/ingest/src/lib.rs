mod matchers;
mod parser;
mod totals;
mod types;
mod unknown;

pub use parser::LineItemParser;
pub use totals::{UsageAggregator, total_cost};
pub use types::{ParsedLine, SkipReason};
pub use unknown::{UnknownModelDetector, extract_unknown_term};
