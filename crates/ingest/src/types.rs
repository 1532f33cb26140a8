use std::fmt;

use ledger_core::ParsedUsageItem;
use serde::Serialize;

/// Why a raw invoice line produced no usage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingCents,
    NoRequestCount,
    ZeroRequests,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCents => write!(f, "line has no cents amount"),
            Self::NoRequestCount => write!(f, "no request count could be recovered"),
            Self::ZeroRequests => write!(f, "request count is zero"),
        }
    }
}

/// Outcome of classifying one invoice line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ParsedLine {
    Usage(ParsedUsageItem),
    MidMonthPayment { dollars: f64 },
    Skipped(SkipReason),
}

impl ParsedLine {
    pub fn usage(&self) -> Option<&ParsedUsageItem> {
        match self {
            Self::Usage(item) => Some(item),
            _ => None,
        }
    }
}
