use once_cell::sync::Lazy;
use regex::Regex;
use ledger_core::TOOL_CALLS_MODEL;

use crate::types::SkipReason;

static MID_MONTH_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bmid-month usage paid\b").expect("mid-month regex"));

static TOKEN_BASED_CALLS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s+token-based usage calls to ([\w.\-]+)\s*,\s*totalling\b")
        .expect("token-based regex")
});

static REQUEST_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(\d+)\s+(.*?\b(?:requests?|calls?)\b.*?)(?:\s+(?:beyond|at|per)\b.*|\s*\*.*)?\s*$",
    )
    .expect("request phrase regex")
});

static LEADING_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)").expect("leading count regex"));

static KNOWN_MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:\bdiscounted\s+)?\b(",
        r"claude-(?:\d(?:\.\d)?-)?(?:sonnet|opus|haiku)(?:-\d(?:\.\d)?)?(?:-thinking|-max)?",
        r"|gpt-(?:3\.5-turbo|4(?:\.1|\.5|o)?(?:-mini|-nano|-turbo)?|5(?:-mini|-nano|-codex)?)",
        r"|o[134](?:-mini|-pro)?",
        r"|gemini-(?:1\.5|2\.0|2\.5)-(?:pro|flash)(?:-exp|-preview)?",
        r"|deepseek-(?:r1|v3(?:\.1)?)",
        r"|grok-[234](?:-mini|-beta)?",
        r"|cursor-(?:small|fast)",
        r")\b",
    ))
    .expect("known model regex")
});

static EXTRA_FAST_QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)extra fast premium requests?\s*\(([^)]+)\)").expect("extra fast regex")
});

#[derive(Debug, Clone, Copy)]
pub(crate) struct LineView<'a> {
    pub description: &'a str,
    pub cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ModelAttribution {
    Known(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LineMatch {
    MidMonthPayment { dollars: f64 },
    Usage {
        request_count: u64,
        model: ModelAttribution,
    },
    Skip(SkipReason),
}

pub(crate) trait LineMatcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, line: &LineView<'_>) -> bool;
    fn extract(&self, line: &LineView<'_>) -> Option<LineMatch>;
}

pub(crate) struct MissingCents;

impl LineMatcher for MissingCents {
    fn name(&self) -> &'static str {
        "missing_cents"
    }

    fn matches(&self, line: &LineView<'_>) -> bool {
        line.cents.is_none()
    }

    fn extract(&self, _line: &LineView<'_>) -> Option<LineMatch> {
        Some(LineMatch::Skip(SkipReason::MissingCents))
    }
}

pub(crate) struct MidMonthPayment;

impl LineMatcher for MidMonthPayment {
    fn name(&self) -> &'static str {
        "mid_month_payment"
    }

    fn matches(&self, line: &LineView<'_>) -> bool {
        MID_MONTH_MARKER.is_match(line.description)
    }

    fn extract(&self, line: &LineView<'_>) -> Option<LineMatch> {
        let cents = line.cents?;
        Some(LineMatch::MidMonthPayment {
            dollars: cents.unsigned_abs() as f64 / 100.0,
        })
    }
}

pub(crate) struct TokenBasedCalls;

impl LineMatcher for TokenBasedCalls {
    fn name(&self) -> &'static str {
        "token_based_calls"
    }

    fn matches(&self, line: &LineView<'_>) -> bool {
        TOKEN_BASED_CALLS.is_match(line.description)
    }

    fn extract(&self, line: &LineView<'_>) -> Option<LineMatch> {
        let caps = TOKEN_BASED_CALLS.captures(line.description)?;
        let request_count = caps.get(1)?.as_str().parse::<u64>().ok()?;
        let model = caps.get(2)?.as_str().to_string();
        Some(LineMatch::Usage {
            request_count,
            model: ModelAttribution::Known(model),
        })
    }
}

pub(crate) struct RequestPhrase {
    extra_models: Vec<String>,
}

impl RequestPhrase {
    pub(crate) fn new(extra_models: &[String]) -> Self {
        Self {
            extra_models: extra_models
                .iter()
                .map(|model| model.trim().to_ascii_lowercase())
                .filter(|model| !model.is_empty())
                .collect(),
        }
    }

    fn classify(&self, phrase: &str) -> ModelAttribution {
        let lowered = phrase.to_ascii_lowercase();
        if lowered.contains("tool call") {
            return ModelAttribution::Known(TOOL_CALLS_MODEL.to_string());
        }
        if let Some(model) = KNOWN_MODEL
            .captures(phrase)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
        {
            return ModelAttribution::Known(model);
        }
        if let Some(model) = self
            .extra_models
            .iter()
            .find(|model| lowered.contains(model.as_str()))
        {
            return ModelAttribution::Known(model.clone());
        }
        if let Some(qualifier) = EXTRA_FAST_QUALIFIER
            .captures(phrase)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|value| !value.is_empty())
        {
            return ModelAttribution::Known(qualifier.to_string());
        }
        ModelAttribution::Unknown
    }
}

impl LineMatcher for RequestPhrase {
    fn name(&self) -> &'static str {
        "request_phrase"
    }

    fn matches(&self, line: &LineView<'_>) -> bool {
        REQUEST_PHRASE.is_match(line.description)
    }

    fn extract(&self, line: &LineView<'_>) -> Option<LineMatch> {
        let caps = REQUEST_PHRASE.captures(line.description)?;
        let request_count = caps.get(1)?.as_str().parse::<u64>().ok()?;
        let phrase = caps.get(2)?.as_str().trim();
        Some(LineMatch::Usage {
            request_count,
            model: self.classify(phrase),
        })
    }
}

pub(crate) struct LeadingCount;

impl LineMatcher for LeadingCount {
    fn name(&self) -> &'static str {
        "leading_count"
    }

    fn matches(&self, line: &LineView<'_>) -> bool {
        LEADING_COUNT.is_match(line.description)
    }

    fn extract(&self, line: &LineView<'_>) -> Option<LineMatch> {
        let caps = LEADING_COUNT.captures(line.description)?;
        let request_count = caps.get(1)?.as_str().parse::<u64>().ok()?;
        Some(LineMatch::Usage {
            request_count,
            model: ModelAttribution::Unknown,
        })
    }
}

/// The classification chain in priority order.
pub(crate) fn default_chain(extra_models: &[String]) -> Vec<Box<dyn LineMatcher>> {
    vec![
        Box::new(MissingCents),
        Box::new(MidMonthPayment),
        Box::new(TokenBasedCalls),
        Box::new(RequestPhrase::new(extra_models)),
        Box::new(LeadingCount),
    ]
}
