use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

static TOKEN_BASED_MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)token-based usage calls to ([^\s,]+)").expect("token-based model regex")
});

static EXTRA_FAST_MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)extra fast premium requests?\s*\(([^)]+)\)").expect("extra fast model regex")
});

static GENERIC_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+\s+)?(.+)$").expect("generic phrase regex"));

static TRAILING_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:requests?|calls?|beyond|per|at)\b.*$").expect("trailing noise regex")
});

const DENYLIST: &[&str] = &[
    "usage",
    "calls",
    "call",
    "request",
    "requests",
    "premium",
    "fast",
    "extra",
    "tool",
    "tools",
    "thinking",
    "token",
    "tokens",
    "token-based",
    "based",
    "discounted",
    "beyond",
    "per",
    "model",
    "models",
    "unknown",
    "month",
    "monthly",
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Pulls the model-like fragment out of an unresolved invoice description.
pub fn extract_unknown_term(description: &str) -> Option<String> {
    let term = if let Some(caps) = TOKEN_BASED_MODEL.captures(description) {
        caps.get(1)?.as_str().to_string()
    } else if let Some(caps) = EXTRA_FAST_MODEL.captures(description) {
        caps.get(1)?.as_str().to_string()
    } else {
        let phrase = GENERIC_PHRASE.captures(description)?.get(1)?.as_str();
        let phrase = phrase.split('*').next().unwrap_or(phrase);
        TRAILING_NOISE.replace(phrase, "").into_owned()
    };
    let term = term
        .trim()
        .trim_end_matches(|ch: char| ch.is_ascii_punctuation() && ch != ')')
        .trim()
        .to_string();
    if term.chars().count() <= 1 {
        return None;
    }
    let all_noise = term
        .split_whitespace()
        .all(|word| DENYLIST.contains(&word.to_ascii_lowercase().as_str()));
    if all_noise {
        return None;
    }
    Some(term)
}

/// Collects unattributed model names; the report is handed out once per reset.
#[derive(Debug, Default, Clone)]
pub struct UnknownModelDetector {
    terms: Vec<String>,
    reported: bool,
}

impl UnknownModelDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, description: &str) -> Option<String> {
        let term = extract_unknown_term(description)?;
        if self.is_known_term(&term) {
            return None;
        }
        info!(term = %term, "detected unknown model");
        self.terms.push(term.clone());
        Some(term)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn has_reported(&self) -> bool {
        self.reported
    }

    pub fn take_report(&mut self) -> Option<Vec<String>> {
        if self.reported || self.terms.is_empty() {
            return None;
        }
        self.reported = true;
        Some(self.terms.clone())
    }

    pub fn reset(&mut self) {
        self.terms.clear();
        self.reported = false;
    }

    fn is_known_term(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.terms.iter().any(|existing| {
            let existing = existing.to_lowercase();
            existing.contains(&term) || term.contains(&existing)
        })
    }
}
