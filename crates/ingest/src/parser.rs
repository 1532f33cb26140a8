use ledger_core::{ParsedUsageItem, RawInvoiceLine, UNKNOWN_MODEL};
use tracing::debug;

use crate::matchers::{LineMatch, LineMatcher, LineView, ModelAttribution, default_chain};
use crate::types::{ParsedLine, SkipReason};

/// Classifies raw invoice lines into usage records.
pub struct LineItemParser {
    chain: Vec<Box<dyn LineMatcher>>,
}

impl Default for LineItemParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineItemParser {
    pub fn new() -> Self {
        Self::with_known_models(&[])
    }

    /// Parser that also attributes lines mentioning any of `extra_models`.
    pub fn with_known_models(extra_models: &[String]) -> Self {
        Self {
            chain: default_chain(extra_models),
        }
    }

    pub fn parse(&self, line: &RawInvoiceLine) -> ParsedLine {
        let view = LineView {
            description: &line.description,
            cents: line.cents,
        };
        let Some((matcher, found)) = self.first_match(&view) else {
            debug!(description = %line.description, "skipping invoice line: {}", SkipReason::NoRequestCount);
            return ParsedLine::Skipped(SkipReason::NoRequestCount);
        };
        match found {
            LineMatch::Skip(reason) => {
                debug!(description = %line.description, matcher, "skipping invoice line: {}", reason);
                ParsedLine::Skipped(reason)
            }
            LineMatch::MidMonthPayment { dollars } => ParsedLine::MidMonthPayment { dollars },
            LineMatch::Usage {
                request_count,
                model,
            } => {
                if request_count == 0 {
                    debug!(description = %line.description, matcher, "skipping invoice line: {}", SkipReason::ZeroRequests);
                    return ParsedLine::Skipped(SkipReason::ZeroRequests);
                }
                // MissingCents runs first, so usage matches always carry cents.
                let cents = line.cents.unwrap_or(0);
                let model_id = match model {
                    ModelAttribution::Known(name) => name,
                    ModelAttribution::Unknown => UNKNOWN_MODEL.to_string(),
                };
                ParsedLine::Usage(ParsedUsageItem {
                    request_count,
                    model_id,
                    cost_dollars: cents as f64 / 100.0,
                    cost_per_request: cents as f64 / request_count as f64 / 100.0,
                    is_discounted: is_discounted(&line.description),
                    source_description: line.description.clone(),
                })
            }
        }
    }

    fn first_match(&self, view: &LineView<'_>) -> Option<(&'static str, LineMatch)> {
        self.chain.iter().find_map(|matcher| {
            if !matcher.matches(view) {
                return None;
            }
            matcher.extract(view).map(|found| (matcher.name(), found))
        })
    }
}

fn is_discounted(description: &str) -> bool {
    description.to_ascii_lowercase().contains("discounted")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::TOOL_CALLS_MODEL;

    fn parse(description: &str, cents: Option<i64>) -> ParsedLine {
        LineItemParser::new().parse(&RawInvoiceLine::new(description, cents))
    }

    fn usage(description: &str, cents: i64) -> ParsedUsageItem {
        match parse(description, Some(cents)) {
            ParsedLine::Usage(item) => item,
            other => panic!("expected usage for {description:?}, got {other:?}"),
        }
    }

    #[test]
    fn token_based_line_yields_model_and_cost() {
        let item = usage(
            "142 token-based usage calls to claude-4-sonnet, totalling: $9.94",
            994,
        );
        assert_eq!(item.request_count, 142);
        assert_eq!(item.model_id, "claude-4-sonnet");
        assert!((item.cost_dollars - 9.94).abs() < 1e-9);
        assert!(!item.is_discounted);
        assert!((item.cost_per_request - 9.94 / 142.0).abs() < 1e-9);
    }

    #[test]
    fn extra_fast_premium_line_uses_qualifier() {
        let item = usage("3 extra fast premium requests (haiku)", 150);
        assert_eq!(item.model_id, "haiku");
        assert_eq!(item.request_count, 3);
        assert!((item.cost_per_request - 0.5).abs() < 1e-9);
    }

    #[test]
    fn mid_month_payment_is_not_a_usage_item() {
        assert_eq!(
            parse("Mid-month usage paid", Some(-500)),
            ParsedLine::MidMonthPayment { dollars: 5.0 }
        );
    }

    #[test]
    fn missing_cents_wins_over_every_other_branch() {
        assert_eq!(
            parse("Mid-month usage paid", None),
            ParsedLine::Skipped(SkipReason::MissingCents)
        );
        assert_eq!(
            parse("142 token-based usage calls to claude-4-sonnet, totalling: $9.94", None),
            ParsedLine::Skipped(SkipReason::MissingCents)
        );
    }

    #[test]
    fn zero_request_count_is_skipped() {
        assert_eq!(
            parse("0 gpt-4 requests * 4 cents per such request", Some(0)),
            ParsedLine::Skipped(SkipReason::ZeroRequests)
        );
    }

    #[test]
    fn discount_flag_is_independent_of_branch() {
        let item = usage("20 discounted claude-3.5-sonnet requests * 2 cents per such request", 40);
        assert_eq!(item.model_id, "claude-3.5-sonnet");
        assert!(item.is_discounted);

        let item = usage("12 token-based usage calls to gpt-4.1, totalling: $1.20 (Discounted)", 120);
        assert_eq!(item.model_id, "gpt-4.1");
        assert!(item.is_discounted);
    }

    #[test]
    fn tool_calls_use_sentinel_model() {
        let item = usage("15 tool calls beyond 500/month * 5 cents per such call", 75);
        assert_eq!(item.model_id, TOOL_CALLS_MODEL);
    }

    #[test]
    fn unrecognized_phrase_is_unknown() {
        let item = usage("9 glorbo-7 requests * 4 cents per such request", 36);
        assert!(item.is_unknown_model());
    }

    #[test]
    fn leading_integer_alone_is_recovered_as_unknown() {
        let item = usage("7 glorbo units", 70);
        assert_eq!(item.request_count, 7);
        assert!(item.is_unknown_model());
    }

    #[test]
    fn line_without_leading_integer_is_skipped() {
        assert_eq!(
            parse("Pro subscription", Some(2000)),
            ParsedLine::Skipped(SkipReason::NoRequestCount)
        );
    }

    #[test]
    fn negative_cents_are_kept_as_credit_items() {
        let item = usage("4 gpt-4 requests refunded", -16);
        assert!((item.cost_dollars + 0.16).abs() < 1e-9);
        assert_eq!(item.model_id, "gpt-4");
    }

    #[test]
    fn configured_models_are_recognized() {
        let parser = LineItemParser::with_known_models(&["kimi-k2".to_string()]);
        let parsed = parser.parse(&RawInvoiceLine::new(
            "8 kimi-k2 requests * 3 cents per such request",
            Some(24),
        ));
        assert_eq!(parsed.usage().map(|item| item.model_id.as_str()), Some("kimi-k2"));
    }
}
