use ledger_core::{BillingPeriod, MidMonthLine, MonthlyInvoice, PeriodUsage, RawInvoiceLine};

use crate::parser::LineItemParser;
use crate::types::ParsedLine;
use crate::unknown::UnknownModelDetector;

/// Sum of strictly positive item costs; credits and zero lines are excluded.
pub fn total_cost<'a, I>(costs: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    costs.into_iter().filter(|cost| **cost > 0.0).sum()
}

/// Folds one period's invoice lines into [`PeriodUsage`].
pub struct UsageAggregator<'p> {
    parser: &'p LineItemParser,
}

impl<'p> UsageAggregator<'p> {
    pub fn new(parser: &'p LineItemParser) -> Self {
        Self { parser }
    }

    pub fn aggregate(
        &self,
        period: BillingPeriod,
        invoice: &MonthlyInvoice,
        detector: &mut UnknownModelDetector,
    ) -> PeriodUsage {
        self.aggregate_lines(
            period,
            &invoice.items,
            invoice.has_unpaid_mid_month_invoice,
            detector,
        )
    }

    pub fn aggregate_lines(
        &self,
        period: BillingPeriod,
        lines: &[RawInvoiceLine],
        has_unpaid_mid_month_invoice: bool,
        detector: &mut UnknownModelDetector,
    ) -> PeriodUsage {
        let mut usage = PeriodUsage::empty(period);
        usage.has_unpaid_mid_month_invoice = has_unpaid_mid_month_invoice;
        for line in lines {
            match self.parser.parse(line) {
                ParsedLine::Usage(item) => {
                    if item.is_unknown_model() {
                        detector.observe(&item.source_description);
                        usage.unresolved_models.push(item.source_description.clone());
                    }
                    usage.items.push(item);
                }
                ParsedLine::MidMonthPayment { dollars } => {
                    usage.mid_month_payment += dollars;
                    usage.mid_month_lines.push(MidMonthLine {
                        description: line.description.clone(),
                        amount_dollars: dollars,
                        running_total_dollars: usage.mid_month_payment,
                    });
                }
                ParsedLine::Skipped(_) => {}
            }
        }
        usage.total_cost_dollars = total_cost(usage.items.iter().map(|item| &item.cost_dollars));
        usage
    }
}
