use chrono::{DateTime, Datelike, Months, Utc};
use serde::{Deserialize, Serialize};

/// One subscription-anchored billing period, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub month: u32,
    pub year: i32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BillingPeriod {
    fn at_offset(anchor: DateTime<Utc>, offset: i32) -> Option<Self> {
        let start = shift_months(anchor, offset)?;
        let end = shift_months(anchor, offset.checked_add(1)?)?;
        Some(Self {
            month: start.month(),
            year: start.year(),
            start,
            end,
        })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriods {
    pub current: BillingPeriod,
    pub previous: BillingPeriod,
}

/// Clamps to the last day of short months.
pub fn shift_months(anchor: DateTime<Utc>, months: i32) -> Option<DateTime<Utc>> {
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        anchor.checked_add_months(delta)
    } else {
        anchor.checked_sub_months(delta)
    }
}

/// Current and previous billing periods for `subscription_start` at `now`.
pub fn billing_periods(
    subscription_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<BillingPeriods> {
    let year_delta = now.year().checked_sub(subscription_start.year())?;
    let mut offset = year_delta
        .checked_mul(12)?
        .checked_add(now.month() as i32 - subscription_start.month() as i32)?;
    if now < shift_months(subscription_start, offset)? {
        offset -= 1;
    }
    let current = BillingPeriod::at_offset(subscription_start, offset)?;
    let previous = BillingPeriod::at_offset(subscription_start, offset - 1)?;
    Some(BillingPeriods { current, previous })
}
