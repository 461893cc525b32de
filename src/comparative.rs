use crate::schema::FinancialSummary;
use serde::{Deserialize, Serialize};

/// Sentinel reported when a metric grows from exactly 0 to a positive
/// value. There is no true percentage for that case; 100 is a symbolic
/// "infinite growth" marker and is documented as such, not a computed rate.
pub const GROWTH_FROM_ZERO_SENTINEL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub previous: f64,
    pub current: f64,
    pub percent_delta: f64,
}

impl MetricDelta {
    fn new(current: f64, previous: f64) -> Self {
        Self {
            previous,
            current,
            percent_delta: percent_delta(current, previous),
        }
    }
}

/// Month-over-month deltas for the fixed tracked-metric set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthOverMonth {
    pub gross_revenue_real: MetricDelta,
    pub net_profit: MetricDelta,
    pub average_ticket_real: MetricDelta,
    pub fixed_cost_total: MetricDelta,
}

impl MonthOverMonth {
    pub fn between(current: &FinancialSummary, previous: &FinancialSummary) -> Self {
        Self {
            gross_revenue_real: MetricDelta::new(
                current.gross_revenue_real,
                previous.gross_revenue_real,
            ),
            net_profit: MetricDelta::new(current.net_profit, previous.net_profit),
            average_ticket_real: MetricDelta::new(
                current.average_ticket_real,
                previous.average_ticket_real,
            ),
            fixed_cost_total: MetricDelta::new(
                current.fixed_cost_total,
                previous.fixed_cost_total,
            ),
        }
    }
}

/// Percentage change from `previous` to `current`.
///
/// Standard percent formula when the previous value is positive; 0 when
/// both are 0; [`GROWTH_FROM_ZERO_SENTINEL`] when something appeared out of
/// nothing. A negative previous value is a zero-or-negative denominator and
/// evaluates to 0 like every other guarded ratio in this crate.
pub fn percent_delta(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else if previous == 0.0 && current > 0.0 {
        GROWTH_FROM_ZERO_SENTINEL
    } else {
        0.0
    }
}
