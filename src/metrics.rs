use crate::costing::CostedSaleLine;
use crate::schema::EnrichedSaleLine;

/// Derives the per-row financial figures: method fees, total cost, net
/// revenue, unit margin and margin percent.
///
/// Every ratio is guarded: a zero denominator yields 0, never a NaN or an
/// infinity. Zero-value rows (freebies, register adjustments) therefore
/// carry a zero margin instead of poisoning the aggregates.
pub fn enrich(rows: Vec<CostedSaleLine>) -> Vec<EnrichedSaleLine> {
    rows.into_iter().map(enrich_row).collect()
}

fn enrich_row(row: CostedSaleLine) -> EnrichedSaleLine {
    let CostedSaleLine { line, unit_cost } = row;

    let fees = line.payments.fees();
    let total_fee = fees.total();
    let total_cost = f64::from(line.quantity) * unit_cost;
    let net_revenue = line.gross_value - total_cost - total_fee;

    let unit_margin = if line.gross_value == 0.0 || line.quantity == 0 {
        0.0
    } else {
        net_revenue / f64::from(line.quantity)
    };

    let margin_percent = if line.gross_value > 0.0 {
        (net_revenue / line.gross_value) * 100.0
    } else {
        0.0
    };

    EnrichedSaleLine {
        line,
        unit_cost,
        fees,
        total_fee,
        total_cost,
        net_revenue,
        unit_margin,
        margin_percent,
    }
}
