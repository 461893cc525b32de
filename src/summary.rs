use crate::anomaly::PhantomScan;
use crate::schema::{
    EnrichedSaleLine, FinancialSummary, FixedCostEntry, PaymentBreakdown, PaymentMethod,
};
use chrono::Utc;
use log::debug;
use std::collections::BTreeMap;

/// Folds the enriched ledger, the fixed-cost catalog and the phantom-sale
/// adjustments into one summary record.
///
/// Every field has exactly one formula here (the KPI fields are filled in
/// afterwards by the KPI engine). Two arithmetic rules are load-bearing:
///
/// - the gross value of auto-detected phantom rows is added back into
///   `gross_revenue_system`, because those rows were part of the reported
///   total before this engine removed them from the ledger;
/// - phantom value is assumed to ride the credit channel, so it is deducted
///   from credit to form `credit_net`, and its 3% processor fee is a real
///   cost even though the sale is not.
pub fn build_summary(
    ledger: &[EnrichedSaleLine],
    fixed_costs: &[FixedCostEntry],
    scan: &PhantomScan,
    manual_phantom_value: f64,
    period_label: &str,
) -> FinancialSummary {
    let credit_rate = PaymentMethod::Credit.fee_rate();

    // Gross totals over the retained ledger
    let retained_gross: f64 = ledger.iter().map(|r| r.line.gross_value).sum();
    let mut method_totals = PaymentBreakdown::default();
    let mut fee_totals = PaymentBreakdown::default();
    for row in ledger {
        for method in PaymentMethod::ALL {
            method_totals.set_amount(
                method,
                method_totals.amount(method) + row.line.payments.amount(method),
            );
            fee_totals.set_amount(method, fee_totals.amount(method) + row.fees.amount(method));
        }
    }

    // Phantom adjustments
    let phantom_value_total = manual_phantom_value + scan.auto_detected_value;
    let gross_revenue_system = retained_gross + scan.auto_detected_value;
    let gross_revenue_real = gross_revenue_system - phantom_value_total;
    let credit_gross = method_totals.credit;
    let credit_net = credit_gross - phantom_value_total;
    let phantom_fee = phantom_value_total * credit_rate;

    // Fees. Credit is taken on the channel totals so the manual phantom
    // amount (still sitting in retained credit rows) is charged; the fee of
    // auto-detected rows comes from the scan because those rows are gone.
    let fee_credit_gross = credit_gross * credit_rate;
    let fee_credit_net = credit_net * credit_rate;
    let fee_total_general = fee_totals.debit
        + fee_credit_gross
        + fee_totals.cashless_wallet
        + fee_totals.voucher
        + fee_totals.split_bill
        + fee_totals.other
        + scan.auto_detected_fee;

    // Fixed costs. Percentage-type entries are rates, not amounts; summing
    // them would double-count the per-transaction fees above.
    let mut fixed_costs_detail: BTreeMap<String, f64> = BTreeMap::new();
    for entry in fixed_costs {
        if !entry.is_percentage_entry() {
            fixed_costs_detail.insert(entry.name.clone(), entry.amount);
        }
    }
    let fixed_cost_total: f64 = fixed_costs_detail.values().sum();

    // Bottom line, measured against real revenue
    let variable_cost_total: f64 = ledger.iter().map(|r| r.total_cost).sum();
    let gross_margin = gross_revenue_real - variable_cost_total;
    let net_profit = gross_margin - fixed_cost_total - fee_total_general;

    let total_quantity: u64 = ledger.iter().map(|r| u64::from(r.line.quantity)).sum();
    let average_ticket_real = if total_quantity > 0 {
        gross_revenue_real / total_quantity as f64
    } else {
        0.0
    };

    debug!(
        "Summary for {}: real revenue {:.2}, net profit {:.2} over {} products",
        period_label,
        gross_revenue_real,
        net_profit,
        ledger.len()
    );

    FinancialSummary {
        period_label: period_label.to_string(),
        processed_at: Utc::now(),

        gross_revenue_system,
        gross_revenue_real,

        phantom_value_manual: manual_phantom_value,
        phantom_value_auto_detected: scan.auto_detected_value,
        phantom_value_total,
        phantom_fee,

        cash_total: method_totals.cash,
        debit_total: method_totals.debit,
        credit_gross,
        credit_net,
        cashless_total: method_totals.cashless_wallet,
        voucher_total: method_totals.voucher,
        split_total: method_totals.split_bill,
        other_total: method_totals.other,

        fee_debit_total: fee_totals.debit,
        fee_credit_gross,
        fee_credit_net,
        fee_cashless_total: fee_totals.cashless_wallet,
        fee_voucher_total: fee_totals.voucher,
        fee_split_total: fee_totals.split_bill,
        fee_other_total: fee_totals.other,
        fee_total_general,

        variable_cost_total,
        gross_margin,
        gross_margin_percent: percent_of(gross_margin, gross_revenue_real),

        fixed_cost_total,
        fixed_costs_detail,

        net_profit,
        net_margin_percent: percent_of(net_profit, gross_revenue_real),

        total_quantity,
        product_count: ledger.len(),
        average_ticket_real,

        contribution_margin_ratio: 0.0,
        break_even_revenue: 0.0,
        cmv_percent: 0.0,
    }
}

/// value / base * 100, or 0 when the base is not positive.
pub(crate) fn percent_of(value: f64, base: f64) -> f64 {
    if base > 0.0 {
        (value / base) * 100.0
    } else {
        0.0
    }
}
