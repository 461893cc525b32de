use crate::error::Result;
use crate::schema::{EnrichedSaleLine, FinancialSummary};
use log::{info, warn};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const LEDGER_HEADERS: [&str; 18] = [
    "Category",
    "Product",
    "Quantity",
    "GrossValue",
    "Cash",
    "Debit",
    "Credit",
    "CashlessWallet",
    "Voucher",
    "SplitBill",
    "Other",
    "Discount",
    "UnitCost",
    "TotalCost",
    "TotalFee",
    "NetRevenue",
    "UnitMargin",
    "MarginPercent",
];

/// Serializes the enriched ledger as delimited text.
pub fn write_ledger_csv<W: Write>(writer: W, ledger: &[EnrichedSaleLine]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(LEDGER_HEADERS)?;

    for row in ledger {
        let p = &row.line.payments;
        csv_writer.write_record([
            row.line.category.clone(),
            row.line.product.clone(),
            row.line.quantity.to_string(),
            format!("{:.2}", row.line.gross_value),
            format!("{:.2}", p.cash),
            format!("{:.2}", p.debit),
            format!("{:.2}", p.credit),
            format!("{:.2}", p.cashless_wallet),
            format!("{:.2}", p.voucher),
            format!("{:.2}", p.split_bill),
            format!("{:.2}", p.other),
            format!("{:.2}", row.line.discount),
            format!("{:.2}", row.unit_cost),
            format!("{:.2}", row.total_cost),
            format!("{:.2}", row.total_fee),
            format!("{:.2}", row.net_revenue),
            format!("{:.2}", row.unit_margin),
            format!("{:.2}", row.margin_percent),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Serializes the summary as pretty-printed JSON.
pub fn write_summary_json<W: Write>(writer: W, summary: &FinancialSummary) -> Result<()> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

pub fn ledger_file_name(period_label: &str) -> String {
    format!("margin_report_{}.csv", sanitize_label(period_label))
}

pub fn summary_file_name(period_label: &str) -> String {
    format!("margin_summary_{}.json", sanitize_label(period_label))
}

/// Best-effort snapshot of one run. Failures are swallowed: the computed
/// numbers have already been produced and saving this byproduct must never
/// make the call fail.
pub fn persist_snapshot(dir: &Path, summary: &FinancialSummary, ledger: &[EnrichedSaleLine]) {
    match try_persist_snapshot(dir, summary, ledger) {
        Ok(()) => info!(
            "Snapshot saved for period {} in {}",
            summary.period_label,
            dir.display()
        ),
        Err(err) => warn!("Snapshot for period {} not saved: {}", summary.period_label, err),
    }
}

fn try_persist_snapshot(
    dir: &Path,
    summary: &FinancialSummary,
    ledger: &[EnrichedSaleLine],
) -> Result<()> {
    let ledger_path = dir.join(ledger_file_name(&summary.period_label));
    write_ledger_csv(File::create(ledger_path)?, ledger)?;

    let summary_path = dir.join(summary_file_name(&summary.period_label));
    write_summary_json(File::create(summary_path)?, summary)?;

    Ok(())
}

/// Period labels are free-form text ("October/2024") and go into file
/// names; anything unsafe for a path becomes a dash.
fn sanitize_label(label: &str) -> String {
    let sanitized: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "unlabeled".to_string()
    } else {
        sanitized
    }
}
