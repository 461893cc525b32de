use crate::schema::{SaleLine, PHANTOM_SALE_MARKER};
use log::{info, warn};

/// Outcome of the phantom-sale scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhantomScan {
    /// Summed gross value of every removed row.
    pub auto_detected_value: f64,
    /// Processor fees those rows incurred, computed from the standard rate
    /// table before removal. The sales are fictitious; the fees were paid.
    pub auto_detected_fee: f64,
    /// (product, gross value) of each removed row, in input order.
    pub removed: Vec<(String, f64)>,
}

impl PhantomScan {
    pub fn match_count(&self) -> usize {
        self.removed.len()
    }
}

/// Removes phantom-sale rows from the working set.
///
/// A row matches when its product name contains the fixed marker,
/// case-insensitively. The detection rule is a fixed textual pattern; there
/// is nothing adaptive about it.
pub fn scan_phantom_sales(lines: Vec<SaleLine>) -> (Vec<SaleLine>, PhantomScan) {
    let mut scan = PhantomScan::default();
    let mut retained = Vec::with_capacity(lines.len());

    for line in lines {
        if is_phantom_sale(&line) {
            scan.auto_detected_value += line.gross_value;
            scan.auto_detected_fee += line.payments.fees().total();
            scan.removed.push((line.product.clone(), line.gross_value));
        } else {
            retained.push(line);
        }
    }

    if scan.match_count() > 0 {
        warn!(
            "Auto-detected {} phantom-sale row(s) worth {:.2}; removed from the ledger",
            scan.match_count(),
            scan.auto_detected_value
        );
    } else {
        info!("No phantom-sale rows detected");
    }

    (retained, scan)
}

fn is_phantom_sale(line: &SaleLine) -> bool {
    line.product.to_lowercase().contains(PHANTOM_SALE_MARKER)
}
