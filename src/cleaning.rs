use crate::ingestion::SalesTable;
use crate::schema::{PaymentBreakdown, PaymentMethod, SaleLine, GRAND_TOTAL_CATEGORY};
use log::debug;

pub const COL_CATEGORY: &str = "Category";
pub const COL_PRODUCT: &str = "Product";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_GROSS_VALUE: &str = "GrossValue";
pub const COL_DISCOUNT: &str = "Discount";

/// Turns the raw string table into typed sale lines.
///
/// Rows with an empty product key and the report's grand-total rows are
/// dropped. Numeric columns coerce leniently: anything that does not parse
/// becomes 0, and a column missing from the export reads as 0 everywhere.
pub fn clean_sales(table: &SalesTable) -> Vec<SaleLine> {
    let category_idx = table.column(COL_CATEGORY);
    let product_idx = table.column(COL_PRODUCT);
    let quantity_idx = table.column(COL_QUANTITY);
    let gross_idx = table.column(COL_GROSS_VALUE);
    let discount_idx = table.column(COL_DISCOUNT);

    let mut lines = Vec::new();

    for row in &table.rows {
        let product = cell(row, product_idx).trim().to_string();
        if product.is_empty() {
            continue;
        }

        let category = cell(row, category_idx).trim().to_string();
        if category == GRAND_TOTAL_CATEGORY {
            continue;
        }

        let mut payments = PaymentBreakdown::default();
        for method in PaymentMethod::ALL {
            let idx = table.column(method.column_name());
            payments.set_amount(method, coerce_decimal(cell(row, idx)));
        }

        lines.push(SaleLine {
            category,
            product,
            quantity: coerce_quantity(cell(row, quantity_idx)),
            gross_value: coerce_decimal(cell(row, gross_idx)),
            payments,
            discount: coerce_decimal(cell(row, discount_idx)),
        });
    }

    debug!("Cleaned sales export: {} of {} rows retained", lines.len(), table.len());
    lines
}

fn cell<'a>(row: &'a [String], idx: Option<usize>) -> &'a str {
    idx.and_then(|i| row.get(i)).map(|s| s.as_str()).unwrap_or("")
}

fn coerce_decimal(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

fn coerce_quantity(raw: &str) -> u32 {
    let value = coerce_decimal(raw);
    if value <= 0.0 {
        0
    } else {
        value as u32
    }
}
