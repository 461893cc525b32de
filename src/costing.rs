use crate::schema::{CostCatalogEntry, SaleLine};
use log::warn;
use std::collections::{BTreeMap, HashMap};

/// A sale line with its unit cost attached.
#[derive(Debug, Clone, PartialEq)]
pub struct CostedSaleLine {
    pub line: SaleLine,
    pub unit_cost: f64,
}

/// A product sold during the period but absent from the variable-cost
/// catalog. Diagnostic only; such products cost 0 in every calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct UncostedProduct {
    pub product: String,
    pub quantity_sold: u64,
}

/// Left-outer join of sale lines against the variable-cost catalog.
///
/// Unmatched products default to a unit cost of 0 and are reported back as
/// warnings, never as an error.
pub fn join_costs(
    lines: Vec<SaleLine>,
    catalog: &[CostCatalogEntry],
) -> (Vec<CostedSaleLine>, Vec<UncostedProduct>) {
    let unit_costs: HashMap<&str, f64> = catalog
        .iter()
        .map(|e| (e.product.as_str(), e.unit_cost))
        .collect();

    let mut uncosted: BTreeMap<String, u64> = BTreeMap::new();
    let mut costed = Vec::with_capacity(lines.len());

    for line in lines {
        match unit_costs.get(line.product.as_str()) {
            Some(&unit_cost) => costed.push(CostedSaleLine { line, unit_cost }),
            None => {
                *uncosted.entry(line.product.clone()).or_insert(0) += u64::from(line.quantity);
                costed.push(CostedSaleLine { line, unit_cost: 0.0 });
            }
        }
    }

    let report: Vec<UncostedProduct> = uncosted
        .into_iter()
        .map(|(product, quantity_sold)| UncostedProduct { product, quantity_sold })
        .collect();

    if !report.is_empty() {
        warn!("{} product(s) have no cost catalog entry; using unit cost 0", report.len());
        for item in &report {
            warn!("  uncosted: {} (quantity sold: {})", item.product, item.quantity_sold);
        }
    }

    (costed, report)
}
