//! # Margin Engine
//!
//! A library for computing the monthly profit margin of a food-service
//! business from a raw point-of-sale export.
//!
//! ## Core Concepts
//!
//! - **Sales export**: the POS report (delimited text, modern spreadsheet,
//!   or a legacy binary spreadsheet with a markup-table fallback)
//! - **Phantom sale**: a fictitious sale recorded to mask a cash shortfall
//!   (a *pedalada*). Its value is excluded from real revenue, but its
//!   card-processing fee is a real cost
//! - **Variable-cost catalog**: per-product unit ingredient costs
//! - **Fixed-cost catalog**: monthly absolute costs; entries with the
//!   reserved percentage prefix are rates and stay out of the sum
//! - **Financial summary**: one fixed-field record per period, with
//!   break-even, contribution-margin and cost-of-goods KPIs
//!
//! ## Example
//!
//! ```rust,ignore
//! use margin_engine::MarginEngine;
//!
//! let engine = MarginEngine::new("variable_costs.csv", "fixed_costs.csv");
//! let report = engine.process_report("october.xlsx", "October/2024", 0.0, false)?;
//!
//! println!("real revenue: {:.2}", report.summary.gross_revenue_real);
//! println!("net profit:   {:.2}", report.summary.net_profit);
//! println!("break-even:   {:.2}", report.summary.break_even_revenue);
//! ```

pub mod anomaly;
pub mod cleaning;
pub mod comparative;
pub mod costing;
pub mod error;
pub mod export;
pub mod history;
pub mod ingestion;
pub mod kpi;
pub mod metrics;
pub mod schema;
pub mod summary;

pub use anomaly::{scan_phantom_sales, PhantomScan};
pub use cleaning::clean_sales;
pub use comparative::{percent_delta, MetricDelta, MonthOverMonth, GROWTH_FROM_ZERO_SENTINEL};
pub use costing::{join_costs, CostedSaleLine, UncostedProduct};
pub use error::{MarginEngineError, Result};
pub use export::{persist_snapshot, write_ledger_csv, write_summary_json};
pub use history::{HistoryRecord, HistoryStore};
pub use ingestion::{load_cost_catalog, load_fixed_costs, load_sales_table, SalesTable};
pub use kpi::{derive_kpis, KpiSet};
pub use metrics::enrich;
pub use schema::*;
pub use summary::build_summary;

use log::{debug, info};
use std::path::{Path, PathBuf};

/// The result of one processing call: the summary, the enriched per-product
/// ledger it was folded from, and the uncosted-product diagnostics.
#[derive(Debug, Clone)]
pub struct MonthlyReport {
    pub summary: FinancialSummary,
    pub ledger: Vec<EnrichedSaleLine>,
    pub uncosted_products: Vec<UncostedProduct>,
}

/// The engine holds nothing but the two catalog paths. Both catalogs are
/// re-read on every invocation, so concurrent calls for different periods
/// are safe: each call builds its own transient tables.
pub struct MarginEngine {
    variable_cost_path: PathBuf,
    fixed_cost_path: PathBuf,
}

impl MarginEngine {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        variable_cost_path: P,
        fixed_cost_path: Q,
    ) -> Self {
        Self {
            variable_cost_path: variable_cost_path.into(),
            fixed_cost_path: fixed_cost_path.into(),
        }
    }

    /// Runs the full pipeline for one period: ingest, clean, remove phantom
    /// sales, join costs, derive per-row figures, aggregate, derive KPIs.
    ///
    /// `manual_phantom_value` is the operator-supplied phantom amount for
    /// the period; auto-detected rows are added on top of it. When
    /// `persist_snapshot` is set the engine also writes its own per-run
    /// snapshot files to the current directory; snapshot failures are
    /// logged and swallowed. Any other stage failure aborts the call.
    pub fn process_report<P: AsRef<Path>>(
        &self,
        sales_path: P,
        period_label: &str,
        manual_phantom_value: f64,
        persist_snapshot: bool,
    ) -> Result<MonthlyReport> {
        let sales_path = sales_path.as_ref();
        info!(
            "Processing monthly report for period {} from {}",
            period_label,
            sales_path.display()
        );

        let table = ingestion::load_sales_table(sales_path)?;
        debug!("Ingested {} raw rows", table.len());

        self.process_table(&table, period_label, manual_phantom_value, persist_snapshot)
    }

    /// Same pipeline over an already-loaded table. Callers that cache their
    /// exports across interactions load once and hand the table in here;
    /// the engine itself never caches.
    pub fn process_table(
        &self,
        table: &SalesTable,
        period_label: &str,
        manual_phantom_value: f64,
        persist_snapshot: bool,
    ) -> Result<MonthlyReport> {
        let cost_catalog = ingestion::load_cost_catalog(&self.variable_cost_path)?;
        let fixed_costs = ingestion::load_fixed_costs(&self.fixed_cost_path)?;

        let lines = cleaning::clean_sales(table);
        let (lines, scan) = anomaly::scan_phantom_sales(lines);
        let (costed, uncosted_products) = costing::join_costs(lines, &cost_catalog);
        let ledger = metrics::enrich(costed);

        let mut summary = summary::build_summary(
            &ledger,
            &fixed_costs,
            &scan,
            manual_phantom_value,
            period_label,
        );
        kpi::derive_kpis(&summary).apply(&mut summary);

        if persist_snapshot {
            export::persist_snapshot(Path::new("."), &summary, &ledger);
        }

        Ok(MonthlyReport {
            summary,
            ledger,
            uncosted_products,
        })
    }
}

/// Convenience entry point for one-off calls.
pub fn process_monthly_report<P, Q, R>(
    sales_path: P,
    variable_cost_path: Q,
    fixed_cost_path: R,
    period_label: &str,
    manual_phantom_value: f64,
    persist_snapshot: bool,
) -> Result<MonthlyReport>
where
    P: AsRef<Path>,
    Q: Into<PathBuf>,
    R: Into<PathBuf>,
{
    MarginEngine::new(variable_cost_path, fixed_cost_path).process_report(
        sales_path,
        period_label,
        manual_phantom_value,
        persist_snapshot,
    )
}
