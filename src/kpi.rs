use crate::schema::FinancialSummary;
use crate::summary::percent_of;

/// Derived indicators computed from a finished summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiSet {
    pub contribution_margin_ratio: f64,
    pub break_even_revenue: f64,
    pub cmv_percent: f64,
}

/// Computes the derived KPIs.
///
/// A non-positive contribution margin means break-even is unreachable at
/// current costs; that case reports 0 rather than failing or returning an
/// infinity.
pub fn derive_kpis(summary: &FinancialSummary) -> KpiSet {
    let contribution_margin_ratio = if summary.gross_revenue_real > 0.0 {
        summary.gross_margin / summary.gross_revenue_real
    } else {
        0.0
    };

    let break_even_revenue = if contribution_margin_ratio > 0.0 {
        summary.fixed_cost_total / contribution_margin_ratio
    } else {
        0.0
    };

    KpiSet {
        contribution_margin_ratio,
        break_even_revenue,
        cmv_percent: percent_of(summary.variable_cost_total, summary.gross_revenue_real),
    }
}

impl KpiSet {
    pub fn apply(&self, summary: &mut FinancialSummary) {
        summary.contribution_margin_ratio = self.contribution_margin_ratio;
        summary.break_even_revenue = self.break_even_revenue;
        summary.cmv_percent = self.cmv_percent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::PhantomScan;
    use crate::summary::build_summary;

    fn summary_with(real: f64, variable: f64, fixed: f64) -> FinancialSummary {
        let mut summary = build_summary(&[], &[], &PhantomScan::default(), 0.0, "m");
        summary.gross_revenue_real = real;
        summary.variable_cost_total = variable;
        summary.gross_margin = real - variable;
        summary.fixed_cost_total = fixed;
        summary
    }

    #[test]
    fn test_break_even_from_contribution_margin() {
        let summary = summary_with(1000.0, 400.0, 300.0);
        let kpis = derive_kpis(&summary);

        assert!((kpis.contribution_margin_ratio - 0.6).abs() < 1e-9);
        assert!((kpis.break_even_revenue - 500.0).abs() < 1e-9);
        assert!((kpis.cmv_percent - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_margin_reports_zero_break_even() {
        // Variable costs exceed revenue
        let kpis = derive_kpis(&summary_with(1000.0, 1200.0, 300.0));
        assert!(kpis.contribution_margin_ratio < 0.0);
        assert_eq!(kpis.break_even_revenue, 0.0);

        // No revenue at all
        let kpis = derive_kpis(&summary_with(0.0, 0.0, 300.0));
        assert_eq!(kpis.contribution_margin_ratio, 0.0);
        assert_eq!(kpis.break_even_revenue, 0.0);
        assert_eq!(kpis.cmv_percent, 0.0);
    }

    #[test]
    fn test_apply_copies_into_summary() {
        let mut summary = summary_with(1000.0, 400.0, 300.0);
        derive_kpis(&summary).apply(&mut summary);

        assert!((summary.contribution_margin_ratio - 0.6).abs() < 1e-9);
        assert!((summary.break_even_revenue - 500.0).abs() < 1e-9);
        assert!((summary.cmv_percent - 40.0).abs() < 1e-9);
    }
}
