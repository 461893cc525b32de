use anyhow::Result;
use margin_engine::{
    percent_delta, FinancialSummary, MarginEngine, MonthlyReport, GROWTH_FROM_ZERO_SENTINEL,
};
use std::path::{Path, PathBuf};

const SALES_HEADER: &str =
    "Category,Product,Quantity,GrossValue,Cash,Debit,Credit,CashlessWallet,Voucher,SplitBill,Other,Discount";

fn write_sales_csv(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("sales.csv");
    let mut content = String::from(SALES_HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn write_catalogs(dir: &Path, variable: &str, fixed: &str) -> (PathBuf, PathBuf) {
    let variable_path = dir.join("variable.csv");
    let fixed_path = dir.join("fixed.csv");
    std::fs::write(&variable_path, variable).unwrap();
    std::fs::write(&fixed_path, fixed).unwrap();
    (variable_path, fixed_path)
}

fn run(sales: &Path, variable: &Path, fixed: &Path, manual_phantom: f64) -> Result<MonthlyReport> {
    let engine = MarginEngine::new(variable, fixed);
    Ok(engine.process_report(sales, "October/2024", manual_phantom, false)?)
}

/// All non-timestamp summary fields as a comparable JSON value.
fn numeric_view(summary: &FinancialSummary) -> serde_json::Value {
    let mut value = serde_json::to_value(summary).unwrap();
    value.as_object_mut().unwrap().remove("processed_at");
    value
}

#[test]
fn test_per_row_net_revenue_identity() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sales = write_sales_csv(
        dir.path(),
        &[
            "Drinks,Cola,10,100.0,40.0,30.0,30.0,0,0,0,0,0",
            "Food,Burger,5,200.0,0,0,100.0,50.0,25.0,15.0,10.0,0",
            "Food,Pancake Combo,3,90.0,90.0,0,0,0,0,0,0,5.0",
        ],
    );
    let (variable, fixed) = write_catalogs(
        dir.path(),
        "Product,UnitCost\nCola,1.5\nBurger,8.0\nPancake Combo,6.0\n",
        "Name,Amount\nRent,100.0\n",
    );

    let report = run(&sales, &variable, &fixed, 0.0)?;

    assert_eq!(report.ledger.len(), 3);
    for row in &report.ledger {
        let expected =
            row.line.gross_value - f64::from(row.line.quantity) * row.unit_cost - row.total_fee;
        assert!(
            (row.net_revenue - expected).abs() < 1e-12,
            "net revenue identity broken for {}",
            row.line.product
        );
    }
    Ok(())
}

#[test]
fn test_zero_gross_rows_have_zero_margins() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sales = write_sales_csv(
        dir.path(),
        &[
            "Food,Freebie,2,0.0,0,0,0,0,0,0,0,0",
            "Food,Burger,5,200.0,200.0,0,0,0,0,0,0,0",
        ],
    );
    let (variable, fixed) = write_catalogs(
        dir.path(),
        "Product,UnitCost\nFreebie,3.0\nBurger,8.0\n",
        "Name,Amount\n",
    );

    let report = run(&sales, &variable, &fixed, 0.0)?;

    let freebie = report
        .ledger
        .iter()
        .find(|r| r.line.product == "Freebie")
        .unwrap();
    assert_eq!(freebie.unit_margin, 0.0);
    assert_eq!(freebie.margin_percent, 0.0);
    Ok(())
}

#[test]
fn test_real_plus_phantom_equals_system() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sales = write_sales_csv(
        dir.path(),
        &[
            "Drinks,Cola,10,100.0,100.0,0,0,0,0,0,0,0",
            "Other,Internal Kitchen Production,1,500.0,0,0,500.0,0,0,0,0,0",
            "Food,Burger,5,200.0,0,0,200.0,0,0,0,0,0",
        ],
    );
    let (variable, fixed) = write_catalogs(
        dir.path(),
        "Product,UnitCost\nCola,1.5\nBurger,8.0\n",
        "Name,Amount\nRent,100.0\n",
    );

    // Manual phantom value on top of the auto-detected row
    let report = run(&sales, &variable, &fixed, 150.0)?;
    let summary = &report.summary;

    assert!(
        (summary.gross_revenue_real + summary.phantom_value_total - summary.gross_revenue_system)
            .abs()
            < 1e-9
    );
    Ok(())
}

#[test]
fn test_auto_detection_scenario() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sales = write_sales_csv(
        dir.path(),
        &[
            "Drinks,Coca-Cola,10,100.0,100.0,0,0,0,0,0,0,0",
            "Other,Internal Kitchen Production,1,500.0,0,0,500.0,0,0,0,0,0",
            "Food,Burger,5,200.0,200.0,0,0,0,0,0,0,0",
            "Other,Internal Kitchen Production - Extra,1,100.0,0,0,0,0,0,0,100.0,0",
        ],
    );
    let (variable, fixed) = write_catalogs(
        dir.path(),
        "Product,UnitCost\nCoca-Cola,1.5\nBurger,8.0\n",
        "Name,Amount\nRent,100.0\n",
    );

    let report = run(&sales, &variable, &fixed, 0.0)?;
    let summary = &report.summary;

    assert!((summary.phantom_value_auto_detected - 600.0).abs() < 1e-9);
    assert!((summary.phantom_value_total - 600.0).abs() < 1e-9);
    assert!((summary.gross_revenue_system - 900.0).abs() < 1e-9);
    assert!((summary.gross_revenue_real - 300.0).abs() < 1e-9);

    assert_eq!(report.ledger.len(), 2);
    assert!(report
        .ledger
        .iter()
        .all(|r| !r.line.product.to_lowercase().contains("internal kitchen production")));

    // Removed rows still paid their processor fees: 500 credit + 100 other at 3%
    assert!((summary.fee_total_general - 18.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_percentage_entries_never_count_as_fixed_costs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sales = write_sales_csv(dir.path(), &["Food,Burger,5,200.0,200.0,0,0,0,0,0,0,0"]);
    let (variable, fixed) = write_catalogs(
        dir.path(),
        "Product,UnitCost\nBurger,8.0\n",
        "Name,Amount\n\
         Rent,5000.0\n\
         PERCENT_CARD_MACHINE,3.0\n\
         Payroll,12000.0\n\
         PERCENT_ACQUIRER_PROMO,1.5\n\
         Insurance,800.0\n",
    );

    let report = run(&sales, &variable, &fixed, 0.0)?;
    let summary = &report.summary;

    assert!((summary.fixed_cost_total - 17800.0).abs() < 1e-9);
    assert!(summary
        .fixed_costs_detail
        .keys()
        .all(|name| !name.starts_with("PERCENT_")));
    Ok(())
}

#[test]
fn test_break_even_is_zero_when_margin_not_positive() -> Result<()> {
    let dir = tempfile::tempdir()?;

    // Variable costs exceed revenue: contribution margin is negative
    let sales = write_sales_csv(dir.path(), &["Food,Burger,10,100.0,100.0,0,0,0,0,0,0,0"]);
    let (variable, fixed) = write_catalogs(
        dir.path(),
        "Product,UnitCost\nBurger,50.0\n",
        "Name,Amount\nRent,100.0\n",
    );
    let report = run(&sales, &variable, &fixed, 0.0)?;
    assert!(report.summary.contribution_margin_ratio < 0.0);
    assert_eq!(report.summary.break_even_revenue, 0.0);

    // No revenue at all: ratio is 0, break-even still 0
    let empty_sales = write_sales_csv(dir.path(), &[]);
    let report = run(&empty_sales, &variable, &fixed, 0.0)?;
    assert_eq!(report.summary.contribution_margin_ratio, 0.0);
    assert_eq!(report.summary.break_even_revenue, 0.0);
    Ok(())
}

#[test]
fn test_comparative_delta_branches() {
    assert_eq!(percent_delta(0.0, 0.0), 0.0);
    assert_eq!(percent_delta(42.0, 0.0), GROWTH_FROM_ZERO_SENTINEL);
    assert!((percent_delta(150.0, 100.0) - 50.0).abs() < 1e-9);
    assert!((percent_delta(75.0, 100.0) + 25.0).abs() < 1e-9);
}

#[test]
fn test_two_runs_are_bit_identical() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sales = write_sales_csv(
        dir.path(),
        &[
            "Drinks,Cola,10,100.37,50.11,25.13,25.13,0,0,0,0,0",
            "Other,Internal Kitchen Production,1,333.33,0,0,333.33,0,0,0,0,0",
            "Food,Burger,7,199.99,0,99.99,100.0,0,0,0,0,0",
        ],
    );
    let (variable, fixed) = write_catalogs(
        dir.path(),
        "Product,UnitCost\nCola,1.37\nBurger,8.05\n",
        "Name,Amount\nRent,5000.0\nPERCENT_CARD_MACHINE,3.0\n",
    );

    let first = run(&sales, &variable, &fixed, 77.77)?;
    let second = run(&sales, &variable, &fixed, 77.77)?;

    assert_eq!(numeric_view(&first.summary), numeric_view(&second.summary));
    assert_eq!(first.ledger, second.ledger);
    Ok(())
}

#[test]
fn test_markup_fallback_matches_csv_path() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let sales_csv = write_sales_csv(
        dir.path(),
        &[
            "Drinks,Cola,10,1234.5,1234.5,0,0,0,0,0,0,0",
            "Food,Burger,5,200.0,0,0,200.0,0,0,0,0,0",
        ],
    );

    // The same data as a legacy POS export: an HTML table misnamed .xls,
    // numbers in decimal-comma / thousands-dot form.
    let markup = format!(
        "<html><body><table>\n<tr>{}</tr>\n\
         <tr><td>Drinks</td><td>Cola</td><td>10</td><td>1.234,50</td><td>1.234,50</td>\
         <td>0</td><td>0</td><td>0</td><td>0</td><td>0</td><td>0</td><td>0</td></tr>\n\
         <tr><td>Food</td><td>Burger</td><td>5</td><td>200,00</td><td>0</td><td>0</td>\
         <td>200,00</td><td>0</td><td>0</td><td>0</td><td>0</td><td>0</td></tr>\n\
         </table></body></html>",
        SALES_HEADER
            .split(',')
            .map(|h| format!("<th>{}</th>", h))
            .collect::<String>()
    );
    let sales_xls = dir.path().join("legacy.xls");
    std::fs::write(&sales_xls, markup)?;

    let (variable, fixed) = write_catalogs(
        dir.path(),
        "Product,UnitCost\nCola,1.5\nBurger,8.0\n",
        "Name,Amount\nRent,100.0\n",
    );

    let from_csv = run(&sales_csv, &variable, &fixed, 0.0)?;
    let from_markup = run(&sales_xls, &variable, &fixed, 0.0)?;

    assert_eq!(
        numeric_view(&from_csv.summary),
        numeric_view(&from_markup.summary)
    );
    Ok(())
}

#[test]
fn test_manual_phantom_rides_the_credit_channel() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let sales = write_sales_csv(
        dir.path(),
        &[
            "Food,Burger,5,1000.0,0,0,1000.0,0,0,0,0,0",
            "Drinks,Cola,10,100.0,100.0,0,0,0,0,0,0,0",
        ],
    );
    let (variable, fixed) = write_catalogs(
        dir.path(),
        "Product,UnitCost\nBurger,8.0\nCola,1.5\n",
        "Name,Amount\n",
    );

    let report = run(&sales, &variable, &fixed, 400.0)?;
    let summary = &report.summary;

    assert!((summary.credit_gross - 1000.0).abs() < 1e-9);
    assert!((summary.credit_net - 600.0).abs() < 1e-9);
    assert!((summary.gross_revenue_real - 700.0).abs() < 1e-9);
    assert!((summary.phantom_fee - 12.0).abs() < 1e-9);
    // Fees stay charged on the gross credit amount
    assert!((summary.fee_credit_gross - 30.0).abs() < 1e-9);
    Ok(())
}
