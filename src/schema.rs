use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category assigned by the point-of-sale system to its report total rows.
/// Rows carrying it are aggregates of the rows above them, not sales.
pub const GRAND_TOTAL_CATEGORY: &str = "Grand Total";

/// Case-insensitive substring that identifies internal kitchen-production
/// transfers recorded as if they were sales. Rows matching it are phantom
/// sales ("pedaladas"): their value masks a cash shortfall and must be
/// excluded from real revenue, but their card-processing fee is a real cost.
pub const PHANTOM_SALE_MARKER: &str = "internal kitchen production";

/// Fixed-cost catalog entries whose name starts with this prefix are
/// percentage rates, not absolute monthly amounts. They are excluded from
/// the fixed-cost sum because the per-transaction fees they describe are
/// already computed from the rate table.
pub const PERCENT_ENTRY_PREFIX: &str = "PERCENT_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum PaymentMethod {
    #[schemars(description = "Cash payment. No processor involved, 0% fee.")]
    Cash,

    #[schemars(description = "Debit card. 2% processor fee.")]
    Debit,

    #[schemars(description = "Credit card. 3% processor fee.")]
    Credit,

    #[schemars(description = "Prepaid cashless wallet (wristband/card). Settled through the credit acquirer, 3% fee.")]
    CashlessWallet,

    #[schemars(description = "Meal voucher. 3% fee.")]
    Voucher,

    #[schemars(description = "Split bill across several payers. 3% fee.")]
    SplitBill,

    #[schemars(description = "Any other payment channel. Treated as credit, 3% fee.")]
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 7] = [
        PaymentMethod::Cash,
        PaymentMethod::Debit,
        PaymentMethod::Credit,
        PaymentMethod::CashlessWallet,
        PaymentMethod::Voucher,
        PaymentMethod::SplitBill,
        PaymentMethod::Other,
    ];

    /// Processor fee rate charged on amounts settled through this method.
    pub fn fee_rate(&self) -> f64 {
        match self {
            PaymentMethod::Cash => 0.0,
            PaymentMethod::Debit => 0.02,
            _ => 0.03,
        }
    }

    /// Header of the column carrying this method's amounts in a sales export.
    pub fn column_name(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Debit => "Debit",
            PaymentMethod::Credit => "Credit",
            PaymentMethod::CashlessWallet => "CashlessWallet",
            PaymentMethod::Voucher => "Voucher",
            PaymentMethod::SplitBill => "SplitBill",
            PaymentMethod::Other => "Other",
        }
    }
}

/// Per-payment-method decimal amounts for one sale line. Also reused to
/// carry the per-method fees derived from those amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PaymentBreakdown {
    pub cash: f64,
    pub debit: f64,
    pub credit: f64,
    pub cashless_wallet: f64,
    pub voucher: f64,
    pub split_bill: f64,
    pub other: f64,
}

impl PaymentBreakdown {
    pub fn amount(&self, method: PaymentMethod) -> f64 {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::Debit => self.debit,
            PaymentMethod::Credit => self.credit,
            PaymentMethod::CashlessWallet => self.cashless_wallet,
            PaymentMethod::Voucher => self.voucher,
            PaymentMethod::SplitBill => self.split_bill,
            PaymentMethod::Other => self.other,
        }
    }

    pub fn set_amount(&mut self, method: PaymentMethod, value: f64) {
        match method {
            PaymentMethod::Cash => self.cash = value,
            PaymentMethod::Debit => self.debit = value,
            PaymentMethod::Credit => self.credit = value,
            PaymentMethod::CashlessWallet => self.cashless_wallet = value,
            PaymentMethod::Voucher => self.voucher = value,
            PaymentMethod::SplitBill => self.split_bill = value,
            PaymentMethod::Other => self.other = value,
        }
    }

    pub fn total(&self) -> f64 {
        PaymentMethod::ALL.iter().map(|m| self.amount(*m)).sum()
    }

    /// Element-wise application of the fixed rate table.
    pub fn fees(&self) -> PaymentBreakdown {
        let mut fees = PaymentBreakdown::default();
        for method in PaymentMethod::ALL {
            fees.set_amount(method, self.amount(method) * method.fee_rate());
        }
        fees
    }
}

/// One cleaned row of the sales export. Transient: built fresh per
/// processing call, never cached between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SaleLine {
    pub category: String,
    pub product: String,
    pub quantity: u32,
    pub gross_value: f64,
    pub payments: PaymentBreakdown,
    pub discount: f64,
}

/// One row of the variable-cost catalog: what one unit of a product costs
/// in ingredients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CostCatalogEntry {
    pub product: String,
    pub unit_cost: f64,
}

/// One row of the fixed-cost catalog. Names starting with
/// [`PERCENT_ENTRY_PREFIX`] mark rate entries rather than absolute amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct FixedCostEntry {
    pub name: String,
    pub amount: f64,
}

impl FixedCostEntry {
    pub fn is_percentage_entry(&self) -> bool {
        self.name.starts_with(PERCENT_ENTRY_PREFIX)
    }
}

/// A sale line enriched with its variable cost and derived per-row figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnrichedSaleLine {
    pub line: SaleLine,

    #[schemars(description = "Unit ingredient cost joined from the variable-cost catalog; 0 when the product is uncatalogued.")]
    pub unit_cost: f64,

    #[schemars(description = "Per-method processor fees for this row (amount x fixed rate).")]
    pub fees: PaymentBreakdown,

    pub total_fee: f64,
    pub total_cost: f64,
    pub net_revenue: f64,

    #[schemars(description = "Net revenue per unit sold. 0 when the row has zero gross value or zero quantity.")]
    pub unit_margin: f64,

    #[schemars(description = "Net revenue as a percentage of gross value. 0 when gross value is not positive.")]
    pub margin_percent: f64,
}

/// The financial summary for one processed period. Every field is derived
/// by exactly one formula in the aggregation stage; none can be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialSummary {
    pub period_label: String,
    pub processed_at: DateTime<Utc>,

    #[schemars(description = "Revenue as reported by the POS system, phantom sales included.")]
    pub gross_revenue_system: f64,

    #[schemars(description = "Revenue after deducting all phantom-sale value. The figure every margin is measured against.")]
    pub gross_revenue_real: f64,

    pub phantom_value_manual: f64,
    pub phantom_value_auto_detected: f64,
    pub phantom_value_total: f64,

    #[schemars(description = "Card-processing fee incurred by the phantom value (3%). The sale is fictitious, the fee is not.")]
    pub phantom_fee: f64,

    pub cash_total: f64,
    pub debit_total: f64,
    pub credit_gross: f64,

    #[schemars(description = "Credit channel total after removing phantom value, which rides the credit channel.")]
    pub credit_net: f64,

    pub cashless_total: f64,
    pub voucher_total: f64,
    pub split_total: f64,
    pub other_total: f64,

    pub fee_debit_total: f64,
    pub fee_credit_gross: f64,
    pub fee_credit_net: f64,
    pub fee_cashless_total: f64,
    pub fee_voucher_total: f64,
    pub fee_split_total: f64,
    pub fee_other_total: f64,

    #[schemars(description = "All processor fees actually paid: per-method fees on gross amounts plus the fee of auto-detected phantom rows removed from the ledger.")]
    pub fee_total_general: f64,

    pub variable_cost_total: f64,
    pub gross_margin: f64,
    pub gross_margin_percent: f64,

    #[schemars(description = "Sum of absolute fixed costs. Percentage-type catalog entries are excluded.")]
    pub fixed_cost_total: f64,

    pub fixed_costs_detail: BTreeMap<String, f64>,

    pub net_profit: f64,
    pub net_margin_percent: f64,

    pub total_quantity: u64,
    pub product_count: usize,
    pub average_ticket_real: f64,

    #[schemars(description = "Gross margin as a fraction of real revenue. 0 when real revenue is not positive.")]
    pub contribution_margin_ratio: f64,

    #[schemars(description = "Revenue needed to cover fixed costs at the current contribution margin. 0 when the margin is not positive.")]
    pub break_even_revenue: f64,

    #[schemars(description = "Cost of goods sold as a percentage of real revenue.")]
    pub cmv_percent: f64,
}

impl FinancialSummary {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FinancialSummary)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
