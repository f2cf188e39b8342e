// src/models.rs
use serde::{Deserialize, Serialize};

/// One yearly line-item record from the IEX income statement endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    pub symbol: String,
    pub fiscal_year: i32,
    pub total_revenue: f64,
    pub net_income: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowRecord {
    pub fiscal_year: i32,
    pub cash_flow: f64,
    /// Reported as a negative amount by the API.
    pub capital_expenditures: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetRecord {
    pub fiscal_year: i32,
    #[serde(default)]
    pub current_long_term_debt: f64,
    #[serde(default)]
    pub long_term_debt: f64,
}

/// The statement endpoints wrap their yearly records under a single
/// collection key (`income`, `cashflow`, `balancesheet`), most recent
/// fiscal year first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeReport {
    pub symbol: String,
    pub income: Vec<IncomeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowReport {
    pub symbol: String,
    pub cashflow: Vec<CashFlowRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    pub symbol: String,
    pub balancesheet: Vec<BalanceSheetRecord>,
}

/// Subset of the IEX key-stats document the dashboard reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStats {
    #[serde(default)]
    pub company_name: String,
    pub shares_outstanding: f64,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyLogo {
    pub url: String,
}

/// Fiscal year used for the terminal-value placeholder row.
pub const TERMINAL_YEAR: i32 = 9999;

/// One row of the DCF working table, historical or projected.
///
/// Rows are kept oldest fiscal year first. Statement-derived fields are
/// `None` on projected rows until the projection pass fills them in; the
/// terminal row carries only `fcf_equity`. `discount_factor` and
/// `pv_future_cashflow` stay 0 on historical rows, which keeps them out of
/// the present-value sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalYearRecord {
    pub symbol: String,
    pub fiscal_year: i32,
    pub total_revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub cash_flow: Option<f64>,
    pub capital_expenditures: Option<f64>,
    pub current_long_term_debt: Option<f64>,
    pub long_term_debt: Option<f64>,
    pub fcf_equity: Option<f64>,
    pub fcf_by_total_revenue: Option<f64>,
    pub fcf_by_net_income: Option<f64>,
    pub revenue_growth_rate: f64,
    pub net_income_margin: Option<f64>,
    pub discount_factor: f64,
    pub pv_future_cashflow: f64,
}

impl FiscalYearRecord {
    /// Blank row for a projected fiscal year.
    pub fn projected(symbol: &str, fiscal_year: i32) -> Self {
        FiscalYearRecord {
            symbol: symbol.to_string(),
            fiscal_year,
            total_revenue: None,
            net_income: None,
            cash_flow: None,
            capital_expenditures: None,
            current_long_term_debt: None,
            long_term_debt: None,
            fcf_equity: None,
            fcf_by_total_revenue: None,
            fcf_by_net_income: None,
            revenue_growth_rate: 0.0,
            net_income_margin: None,
            discount_factor: 0.0,
            pv_future_cashflow: 0.0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.fiscal_year == TERMINAL_YEAR
    }
}
