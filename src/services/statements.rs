// src/services/statements.rs
//
// Joins the three raw statement documents into one per-fiscal-year table
// and derives the ratio and growth columns the DCF projector consumes.
//
// The join is keyed on fiscalYear: a year present in one document but
// missing from another is rejected as a shape error, so the order of the
// records inside each document does not matter.

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{BalanceSheetReport, CashFlowReport, FiscalYearRecord, IncomeReport};

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("statement documents contain no yearly records")]
    Empty,

    #[error("statement documents disagree on fiscal years: {0} records in income, {1} in cash flow, {2} in balance sheet")]
    LengthMismatch(usize, usize, usize),

    #[error("fiscal year {year} is missing from the {document} document")]
    YearMismatch { year: i32, document: &'static str },

    #[error("duplicate fiscal year {year} in the {document} document")]
    DuplicateYear { year: i32, document: &'static str },

    #[error("symbol mismatch across statements: {0} vs {1}")]
    SymbolMismatch(String, String),

    // Fail fast instead of letting a NaN ratio flow into the projection.
    #[error("fiscal year {year}: {field} is zero, cannot derive ratio columns")]
    ZeroDenominator { year: i32, field: &'static str },
}

fn index_by_year<'a, T, F>(
    records: &'a [T],
    year_of: F,
    document: &'static str,
) -> Result<HashMap<i32, &'a T>, StatementError>
where
    F: Fn(&T) -> i32,
{
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        let year = year_of(record);
        if map.insert(year, record).is_some() {
            return Err(StatementError::DuplicateYear { year, document });
        }
    }
    Ok(map)
}

/// Build the historical fiscal-year table from the three statement
/// documents, oldest year first, with the derived ratio and growth columns
/// populated.
pub fn normalize_statements(
    balance_sheet: &BalanceSheetReport,
    cash_flow: &CashFlowReport,
    income: &IncomeReport,
) -> Result<Vec<FiscalYearRecord>, StatementError> {
    if income.income.is_empty() {
        return Err(StatementError::Empty);
    }
    if income.income.len() != cash_flow.cashflow.len()
        || income.income.len() != balance_sheet.balancesheet.len()
    {
        return Err(StatementError::LengthMismatch(
            income.income.len(),
            cash_flow.cashflow.len(),
            balance_sheet.balancesheet.len(),
        ));
    }

    let cash_by_year = index_by_year(&cash_flow.cashflow, |r| r.fiscal_year, "cash flow")?;
    let balance_by_year =
        index_by_year(&balance_sheet.balancesheet, |r| r.fiscal_year, "balance sheet")?;
    index_by_year(&income.income, |r| r.fiscal_year, "income")?;

    let symbol = &income.income[0].symbol;
    let mut rows = Vec::with_capacity(income.income.len());

    for inc in &income.income {
        if inc.symbol != *symbol {
            return Err(StatementError::SymbolMismatch(
                symbol.clone(),
                inc.symbol.clone(),
            ));
        }
        let cf = cash_by_year
            .get(&inc.fiscal_year)
            .ok_or(StatementError::YearMismatch {
                year: inc.fiscal_year,
                document: "cash flow",
            })?;
        let bs = balance_by_year
            .get(&inc.fiscal_year)
            .ok_or(StatementError::YearMismatch {
                year: inc.fiscal_year,
                document: "balance sheet",
            })?;

        if inc.total_revenue == 0.0 {
            return Err(StatementError::ZeroDenominator {
                year: inc.fiscal_year,
                field: "totalRevenue",
            });
        }
        if inc.net_income == 0.0 {
            return Err(StatementError::ZeroDenominator {
                year: inc.fiscal_year,
                field: "netIncome",
            });
        }

        // Capex comes in negative, so this is cash flow net of reinvestment.
        let fcf_equity = cf.cash_flow + cf.capital_expenditures;

        rows.push(FiscalYearRecord {
            symbol: symbol.clone(),
            fiscal_year: inc.fiscal_year,
            total_revenue: Some(inc.total_revenue),
            net_income: Some(inc.net_income),
            cash_flow: Some(cf.cash_flow),
            capital_expenditures: Some(cf.capital_expenditures),
            current_long_term_debt: Some(bs.current_long_term_debt),
            long_term_debt: Some(bs.long_term_debt),
            fcf_equity: Some(fcf_equity),
            fcf_by_total_revenue: Some(fcf_equity / inc.total_revenue),
            fcf_by_net_income: Some(fcf_equity / inc.net_income),
            revenue_growth_rate: 0.0,
            net_income_margin: Some(inc.net_income / inc.total_revenue),
            discount_factor: 0.0,
            pv_future_cashflow: 0.0,
        });
    }

    // Source documents arrive most recent year first; the model wants the
    // table time-ordered.
    rows.sort_by_key(|r| r.fiscal_year);

    for i in 1..rows.len() {
        let prev = rows[i - 1].total_revenue.unwrap_or(0.0);
        let cur = rows[i].total_revenue.unwrap_or(0.0);
        rows[i].revenue_growth_rate = (cur - prev) / prev;
    }

    Ok(rows)
}
