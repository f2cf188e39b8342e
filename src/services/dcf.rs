// src/services/dcf.rs
//
// Discounted-cash-flow projection over the normalized fiscal-year table.
// The model runs as delimited passes over one row buffer: horizon
// extension, baseline averages, growth projection, terminal-value row,
// discounting, aggregation. Historical rows are never rewritten after
// normalization.

use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::models::{FiscalYearRecord, KeyStats, TERMINAL_YEAR};
use crate::models::{BalanceSheetReport, CashFlowReport, IncomeReport};
use crate::services::statements::{normalize_statements, StatementError};

/// Tunable valuation assumptions. Defaults reproduce the dashboard's
/// reference behavior: a four-year historical window projected through
/// 2026 at a 10% discount rate and 2% perpetuity growth.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DcfAssumptions {
    pub historical_years: usize,
    pub projection_end_year: i32,
    pub wacc: f64,
    pub long_term_growth: f64,
}

impl Default for DcfAssumptions {
    fn default() -> Self {
        DcfAssumptions {
            historical_years: 4,
            projection_end_year: 2026,
            wacc: 0.10,
            long_term_growth: 0.02,
        }
    }
}

/// Flat-rate baselines averaged from the historical window. All four are
/// returned to the dashboard as diagnostics; `avg_fcf_by_total_revenue`
/// does not feed the projection itself.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DcfBaselines {
    pub avg_revenue_growth_rate: f64,
    pub avg_net_income_margin: f64,
    pub avg_fcf_by_net_income: f64,
    pub avg_fcf_by_total_revenue: f64,
}

/// Full result of one DCF run: the scalar the dashboard headline shows
/// plus the model table behind it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DcfValuation {
    pub symbol: String,
    pub fair_value_per_share: f64,
    pub shares_outstanding: f64,
    pub baselines: DcfBaselines,
    pub rows: Vec<FiscalYearRecord>,
}

#[derive(Error, Debug)]
pub enum DcfError {
    #[error(transparent)]
    Statement(#[from] StatementError),

    #[error("need at least {needed} historical fiscal years, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    #[error("projection end year {end} is not after the last historical year {last}")]
    EmptyHorizon { end: i32, last: i32 },

    #[error("discount rate {wacc} must exceed long-term growth {growth}")]
    InvalidDiscountRate { wacc: f64, growth: f64 },

    #[error("sharesOutstanding must be a positive number, got {0}")]
    InvalidSharesOutstanding(f64),

    #[error("historical row for {year} is missing {field}")]
    MissingField { year: i32, field: &'static str },
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// The spec'd core operation: normalize the four raw documents, run the
/// projection, return fair value of equity per share.
pub fn compute_fair_value_per_share(
    balance_sheet: &BalanceSheetReport,
    cash_flow: &CashFlowReport,
    income: &IncomeReport,
    stats: &KeyStats,
    assumptions: &DcfAssumptions,
) -> Result<f64, DcfError> {
    run_dcf(balance_sheet, cash_flow, income, stats, assumptions)
        .map(|valuation| valuation.fair_value_per_share)
}

/// Run the full DCF model and keep the table for display.
pub fn run_dcf(
    balance_sheet: &BalanceSheetReport,
    cash_flow: &CashFlowReport,
    income: &IncomeReport,
    stats: &KeyStats,
    assumptions: &DcfAssumptions,
) -> Result<DcfValuation, DcfError> {
    let rows = normalize_statements(balance_sheet, cash_flow, income)?;
    project(rows, stats.shares_outstanding, assumptions)
}

/// Projection over an already-normalized historical table (oldest year
/// first). Exposed separately so the passes can be exercised without the
/// raw documents.
pub fn project(
    mut rows: Vec<FiscalYearRecord>,
    shares_outstanding: f64,
    assumptions: &DcfAssumptions,
) -> Result<DcfValuation, DcfError> {
    if !(assumptions.wacc > assumptions.long_term_growth) {
        return Err(DcfError::InvalidDiscountRate {
            wacc: assumptions.wacc,
            growth: assumptions.long_term_growth,
        });
    }
    if !(shares_outstanding > 0.0) || !shares_outstanding.is_finite() {
        return Err(DcfError::InvalidSharesOutstanding(shares_outstanding));
    }
    // A window below one row cannot seed the projection chain.
    let window = assumptions.historical_years.max(1);
    if rows.len() < window {
        return Err(DcfError::InsufficientHistory {
            needed: window,
            got: rows.len(),
        });
    }

    let hist_len = rows.len();
    let last_year = rows[hist_len - 1].fiscal_year;
    if assumptions.projection_end_year <= last_year {
        return Err(DcfError::EmptyHorizon {
            end: assumptions.projection_end_year,
            last: last_year,
        });
    }

    let baselines = historical_baselines(&rows, window)?;
    debug!(
        "baselines for {}: growth {:.4}, margin {:.4}, fcf/ni {:.4}",
        rows[0].symbol,
        baselines.avg_revenue_growth_rate,
        baselines.avg_net_income_margin,
        baselines.avg_fcf_by_net_income
    );

    extend_horizon(&mut rows, assumptions.projection_end_year);
    project_growth(&mut rows, hist_len, &baselines)?;
    append_terminal_row(&mut rows, assumptions)?;
    apply_discounting(&mut rows, hist_len, assumptions.wacc);

    let present_value: f64 = rows.iter().map(|r| r.pv_future_cashflow).sum();
    let fair_value_per_share = present_value / shares_outstanding;

    Ok(DcfValuation {
        symbol: rows[0].symbol.clone(),
        fair_value_per_share,
        shares_outstanding,
        baselines,
        rows,
    })
}

/// Average the growth and margin ratios over the trailing historical
/// window. The growth average skips the window's first row, whose growth
/// observation looks back before the window.
fn historical_baselines(
    historical: &[FiscalYearRecord],
    window: usize,
) -> Result<DcfBaselines, DcfError> {
    let start = historical.len() - window;
    let window_rows = &historical[start..];

    let growth: Vec<f64> = window_rows[1..]
        .iter()
        .map(|r| r.revenue_growth_rate)
        .collect();

    let mut margins = Vec::with_capacity(window);
    let mut fcf_by_ni = Vec::with_capacity(window);
    let mut fcf_by_rev = Vec::with_capacity(window);
    for row in window_rows {
        margins.push(row.net_income_margin.ok_or(DcfError::MissingField {
            year: row.fiscal_year,
            field: "netIncomeMargin",
        })?);
        fcf_by_ni.push(row.fcf_by_net_income.ok_or(DcfError::MissingField {
            year: row.fiscal_year,
            field: "fcfByNetIncome",
        })?);
        fcf_by_rev.push(row.fcf_by_total_revenue.ok_or(DcfError::MissingField {
            year: row.fiscal_year,
            field: "fcfByTotalRevenue",
        })?);
    }

    Ok(DcfBaselines {
        avg_revenue_growth_rate: mean(&growth),
        avg_net_income_margin: mean(&margins),
        avg_fcf_by_net_income: mean(&fcf_by_ni),
        avg_fcf_by_total_revenue: mean(&fcf_by_rev),
    })
}

/// Append one blank row per fiscal year from the year after the last
/// historical one through the projection end year inclusive.
fn extend_horizon(rows: &mut Vec<FiscalYearRecord>, end_year: i32) {
    let symbol = rows[0].symbol.clone();
    let last_year = rows[rows.len() - 1].fiscal_year;
    for year in (last_year + 1)..=end_year {
        rows.push(FiscalYearRecord::projected(&symbol, year));
    }
}

/// Fill the projected rows from the flat-rate assumptions, chaining each
/// year off the previous row.
fn project_growth(
    rows: &mut [FiscalYearRecord],
    hist_len: usize,
    baselines: &DcfBaselines,
) -> Result<(), DcfError> {
    for i in hist_len..rows.len() {
        let prev_revenue = rows[i - 1].total_revenue.ok_or(DcfError::MissingField {
            year: rows[i - 1].fiscal_year,
            field: "totalRevenue",
        })?;
        let prev_net_income = rows[i - 1].net_income.ok_or(DcfError::MissingField {
            year: rows[i - 1].fiscal_year,
            field: "netIncome",
        })?;

        let net_income = prev_net_income * (1.0 + baselines.avg_net_income_margin);
        rows[i].total_revenue = Some(prev_revenue * (1.0 + baselines.avg_revenue_growth_rate));
        rows[i].net_income = Some(net_income);
        rows[i].fcf_equity = Some(net_income * baselines.avg_fcf_by_net_income);
    }
    Ok(())
}

/// Gordon-growth perpetuity as of the last projected year, carried in a
/// sentinel row so it rides through discounting with the rest of the table.
fn append_terminal_row(
    rows: &mut Vec<FiscalYearRecord>,
    assumptions: &DcfAssumptions,
) -> Result<(), DcfError> {
    let last = &rows[rows.len() - 1];
    let last_fcf = last.fcf_equity.ok_or(DcfError::MissingField {
        year: last.fiscal_year,
        field: "fcfEquity",
    })?;

    let mut terminal = FiscalYearRecord::projected(&rows[0].symbol, TERMINAL_YEAR);
    terminal.fcf_equity = Some(
        last_fcf * (1.0 + assumptions.long_term_growth)
            / (assumptions.wacc - assumptions.long_term_growth),
    );
    rows.push(terminal);
    Ok(())
}

/// Discount every future cash flow to present value. The first projected
/// year discounts at exponent 1; the terminal row reuses the last discrete
/// year's factor since the perpetuity is valued as of that year.
fn apply_discounting(rows: &mut [FiscalYearRecord], hist_len: usize, wacc: f64) {
    let last_discrete = rows.len() - 2;
    for i in hist_len..=last_discrete {
        let factor = (1.0 + wacc).powi((i - (hist_len - 1)) as i32);
        rows[i].discount_factor = factor;
        rows[i].pv_future_cashflow = rows[i].fcf_equity.unwrap_or(0.0) / factor;
    }

    let terminal = rows.len() - 1;
    let factor = rows[last_discrete].discount_factor;
    rows[terminal].discount_factor = factor;
    rows[terminal].pv_future_cashflow = rows[terminal].fcf_equity.unwrap_or(0.0) / factor;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BalanceSheetRecord, BalanceSheetReport, CashFlowRecord, CashFlowReport, IncomeRecord,
        IncomeReport, KeyStats,
    };

    const EPS: f64 = 1e-9;

    // Four years ending 2020: revenue grows 10%/year from 100, net income
    // margin 20%, free cash flow 0.8x net income.
    fn synthetic_reports() -> (BalanceSheetReport, CashFlowReport, IncomeReport, KeyStats) {
        let years = [2020, 2019, 2018, 2017];
        let revenue = |y: i32| 100.0 * 1.1_f64.powi(y - 2017);
        let income = IncomeReport {
            symbol: "SYN".into(),
            income: years
                .iter()
                .map(|&y| IncomeRecord {
                    symbol: "SYN".into(),
                    fiscal_year: y,
                    total_revenue: revenue(y),
                    net_income: revenue(y) * 0.2,
                })
                .collect(),
        };
        let cashflow = CashFlowReport {
            symbol: "SYN".into(),
            cashflow: years
                .iter()
                .map(|&y| CashFlowRecord {
                    fiscal_year: y,
                    cash_flow: revenue(y) * 0.2 * 0.8 + 2.0,
                    capital_expenditures: -2.0,
                })
                .collect(),
        };
        let balance = BalanceSheetReport {
            symbol: "SYN".into(),
            balancesheet: years
                .iter()
                .map(|&y| BalanceSheetRecord {
                    fiscal_year: y,
                    current_long_term_debt: 1.0,
                    long_term_debt: 10.0,
                })
                .collect(),
        };
        let stats = KeyStats {
            company_name: "Synthetic Co".into(),
            shares_outstanding: 1000.0,
            market_cap: None,
        };
        (balance, cashflow, income, stats)
    }

    #[test]
    fn row_count_is_history_plus_horizon_plus_terminal() {
        let (bs, cf, inc, stats) = synthetic_reports();
        let assumptions = DcfAssumptions::default();
        let valuation = run_dcf(&bs, &cf, &inc, &stats, &assumptions).unwrap();
        // 4 historical + 2021..=2026 + terminal sentinel
        assert_eq!(valuation.rows.len(), 4 + 6 + 1);
        assert!(valuation.rows.last().unwrap().is_terminal());
    }

    #[test]
    fn baselines_match_synthetic_inputs() {
        let (bs, cf, inc, stats) = synthetic_reports();
        let valuation = run_dcf(&bs, &cf, &inc, &stats, &DcfAssumptions::default()).unwrap();
        let b = valuation.baselines;
        assert!((b.avg_revenue_growth_rate - 0.1).abs() < EPS);
        assert!((b.avg_net_income_margin - 0.2).abs() < EPS);
        assert!((b.avg_fcf_by_net_income - 0.8).abs() < EPS);
        assert!((b.avg_fcf_by_total_revenue - 0.16).abs() < EPS);
    }

    #[test]
    fn discount_factors_grow_geometrically_from_first_projected_year() {
        let (bs, cf, inc, stats) = synthetic_reports();
        let valuation = run_dcf(&bs, &cf, &inc, &stats, &DcfAssumptions::default()).unwrap();
        let rows = &valuation.rows;

        assert!((rows[4].discount_factor - 1.1).abs() < EPS);
        let last_discrete = rows.len() - 2;
        for i in 5..=last_discrete {
            assert!(
                (rows[i].discount_factor / rows[i - 1].discount_factor - 1.1).abs() < EPS,
                "discount factor ratio broken at index {}",
                i
            );
        }
        // Terminal row reuses the last discrete factor.
        assert_eq!(
            rows[last_discrete].discount_factor,
            rows[last_discrete + 1].discount_factor
        );
    }

    #[test]
    fn historical_rows_contribute_nothing_to_present_value() {
        let (bs, cf, inc, stats) = synthetic_reports();
        let valuation = run_dcf(&bs, &cf, &inc, &stats, &DcfAssumptions::default()).unwrap();
        for row in &valuation.rows[..4] {
            assert_eq!(row.discount_factor, 0.0);
            assert_eq!(row.pv_future_cashflow, 0.0);
        }
        for row in &valuation.rows[4..] {
            assert!(row.pv_future_cashflow > 0.0);
        }
    }

    #[test]
    fn single_projected_year_matches_hand_computation() {
        let (bs, cf, inc, stats) = synthetic_reports();
        let assumptions = DcfAssumptions {
            projection_end_year: 2021,
            ..DcfAssumptions::default()
        };
        let valuation = run_dcf(&bs, &cf, &inc, &stats, &assumptions).unwrap();
        let b = valuation.baselines;

        let ni_2020 = 100.0 * 1.1_f64.powi(3) * 0.2;
        let ni_2021 = ni_2020 * (1.0 + b.avg_net_income_margin);
        let fcf_2021 = ni_2021 * b.avg_fcf_by_net_income;
        let terminal_fcf = fcf_2021 * 1.02 / (0.10 - 0.02);
        let expected = (fcf_2021 / 1.1 + terminal_fcf / 1.1) / 1000.0;

        assert!((valuation.fair_value_per_share - expected).abs() < EPS);
    }

    #[test]
    fn terminal_row_holds_gordon_growth_perpetuity() {
        let (bs, cf, inc, stats) = synthetic_reports();
        let valuation = run_dcf(&bs, &cf, &inc, &stats, &DcfAssumptions::default()).unwrap();
        let rows = &valuation.rows;
        let last_fcf = rows[rows.len() - 2].fcf_equity.unwrap();
        let terminal_fcf = rows[rows.len() - 1].fcf_equity.unwrap();
        assert!((terminal_fcf - last_fcf * 1.02 / 0.08).abs() < EPS);
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let (bs, cf, inc, stats) = synthetic_reports();
        let a = compute_fair_value_per_share(&bs, &cf, &inc, &stats, &DcfAssumptions::default())
            .unwrap();
        let b = compute_fair_value_per_share(&bs, &cf, &inc, &stats, &DcfAssumptions::default())
            .unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn doubling_shares_outstanding_halves_fair_value() {
        let (bs, cf, inc, mut stats) = synthetic_reports();
        let single =
            compute_fair_value_per_share(&bs, &cf, &inc, &stats, &DcfAssumptions::default())
                .unwrap();
        stats.shares_outstanding *= 2.0;
        let doubled =
            compute_fair_value_per_share(&bs, &cf, &inc, &stats, &DcfAssumptions::default())
                .unwrap();
        assert_eq!(doubled * 2.0, single);
    }

    #[test]
    fn rejects_wacc_not_above_long_term_growth() {
        let (bs, cf, inc, stats) = synthetic_reports();
        let assumptions = DcfAssumptions {
            wacc: 0.02,
            long_term_growth: 0.02,
            ..DcfAssumptions::default()
        };
        assert!(matches!(
            run_dcf(&bs, &cf, &inc, &stats, &assumptions),
            Err(DcfError::InvalidDiscountRate { .. })
        ));
    }

    #[test]
    fn rejects_zero_shares_outstanding() {
        let (bs, cf, inc, mut stats) = synthetic_reports();
        stats.shares_outstanding = 0.0;
        assert!(matches!(
            run_dcf(&bs, &cf, &inc, &stats, &DcfAssumptions::default()),
            Err(DcfError::InvalidSharesOutstanding(_))
        ));
    }

    #[test]
    fn rejects_short_history() {
        let (mut bs, mut cf, mut inc, stats) = synthetic_reports();
        bs.balancesheet.pop();
        cf.cashflow.pop();
        inc.income.pop();
        assert!(matches!(
            run_dcf(&bs, &cf, &inc, &stats, &DcfAssumptions::default()),
            Err(DcfError::InsufficientHistory { needed: 4, got: 3 })
        ));
    }

    #[test]
    fn rejects_empty_projection_horizon() {
        let (bs, cf, inc, stats) = synthetic_reports();
        let assumptions = DcfAssumptions {
            projection_end_year: 2020,
            ..DcfAssumptions::default()
        };
        assert!(matches!(
            run_dcf(&bs, &cf, &inc, &stats, &assumptions),
            Err(DcfError::EmptyHorizon { end: 2020, last: 2020 })
        ));
    }

    #[test]
    fn shape_errors_surface_through_the_core() {
        let (bs, mut cf, inc, stats) = synthetic_reports();
        cf.cashflow[0].fiscal_year = 1999;
        assert!(matches!(
            run_dcf(&bs, &cf, &inc, &stats, &DcfAssumptions::default()),
            Err(DcfError::Statement(_))
        ));
    }
}
