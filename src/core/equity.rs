use serde::Serialize;

use super::espp::project_espp;
use super::rsu::project_rsu;
use super::self_buy::project_self_buy;
use super::stock::stock_price_path;
use super::types::{
    EsppMonthRow, EsppParams, RsuBlock, RsuMonthRow, RsuSaleTerms, SelfBuyMonthRow, SelfBuyParams,
};

/// Everything needed to project the three equity sources side by side.
/// A disabled source is `None` (or, for RSUs, an empty block list).
#[derive(Debug, Clone, PartialEq)]
pub struct EquityInputs {
    pub start_price_usd: f64,
    /// Decimal annual growth (0.05 for 5 %).
    pub annual_growth_rate: f64,
    pub months: u32,
    pub sale_terms: RsuSaleTerms,
    pub rsu_blocks: Vec<RsuBlock>,
    pub espp: Option<EsppParams>,
    pub self_buy: Option<SelfBuyParams>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedMonthRow {
    pub month: u32,
    pub stock_price: f64,
    pub rsu_value: f64,
    pub espp_value: f64,
    pub self_buy_value: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquitySummary {
    pub months: u32,
    pub final_stock_price: f64,
    pub rsu_value: f64,
    pub rsu_stocks: u32,
    pub rsu_cash_returned: f64,
    pub espp_value: f64,
    pub espp_stocks: f64,
    pub espp_contributed: f64,
    pub self_buy_value: f64,
    pub self_buy_stocks: f64,
    pub self_buy_invested: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityProjection {
    pub stock_prices_usd: Vec<f64>,
    pub stock_prices: Vec<f64>,
    pub rsu: Vec<RsuMonthRow>,
    pub espp: Vec<EsppMonthRow>,
    pub self_buy: Vec<SelfBuyMonthRow>,
    pub combined: Vec<CombinedMonthRow>,
    pub summary: EquitySummary,
}

pub fn project_equity(inputs: &EquityInputs) -> EquityProjection {
    let fx_rate = inputs.sale_terms.fx_rate;
    let prices_usd = stock_price_path(inputs.start_price_usd, inputs.annual_growth_rate, inputs.months);
    let prices: Vec<f64> = prices_usd.iter().map(|price| price * fx_rate).collect();

    let rsu = if inputs.rsu_blocks.is_empty() {
        Vec::new()
    } else {
        project_rsu(&inputs.rsu_blocks, &prices_usd, &inputs.sale_terms)
    };
    let espp = inputs
        .espp
        .map(|params| project_espp(&params, &prices))
        .unwrap_or_default();
    let self_buy = inputs
        .self_buy
        .map(|params| project_self_buy(&params, &prices))
        .unwrap_or_default();

    let combined: Vec<CombinedMonthRow> = prices
        .iter()
        .enumerate()
        .map(|(index, &stock_price)| {
            let rsu_value = rsu.get(index).map_or(0.0, |row| row.cumulative_value);
            let espp_value = espp.get(index).map_or(0.0, |row| row.cumulative_value);
            let self_buy_value = self_buy.get(index).map_or(0.0, |row| row.cumulative_value);
            CombinedMonthRow {
                month: index as u32 + 1,
                stock_price,
                rsu_value,
                espp_value,
                self_buy_value,
                total_value: rsu_value + espp_value + self_buy_value,
            }
        })
        .collect();

    let summary = summarize(&combined, &rsu, &espp, &self_buy);

    EquityProjection {
        stock_prices_usd: prices_usd,
        stock_prices: prices,
        rsu,
        espp,
        self_buy,
        combined,
        summary,
    }
}

fn summarize(
    combined: &[CombinedMonthRow],
    rsu: &[RsuMonthRow],
    espp: &[EsppMonthRow],
    self_buy: &[SelfBuyMonthRow],
) -> EquitySummary {
    let Some(last) = combined.last() else {
        return EquitySummary::default();
    };

    EquitySummary {
        months: last.month,
        final_stock_price: last.stock_price,
        rsu_value: last.rsu_value,
        rsu_stocks: rsu.last().map_or(0, |row| row.cumulative_stocks),
        rsu_cash_returned: rsu.last().map_or(0.0, |row| row.cumulative_rest),
        espp_value: last.espp_value,
        espp_stocks: espp.last().map_or(0.0, |row| row.cumulative_stocks),
        espp_contributed: espp.iter().map(|row| row.contribution).sum(),
        self_buy_value: last.self_buy_value,
        self_buy_stocks: self_buy.last().map_or(0.0, |row| row.cumulative_stocks),
        self_buy_invested: self_buy.iter().map(|row| row.investment).sum(),
        total_value: last.total_value,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockIncomeEstimate {
    /// Pre-tax RSU value vesting per month, in USD.
    pub rsu_monthly_usd: f64,
    /// ESPP contribution plus discount benefit, in the reporting currency.
    pub espp_monthly: f64,
}

/// Rough monthly stock income for the wealth projection, priced at today's
/// share price. Half of each vest is assumed to go to tax.
pub fn estimate_stock_income(
    blocks: &[RsuBlock],
    start_price_usd: f64,
    espp: Option<&EsppParams>,
) -> StockIncomeEstimate {
    let rsu_monthly_usd = blocks
        .iter()
        .filter(|block| !block.hidden && block.vest_months > 0)
        .map(|block| {
            f64::from(block.total_stocks) / f64::from(block.vest_months) / 2.0 * start_price_usd
        })
        .sum();

    let espp_monthly = espp.map_or(0.0, |params| {
        params.gross_income * params.contribution_rate * (1.0 + params.discount_rate)
    });

    StockIncomeEstimate {
        rsu_monthly_usd,
        espp_monthly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn block(total_stocks: u32) -> RsuBlock {
        RsuBlock {
            total_stocks,
            start_offset_months: 2,
            vest_months: 48,
            delay_months: 12,
            hidden: false,
        }
    }

    fn inputs() -> EquityInputs {
        EquityInputs {
            start_price_usd: 40.0,
            annual_growth_rate: 0.0,
            months: 60,
            sale_terms: RsuSaleTerms {
                fx_rate: 0.5,
                transaction_fee: 9.99,
                selling_loss: 0.05,
            },
            rsu_blocks: vec![block(500)],
            espp: Some(EsppParams {
                gross_income: 5_000.0,
                contribution_rate: 0.10,
                discount_rate: 0.15,
                vesting_interval_months: 6,
                start_offset_months: 0,
            }),
            self_buy: Some(SelfBuyParams {
                net_income: 3_500.0,
                investment_amount_or_percent: 100.0,
                is_percentage: false,
            }),
        }
    }

    #[test]
    fn combined_total_is_sum_of_sources() {
        let projection = project_equity(&inputs());
        assert_eq!(projection.combined.len(), 60);
        assert_eq!(projection.rsu.len(), 60);
        assert_eq!(projection.espp.len(), 60);
        assert_eq!(projection.self_buy.len(), 60);
        for (index, row) in projection.combined.iter().enumerate() {
            assert_eq!(row.month, index as u32 + 1);
            assert_eq!(row.stock_price, 20.0);
            assert_close(
                row.total_value,
                row.rsu_value + row.espp_value + row.self_buy_value,
                1e-9,
            );
        }
    }

    #[test]
    fn espp_and_self_buy_use_converted_prices() {
        let projection = project_equity(&inputs());
        assert_eq!(projection.self_buy[0].stocks_bought, 5.0);
        assert_eq!(projection.stock_prices_usd[0], 40.0);
        assert_eq!(projection.stock_prices[0], 20.0);
    }

    #[test]
    fn summary_reads_final_month() {
        let projection = project_equity(&inputs());
        let summary = projection.summary;
        let last = projection.combined.last().expect("rows");
        assert_eq!(summary.months, 60);
        assert_eq!(summary.total_value, last.total_value);
        assert_eq!(summary.self_buy_invested, 6_000.0);
        assert_eq!(summary.self_buy_stocks, 300.0);
        assert_close(summary.espp_contributed, 30_000.0, 1e-6);
        assert_eq!(summary.rsu_stocks, projection.rsu.last().expect("rows").cumulative_stocks);
    }

    #[test]
    fn disabled_sources_contribute_zero() {
        let projection = project_equity(&EquityInputs {
            rsu_blocks: Vec::new(),
            espp: None,
            self_buy: None,
            ..inputs()
        });
        assert!(projection.rsu.is_empty());
        assert!(projection.espp.is_empty());
        assert!(projection.self_buy.is_empty());
        assert!(projection.combined.iter().all(|row| row.total_value == 0.0));
        assert_eq!(projection.summary.total_value, 0.0);
    }

    #[test]
    fn empty_horizon_yields_default_summary() {
        let projection = project_equity(&EquityInputs {
            months: 0,
            ..inputs()
        });
        assert!(projection.combined.is_empty());
        assert_eq!(projection.summary, EquitySummary::default());
    }

    #[test]
    fn income_estimate_halves_vesting_and_skips_hidden() {
        let mut hidden = block(1_000);
        hidden.hidden = true;
        let mut unvested = block(1_000);
        unvested.vest_months = 0;
        let espp = inputs().espp;

        let estimate = estimate_stock_income(&[block(480), hidden, unvested], 40.0, espp.as_ref());
        assert_close(estimate.rsu_monthly_usd, 480.0 / 48.0 / 2.0 * 40.0, 1e-9);
        assert_close(estimate.espp_monthly, 500.0 * 1.15, 1e-9);

        let none = estimate_stock_income(&[], 40.0, None);
        assert_eq!(none, StockIncomeEstimate::default());
    }
}
