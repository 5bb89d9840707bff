use super::types::{EsppMonthRow, EsppParams};
use crate::error::InputError;

impl EsppParams {
    pub fn validate(&self) -> Result<(), InputError> {
        if !self.gross_income.is_finite() || self.gross_income < 0.0 {
            return Err(InputError::invalid("grossIncome", "must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.contribution_rate) {
            return Err(InputError::invalid(
                "contributionRate",
                "must be between 0 and 100 percent",
            ));
        }
        if !(0.0..1.0).contains(&self.discount_rate) {
            return Err(InputError::invalid(
                "discountRate",
                "must be at least 0 and below 100 percent",
            ));
        }
        if self.vesting_interval_months == 0 {
            return Err(InputError::invalid("vestingIntervalMonths", "must be >= 1"));
        }
        Ok(())
    }
}

/// Monthly ESPP accrual with a purchase every `vesting_interval_months`
/// after the start offset. Each purchase prices at the discounted lower of
/// the window's opening price and the current price, then opens a new window.
pub fn project_espp(params: &EsppParams, stock_prices: &[f64]) -> Vec<EsppMonthRow> {
    let start = params.start_offset_months as usize;
    let monthly_contribution = params.gross_income * params.contribution_rate;
    let mut period_start_price = stock_prices.get(start).copied().unwrap_or(0.0);
    let mut accumulated = 0.0;
    let mut cumulative_stocks = 0.0;

    let mut rows = Vec::with_capacity(stock_prices.len());
    for (index, &current_price) in stock_prices.iter().enumerate() {
        let mut row = EsppMonthRow {
            month: index as u32 + 1,
            ..EsppMonthRow::default()
        };

        if index >= start {
            row.contribution = monthly_contribution;
            accumulated += monthly_contribution;

            let months_since_start = (index - start + 1) as u32;
            let interval = params.vesting_interval_months;
            if interval > 0 && months_since_start % interval == 0 {
                let buy_price = period_start_price.min(current_price) * (1.0 - params.discount_rate);
                let stocks_bought = if buy_price > 0.0 {
                    accumulated / buy_price
                } else {
                    0.0
                };
                row.stocks_bought = stocks_bought;
                row.value = stocks_bought * current_price;
                accumulated = 0.0;
                period_start_price = current_price;
            }
        }

        cumulative_stocks += row.stocks_bought;
        row.cumulative_stocks = cumulative_stocks;
        row.cumulative_value = cumulative_stocks * current_price;
        rows.push(row);
    }

    rows
}
