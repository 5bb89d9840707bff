use super::types::{SelfBuyMonthRow, SelfBuyParams};

/// Dollar-cost averaging: the same investment buys shares every month.
pub fn project_self_buy(params: &SelfBuyParams, stock_prices: &[f64]) -> Vec<SelfBuyMonthRow> {
    let investment = params.monthly_investment();
    let mut cumulative_stocks = 0.0;

    stock_prices
        .iter()
        .enumerate()
        .map(|(index, &price)| {
            let stocks_bought = if price > 0.0 { investment / price } else { 0.0 };
            cumulative_stocks += stocks_bought;
            SelfBuyMonthRow {
                month: index as u32 + 1,
                investment,
                stocks_bought,
                value: stocks_bought * price,
                cumulative_stocks,
                cumulative_value: cumulative_stocks * price,
            }
        })
        .collect()
}
