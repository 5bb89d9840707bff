/// Deterministic compound growth: `annual_growth_rate` is a decimal
/// (0.10 for 10 %), spread evenly over twelve monthly steps.
pub fn price_at_month(start_price: f64, annual_growth_rate: f64, month: u32) -> f64 {
    let monthly_rate = (1.0 + annual_growth_rate).powf(1.0 / 12.0) - 1.0;
    start_price * (1.0 + monthly_rate).powf(f64::from(month))
}

pub fn stock_price_path(start_price: f64, annual_growth_rate: f64, month_count: u32) -> Vec<f64> {
    (0..month_count)
        .map(|month| price_at_month(start_price, annual_growth_rate, month))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_growth_keeps_price() {
        let path = stock_price_path(40.0, 0.0, 24);
        assert_eq!(path.len(), 24);
        assert!(path.iter().all(|price| *price == 40.0));
    }

    #[test]
    fn twelve_months_compound_to_annual_rate() {
        let price = price_at_month(100.0, 0.10, 12);
        assert!((price - 110.0).abs() < 1e-9, "got {price}");
        assert_eq!(price_at_month(100.0, 0.10, 0), 100.0);
    }

    #[test]
    fn negative_growth_declines_monotonically() {
        let path = stock_price_path(50.0, -0.2, 36);
        for pair in path.windows(2) {
            assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn empty_path_for_zero_months() {
        assert!(stock_price_path(10.0, 0.05, 0).is_empty());
    }
}
