use serde::Deserialize;

use super::types::{RsuBlock, RsuMonthRow, RsuSaleTerms};
use crate::config::HARD_MAX_PROJECTION_YEARS;
use crate::error::InputError;

/// Schema version written by current clients. Version 1 records described
/// the cliff as a count of `intervals` instead of `delayMonths`.
pub const RSU_BLOCK_SCHEMA_VERSION: u32 = 2;

const LEGACY_CLIFF_MONTHS: i64 = 12;

/// Grants starting later than this can never pay out inside a projection.
pub const MAX_START_OFFSET_MONTHS: i64 = HARD_MAX_PROJECTION_YEARS as i64 * 12;

/// RSU grant as it arrives from a client or a saved preset, before upgrade.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RsuBlockRecord {
    pub version: Option<u32>,
    #[serde(alias = "total_stocks")]
    pub total_stocks: i64,
    #[serde(alias = "start_offset", alias = "startOffsetMonths")]
    pub start_offset: i64,
    #[serde(alias = "vest_months")]
    pub vest_months: i64,
    #[serde(alias = "delay_months")]
    pub delay_months: Option<i64>,
    pub intervals: Option<i64>,
    pub hidden: bool,
}

impl RsuBlockRecord {
    /// Migrates legacy shapes and validates the block.
    pub fn upgrade(&self) -> Result<RsuBlock, InputError> {
        let version = self.version.unwrap_or(RSU_BLOCK_SCHEMA_VERSION);
        if version > RSU_BLOCK_SCHEMA_VERSION {
            return Err(InputError::invalid(
                "version",
                format!("unsupported RSU block version {version}"),
            ));
        }

        let delay_months = match (self.delay_months, self.intervals) {
            (Some(delay), _) => delay,
            (None, Some(_)) => LEGACY_CLIFF_MONTHS,
            (None, None) => 0,
        };
        let vest_months = self.vest_months.max(0);

        if self.total_stocks < 0 {
            return Err(InputError::invalid("totalStocks", "must be >= 0"));
        }
        if self.start_offset < 0 {
            return Err(InputError::invalid("startOffset", "must be >= 0"));
        }
        if self.start_offset > MAX_START_OFFSET_MONTHS {
            return Err(InputError::invalid(
                "startOffset",
                format!("must be <= {MAX_START_OFFSET_MONTHS}"),
            ));
        }
        if delay_months < 0 {
            return Err(InputError::invalid("delayMonths", "must be >= 0"));
        }
        if delay_months % 3 != 0 {
            return Err(InputError::invalid(
                "delayMonths",
                "must be a multiple of 3 (payouts are quarterly)",
            ));
        }
        if vest_months > 0 && delay_months >= vest_months {
            return Err(InputError::invalid(
                "delayMonths",
                "must be shorter than vestMonths",
            ));
        }
        // At least one whole quarter has to vest after the cliff.
        let max_delay = (vest_months / 3) * 3 - 3;
        if vest_months >= 3 && delay_months > max_delay {
            return Err(InputError::invalid(
                "delayMonths",
                format!("must be <= {max_delay} for vestMonths {vest_months}"),
            ));
        }

        Ok(RsuBlock {
            total_stocks: to_u32("totalStocks", self.total_stocks)?,
            start_offset_months: to_u32("startOffset", self.start_offset)?,
            vest_months: to_u32("vestMonths", vest_months)?,
            delay_months: to_u32("delayMonths", delay_months)?,
            hidden: self.hidden,
        })
    }
}

fn to_u32(field: &str, value: i64) -> Result<u32, InputError> {
    u32::try_from(value).map_err(|_| InputError::invalid(field, "out of range"))
}

/// Settlement of a single payout after the broker sells shares to cover tax.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsuPayout {
    pub stocks_sold: u32,
    pub stocks_kept: u32,
    pub tax_due: f64,
    pub sale_proceeds: f64,
    pub transaction_fee: f64,
    pub rest_amount: f64,
    pub value: f64,
}

/// Half the vested value is owed as tax; the broker sells half the shares
/// plus one at the slipped execution price. All outputs are converted with
/// `terms.fx_rate`.
pub fn settle_payout(vested: u32, price_usd: f64, terms: &RsuSaleTerms) -> RsuPayout {
    let tax_due_usd = f64::from(vested) * price_usd / 2.0;
    let stocks_sold = vested / 2 + 1;
    let stocks_kept = vested.saturating_sub(stocks_sold);

    let execution_price_usd = price_usd - terms.selling_loss;
    let sale_proceeds_usd = f64::from(stocks_sold) * execution_price_usd;
    let rest_amount_usd = sale_proceeds_usd - tax_due_usd - terms.transaction_fee;

    RsuPayout {
        stocks_sold,
        stocks_kept,
        tax_due: tax_due_usd * terms.fx_rate,
        sale_proceeds: sale_proceeds_usd * terms.fx_rate,
        transaction_fee: terms.transaction_fee * terms.fx_rate,
        rest_amount: rest_amount_usd * terms.fx_rate,
        value: f64::from(stocks_kept) * price_usd * terms.fx_rate,
    }
}

/// Payout months (1-based) and share counts for one grant. Quarters that
/// fall inside the cliff are paid as one lump together with the first
/// quarter after it. Months past `u32::MAX` are dropped.
pub fn payout_schedule(block: &RsuBlock) -> Vec<(u32, u32)> {
    let total_quarters = block.vest_months / 3;
    if total_quarters == 0 {
        return Vec::new();
    }

    let base = block.total_stocks / total_quarters;
    let remainder = block.total_stocks % total_quarters;
    let quarter_size = |q: u32| base + u32::from(q < remainder);
    let delayed_quarters = block.delay_months / 3;

    let mut payouts = Vec::with_capacity(total_quarters as usize);
    for q in 0..total_quarters {
        let quarter_month = (q + 1) * 3;
        if quarter_month <= block.delay_months {
            continue;
        }

        let payout = if q == delayed_quarters && delayed_quarters > 0 {
            let accrued: u32 = (0..delayed_quarters).map(quarter_size).sum();
            block
                .start_offset_months
                .checked_add(block.delay_months)
                .and_then(|month| month.checked_add(3))
                .map(|month| (month, accrued + quarter_size(q)))
        } else {
            block
                .start_offset_months
                .checked_add(quarter_month)
                .map(|month| (month, quarter_size(q)))
        };
        if let Some(payout) = payout {
            payouts.push(payout);
        }
    }
    payouts
}

fn accumulate_block(
    rows: &mut [RsuMonthRow],
    block: &RsuBlock,
    stock_prices: &[f64],
    terms: &RsuSaleTerms,
) {
    for (payout_month, vested) in payout_schedule(block) {
        let index = payout_month as usize - 1;
        if vested == 0 || index >= rows.len() {
            continue;
        }

        let payout = settle_payout(vested, stock_prices[index], terms);
        let row = &mut rows[index];
        row.stocks_vested = row.stocks_vested.saturating_add(vested);
        row.stocks_sold = row.stocks_sold.saturating_add(payout.stocks_sold);
        row.stocks_kept = row.stocks_kept.saturating_add(payout.stocks_kept);
        row.tax_due += payout.tax_due;
        row.sale_proceeds += payout.sale_proceeds;
        row.transaction_fee += payout.transaction_fee;
        row.rest_amount += payout.rest_amount;
        row.value = (row.value + payout.value).max(0.0);
    }
}

/// Merged monthly RSU series across all visible blocks, one row per entry
/// of `stock_prices` (USD).
pub fn project_rsu(
    blocks: &[RsuBlock],
    stock_prices: &[f64],
    terms: &RsuSaleTerms,
) -> Vec<RsuMonthRow> {
    let mut rows: Vec<RsuMonthRow> = (1..=stock_prices.len() as u32)
        .map(|month| RsuMonthRow {
            month,
            ..RsuMonthRow::default()
        })
        .collect();

    for block in blocks.iter().filter(|block| !block.hidden) {
        accumulate_block(&mut rows, block, stock_prices, terms);
    }

    let mut cumulative_stocks: u32 = 0;
    let mut cumulative_rest = 0.0;
    for (row, price) in rows.iter_mut().zip(stock_prices) {
        cumulative_stocks = cumulative_stocks.saturating_add(row.stocks_kept);
        cumulative_rest += row.rest_amount;
        row.cumulative_stocks = cumulative_stocks;
        row.cumulative_value = f64::from(cumulative_stocks) * price * terms.fx_rate;
        row.cumulative_rest = cumulative_rest;
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn usd_terms() -> RsuSaleTerms {
        RsuSaleTerms {
            fx_rate: 1.0,
            transaction_fee: 9.99,
            selling_loss: 0.05,
        }
    }

    fn block(total: u32, start: u32, vest: u32, delay: u32) -> RsuBlock {
        RsuBlock {
            total_stocks: total,
            start_offset_months: start,
            vest_months: vest,
            delay_months: delay,
            hidden: false,
        }
    }

    fn vesting_rows(rows: &[RsuMonthRow]) -> Vec<(u32, u32)> {
        rows.iter()
            .filter(|row| row.stocks_vested > 0)
            .map(|row| (row.month, row.stocks_vested))
            .collect()
    }

    #[test]
    fn tax_sell_rule_matches_worked_example() {
        let payout = settle_payout(35, 40.0, &usd_terms());
        assert_eq!(payout.stocks_sold, 18);
        assert_eq!(payout.stocks_kept, 17);
        assert_close(payout.tax_due, 700.0, 1e-9);
        assert_close(payout.sale_proceeds, 719.1, 1e-9);
        assert_close(payout.rest_amount, 9.11, 0.01);
        assert_close(payout.value, 680.0, 1e-9);

        let even = settle_payout(36, 40.0, &usd_terms());
        assert_eq!(even.stocks_sold, 19);
    }

    #[test]
    fn payout_is_converted_to_reporting_currency() {
        let terms = RsuSaleTerms {
            fx_rate: 0.5,
            ..usd_terms()
        };
        let payout = settle_payout(35, 40.0, &terms);
        assert_close(payout.tax_due, 350.0, 1e-9);
        assert_close(payout.transaction_fee, 4.995, 1e-9);
        assert_close(payout.rest_amount, 9.11 / 2.0, 0.01);
    }

    #[test]
    fn cliff_quarters_pay_out_as_one_lump() {
        let prices = vec![40.0; 60];
        let rows = project_rsu(&[block(480, 2, 48, 12)], &prices, &usd_terms());
        assert_eq!(rows.len(), 60);

        let events = vesting_rows(&rows);
        assert_eq!(events[0], (17, 150));
        assert_eq!(events[1], (20, 30));
        assert_eq!(events.len(), 12);
        assert_eq!(events.last(), Some(&(50, 30)));
        let total: u32 = events.iter().map(|(_, vested)| vested).sum();
        assert_eq!(total, 480);
        assert!(rows[..16].iter().all(|row| row.stocks_vested == 0));
    }

    #[test]
    fn no_cliff_pays_every_quarter_after_offset() {
        let prices = vec![10.0; 60];
        let rows = project_rsu(&[block(480, 4, 48, 0)], &prices, &usd_terms());
        let events = vesting_rows(&rows);
        assert_eq!(events.len(), 16);
        assert_eq!(events[0], (7, 30));
        assert_eq!(events[15], (52, 30));
    }

    #[test]
    fn remainder_goes_to_earliest_quarters() {
        let schedule = payout_schedule(&block(10, 0, 9, 0));
        assert_eq!(schedule, vec![(3, 4), (6, 3), (9, 3)]);
    }

    #[test]
    fn partial_quarter_is_dropped() {
        let schedule = payout_schedule(&block(12, 0, 10, 0));
        assert_eq!(schedule, vec![(3, 4), (6, 4), (9, 4)]);
    }

    #[test]
    fn payouts_beyond_horizon_are_dropped() {
        let prices = vec![40.0; 20];
        let rows = project_rsu(&[block(480, 2, 48, 12)], &prices, &usd_terms());
        assert_eq!(vesting_rows(&rows), vec![(17, 150), (20, 30)]);
    }

    #[test]
    fn zero_vest_months_yields_all_zero_series() {
        let prices = vec![40.0; 12];
        let rows = project_rsu(&[block(100, 0, 0, 0)], &prices, &usd_terms());
        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|row| row.stocks_vested == 0
            && row.cumulative_value == 0.0
            && row.cumulative_rest == 0.0));
    }

    #[test]
    fn hidden_blocks_are_ignored() {
        let prices = vec![40.0; 24];
        let mut hidden = block(120, 0, 12, 0);
        hidden.hidden = true;
        let rows = project_rsu(&[hidden], &prices, &usd_terms());
        assert!(rows.iter().all(|row| row.stocks_vested == 0));
    }

    #[test]
    fn blocks_merge_with_running_totals() {
        let prices = vec![20.0; 24];
        let a = block(12, 0, 12, 0);
        let b = block(24, 0, 12, 0);
        let rows = project_rsu(&[a, b], &prices, &usd_terms());

        // Month 3: a vests 3 (sells 2), b vests 6 (sells 4).
        let row = &rows[2];
        assert_eq!(row.stocks_vested, 9);
        assert_eq!(row.stocks_sold, 6);
        assert_eq!(row.stocks_kept, 3);
        assert_close(row.transaction_fee, 2.0 * 9.99, 1e-9);

        let last = rows.last().expect("rows");
        assert_eq!(last.cumulative_stocks, 12);
        assert_close(last.cumulative_value, 12.0 * 20.0, 1e-9);
        let rest: f64 = rows.iter().map(|row| row.rest_amount).sum();
        assert_close(last.cumulative_rest, rest, 1e-9);
    }

    #[test]
    fn projection_is_deterministic() {
        let prices: Vec<f64> = (0..48).map(|m| 30.0 + f64::from(m)).collect();
        let blocks = [block(500, 2, 48, 12), block(90, 5, 24, 0)];
        let first = project_rsu(&blocks, &prices, &usd_terms());
        let second = project_rsu(&blocks, &prices, &usd_terms());
        assert_eq!(first, second);
    }

    #[test]
    fn upgrade_migrates_legacy_intervals() {
        let record = RsuBlockRecord {
            version: Some(1),
            total_stocks: 480,
            start_offset: 2,
            vest_months: 48,
            delay_months: None,
            intervals: Some(4),
            hidden: false,
        };
        let upgraded = record.upgrade().expect("legacy block upgrades");
        assert_eq!(upgraded.delay_months, 12);

        let record = RsuBlockRecord {
            intervals: None,
            ..record
        };
        assert_eq!(record.upgrade().expect("valid").delay_months, 0);
    }

    #[test]
    fn upgrade_reads_saved_snake_case_records() {
        let record: RsuBlockRecord = serde_json::from_str(
            r#"{"total_stocks": 500, "start_offset": 2, "vest_months": 48, "delay_months": 12, "hidden": true}"#,
        )
        .expect("record parses");
        let upgraded = record.upgrade().expect("valid");
        assert_eq!(upgraded, RsuBlock {
            total_stocks: 500,
            start_offset_months: 2,
            vest_months: 48,
            delay_months: 12,
            hidden: true,
        });
    }

    #[test]
    fn upgrade_rejects_off_quarter_delay() {
        let record = RsuBlockRecord {
            total_stocks: 100,
            vest_months: 24,
            delay_months: Some(5),
            ..RsuBlockRecord::default()
        };
        let err = record.upgrade().expect_err("delay must be quarterly");
        assert!(err.to_string().contains("delayMonths"));
    }

    #[test]
    fn upgrade_rejects_cliff_covering_whole_grant() {
        let record = RsuBlockRecord {
            total_stocks: 100,
            vest_months: 12,
            delay_months: Some(12),
            ..RsuBlockRecord::default()
        };
        assert!(record.upgrade().is_err());
    }

    #[test]
    fn upgrade_rejects_cliff_swallowing_every_whole_quarter() {
        let record = RsuBlockRecord {
            total_stocks: 480,
            vest_months: 14,
            delay_months: Some(12),
            ..RsuBlockRecord::default()
        };
        let err = record.upgrade().expect_err("no quarter vests after the cliff");
        assert!(err.to_string().contains("delayMonths"));

        let record = RsuBlockRecord {
            delay_months: Some(9),
            ..record
        };
        let upgraded = record.upgrade().expect("last whole quarter vests after the cliff");
        let rows = project_rsu(&[upgraded], &[40.0; 120], &usd_terms());
        let vested: u32 = rows.iter().map(|row| row.stocks_vested).sum();
        assert_eq!(vested, 480);
    }

    #[test]
    fn upgrade_rejects_start_offset_past_any_horizon() {
        let record = RsuBlockRecord {
            total_stocks: 120,
            start_offset: i64::from(u32::MAX) - 1,
            vest_months: 12,
            ..RsuBlockRecord::default()
        };
        let err = record.upgrade().expect_err("offset too large");
        assert!(err.to_string().contains("startOffset"));

        let record = RsuBlockRecord {
            start_offset: MAX_START_OFFSET_MONTHS,
            ..record
        };
        assert!(record.upgrade().is_ok());
    }

    #[test]
    fn overflowing_payout_months_are_dropped() {
        let far = block(120, u32::MAX - 1, 12, 0);
        assert!(payout_schedule(&far).is_empty());
        let rows = project_rsu(&[far], &[40.0; 24], &usd_terms());
        assert!(rows.iter().all(|row| row.stocks_vested == 0));

        let cliff = block(120, u32::MAX - 4, 12, 3);
        assert!(payout_schedule(&cliff).is_empty());
    }

    #[test]
    fn huge_grants_merge_without_overflow() {
        let grant = block(u32::MAX - 3, 0, 3, 0);
        let rows = project_rsu(&[grant, grant, grant], &[1.0; 6], &usd_terms());
        assert_eq!(rows[2].stocks_vested, u32::MAX);
        assert_eq!(rows[5].cumulative_stocks, u32::MAX);
    }

    #[test]
    fn upgrade_clamps_negative_vest_and_rejects_future_versions() {
        let record = RsuBlockRecord {
            total_stocks: 100,
            vest_months: -6,
            ..RsuBlockRecord::default()
        };
        assert_eq!(record.upgrade().expect("valid").vest_months, 0);

        let record = RsuBlockRecord {
            version: Some(RSU_BLOCK_SCHEMA_VERSION + 1),
            ..RsuBlockRecord::default()
        };
        assert!(record.upgrade().is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_long_horizon_vests_every_share(
            total in 0u32..5_000,
            start in 0u32..24,
            vest in 3u32..63,
            delay_quarter_pick in 0u32..20,
            price_cents in 100u32..50_000
        ) {
            let delay = (delay_quarter_pick % (vest / 3)) * 3;
            let price = f64::from(price_cents) / 100.0;
            let prices = vec![price; (start + vest + 3) as usize];
            let rows = project_rsu(&[block(total, start, vest, delay)], &prices, &usd_terms());

            let vested: u32 = rows.iter().map(|row| row.stocks_vested).sum();
            prop_assert_eq!(vested, total);
            for row in &rows {
                prop_assert_eq!(row.stocks_sold + row.stocks_kept, row.stocks_vested);
                prop_assert!(row.value >= 0.0);
            }
            for pair in rows.windows(2) {
                prop_assert!(pair[1].cumulative_stocks >= pair[0].cumulative_stocks);
            }
        }
    }
}
