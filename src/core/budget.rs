use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    #[default]
    Monthly,
    Yearly,
}

/// How yearly line items are folded into the monthly figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetMode {
    /// Monthly totals cover monthly items only; yearly items show up in
    /// the yearly totals.
    #[default]
    Separate,
    /// Yearly items are spread over twelve months.
    IncludeYearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub monthly_net: f64,
    pub yearly_income: f64,
    pub yearly_expenses: f64,
    pub yearly_net: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Totals {
    monthly: f64,
    yearly: f64,
}

fn totals(items: &[LineItem], mode: BudgetMode) -> Totals {
    let (monthly_items, yearly_items) = items
        .iter()
        .filter(|item| !item.hidden)
        .fold((0.0, 0.0), |(monthly, yearly), item| match item.frequency {
            Frequency::Monthly => (monthly + item.amount, yearly),
            Frequency::Yearly => (monthly, yearly + item.amount),
        });

    match mode {
        BudgetMode::Separate => Totals {
            monthly: monthly_items,
            yearly: monthly_items * 12.0 + yearly_items,
        },
        BudgetMode::IncludeYearly => {
            let monthly = monthly_items + yearly_items / 12.0;
            Totals {
                monthly,
                yearly: monthly * 12.0,
            }
        }
    }
}

pub fn summarize_budget(
    income: &[LineItem],
    expenses: &[LineItem],
    mode: BudgetMode,
) -> BudgetSummary {
    let income = totals(income, mode);
    let expenses = totals(expenses, mode);
    BudgetSummary {
        monthly_income: income.monthly,
        monthly_expenses: expenses.monthly,
        monthly_net: income.monthly - expenses.monthly,
        yearly_income: income.yearly,
        yearly_expenses: expenses.yearly,
        yearly_net: income.yearly - expenses.yearly,
    }
}

/// Converts a USD amount into the reporting currency and subtracts a flat
/// fee, never going below zero.
pub fn convert_with_fee(amount_usd: f64, fx_rate: f64, fee: f64) -> f64 {
    (amount_usd * fx_rate - fee).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockSellPolicy {
    pub sell_monthly: bool,
    /// Fee charged per sale, in the reporting currency.
    pub selling_fee: f64,
    /// May be fractional: 0.25 is one sale every four years.
    pub sells_per_year: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockIncome {
    pub rsu_income: f64,
    pub espp_income: f64,
    pub total: f64,
    pub reinvest_dividends: bool,
}

/// Monthly stock income in the reporting currency. Selling spreads the
/// per-sale fee over the year; holding converts without any fee and
/// reinvests instead.
pub fn monthly_stock_income(
    rsu_income_usd: f64,
    espp_income: f64,
    fx_rate: f64,
    policy: &StockSellPolicy,
) -> StockIncome {
    let rsu_income = if policy.sell_monthly && policy.sells_per_year > 0.0 {
        let monthly_fee = policy.selling_fee * policy.sells_per_year / 12.0;
        convert_with_fee(rsu_income_usd, fx_rate, monthly_fee)
    } else {
        rsu_income_usd * fx_rate
    };

    StockIncome {
        rsu_income,
        espp_income,
        total: rsu_income + espp_income,
        reinvest_dividends: !policy.sell_monthly,
    }
}
