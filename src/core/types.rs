use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTerms {
    pub principal: f64,
    pub down_payment: f64,
    pub annual_rate_percent: f64,
    pub term_years: i32,
}

impl LoanTerms {
    pub fn effective_principal(&self) -> f64 {
        (self.principal - self.down_payment).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    pub month: u32,
    pub principal_payment: f64,
    pub interest_payment: f64,
    pub total_payment: f64,
    pub remaining_balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetWorthParams {
    pub initial_bank_balance: f64,
    pub initial_stock_wealth: f64,
    pub income1: f64,
    pub income2: f64,
    /// Monthly stock income, already converted into the reporting currency.
    pub stock_income: f64,
    pub monthly_expenses: f64,
    pub property_value: f64,
    pub down_payment: f64,
    pub mortgage_rate_percent: f64,
    pub mortgage_years: i32,
    pub home_appreciation_rate: f64,
    pub investment_return_rate: f64,
    pub stock_growth_rate: f64,
    pub bank_reserve_ratio: f64,
    pub reinvest_dividends: bool,
    pub years: i32,
}

impl NetWorthParams {
    pub fn loan_terms(&self) -> LoanTerms {
        LoanTerms {
            principal: self.property_value,
            down_payment: self.down_payment,
            annual_rate_percent: self.mortgage_rate_percent,
            term_years: self.mortgage_years,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthSnapshot {
    pub month: u32,
    pub net_worth: f64,
    pub bank_reserve: f64,
    pub stock_wealth: f64,
    pub liquid_assets: f64,
    pub home_value: f64,
    pub home_equity: f64,
    pub mortgage_balance: f64,
    pub principal_paid: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferBreach {
    pub first_month: u32,
    pub first_year: f64,
    pub minimum_bank_reserve: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsuBlock {
    pub total_stocks: u32,
    pub start_offset_months: u32,
    pub vest_months: u32,
    pub delay_months: u32,
    pub hidden: bool,
}

/// Broker-side parameters applied to every RSU payout. Fee and selling loss
/// are in USD; `fx_rate` converts USD into the reporting currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsuSaleTerms {
    pub fx_rate: f64,
    pub transaction_fee: f64,
    pub selling_loss: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsuMonthRow {
    pub month: u32,
    pub stocks_vested: u32,
    pub stocks_sold: u32,
    pub stocks_kept: u32,
    pub tax_due: f64,
    pub sale_proceeds: f64,
    pub transaction_fee: f64,
    pub rest_amount: f64,
    pub value: f64,
    pub cumulative_stocks: u32,
    pub cumulative_value: f64,
    pub cumulative_rest: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EsppParams {
    pub gross_income: f64,
    pub contribution_rate: f64,
    pub discount_rate: f64,
    pub vesting_interval_months: u32,
    pub start_offset_months: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EsppMonthRow {
    pub month: u32,
    pub contribution: f64,
    pub stocks_bought: f64,
    pub value: f64,
    pub cumulative_stocks: f64,
    pub cumulative_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfBuyParams {
    pub net_income: f64,
    /// Flat monthly amount, or a percentage of `net_income` when
    /// `is_percentage` is set (10.0 means 10 %).
    pub investment_amount_or_percent: f64,
    pub is_percentage: bool,
}

impl SelfBuyParams {
    pub fn monthly_investment(&self) -> f64 {
        if self.is_percentage {
            self.net_income * (self.investment_amount_or_percent / 100.0)
        } else {
            self.investment_amount_or_percent
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfBuyMonthRow {
    pub month: u32,
    pub investment: f64,
    pub stocks_bought: f64,
    pub value: f64,
    pub cumulative_stocks: f64,
    pub cumulative_value: f64,
}
