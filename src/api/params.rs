use clap::Args;
use serde::Deserialize;

use crate::core::{
    BudgetMode, EquityInputs, EsppParams, LineItem, LoanTerms, NetWorthParams, RsuBlock,
    RsuBlockRecord, RsuSaleTerms, SelfBuyParams, StockIncome, StockIncomeEstimate,
    StockSellPolicy, estimate_stock_income, monthly_payment, monthly_stock_income,
};
use crate::error::InputError;
use crate::format::parse_formatted_number;

/// A numeric field as typed by a user: either a JSON number or text such as
/// `"€1 234.50"`. Unparsable text falls back to the field's default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

impl NumberInput {
    pub fn resolve(&self, default: f64) -> f64 {
        match self {
            NumberInput::Number(value) => *value,
            NumberInput::Text(text) => parse_formatted_number(text, default),
        }
    }
}

fn overlay(target: &mut f64, input: Option<NumberInput>) {
    if let Some(input) = input {
        *target = input.resolve(*target);
    }
}

fn overlay_int(field: &str, target: &mut i32, input: Option<i64>) -> Result<(), InputError> {
    if let Some(value) = input {
        *target = i32::try_from(value).map_err(|_| InputError::invalid(field, "out of range"))?;
    }
    Ok(())
}

fn overlay_u32(field: &str, target: &mut u32, input: Option<i64>) -> Result<(), InputError> {
    if let Some(value) = input {
        *target = u32::try_from(value).map_err(|_| InputError::invalid(field, "must be >= 0"))?;
    }
    Ok(())
}

fn finite(field: &str, value: f64) -> Result<f64, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::invalid(field, "must be a finite number"))
    }
}

fn non_negative(field: &str, value: f64) -> Result<f64, InputError> {
    if finite(field, value)? < 0.0 {
        return Err(InputError::invalid(field, "must be >= 0"));
    }
    Ok(value)
}

fn positive(field: &str, value: f64) -> Result<f64, InputError> {
    if finite(field, value)? <= 0.0 {
        return Err(InputError::invalid(field, "must be > 0"));
    }
    Ok(value)
}

fn horizon_years(field: &str, years: i32, max_years: u32) -> Result<i32, InputError> {
    if years < 0 {
        return Err(InputError::invalid(field, "must be >= 0"));
    }
    if i64::from(years) > i64::from(max_years) {
        return Err(InputError::HorizonTooLong {
            years: i64::from(years),
            max: max_years,
        });
    }
    Ok(years)
}

fn loan_terms(
    property_value: f64,
    down_payment: f64,
    interest_rate: f64,
    loan_term_years: i32,
    max_years: u32,
) -> Result<LoanTerms, InputError> {
    Ok(LoanTerms {
        principal: non_negative("propertyValue", property_value)?,
        down_payment: non_negative("downPayment", down_payment)?,
        annual_rate_percent: non_negative("interestRate", interest_rate)?,
        term_years: horizon_years("loanTermYears", loan_term_years, max_years)?,
    })
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct MortgageArgs {
    #[arg(long, default_value_t = 800_000.0)]
    pub property_value: f64,
    #[arg(long, default_value_t = 200_000.0)]
    pub down_payment: f64,
    #[arg(long, default_value_t = 2.5, help = "Annual interest rate in percent")]
    pub interest_rate: f64,
    #[arg(long, default_value_t = 30)]
    pub loan_term_years: i32,
    #[arg(long, default_value_t = 0.0, help = "Extra principal paid every month")]
    pub extra_payment: f64,
}

impl Default for MortgageArgs {
    fn default() -> Self {
        MortgageArgs {
            property_value: 800_000.0,
            down_payment: 200_000.0,
            interest_rate: 2.5,
            loan_term_years: 30,
            extra_payment: 0.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MortgagePayload {
    property_value: Option<NumberInput>,
    down_payment: Option<NumberInput>,
    interest_rate: Option<NumberInput>,
    loan_term_years: Option<i64>,
    extra_payment: Option<NumberInput>,
}

impl MortgagePayload {
    pub fn into_args(self) -> Result<MortgageArgs, InputError> {
        let mut args = MortgageArgs::default();
        overlay(&mut args.property_value, self.property_value);
        overlay(&mut args.down_payment, self.down_payment);
        overlay(&mut args.interest_rate, self.interest_rate);
        overlay_int("loanTermYears", &mut args.loan_term_years, self.loan_term_years)?;
        overlay(&mut args.extra_payment, self.extra_payment);
        Ok(args)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MortgageRequest {
    pub terms: LoanTerms,
    pub extra_payment: f64,
}

pub fn build_mortgage(args: &MortgageArgs, max_years: u32) -> Result<MortgageRequest, InputError> {
    Ok(MortgageRequest {
        terms: loan_terms(
            args.property_value,
            args.down_payment,
            args.interest_rate,
            args.loan_term_years,
            max_years,
        )?,
        extra_payment: non_negative("extraPayment", args.extra_payment)?,
    })
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct PropertyArgs {
    #[arg(
        long,
        help = "Monthly payment to afford; defaults to the payment of the default mortgage"
    )]
    pub target_payment: Option<f64>,
    #[arg(long, default_value_t = 200_000.0)]
    pub down_payment: f64,
    #[arg(long, default_value_t = 2.5)]
    pub interest_rate: f64,
    #[arg(long, default_value_t = 30)]
    pub loan_term_years: i32,
}

impl Default for PropertyArgs {
    fn default() -> Self {
        PropertyArgs {
            target_payment: None,
            down_payment: 200_000.0,
            interest_rate: 2.5,
            loan_term_years: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyPayload {
    target_payment: Option<NumberInput>,
    down_payment: Option<NumberInput>,
    interest_rate: Option<NumberInput>,
    loan_term_years: Option<i64>,
}

impl PropertyPayload {
    pub fn into_args(self) -> Result<PropertyArgs, InputError> {
        let mut args = PropertyArgs::default();
        if let Some(input) = self.target_payment {
            let fallback = default_target_payment();
            args.target_payment = Some(input.resolve(fallback));
        }
        overlay(&mut args.down_payment, self.down_payment);
        overlay(&mut args.interest_rate, self.interest_rate);
        overlay_int("loanTermYears", &mut args.loan_term_years, self.loan_term_years)?;
        Ok(args)
    }
}

fn default_target_payment() -> f64 {
    let mortgage = MortgageArgs::default();
    monthly_payment(&LoanTerms {
        principal: mortgage.property_value,
        down_payment: mortgage.down_payment,
        annual_rate_percent: mortgage.interest_rate,
        term_years: mortgage.loan_term_years,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyRequest {
    pub target_payment: f64,
    pub annual_rate_percent: f64,
    pub term_years: i32,
    pub down_payment: f64,
}

pub fn build_property(args: &PropertyArgs, max_years: u32) -> Result<PropertyRequest, InputError> {
    let target_payment = args.target_payment.unwrap_or_else(default_target_payment);
    Ok(PropertyRequest {
        target_payment: finite("targetPayment", target_payment)?,
        annual_rate_percent: non_negative("interestRate", args.interest_rate)?,
        term_years: horizon_years("loanTermYears", args.loan_term_years, max_years)?,
        down_payment: non_negative("downPayment", args.down_payment)?,
    })
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct NetWorthArgs {
    #[arg(long, default_value_t = 3_000.0)]
    pub income1: f64,
    #[arg(long, default_value_t = 1_200.0)]
    pub income2: f64,
    #[arg(long, default_value_t = 600.0, help = "Monthly RSU income in USD")]
    pub stock_income_usd: f64,
    #[arg(long, default_value_t = 0.0, help = "Monthly ESPP income, already converted")]
    pub espp_income: f64,
    #[arg(long, default_value_t = 1_000.0)]
    pub monthly_expenses: f64,
    #[arg(long, default_value_t = 50_000.0)]
    pub bank_balance: f64,
    #[arg(long, default_value_t = 20_000.0)]
    pub stock_wealth: f64,
    #[arg(long, default_value_t = 10_000.0, help = "Warn when the bank reserve drops below this")]
    pub financial_buffer: f64,
    #[arg(long, default_value_t = 0.92, help = "USD to reporting currency rate")]
    pub fx_rate: f64,
    #[arg(long, default_value_t = 5.0, help = "Fee per stock sale")]
    pub selling_fee: f64,
    #[arg(long, default_value_t = 12.0)]
    pub sells_per_year: f64,
    #[arg(long, help = "Sell stock income every month instead of reinvesting it")]
    pub sell_stocks_monthly: bool,
    #[arg(long, default_value_t = 0.5, help = "Annual bank interest in percent")]
    pub bank_return_rate: f64,
    #[arg(long, default_value_t = 2.0, help = "Annual stock growth in percent")]
    pub stock_growth_rate: f64,
    #[arg(long, default_value_t = 1.0, help = "Share of any surplus kept in the bank (0..=1)")]
    pub bank_reserve_ratio: f64,
    #[arg(long, default_value_t = 2.0, help = "Annual home appreciation in percent")]
    pub home_appreciation_rate: f64,
    #[arg(long, default_value_t = 30)]
    pub projection_years: i32,
    #[arg(long, default_value_t = 800_000.0)]
    pub property_value: f64,
    #[arg(long, default_value_t = 200_000.0)]
    pub down_payment: f64,
    #[arg(long, default_value_t = 2.5)]
    pub interest_rate: f64,
    #[arg(long, default_value_t = 30)]
    pub loan_term_years: i32,
}

impl Default for NetWorthArgs {
    fn default() -> Self {
        NetWorthArgs {
            income1: 3_000.0,
            income2: 1_200.0,
            stock_income_usd: 600.0,
            espp_income: 0.0,
            monthly_expenses: 1_000.0,
            bank_balance: 50_000.0,
            stock_wealth: 20_000.0,
            financial_buffer: 10_000.0,
            fx_rate: 0.92,
            selling_fee: 5.0,
            sells_per_year: 12.0,
            sell_stocks_monthly: false,
            bank_return_rate: 0.5,
            stock_growth_rate: 2.0,
            bank_reserve_ratio: 1.0,
            home_appreciation_rate: 2.0,
            projection_years: 30,
            property_value: 800_000.0,
            down_payment: 200_000.0,
            interest_rate: 2.5,
            loan_term_years: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetWorthPayload {
    income1: Option<NumberInput>,
    income2: Option<NumberInput>,
    stock_income_usd: Option<NumberInput>,
    espp_income: Option<NumberInput>,
    monthly_expenses: Option<NumberInput>,
    #[serde(alias = "initialBankBalance")]
    bank_balance: Option<NumberInput>,
    #[serde(alias = "initialStockWealth")]
    stock_wealth: Option<NumberInput>,
    financial_buffer: Option<NumberInput>,
    #[serde(alias = "usdEurRate")]
    fx_rate: Option<NumberInput>,
    selling_fee: Option<NumberInput>,
    sells_per_year: Option<NumberInput>,
    sell_stocks_monthly: Option<bool>,
    bank_return_rate: Option<NumberInput>,
    stock_growth_rate: Option<NumberInput>,
    bank_reserve_ratio: Option<NumberInput>,
    home_appreciation_rate: Option<NumberInput>,
    projection_years: Option<i64>,
    property_value: Option<NumberInput>,
    down_payment: Option<NumberInput>,
    interest_rate: Option<NumberInput>,
    loan_term_years: Option<i64>,
}

impl NetWorthPayload {
    pub fn into_args(self) -> Result<NetWorthArgs, InputError> {
        let mut args = NetWorthArgs::default();
        overlay(&mut args.income1, self.income1);
        overlay(&mut args.income2, self.income2);
        overlay(&mut args.stock_income_usd, self.stock_income_usd);
        overlay(&mut args.espp_income, self.espp_income);
        overlay(&mut args.monthly_expenses, self.monthly_expenses);
        overlay(&mut args.bank_balance, self.bank_balance);
        overlay(&mut args.stock_wealth, self.stock_wealth);
        overlay(&mut args.financial_buffer, self.financial_buffer);
        overlay(&mut args.fx_rate, self.fx_rate);
        overlay(&mut args.selling_fee, self.selling_fee);
        overlay(&mut args.sells_per_year, self.sells_per_year);
        if let Some(v) = self.sell_stocks_monthly {
            args.sell_stocks_monthly = v;
        }
        overlay(&mut args.bank_return_rate, self.bank_return_rate);
        overlay(&mut args.stock_growth_rate, self.stock_growth_rate);
        overlay(&mut args.bank_reserve_ratio, self.bank_reserve_ratio);
        overlay(&mut args.home_appreciation_rate, self.home_appreciation_rate);
        overlay_int("projectionYears", &mut args.projection_years, self.projection_years)?;
        overlay(&mut args.property_value, self.property_value);
        overlay(&mut args.down_payment, self.down_payment);
        overlay(&mut args.interest_rate, self.interest_rate);
        overlay_int("loanTermYears", &mut args.loan_term_years, self.loan_term_years)?;
        Ok(args)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetWorthRequest {
    pub params: NetWorthParams,
    pub stock_income: StockIncome,
    pub financial_buffer: f64,
}

pub fn build_net_worth(args: &NetWorthArgs, max_years: u32) -> Result<NetWorthRequest, InputError> {
    let terms = loan_terms(
        args.property_value,
        args.down_payment,
        args.interest_rate,
        args.loan_term_years,
        max_years,
    )?;
    let fx_rate = positive("fxRate", args.fx_rate)?;
    let policy = StockSellPolicy {
        sell_monthly: args.sell_stocks_monthly,
        selling_fee: non_negative("sellingFee", args.selling_fee)?,
        sells_per_year: non_negative("sellsPerYear", args.sells_per_year)?,
    };
    let stock_income = monthly_stock_income(
        non_negative("stockIncomeUsd", args.stock_income_usd)?,
        non_negative("esppIncome", args.espp_income)?,
        fx_rate,
        &policy,
    );

    let params = NetWorthParams {
        initial_bank_balance: args.bank_balance,
        initial_stock_wealth: args.stock_wealth,
        income1: args.income1,
        income2: args.income2,
        stock_income: stock_income.total,
        monthly_expenses: non_negative("monthlyExpenses", args.monthly_expenses)?,
        property_value: terms.principal,
        down_payment: terms.down_payment,
        mortgage_rate_percent: terms.annual_rate_percent,
        mortgage_years: terms.term_years,
        home_appreciation_rate: args.home_appreciation_rate,
        investment_return_rate: args.bank_return_rate,
        stock_growth_rate: args.stock_growth_rate,
        bank_reserve_ratio: args.bank_reserve_ratio,
        reinvest_dividends: stock_income.reinvest_dividends,
        years: args.projection_years,
    };
    params.validate(max_years)?;

    Ok(NetWorthRequest {
        params,
        stock_income,
        financial_buffer: finite("financialBuffer", args.financial_buffer)?,
    })
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct EquityArgs {
    #[arg(long, default_value_t = 40.0, help = "Current share price in USD")]
    pub start_price: f64,
    #[arg(long, default_value_t = 0.92)]
    pub fx_rate: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual share price growth in percent")]
    pub growth_rate: f64,
    #[arg(long, default_value_t = 5)]
    pub projection_years: i32,
    #[arg(long, default_value_t = 0)]
    pub extra_months: u32,
    #[arg(long, default_value_t = 9.99, help = "Broker fee per RSU sale, USD")]
    pub transaction_fee: f64,
    #[arg(long, default_value_t = 0.05, help = "Per-share slippage on RSU sales, USD")]
    pub selling_loss: f64,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub rsu_enabled: bool,
    #[arg(long, default_value_t = 500)]
    pub rsu_total_stocks: u32,
    #[arg(long, default_value_t = 2)]
    pub rsu_start_offset: u32,
    #[arg(long, default_value_t = 48)]
    pub rsu_vest_months: u32,
    #[arg(long, default_value_t = 12, help = "Cliff in months, a multiple of 3")]
    pub rsu_delay_months: u32,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub espp_enabled: bool,
    #[arg(long, default_value_t = 5_000.0)]
    pub espp_gross_income: f64,
    #[arg(long, default_value_t = 10.0, help = "Contribution in percent of gross income")]
    pub espp_contribution: f64,
    #[arg(long, default_value_t = 0)]
    pub espp_start_offset: u32,
    #[arg(long, default_value_t = 6)]
    pub espp_interval: u32,
    #[arg(long, default_value_t = 15.0, help = "Purchase discount in percent")]
    pub espp_discount: f64,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub self_buy_enabled: bool,
    #[arg(long, default_value_t = 3_500.0)]
    pub self_net_income: f64,
    #[arg(long, default_value_t = 350.0, help = "Monthly amount, or percent with --self-is-percentage")]
    pub self_investment: f64,
    #[arg(long)]
    pub self_is_percentage: bool,
}

impl Default for EquityArgs {
    fn default() -> Self {
        EquityArgs {
            start_price: 40.0,
            fx_rate: 0.92,
            growth_rate: 0.0,
            projection_years: 5,
            extra_months: 0,
            transaction_fee: 9.99,
            selling_loss: 0.05,
            rsu_enabled: true,
            rsu_total_stocks: 500,
            rsu_start_offset: 2,
            rsu_vest_months: 48,
            rsu_delay_months: 12,
            espp_enabled: true,
            espp_gross_income: 5_000.0,
            espp_contribution: 10.0,
            espp_start_offset: 0,
            espp_interval: 6,
            espp_discount: 15.0,
            self_buy_enabled: true,
            self_net_income: 3_500.0,
            self_investment: 350.0,
            self_is_percentage: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EquityPayload {
    start_price: Option<NumberInput>,
    fx_rate: Option<NumberInput>,
    growth_rate: Option<NumberInput>,
    projection_years: Option<i64>,
    extra_months: Option<i64>,
    transaction_fee: Option<NumberInput>,
    selling_loss: Option<NumberInput>,

    rsu_enabled: Option<bool>,
    rsu_total_stocks: Option<i64>,
    rsu_start_offset: Option<i64>,
    rsu_vest_months: Option<i64>,
    rsu_delay_months: Option<i64>,
    /// Replaces the single block described by the `rsu*` fields.
    rsu_blocks: Option<Vec<RsuBlockRecord>>,

    espp_enabled: Option<bool>,
    espp_gross_income: Option<NumberInput>,
    espp_contribution: Option<NumberInput>,
    espp_start_offset: Option<i64>,
    espp_interval: Option<i64>,
    espp_discount: Option<NumberInput>,

    self_buy_enabled: Option<bool>,
    self_net_income: Option<NumberInput>,
    self_investment: Option<NumberInput>,
    self_is_percentage: Option<bool>,
}

impl EquityPayload {
    pub fn into_args(self) -> Result<(EquityArgs, Option<Vec<RsuBlockRecord>>), InputError> {
        let mut args = EquityArgs::default();
        overlay(&mut args.start_price, self.start_price);
        overlay(&mut args.fx_rate, self.fx_rate);
        overlay(&mut args.growth_rate, self.growth_rate);
        overlay_int("projectionYears", &mut args.projection_years, self.projection_years)?;
        overlay_u32("extraMonths", &mut args.extra_months, self.extra_months)?;
        overlay(&mut args.transaction_fee, self.transaction_fee);
        overlay(&mut args.selling_loss, self.selling_loss);

        if let Some(v) = self.rsu_enabled {
            args.rsu_enabled = v;
        }
        overlay_u32("rsuTotalStocks", &mut args.rsu_total_stocks, self.rsu_total_stocks)?;
        overlay_u32("rsuStartOffset", &mut args.rsu_start_offset, self.rsu_start_offset)?;
        overlay_u32("rsuVestMonths", &mut args.rsu_vest_months, self.rsu_vest_months)?;
        overlay_u32("rsuDelayMonths", &mut args.rsu_delay_months, self.rsu_delay_months)?;

        if let Some(v) = self.espp_enabled {
            args.espp_enabled = v;
        }
        overlay(&mut args.espp_gross_income, self.espp_gross_income);
        overlay(&mut args.espp_contribution, self.espp_contribution);
        overlay_u32("esppStartOffset", &mut args.espp_start_offset, self.espp_start_offset)?;
        overlay_u32("esppInterval", &mut args.espp_interval, self.espp_interval)?;
        overlay(&mut args.espp_discount, self.espp_discount);

        if let Some(v) = self.self_buy_enabled {
            args.self_buy_enabled = v;
        }
        overlay(&mut args.self_net_income, self.self_net_income);
        overlay(&mut args.self_investment, self.self_investment);
        if let Some(v) = self.self_is_percentage {
            args.self_is_percentage = v;
        }

        Ok((args, self.rsu_blocks))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityRequest {
    pub inputs: EquityInputs,
    pub income_estimate: StockIncomeEstimate,
}

fn single_block(args: &EquityArgs) -> RsuBlockRecord {
    RsuBlockRecord {
        total_stocks: i64::from(args.rsu_total_stocks),
        start_offset: i64::from(args.rsu_start_offset),
        vest_months: i64::from(args.rsu_vest_months),
        delay_months: Some(i64::from(args.rsu_delay_months)),
        ..RsuBlockRecord::default()
    }
}

pub fn build_equity(
    args: &EquityArgs,
    blocks: Option<&[RsuBlockRecord]>,
    max_years: u32,
) -> Result<EquityRequest, InputError> {
    let years = horizon_years("projectionYears", args.projection_years, max_years)?;
    let months = (years as u32 * 12).saturating_add(args.extra_months).max(1);
    if months > max_years * 12 {
        return Err(InputError::HorizonTooLong {
            years: i64::from(months.div_ceil(12)),
            max: max_years,
        });
    }

    let rsu_blocks = if args.rsu_enabled {
        match blocks {
            Some(records) => records
                .iter()
                .map(RsuBlockRecord::upgrade)
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![single_block(args).upgrade()?],
        }
    } else {
        Vec::new()
    };

    let espp = if args.espp_enabled {
        let params = EsppParams {
            gross_income: args.espp_gross_income,
            contribution_rate: finite("esppContribution", args.espp_contribution)? / 100.0,
            discount_rate: finite("esppDiscount", args.espp_discount)? / 100.0,
            vesting_interval_months: args.espp_interval,
            start_offset_months: args.espp_start_offset,
        };
        params.validate()?;
        Some(params)
    } else {
        None
    };

    let self_buy = if args.self_buy_enabled {
        Some(SelfBuyParams {
            net_income: non_negative("selfNetIncome", args.self_net_income)?,
            investment_amount_or_percent: non_negative("selfInvestment", args.self_investment)?,
            is_percentage: args.self_is_percentage,
        })
    } else {
        None
    };

    let start_price_usd = non_negative("startPrice", args.start_price)?;
    let income_estimate = estimate_stock_income(&rsu_blocks, start_price_usd, espp.as_ref());
    let inputs = EquityInputs {
        start_price_usd,
        annual_growth_rate: finite("growthRate", args.growth_rate)? / 100.0,
        months,
        sale_terms: RsuSaleTerms {
            fx_rate: positive("fxRate", args.fx_rate)?,
            transaction_fee: non_negative("transactionFee", args.transaction_fee)?,
            selling_loss: finite("sellingLoss", args.selling_loss)?,
        },
        rsu_blocks,
        espp,
        self_buy,
    };

    Ok(EquityRequest {
        inputs,
        income_estimate,
    })
}

/// Visible RSU blocks only; hidden blocks are kept by callers but never
/// projected.
pub fn visible_blocks(blocks: &[RsuBlock]) -> impl Iterator<Item = &RsuBlock> {
    blocks.iter().filter(|block| !block.hidden)
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BudgetPayload {
    pub income: Vec<LineItem>,
    pub expenses: Vec<LineItem>,
    pub mode: BudgetMode,
}

impl BudgetPayload {
    pub fn validate(&self) -> Result<(), InputError> {
        for item in self.income.iter().chain(&self.expenses) {
            if !item.amount.is_finite() {
                let field = if item.name.is_empty() {
                    "amount".to_string()
                } else {
                    format!("amount of {}", item.name)
                };
                return Err(InputError::invalid(field, "must be a finite number"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct MortgageCli {
        #[command(flatten)]
        args: MortgageArgs,
    }

    #[derive(Parser)]
    struct PropertyCli {
        #[command(flatten)]
        args: PropertyArgs,
    }

    #[derive(Parser)]
    struct NetWorthCli {
        #[command(flatten)]
        args: NetWorthArgs,
    }

    #[derive(Parser)]
    struct EquityCli {
        #[command(flatten)]
        args: EquityArgs,
    }

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn clap_defaults_match_api_defaults() {
        let argv = ["wealthplan"];
        assert_eq!(MortgageCli::parse_from(argv).args, MortgageArgs::default());
        assert_eq!(PropertyCli::parse_from(argv).args, PropertyArgs::default());
        assert_eq!(NetWorthCli::parse_from(argv).args, NetWorthArgs::default());
        assert_eq!(EquityCli::parse_from(argv).args, EquityArgs::default());
    }

    #[test]
    fn payload_accepts_numbers_and_formatted_text() {
        let payload: MortgagePayload = serde_json::from_str(
            r#"{"propertyValue":"€450 000","downPayment":50000,"interestRate":"oops","loanTermYears":25}"#,
        )
        .expect("payload");
        let args = payload.into_args().expect("args");
        assert_eq!(args.property_value, 450_000.0);
        assert_eq!(args.down_payment, 50_000.0);
        assert_eq!(args.interest_rate, 2.5);
        assert_eq!(args.loan_term_years, 25);
    }

    #[test]
    fn mortgage_rejects_long_term_and_negative_extra() {
        let args = MortgageArgs {
            loan_term_years: 60,
            ..MortgageArgs::default()
        };
        assert_eq!(
            build_mortgage(&args, 50),
            Err(InputError::HorizonTooLong { years: 60, max: 50 })
        );

        let args = MortgageArgs {
            extra_payment: -1.0,
            ..MortgageArgs::default()
        };
        assert!(build_mortgage(&args, 50).is_err());
    }

    #[test]
    fn property_defaults_to_default_mortgage_payment() {
        let request = build_property(&PropertyArgs::default(), 50).expect("request");
        let expected = monthly_payment(&LoanTerms {
            principal: 800_000.0,
            down_payment: 200_000.0,
            annual_rate_percent: 2.5,
            term_years: 30,
        });
        assert_approx(request.target_payment, expected);
    }

    #[test]
    fn net_worth_defaults_hold_stock_income() {
        let request = build_net_worth(&NetWorthArgs::default(), 50).expect("request");
        assert_approx(request.stock_income.total, 600.0 * 0.92);
        assert!(request.params.reinvest_dividends);
        assert_eq!(request.params.years, 30);
        assert_eq!(request.financial_buffer, 10_000.0);
    }

    #[test]
    fn net_worth_selling_applies_fee_and_pays_out() {
        let payload: NetWorthPayload = serde_json::from_str(
            r#"{"sellStocksMonthly":true,"sellsPerYear":4,"sellingFee":"6","esppIncome":100}"#,
        )
        .expect("payload");
        let args = payload.into_args().expect("args");
        let request = build_net_worth(&args, 50).expect("request");
        assert_approx(request.stock_income.rsu_income, 600.0 * 0.92 - 2.0);
        assert_approx(request.params.stock_income, 600.0 * 0.92 - 2.0 + 100.0);
        assert!(!request.params.reinvest_dividends);
    }

    #[test]
    fn net_worth_rejects_bad_inputs() {
        let bad_ratio = NetWorthArgs {
            bank_reserve_ratio: 1.2,
            ..NetWorthArgs::default()
        };
        assert!(build_net_worth(&bad_ratio, 50).is_err());

        let bad_fx = NetWorthArgs {
            fx_rate: 0.0,
            ..NetWorthArgs::default()
        };
        assert!(build_net_worth(&bad_fx, 50).is_err());

        let too_long = NetWorthArgs {
            projection_years: 45,
            ..NetWorthArgs::default()
        };
        assert!(build_net_worth(&too_long, 40).is_err());
        assert!(build_net_worth(&too_long, 50).is_ok());
    }

    #[test]
    fn equity_defaults_build_one_block_and_both_plans() {
        let request = build_equity(&EquityArgs::default(), None, 50).expect("request");
        let inputs = &request.inputs;
        assert_eq!(inputs.months, 60);
        assert_eq!(inputs.rsu_blocks.len(), 1);
        assert_eq!(inputs.rsu_blocks[0].delay_months, 12);
        let espp = inputs.espp.expect("espp enabled");
        assert_approx(espp.contribution_rate, 0.10);
        assert_approx(espp.discount_rate, 0.15);
        assert!(inputs.self_buy.is_some());
        assert_approx(request.income_estimate.rsu_monthly_usd, 500.0 / 48.0 / 2.0 * 40.0);
    }

    #[test]
    fn equity_horizon_has_at_least_one_month() {
        let args = EquityArgs {
            projection_years: 0,
            extra_months: 0,
            ..EquityArgs::default()
        };
        assert_eq!(build_equity(&args, None, 50).expect("request").inputs.months, 1);
    }

    #[test]
    fn equity_rejects_invalid_cliff() {
        let args = EquityArgs {
            rsu_delay_months: 10,
            ..EquityArgs::default()
        };
        assert!(build_equity(&args, None, 50).is_err());

        let args = EquityArgs {
            rsu_enabled: false,
            rsu_delay_months: 10,
            ..EquityArgs::default()
        };
        assert!(build_equity(&args, None, 50).is_ok());
    }

    #[test]
    fn equity_payload_blocks_replace_single_block() {
        let payload: EquityPayload = serde_json::from_str(
            r#"{"rsuBlocks":[
                {"totalStocks":120,"startOffset":0,"vestMonths":12,"delayMonths":0},
                {"totalStocks":60,"startOffset":3,"vestMonths":24,"intervals":8},
                {"totalStocks":99,"vestMonths":12,"hidden":true}
            ],"esppEnabled":false}"#,
        )
        .expect("payload");
        let (args, blocks) = payload.into_args().expect("args");
        let request = build_equity(&args, blocks.as_deref(), 50).expect("request");
        let upgraded = &request.inputs.rsu_blocks;
        assert_eq!(upgraded.len(), 3);
        assert_eq!(upgraded[1].delay_months, 12);
        assert_eq!(visible_blocks(upgraded).count(), 2);
        assert!(request.inputs.espp.is_none());
    }

    #[test]
    fn espp_rejects_zero_interval() {
        let args = EquityArgs {
            espp_interval: 0,
            ..EquityArgs::default()
        };
        assert!(build_equity(&args, None, 50).is_err());
    }

    #[test]
    fn budget_payload_defaults_to_separate() {
        let payload: BudgetPayload =
            serde_json::from_str(r#"{"income":[{"amount":10}]}"#).expect("payload");
        assert_eq!(payload.mode, BudgetMode::Separate);
        assert!(payload.expenses.is_empty());
        assert!(payload.validate().is_ok());
    }
}
