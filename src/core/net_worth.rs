use super::mortgage::{amortization_schedule, monthly_payment};
use super::types::{BufferBreach, NetWorthParams, NetWorthSnapshot};
use crate::error::InputError;

impl NetWorthParams {
    pub fn validate(&self, max_years: u32) -> Result<(), InputError> {
        if self.years < 0 {
            return Err(InputError::invalid("years", "must be >= 0"));
        }
        if i64::from(self.years) > i64::from(max_years) {
            return Err(InputError::HorizonTooLong {
                years: i64::from(self.years),
                max: max_years,
            });
        }
        if !(0.0..=1.0).contains(&self.bank_reserve_ratio) {
            return Err(InputError::invalid(
                "bankReserveRatio",
                "must be between 0 and 1",
            ));
        }
        for (name, value) in [
            ("initialBankBalance", self.initial_bank_balance),
            ("initialStockWealth", self.initial_stock_wealth),
            ("income1", self.income1),
            ("income2", self.income2),
            ("stockIncome", self.stock_income),
            ("monthlyExpenses", self.monthly_expenses),
            ("propertyValue", self.property_value),
            ("downPayment", self.down_payment),
            ("mortgageRate", self.mortgage_rate_percent),
            ("homeAppreciationRate", self.home_appreciation_rate),
            ("investmentReturnRate", self.investment_return_rate),
            ("stockGrowthRate", self.stock_growth_rate),
        ] {
            if !value.is_finite() {
                return Err(InputError::invalid(name, "must be a finite number"));
            }
        }
        if self.initial_bank_balance < 0.0 || self.initial_stock_wealth < 0.0 {
            return Err(InputError::invalid(
                "initialBalances",
                "bank and stock balances must be >= 0",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidBuckets {
    pub bank: f64,
    pub stock: f64,
}

/// Routes one month of cash flow into the bank and stock buckets.
///
/// A surplus is split by `bank_reserve_ratio`. A deficit is drawn from the
/// bank first; whatever the bank cannot cover comes out of stocks, and
/// neither bucket goes below zero.
pub fn allocate_cash_flow(
    buckets: LiquidBuckets,
    cash_flow: f64,
    bank_reserve_ratio: f64,
) -> LiquidBuckets {
    if cash_flow >= 0.0 {
        return LiquidBuckets {
            bank: buckets.bank + cash_flow * bank_reserve_ratio,
            stock: buckets.stock + cash_flow * (1.0 - bank_reserve_ratio),
        };
    }

    if buckets.bank + cash_flow >= 0.0 {
        LiquidBuckets {
            bank: buckets.bank + cash_flow,
            stock: buckets.stock,
        }
    } else {
        let shortfall = -cash_flow - buckets.bank;
        LiquidBuckets {
            bank: 0.0,
            stock: (buckets.stock - shortfall).max(0.0),
        }
    }
}

fn monthly_factor(annual_percent: f64) -> f64 {
    1.0 + annual_percent / 12.0 / 100.0
}

/// Month-by-month net-worth simulation. Returns `years * 12 + 1` snapshots,
/// starting with the month-0 state seeded from the initial balances.
pub fn project_net_worth(params: &NetWorthParams) -> Vec<NetWorthSnapshot> {
    let months = params.years.max(0) as u32 * 12;
    let terms = params.loan_terms();
    let payment = monthly_payment(&terms);
    let schedule = amortization_schedule(&terms, 0.0);

    let (regular_income, reinvested_income) = if params.reinvest_dividends {
        (params.income1 + params.income2, params.stock_income)
    } else {
        (params.income1 + params.income2 + params.stock_income, 0.0)
    };
    let cash_flow = regular_income - params.monthly_expenses - payment;

    let initial_balance = terms.effective_principal();
    let mut home_value = params.property_value;
    let mut buckets = LiquidBuckets {
        bank: params.initial_bank_balance,
        stock: params.initial_stock_wealth,
    };
    let mut principal_paid = params.down_payment;

    let mut snapshots = Vec::with_capacity(months as usize + 1);
    snapshots.push(snapshot(0, buckets, home_value, initial_balance, principal_paid));

    for month in 1..=months {
        home_value *= monthly_factor(params.home_appreciation_rate);

        let (mortgage_balance, principal_this_month) = schedule
            .get(month as usize - 1)
            .map(|row| (row.remaining_balance, row.principal_payment))
            .unwrap_or((0.0, 0.0));
        principal_paid += principal_this_month;

        let grown = LiquidBuckets {
            bank: buckets.bank * monthly_factor(params.investment_return_rate),
            stock: buckets.stock * monthly_factor(params.stock_growth_rate) + reinvested_income,
        };
        buckets = allocate_cash_flow(grown, cash_flow, params.bank_reserve_ratio);

        snapshots.push(snapshot(
            month,
            buckets,
            home_value,
            mortgage_balance,
            principal_paid,
        ));
    }

    snapshots
}

fn snapshot(
    month: u32,
    buckets: LiquidBuckets,
    home_value: f64,
    mortgage_balance: f64,
    principal_paid: f64,
) -> NetWorthSnapshot {
    let home_equity = (home_value - mortgage_balance).max(0.0);
    NetWorthSnapshot {
        month,
        net_worth: buckets.bank + buckets.stock + home_equity,
        bank_reserve: buckets.bank,
        stock_wealth: buckets.stock,
        liquid_assets: buckets.bank + buckets.stock,
        home_value,
        home_equity,
        mortgage_balance,
        principal_paid,
    }
}

/// First month whose bank reserve falls below `financial_buffer`, if any.
pub fn find_buffer_breach(
    snapshots: &[NetWorthSnapshot],
    financial_buffer: f64,
) -> Option<BufferBreach> {
    let first = snapshots
        .iter()
        .find(|snapshot| snapshot.bank_reserve < financial_buffer)?;
    let minimum_bank_reserve = snapshots
        .iter()
        .map(|snapshot| snapshot.bank_reserve)
        .fold(f64::INFINITY, f64::min);

    Some(BufferBreach {
        first_month: first.month,
        first_year: f64::from(first.month) / 12.0,
        minimum_bank_reserve,
    })
}
