mod budget;
mod equity;
mod espp;
mod mortgage;
mod net_worth;
mod rsu;
mod self_buy;
mod stock;
mod types;

pub use budget::{
    BudgetMode, BudgetSummary, Frequency, LineItem, StockIncome, StockSellPolicy,
    convert_with_fee, monthly_stock_income, summarize_budget,
};
pub use equity::{
    CombinedMonthRow, EquityInputs, EquityProjection, EquitySummary, StockIncomeEstimate,
    estimate_stock_income, project_equity,
};
pub use espp::project_espp;
pub use mortgage::{amortization_schedule, monthly_payment, property_from_payment};
pub use net_worth::{LiquidBuckets, allocate_cash_flow, find_buffer_breach, project_net_worth};
pub use rsu::{
    RSU_BLOCK_SCHEMA_VERSION, RsuBlockRecord, RsuPayout, payout_schedule, project_rsu,
    settle_payout,
};
pub use self_buy::project_self_buy;
pub use stock::{price_at_month, stock_price_path};
pub use types::{
    AmortizationRow, BufferBreach, EsppMonthRow, EsppParams, LoanTerms, NetWorthParams,
    NetWorthSnapshot, RsuBlock, RsuMonthRow, RsuSaleTerms, SelfBuyMonthRow, SelfBuyParams,
};
