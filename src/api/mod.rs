pub mod params;

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::{Config, HARD_MAX_PROJECTION_YEARS};
use crate::core::{
    AmortizationRow, BudgetSummary, BufferBreach, EquityProjection, NetWorthSnapshot, StockIncome,
    StockIncomeEstimate, amortization_schedule, find_buffer_breach, monthly_payment,
    project_equity, project_net_worth, property_from_payment, summarize_budget,
};
use crate::error::AppError;
use crate::format::format_currency;

use params::{
    BudgetPayload, EquityPayload, EquityRequest, MortgagePayload, MortgageRequest,
    NetWorthPayload, NetWorthRequest, PropertyPayload, PropertyRequest, build_equity,
    build_mortgage, build_net_worth, build_property, visible_blocks,
};

/// Per-router settings. Every request builds its own inputs from these.
#[derive(Debug, Clone, Copy)]
pub struct AppState {
    pub max_projection_years: u32,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        AppState {
            max_projection_years: config.max_projection_years,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            max_projection_years: HARD_MAX_PROJECTION_YEARS,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageResponse {
    pub monthly_payment: f64,
    pub loan_amount: f64,
    pub extra_payment: f64,
    pub payoff_months: usize,
    pub total_paid: f64,
    pub total_interest: f64,
    pub schedule: Vec<AmortizationRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    pub target_payment: f64,
    pub property_value: f64,
    pub loan_amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthResponse {
    pub monthly_mortgage_payment: f64,
    pub stock_income: StockIncome,
    pub financial_buffer: f64,
    pub buffer_breach: Option<BufferBreach>,
    pub warning: Option<String>,
    pub final_snapshot: Option<NetWorthSnapshot>,
    pub snapshots: Vec<NetWorthSnapshot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityResponse {
    pub income_estimate: StockIncomeEstimate,
    #[serde(flatten)]
    pub projection: EquityProjection,
}

pub fn mortgage_response(request: &MortgageRequest) -> MortgageResponse {
    let schedule = amortization_schedule(&request.terms, request.extra_payment);
    let total_paid = schedule.iter().map(|row| row.total_payment).sum();
    let total_interest = schedule.iter().map(|row| row.interest_payment).sum();

    MortgageResponse {
        monthly_payment: monthly_payment(&request.terms),
        loan_amount: request.terms.effective_principal(),
        extra_payment: request.extra_payment,
        payoff_months: schedule.len(),
        total_paid,
        total_interest,
        schedule,
    }
}

pub fn property_response(request: &PropertyRequest) -> PropertyResponse {
    let property_value = property_from_payment(
        request.target_payment,
        request.annual_rate_percent,
        request.term_years,
        request.down_payment,
    );
    PropertyResponse {
        target_payment: request.target_payment,
        property_value,
        loan_amount: property_value - request.down_payment,
    }
}

pub fn net_worth_response(request: &NetWorthRequest) -> NetWorthResponse {
    let snapshots = project_net_worth(&request.params);
    let buffer_breach = find_buffer_breach(&snapshots, request.financial_buffer);
    let warning = buffer_breach.map(|breach| buffer_warning(&breach, request.financial_buffer));

    NetWorthResponse {
        monthly_mortgage_payment: monthly_payment(&request.params.loan_terms()),
        stock_income: request.stock_income,
        financial_buffer: request.financial_buffer,
        buffer_breach,
        warning,
        final_snapshot: snapshots.last().copied(),
        snapshots,
    }
}

fn buffer_warning(breach: &BufferBreach, financial_buffer: f64) -> String {
    format!(
        "Bank reserve falls below the {} buffer in month {} (year {:.1}); lowest reserve is {}",
        format_currency(financial_buffer, "€", true),
        breach.first_month,
        breach.first_year,
        format_currency(breach.minimum_bank_reserve, "€", true),
    )
}

pub fn equity_response(request: &EquityRequest) -> EquityResponse {
    EquityResponse {
        income_estimate: request.income_estimate,
        projection: project_equity(&request.inputs),
    }
}

pub fn budget_response(payload: &BudgetPayload) -> BudgetSummary {
    summarize_budget(&payload.income, &payload.expenses, payload.mode)
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/mortgage",
            get(mortgage_get_handler).post(mortgage_post_handler),
        )
        .route(
            "/api/mortgage/property",
            get(property_get_handler).post(property_post_handler),
        )
        .route(
            "/api/net-worth",
            get(net_worth_get_handler).post(net_worth_post_handler),
        )
        .route(
            "/api/equity",
            get(equity_get_handler).post(equity_post_handler),
        )
        .route("/api/budget", post(budget_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: Config) -> std::io::Result<()> {
    let addr = SocketAddr::new(config.bind_addr, config.port);
    let app = create_router(AppState::new(&config));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, max_years = config.max_projection_years, "wealthplan HTTP API listening");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({"status": "ok"}))
}

async fn not_found_handler(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

fn query_payload<T>(payload: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    payload
        .map(|Query(payload)| payload)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(payload)| payload)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn mortgage_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<MortgagePayload>, QueryRejection>,
) -> Result<Response, AppError> {
    mortgage_handler_impl(state, query_payload(payload)?)
}

async fn mortgage_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<MortgagePayload>, JsonRejection>,
) -> Result<Response, AppError> {
    mortgage_handler_impl(state, json_payload(payload)?)
}

fn mortgage_handler_impl(state: AppState, payload: MortgagePayload) -> Result<Response, AppError> {
    let args = payload.into_args()?;
    let request = build_mortgage(&args, state.max_projection_years)?;
    let response = mortgage_response(&request);
    debug!(
        term_years = request.terms.term_years,
        rows = response.schedule.len(),
        "mortgage schedule"
    );
    Ok(json_response(StatusCode::OK, response))
}

async fn property_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<PropertyPayload>, QueryRejection>,
) -> Result<Response, AppError> {
    property_handler_impl(state, query_payload(payload)?)
}

async fn property_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<PropertyPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    property_handler_impl(state, json_payload(payload)?)
}

fn property_handler_impl(state: AppState, payload: PropertyPayload) -> Result<Response, AppError> {
    let args = payload.into_args()?;
    let request = build_property(&args, state.max_projection_years)?;
    let response = property_response(&request);
    debug!(
        target_payment = request.target_payment,
        property_value = response.property_value,
        "property from payment"
    );
    Ok(json_response(StatusCode::OK, response))
}

async fn net_worth_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<NetWorthPayload>, QueryRejection>,
) -> Result<Response, AppError> {
    net_worth_handler_impl(state, query_payload(payload)?)
}

async fn net_worth_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<NetWorthPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    net_worth_handler_impl(state, json_payload(payload)?)
}

fn net_worth_handler_impl(state: AppState, payload: NetWorthPayload) -> Result<Response, AppError> {
    let args = payload.into_args()?;
    let request = build_net_worth(&args, state.max_projection_years)?;
    let response = net_worth_response(&request);
    debug!(
        years = request.params.years,
        rows = response.snapshots.len(),
        "net worth projection"
    );
    if let Some(breach) = response.buffer_breach {
        warn!(
            first_month = breach.first_month,
            minimum_bank_reserve = breach.minimum_bank_reserve,
            buffer = request.financial_buffer,
            "bank reserve falls below financial buffer"
        );
    }
    Ok(json_response(StatusCode::OK, response))
}

async fn equity_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<EquityPayload>, QueryRejection>,
) -> Result<Response, AppError> {
    equity_handler_impl(state, query_payload(payload)?)
}

async fn equity_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<EquityPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    equity_handler_impl(state, json_payload(payload)?)
}

fn equity_handler_impl(state: AppState, payload: EquityPayload) -> Result<Response, AppError> {
    let (args, blocks) = payload.into_args()?;
    let request = build_equity(&args, blocks.as_deref(), state.max_projection_years)?;
    let response = equity_response(&request);
    debug!(
        months = request.inputs.months,
        visible_blocks = visible_blocks(&request.inputs.rsu_blocks).count(),
        rows = response.projection.combined.len(),
        "equity projection"
    );
    Ok(json_response(StatusCode::OK, response))
}

async fn budget_handler(
    payload: Result<Json<BudgetPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = json_payload(payload)?;
    payload.validate()?;
    let summary = budget_response(&payload);
    debug!(
        income_items = payload.income.len(),
        expense_items = payload.expenses.len(),
        mode = ?payload.mode,
        "budget summary"
    );
    Ok(json_response(StatusCode::OK, summary))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}
