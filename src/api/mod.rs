pub mod cli;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    DEFAULT_SEED, DEFAULT_SIMULATIONS, EngineConfig, FilingStatus, MonteCarloConfig,
    SensitivityResult, SimResult, SimulationError, SimulationInputs, run_monte_carlo,
    run_sensitivity_analysis, simulate_with,
};

/// Body fields a client may send, used to attribute type errors to a field.
const PAYLOAD_FIELDS: [&str; 25] = [
    "monthly_rent",
    "annual_rent_increase",
    "renter_insurance",
    "security_deposit",
    "broker_fee",
    "purchase_price",
    "down_payment_percent",
    "mortgage_rate",
    "loan_term_years",
    "property_tax_rate",
    "home_insurance_rate",
    "hoa_monthly",
    "maintenance_rate",
    "pmi_rate",
    "buyer_closing_costs_percent",
    "selling_costs_percent",
    "holding_period_years",
    "annual_appreciation",
    "annual_investment_return",
    "marginal_tax_rate",
    "state_tax_rate",
    "filing_status",
    "capital_gains_tax_rate",
    "simulations",
    "seed",
];

/// Request body for the calculation endpoints. Absent fields keep their defaults.
/// Year counts are read as signed integers so negative values reach validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CalculatePayload {
    monthly_rent: Option<f64>,
    annual_rent_increase: Option<f64>,
    renter_insurance: Option<f64>,
    security_deposit: Option<f64>,
    broker_fee: Option<f64>,

    purchase_price: Option<f64>,
    down_payment_percent: Option<f64>,
    mortgage_rate: Option<f64>,
    loan_term_years: Option<i64>,
    property_tax_rate: Option<f64>,
    home_insurance_rate: Option<f64>,
    hoa_monthly: Option<f64>,
    maintenance_rate: Option<f64>,
    pmi_rate: Option<f64>,
    buyer_closing_costs_percent: Option<f64>,
    selling_costs_percent: Option<f64>,

    holding_period_years: Option<i64>,
    annual_appreciation: Option<f64>,
    annual_investment_return: Option<f64>,
    marginal_tax_rate: Option<f64>,
    state_tax_rate: Option<f64>,
    filing_status: Option<String>,
    capital_gains_tax_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MonteCarloPayload {
    #[serde(flatten)]
    inputs: CalculatePayload,
    simulations: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct SensitivityResponse {
    base_outcome: f64,
    results: Vec<SensitivityResult>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

pub fn router(config: Arc<EngineConfig>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/calculate", post(calculate_handler))
        .route("/api/sensitivity", post(sensitivity_handler))
        .route("/api/montecarlo", post(monte_carlo_handler))
        .fallback(not_found_handler)
        .with_state(config)
}

pub async fn run_http_server(addr: SocketAddr, config: EngineConfig) -> std::io::Result<()> {
    let app = router(Arc::new(config));
    let listener = TcpListener::bind(addr).await?;
    log::info!("ownvsrent HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "healthy" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "not_found", None, "Not found")
}

async fn calculate_handler(
    State(config): State<Arc<EngineConfig>>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    let inputs = match payload_inputs(payload) {
        Ok(inputs) => inputs,
        Err(response) => return response,
    };
    match run_blocking(move || simulate_with(inputs, &config)).await {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(response) => response,
    }
}

async fn sensitivity_handler(
    State(config): State<Arc<EngineConfig>>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    let inputs = match payload_inputs(payload) {
        Ok(inputs) => inputs,
        Err(response) => return response,
    };
    match run_blocking(move || run_sensitivity_analysis(inputs, &config)).await {
        Ok(results) => json_response(
            StatusCode::OK,
            SensitivityResponse {
                base_outcome: results.first().map(|r| r.base_outcome).unwrap_or(0.0),
                results,
            },
        ),
        Err(response) => response,
    }
}

async fn monte_carlo_handler(
    State(config): State<Arc<EngineConfig>>,
    payload: Result<Json<MonteCarloPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let inputs = match inputs_from_payload(payload.inputs) {
        Ok(inputs) => inputs,
        Err(err) => return simulation_error_response(err),
    };
    let run = MonteCarloConfig {
        simulations: payload.simulations.unwrap_or(DEFAULT_SIMULATIONS),
        seed: payload.seed.unwrap_or(DEFAULT_SEED),
        ..MonteCarloConfig::default()
    };
    match run_blocking(move || run_monte_carlo(inputs, &config, run)).await {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(response) => response,
    }
}

/// Runs CPU-bound engine work off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> SimResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(simulation_error_response),
        Err(err) => {
            log::error!("simulation task failed: {err}");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                None,
                "Simulation task failed",
            ))
        }
    }
}

fn payload_inputs(
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Result<SimulationInputs, Response> {
    match payload {
        Ok(Json(payload)) => inputs_from_payload(payload).map_err(simulation_error_response),
        Err(rejection) => Err(rejection_response(rejection)),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(
    status: StatusCode,
    kind: &'static str,
    field: Option<&'static str>,
    msg: &str,
) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            kind,
            field,
        },
    )
}

fn simulation_error_response(err: SimulationError) -> Response {
    log::warn!("rejected request: {err}");
    error_response(
        StatusCode::BAD_REQUEST,
        err.kind(),
        Some(err.field()),
        &err.to_string(),
    )
}

fn rejection_response(rejection: JsonRejection) -> Response {
    log::warn!("rejected request body: {rejection}");
    match rejected_field(&rejection) {
        Some(field) => error_response(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            Some(field),
            &rejection.body_text(),
        ),
        None => error_response(
            StatusCode::BAD_REQUEST,
            "invalid_json",
            None,
            &rejection.body_text(),
        ),
    }
}

/// Field named by a well-formed body whose value has the wrong type.
/// Data errors read `... target type: <path>: <reason>`.
fn rejected_field(rejection: &JsonRejection) -> Option<&'static str> {
    let JsonRejection::JsonDataError(err) = rejection else {
        return None;
    };
    let text = err.body_text();
    let detail = text
        .split_once("target type: ")
        .map_or(text.as_str(), |(_, detail)| detail);
    let (path, _) = detail.split_once(": ")?;
    PAYLOAD_FIELDS.iter().copied().find(|field| *field == path)
}

fn year_count(field: &'static str, value: i64) -> Result<u32, SimulationError> {
    u32::try_from(value).map_err(|_| {
        SimulationError::invalid(field, format!("must be a whole number of years, got {value}"))
    })
}

/// Overlays the payload on the default household.
pub fn inputs_from_payload(payload: CalculatePayload) -> Result<SimulationInputs, SimulationError> {
    let mut inputs = SimulationInputs::default();

    if let Some(v) = payload.monthly_rent {
        inputs.monthly_rent = v;
    }
    if let Some(v) = payload.annual_rent_increase {
        inputs.annual_rent_increase = v;
    }
    if let Some(v) = payload.renter_insurance {
        inputs.renter_insurance = v;
    }
    if let Some(v) = payload.security_deposit {
        inputs.security_deposit = v;
    }
    if let Some(v) = payload.broker_fee {
        inputs.broker_fee = v;
    }
    if let Some(v) = payload.purchase_price {
        inputs.purchase_price = v;
    }
    if let Some(v) = payload.down_payment_percent {
        inputs.down_payment_percent = v;
    }
    if let Some(v) = payload.mortgage_rate {
        inputs.mortgage_rate = v;
    }
    if let Some(v) = payload.loan_term_years {
        inputs.loan_term_years = year_count("loan_term_years", v)?;
    }
    if let Some(v) = payload.property_tax_rate {
        inputs.property_tax_rate = v;
    }
    if let Some(v) = payload.home_insurance_rate {
        inputs.home_insurance_rate = v;
    }
    if let Some(v) = payload.hoa_monthly {
        inputs.hoa_monthly = v;
    }
    if let Some(v) = payload.maintenance_rate {
        inputs.maintenance_rate = v;
    }
    if let Some(v) = payload.pmi_rate {
        inputs.pmi_rate = v;
    }
    if let Some(v) = payload.buyer_closing_costs_percent {
        inputs.buyer_closing_costs_percent = v;
    }
    if let Some(v) = payload.selling_costs_percent {
        inputs.selling_costs_percent = v;
    }
    if let Some(v) = payload.holding_period_years {
        inputs.holding_period_years = year_count("holding_period_years", v)?;
    }
    if let Some(v) = payload.annual_appreciation {
        inputs.annual_appreciation = v;
    }
    if let Some(v) = payload.annual_investment_return {
        inputs.annual_investment_return = v;
    }
    if let Some(v) = payload.marginal_tax_rate {
        inputs.marginal_tax_rate = v;
    }
    if let Some(v) = payload.state_tax_rate {
        inputs.state_tax_rate = v;
    }
    if let Some(v) = payload.filing_status {
        inputs.filing_status = FilingStatus::parse(&v).ok_or_else(|| {
            SimulationError::invalid("filing_status", format!("unknown filing status `{v}`"))
        })?;
    }
    if let Some(v) = payload.capital_gains_tax_rate {
        inputs.capital_gains_tax_rate = v;
    }

    Ok(inputs)
}
