use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use nl_api_types::{
    AssetView, AssetsResponse, LoanGateView, LoanProposeRequest, LoanProposeResponse, ReloadResponse,
    SessionResponse, TokenId,
};
use nl_chain_client::DappError;
use nl_dashboard_core::{Dashboard, LoanError};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub dashboard: Arc<Dashboard>,
}

pub(crate) fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/session", get(session))
        .route("/session/connect", post(session_connect))
        .route("/assets", get(assets))
        .route("/assets/reload", post(assets_reload))
        .route("/assets/{token_id}/loan", post(loan_propose))
        .route("/assets/{token_id}/loan/confirm", post(loan_confirm))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "dashboard-service",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "dashboard-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(state.dashboard.session().to_response())
}

async fn session_connect(State(state): State<AppState>) -> ApiResult<SessionResponse> {
    match state.dashboard.connect().await {
        Ok(_) => Ok(Json(state.dashboard.session().to_response())),
        Err(err @ DappError::AuthorizationDenied(_)) => Err(forbidden(&err.to_string())),
        Err(err @ DappError::ProviderUnavailable) => Err(service_unavailable(&err.to_string())),
        Err(err) => Err(internal_error(err)),
    }
}

async fn assets(State(state): State<AppState>) -> Json<AssetsResponse> {
    Json(state.dashboard.board().to_response())
}

async fn assets_reload(State(state): State<AppState>) -> (StatusCode, Json<ReloadResponse>) {
    let generation = state.dashboard.board().generation;
    drop(state.dashboard.reload());
    info!(after_generation = generation, "asset reload requested");
    (StatusCode::ACCEPTED, Json(ReloadResponse { started: true }))
}

async fn loan_propose(
    State(state): State<AppState>,
    Path(token_id): Path<u64>,
    Json(request): Json<LoanProposeRequest>,
) -> ApiResult<LoanProposeResponse> {
    let (accepted, record) = state
        .dashboard
        .propose_loan(TokenId(token_id), &request.amount)
        .map_err(loan_error)?;

    Ok(Json(LoanProposeResponse {
        token_id,
        accepted,
        estimated_value: record.estimated_value,
        loan: LoanGateView {
            pending_amount: record.loan.pending_amount(),
            confirm_enabled: record.loan.confirm_enabled(),
        },
    }))
}

async fn loan_confirm(State(state): State<AppState>, Path(token_id): Path<u64>) -> ApiResult<AssetView> {
    let record = state
        .dashboard
        .confirm_loan(TokenId(token_id))
        .map_err(loan_error)?;
    info!(token_id, value = %record.estimated_value, "loan confirmed");
    Ok(Json(record.to_view()))
}

fn loan_error(err: LoanError) -> ApiError {
    match err {
        LoanError::UnknownToken(_) => not_found(&err.to_string()),
        LoanError::ConfirmDisabled(_) => conflict(&err.to_string()),
    }
}

fn error_response(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}

fn forbidden(message: &str) -> ApiError {
    error_response(StatusCode::FORBIDDEN, message)
}

fn not_found(message: &str) -> ApiError {
    error_response(StatusCode::NOT_FOUND, message)
}

fn conflict(message: &str) -> ApiError {
    error_response(StatusCode::CONFLICT, message)
}

fn service_unavailable(message: &str) -> ApiError {
    error_response(StatusCode::SERVICE_UNAVAILABLE, message)
}

fn internal_error(err: impl std::fmt::Display) -> ApiError {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
}
