use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use tickerdesk_core::fetch::normalize_symbols;
use tickerdesk_core::llm::error::{LlmDiagnosticsError, MissingCredentialError};
use tickerdesk_core::llm::{EnvLlmConnector, LlmConnector};
use tickerdesk_core::market::yahoo::YahooFinanceProvider;
use tickerdesk_core::market::{is_valid_symbol, MarketDataProvider};
use tickerdesk_core::report::ReportGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tickerdesk_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let market = YahooFinanceProvider::from_settings(&settings)?;

    // The model credential is resolved per request by the connector, not here.
    let state = AppState {
        market: Arc::new(market),
        llm: Arc::new(EnvLlmConnector),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, llm_provider = %settings.llm_provider, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/compare", post(compare))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    market: Arc<dyn MarketDataProvider>,
    llm: Arc<dyn LlmConnector>,
}

#[derive(Debug, Deserialize)]
struct CompareRequest {
    #[serde(default)]
    symbols: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CompareResponse {
    report: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Internal(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

async fn compare(
    State(state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>, ApiError> {
    let request_id = Uuid::new_v4();

    let Json(req) = payload.map_err(|e| {
        tracing::warn!(%request_id, error = %e, "rejected compare request body");
        ApiError::BadRequest(e.body_text())
    })?;

    let symbols = normalize_symbols(&req.symbols);
    if symbols.is_empty() {
        return Err(ApiError::BadRequest("symbols array is required".to_string()));
    }
    if let Some(bad) = symbols.iter().find(|s| !is_valid_symbol(s)) {
        tracing::warn!(%request_id, symbol = %bad, "rejected invalid symbol");
        return Err(ApiError::BadRequest(format!("invalid symbol: {bad}")));
    }

    let llm = state.llm.connect().map_err(|err| {
        match err.downcast_ref::<MissingCredentialError>() {
            Some(missing) => {
                tracing::error!(%request_id, env_var = missing.env_var, "model credential missing");
                ApiError::Internal(missing.to_string())
            }
            None => internal_error(request_id, err),
        }
    })?;

    tracing::info!(%request_id, symbols = ?symbols, "compare request accepted");

    let report = ReportGenerator::new(state.market.as_ref(), llm.as_ref())
        .generate(&symbols)
        .await
        .map_err(|err| internal_error(request_id, err))?;

    tracing::info!(%request_id, report_chars = report.len(), "compare request completed");
    Ok(Json(CompareResponse { report }))
}

fn internal_error(request_id: Uuid, err: anyhow::Error) -> ApiError {
    sentry_anyhow::capture_anyhow(&err);
    match err.downcast_ref::<LlmDiagnosticsError>() {
        Some(diag) => tracing::error!(
            %request_id,
            provider = %diag.provider,
            stage = diag.stage,
            raw_output = diag.raw_output.as_deref().unwrap_or(""),
            error = ?err,
            "analysis failed"
        ),
        None => tracing::error!(%request_id, error = ?err, "analysis failed"),
    }
    ApiError::Internal(format!("{err:#}"))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &tickerdesk_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
