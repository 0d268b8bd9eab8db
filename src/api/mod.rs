use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{ComputedTaxpayerRecord, DatasetStore, RawTaxpayerRecord};

const DEFAULT_PAGE_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordsQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RegeneratePayload {
    records: u32,
    seed: u64,
}

impl Default for RegeneratePayload {
    fn default() -> Self {
        Self {
            records: 500,
            seed: 42,
        }
    }
}

#[derive(Debug, Serialize)]
struct RecordsResponse<'a> {
    total: usize,
    offset: usize,
    limit: usize,
    records: &'a [ComputedTaxpayerRecord],
}

#[derive(Debug, Serialize)]
struct RegenerateResponse {
    status: &'static str,
    records_generated: u32,
    seed: u64,
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    status: &'static str,
    records_loaded: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16, store: Arc<DatasetStore>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("tax analytics API listening on http://{addr}");

    axum::serve(listener, router(store)).await
}

fn router(store: Arc<DatasetStore>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/summary", get(summary_handler))
        .route("/api/income", get(income_handler))
        .route("/api/tax-rates", get(tax_rates_handler))
        .route("/api/deductions", get(deductions_handler))
        .route("/api/refunds", get(refunds_handler))
        .route("/api/state", get(state_handler))
        .route("/api/capital-gains", get(capital_gains_handler))
        .route("/api/credits", get(credits_handler))
        .route("/api/fica", get(fica_handler))
        .route("/api/full", get(full_handler))
        .route("/api/records", get(records_handler))
        .route("/api/regenerate", post(regenerate_handler))
        .route("/api/ingest", post(ingest_handler))
        .fallback(not_found_handler)
        .with_state(store)
}

async fn root_handler() -> Response {
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "message": "taxpayer population analytics API",
            "endpoints": [
                "/api/summary", "/api/income", "/api/tax-rates", "/api/deductions",
                "/api/refunds", "/api/state", "/api/capital-gains", "/api/credits",
                "/api/fica", "/api/full", "/api/records",
            ],
        }),
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn summary_handler(State(store): State<Arc<DatasetStore>>) -> Response {
    json_response(StatusCode::OK, &store.snapshot().summary.summary)
}

async fn income_handler(State(store): State<Arc<DatasetStore>>) -> Response {
    json_response(StatusCode::OK, &store.snapshot().summary.income)
}

async fn tax_rates_handler(State(store): State<Arc<DatasetStore>>) -> Response {
    json_response(StatusCode::OK, &store.snapshot().summary.tax_rates)
}

async fn deductions_handler(State(store): State<Arc<DatasetStore>>) -> Response {
    json_response(StatusCode::OK, &store.snapshot().summary.deductions)
}

async fn refunds_handler(State(store): State<Arc<DatasetStore>>) -> Response {
    json_response(StatusCode::OK, &store.snapshot().summary.refunds)
}

async fn state_handler(State(store): State<Arc<DatasetStore>>) -> Response {
    json_response(StatusCode::OK, &store.snapshot().summary.by_state)
}

async fn capital_gains_handler(State(store): State<Arc<DatasetStore>>) -> Response {
    json_response(StatusCode::OK, &store.snapshot().summary.capital_gains)
}

async fn credits_handler(State(store): State<Arc<DatasetStore>>) -> Response {
    json_response(StatusCode::OK, &store.snapshot().summary.credits_dependents)
}

async fn fica_handler(State(store): State<Arc<DatasetStore>>) -> Response {
    json_response(StatusCode::OK, &store.snapshot().summary.fica)
}

async fn full_handler(State(store): State<Arc<DatasetStore>>) -> Response {
    json_response(StatusCode::OK, &store.snapshot().summary)
}

async fn records_handler(
    State(store): State<Arc<DatasetStore>>,
    Query(query): Query<RecordsQuery>,
) -> Response {
    let snapshot = store.snapshot();
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let (start, end) = page_bounds(snapshot.population.len(), offset, limit);

    json_response(
        StatusCode::OK,
        RecordsResponse {
            total: snapshot.population.len(),
            offset,
            limit,
            records: &snapshot.population[start..end],
        },
    )
}

async fn regenerate_handler(
    State(store): State<Arc<DatasetStore>>,
    payload: Option<Json<RegeneratePayload>>,
) -> Response {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    match store.regenerate(payload.records, payload.seed) {
        Ok(dataset) => {
            info!(
                records = payload.records,
                seed = payload.seed,
                "population regenerated"
            );
            json_response(
                StatusCode::OK,
                RegenerateResponse {
                    status: "ok",
                    records_generated: dataset.population.len() as u32,
                    seed: payload.seed,
                },
            )
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn ingest_handler(
    State(store): State<Arc<DatasetStore>>,
    payload: Result<Json<Vec<RawTaxpayerRecord>>, JsonRejection>,
) -> Response {
    // A body that fails to deserialize (bad JSON, unknown filing status or
    // state code) gets the same JSON error envelope as a record that fails
    // validation, not axum's plain-text rejection.
    let Json(records) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(rejection.status(), &rejection.body_text()),
    };

    match store.ingest(&records) {
        Ok(dataset) => {
            info!(records = dataset.population.len(), "population ingested");
            json_response(
                StatusCode::OK,
                IngestResponse {
                    status: "ok",
                    records_loaded: dataset.population.len(),
                },
            )
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

fn page_bounds(total: usize, offset: usize, limit: usize) -> (usize, usize) {
    let start = offset.min(total);
    let end = start.saturating_add(limit).min(total);
    (start, end)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
