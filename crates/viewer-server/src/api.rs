//! Axum handlers for `/api/*` routes.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use viewer_data::calls::parse_date_bound;
use viewer_data::{
    rows, CallFilter, CallPage, Facets, PageRequest, RowFilter, RowPage, SampleCall, SortBy,
    Table,
};
use viewer_graph::Subgraph;

use crate::error::ApiError;
use crate::state::AppState;

const MAX_ROWS_PAGE_SIZE: u32 = 500;
const MAX_CALLS_PAGE_SIZE: u32 = 200;
const MAX_GRAPH_LIMIT: u32 = 500;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    25
}

fn default_graph_limit() -> u32 {
    50
}

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct RowsParams {
    dataset: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
    ticker: Option<String>,
    quarter: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionsParams {
    dataset: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallsParams {
    exchange: Option<String>,
    sector: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    return_min: Option<f64>,
    return_max: Option<f64>,
    pred_label: Option<String>,
    #[serde(default)]
    sort_by: SortBy,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphParams {
    ticker: Option<String>,
    #[serde(default = "default_graph_limit")]
    limit: u32,
}

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct DatasetList {
    datasets: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RowsResponse {
    dataset: String,
    page: u32,
    page_size: u32,
    #[serde(flatten)]
    result: RowPage,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Load a dataset off the async runtime; parsing a large file can take a while.
async fn load_table(state: &AppState, dataset: &str) -> Result<Arc<Table>, ApiError> {
    let cache = Arc::clone(&state.datasets);
    let name = dataset.to_string();
    let table = tokio::task::spawn_blocking(move || cache.load(&name))
        .await
        .map_err(|e| ApiError::Read(format!("Dataset load task failed: {e}")))??;
    Ok(table)
}

fn date_bound(field: &str, raw: Option<String>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Ok(Some(parse_date_bound(field, value)?)),
        None => Ok(None),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/datasets
pub(crate) async fn list_datasets(
    State(state): State<AppState>,
) -> Result<Json<DatasetList>, ApiError> {
    let datasets = state.datasets.list()?;
    Ok(Json(DatasetList { datasets }))
}

/// GET /api/rows
pub(crate) async fn get_rows(
    State(state): State<AppState>,
    params: Result<Query<RowsParams>, QueryRejection>,
) -> Result<Json<RowsResponse>, ApiError> {
    let Query(params) = params?;
    let page = PageRequest::new(params.page, params.page_size, MAX_ROWS_PAGE_SIZE)?;
    let table = load_table(&state, &params.dataset).await?;

    let filter = RowFilter {
        ticker: params.ticker,
        quarter: params.quarter,
        search: params.search,
    };
    let result = rows::query(&table, &filter, page);

    Ok(Json(RowsResponse {
        dataset: params.dataset,
        page: page.page(),
        page_size: page.page_size(),
        result,
    }))
}

/// GET /api/options
pub(crate) async fn get_options(
    State(state): State<AppState>,
    params: Result<Query<OptionsParams>, QueryRejection>,
) -> Result<Json<Facets>, ApiError> {
    let Query(params) = params?;
    let table = load_table(&state, &params.dataset).await?;
    Ok(Json(rows::options(&table)))
}

/// GET /api/sample-calls
pub(crate) async fn list_sample_calls(
    State(state): State<AppState>,
    params: Result<Query<CallsParams>, QueryRejection>,
) -> Result<Json<CallPage>, ApiError> {
    let Query(params) = params?;
    let page = PageRequest::new(params.page, params.page_size, MAX_CALLS_PAGE_SIZE)?;

    let filter = CallFilter {
        exchange: params.exchange,
        sector: params.sector,
        pred_label: params.pred_label,
        start_date: date_bound("start_date", params.start_date)?,
        end_date: date_bound("end_date", params.end_date)?,
        return_min: params.return_min,
        return_max: params.return_max,
    };

    Ok(Json(state.calls.list(&filter, params.sort_by, page)))
}

/// GET /api/sample-calls/{call_id}
pub(crate) async fn get_sample_call(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Result<Json<SampleCall>, ApiError> {
    let call = state.calls.get(&call_id)?;
    Ok(Json(call.clone()))
}

/// GET /api/graph
pub(crate) async fn get_graph(
    State(state): State<AppState>,
    params: Result<Query<GraphParams>, QueryRejection>,
) -> Result<Json<Subgraph>, ApiError> {
    let Query(params) = params?;
    if params.limit < 1 || params.limit > MAX_GRAPH_LIMIT {
        return Err(ApiError::Validation(format!(
            "limit must be between 1 and {MAX_GRAPH_LIMIT}, got {}",
            params.limit
        )));
    }

    let graph = state
        .graph
        .subgraph(params.ticker.as_deref(), params.limit)
        .await?;
    Ok(Json(graph))
}
