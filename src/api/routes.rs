//! API route handlers.
//!
//! All endpoints speak JSON. State is the shared `Arc<Ledger>`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::ledger::stats::Statistics;
use crate::ledger::Ledger;
use crate::settlement::payouts::PayoutRule;
use crate::settlement::Settlement;
use crate::types::{NewParlay, Parlay, ParlayFilter, PickUpdate};

pub type AppState = Arc<Ledger>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned by any handler, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::ParlayNotFound(_) | LedgerError::PickNotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Database(_) | LedgerError::Corrupt(_) => {
                error!(error = %err, "Storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query string accepted by the list and stats endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub platform: Option<String>,
    #[serde(alias = "bet_type")]
    pub entry_type: Option<String>,
}

impl ListQuery {
    pub fn to_filter(&self) -> ApiResult<ParlayFilter> {
        Ok(ParlayFilter {
            status: parse_param(self.status.as_deref())?,
            platform: parse_param(self.platform.as_deref())?,
            entry_type: parse_param(self.entry_type.as_deref())?,
        })
    }
}

/// Blank parameters mean "no filter".
fn parse_param<T>(raw: Option<&str>) -> ApiResult<Option<T>>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e: anyhow::Error| ApiError::bad_request(e.to_string())),
    }
}

#[derive(Debug, Serialize)]
pub struct ParlayView {
    #[serde(flatten)]
    pub parlay: Parlay,
    /// Payout if every pick hits.
    pub potential_payout: Decimal,
}

impl ParlayView {
    fn new(parlay: Parlay, ledger: &Ledger) -> Self {
        let potential_payout = parlay.potential_payout(ledger.payouts());
        Self {
            parlay,
            potential_payout,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ResultsRequest {
    pub updates: Vec<PickUpdate>,
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub parlay_id: Uuid,
    #[serde(flatten)]
    pub settlement: Settlement,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/parlays
pub async fn list_parlays(
    State(ledger): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ParlayView>>> {
    let filter = query.to_filter()?;
    let parlays = ledger.list_parlays(&filter).await?;
    Ok(Json(
        parlays
            .into_iter()
            .map(|p| ParlayView::new(p, &ledger))
            .collect(),
    ))
}

/// POST /api/parlays
pub async fn create_parlay(
    State(ledger): State<AppState>,
    Json(new): Json<NewParlay>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let id = ledger.create_parlay(new).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /api/parlays/:id
pub async fn get_parlay(
    State(ledger): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ParlayView>> {
    let parlay = ledger.get_parlay(id).await?;
    Ok(Json(ParlayView::new(parlay, &ledger)))
}

/// PUT /api/parlays/:id/results
pub async fn update_results(
    State(ledger): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResultsRequest>,
) -> ApiResult<Json<SettlementResponse>> {
    let settlement = ledger.update_pick_results(id, &req.updates).await?;
    Ok(Json(SettlementResponse {
        parlay_id: id,
        settlement,
    }))
}

/// DELETE /api/parlays/:id
pub async fn delete_parlay(
    State(ledger): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ledger.delete_parlay(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/stats
pub async fn get_stats(
    State(ledger): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Statistics>> {
    let filter = query.to_filter()?;
    Ok(Json(ledger.statistics(&filter).await?))
}

/// GET /api/payouts
pub async fn get_payouts(State(ledger): State<AppState>) -> Json<Vec<PayoutRule>> {
    Json(ledger.payouts().rows().to_vec())
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
