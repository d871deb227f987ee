//! Payment API Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shared::models::{Payment, PaymentCreate, PaymentStatus, TransferDetails};

use crate::aggregation::sort_newest_first;
use crate::api::statistics::parse_waiter_ids;
use crate::core::ServerState;
use crate::ledger::PaymentFilter;
use crate::utils::time::{day_end_millis, day_start_millis, parse_date};
use crate::utils::{ApiResponse, AppResult, ok};

/// POST /api/restaurants/{rid}/payments
pub async fn append(
    State(state): State<ServerState>,
    Path(rid): Path<i64>,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let payment = state.ledger.append(rid, payload)?;
    Ok(ok(payment))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListQuery {
    /// YYYY-MM-DD (inclusive)
    start_date: Option<String>,
    /// YYYY-MM-DD (inclusive)
    end_date: Option<String>,
    /// Comma separated
    waiter_ids: Option<String>,
    table: Option<String>,
}

/// GET /api/restaurants/{rid}/payments
///
/// Newest first.
pub async fn list(
    State(state): State<ServerState>,
    Path(rid): Path<i64>,
    Query(query): Query<PaymentListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Payment>>>> {
    let tz = state.config.tz();
    let start = query
        .start_date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .map(|d| day_start_millis(d, tz));
    let end = query
        .end_date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .map(|d| day_end_millis(d, tz));

    let filter = PaymentFilter {
        restaurant_id: rid,
        start,
        end,
        waiter_ids: parse_waiter_ids(query.waiter_ids.as_deref())?,
        table: query.table,
    };
    let mut payments = state.ledger.find(filter).to_vec();
    sort_newest_first(&mut payments);
    Ok(ok(payments))
}

/// GET /api/payments/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    Ok(ok(state.ledger.get(id)?))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: PaymentStatus,
}

/// PUT /api/payments/{id}/status
pub async fn set_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    tracing::info!(payment_id = id, status = %payload.status, "Setting payment status");
    let payment = state.ledger.set_status(id, payload.status)?;
    Ok(ok(payment))
}

/// PUT /api/payments/{id}/transfer-details
pub async fn attach_transfer_details(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TransferDetails>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let payment = state.ledger.attach_transfer_details(id, payload)?;
    Ok(ok(payment))
}

#[derive(Debug, Deserialize)]
pub struct ValidateTransfer {
    operation_number: String,
}

/// POST /api/payments/{id}/validate
pub async fn validate(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ValidateTransfer>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    tracing::info!(payment_id = id, "Validating transfer");
    let payment = state.transfers.validate(id, &payload.operation_number).await?;
    Ok(ok(payment))
}
