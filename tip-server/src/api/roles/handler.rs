//! Role API Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use shared::models::{Role, RoleCreate, RoleUpdate};

use crate::budget::BudgetError;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};

/// Role of `rid`, or RoleNotFound if it belongs elsewhere
fn role_in_restaurant(state: &ServerState, rid: i64, id: i64) -> AppResult<Role> {
    let role = state.budget.get_role(id)?;
    if role.restaurant_id != rid {
        return Err(BudgetError::NotFound(id).into());
    }
    Ok(role)
}

/// GET /api/restaurants/{rid}/roles
pub async fn list(
    State(state): State<ServerState>,
    Path(rid): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<Role>>>> {
    Ok(ok(state.budget.list_roles(rid)))
}

/// POST /api/restaurants/{rid}/roles
pub async fn create(
    State(state): State<ServerState>,
    Path(rid): Path<i64>,
    Json(payload): Json<RoleCreate>,
) -> AppResult<Json<ApiResponse<Role>>> {
    tracing::info!(
        restaurant_id = rid,
        role_name = %payload.name,
        percentage = payload.percentage,
        "Creating role"
    );
    let role = state.budget.create_role(rid, payload)?;
    Ok(ok(role))
}

/// PUT /api/restaurants/{rid}/roles/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path((rid, id)): Path<(i64, i64)>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<ApiResponse<Role>>> {
    tracing::info!(restaurant_id = rid, role_id = id, "Updating role");
    role_in_restaurant(&state, rid, id)?;
    let role = state.budget.update_role(id, payload)?;
    Ok(ok(role))
}

/// DELETE /api/restaurants/{rid}/roles/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path((rid, id)): Path<(i64, i64)>,
) -> AppResult<Json<ApiResponse<Role>>> {
    tracing::info!(restaurant_id = rid, role_id = id, "Deleting role");
    role_in_restaurant(&state, rid, id)?;
    let role = state.budget.delete_role(id)?;
    Ok(ok(role))
}

#[derive(Debug, Deserialize)]
pub struct BudgetQuery {
    /// Role being edited; its own share is not counted
    excluding: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    restaurant_id: i64,
    allocated: i32,
    role_count: usize,
    /// Percentage still available (ignoring `excluding`)
    available: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    excluding: Option<i64>,
}

/// GET /api/restaurants/{rid}/roles/budget?excluding=
pub async fn budget(
    State(state): State<ServerState>,
    Path(rid): Path<i64>,
    Query(query): Query<BudgetQuery>,
) -> AppResult<Json<ApiResponse<BudgetResponse>>> {
    let summary = state.budget.summary(rid);
    Ok(ok(BudgetResponse {
        restaurant_id: rid,
        allocated: summary.allocated,
        role_count: summary.role_count,
        available: state.budget.remaining_budget(rid, query.excluding),
        excluding: query.excluding,
    }))
}

#[derive(Debug, Serialize)]
pub struct UnassignResponse {
    role_id: i64,
    unassigned: usize,
}

/// POST /api/restaurants/{rid}/roles/{id}/unassign
///
/// First step of deleting a role that still has employees.
pub async fn unassign(
    State(state): State<ServerState>,
    Path((rid, id)): Path<(i64, i64)>,
) -> AppResult<Json<ApiResponse<UnassignResponse>>> {
    role_in_restaurant(&state, rid, id)?;
    let unassigned = state.directory.unassign_role(rid, id);
    Ok(ok(UnassignResponse {
        role_id: id,
        unassigned,
    }))
}
