//! Employee API Handlers

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use shared::models::{Employee, EmployeeCreate};

use crate::core::ServerState;
use crate::directory::{DirectoryError, EmployeeDirectory};
use crate::utils::{ApiResponse, AppResult, ok};

fn employee_in_restaurant(state: &ServerState, rid: i64, id: i64) -> AppResult<Employee> {
    match state.directory.get(id) {
        Some(e) if e.restaurant_id == rid => Ok(e),
        _ => Err(DirectoryError::NotFound(id).into()),
    }
}

/// GET /api/restaurants/{rid}/employees
pub async fn list(
    State(state): State<ServerState>,
    Path(rid): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<Employee>>>> {
    Ok(ok(state.directory.list(rid)))
}

/// POST /api/restaurants/{rid}/employees
pub async fn create(
    State(state): State<ServerState>,
    Path(rid): Path<i64>,
    Json(payload): Json<EmployeeCreate>,
) -> AppResult<Json<ApiResponse<Employee>>> {
    tracing::info!(restaurant_id = rid, name = %payload.name, "Registering employee");
    let employee = state.budget.register_employee(rid, payload)?;
    Ok(ok(employee))
}

#[derive(Debug, Deserialize)]
pub struct AssignRole {
    /// `null` moves the employee to "No role"
    role_id: Option<i64>,
}

/// PUT /api/restaurants/{rid}/employees/{id}/role
pub async fn assign_role(
    State(state): State<ServerState>,
    Path((rid, id)): Path<(i64, i64)>,
    Json(payload): Json<AssignRole>,
) -> AppResult<Json<ApiResponse<Employee>>> {
    let employee = state.budget.assign_employee_role(rid, id, payload.role_id)?;
    Ok(ok(employee))
}

/// POST /api/restaurants/{rid}/employees/{id}/payment-link
pub async fn link_payment_account(
    State(state): State<ServerState>,
    Path((rid, id)): Path<(i64, i64)>,
) -> AppResult<Json<ApiResponse<Employee>>> {
    employee_in_restaurant(&state, rid, id)?;
    let employee = state.directory.link_payment_account(id)?;
    Ok(ok(employee))
}
