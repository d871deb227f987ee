//! Statistics API Handlers
//!
//! Query parameters shared by both endpoints:
//!
//! | Param | Example | Default |
//! |-------|---------|---------|
//! | dimension | time / table / waiter | time |
//! | window | last_week / last_month / last_year | last_week |
//! | waiterIds | 1,2,3 | all |
//! | table | 12 | all |
//! | startDate / endDate | 2024-03-01 (inclusive days) | none |
//! | page / perPage | 2 / 20 | no paging |

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shared::models::{ComparisonSnapshot, Dimension, StatisticsQuery, StatisticsSnapshot, TimeWindow};

use crate::core::ServerState;
use crate::utils::time::{day_end_millis, day_start_millis, parse_date};
use crate::utils::{ApiResponse, AppError, AppResult, ok};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsParams {
    dimension: Option<Dimension>,
    window: Option<TimeWindow>,
    waiter_ids: Option<String>,
    table: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    page: Option<u32>,
    per_page: Option<u32>,
    /// Compare only
    main: Option<i64>,
    /// Compare only
    comparison: Option<i64>,
}

/// Parse `1,2,3` into waiter ids (blank = all)
pub fn parse_waiter_ids(raw: Option<&str>) -> AppResult<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::validation(format!("Invalid waiter id: {}", s)))
        })
        .collect()
}

fn to_query(state: &ServerState, params: &StatisticsParams) -> AppResult<StatisticsQuery> {
    let tz = state.config.tz();
    let start = params
        .start_date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .map(|d| day_start_millis(d, tz));
    let end = params
        .end_date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .map(|d| day_end_millis(d, tz));

    let mut query = StatisticsQuery::new(
        params.dimension.unwrap_or(Dimension::Time),
        params.window.unwrap_or(TimeWindow::LastWeek),
    )
    .with_waiters(parse_waiter_ids(params.waiter_ids.as_deref())?)
    .with_range(start, end);
    if let Some(table) = params.table.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        query = query.with_table(table);
    }
    query.page = params.page;
    query.per_page = params.per_page;
    Ok(query)
}

/// GET /api/restaurants/{rid}/statistics
pub async fn snapshot(
    State(state): State<ServerState>,
    Path(rid): Path<i64>,
    Query(params): Query<StatisticsParams>,
) -> AppResult<Json<ApiResponse<StatisticsSnapshot>>> {
    let query = to_query(&state, &params)?;
    tracing::info!(
        restaurant_id = rid,
        dimension = ?query.dimension,
        window = ?query.window,
        "Fetching statistics"
    );
    let snapshot = state.statistics.get_snapshot(rid, &query)?;
    Ok(ok(snapshot))
}

/// GET /api/statistics/compare?main=&comparison=
pub async fn compare(
    State(state): State<ServerState>,
    Query(params): Query<StatisticsParams>,
) -> AppResult<Json<ApiResponse<ComparisonSnapshot>>> {
    let (Some(main), Some(comparison)) = (params.main, params.comparison) else {
        return Err(AppError::with_message(
            shared::error::ErrorCode::RequiredField,
            "both main and comparison are required",
        ));
    };
    let query = to_query(&state, &params)?;
    tracing::info!(
        main_restaurant_id = main,
        comparison_restaurant_id = comparison,
        dimension = ?query.dimension,
        window = ?query.window,
        "Fetching statistics comparison"
    );
    let snapshots = state.statistics.get_comparison(main, comparison, &query)?;
    Ok(ok(snapshots))
}
