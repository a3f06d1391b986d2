//! Admin Handlers
//!
//! `POST /admin/sweep?limit=N` runs one backlog sweep on demand.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::application::dto::SweepReport;
use crate::shared::error::AppError;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct SweepQuery {
    /// Per-kind batch size; the configured one when absent.
    pub limit: Option<i64>,
}

pub async fn run_sweep(
    State(state): State<AppState>,
    Query(query): Query<SweepQuery>,
) -> Result<Json<SweepReport>, AppError> {
    let limit = query.limit.unwrap_or(state.settings.sweep.batch_size);
    if limit < 1 {
        return Err(AppError::Validation(
            "limit: must be at least 1".to_string(),
        ));
    }

    tracing::info!(limit, "Manual backlog sweep requested");
    let report = state.sync.sweep(limit).await?;
    Ok(Json(report))
}
