use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Json,
};
use moviedex_core::backfill::BackfillReport;
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    AppState,
    infra::errors::{AppError, AppResult},
};

/// Records processed per run when the caller gives no limit.
pub const DEFAULT_BACKFILL_LIMIT: u32 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct BackfillParams {
    pub limit: Option<u32>,
}

/// Runs one poster backfill and responds once every selected record has
/// been attempted.
///
/// The run lives in its own task, so a client that disconnects early does
/// not abort it; only the server shutdown token stops a run in progress.
pub async fn backfill_posters_handler(
    State(state): State<AppState>,
    params: Result<Query<BackfillParams>, QueryRejection>,
) -> AppResult<Json<BackfillReport>> {
    let Query(params) = params
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let limit = params.limit.unwrap_or(DEFAULT_BACKFILL_LIMIT);

    let Some(backfill) = state.backfill.clone() else {
        return Err(AppError::service_unavailable(
            "Poster lookups are disabled: OMDB_API_KEY is not configured",
        ));
    };

    info!(limit, "poster backfill requested");
    let cancel = state.shutdown.child_token();
    let run = tokio::spawn(async move {
        backfill.run_until_cancelled(limit, cancel).await
    });
    let report = run.await.map_err(|err| {
        error!(error = %err, "poster backfill task failed");
        AppError::internal("Poster backfill failed")
    })??;
    Ok(Json(report))
}
