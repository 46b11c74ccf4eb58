//! Public pages behind scanned QR codes. No authentication.

use axum::Json;
use axum::extract::{Path, State};

use labinv_types::chemical::Chemical;
use labinv_types::study::Study;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// GET /qr/{code} - Chemical detail for a scanned label.
pub async fn chemical_detail(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Chemical>>, AppError> {
    let timer = RequestTimer::start();
    let chemical = state.chemical_service.get_by_qr_code(&code).await?;
    tracing::debug!(id = %chemical.id, "chemical qr scanned");
    Ok(Json(timer.respond(chemical)))
}

/// GET /study-qr/{code} - Study detail for a scanned label.
pub async fn study_detail(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Study>>, AppError> {
    let timer = RequestTimer::start();
    let study = state.study_service.get_by_qr_code(&code).await?;
    tracing::debug!(id = %study.id, "study qr scanned");
    Ok(Json(timer.respond(study)))
}
