//! Study register handlers.
//!
//! Creates, updates and imports are stamped with the caller's username
//! as `created_by`/`updated_by`.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Serialize;

use labinv_types::import::ImportReport;
use labinv_types::page::Page;
use labinv_types::study::{Study, StudyId, StudyInput, StudyStats};

use crate::http::error::AppError;
use crate::http::extractors::auth::{AuthUser, RequireAdmin};
use crate::http::extractors::query::{StudyListQuery, StudySearchQuery};
use crate::http::extractors::upload::CsvUpload;
use crate::http::handlers::parse_id;
use crate::http::response::{ApiResponse, FileDownload, RequestTimer};
use crate::state::AppState;

const BASE: &str = "/api/studies";

fn self_link(id: StudyId) -> String {
    format!("{BASE}/{id}")
}

/// Result of a bulk delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedStudies {
    pub deleted: u64,
    pub message: String,
}

/// GET /api/studies - All studies, optionally narrowed by one criterion.
pub async fn list_studies(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<StudyListQuery>,
) -> Result<Json<ApiResponse<Vec<Study>>>, AppError> {
    let timer = RequestTimer::start();
    let studies = state.study_service.list(query.into()).await?;
    Ok(Json(timer.respond(studies).with_link("self", BASE)))
}

/// GET /api/studies/count - Totals by status and risk level.
pub async fn study_stats(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<StudyStats>>, AppError> {
    let timer = RequestTimer::start();
    let stats = state.study_service.stats().await?;
    Ok(Json(timer.respond(stats)))
}

/// GET /api/studies/search?filter= - Paged study code search.
pub async fn search_studies(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<StudySearchQuery>,
) -> Result<Json<ApiResponse<Page<Study>>>, AppError> {
    let timer = RequestTimer::start();
    let (code, page) = query.into_parts();
    let result = state.study_service.search(code, page).await?;
    Ok(Json(timer.respond(result)))
}

/// GET /api/studies/{id}
pub async fn get_study(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Study>>, AppError> {
    let timer = RequestTimer::start();
    let study = state.study_service.get(parse_id(&id)?).await?;
    let link = self_link(study.id);
    Ok(Json(timer.respond(study).with_link("self", &link)))
}

/// POST /api/studies
pub async fn create_study(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<StudyInput>,
) -> Result<(StatusCode, Json<ApiResponse<Study>>), AppError> {
    let timer = RequestTimer::start();
    let study = state.study_service.create(body, &user.username).await?;
    let link = self_link(study.id);
    Ok((
        StatusCode::CREATED,
        Json(timer.respond(study).with_link("self", &link)),
    ))
}

/// PUT /api/studies/{id}
pub async fn update_study(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<StudyInput>,
) -> Result<Json<ApiResponse<Study>>, AppError> {
    let timer = RequestTimer::start();
    let study = state
        .study_service
        .update(parse_id(&id)?, body, &user.username)
        .await?;
    let link = self_link(study.id);
    Ok(Json(timer.respond(study).with_link("self", &link)))
}

/// DELETE /api/studies/{id} - Administrators only.
pub async fn delete_study(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let timer = RequestTimer::start();
    let id: StudyId = parse_id(&id)?;
    state.study_service.delete(id).await?;
    tracing::info!(%id, by = %admin.username, "study deleted");
    Ok(Json(timer.respond(serde_json::json!({
        "message": format!("Study {id} deleted"),
        "id": id,
    }))))
}

/// DELETE /api/studies/by-code/{code} - Administrators only.
pub async fn delete_study_by_code(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Study>>, AppError> {
    let timer = RequestTimer::start();
    let removed = state.study_service.delete_by_code(&code).await?;
    tracing::info!(id = %removed.id, by = %admin.username, "study deleted by code");
    Ok(Json(timer.respond(removed)))
}

/// DELETE /api/studies/clear-all - Remove every study. Administrators only.
pub async fn clear_all_studies(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<ApiResponse<ClearedStudies>>, AppError> {
    let timer = RequestTimer::start();
    let deleted = state.study_service.clear_all().await?;
    tracing::warn!(deleted, by = %admin.username, "all studies cleared");
    Ok(Json(timer.respond(ClearedStudies {
        deleted,
        message: format!("Deleted {deleted} studies"),
    })))
}

/// POST /api/studies/import-csv and /api/studies/upload-csv
pub async fn import_csv(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    CsvUpload(upload): CsvUpload,
) -> Result<Json<ApiResponse<ImportReport>>, AppError> {
    let timer = RequestTimer::start();
    let report = state
        .study_service
        .import_csv(&upload, state.config.upload.max_csv_bytes, &user.username)
        .await?;
    Ok(Json(timer.respond(report).with_link("studies", BASE)))
}

/// GET /api/studies/export-csv
pub async fn export_csv(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<FileDownload, AppError> {
    let download = state.study_service.export_csv().await?;
    Ok(FileDownload::csv(download.file_name, download.bytes))
}

/// POST /api/studies/{id}/generate-qr (also `regenerate-qr`)
pub async fn generate_qr(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Study>>, AppError> {
    let timer = RequestTimer::start();
    let study = state.study_service.generate_qr(parse_id(&id)?).await?;
    let link = self_link(study.id);
    let qr_image = format!("{link}/qr-image");
    let qr_url = study.qr_code.as_deref().map(|c| state.study_service.qr_url(c));
    let mut resp = timer
        .respond(study)
        .with_link("self", &link)
        .with_link("qr_image", &qr_image);
    if let Some(url) = qr_url {
        resp = resp.with_link("qr", &url);
    }
    Ok(Json(resp))
}

/// GET /api/studies/{id}/qr-image
pub async fn qr_image(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<FileDownload, AppError> {
    let png = state.study_service.qr_image(parse_id(&id)?).await?;
    Ok(FileDownload::png(png))
}

/// DELETE /api/studies/{id}/qr - Drop the study's QR code. Administrators only.
pub async fn delete_qr(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Study>>, AppError> {
    let timer = RequestTimer::start();
    let study = state.study_service.delete_qr(parse_id(&id)?).await?;
    let link = self_link(study.id);
    Ok(Json(timer.respond(study).with_link("self", &link)))
}

/// GET /api/studies/qr/{code}
pub async fn get_by_qr_code(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Study>>, AppError> {
    let timer = RequestTimer::start();
    let study = state.study_service.get_by_qr_code(&code).await?;
    let link = self_link(study.id);
    Ok(Json(timer.respond(study).with_link("self", &link)))
}
