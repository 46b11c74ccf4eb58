//! Chemical inventory handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use labinv_types::chemical::{Chemical, ChemicalId, ChemicalInput};
use labinv_types::import::ImportReport;
use labinv_types::page::Page;

use crate::http::error::AppError;
use crate::http::extractors::auth::{AuthUser, RequireAdmin};
use crate::http::extractors::query::{CasQuery, ChemicalFilterQuery, NameQuery, PageQuery};
use crate::http::extractors::upload::CsvUpload;
use crate::http::handlers::parse_id;
use crate::http::response::{ApiResponse, FileDownload, RequestTimer};
use crate::state::AppState;

const BASE: &str = "/api/chemicals";

fn self_link(id: ChemicalId) -> String {
    format!("{BASE}/{id}")
}

/// GET /api/chemicals - Every chemical, ordered by name.
pub async fn list_chemicals(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<Chemical>>>, AppError> {
    let timer = RequestTimer::start();
    let chemicals = state.chemical_service.list_all().await?;
    Ok(Json(timer.respond(chemicals).with_link("self", BASE)))
}

/// GET /api/chemicals/{id}
pub async fn get_chemical(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Chemical>>, AppError> {
    let timer = RequestTimer::start();
    let chemical = state.chemical_service.get(parse_id(&id)?).await?;
    let link = self_link(chemical.id);
    Ok(Json(timer.respond(chemical).with_link("self", &link)))
}

/// GET /api/chemicals/search?name= - Exact, case-insensitive name lookup.
pub async fn search_by_name(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<NameQuery>,
) -> Result<Json<ApiResponse<Chemical>>, AppError> {
    let timer = RequestTimer::start();
    let chemical = state.chemical_service.find_by_name(&query.name).await?;
    let link = self_link(chemical.id);
    Ok(Json(timer.respond(chemical).with_link("self", &link)))
}

/// GET /api/chemicals/search-cas?casNo= - All chemicals sharing a CAS number.
pub async fn search_by_cas(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<CasQuery>,
) -> Result<Json<ApiResponse<Vec<Chemical>>>, AppError> {
    let timer = RequestTimer::start();
    let chemicals = state.chemical_service.find_by_cas_no(&query.cas_no).await?;
    Ok(Json(timer.respond(chemicals)))
}

/// GET /api/chemicals/filter - Substring filters with paging.
pub async fn filter_chemicals(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ChemicalFilterQuery>,
) -> Result<Json<ApiResponse<Page<Chemical>>>, AppError> {
    let timer = RequestTimer::start();
    let (filter, page) = query.into_parts();
    let result = state.chemical_service.filter(filter, page).await?;
    Ok(Json(timer.respond(result)))
}

/// GET /api/chemicals/toxic - Chemicals flagged toxic, paged.
pub async fn toxic_chemicals(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<Chemical>>>, AppError> {
    let timer = RequestTimer::start();
    let result = state.chemical_service.toxic(query.page_request()).await?;
    Ok(Json(timer.respond(result)))
}

/// POST /api/chemicals - Create a chemical and issue its QR code.
pub async fn create_chemical(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(body): Json<ChemicalInput>,
) -> Result<(StatusCode, Json<ApiResponse<Chemical>>), AppError> {
    let timer = RequestTimer::start();
    let chemical = state.chemical_service.create(body).await?;
    let link = self_link(chemical.id);
    let qr_image = format!("{link}/qr-image");
    Ok((
        StatusCode::CREATED,
        Json(
            timer
                .respond(chemical)
                .with_link("self", &link)
                .with_link("qr_image", &qr_image),
        ),
    ))
}

/// PUT /api/chemicals/{id}
pub async fn update_chemical(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ChemicalInput>,
) -> Result<Json<ApiResponse<Chemical>>, AppError> {
    let timer = RequestTimer::start();
    let chemical = state.chemical_service.update(parse_id(&id)?, body).await?;
    let link = self_link(chemical.id);
    Ok(Json(timer.respond(chemical).with_link("self", &link)))
}

/// PUT /api/chemicals - Update the chemical whose name matches the body.
pub async fn update_chemical_by_name(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(body): Json<ChemicalInput>,
) -> Result<Json<ApiResponse<Chemical>>, AppError> {
    let timer = RequestTimer::start();
    let chemical = state.chemical_service.update_by_name(body).await?;
    let link = self_link(chemical.id);
    Ok(Json(timer.respond(chemical).with_link("self", &link)))
}

/// DELETE /api/chemicals/{id} - Administrators only.
pub async fn delete_chemical(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let timer = RequestTimer::start();
    let id: ChemicalId = parse_id(&id)?;
    state.chemical_service.delete(id).await?;
    tracing::info!(%id, by = %admin.username, "chemical deleted");
    Ok(Json(timer.respond(serde_json::json!({
        "message": format!("Chemical {id} deleted"),
        "id": id,
    }))))
}

/// DELETE /api/chemicals/name/{name} - Administrators only.
pub async fn delete_chemical_by_name(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<Chemical>>, AppError> {
    let timer = RequestTimer::start();
    let removed = state.chemical_service.delete_by_name(&name).await?;
    tracing::info!(id = %removed.id, by = %admin.username, "chemical deleted by name");
    Ok(Json(timer.respond(removed)))
}

/// POST /api/chemicals/upload-csv - Multipart import, field `file`.
pub async fn upload_csv(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    CsvUpload(upload): CsvUpload,
) -> Result<Json<ApiResponse<ImportReport>>, AppError> {
    let timer = RequestTimer::start();
    tracing::debug!(file = %upload.file_name, by = %user.username, "chemical csv upload");
    let report = state
        .chemical_service
        .import_csv(&upload, state.config.upload.max_csv_bytes)
        .await?;
    Ok(Json(timer.respond(report).with_link("chemicals", BASE)))
}

/// GET /api/chemicals/export-csv
pub async fn export_csv(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<FileDownload, AppError> {
    let download = state.chemical_service.export_csv().await?;
    Ok(FileDownload::csv(download.file_name, download.bytes))
}

/// POST /api/chemicals/{id}/generate-qr - Issue a fresh QR code.
///
/// Also mounted as `regenerate-qr`; both replace any existing code.
pub async fn generate_qr(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Chemical>>, AppError> {
    let timer = RequestTimer::start();
    let chemical = state.chemical_service.generate_qr(parse_id(&id)?).await?;
    let link = self_link(chemical.id);
    let qr_image = format!("{link}/qr-image");
    let qr_url = chemical
        .qr_code
        .as_deref()
        .map(|c| state.chemical_service.qr_url(c));
    let mut resp = timer
        .respond(chemical)
        .with_link("self", &link)
        .with_link("qr_image", &qr_image);
    if let Some(url) = qr_url {
        resp = resp.with_link("qr", &url);
    }
    Ok(Json(resp))
}

/// GET /api/chemicals/{id}/qr-image - PNG, generated on first request.
pub async fn qr_image(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<FileDownload, AppError> {
    let png = state.chemical_service.qr_image(parse_id(&id)?).await?;
    Ok(FileDownload::png(png))
}

/// GET /api/chemicals/qr/{code} - Resolve a scanned QR code.
pub async fn get_by_qr_code(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Chemical>>, AppError> {
    let timer = RequestTimer::start();
    let chemical = state.chemical_service.get_by_qr_code(&code).await?;
    let link = self_link(chemical.id);
    Ok(Json(timer.respond(chemical).with_link("self", &link)))
}
