//! CSV diagnostics.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use labinv_core::tabular::{analyze, chemical_aliases, study_aliases};
use labinv_types::import::CsvAnalysis;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::extractors::upload::CsvUpload;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Which header vocabulary to map against.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CsvKind {
    #[default]
    #[serde(alias = "chemical")]
    Chemicals,
    #[serde(alias = "study")]
    Studies,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    #[serde(default, rename = "type")]
    pub kind: CsvKind,
}

/// POST /api/csv/analyze?type=chemicals|studies - Report how an uploaded
/// file would be read without importing anything.
pub async fn analyze_csv(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<AnalyzeQuery>,
    CsvUpload(upload): CsvUpload,
) -> Result<Json<ApiResponse<CsvAnalysis>>, AppError> {
    let timer = RequestTimer::start();
    upload.validate(state.config.upload.max_csv_bytes)?;
    let analysis = match query.kind {
        CsvKind::Chemicals => analyze(&upload, chemical_aliases())?,
        CsvKind::Studies => analyze(&upload, study_aliases())?,
    };
    Ok(Json(timer.respond(analysis)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    #[test]
    fn test_analyze_query_kind() {
        let uri: Uri = "/api/csv/analyze?type=study".parse().unwrap();
        let Query(q) = Query::<AnalyzeQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(q.kind, CsvKind::Studies);

        let uri: Uri = "/api/csv/analyze".parse().unwrap();
        let Query(q) = Query::<AnalyzeQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(q.kind, CsvKind::Chemicals);
    }
}
