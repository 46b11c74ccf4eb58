//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use labinv_types::error::{
    AuthError, ChemicalError, CsvImportError, QrError, StudyError, UserError,
};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Chemical(ChemicalError),
    Study(StudyError),
    User(UserError),
    Auth(AuthError),
    Csv(CsvImportError),
    /// Malformed request (bad multipart body, unparsable path id).
    Validation(String),
}

impl From<ChemicalError> for AppError {
    fn from(e: ChemicalError) -> Self {
        AppError::Chemical(e)
    }
}

impl From<StudyError> for AppError {
    fn from(e: StudyError) -> Self {
        AppError::Study(e)
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<CsvImportError> for AppError {
    fn from(e: CsvImportError) -> Self {
        AppError::Csv(e)
    }
}

fn qr_parts(e: &QrError) -> (StatusCode, &'static str) {
    match e {
        QrError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "QR_ERROR"),
    }
}

impl AppError {
    /// Status and machine-readable code for this error.
    pub fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Chemical(e) => match e {
                ChemicalError::NotFound => (StatusCode::NOT_FOUND, "CHEMICAL_NOT_FOUND"),
                ChemicalError::DuplicateName(_) => (StatusCode::CONFLICT, "CONFLICT"),
                ChemicalError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                ChemicalError::Qr(qr) => qr_parts(qr),
                ChemicalError::StorageError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CHEMICAL_ERROR")
                }
            },
            AppError::Study(e) => match e {
                StudyError::NotFound => (StatusCode::NOT_FOUND, "STUDY_NOT_FOUND"),
                StudyError::DuplicateCode(_) => (StatusCode::CONFLICT, "CONFLICT"),
                StudyError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                StudyError::Qr(qr) => qr_parts(qr),
                StudyError::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STUDY_ERROR"),
            },
            AppError::User(e) => match e {
                UserError::NotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
                UserError::UsernameTaken(_) => (StatusCode::CONFLICT, "CONFLICT"),
                UserError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                UserError::Protected(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                UserError::Hashing(_) | UserError::StorageError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "USER_ERROR")
                }
            },
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidToken(_)
                | AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                AuthError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                AuthError::Signing(_) | AuthError::Backend(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_ERROR")
                }
            },
            AppError::Csv(e) => match e {
                CsvImportError::Write(_) | CsvImportError::StorageError(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CSV_ERROR")
                }
                _ => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            },
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Chemical(e) => e.to_string(),
            AppError::Study(e) => e.to_string(),
            AppError::User(e) => e.to_string(),
            AppError::Auth(e) => e.to_string(),
            AppError::Csv(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        } else {
            tracing::debug!(code, status = status.as_u16(), %message, "request rejected");
        }

        let body = ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string());
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (ChemicalError::NotFound.into(), StatusCode::NOT_FOUND),
            (ChemicalError::DuplicateName("x".into()).into(), StatusCode::CONFLICT),
            (StudyError::Validation("bad".into()).into(), StatusCode::BAD_REQUEST),
            (UserError::Protected("admin".into()).into(), StatusCode::FORBIDDEN),
            (AuthError::TokenExpired.into(), StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden("admin only".into()).into(), StatusCode::FORBIDDEN),
            (CsvImportError::NotCsv("a.txt".into()).into(), StatusCode::BAD_REQUEST),
            (
                CsvImportError::NoValidRecords("chemical".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                StudyError::Qr(QrError::Render("boom".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ChemicalError::Qr(QrError::Render("boom".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.parts().0, expected, "{err:?}");
        }
    }

    #[tokio::test]
    async fn test_error_envelope_body() {
        let response = AppError::from(AuthError::InvalidCredentials).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["data"].is_null());
        assert_eq!(body["errors"][0]["code"], "UNAUTHORIZED");
        assert_eq!(body["errors"][0]["message"], "Invalid username or password");
    }
}
