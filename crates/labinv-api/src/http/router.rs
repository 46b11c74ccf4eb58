//! Axum router configuration with middleware.
//!
//! JSON routes live under `/api/`. `/health` and the QR detail pages
//! (`/qr/{code}`, `/study-qr/{code}`) are public.
//! Middleware: CORS, tracing, request body limit sized for CSV uploads.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Headroom on top of the CSV size limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.upload.max_csv_bytes + MULTIPART_OVERHEAD;

    let api_routes = Router::new()
        // Auth
        .route("/login", post(handlers::auth::login))
        .route("/register", post(handlers::auth::register))
        .route("/logout", post(handlers::auth::logout))
        .route("/profile", get(handlers::auth::profile))
        .route("/permissions", get(handlers::auth::permissions))
        // Chemicals
        .route(
            "/chemicals",
            get(handlers::chemical::list_chemicals)
                .post(handlers::chemical::create_chemical)
                .put(handlers::chemical::update_chemical_by_name),
        )
        .route("/chemicals/search", get(handlers::chemical::search_by_name))
        .route("/chemicals/search-cas", get(handlers::chemical::search_by_cas))
        .route("/chemicals/filter", get(handlers::chemical::filter_chemicals))
        .route("/chemicals/toxic", get(handlers::chemical::toxic_chemicals))
        .route("/chemicals/upload-csv", post(handlers::chemical::upload_csv))
        .route("/chemicals/export-csv", get(handlers::chemical::export_csv))
        .route(
            "/chemicals/name/{name}",
            delete(handlers::chemical::delete_chemical_by_name),
        )
        .route("/chemicals/qr/{code}", get(handlers::chemical::get_by_qr_code))
        .route(
            "/chemicals/{id}",
            get(handlers::chemical::get_chemical)
                .put(handlers::chemical::update_chemical)
                .delete(handlers::chemical::delete_chemical),
        )
        .route("/chemicals/{id}/generate-qr", post(handlers::chemical::generate_qr))
        .route("/chemicals/{id}/regenerate-qr", post(handlers::chemical::generate_qr))
        .route("/chemicals/{id}/qr-image", get(handlers::chemical::qr_image))
        // Studies
        .route(
            "/studies",
            get(handlers::study::list_studies).post(handlers::study::create_study),
        )
        .route("/studies/count", get(handlers::study::study_stats))
        .route("/studies/search", get(handlers::study::search_studies))
        .route("/studies/permissions", get(handlers::auth::permissions))
        .route("/studies/clear-all", delete(handlers::study::clear_all_studies))
        .route("/studies/import-csv", post(handlers::study::import_csv))
        .route("/studies/upload-csv", post(handlers::study::import_csv))
        .route("/studies/export-csv", get(handlers::study::export_csv))
        .route(
            "/studies/by-code/{code}",
            delete(handlers::study::delete_study_by_code),
        )
        .route("/studies/qr/{code}", get(handlers::study::get_by_qr_code))
        .route(
            "/studies/{id}",
            get(handlers::study::get_study)
                .put(handlers::study::update_study)
                .delete(handlers::study::delete_study),
        )
        .route("/studies/{id}/generate-qr", post(handlers::study::generate_qr))
        .route("/studies/{id}/regenerate-qr", post(handlers::study::generate_qr))
        .route("/studies/{id}/qr-image", get(handlers::study::qr_image))
        .route("/studies/{id}/qr", delete(handlers::study::delete_qr))
        // CSV diagnostics
        .route("/csv/analyze", post(handlers::csv::analyze_csv))
        // Administration
        .route(
            "/admin/users",
            get(handlers::admin::list_users).post(handlers::admin::create_user),
        )
        .route(
            "/admin/users/{id}",
            get(handlers::admin::get_user)
                .put(handlers::admin::update_user)
                .delete(handlers::admin::delete_user),
        )
        .route(
            "/admin/users/{id}/reset-password",
            post(handlers::admin::reset_password),
        )
        .route("/admin/stats", get(handlers::admin::stats));

    Router::new()
        .route("/health", get(health_check))
        .route("/qr/{code}", get(handlers::qr::chemical_detail))
        .route("/study-qr/{code}", get(handlers::qr::study_detail))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use labinv_types::config::AppConfig;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const ADMIN_PASSWORD: &str = "admin-secret";
    const BOUNDARY: &str = "labinv-test-boundary";

    struct TestApp {
        router: Router,
        _dir: tempfile::TempDir,
    }

    async fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("router-test-secret-0123456789abcdef".to_string());
        let state = AppState::with_config(dir.path().to_path_buf(), config)
            .await
            .unwrap();
        state
            .user_service
            .ensure_admin(Some(ADMIN_PASSWORD))
            .await
            .unwrap();
        TestApp {
            router: build_router(state),
            _dir: dir,
        }
    }

    impl TestApp {
        async fn call(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            (status, bytes.to_vec())
        }

        async fn json(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let req = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let (status, bytes) = self.call(req).await;
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn login(&self, username: &str, password: &str) -> String {
            let (status, body) = self
                .json(
                    "POST",
                    "/api/login",
                    None,
                    Some(json!({ "username": username, "password": password })),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "login failed: {body}");
            body["data"]["token"].as_str().unwrap().to_string()
        }

        async fn user_token(&self) -> String {
            let (status, _) = self
                .json(
                    "POST",
                    "/api/register",
                    None,
                    Some(json!({ "username": "jo", "password": "secret1" })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            self.login("jo", "secret1").await
        }

        async fn upload(&self, uri: &str, token: &str, file_name: &str, csv: &str) -> (StatusCode, Value) {
            let body = format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                 Content-Type: text/csv\r\n\r\n\
                 {csv}\r\n\
                 --{BOUNDARY}--\r\n"
            );
            let req = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap();
            let (status, bytes) = self.call(req).await;
            (status, serde_json::from_slice(&bytes).unwrap())
        }
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = test_app().await;
        let (status, body) = app.json("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_token() {
        let app = test_app().await;
        let (status, body) = app.json("GET", "/api/chemicals", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["code"], "UNAUTHORIZED");

        let (status, _) = app
            .json("GET", "/api/chemicals", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let app = test_app().await;
        let (status, _) = app
            .json(
                "POST",
                "/api/login",
                None,
                Some(json!({ "username": "admin", "password": "nope" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_profile_and_permissions() {
        let app = test_app().await;
        let token = app.user_token().await;

        let (status, body) = app.json("GET", "/api/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "jo");
        assert_eq!(body["data"]["authority"], "ROLE_USER");
        assert!(body["data"].get("passwordHash").is_none());

        let (_, body) = app.json("GET", "/api/permissions", Some(&token), None).await;
        assert_eq!(body["data"]["isAdmin"], false);
        assert_eq!(body["data"]["permissions"]["canDelete"], false);
    }

    #[tokio::test]
    async fn test_chemical_crud_and_admin_only_delete() {
        let app = test_app().await;
        let user = app.user_token().await;
        let admin = app.login("admin", ADMIN_PASSWORD).await;

        let (status, body) = app
            .json(
                "POST",
                "/api/chemicals",
                Some(&user),
                Some(json!({ "name": "Ethanol", "storage": "Cabinet A", "casNo": "64-17-5", "toxicState": true })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["data"]["id"].as_i64().unwrap();
        assert!(body["data"]["qrCode"].is_string());
        assert_eq!(body["_links"]["self"], format!("/api/chemicals/{id}"));

        let (status, _) = app
            .json(
                "POST",
                "/api/chemicals",
                Some(&user),
                Some(json!({ "name": "ETHANOL", "storage": "Shelf" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = app
            .json("GET", "/api/chemicals/search?name=ethanol", Some(&user), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id);

        let (_, body) = app.json("GET", "/api/chemicals/toxic", Some(&user), None).await;
        assert_eq!(body["data"]["total_elements"], 1);

        let (status, body) = app
            .json(
                "PUT",
                &format!("/api/chemicals/{id}"),
                Some(&user),
                Some(json!({ "name": "Ethanol", "storage": "Cabinet B" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["storage"], "Cabinet B");

        let uri = format!("/api/chemicals/{id}");
        let (status, _) = app.json("DELETE", &uri, Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.json("DELETE", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = app.json("GET", &uri, Some(&user), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], "CHEMICAL_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_bad_path_id_is_a_validation_error() {
        let app = test_app().await;
        let token = app.user_token().await;
        let (status, body) = app
            .json("GET", "/api/chemicals/abc", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_chemical_csv_upload_and_export() {
        let app = test_app().await;
        let token = app.user_token().await;
        let csv = "Chemical Name;CAS No.;Storage Location\n\
                   Ethanol;64-17-5;Cabinet A\n\
                   Acetone;67-64-1;Shelf 2\n\
                   ethanol;64-17-5;Cabinet A\n";
        let (status, body) = app
            .upload("/api/chemicals/upload-csv", &token, "stock.csv", csv)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["imported"], 2);
        assert_eq!(body["data"]["skipped_duplicates"], 1);

        let (status, _) = app
            .upload("/api/chemicals/upload-csv", &token, "stock.txt", csv)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let req = Request::builder()
            .uri("/api/chemicals/export-csv")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            resp.headers()[header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap()
                .starts_with("attachment")
        );
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("name,CASNo"));
        assert!(text.contains("Acetone"));
    }

    #[tokio::test]
    async fn test_chemical_reupload_skips_existing_names() {
        let app = test_app().await;
        let token = app.user_token().await;
        let csv = "name,storage\nÄthanol,Cabinet A\nAcetone,Shelf 2\n";
        let (status, body) = app
            .upload("/api/chemicals/upload-csv", &token, "stock.csv", csv)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["imported"], 2);

        let again = "name,storage\näTHANOL,Cabinet B\nACETONE,Shelf 3\nToluene,Shelf 4\n";
        let (status, body) = app
            .upload("/api/chemicals/upload-csv", &token, "stock.csv", again)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let report = &body["data"];
        assert_eq!(report["total_rows"], 3);
        assert_eq!(report["imported"], 1);
        assert_eq!(report["skipped_existing"], 2);
        assert_eq!(report["issues"][0]["line"], 2);
        assert_eq!(report["issues"][0]["reason"], "chemical 'äTHANOL' already exists");
        assert!(report["message"].as_str().unwrap().contains("2 already existing"));

        let (_, body) = app.json("GET", "/api/chemicals", Some(&token), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_study_csv_import_twice() {
        let app = test_app().await;
        let token = app.user_token().await;
        let csv = "Study Code;Status;Risk Level\n\
                   ST-001;Pending;High\n\
                   ST-002;Completed;Low\n";
        let (status, body) = app
            .upload("/api/studies/import-csv", &token, "studies.csv", csv)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["imported"], 2);
        assert_eq!(body["data"]["skipped_existing"], 0);

        let (_, body) = app.json("GET", "/api/studies/count", Some(&token), None).await;
        assert_eq!(body["data"]["total"], 2);

        let (status, body) = app
            .upload("/api/studies/import-csv", &token, "studies.csv", csv)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let report = &body["data"];
        assert_eq!(report["imported"], 0);
        assert_eq!(report["skipped_existing"], 2);
        assert_eq!(report["issues"][1]["line"], 3);
        assert_eq!(report["issues"][1]["reason"], "study 'ST-002' already exists");

        let (_, body) = app.json("GET", "/api/studies/count", Some(&token), None).await;
        assert_eq!(body["data"]["total"], 2);
    }

    #[tokio::test]
    async fn test_study_lifecycle_and_public_qr() {
        let app = test_app().await;
        let token = app.user_token().await;
        let admin = app.login("admin", ADMIN_PASSWORD).await;

        let (status, body) = app
            .json(
                "POST",
                "/api/studies",
                Some(&token),
                Some(json!({ "studyCode": "ST-001", "status": "Completed", "riskLevel": "High" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["data"]["id"].as_i64().unwrap();
        assert_eq!(body["data"]["createdBy"], "jo");

        let (_, body) = app.json("GET", "/api/studies/count", Some(&token), None).await;
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["completed"], 1);

        let (status, body) = app
            .json("POST", &format!("/api/studies/{id}/generate-qr"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let code = body["data"]["qrCode"].as_str().unwrap().to_string();
        assert!(body["_links"]["qr"].as_str().unwrap().ends_with(&format!("/study-qr/{code}")));

        let (status, body) = app.json("GET", &format!("/study-qr/{code}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["studyCode"], "ST-001");

        let req = Request::builder()
            .uri(format!("/api/studies/{id}/qr-image"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, png) = app.call(req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let (status, _) = app
            .json("DELETE", "/api/studies/clear-all", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = app
            .json("DELETE", "/api/studies/clear-all", Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deleted"], 1);
    }

    #[tokio::test]
    async fn test_unknown_qr_code_is_not_found() {
        let app = test_app().await;
        let (status, body) = app.json("GET", "/qr/does-not-exist", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["errors"].is_array());
    }

    #[tokio::test]
    async fn test_admin_user_management() {
        let app = test_app().await;
        let user = app.user_token().await;
        let admin = app.login("admin", ADMIN_PASSWORD).await;

        let (status, _) = app.json("GET", "/api/admin/users", Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .json(
                "POST",
                "/api/admin/users",
                Some(&admin),
                Some(json!({ "username": "lead", "password": "secret2", "role": "ADMIN" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["role"], "ADMIN");
        let lead_id = body["data"]["id"].as_i64().unwrap();

        let (status, _) = app
            .json(
                "POST",
                &format!("/api/admin/users/{lead_id}/reset-password"),
                Some(&admin),
                Some(json!({ "newPassword": "changed9" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        app.login("lead", "changed9").await;

        let (_, body) = app.json("GET", "/api/admin/stats", Some(&admin), None).await;
        assert_eq!(body["data"]["users"], 3);
        assert_eq!(body["data"]["chemicals"], 0);

        let (_, body) = app.json("GET", "/api/admin/users", Some(&admin), None).await;
        let admin_id = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["username"] == "admin")
            .map(|u| u["id"].as_i64().unwrap())
            .unwrap();
        let (status, _) = app
            .json("DELETE", &format!("/api/admin/users/{admin_id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_csv_analyze() {
        let app = test_app().await;
        let token = app.user_token().await;
        let (status, body) = app
            .upload(
                "/api/csv/analyze?type=studies",
                &token,
                "s.csv",
                "Study Code,Status\nST-1,Pending\n",
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["detected_delimiter"], ",");
        assert_eq!(body["data"]["data_rows"], 1);
    }
}
