//! User administration handlers. Every route here requires the ADMIN role.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use labinv_types::user::{RegisterRequest, UpdateUserRequest, UserId, UserProfile};

use crate::http::error::AppError;
use crate::http::extractors::auth::RequireAdmin;
use crate::http::handlers::parse_id;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

const USERS: &str = "/api/admin/users";

/// Body of a password reset.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(alias = "password")]
    pub new_password: String,
}

/// Record counts for the admin dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub users: i64,
    pub chemicals: i64,
    pub studies: i64,
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<ApiResponse<Vec<UserProfile>>>, AppError> {
    let timer = RequestTimer::start();
    let users = state.user_service.list().await?;
    Ok(Json(timer.respond(users).with_link("self", USERS)))
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let timer = RequestTimer::start();
    let user = state.user_service.get(parse_id(&id)?).await?;
    let link = format!("{USERS}/{}", user.id);
    Ok(Json(timer.respond(user).with_link("self", &link)))
}

/// POST /api/admin/users - Create an account with any role.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), AppError> {
    let timer = RequestTimer::start();
    let user = state.user_service.create_user(body).await?;
    tracing::info!(username = %user.username, role = %user.role, by = %admin.username, "user created");
    let link = format!("{USERS}/{}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(timer.respond(user).with_link("self", &link)),
    ))
}

/// PUT /api/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let timer = RequestTimer::start();
    let user = state.user_service.update(parse_id(&id)?, body).await?;
    let link = format!("{USERS}/{}", user.id);
    Ok(Json(timer.respond(user).with_link("self", &link)))
}

/// DELETE /api/admin/users/{id} - The `admin` account cannot be deleted.
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let timer = RequestTimer::start();
    let id: UserId = parse_id(&id)?;
    state.user_service.delete(id).await?;
    Ok(Json(timer.respond(serde_json::json!({
        "message": format!("User {id} deleted"),
        "id": id,
    }))))
}

/// POST /api/admin/users/{id}/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let timer = RequestTimer::start();
    let id: UserId = parse_id(&id)?;
    state
        .user_service
        .reset_password(id, &body.new_password)
        .await?;
    tracing::info!(%id, by = %admin.username, "password reset by admin");
    Ok(Json(timer.respond(serde_json::json!({
        "message": "Password reset successfully",
        "id": id,
    }))))
}

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<ApiResponse<AdminStats>>, AppError> {
    let timer = RequestTimer::start();
    let stats = AdminStats {
        users: state.user_service.count().await?,
        chemicals: state.chemical_service.count().await?,
        studies: state.study_service.count().await?,
    };
    Ok(Json(timer.respond(stats)))
}
