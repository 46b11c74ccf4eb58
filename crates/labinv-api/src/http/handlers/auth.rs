//! Login, registration and current-user handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use labinv_types::user::{
    LoginRequest, LoginResponse, Permissions, RegisterRequest, UserProfile, UserRole,
};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// The caller's account plus what the client may show them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: UserProfile,
    pub authority: &'static str,
    pub permissions: Permissions,
}

/// Role summary for the current user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsView {
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
    pub permissions: Permissions,
}

impl PermissionsView {
    pub fn for_user(user: &UserProfile) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
            is_admin: user.role.is_admin(),
            permissions: Permissions::for_role(user.role),
        }
    }
}

/// POST /api/login - Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let timer = RequestTimer::start();
    let login = state.auth_service.login(&body.username, &body.password).await?;
    Ok(Json(timer.respond(login).with_link("profile", "/api/profile")))
}

/// POST /api/register - Self-service account creation with the USER role.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), AppError> {
    let timer = RequestTimer::start();
    let user = state.user_service.register(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(timer.respond(user).with_link("login", "/api/login")),
    ))
}

/// POST /api/logout - Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<ApiResponse<serde_json::Value>> {
    let timer = RequestTimer::start();
    Json(timer.respond(serde_json::json!({ "message": "Logged out successfully" })))
}

/// GET /api/profile - The authenticated user's account.
pub async fn profile(AuthUser(user): AuthUser) -> Json<ApiResponse<ProfileView>> {
    let timer = RequestTimer::start();
    let view = ProfileView {
        authority: user.role.authority(),
        permissions: Permissions::for_role(user.role),
        user,
    };
    Json(timer.respond(view).with_link("self", "/api/profile"))
}

/// GET /api/permissions (also /api/studies/permissions) - What the
/// authenticated user may do.
pub async fn permissions(AuthUser(user): AuthUser) -> Json<ApiResponse<PermissionsView>> {
    let timer = RequestTimer::start();
    Json(timer.respond(PermissionsView::for_user(&user)))
}
