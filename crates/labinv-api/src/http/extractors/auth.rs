//! Bearer token authentication extractors.
//!
//! `AuthUser` verifies `Authorization: Bearer <jwt>` and loads the account
//! the token names. `RequireAdmin` additionally demands the ADMIN role.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use labinv_types::error::AuthError;
use labinv_types::user::UserProfile;

use crate::http::error::AppError;
use crate::state::AppState;

/// An authenticated caller with any role.
pub struct AuthUser(pub UserProfile);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = state.auth_service.authenticate_token(token).await?;
        Ok(AuthUser(user))
    }
}

/// An authenticated caller holding the ADMIN role.
pub struct RequireAdmin(pub UserProfile);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            tracing::info!(username = %user.username, path = %parts.uri.path(), "admin route refused");
            return Err(AuthError::Forbidden("administrator role required".to_string()).into());
        }
        Ok(RequireAdmin(user))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;
    let value = header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("invalid Authorization header encoding".to_string()))?;
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/chemicals");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def.ghi"))).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&parts_with(Some("bearer  xyz "))).unwrap(), "xyz");
    }

    #[test]
    fn test_bearer_token_rejections() {
        assert!(matches!(bearer_token(&parts_with(None)), Err(AuthError::MissingToken)));
        assert!(matches!(
            bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            bearer_token(&parts_with(Some("Bearer "))),
            Err(AuthError::MissingToken)
        ));
    }
}
