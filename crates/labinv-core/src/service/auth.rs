//! Login and bearer token authentication.

use std::sync::Arc;

use labinv_types::error::AuthError;
use labinv_types::user::{LoginResponse, UserProfile};

use crate::repository::user::UserRepository;
use crate::service::password::PasswordHasher;
use crate::service::token::{TokenClaims, TokenIssuer};
use crate::service::user::UserService;

/// Token lifetime for a configured number of hours, saturating at the
/// largest representable duration.
fn token_ttl(hours: u64) -> chrono::TimeDelta {
    i64::try_from(hours)
        .ok()
        .and_then(chrono::TimeDelta::try_hours)
        .unwrap_or(chrono::TimeDelta::MAX)
}

/// Issues tokens on login and resolves tokens back to live accounts.
pub struct AuthService<R: UserRepository, H: PasswordHasher, T: TokenIssuer> {
    users: Arc<UserService<R, H>>,
    tokens: T,
    ttl: chrono::TimeDelta,
}

impl<R: UserRepository, H: PasswordHasher, T: TokenIssuer> AuthService<R, H, T> {
    pub fn new(users: Arc<UserService<R, H>>, tokens: T, ttl_hours: u64) -> Self {
        Self {
            users,
            tokens,
            ttl: token_ttl(ttl_hours),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let user = self.users.authenticate(username, password).await?;
        let claims = TokenClaims::for_user(&user, self.ttl)?;
        let token = self.tokens.issue(&claims)?;
        let expires_at = chrono::DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::Signing("token lifetime out of range".to_string()))?;
        tracing::info!(username = %user.username, role = %user.role, "login succeeded");
        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            username: user.username,
            role: user.role,
            expires_at,
        })
    }

    /// Verify `token` and load the account it names.
    ///
    /// The account is re-read on every call, so deleted users and role
    /// changes take effect without waiting for the token to expire.
    pub async fn authenticate_token(&self, token: &str) -> Result<UserProfile, AuthError> {
        let claims = self.tokens.verify(token)?;
        match self.users.get_by_username(&claims.sub).await {
            Ok(user) => Ok(user),
            Err(labinv_types::error::UserError::NotFound) => Err(AuthError::InvalidToken(
                "account no longer exists".to_string(),
            )),
            Err(e) => Err(AuthError::Backend(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ttl_saturates_on_huge_values() {
        assert_eq!(token_ttl(24), chrono::TimeDelta::hours(24));
        assert_eq!(token_ttl(u64::MAX), chrono::TimeDelta::MAX);
        assert_eq!(token_ttl(i64::MAX as u64), chrono::TimeDelta::MAX);
    }
}
