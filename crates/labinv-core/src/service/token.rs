//! Bearer token port.

use labinv_types::error::AuthError;
use labinv_types::user::{UserProfile, UserRole};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Username.
    pub sub: String,
    /// User id.
    pub uid: i64,
    pub role: UserRole,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl TokenClaims {
    /// Claims for `user` expiring `ttl` from now. Fails when the expiry
    /// falls outside the representable date range.
    pub fn for_user(user: &UserProfile, ttl: chrono::TimeDelta) -> Result<Self, AuthError> {
        let now = chrono::Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Signing("token lifetime out of range".to_string()))?;
        Ok(Self {
            sub: user.username.clone(),
            uid: user.id.0,
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }
}

/// Signs and verifies access tokens. The `HmacTokenIssuer` adapter lives
/// in labinv-infra.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, claims: &TokenClaims) -> Result<String, AuthError>;

    /// Verify signature and expiry.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use labinv_types::user::UserId;

    fn user() -> UserProfile {
        UserProfile {
            id: UserId(7),
            username: "jo".to_string(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            email: None,
            phone_number: None,
            position: None,
            duration: 0,
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_claims_expire_after_ttl() {
        let claims = TokenClaims::for_user(&user(), TimeDelta::hours(2)).unwrap();
        assert_eq!(claims.sub, "jo");
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.exp - claims.iat, 2 * 3600);
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let err = TokenClaims::for_user(&user(), TimeDelta::MAX).unwrap_err();
        assert!(matches!(err, AuthError::Signing(m) if m.contains("out of range")));
    }
}
