//! HS256 bearer tokens via `jsonwebtoken`.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use labinv_core::service::token::{TokenClaims, TokenIssuer};
use labinv_types::error::AuthError;

/// Signs and verifies tokens with a shared HMAC secret.
pub struct HmacTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl HmacTokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenIssuer for HmacTokenIssuer {
    fn issue(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labinv_types::user::UserRole;

    fn claims(exp_offset: i64) -> TokenClaims {
        let now = chrono::Utc::now().timestamp();
        TokenClaims {
            sub: "jo".to_string(),
            uid: 7,
            role: UserRole::Admin,
            iat: now,
            exp: now + exp_offset,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = HmacTokenIssuer::new(b"0123456789abcdef0123456789abcdef");
        let original = claims(3600);
        let token = issuer.issue(&original).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(issuer.verify(&token).unwrap(), original);
    }

    #[test]
    fn test_expired_token() {
        let issuer = HmacTokenIssuer::new(b"secret-secret-secret");
        let token = issuer.issue(&claims(-120)).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let a = HmacTokenIssuer::new(b"first-secret-value");
        let b = HmacTokenIssuer::new(b"second-secret-value");
        let token = a.issue(&claims(3600)).unwrap();
        assert!(matches!(b.verify(&token), Err(AuthError::InvalidToken(_))));
        assert!(matches!(a.verify("garbage"), Err(AuthError::InvalidToken(_))));
    }
}
