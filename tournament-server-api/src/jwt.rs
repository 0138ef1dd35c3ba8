use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tournament_server_app::{
    domain::{UserId, user::Role},
    ports::session::{SessionClaims, SessionTokenError, SessionTokenPort},
};

/// Lifetime of a session token, also used as the cookie max-age.
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: String,
    email: String,
    role: String,
    iat: i64,
    exp: i64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// HS256 session tokens. Stateless, so a token stays valid until it expires.
pub struct JwtSessionTokens {
    keys: Keys,
    validation: Validation,
    ttl: chrono::Duration,
}

impl JwtSessionTokens {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, chrono::Duration::days(SESSION_TTL_DAYS))
    }

    pub fn with_ttl(secret: &[u8], ttl: chrono::Duration) -> Self {
        Self {
            keys: Keys::new(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }
}

impl SessionTokenPort for JwtSessionTokens {
    fn issue_token(&self, claims: &SessionClaims) -> Result<String, SessionTokenError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            id: claims.user_id.to_string(),
            email: claims.email.clone(),
            role: claims.role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| SessionTokenError::Signing(e.to_string()))
    }

    fn verify_token(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        let data = decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map_err(|_| SessionTokenError::Invalid)?;
        Ok(SessionClaims {
            user_id: UserId::parse(&data.claims.id).ok_or(SessionTokenError::Invalid)?,
            email: data.claims.email,
            role: Role::parse(&data.claims.role).ok_or(SessionTokenError::Invalid)?,
        })
    }
}
