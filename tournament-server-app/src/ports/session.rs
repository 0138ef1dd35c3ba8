use crate::domain::{
    UserId,
    permission::Actor,
    user::{Role, User},
};

/// Decoded content of a valid session token.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl SessionClaims {
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    #[error("token is invalid or expired")]
    Invalid,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

pub trait SessionTokenPort {
    fn issue_token(&self, claims: &SessionClaims) -> Result<String, SessionTokenError>;
    fn verify_token(&self, token: &str) -> Result<SessionClaims, SessionTokenError>;
}
