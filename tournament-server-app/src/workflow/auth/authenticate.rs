use std::sync::Arc;

use crate::ports::session::{SessionClaims, SessionTokenPort};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AuthenticateError {
    #[error("unauthenticated")]
    Unauthenticated,
}

pub trait AuthenticateUseCase {
    fn authenticate(&self, token: &str) -> Result<SessionClaims, AuthenticateError>;
}

pub struct AuthenticateUseCaseImpl<S: SessionTokenPort> {
    session_tokens: Arc<S>,
}

impl<S: SessionTokenPort> AuthenticateUseCaseImpl<S> {
    pub fn new(session_tokens: Arc<S>) -> Self {
        Self { session_tokens }
    }
}

impl<S: SessionTokenPort> AuthenticateUseCase for AuthenticateUseCaseImpl<S> {
    fn authenticate(&self, token: &str) -> Result<SessionClaims, AuthenticateError> {
        self.session_tokens.verify_token(token).map_err(|e| {
            log::debug!("Rejected session token: {}", e);
            AuthenticateError::Unauthenticated
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::UserId, domain::user::Role, testing::PlainSessionTokenPort};

    #[test]
    fn test_valid_token_yields_claims() {
        let claims = SessionClaims {
            user_id: UserId::new(),
            email: "a@example.com".to_string(),
            role: Role::Organizer,
        };
        let token = PlainSessionTokenPort.issue_token(&claims).unwrap();
        let auth = AuthenticateUseCaseImpl::new(Arc::new(PlainSessionTokenPort));
        assert_eq!(auth.authenticate(&token), Ok(claims));
    }

    #[test]
    fn test_garbage_token_is_unauthenticated() {
        let auth = AuthenticateUseCaseImpl::new(Arc::new(PlainSessionTokenPort));
        assert_eq!(
            auth.authenticate("not-a-token"),
            Err(AuthenticateError::Unauthenticated)
        );
    }
}
