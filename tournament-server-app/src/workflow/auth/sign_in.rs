use std::sync::Arc;

use crate::{
    domain::user::{NewUser, Role, User, UserRepository},
    ports::{
        identity::{IdentityError, IdentityProviderPort},
        session::{SessionClaims, SessionTokenError, SessionTokenPort},
    },
};

const FALLBACK_DISPLAY_NAME: &str = "No Name";

#[derive(Clone, Debug)]
pub struct SignedInUser {
    pub user: User,
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("identity provider returned no email")]
    MissingEmail,
    #[error("storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Token(#[from] SessionTokenError),
}

#[async_trait::async_trait]
pub trait SignInUseCase {
    fn authorization_url(&self, state: Option<&str>) -> String;
    /// Completes the provider flow. `role_hint` only applies when the email
    /// has never been seen before.
    async fn sign_in(&self, code: &str, role_hint: Option<Role>)
    -> Result<SignedInUser, SignInError>;
}

pub struct SignInUseCaseImpl<I: IdentityProviderPort, U: UserRepository, S: SessionTokenPort> {
    identity_provider: Arc<I>,
    user_repository: Arc<U>,
    session_tokens: Arc<S>,
}

impl<I: IdentityProviderPort, U: UserRepository, S: SessionTokenPort> SignInUseCaseImpl<I, U, S> {
    pub fn new(identity_provider: Arc<I>, user_repository: Arc<U>, session_tokens: Arc<S>) -> Self {
        Self {
            identity_provider,
            user_repository,
            session_tokens,
        }
    }
}

#[async_trait::async_trait]
impl<
    I: IdentityProviderPort + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    S: SessionTokenPort + Send + Sync + 'static,
> SignInUseCase for SignInUseCaseImpl<I, U, S>
{
    fn authorization_url(&self, state: Option<&str>) -> String {
        self.identity_provider.authorization_url(state)
    }

    async fn sign_in(
        &self,
        code: &str,
        role_hint: Option<Role>,
    ) -> Result<SignedInUser, SignInError> {
        let identity = self.identity_provider.exchange_code(code).await?;
        let email = identity
            .email
            .filter(|e| !e.is_empty())
            .ok_or(SignInError::MissingEmail)?;
        let full_name = identity
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string());

        let user = self
            .user_repository
            .find_or_create_user(NewUser {
                email,
                full_name,
                provider_id: identity.provider_id,
                role: role_hint.unwrap_or_default(),
            })
            .await
            .map_err(|e| SignInError::Storage(e.to_string()))?;

        let token = self
            .session_tokens
            .issue_token(&SessionClaims::for_user(&user))?;
        log::info!("User {} signed in as {}", user.id, user.role);

        Ok(SignedInUser { user, token })
    }
}
