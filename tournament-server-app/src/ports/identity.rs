/// A profile the identity provider has vouched for.
#[derive(Clone, Debug, PartialEq)]
pub struct VerifiedIdentity {
    pub provider_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("authorization code was rejected: {0}")]
    Rejected(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait IdentityProviderPort {
    /// Where to send the browser to start the flow. `state` is echoed back to
    /// the callback untouched.
    fn authorization_url(&self, state: Option<&str>) -> String;
    async fn exchange_code(&self, code: &str) -> Result<VerifiedIdentity, IdentityError>;
}
