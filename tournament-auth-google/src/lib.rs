use reqwest::{StatusCode, Url};
use tournament_server_app::ports::identity::{
    IdentityError, IdentityProviderPort, VerifiedIdentity,
};

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const SCOPES: &str = "openid email profile";

#[derive(Clone, Debug)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must match a redirect URI registered for the client.
    pub redirect_url: String,
}

#[derive(Clone, Debug)]
pub struct GoogleEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            authorize: GOOGLE_AUTHORIZE_URL.to_string(),
            token: GOOGLE_TOKEN_URL.to_string(),
            userinfo: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GoogleConfigError {
    #[error("invalid endpoint url {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(serde::Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(serde::Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

pub struct GoogleIdentityProvider {
    config: GoogleOAuthConfig,
    authorize_url: Url,
    token_url: Url,
    userinfo_url: Url,
    client: reqwest::Client,
}

fn parse_endpoint(url: &str) -> Result<Url, GoogleConfigError> {
    Url::parse(url).map_err(|e| GoogleConfigError::InvalidEndpoint {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

impl GoogleIdentityProvider {
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, GoogleConfigError> {
        Self::with_endpoints(config, GoogleEndpoints::default())
    }

    pub fn with_endpoints(
        config: GoogleOAuthConfig,
        endpoints: GoogleEndpoints,
    ) -> Result<Self, GoogleConfigError> {
        Ok(Self {
            config,
            authorize_url: parse_endpoint(&endpoints.authorize)?,
            token_url: parse_endpoint(&endpoints.token)?,
            userinfo_url: parse_endpoint(&endpoints.userinfo)?,
            client: reqwest::Client::new(),
        })
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String, IdentityError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if status.is_client_error() {
            let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => status.to_string(),
            };
            return Err(IdentityError::Rejected(reason));
        }
        if status != StatusCode::OK {
            return Err(IdentityError::Unavailable(format!(
                "token endpoint returned {}",
                status
            )));
        }

        serde_json::from_str::<TokenResponse>(&body)
            .map(|t| t.access_token)
            .map_err(|e| IdentityError::Unavailable(format!("malformed token response: {}", e)))
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo, IdentityError> {
        let response = self
            .client
            .get(self.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        response
            .json::<UserInfo>()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("malformed userinfo: {}", e)))
    }
}

#[async_trait::async_trait]
impl IdentityProviderPort for GoogleIdentityProvider {
    fn authorization_url(&self, state: Option<&str>) -> String {
        let mut url = self.authorize_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", &self.config.redirect_url)
                .append_pair("response_type", "code")
                .append_pair("scope", SCOPES);
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<VerifiedIdentity, IdentityError> {
        let access_token = self.fetch_access_token(code).await?;
        let info = self.fetch_user_info(&access_token).await?;

        // Unverified addresses cannot be trusted to identify an account.
        let email = match info.email_verified {
            Some(false) => {
                log::warn!("Google account {} has an unverified email", info.sub);
                None
            }
            _ => info.email,
        };

        Ok(VerifiedIdentity {
            provider_id: info.sub,
            email,
            display_name: info.name,
        })
    }
}
