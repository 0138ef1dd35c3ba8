#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Public origin of the web client. Used for redirects and CORS.
    pub frontend_url: String,
    /// Public origin of this server, as registered with the OAuth client.
    pub backend_url: String,
    /// Enables the `Secure` flag on the session cookie.
    pub production: bool,
    pub jwt_secret: String,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_or("PORT", "5000");
        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: port.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: port.clone(),
            })?,
            frontend_url: trim_slash(env_or("FRONTEND_URL", "http://localhost:3000")),
            backend_url: trim_slash(env_or("BACKEND_URL", "http://localhost:5000")),
            production: env_or("APP_ENV", "development") == "production",
            jwt_secret: required_env("JWT_SECRET")?,
        })
    }

    pub fn google_callback_url(&self) -> String {
        format!("{}/auth/google/callback", self.backend_url)
    }
}

pub fn required_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
