use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub app: AppConfig,
    pub mail: MailConfig,
    pub social: SocialConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub serve_origin: Option<String>,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the server address as a string in the format "host:port".
    #[must_use]
    pub fn serve_origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// ## Summary
    /// Returns the server origin URL.
    #[must_use]
    pub fn origin(&self) -> String {
        if let Some(origin) = &self.serve_origin {
            origin.clone()
        } else {
            self.serve_origin()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the web client; share and invitation links point here.
    pub frontend_url: String,
    pub invitation_ttl_days: i64,
}

impl AppConfig {
    /// ## Summary
    /// Builds an absolute frontend URL from a path and a trailing token.
    #[must_use]
    pub fn frontend_link(&self, path: &str, token: &str) -> String {
        format!("{}{path}/{token}", self.frontend_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailMethod {
    /// Messages are written to the log only.
    Log,
    /// Messages are posted as JSON to an HTTP mail relay.
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub method: MailMethod,
    pub from: String,
    pub http: Option<HttpMailConfig>,
}

#[derive(Clone, Deserialize)]
pub struct HttpMailConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for HttpMailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMailConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialConfig {
    /// Expected `aud` of Google ID tokens. Audience is not checked when unset.
    pub google_client_id: Option<String>,
    pub kakao_enabled: bool,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `config.toml` values.
    ///
    /// Variables use the `SHARECAL_` prefix and `__` between nested keys,
    /// e.g. `SHARECAL_AUTH__JWT_SECRET`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "debug")?
            .set_default("auth.access_token_ttl_minutes", 60)?
            .set_default("auth.refresh_token_ttl_days", 7)?
            .set_default("app.frontend_url", "http://localhost:3000")?
            .set_default("app.invitation_ttl_days", 7)?
            .set_default("mail.method", "log")?
            .set_default("mail.from", "noreply@localhost")?
            .set_default("social.kakao_enabled", true)?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env file and process environment
            .add_source(
                config::Environment::with_prefix("SHARECAL")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
