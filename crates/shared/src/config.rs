//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session token configuration.
    pub auth: AuthConfig,
    /// Public application settings.
    #[serde(default)]
    pub app: AppSettings,
    /// Facebook app and Graph API settings.
    pub facebook: FacebookConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Session token configuration.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret key for signing session tokens.
    pub secret: String,
    /// Session token lifetime in days.
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

fn default_token_ttl_days() -> i64 {
    7
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"[hidden]")
            .field("token_ttl_days", &self.token_ttl_days)
            .finish()
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development: cookies are sent without the `Secure` flag.
    #[default]
    Development,
    /// Production: cookies require HTTPS.
    Production,
}

/// Public application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Externally reachable base URL, used for OAuth redirects.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            environment: Environment::default(),
        }
    }
}

impl AppSettings {
    /// Whether auth cookies must carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Builds an absolute URL below the application base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Facebook app and Graph API settings.
#[derive(Clone, Deserialize)]
pub struct FacebookConfig {
    /// OAuth client id of the Facebook app.
    pub app_id: String,
    /// OAuth client secret of the Facebook app.
    pub app_secret: String,
    /// Shared secret echoed by Facebook during webhook subscription.
    pub verify_token: String,
    /// Graph API base URL.
    #[serde(default = "default_graph_api_url")]
    pub graph_api_url: String,
    /// OAuth dialog base URL.
    #[serde(default = "default_dialog_url")]
    pub dialog_url: String,
    /// Graph API version segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Permissions requested when linking a page.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Timeout applied to every Graph API call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Require a valid `X-Hub-Signature-256` on webhook deliveries.
    #[serde(default)]
    pub verify_signatures: bool,
}

fn default_graph_api_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_dialog_url() -> String {
    "https://www.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v18.0".to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "pages_manage_metadata".to_string(),
        "pages_messaging".to_string(),
        "pages_read_engagement".to_string(),
    ]
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl std::fmt::Debug for FacebookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacebookConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[hidden]")
            .field("verify_token", &"[hidden]")
            .field("graph_api_url", &self.graph_api_url)
            .field("dialog_url", &self.dialog_url)
            .field("api_version", &self.api_version)
            .field("scopes", &self.scopes)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("verify_signatures", &self.verify_signatures)
            .finish()
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("PAGEDESK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("facebook.scopes")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [(&str, Option<&str>); 5] = [
        ("PAGEDESK__DATABASE__URL", Some("postgres://localhost/pagedesk_test")),
        ("PAGEDESK__AUTH__SECRET", Some("test-secret")),
        ("PAGEDESK__FACEBOOK__APP_ID", Some("1234")),
        ("PAGEDESK__FACEBOOK__APP_SECRET", Some("app-secret")),
        ("PAGEDESK__FACEBOOK__VERIFY_TOKEN", Some("verify-me")),
    ];

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(REQUIRED, || {
            let config = AppConfig::load().unwrap();

            assert_eq!(config.server.port, 8080);
            assert_eq!(config.database.url, "postgres://localhost/pagedesk_test");
            assert_eq!(config.auth.token_ttl_days, 7);
            assert_eq!(config.facebook.api_version, "v18.0");
            assert_eq!(config.facebook.request_timeout_secs, 10);
            assert_eq!(config.facebook.scopes.len(), 3);
            assert!(!config.facebook.verify_signatures);
            assert!(!config.app.secure_cookies());
        });
    }

    #[test]
    fn test_production_environment_enables_secure_cookies() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PAGEDESK__APP__ENVIRONMENT", Some("production")));
        vars.push(("PAGEDESK__APP__BASE_URL", Some("https://desk.example.com/")));

        temp_env::with_vars(vars, || {
            let config = AppConfig::load().unwrap();

            assert!(config.app.secure_cookies());
            assert_eq!(
                config.app.url("/integration?success=true"),
                "https://desk.example.com/integration?success=true"
            );
        });
    }

    #[test]
    fn test_missing_secret_fails() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .map(|(k, v)| (*k, if *k == "PAGEDESK__AUTH__SECRET" { None } else { *v }))
            .collect();

        temp_env::with_vars(vars, || {
            assert!(AppConfig::load().is_err());
        });
    }

    #[test]
    fn test_debug_hides_secrets() {
        let auth = AuthConfig {
            secret: "super-secret".to_string(),
            token_ttl_days: 7,
        };
        assert!(!format!("{auth:?}").contains("super-secret"));
    }
}
