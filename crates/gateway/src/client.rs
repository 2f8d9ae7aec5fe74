//! Reqwest-backed Graph API client.

use std::time::Duration;

use async_trait::async_trait;
use pagedesk_shared::AppConfig;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    MessagingGateway,
    error::GatewayError,
    types::{AccessToken, DataList, DeliveryReceipt, ManagedPage, PageInfo, UserProfile},
};

/// Graph API client configuration.
#[derive(Clone)]
pub struct GraphConfig {
    /// OAuth client id.
    pub app_id: String,
    /// OAuth client secret.
    pub app_secret: String,
    /// Callback registered with the app.
    pub redirect_uri: String,
    /// Graph API base URL.
    pub graph_api_url: String,
    /// OAuth dialog base URL.
    pub dialog_url: String,
    /// API version segment, e.g. `v18.0`.
    pub api_version: String,
    /// Permissions requested by the OAuth dialog.
    pub scopes: Vec<String>,
    /// Timeout for every request.
    pub timeout: Duration,
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[hidden]")
            .field("redirect_uri", &self.redirect_uri)
            .field("graph_api_url", &self.graph_api_url)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Path of the OAuth callback route, relative to the app base URL.
pub const OAUTH_CALLBACK_PATH: &str = "/api/auth/facebook/callback";

impl GraphConfig {
    /// Builds the client configuration from the application configuration.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let fb = &config.facebook;
        Self {
            app_id: fb.app_id.clone(),
            app_secret: fb.app_secret.clone(),
            redirect_uri: config.app.url(OAUTH_CALLBACK_PATH),
            graph_api_url: fb.graph_api_url.clone(),
            dialog_url: fb.dialog_url.clone(),
            api_version: fb.api_version.clone(),
            scopes: fb.scopes.clone(),
            timeout: Duration::from_secs(fb.request_timeout_secs),
        }
    }
}

/// Graph API client.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: Client,
    config: GraphConfig,
}

impl GraphClient {
    /// Creates a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` if the HTTP client cannot be built.
    pub fn new(config: GraphConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn graph_url(&self, path: &str) -> Result<Url, GatewayError> {
        let raw = format!(
            "{}/{}/{}",
            self.config.graph_api_url.trim_end_matches('/'),
            self.config.api_version,
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| GatewayError::Config(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let url = self.graph_url(path)?;
        debug!(%url, "graph api GET");
        let response = self.http.get(url).query(query).send().await?;
        decode(path, response).await
    }
}

/// Maps non-2xx answers to `GatewayError::Upstream` and decodes the rest.
async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(path, status = status.as_u16(), "graph api request failed");
        return Err(GatewayError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    response.json::<T>().await.map_err(GatewayError::from)
}

#[async_trait]
impl MessagingGateway for GraphClient {
    fn authorization_url(&self, state: &str) -> String {
        let raw = format!(
            "{}/{}/dialog/oauth",
            self.config.dialog_url.trim_end_matches('/'),
            self.config.api_version
        );
        let scope = self.config.scopes.join(",");
        let mut params = vec![
            ("client_id", self.config.app_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("response_type", "code"),
        ];
        if !state.is_empty() {
            params.push(("state", state));
        }
        match Url::parse_with_params(&raw, &params) {
            Ok(url) => url.into(),
            Err(e) => {
                warn!(error = %e, "invalid oauth dialog url");
                raw
            }
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, GatewayError> {
        self.get_json(
            "oauth/access_token",
            &[
                ("client_id", self.config.app_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_secret", self.config.app_secret.as_str()),
                ("code", code),
            ],
        )
        .await
    }

    async fn fetch_managed_pages(
        &self,
        user_access_token: &str,
    ) -> Result<Vec<ManagedPage>, GatewayError> {
        let list: DataList<ManagedPage> = self
            .get_json(
                "me/accounts",
                &[
                    ("fields", "id,name,access_token"),
                    ("access_token", user_access_token),
                ],
            )
            .await?;
        Ok(list.data)
    }

    async fn fetch_page_info(
        &self,
        page_access_token: &str,
        page_id: &str,
    ) -> Result<PageInfo, GatewayError> {
        self.get_json(
            page_id,
            &[("fields", "id,name"), ("access_token", page_access_token)],
        )
        .await
    }

    async fn fetch_user_profile(
        &self,
        page_access_token: &str,
        customer_id: &str,
    ) -> Result<UserProfile, GatewayError> {
        self.get_json(
            customer_id,
            &[
                ("fields", "first_name,last_name,profile_pic"),
                ("access_token", page_access_token),
            ],
        )
        .await
    }

    async fn send_message(
        &self,
        page_access_token: &str,
        recipient_id: &str,
        text: &str,
    ) -> Result<DeliveryReceipt, GatewayError> {
        let url = self.graph_url("me/messages")?;
        let body = json!({
            "recipient": { "id": recipient_id },
            "messaging_type": "RESPONSE",
            "message": { "text": text },
        });

        let response = self
            .http
            .post(url)
            .bearer_auth(page_access_token)
            .json(&body)
            .send()
            .await?;
        decode("me/messages", response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GraphClient {
        GraphClient::new(GraphConfig {
            app_id: "1234".into(),
            app_secret: "shh".into(),
            redirect_uri: "http://localhost:3000/api/auth/facebook/callback".into(),
            graph_api_url: "https://graph.facebook.com/".into(),
            dialog_url: "https://www.facebook.com".into(),
            api_version: "v18.0".into(),
            scopes: vec!["pages_messaging".into(), "pages_manage_metadata".into()],
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_authorization_url_carries_state_and_scopes() {
        let url = Url::parse(&client().authorization_url("tok.en/with+chars")).unwrap();

        assert_eq!(url.path(), "/v18.0/dialog/oauth");
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "1234");
        assert_eq!(
            params["redirect_uri"],
            "http://localhost:3000/api/auth/facebook/callback"
        );
        assert_eq!(params["scope"], "pages_messaging,pages_manage_metadata");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], "tok.en/with+chars");
    }

    #[test]
    fn test_authorization_url_without_state() {
        let url = client().authorization_url("");
        assert!(!url.contains("state="));
    }

    #[test]
    fn test_graph_url_joins_segments() {
        let url = client().graph_url("/me/accounts").unwrap();
        assert_eq!(url.as_str(), "https://graph.facebook.com/v18.0/me/accounts");
    }

    #[test]
    fn test_debug_hides_secret() {
        assert!(!format!("{:?}", client()).contains("shh"));
    }
}
