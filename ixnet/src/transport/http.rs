//! reqwest-backed transport with the appliance login handshake.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{Method, RestRequest, RestResponse, RestTransport};
use crate::error::{IxError, Result};

const AUTH_PATH: &str = "/api/v1/auth/session";

/// Connection settings for one appliance session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Scheme, host and port, e.g. `https://10.27.200.3:11009`.
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Appliances ship with a self-signed certificate.
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            accept_invalid_certs: true,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthReply {
    api_key: Option<String>,
    username: Option<String>,
}

/// Authenticated HTTP client for the appliance.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Log in and return a transport carrying the session API key.
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=us-ascii"),
        );

        let login_client = Self::build_client(config, headers.clone())?;
        let reply = login_client
            .post(format!("{}{}", base_url, AUTH_PATH))
            .json(&json!({
                "username": config.username,
                "password": config.password,
            }))
            .send()
            .await?;

        let status = reply.status();
        let body = reply.text().await?;
        if !status.is_success() {
            return Err(IxError::Http {
                method: Method::Post.to_string(),
                path: AUTH_PATH.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let auth: AuthReply = serde_json::from_str(&body)
            .map_err(|e| IxError::Authentication(format!("{} ({})", e, body)))?;
        let api_key = auth
            .api_key
            .ok_or_else(|| IxError::Authentication("reply has no apiKey".to_string()))?;
        let username = auth.username.unwrap_or_else(|| config.username.clone());

        headers.insert(
            "apikey",
            HeaderValue::from_str(&api_key)
                .map_err(|e| IxError::Authentication(format!("invalid apiKey: {}", e)))?,
        );
        headers.insert(
            "username",
            HeaderValue::from_str(&username)
                .map_err(|e| IxError::Authentication(format!("invalid username: {}", e)))?,
        );

        info!(base_url = %base_url, username = %username, "Authenticated with appliance");

        Ok(Self {
            client: Self::build_client(config, headers)?,
            base_url,
        })
    }

    fn build_client(config: &SessionConfig, headers: HeaderMap) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.timeout)
            .build()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RestTransport for HttpTransport {
    async fn send(&self, request: &RestRequest) -> Result<RestResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Patch => self.client.patch(url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let reply = builder.send().await?;
        let status = reply.status().as_u16();
        let headers = reply
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = reply.bytes().await?.to_vec();

        Ok(RestResponse {
            status,
            headers,
            body,
        })
    }
}
