use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, Proxy, Response};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::oauth;
use super::{MediaFetcher, Post, PostDeleter, TimelineSource};
use crate::config::AppConfig;
use crate::{Credentials, Error, Result};

const CLIENT_USER_AGENT: &str = concat!("tw-delete/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Deserialize)]
struct ApiErrorEntry {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

#[derive(Deserialize)]
struct AccountInfo {
    screen_name: String,
}

/// REST client for the v1.1 API, signing every request with OAuth 1.0a
pub struct TwitterClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

impl TwitterClient {
    pub fn new(config: &AppConfig, credentials: Credentials) -> Result<Self> {
        let client = Self::build_client(config.api.request_timeout_secs, &config.api.proxy_url)?;
        let base_url = Self::parse_base_url(&config.api.base_url)?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for API requests");
        }

        builder.build().map_err(Error::Http)
    }

    /// Parse the base URL, making sure relative joins keep its path
    fn parse_base_url(base_url: &str) -> Result<Url> {
        if base_url.ends_with('/') {
            Ok(Url::parse(base_url)?)
        } else {
            Ok(Url::parse(&format!("{}/", base_url))?)
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a signed request; `params` go in the query string
    async fn send_signed(&self, method: Method, url: Url, params: &[(String, String)]) -> Result<Response> {
        let header = oauth::authorization_header(
            &self.credentials,
            method.as_str(),
            url.as_str(),
            params,
            &oauth::nonce(),
            chrono::Utc::now().timestamp(),
        )?;

        tracing::debug!("{} {}", method, url);

        let response = self
            .client
            .request(method, url)
            .query(params)
            .header(AUTHORIZATION, header)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await?;

        check_response(response).await
    }

    /// Look up the authenticated account, failing fast on bad credentials
    pub async fn verify_credentials(&self) -> Result<String> {
        let url = self.endpoint("account/verify_credentials.json")?;
        let params = vec![
            ("include_entities".to_string(), "false".to_string()),
            ("skip_status".to_string(), "true".to_string()),
        ];

        let response = self.send_signed(Method::GET, url, &params).await?;
        let account: AccountInfo = response.json().await?;
        Ok(account.screen_name)
    }
}

/// Query parameters for one timeline page
pub(crate) fn timeline_params(max_id: Option<u64>, count: u32) -> Vec<(String, String)> {
    let mut params = vec![
        ("count".to_string(), count.to_string()),
        ("include_rts".to_string(), "true".to_string()),
    ];
    if let Some(max_id) = max_id {
        params.push(("max_id".to_string(), max_id.to_string()));
    }
    params
}

/// Turn non-2xx responses into `Error::Api`
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

fn api_error(status: u16, body: &[u8]) -> Error {
    let message = serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .filter(|b| !b.errors.is_empty())
        .map(|b| {
            b.errors
                .iter()
                .map(|e| match e.code {
                    Some(code) => format!("{} (code {})", e.message, code),
                    None => e.message.clone(),
                })
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                "no response body".to_string()
            } else {
                text
            }
        });

    Error::Api { status, message }
}

#[async_trait::async_trait]
impl TimelineSource for TwitterClient {
    async fn fetch_page(&self, max_id: Option<u64>, count: u32) -> Result<Vec<Post>> {
        let url = self.endpoint("statuses/user_timeline.json")?;
        let params = timeline_params(max_id, count);

        let response = self.send_signed(Method::GET, url, &params).await?;
        let body = response.bytes().await?;
        Post::parse_page(&body)
    }
}

#[async_trait::async_trait]
impl PostDeleter for TwitterClient {
    async fn delete(&self, post: &Post) -> Result<()> {
        let url = self.endpoint(&format!("statuses/destroy/{}.json", post.id))?;
        self.send_signed(Method::POST, url, &[]).await?;

        tracing::info!(id = %post.id_str, created_at = %post.created_at, "Deleted post");
        Ok(())
    }
}

#[async_trait::async_trait]
impl MediaFetcher for TwitterClient {
    async fn fetch_media(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await?;

        let response = check_response(response).await?;
        Ok(response.bytes().await?)
    }
}
