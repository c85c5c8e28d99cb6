//! HTTP client implementation

use http::StatusCode;
use reqwest::{header, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::errors::DeployError;
use crate::utils::{calc_exp_backoff, generate_uuid, CooldownOptions};

/// Retry policy applied to every gateway call.
///
/// Transport errors and 5xx responses retry with exponential backoff; 4xx
/// responses are returned to the caller unretried.
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Total attempts per request (1 disables retries)
    pub max_attempts: u32,

    /// Backoff between attempts
    pub backoff: CooldownOptions,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: CooldownOptions::default(),
        }
    }
}

/// HTTP client for the orchestration and canary APIs
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_token: Option<SecretString>,
    retry: RetryOptions,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(
        base_url: &str,
        api_token: Option<SecretString>,
        retry: RetryOptions,
    ) -> Result<Self, DeployError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            retry,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DeployError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.send_with_retry(|| self.client.get(&url)).await?;
        Self::read_json(&url, response).await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DeployError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .send_with_retry(|| self.client.post(&url).json(body))
            .await?;
        Self::read_json(&url, response).await
    }

    /// Make a PATCH request
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DeployError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PATCH {}", url);

        let response = self
            .send_with_retry(|| self.client.patch(&url).json(body))
            .await?;
        Self::read_json(&url, response).await
    }

    /// Send a request, retrying transport errors and 5xx responses
    async fn send_with_retry<F>(&self, build: F) -> Result<Response, DeployError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            let result = self.decorate(build()).send().await;
            attempt += 1;

            match result {
                Ok(response)
                    if response.status().is_server_error()
                        && attempt < self.retry.max_attempts =>
                {
                    warn!(
                        "Request failed with {}, attempt {}/{}",
                        response.status(),
                        attempt,
                        self.retry.max_attempts
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.retry.max_attempts => {
                    warn!(
                        "Request error ({}), attempt {}/{}",
                        e, attempt, self.retry.max_attempts
                    );
                }
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(calc_exp_backoff(&self.retry.backoff, attempt - 1)).await;
        }
    }

    /// Attach auth and tracing headers
    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("X-Request-Id", generate_uuid());
        match &self.api_token {
            Some(token) => request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
            None => request,
        }
    }

    /// Parse a JSON response, mapping failure statuses to errors
    async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, DeployError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP request failed: {} {} - {}", url, status, body);
            if status == StatusCode::NOT_FOUND {
                return Err(DeployError::NotFound(url.to_string()));
            }
            return Err(DeployError::ApiError(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }
}
