use crate::core::error::BotError;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;

/// JSON-over-HTTP client bound to one base URL.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: String,
    auth_header: Option<(String, String)>,
}

impl HttpClient {
    pub fn new(
        endpoint: String,
        auth_header: Option<(String, String)>,
        timeout: Option<Duration>,
    ) -> Result<Self, BotError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    /// Bearer-token authenticated client.
    pub fn with_bearer(
        endpoint: String,
        api_key: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, BotError> {
        let auth_header = Some(("Authorization".to_string(), format!("Bearer {}", api_key)));
        Self::new(endpoint, auth_header, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, BotError> {
        let mut request = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json");

        if let Some((key, value)) = &self.auth_header {
            request = request.header(key, value);
        }

        // Telegram endpoints embed the bot token in the URL.
        let response = request
            .json(payload)
            .send()
            .await
            .map_err(|e| BotError::from(e.without_url()))?;
        Ok(response)
    }
}
