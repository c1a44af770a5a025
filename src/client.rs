use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    query: &'a str,
}

/// Successful backend payload. `sql_query` is optional: the backend omits it
/// when it only produced an explanation.
#[derive(Debug, Clone, Deserialize)]
pub struct Translation {
    pub explanation: String,
    #[serde(default)]
    pub sql_query: Option<String>,
}

/// Error body the backend attaches to non-2xx responses. Decoded
/// best-effort for the operator log; never shown to the user.
#[derive(Debug, Deserialize)]
struct BackendError {
    error: String,
}

/// HTTP client for the natural-language-to-SQL translation service.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one natural-language query to the backend and await its
    /// translation. Transport errors, non-2xx statuses, and undecodable
    /// bodies all surface as a plain error.
    pub async fn translate(&self, query: &str) -> Result<Translation> {
        let url = format!("{}/api/nlp-to-sql", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&TranslateRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<BackendError>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "<no error body>".to_string());
            return Err(anyhow!("backend returned {status}: {detail}"));
        }

        let translation: Translation = response.json().await?;
        Ok(translation)
    }
}
