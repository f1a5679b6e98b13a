//! HTTP text-to-speech client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::{ExternalError, Renderer, Result};

/// Header carrying the provider API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Per-request timeout. Rendering a capsule's worth of text is seconds, not
/// minutes; a hung provider must not pin the read path.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the rendering provider.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Endpoint URL the render request is POSTed to.
    pub endpoint: String,
    pub api_key: String,
    /// Language code sent with every request (e.g. "ko").
    pub language: String,
    /// Voice style sent with every request (e.g. "neutral").
    pub style: String,
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    text: &'a str,
    language: &'a str,
    style: &'a str,
}

/// [`Renderer`] over an HTTP TTS provider.
pub struct TtsClient {
    client: reqwest::Client,
    config: TtsConfig,
}

impl TtsClient {
    pub fn new(config: TtsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Renderer for TtsClient {
    async fn render(&self, text: &str) -> Result<Vec<u8>> {
        let request = RenderRequest {
            text,
            language: &self.config.language,
            style: &self.config.style,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ExternalError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ExternalError::Empty);
        }
        Ok(bytes.to_vec())
    }
}
