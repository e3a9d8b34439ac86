// HTTP client for the remote inference service
use crate::application::inference_trigger::{InferenceClient, InferenceError};
use crate::domain::inference::InferenceResponse;
use crate::infrastructure::config::InferenceApiSettings;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    client: reqwest::Client,
    url: String,
}

impl HttpInferenceClient {
    pub fn new(settings: &InferenceApiSettings) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: settings.url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn run_inference(&self) -> Result<InferenceResponse, InferenceError> {
        tracing::debug!("POST {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(InferenceError::status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| InferenceError::Malformed(e.to_string()))
    }
}
