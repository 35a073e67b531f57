// src/client/mod.rs — Simulation service client

pub mod types;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::infra::config::ApiConfig;
use crate::infra::errors::ChronosError;
use crate::session::SimulationTurn;
pub use types::{
    history_from, AudioRequest, AudioResponse, ErrorBody, HistoryMessage, ImageRequest,
    ImageResponse, SimulationRequest, SimulationResponse,
};

/// Fallback when a failed response says nothing useful.
pub const GENERIC_ERROR: &str = "Something went wrong";

/// The remote simulation/image/audio service.
#[async_trait]
pub trait SimulationApi: Send + Sync {
    async fn simulate_turn(
        &self,
        request: SimulationRequest,
    ) -> Result<SimulationTurn, ChronosError>;

    /// Base64 narration audio, if the service produced any.
    async fn generate_audio(&self, narrative: &str) -> Result<Option<String>, ChronosError>;

    /// Base64 illustration, if the service produced any.
    async fn generate_image(
        &self,
        scenario_description: &str,
    ) -> Result<Option<String>, ChronosError>;
}

pub struct HttpSimulationClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSimulationClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ChronosError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ChronosError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: format!("{}/api", config.base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ChronosError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned + Send,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ChronosError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ChronosError::Api {
                status: status.as_u16(),
                message: error_message(status, &error_body),
            });
        }

        response.json::<R>().await.map_err(|e| ChronosError::Api {
            status: status.as_u16(),
            message: format!("Failed to parse response: {e}"),
        })
    }
}

#[async_trait]
impl SimulationApi for HttpSimulationClient {
    async fn simulate_turn(
        &self,
        request: SimulationRequest,
    ) -> Result<SimulationTurn, ChronosError> {
        self.post("simulate-turn", &request).await
    }

    async fn generate_audio(&self, narrative: &str) -> Result<Option<String>, ChronosError> {
        let body = AudioRequest {
            narrative: narrative.to_string(),
        };
        let resp: AudioResponse = self.post("generate-audio", &body).await?;
        Ok(resp.audio.filter(|a| !a.is_empty()))
    }

    async fn generate_image(
        &self,
        scenario_description: &str,
    ) -> Result<Option<String>, ChronosError> {
        let body = ImageRequest {
            scenario_description: scenario_description.to_string(),
        };
        let resp: ImageResponse = self.post("generate-image", &body).await?;
        Ok(resp.image.filter(|i| !i.is_empty()))
    }
}

/// Best human-readable message for a failed response: the body's `error`,
/// then its `detail`, then the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(error) = parsed.error.filter(|e| !e.trim().is_empty()) {
            return error;
        }
        match parsed.detail {
            Some(serde_json::Value::String(detail)) if !detail.trim().is_empty() => {
                return detail
            }
            Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) | None => {}
            Some(other) => return other.to_string(),
        }
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_ERROR.to_string())
}
