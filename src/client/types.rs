// src/client/types.rs — Wire types for the simulation service

use serde::{Deserialize, Serialize};

use crate::session::{ChatMessage, Role, SimulationTurn, WorldState};

/// Conversation entry as the service wants it: no ids, no timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

/// The transcript minus system notices.
pub fn history_from(messages: &[ChatMessage]) -> Vec<HistoryMessage> {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| HistoryMessage {
            role: m.role,
            content: m.content.clone(),
        })
        .collect()
}

/// `POST /simulate-turn`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub input: String,
    pub history: Vec<HistoryMessage>,
    pub current_state: Option<WorldState>,
}

pub type SimulationResponse = SimulationTurn;

/// `POST /generate-audio`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioRequest {
    pub narrative: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioResponse {
    #[serde(default)]
    pub audio: Option<String>,
}

/// `POST /generate-image`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub scenario_description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub image: Option<String>,
}

/// Error payloads: `{"error": "..."}`, or the framework's `{"detail": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}
