// src/session/types.rs — Session records as persisted and exchanged

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Listing entry for one session. Lives in the session index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub id: String,
    pub title: String,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
    pub year: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Ai => "ai",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// Snapshot of the simulated world. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub year: i64,
    #[serde(deserialize_with = "percent")]
    pub chaos_level: u8,
    pub deviations: Vec<String>,
    pub population_mood: String,
    #[serde(deserialize_with = "percent")]
    pub geopolitical_stability: u8,
}

impl WorldState {
    /// Drop repeated deviations, keeping the first occurrence of each.
    pub fn normalized(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.deviations.retain(|d| seen.insert(d.clone()));
        self
    }
}

/// Accepts any number and clamps it into 0..=100.
fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

/// One sample of the chaos-over-time chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub year: i64,
    pub chaos: u8,
}

/// What the simulation service hands back for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTurn {
    pub narrative: String,
    pub world_state_update: WorldState,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
}

/// Full persisted record for one divergence timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSession {
    pub metadata: SessionMetadata,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub world_state: Option<WorldState>,
    #[serde(default)]
    pub history_points: Vec<HistoryPoint>,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
    #[serde(default)]
    pub background_image: Option<String>,
}
