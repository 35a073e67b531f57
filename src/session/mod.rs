// src/session/mod.rs — Simulation sessions and their local persistence

pub mod store;
pub mod types;

pub use store::{ActiveSession, SessionStore};
pub use types::{
    ChatMessage, HistoryPoint, Role, SessionMetadata, SimulationSession, SimulationTurn,
    WorldState,
};
