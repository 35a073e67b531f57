// src/session/store.rs — Session index + per-session records over a KeyValueStore
//
// Layout in storage:
//   chronos_sessions_list   JSON array of SessionMetadata, newest first
//   chronos_session_<id>    JSON SimulationSession
//
// Every id in the index has a record and every record has an index entry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{
    ChatMessage, HistoryPoint, Role, SessionMetadata, SimulationSession, SimulationTurn,
    WorldState,
};
use crate::infra::clock::Clock;
use crate::infra::errors::ChronosError;
use crate::storage::KeyValueStore;
use crate::util::ellipsize;

pub const STORAGE_KEY_PREFIX: &str = "chronos_session_";
pub const METADATA_KEY: &str = "chronos_sessions_list";

pub const NEW_SESSION_TITLE: &str = "New Chronicle";
pub const EMPTY_SESSION_TITLE: &str = "Empty Chronicle";
pub const TITLE_MAX_CHARS: usize = 30;

/// Storage key of one session record.
pub fn record_key(id: &str) -> String {
    format!("{STORAGE_KEY_PREFIX}{id}")
}

/// The in-memory copy of the session being played.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSession {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub world_state: Option<WorldState>,
    pub history_points: Vec<HistoryPoint>,
    pub suggested_actions: Vec<String>,
    pub background_image: Option<String>,
}

impl ActiveSession {
    fn empty(id: String) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// First message cut to 30 characters, or the placeholder.
    pub fn title(&self) -> String {
        match self.messages.first() {
            Some(first) => ellipsize(&first.content, TITLE_MAX_CHARS),
            None => EMPTY_SESSION_TITLE.to_string(),
        }
    }

    pub fn year(&self) -> i64 {
        self.world_state.as_ref().map(|w| w.year).unwrap_or(0)
    }
}

impl From<SimulationSession> for ActiveSession {
    fn from(session: SimulationSession) -> Self {
        Self {
            id: session.metadata.id,
            messages: session.messages,
            world_state: session.world_state,
            history_points: session.history_points,
            suggested_actions: session.suggested_actions,
            background_image: session.background_image,
        }
    }
}

/// Borrowed view used to write a record without cloning the transcript.
#[derive(Serialize)]
struct SessionRecord<'a> {
    metadata: &'a SessionMetadata,
    messages: &'a [ChatMessage],
    world_state: Option<&'a WorldState>,
    history_points: &'a [HistoryPoint],
    suggested_actions: &'a [String],
    background_image: Option<&'a str>,
}

impl<'a> SessionRecord<'a> {
    fn new(metadata: &'a SessionMetadata, active: &'a ActiveSession) -> Self {
        Self {
            metadata,
            messages: &active.messages,
            world_state: active.world_state.as_ref(),
            history_points: &active.history_points,
            suggested_actions: &active.suggested_actions,
            background_image: active.background_image.as_deref(),
        }
    }
}

/// Owns the session index, the active session and the storage behind both.
pub struct SessionStore {
    storage: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    sessions: Vec<SessionMetadata>,
    active: ActiveSession,
}

impl SessionStore {
    /// Read the index and activate its newest session, creating one when
    /// there is nothing to resume.
    pub fn open(
        storage: Box<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ChronosError> {
        let sessions = match storage.get_item(METADATA_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        let mut store = Self {
            storage,
            clock,
            sessions,
            active: ActiveSession::default(),
        };
        store.reconcile()?;

        let head = store.sessions.first().map(|s| s.id.clone());
        let resumed = match head {
            Some(id) => store.load(&id)?,
            None => false,
        };
        if !resumed {
            store.create()?;
        }

        Ok(store)
    }

    /// Start a fresh, empty session and make it active.
    pub fn create(&mut self) -> Result<SessionMetadata, ChronosError> {
        let now = self.clock.now_millis();
        let mut stamp = now;
        while self.sessions.iter().any(|s| s.id == stamp.to_string()) {
            stamp += 1;
        }

        let metadata = SessionMetadata {
            id: stamp.to_string(),
            title: NEW_SESSION_TITLE.to_string(),
            last_updated: now,
            year: 0,
        };

        self.active = ActiveSession::empty(metadata.id.clone());
        self.write_record(&metadata)?;
        self.sessions.insert(0, metadata.clone());
        self.write_index()?;

        info!(id = %metadata.id, "Created session");
        Ok(metadata)
    }

    /// Replace the active session with the stored one. `Ok(false)` when no
    /// record exists; a record that does not parse is an error.
    pub fn load(&mut self, id: &str) -> Result<bool, ChronosError> {
        let Some(record) = self.read(id)? else {
            debug!(id, "No stored record, nothing to load");
            return Ok(false);
        };

        let mut active = ActiveSession::from(record);
        active.id = id.to_string();
        self.active = active;

        debug!(id, messages = self.active.messages.len(), "Loaded session");
        Ok(true)
    }

    /// Remove a session's record and index entry. Deleting the active session
    /// falls back to the newest remaining one, or a new empty session.
    pub fn delete(&mut self, id: &str) -> Result<(), ChronosError> {
        self.storage.remove_item(&record_key(id))?;
        self.sessions.retain(|s| s.id != id);
        self.write_index()?;
        info!(id, "Deleted session");

        if self.active.id == id {
            let head = self.sessions.first().map(|s| s.id.clone());
            let loaded = match head {
                Some(next) => self.load(&next)?,
                None => false,
            };
            if !loaded {
                self.create()?;
            }
        }
        Ok(())
    }

    /// Write the active session's record. The index is only rewritten when the
    /// title or timestamp moved; returns whether it was.
    pub fn persist(&mut self) -> Result<bool, ChronosError> {
        let metadata = SessionMetadata {
            id: self.active.id.clone(),
            title: self.active.title(),
            last_updated: self.clock.now_millis(),
            year: self.active.year(),
        };
        self.write_record(&metadata)?;

        let existing = self.sessions.iter().position(|s| s.id == metadata.id);
        let changed = match existing {
            Some(i) => {
                let current = &self.sessions[i];
                current.last_updated != metadata.last_updated || current.title != metadata.title
            }
            None => true,
        };
        if !changed {
            debug!(id = %metadata.id, "Index unchanged, skipping write");
            return Ok(false);
        }

        match existing {
            Some(i) => self.sessions[i] = metadata,
            None => self.sessions.push(metadata),
        }
        self.sort_index();
        self.write_index()?;
        Ok(true)
    }

    /// Append the player's message and clear stale suggestions.
    pub fn record_user_message(&mut self, text: &str) -> Result<ChatMessage, ChronosError> {
        let message = ChatMessage::new(Role::User, text, self.now());
        self.active.messages.push(message.clone());
        self.active.suggested_actions.clear();
        self.persist()?;
        Ok(message)
    }

    /// Fold one simulation turn into the active session.
    pub fn apply_turn(&mut self, turn: &SimulationTurn) -> Result<HistoryPoint, ChronosError> {
        let world = turn.world_state_update.clone().normalized();
        let point = HistoryPoint {
            year: world.year,
            chaos: world.chaos_level,
        };

        let narrative = ChatMessage::new(Role::Ai, turn.narrative.as_str(), self.now());
        self.active.messages.push(narrative);
        self.active.world_state = Some(world);
        self.active.suggested_actions = turn.suggested_actions.clone();
        self.active.history_points.push(point);

        self.persist()?;
        Ok(point)
    }

    /// Attach a generated image to `session_id`. The session may no longer be
    /// active by the time generation finishes; its stored record is updated
    /// instead. Returns false when the session is gone.
    pub fn set_background_image(
        &mut self,
        session_id: &str,
        image: String,
    ) -> Result<bool, ChronosError> {
        if self.active.id == session_id {
            self.active.background_image = Some(image);
            self.persist()?;
            return Ok(true);
        }

        let Some(mut record) = self.read(session_id)? else {
            return Ok(false);
        };
        record.background_image = Some(image);
        record.metadata.id = session_id.to_string();
        record.metadata.last_updated = self.clock.now_millis();
        let raw = serde_json::to_string(&record)?;
        self.storage.set_item(&record_key(session_id), &raw)?;

        match self.sessions.iter_mut().find(|s| s.id == session_id) {
            Some(entry) => *entry = record.metadata,
            None => self.sessions.push(record.metadata),
        }
        self.sort_index();
        self.write_index()?;
        Ok(true)
    }

    /// Read a stored session without activating it.
    pub fn read(&self, id: &str) -> Result<Option<SimulationSession>, ChronosError> {
        match self.storage.get_item(&record_key(id))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn sessions(&self) -> &[SessionMetadata] {
        &self.sessions
    }

    pub fn active(&self) -> &ActiveSession {
        &self.active
    }

    pub fn active_id(&self) -> &str {
        &self.active.id
    }

    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    // -- internals --

    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.clock.now_millis()).unwrap_or_else(Utc::now)
    }

    fn write_record(&self, metadata: &SessionMetadata) -> Result<(), ChronosError> {
        let raw = serde_json::to_string(&SessionRecord::new(metadata, &self.active))?;
        self.storage.set_item(&record_key(&metadata.id), &raw)
    }

    fn write_index(&self) -> Result<(), ChronosError> {
        let raw = serde_json::to_string(&self.sessions)?;
        self.storage.set_item(METADATA_KEY, &raw)
    }

    /// Repair an index that drifted from the records, e.g. after a crash
    /// between the two writes of a create or delete.
    fn reconcile(&mut self) -> Result<(), ChronosError> {
        let record_ids: Vec<String> = self
            .storage
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(STORAGE_KEY_PREFIX).map(str::to_string))
            .collect();

        let before = self.sessions.len();
        let mut seen = HashSet::new();
        self.sessions
            .retain(|s| record_ids.contains(&s.id) && seen.insert(s.id.clone()));
        let mut changed = self.sessions.len() != before;
        if changed {
            warn!(
                dropped = before - self.sessions.len(),
                "Dropped index entries without a session record"
            );
        }

        for id in &record_ids {
            if seen.contains(id) {
                continue;
            }
            let record = match self.read(id) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(id = %id, "Skipping unreadable session record: {e}");
                    continue;
                }
            };
            warn!(id = %id, "Re-indexing session record missing from the index");
            let mut metadata = record.metadata;
            metadata.id = id.clone();
            self.sessions.push(metadata);
            changed = true;
        }

        if changed {
            self.sort_index();
            self.write_index()?;
        }
        Ok(())
    }

    fn sort_index(&mut self) {
        self.sessions
            .sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    }
}
