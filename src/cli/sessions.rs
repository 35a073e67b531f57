// src/cli/sessions.rs — `chronos sessions | show | delete`
//
// Listing and showing read storage directly so they never create a session
// as a side effect of looking.

use anyhow::{bail, Context};
use tracing::info;

use super::render;
use crate::infra::config::Config;
use crate::session::store::{record_key, METADATA_KEY};
use crate::session::{SessionMetadata, SimulationSession};
use crate::storage::{self, KeyValueStore};

/// The stored index, or an empty list when none was ever written.
pub fn read_index(storage: &dyn KeyValueStore) -> anyhow::Result<Vec<SessionMetadata>> {
    match storage.get_item(METADATA_KEY)? {
        Some(raw) => serde_json::from_str(&raw).context("session index is not valid JSON"),
        None => Ok(Vec::new()),
    }
}

pub fn read_session(
    storage: &dyn KeyValueStore,
    id: &str,
) -> anyhow::Result<Option<SimulationSession>> {
    match storage.get_item(&record_key(id))? {
        Some(raw) => {
            let session = serde_json::from_str(&raw)
                .with_context(|| format!("session {id} is not valid JSON"))?;
            Ok(Some(session))
        }
        None => Ok(None),
    }
}

pub fn run_list(config: &Config) -> anyhow::Result<()> {
    let storage = storage::open(&config.storage)?;
    let sessions = read_index(storage.as_ref())?;
    print!("{}", render::session_list(&sessions, None));
    Ok(())
}

pub fn run_show(config: &Config, id: &str) -> anyhow::Result<()> {
    let storage = storage::open(&config.storage)?;
    let Some(session) = read_session(storage.as_ref(), id)? else {
        bail!("No session with id {id}");
    };

    println!("{} ({})", session.metadata.title, session.metadata.id);
    println!(
        "Last updated {}\n",
        render::format_millis(session.metadata.last_updated)
    );
    print!("{}", render::transcript(&session.messages));

    if let Some(ref world) = session.world_state {
        println!("World state:");
        print!("{}", render::world_state(world));
    }
    if !session.history_points.is_empty() {
        println!("Timeline:");
        print!("{}", render::timeline(&session.history_points));
    }
    if session.background_image.is_some() {
        println!("(illustration attached)");
    }
    Ok(())
}

/// Works on raw storage so a record that no longer parses can still be removed.
pub fn run_delete(config: &Config, id: &str) -> anyhow::Result<()> {
    let storage = storage::open(&config.storage)?;
    delete_session(storage.as_ref(), id)?;
    println!("Deleted session {id}");
    Ok(())
}

/// Drop a record and its index entry. Fails when neither exists.
pub fn delete_session(storage: &dyn KeyValueStore, id: &str) -> anyhow::Result<()> {
    let key = record_key(id);
    let mut index = read_index(storage)?;
    let indexed = index.iter().any(|s| s.id == id);
    if storage.get_item(&key)?.is_none() && !indexed {
        bail!("No session with id {id}");
    }

    storage.remove_item(&key)?;
    if indexed {
        index.retain(|s| s.id != id);
        storage.set_item(METADATA_KEY, &serde_json::to_string(&index)?)?;
    }
    info!(id, "Deleted session");
    Ok(())
}
