// src/cli/mod.rs — CLI definition (clap derive)

pub mod chat;
pub mod play;
pub mod render;
pub mod sessions;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::infra::clock::SystemClock;
use crate::infra::config::{Config, StorageBackend};
use crate::session::SessionStore;
use crate::storage;

#[derive(Parser)]
#[command(name = "chronos", about = "Alternate-history simulator", version)]
pub struct Cli {
    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Simulation service root (overrides api.base_url)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Disable narration and cue sounds
    #[arg(long)]
    pub no_audio: bool,

    /// Keep sessions in memory only; nothing is written to disk
    #[arg(long)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive simulation (the default)
    Chat,
    /// List saved sessions, newest first
    Sessions,
    /// Print one session's transcript and world state
    Show {
        /// Session id
        id: String,
    },
    /// Delete a saved session
    Delete {
        /// Session id
        id: String,
    },
    /// Play a base64 PCM narration file to the end
    Play {
        /// File holding a base64 payload (a data URL prefix is allowed)
        file: PathBuf,
    },
}

impl Cli {
    /// Fold command-line overrides into the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref url) = self.api_url {
            config.api.base_url = url.clone();
        }
        if self.no_audio {
            config.audio.enabled = false;
        }
        if self.memory {
            config.storage.backend = StorageBackend::Memory;
        }
    }
}

/// Open the configured storage and the session store on top of it.
pub fn open_store(config: &Config) -> anyhow::Result<SessionStore> {
    let storage = storage::open(&config.storage)?;
    let store = SessionStore::open(storage, Arc::new(SystemClock))?;
    Ok(store)
}
