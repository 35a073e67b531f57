// src/cli/play.rs — `chronos play <file>`

use anyhow::Context;
use std::path::Path;
use std::time::Duration;

use crate::audio::{self, pcm, AudioOutput, AudioPlayer, PlaybackState, SilentOutput};
use crate::infra::config::Config;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Decode a narration payload from disk and block until it has played.
pub async fn run_play(config: &Config, file: &Path) -> anyhow::Result<()> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let bytes = pcm::decode(payload.trim())?;
    let buffer = pcm::to_playable_buffer(&bytes, config.audio.sample_rate);
    let length = buffer.duration();
    eprintln!(
        "Playing {} ({:.1}s at {} Hz)",
        file.display(),
        length.as_secs_f32(),
        buffer.sample_rate()
    );

    let output: Box<dyn AudioOutput> = if config.audio.enabled {
        audio::default_output()
    } else {
        Box::new(SilentOutput)
    };
    let player = AudioPlayer::new(output, &config.audio);
    let handle = player.play(buffer)?;
    while handle.state() == PlaybackState::Playing {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    Ok(())
}
