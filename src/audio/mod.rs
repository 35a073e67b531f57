// src/audio/mod.rs — Narration playback and cue sounds

#[cfg(feature = "playback")]
pub mod device;
pub mod pcm;
pub mod player;
pub mod tone;

pub use pcm::{decode, to_playable_buffer, PcmBuffer, DEFAULT_SAMPLE_RATE};
pub use player::{AudioOutput, AudioPlayer, PlaybackHandle, PlaybackState, SilentOutput, Voice};

/// The best output available in this build: the system device when compiled
/// with `playback` and one can be opened, otherwise a silent stand-in.
pub fn default_output() -> Box<dyn AudioOutput> {
    #[cfg(feature = "playback")]
    {
        match device::RodioOutput::try_default() {
            Ok(output) => return Box::new(output),
            Err(e) => tracing::warn!("No audio device, narration will be silent: {e}"),
        }
    }
    tracing::debug!("Using silent audio output");
    Box::new(SilentOutput)
}
