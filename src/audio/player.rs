// src/audio/player.rs — Output devices, playback handles, single-flight narration

use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::pcm::{self, PcmBuffer};
use super::tone;
use crate::infra::config::AudioConfig;
use crate::infra::errors::ChronosError;

/// A buffer that an output device is currently sounding.
pub trait Voice {
    /// Halt output. Devices may refuse a voice that already ended.
    fn stop(&mut self) -> Result<(), ChronosError>;

    /// True once the whole buffer has been played (or the voice was stopped).
    fn is_finished(&self) -> bool;

    /// Let the voice play out with nobody holding on to it.
    fn detach(self: Box<Self>);
}

/// The shared sound device.
pub trait AudioOutput {
    fn start(&self, buffer: PcmBuffer) -> Result<Box<dyn Voice>, ChronosError>;
}

/// A device that makes no sound but keeps time, so handles still finish.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentOutput;

struct SilentVoice {
    started: Instant,
    length: Duration,
    stopped: bool,
}

impl AudioOutput for SilentOutput {
    fn start(&self, buffer: PcmBuffer) -> Result<Box<dyn Voice>, ChronosError> {
        Ok(Box::new(SilentVoice {
            started: Instant::now(),
            length: buffer.duration(),
            stopped: false,
        }))
    }
}

impl Voice for SilentVoice {
    fn stop(&mut self) -> Result<(), ChronosError> {
        if self.stopped {
            return Err(ChronosError::AudioDevice("voice already stopped".into()));
        }
        self.stopped = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.stopped || self.started.elapsed() >= self.length
    }

    fn detach(self: Box<Self>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Finished,
    Stopped,
}

/// `Idle -> Playing -> (Finished | Stopped)`; never back to `Playing`.
pub struct PlaybackHandle {
    voice: Option<Box<dyn Voice>>,
    state: PlaybackState,
}

impl PlaybackHandle {
    pub fn idle() -> Self {
        Self {
            voice: None,
            state: PlaybackState::Idle,
        }
    }

    fn playing(voice: Box<dyn Voice>) -> Self {
        Self {
            voice: Some(voice),
            state: PlaybackState::Playing,
        }
    }

    pub fn state(&self) -> PlaybackState {
        match (&self.state, &self.voice) {
            (PlaybackState::Playing, Some(voice)) if voice.is_finished() => {
                PlaybackState::Finished
            }
            (state, _) => *state,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Stop if still playing. Anything else is a no-op, and a device
    /// complaining that the voice already ended is ignored.
    pub fn stop(&mut self) {
        if self.state() != PlaybackState::Playing {
            return;
        }
        if let Some(voice) = self.voice.as_mut() {
            if let Err(e) = voice.stop() {
                debug!("Ignoring failure while stopping playback: {e}");
            }
        }
        self.state = PlaybackState::Stopped;
    }
}

/// Stop a handle that may not exist.
pub fn stop(handle: Option<&mut PlaybackHandle>) {
    if let Some(handle) = handle {
        handle.stop();
    }
}

/// Narration player: at most one current handle, cues on the side.
pub struct AudioPlayer {
    output: Box<dyn AudioOutput>,
    enabled: bool,
    cues: bool,
    sample_rate: u32,
    current: Option<PlaybackHandle>,
}

impl AudioPlayer {
    pub fn new(output: Box<dyn AudioOutput>, config: &AudioConfig) -> Self {
        Self {
            output,
            enabled: config.enabled,
            cues: config.cues,
            sample_rate: config.sample_rate,
            current: None,
        }
    }

    /// Start a buffer immediately and hand back its handle.
    pub fn play(&self, buffer: PcmBuffer) -> Result<PlaybackHandle, ChronosError> {
        let voice = self.output.start(buffer)?;
        Ok(PlaybackHandle::playing(voice))
    }

    /// Decode and play a narration payload, replacing whatever was playing.
    pub fn play_audio(&mut self, payload: &str) -> Result<(), ChronosError> {
        if !self.enabled {
            return Ok(());
        }
        self.stop_audio();

        let bytes = pcm::decode(payload)?;
        let buffer = pcm::to_playable_buffer(&bytes, self.sample_rate);
        debug!(
            frames = buffer.frame_count(),
            seconds = buffer.duration().as_secs_f32(),
            "Playing narration"
        );
        self.current = Some(self.play(buffer)?);
        Ok(())
    }

    /// Stop and forget the current narration, if any.
    pub fn stop_audio(&mut self) {
        if let Some(mut handle) = self.current.take() {
            handle.stop();
        }
    }

    /// Fire-and-forget timeline cue. Never touches the narration handle.
    pub fn play_tick(&self, with_chaos: bool) {
        if !self.enabled || !self.cues {
            return;
        }
        let cue = tone::tick_cue(self.sample_rate, with_chaos);
        match self.output.start(cue) {
            Ok(voice) => voice.detach(),
            Err(e) => warn!("Cue playback failed: {e}"),
        }
    }

    pub fn current_state(&self) -> Option<PlaybackState> {
        self.current.as_ref().map(PlaybackHandle::state)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Swap the device, e.g. when audio started disabled and is turned on.
    /// Narration on the old device is stopped.
    pub fn replace_output(&mut self, output: Box<dyn AudioOutput>) {
        self.stop_audio();
        self.output = output;
    }

    /// Turning audio off silences the current narration.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.stop_audio();
        }
    }
}
