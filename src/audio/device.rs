// src/audio/device.rs — System sound output via rodio (feature "playback")

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use super::pcm::PcmBuffer;
use super::player::{AudioOutput, Voice};
use crate::infra::errors::ChronosError;

/// The default output device. The stream must outlive every sink.
pub struct RodioOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioOutput {
    pub fn try_default() -> Result<Self, ChronosError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| ChronosError::AudioDevice(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn start(&self, buffer: PcmBuffer) -> Result<Box<dyn Voice>, ChronosError> {
        let sink =
            Sink::try_new(&self.handle).map_err(|e| ChronosError::AudioDevice(e.to_string()))?;
        let channels = buffer.channels();
        let sample_rate = buffer.sample_rate();
        sink.append(SamplesBuffer::new(
            channels,
            sample_rate,
            buffer.into_samples(),
        ));
        Ok(Box::new(RodioVoice { sink }))
    }
}

struct RodioVoice {
    sink: Sink,
}

impl Voice for RodioVoice {
    fn stop(&mut self) -> Result<(), ChronosError> {
        self.sink.stop();
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn detach(self: Box<Self>) {
        self.sink.detach();
    }
}
