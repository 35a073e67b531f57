// src/audio/tone.rs — Synthetic cue sounds
//
// The tick is a short falling sine chirp; the chaos layer is a slower rising
// square sweep that fades out. Both are rendered up front into a buffer.

use std::time::Duration;

use super::pcm::PcmBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
}

impl Waveform {
    /// Value at `phase`, measured in cycles (0.0..1.0).
    fn sample(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => (std::f64::consts::TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ramp {
    Linear,
    Exponential,
}

impl Ramp {
    /// Interpolate from `from` to `to` at position `t` in 0..=1.
    fn at(self, from: f64, to: f64, t: f64) -> f64 {
        match self {
            // Exponential ramps are undefined through zero.
            Ramp::Exponential if from > 0.0 && to > 0.0 => from * (to / from).powf(t),
            _ => from + (to - from) * t,
        }
    }
}

/// A frequency sweep with its own gain envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub waveform: Waveform,
    pub start_hz: f64,
    pub end_hz: f64,
    pub frequency_ramp: Ramp,
    pub start_gain: f64,
    pub end_gain: f64,
    pub gain_ramp: Ramp,
    pub duration: Duration,
}

pub const TICK: Sweep = Sweep {
    waveform: Waveform::Sine,
    start_hz: 1200.0,
    end_hz: 100.0,
    frequency_ramp: Ramp::Exponential,
    start_gain: 0.1,
    end_gain: 0.01,
    gain_ramp: Ramp::Exponential,
    duration: Duration::from_millis(100),
};

pub const CHAOS: Sweep = Sweep {
    waveform: Waveform::Square,
    start_hz: 80.0,
    end_hz: 400.0,
    frequency_ramp: Ramp::Exponential,
    start_gain: 0.05,
    end_gain: 0.0,
    gain_ramp: Ramp::Linear,
    duration: Duration::from_millis(800),
};

impl Sweep {
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let rate = f64::from(sample_rate);
        let total = (self.duration.as_secs_f64() * rate).round() as usize;
        let mut phase = 0.0_f64;

        (0..total)
            .map(|i| {
                let t = i as f64 / total as f64;
                let hz = self.frequency_ramp.at(self.start_hz, self.end_hz, t);
                let gain = self.gain_ramp.at(self.start_gain, self.end_gain, t);
                let value = self.waveform.sample(phase) * gain;
                phase = (phase + hz / rate).fract();
                value as f32
            })
            .collect()
    }
}

/// Sum several renders sample by sample; the result is as long as the longest.
pub fn mix(layers: &[Vec<f32>]) -> Vec<f32> {
    let len = layers.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = vec![0.0_f32; len];
    for layer in layers {
        for (acc, s) in out.iter_mut().zip(layer) {
            *acc += s;
        }
    }
    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

/// The timeline-jump cue, optionally with the chaos sweep underneath.
pub fn tick_cue(sample_rate: u32, with_chaos: bool) -> PcmBuffer {
    let mut layers = vec![TICK.render(sample_rate)];
    if with_chaos {
        layers.push(CHAOS.render(sample_rate));
    }
    PcmBuffer::mono(sample_rate, mix(&layers))
}
