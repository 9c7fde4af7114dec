//! Music system
//!
//! A look-ahead step-sequencer that emits `Tone`s against an audio clock,
//! plus one-shot effects for gameplay events.
//! The clock and the synth live behind `ToneSink`, so the sequencer runs the
//! same against Web Audio in the browser and a recording sink in tests.

pub mod effects;
pub mod patterns;
pub mod sequencer;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use effects::SoundEffect;
pub use patterns::{DEATH_PATTERNS, MusicPattern, NORMAL_PATTERNS, PatternKind};
pub use sequencer::Sequencer;
#[cfg(target_arch = "wasm32")]
pub use web::WebAudioSink;

/// Oscillator shape for a tone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Square,
    Triangle,
    Sawtooth,
    Sine,
}

/// One scheduled note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Hz
    pub freq: f32,
    /// Absolute audio-clock time (seconds) the tone starts at
    pub start: f64,
    /// Seconds until the envelope has decayed
    pub duration: f64,
    pub waveform: Waveform,
    /// Peak envelope gain
    pub gain: f32,
}

/// Audio backend the sequencer schedules into.
///
/// Tones are fire-and-forget: once handed over they are never cancelled.
pub trait ToneSink {
    /// Current audio-clock time, or `None` when audio is unavailable
    fn current_time(&self) -> Option<f64>;

    /// Schedule a tone at `tone.start`
    fn play_tone(&mut self, tone: &Tone);

    /// Output gain applied after every tone (0 silences)
    fn set_master_gain(&mut self, gain: f32);

    /// Unlock the audio clock (browsers require a user gesture)
    fn resume(&mut self) {}
}

/// Sink with no audio device; music is simply disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl ToneSink for SilentSink {
    fn current_time(&self) -> Option<f64> {
        None
    }

    fn play_tone(&mut self, _tone: &Tone) {}

    fn set_master_gain(&mut self, _gain: f32) {}
}

/// Sink that records every tone against a hand-driven clock
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingSink {
    pub time: f64,
    pub tones: Vec<Tone>,
    pub master_gain: f32,
    pub resumed: bool,
}

#[cfg(test)]
impl ToneSink for RecordingSink {
    fn current_time(&self) -> Option<f64> {
        Some(self.time)
    }

    fn play_tone(&mut self, tone: &Tone) {
        self.tones.push(*tone);
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain;
    }

    fn resume(&mut self) {
        self.resumed = true;
    }
}
