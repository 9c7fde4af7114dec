//! Web Audio backend
//!
//! The `AudioContext` is created lazily on the first `resume` (a user
//! gesture); until then the clock reads `None` and nothing is scheduled.
//! Every node operation is best-effort: a failure drops that tone.

use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

use super::{Tone, ToneSink, Waveform};

/// Tone sink that plays through the browser's audio graph
pub struct WebAudioSink {
    ctx: Option<AudioContext>,
    master: Option<GainNode>,
    master_gain: f32,
    failed: bool,
}

impl WebAudioSink {
    pub fn new(master_gain: f32) -> Self {
        Self {
            ctx: None,
            master: None,
            master_gain,
            failed: false,
        }
    }

    fn ensure_context(&mut self) {
        if self.ctx.is_some() || self.failed {
            return;
        }
        let Ok(ctx) = AudioContext::new() else {
            log::warn!("Failed to create AudioContext - music disabled");
            self.failed = true;
            return;
        };

        let master = ctx.create_gain().ok().and_then(|gain| {
            gain.gain().set_value(self.master_gain);
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some(gain)
        });
        if master.is_none() {
            log::warn!("Failed to create master gain - music disabled");
            self.failed = true;
            return;
        }

        log::info!("AudioContext created");
        self.ctx = Some(ctx);
        self.master = master;
    }

    /// Oscillator routed through a per-tone gain into the master bus
    fn create_osc(
        ctx: &AudioContext,
        master: &GainNode,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(master).ok()?;

        Some((osc, gain))
    }
}

fn oscillator_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Square => OscillatorType::Square,
        Waveform::Triangle => OscillatorType::Triangle,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
        Waveform::Sine => OscillatorType::Sine,
    }
}

impl ToneSink for WebAudioSink {
    fn current_time(&self) -> Option<f64> {
        self.ctx.as_ref().map(|ctx| ctx.current_time())
    }

    fn play_tone(&mut self, tone: &Tone) {
        let (Some(ctx), Some(master)) = (&self.ctx, &self.master) else {
            return;
        };
        let Some((osc, gain)) =
            Self::create_osc(ctx, master, tone.freq, oscillator_type(tone.waveform))
        else {
            return;
        };
        let t = tone.start;

        // 10ms attack, exponential decay to silence by `duration`
        osc.frequency().set_value_at_time(tone.freq, t).ok();
        gain.gain().set_value_at_time(0.0001, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(tone.gain.max(0.0001), t + 0.01)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.0001, t + tone.duration)
            .ok();

        osc.start_with_when(t).ok();
        osc.stop_with_when(t + tone.duration + 0.02).ok();
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain;
        if let Some(master) = &self.master {
            master.gain().set_value(gain);
        }
    }

    fn resume(&mut self) {
        self.ensure_context();
        if let Some(ctx) = &self.ctx {
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }
}
