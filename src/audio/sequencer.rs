//! Look-ahead step sequencer
//!
//! Called once per frame. Each call schedules every step whose start time
//! falls inside `[now, now + look_ahead)` at its exact audio-clock time, so
//! frame jitter never shows up as timing drift. A stalled frame catches up:
//! every step it missed is still scheduled, once each. Only unmuting skips
//! ahead, in whole steps, so the loop does not burst back in.

use rand::Rng;

use super::patterns::{self, MusicPattern, PatternKind};
use super::{Tone, ToneSink, Waveform};
use crate::tuning::{MusicRestorePolicy, MusicTuning};

/// Steps per pattern loop
pub const STEPS: u32 = 16;
/// Gap before the death pattern's first step
pub const DEATH_RESTART_DELAY: f64 = 0.05;

const HAT_FREQ: f32 = 6000.0;
const HAT_LENGTH: f64 = 0.03;

/// Descending sting layered over the death pattern
const STING_NOTES: [f32; 4] = [440.0, 330.0, 247.0, 165.0];
const STING_SPACING: f64 = 0.14;
const STING_LENGTH: f64 = 0.22;
const STING_GAIN: f32 = 0.10;

/// Music sequencer state for one page lifetime (outlives game sessions)
#[derive(Debug)]
pub struct Sequencer {
    pattern: &'static MusicPattern,
    /// Normal pattern interrupted by a death
    saved: Option<&'static MusicPattern>,
    step: u32,
    next_step_time: f64,
    look_ahead: f64,
    start_delay: f64,
    master_gain: f32,
    volume: f32,
    policy: MusicRestorePolicy,
    started: bool,
    muted: bool,
}

impl Sequencer {
    pub fn new(tuning: &MusicTuning) -> Self {
        Self {
            pattern: &patterns::NORMAL_PATTERNS[0],
            saved: None,
            step: 0,
            next_step_time: 0.0,
            look_ahead: tuning.look_ahead.max(0.0),
            start_delay: tuning.start_delay.max(0.0),
            master_gain: tuning.master_gain.max(0.0),
            volume: 1.0,
            policy: tuning.restore_policy,
            started: false,
            muted: false,
        }
    }

    pub fn pattern(&self) -> &'static MusicPattern {
        self.pattern
    }

    pub fn saved_pattern(&self) -> Option<&'static MusicPattern> {
        self.saved
    }

    /// Absolute index of the next unscheduled step
    pub fn step_index(&self) -> u32 {
        self.step
    }

    pub fn next_step_time(&self) -> f64 {
        self.next_step_time
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Started and audible: the only state in which steps are scheduled
    pub fn is_active(&self) -> bool {
        self.started && !self.muted
    }

    /// Gain the sink's master node should carry right now
    pub fn output_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_gain * self.volume
        }
    }

    /// Unlock the sink and start the loop shortly after `now`.
    ///
    /// Returns false when audio is unavailable. Safe to call repeatedly.
    pub fn start<S: ToneSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        if self.started {
            return true;
        }
        sink.resume();
        let Some(now) = sink.current_time() else {
            log::warn!("Audio unavailable, music disabled");
            return false;
        };
        sink.set_master_gain(self.output_gain());
        self.start_at(now + self.start_delay);
        log::info!("Music started: {}", self.pattern.name);
        true
    }

    /// Start with the first step at an explicit clock time
    pub fn start_at(&mut self, first_step: f64) {
        self.started = true;
        self.step = 0;
        self.next_step_time = first_step;
    }

    pub fn set_muted<S: ToneSink + ?Sized>(&mut self, sink: &mut S, muted: bool) {
        let unmuting = self.muted && !muted;
        self.muted = muted;
        sink.set_master_gain(self.output_gain());
        log::info!("Music {}", if muted { "muted" } else { "unmuted" });
        if unmuting {
            if let Some(now) = sink.current_time() {
                self.resync(now);
            }
        }
    }

    /// Jump past steps that fell behind `now`, keeping the loop phase
    fn resync(&mut self, now: f64) {
        if self.next_step_time >= now {
            return;
        }
        let step_dur = self.pattern.step_duration();
        let missed = ((now - self.next_step_time) / step_dur).ceil();
        self.next_step_time += missed * step_dur;
        // Only the position within 16 steps matters
        self.step = self
            .step
            .wrapping_add((missed as u64 % STEPS as u64) as u32);
        log::debug!("Sequencer resynced past {missed} missed steps");
    }

    /// Music volume multiplier (0-1) on top of the master gain
    pub fn set_volume<S: ToneSink + ?Sized>(&mut self, sink: &mut S, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        sink.set_master_gain(self.output_gain());
    }

    /// Schedule every step inside the look-ahead window.
    ///
    /// Returns the number of steps scheduled.
    pub fn schedule<S: ToneSink + ?Sized>(&mut self, sink: &mut S) -> u32 {
        if !self.is_active() {
            return 0;
        }
        let Some(now) = sink.current_time() else {
            return 0;
        };

        let step_dur = self.pattern.step_duration();
        let mut scheduled = 0;
        while self.next_step_time < now + self.look_ahead {
            self.emit_step(sink, self.next_step_time, step_dur);
            self.next_step_time += step_dur;
            self.step = self.step.wrapping_add(1);
            scheduled += 1;
        }
        scheduled
    }

    fn emit_step<S: ToneSink + ?Sized>(&self, sink: &mut S, t: f64, step_dur: f64) {
        let s = (self.step % STEPS) as usize;
        let p = self.pattern;

        if s % 2 == 0 && p.bass[s] > 0.0 {
            sink.play_tone(&Tone {
                freq: p.bass[s],
                start: t,
                duration: step_dur * 0.95,
                waveform: Waveform::Square,
                gain: 0.12,
            });
        }
        if p.arp[s] > 0.0 {
            sink.play_tone(&Tone {
                freq: p.arp[s],
                start: t,
                duration: step_dur * 0.60,
                waveform: Waveform::Square,
                gain: 0.06,
            });
        }
        if p.hat[s] {
            sink.play_tone(&Tone {
                freq: HAT_FREQ,
                start: t,
                duration: HAT_LENGTH,
                waveform: Waveform::Square,
                gain: 0.02,
            });
        }
        if let Some(freq) = p.lead[s] {
            sink.play_tone(&Tone {
                freq,
                start: t,
                duration: step_dur * 1.5,
                waveform: Waveform::Triangle,
                gain: 0.05,
            });
        }
    }

    /// Swap to a random death pattern and play the sting
    pub fn on_player_death<S, R>(&mut self, sink: &mut S, rng: &mut R)
    where
        S: ToneSink + ?Sized,
        R: Rng + ?Sized,
    {
        if self.pattern.kind == PatternKind::Normal {
            self.saved = Some(self.pattern);
        }
        self.pattern = patterns::random_pattern(PatternKind::Death, rng);
        self.step = 0;
        log::info!("Music: death pattern {}", self.pattern.name);

        let Some(now) = sink.current_time() else {
            return;
        };
        self.next_step_time = now + DEATH_RESTART_DELAY;

        if !self.is_active() {
            return;
        }
        for (i, freq) in STING_NOTES.iter().enumerate() {
            sink.play_tone(&Tone {
                freq: *freq,
                start: now + i as f64 * STING_SPACING,
                duration: STING_LENGTH,
                waveform: Waveform::Sawtooth,
                gain: STING_GAIN,
            });
        }
    }

    /// A new game session began.
    ///
    /// With no interrupted track to deal with, a fresh normal loop is drawn;
    /// otherwise the restore policy decides.
    pub fn on_session_start<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.pattern.kind == PatternKind::Normal && self.saved.is_none() {
            self.pattern = patterns::random_pattern(PatternKind::Normal, rng);
            self.step = 0;
            log::info!("Music: {}", self.pattern.name);
            return;
        }
        match self.policy {
            MusicRestorePolicy::RestoreOnRestart => {
                if self.restore_saved() {
                    log::info!("Music restored: {}", self.pattern.name);
                }
            }
            MusicRestorePolicy::KeepDeathTrack => {
                if self.pattern.kind == PatternKind::Death {
                    log::debug!("Keeping death pattern {}", self.pattern.name);
                }
            }
        }
    }

    /// Swap back to the pattern interrupted by a death. Returns false if none.
    pub fn restore_saved(&mut self) -> bool {
        match self.saved.take() {
            Some(pattern) => {
                self.pattern = pattern;
                self.step = 0;
                true
            }
            None => false,
        }
    }

    /// Explicitly choose a pattern; forgets any saved one
    pub fn select_pattern(&mut self, pattern: &'static MusicPattern) {
        self.pattern = pattern;
        self.saved = None;
        self.step = 0;
        log::info!("Music: selected {}", pattern.name);
    }
}
