//! One-shot sound effects
//!
//! Short procedural blips for gameplay events, played through the same
//! `ToneSink` as the music so they share its master gain and mute.

use super::{Tone, ToneSink, Waveform};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// A new wave begins
    WaveStart,
    /// Player bullet fired
    Shot,
    /// Player bullet fired as a crit
    CritShot,
    /// Enemy destroyed
    EnemyDown,
    /// Player took damage
    PlayerHit,
    /// Upgrade card applied
    Upgrade,
    /// Wave cleared
    WaveClear,
}

impl SoundEffect {
    /// Tones making up the effect, starting at `t`
    pub fn tones(self, t: f64) -> Vec<Tone> {
        match self {
            SoundEffect::Shot => vec![blip(880.0, t, 0.05, Waveform::Square, 0.025)],
            SoundEffect::CritShot => vec![
                blip(1320.0, t, 0.06, Waveform::Square, 0.035),
                blip(1760.0, t + 0.03, 0.05, Waveform::Square, 0.02),
            ],
            SoundEffect::EnemyDown => vec![
                blip(220.0, t, 0.12, Waveform::Triangle, 0.06),
                blip(110.0, t + 0.02, 0.14, Waveform::Sawtooth, 0.03),
            ],
            SoundEffect::PlayerHit => vec![blip(98.0, t, 0.2, Waveform::Sawtooth, 0.09)],
            SoundEffect::WaveStart => arpeggio(&[392.0, 523.25], t, 0.08, Waveform::Triangle),
            SoundEffect::WaveClear => {
                arpeggio(&[523.25, 659.25, 783.99], t, 0.07, Waveform::Triangle)
            }
            SoundEffect::Upgrade => arpeggio(&[783.99, 1046.5], t, 0.06, Waveform::Sine),
        }
    }
}

fn blip(freq: f32, start: f64, duration: f64, waveform: Waveform, gain: f32) -> Tone {
    Tone {
        freq,
        start,
        duration,
        waveform,
        gain,
    }
}

/// Rising notes, each a `spacing` apart
fn arpeggio(notes: &[f32], t: f64, spacing: f64, waveform: Waveform) -> Vec<Tone> {
    notes
        .iter()
        .enumerate()
        .map(|(i, freq)| blip(*freq, t + i as f64 * spacing, spacing * 1.6, waveform, 0.05))
        .collect()
}

/// Play an effect now. Returns false when audio is unavailable.
pub fn play<S: ToneSink + ?Sized>(sink: &mut S, effect: SoundEffect) -> bool {
    let Some(now) = sink.current_time() else {
        return false;
    };
    for tone in effect.tones(now) {
        sink.play_tone(&tone);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{RecordingSink, SilentSink};

    #[test]
    fn test_play_schedules_at_clock() {
        let mut sink = RecordingSink {
            time: 2.5,
            ..Default::default()
        };
        assert!(play(&mut sink, SoundEffect::WaveClear));
        let starts: Vec<f64> = sink.tones.iter().map(|t| t.start).collect();
        assert_eq!(starts.len(), 3);
        assert!((starts[0] - 2.5).abs() < 1e-12);
        assert!((starts[2] - 2.64).abs() < 1e-9);
    }

    #[test]
    fn test_silent_sink_plays_nothing() {
        assert!(!play(&mut SilentSink, SoundEffect::Shot));
    }

    #[test]
    fn test_crit_is_brighter_than_shot() {
        let shot = SoundEffect::Shot.tones(0.0);
        let crit = SoundEffect::CritShot.tones(0.0);
        assert!(crit[0].freq > shot[0].freq);
        assert!(crit[0].gain > shot[0].gain);
    }
}
