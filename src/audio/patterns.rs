//! Static music pattern tables
//!
//! Each pattern is 16 eighth-note steps. Bass sounds on even steps only,
//! the arpeggio on every step with a non-zero note, and hats/leads where
//! flagged. A frequency of 0.0 is a rest.

use rand::Rng;

/// Which pool a pattern belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Normal,
    Death,
}

/// One looping 16-step pattern
#[derive(Debug, PartialEq)]
pub struct MusicPattern {
    pub name: &'static str,
    pub kind: PatternKind,
    /// Beats per minute
    pub tempo: f64,
    pub bass: [f32; 16],
    pub arp: [f32; 16],
    pub hat: [bool; 16],
    pub lead: [Option<f32>; 16],
}

impl MusicPattern {
    /// Seconds per eighth-note step
    pub fn step_duration(&self) -> f64 {
        30.0 / self.tempo
    }
}

const F: bool = false;
const T: bool = true;

/// Hat on the "and" of every beat
const HAT_OFFBEAT: [bool; 16] = [F, F, T, F, F, F, T, F, F, F, T, F, F, F, T, F];
const NO_HAT: [bool; 16] = [F; 16];
const NO_LEAD: [Option<f32>; 16] = [None; 16];

/// Patterns played while the player is alive; the first is the default loop
pub static NORMAL_PATTERNS: [MusicPattern; 3] = [
    MusicPattern {
        name: "Grid Runner",
        kind: PatternKind::Normal,
        tempo: 132.0,
        bass: [
            55.0, 0.0, 55.0, 0.0, 73.42, 0.0, 82.41, 0.0, 55.0, 0.0, 55.0, 0.0, 98.0, 0.0, 82.41,
            0.0,
        ],
        arp: [
            440.0, 554.37, 659.25, 880.0, 659.25, 554.37, 493.88, 659.25, 440.0, 554.37, 659.25,
            880.0, 659.25, 554.37, 493.88, 659.25,
        ],
        hat: HAT_OFFBEAT,
        lead: NO_LEAD,
    },
    MusicPattern {
        name: "Overdrive",
        kind: PatternKind::Normal,
        tempo: 150.0,
        bass: [
            82.41, 0.0, 82.41, 0.0, 98.0, 0.0, 110.0, 0.0, 82.41, 0.0, 82.41, 0.0, 73.42, 0.0,
            61.74, 0.0,
        ],
        arp: [
            329.63, 392.0, 493.88, 659.25, 493.88, 392.0, 587.33, 493.88, 329.63, 392.0, 493.88,
            659.25, 587.33, 493.88, 392.0, 369.99,
        ],
        hat: [F, F, T, F, F, F, T, F, F, F, T, F, F, F, T, T],
        lead: [
            Some(659.25),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            Some(587.33),
            None,
            None,
            None,
            Some(493.88),
            None,
            None,
            None,
        ],
    },
    MusicPattern {
        name: "Night Circuit",
        kind: PatternKind::Normal,
        tempo: 120.0,
        bass: [
            73.42, 0.0, 73.42, 0.0, 87.31, 0.0, 110.0, 0.0, 65.41, 0.0, 65.41, 0.0, 87.31, 0.0,
            98.0, 0.0,
        ],
        arp: [
            293.66, 349.23, 440.0, 587.33, 440.0, 349.23, 293.66, 440.0, 261.63, 329.63, 392.0,
            523.25, 392.0, 329.63, 261.63, 392.0,
        ],
        hat: HAT_OFFBEAT,
        lead: [
            Some(587.33),
            None,
            None,
            None,
            None,
            None,
            Some(523.25),
            None,
            None,
            None,
            None,
            None,
            Some(440.0),
            None,
            None,
            None,
        ],
    },
];

/// Slow, low patterns swapped in when the player dies
pub static DEATH_PATTERNS: [MusicPattern; 2] = [
    MusicPattern {
        name: "Flatline",
        kind: PatternKind::Death,
        tempo: 84.0,
        bass: [
            55.0, 0.0, 0.0, 0.0, 51.91, 0.0, 0.0, 0.0, 49.0, 0.0, 0.0, 0.0, 46.25, 0.0, 0.0, 0.0,
        ],
        arp: [
            220.0, 0.0, 164.81, 0.0, 207.65, 0.0, 155.56, 0.0, 196.0, 0.0, 146.83, 0.0, 185.0,
            0.0, 138.59, 0.0,
        ],
        hat: NO_HAT,
        lead: [
            Some(110.0),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
            Some(98.0),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        ],
    },
    MusicPattern {
        name: "Static Grave",
        kind: PatternKind::Death,
        tempo: 72.0,
        bass: [
            41.2, 0.0, 41.2, 0.0, 0.0, 0.0, 43.65, 0.0, 41.2, 0.0, 41.2, 0.0, 0.0, 0.0, 36.71,
            0.0,
        ],
        arp: [
            164.81, 0.0, 0.0, 196.0, 0.0, 0.0, 174.61, 0.0, 164.81, 0.0, 0.0, 146.83, 0.0, 0.0,
            130.81, 0.0,
        ],
        hat: [F, F, F, F, F, F, F, T, F, F, F, F, F, F, F, T],
        lead: NO_LEAD,
    },
];

/// The pool for a kind
pub fn patterns(kind: PatternKind) -> &'static [MusicPattern] {
    match kind {
        PatternKind::Normal => &NORMAL_PATTERNS,
        PatternKind::Death => &DEATH_PATTERNS,
    }
}

/// Uniformly random pattern from a pool
pub fn random_pattern<R: Rng + ?Sized>(kind: PatternKind, rng: &mut R) -> &'static MusicPattern {
    let pool = patterns(kind);
    &pool[rng.random_range(0..pool.len())]
}
