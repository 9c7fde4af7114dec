//! Neon Defender - survive the waves
//!
//! Core modules:
//! - `sim`: Real-time simulation (entities, waves, combat, upgrades)
//! - `audio`: Look-ahead music step-sequencer and Web Audio backend
//! - `driver`: Per-frame driver (command queue, dt clamp, ordering)
//! - `renderer`: WebGPU SDF rendering of per-frame snapshots
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod driver;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod snapshot;
pub mod tuning;

pub use driver::{Command, FrameDriver, HudSnapshot, Notification};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest dt a single tick may advance (seconds). Larger frame gaps are clamped.
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Invulnerability granted after any contact damage (seconds)
    pub const INVULN_SECONDS: f32 = 0.75;
    /// Player bullet lifetime (seconds)
    pub const BULLET_LIFETIME: f32 = 1.4;
    /// Enemy bullet lifetime (seconds)
    pub const ENEMY_BULLET_LIFETIME: f32 = 3.5;
    /// Enemy bullet radius proxy
    pub const ENEMY_BULLET_SIZE: f32 = 7.0;

    /// Overlap heuristic: two bodies touch when dist <= (sizeA + sizeB) * this
    pub const OVERLAP_FACTOR: f32 = 0.55;

    /// Upgrade ceilings
    pub const SPREAD_CAP: f32 = 0.35;
    pub const CRIT_CHANCE_CAP: f32 = 0.5;
    /// Minimum angular step between bullets of a multi-shot volley
    pub const MIN_FAN_STEP: f32 = 0.06;
    /// Volleys a single tick may fire when fire rate outpaces the frame rate
    pub const MAX_VOLLEYS_PER_TICK: u32 = 4;

    /// Hp restored when a wave is cleared
    pub const WAVE_CLEAR_HEAL: f32 = 2.0;
    /// Cards offered between waves
    pub const UPGRADE_OFFER_COUNT: usize = 3;

    /// Score per kill is KILL_SCORE_BASE + KILL_SCORE_PER_WAVE * wave (+ TANK_BONUS)
    pub const KILL_SCORE_BASE: u64 = 10;
    pub const KILL_SCORE_PER_WAVE: u64 = 2;
    pub const TANK_BONUS: u64 = 8;

    /// Particle burst sizes
    pub const HIT_BURST: usize = 10;
    pub const CRIT_BURST: usize = 14;
    pub const DEATH_BURST: usize = 18;
    pub const PLAYER_HIT_BURST: usize = 22;
    pub const MUZZLE_BURST: usize = 6;

    /// Particle hues
    pub const HUE_PLAYER_SHOT: f32 = 190.0;
    pub const HUE_CRIT: f32 = 52.0;
    pub const HUE_PLAYER_HIT: f32 = 305.0;
    pub const HUE_ENEMY_BULLET: f32 = 330.0;

    /// Screen shake impulses
    pub const SHAKE_ENEMY_HIT: f32 = 0.18;
    pub const SHAKE_PLAYER_HIT: f32 = 0.35;
    /// Shake decay per rendered frame
    pub const SHAKE_DECAY: f32 = 0.016;
}

/// Squared distance between two points (avoids the square root in overlap tests)
#[inline]
pub fn dist2(a: Vec2, b: Vec2) -> f32 {
    a.distance_squared(b)
}

/// Unit vector from `from` toward `to`.
///
/// The length is padded with a tiny epsilon so coincident points yield a
/// zero vector instead of NaN.
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    let d = to - from;
    d / (d.length() + 1e-6)
}

/// True when two circular bodies overlap under the sum-of-radii heuristic
#[inline]
pub fn overlaps(a: Vec2, size_a: f32, b: Vec2, size_b: f32) -> bool {
    let r = (size_a + size_b) * consts::OVERLAP_FACTOR;
    dist2(a, b) <= r * r
}

/// Difficulty multiplier for a wave (1-based): 1.05^(wave-1)
#[inline]
pub fn difficulty_for_wave(wave: u32) -> f32 {
    1.05f32.powi(wave.saturating_sub(1) as i32)
}
