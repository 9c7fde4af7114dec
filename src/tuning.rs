//! Data-driven game balance
//!
//! Every number a designer might want to tweak without touching rules code.
//! Defaults reproduce the shipped balance; a JSON document can override any
//! subset of fields.

use serde::{Deserialize, Serialize};

/// Starting stat bundle for a fresh run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub size: f32,
    pub speed: f32,
    pub hp_max: f32,
    /// Shots per second
    pub fire_rate: f32,
    pub damage: i32,
    pub bullet_speed: f32,
    pub bullet_size: f32,
    /// Radians between fanned shots
    pub spread: f32,
    pub shot_count: u32,
    pub pierce: u32,
    pub crit_chance: f32,
    pub crit_mult: f32,
    /// Hp per second while not invulnerable
    pub regen: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: 18.0,
            speed: 260.0,
            hp_max: 10.0,
            fire_rate: 6.0,
            damage: 1,
            bullet_speed: 520.0,
            bullet_size: 6.0,
            spread: 0.0,
            shot_count: 1,
            pierce: 0,
            crit_chance: 0.0,
            crit_mult: 1.5,
            regen: 0.0,
        }
    }
}

/// Play-field margins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldTuning {
    /// Player keeps this far from the left/right/bottom edges
    pub player_margin: f32,
    /// Player stays below this line (HUD strip)
    pub player_top: f32,
    /// Player bullets are culled this far outside left/right/bottom
    pub bullet_margin: f32,
    /// Player bullets are culled above this line
    pub bullet_top: f32,
    /// Enemy bullets are culled this far outside any edge
    pub enemy_bullet_margin: f32,
    /// Depth of the off-screen spawn bands
    pub spawn_band: f32,
}

impl Default for FieldTuning {
    fn default() -> Self {
        Self {
            player_margin: 20.0,
            player_top: 70.0,
            bullet_margin: 30.0,
            bullet_top: 40.0,
            enemy_bullet_margin: 60.0,
            spawn_band: 50.0,
        }
    }
}

/// Hard caps on live collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapTuning {
    pub max_bullets: usize,
    pub max_enemy_bullets: usize,
    pub max_enemies: usize,
    pub max_particles: usize,
}

impl Default for CapTuning {
    fn default() -> Self {
        Self {
            max_bullets: 512,
            max_enemy_bullets: 256,
            max_enemies: 400,
            max_particles: 900,
        }
    }
}

/// What a new session does with music left over from a death
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MusicRestorePolicy {
    /// Swap back to the pattern that was playing before the death
    #[default]
    RestoreOnRestart,
    /// Keep looping the death pattern until a pattern is selected explicitly
    KeepDeathTrack,
}

/// Music sequencer timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicTuning {
    /// Seconds of audio scheduled ahead of the audio clock
    pub look_ahead: f64,
    /// First step sounds this long after the sequencer starts
    pub start_delay: f64,
    pub master_gain: f32,
    pub restore_policy: MusicRestorePolicy,
}

impl Default for MusicTuning {
    fn default() -> Self {
        Self {
            look_ahead: 0.20,
            start_delay: 0.05,
            master_gain: 0.22,
            restore_policy: MusicRestorePolicy::default(),
        }
    }
}

/// Complete tuning document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub field: FieldTuning,
    pub caps: CapTuning,
    pub music: MusicTuning,
}

impl Tuning {
    /// Parse a (possibly partial) tuning document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a tuning document, falling back to defaults on error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Invalid tuning document ({e}), using defaults");
                Self::default()
            }
        }
    }
}
