//! Spawn/Wave director
//!
//! Each wave runs Spawning -> Draining -> Complete. Spawning trickles enemies
//! in on a fixed interval after a small front-loaded burst; Draining waits for
//! the field to empty.

use glam::Vec2;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use super::rng::{self, SimRng};
use super::state::{Enemy, EnemyKind, EnemyType, Field, GameEvent, GameState};
use crate::difficulty_for_wave;

/// Enemies placed immediately when a wave starts
pub const FRONT_LOAD: u32 = 4;
/// Spawn interval bounds (seconds)
pub const MIN_SPAWN_INTERVAL: f32 = 0.18;
pub const MAX_SPAWN_INTERVAL: f32 = 0.85;

/// Base selection weights, in `EnemyType::ALL` order
const BASE_WEIGHTS: [f32; 6] = [52.0, 20.0, 16.0, 12.0, 10.0, 8.0];
/// Spawn band weights, in `SpawnBand::ALL` order
const BAND_WEIGHTS: [f32; 3] = [0.45, 0.27, 0.28];

/// Off-screen strip an enemy enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnBand {
    Top,
    Left,
    Right,
}

impl SpawnBand {
    pub const ALL: [SpawnBand; 3] = [SpawnBand::Top, SpawnBand::Left, SpawnBand::Right];
}

/// Where a wave is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WavePhase {
    #[default]
    Spawning,
    /// Everything spawned and the wave timer ran out; waiting for the field to clear
    Draining,
    Complete,
}

/// Pacing numbers derived from the wave index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavePlan {
    pub difficulty: f32,
    /// Seconds the wave keeps spawning for
    pub duration: f32,
    pub total: u32,
    /// Seconds between trickled spawns
    pub interval: f32,
    pub front_load: u32,
}

impl WavePlan {
    pub fn for_wave(wave: u32) -> Self {
        let n = wave.max(1) as f32;
        let duration = 6.0 + 1.25 * n;
        let total = (10.0 + 3.4 * n).floor() as u32;
        let interval = (duration / total as f32).clamp(MIN_SPAWN_INTERVAL, MAX_SPAWN_INTERVAL);
        Self {
            difficulty: difficulty_for_wave(wave),
            duration,
            total,
            interval,
            front_load: total.min(FRONT_LOAD),
        }
    }
}

/// Live wave progress
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaveState {
    /// 1-based wave number
    pub number: u32,
    pub difficulty: f32,
    pub phase: WavePhase,
    pub total: u32,
    /// Enemies still to be spawned this wave
    pub to_spawn: u32,
    pub spawn_interval: f32,
    pub spawn_cooldown: f32,
    /// Seconds of spawning time left
    pub time_left: f32,
}

impl WaveState {
    pub fn is_spawning(&self) -> bool {
        self.phase == WavePhase::Spawning
    }
}

/// Begin wave `n`: clear the field, compute pacing, front-load the first enemies
pub fn start_wave(state: &mut GameState, n: u32) {
    let plan = WavePlan::for_wave(n);

    state.enemies.clear();
    state.enemy_bullets.clear();
    state.wave = WaveState {
        number: n,
        difficulty: plan.difficulty,
        phase: WavePhase::Spawning,
        total: plan.total,
        to_spawn: plan.total - plan.front_load,
        spawn_interval: plan.interval,
        spawn_cooldown: plan.interval,
        time_left: plan.duration,
    };

    for _ in 0..plan.front_load {
        spawn_one(state);
    }

    log::info!(
        "Wave {} start: difficulty {:.3}, {} enemies over {:.2}s (every {:.3}s)",
        n,
        plan.difficulty,
        plan.total,
        plan.duration,
        plan.interval
    );
    state.emit(GameEvent::WaveStarted { wave: n });
}

/// Advance spawning by `dt`
pub fn advance(state: &mut GameState, dt: f32) {
    if !state.wave.is_spawning() {
        return;
    }

    state.wave.time_left = (state.wave.time_left - dt).max(0.0);
    state.wave.spawn_cooldown -= dt;

    if state.wave.spawn_cooldown <= 0.0 && state.wave.to_spawn > 0 {
        spawn_one(state);
        state.wave.to_spawn -= 1;
        // Carry the overshoot so pacing does not drift with frame timing
        state.wave.spawn_cooldown += state.wave.spawn_interval;
    }

    if state.wave.to_spawn == 0 && state.wave.time_left <= 0.0 {
        state.wave.phase = WavePhase::Draining;
        log::debug!("Wave {} draining", state.wave.number);
    }
}

/// Mark and report completion: spawning over and nothing hostile left alive
pub fn check_complete(state: &mut GameState) -> bool {
    if state.wave.phase == WavePhase::Complete {
        return true;
    }
    if !state.wave.is_spawning() && state.enemies.is_empty() && state.enemy_bullets.is_empty() {
        state.wave.phase = WavePhase::Complete;
        return true;
    }
    false
}

/// Selection weights for a wave
pub fn type_weights(wave: u32) -> [(EnemyType, f32); 6] {
    let mut weights = [(EnemyType::Chaser, 0.0); 6];
    for (slot, (ty, base)) in weights
        .iter_mut()
        .zip(EnemyType::ALL.iter().zip(BASE_WEIGHTS))
    {
        let mut w = base;
        if wave > 6 && *ty == EnemyType::Chaser {
            w *= 0.75;
        }
        if wave > 10 && matches!(ty, EnemyType::Shooter | EnemyType::Tank) {
            w *= 1.15;
        }
        *slot = (*ty, w);
    }
    weights
}

/// Weighted random enemy type for a wave
pub fn pick_enemy_type(rng: &mut SimRng, wave: u32) -> EnemyType {
    let weights = type_weights(wave);
    match WeightedIndex::new(weights.iter().map(|(_, w)| *w)) {
        Ok(dist) => weights[dist.sample(rng)].0,
        Err(err) => {
            log::warn!("Enemy weights for wave {wave} unusable ({err}), spawning a chaser");
            EnemyType::Chaser
        }
    }
}

/// Unscaled stats for a type at a wave
struct BaseStats {
    hp: f32,
    speed: f32,
    touch: f32,
    size: f32,
    hue: f32,
}

fn base_stats(rng: &mut SimRng, ty: EnemyType, wave: u32) -> BaseStats {
    let w = wave as f32;
    match ty {
        EnemyType::Chaser => BaseStats {
            hp: 1.0 + (w * 0.25).floor() + if rng::chance(rng, 0.15) { 2.0 } else { 0.0 },
            speed: (70.0 + w * 6.0) * rng::range(rng, 0.85, 1.15),
            touch: 1.0,
            size: rng::range(rng, 14.0, 26.0),
            hue: if rng::chance(rng, 0.5) { 185.0 } else { 305.0 },
        },
        EnemyType::Runner => BaseStats {
            hp: 1.0 + (w * 0.15).floor(),
            speed: (120.0 + w * 8.0) * rng::range(rng, 0.9, 1.1),
            touch: 1.0,
            size: rng::range(rng, 10.0, 15.0),
            hue: 55.0,
        },
        EnemyType::Tank => BaseStats {
            hp: 4.0 + (w * 0.6).floor(),
            speed: (42.0 + w * 3.0) * rng::range(rng, 0.9, 1.1),
            touch: 2.0,
            size: rng::range(rng, 28.0, 36.0),
            hue: 20.0,
        },
        EnemyType::Zigzag => BaseStats {
            hp: 1.0 + (w * 0.3).floor(),
            speed: (80.0 + w * 5.0) * rng::range(rng, 0.9, 1.1),
            touch: 1.0,
            size: rng::range(rng, 14.0, 20.0),
            hue: 130.0,
        },
        EnemyType::Shooter => BaseStats {
            hp: 2.0 + (w * 0.35).floor(),
            speed: 60.0 + w * 3.0,
            touch: 1.0,
            size: rng::range(rng, 18.0, 24.0),
            hue: 270.0,
        },
        EnemyType::Splitter => BaseStats {
            hp: 3.0 + (w * 0.35).floor(),
            speed: (65.0 + w * 4.0) * rng::range(rng, 0.9, 1.1),
            touch: 1.0,
            size: rng::range(rng, 20.0, 28.0),
            hue: 95.0,
        },
    }
}

/// Seconds until a shooter fires again
pub fn shooter_cooldown(rng: &mut SimRng, wave: u32) -> f32 {
    let base = (1.9 - 0.04 * wave as f32).max(0.7);
    base + rng::range(rng, -0.25, 0.35)
}

/// Build an enemy of `ty` at `pos`, scaled for `wave`
pub fn make_enemy(rng: &mut SimRng, id: u32, ty: EnemyType, wave: u32, pos: Vec2) -> Enemy {
    let difficulty = difficulty_for_wave(wave);
    let base = base_stats(rng, ty, wave);

    let hp = ((base.hp * difficulty).round() as i32).max(1);
    let touch_scale = 1.0 + 0.6 * (difficulty - 1.0);
    let touch_damage = ((base.touch * touch_scale).round() as i32).max(1);

    let kind = match ty {
        EnemyType::Chaser => EnemyKind::Chaser,
        EnemyType::Runner => EnemyKind::Runner,
        EnemyType::Tank => EnemyKind::Tank,
        EnemyType::Zigzag => EnemyKind::Zigzag {
            phase: rng::range(rng, 0.0, std::f32::consts::TAU),
            freq: rng::range(rng, 4.0, 7.0),
        },
        EnemyType::Shooter => EnemyKind::Shooter {
            cooldown: rng::range(rng, 0.6, 1.4),
            desired_range: rng::range(rng, 170.0, 260.0),
        },
        EnemyType::Splitter => EnemyKind::Splitter {
            splits: if wave >= 9 { 3 } else { 2 },
        },
    };

    Enemy {
        id,
        pos,
        size: base.size,
        hp,
        hp_max: hp,
        speed: base.speed * difficulty,
        touch_damage,
        hue: base.hue,
        kind,
    }
}

/// Random spawn band: 45% top, 27% left, 28% right
pub fn pick_spawn_band(rng: &mut SimRng) -> SpawnBand {
    match WeightedIndex::new(BAND_WEIGHTS) {
        Ok(dist) => SpawnBand::ALL[dist.sample(rng)],
        Err(_) => SpawnBand::Top,
    }
}

/// Random point in one of the off-screen spawn bands
pub fn spawn_position(rng: &mut SimRng, field: &Field, band: f32, top_line: f32) -> Vec2 {
    let side_y = || (top_line, (field.height * 0.75).max(top_line + 1.0));
    match pick_spawn_band(rng) {
        SpawnBand::Top => Vec2::new(
            rng::range(rng, 30.0, field.width - 30.0),
            rng::range(rng, -band, -10.0),
        ),
        SpawnBand::Left => {
            let (y0, y1) = side_y();
            Vec2::new(rng::range(rng, -band, -10.0), rng::range(rng, y0, y1))
        }
        SpawnBand::Right => {
            let (y0, y1) = side_y();
            Vec2::new(
                rng::range(rng, field.width + 10.0, field.width + band),
                rng::range(rng, y0, y1),
            )
        }
    }
}

fn spawn_one(state: &mut GameState) {
    let wave = state.wave.number;
    let ty = pick_enemy_type(&mut state.rng, wave);
    let pos = spawn_position(
        &mut state.rng,
        &state.field,
        state.tuning.field.spawn_band,
        state.tuning.field.player_top,
    );
    let id = state.next_entity_id();
    let enemy = make_enemy(&mut state.rng, id, ty, wave, pos);
    state.push_enemy(enemy);
}
