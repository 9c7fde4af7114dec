//! Game state and core simulation types
//!
//! The entity store: everything a tick reads or writes lives here. Behavior
//! lives in the sibling modules; this file only owns data and the small
//! helpers that keep its invariants (hp clamping, collection caps).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::{self, SimRng};
use super::upgrades::UpgradeId;
use super::wave::{self, WaveState};
use crate::consts::*;
use crate::tuning::{PlayerTuning, Tuning};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Simulation advancing
    Playing,
    /// Wave cleared, waiting for the player to take a card
    ChoosingUpgrade,
    /// Player died; the session is frozen
    GameOver,
}

/// Play-field bounds in CSS pixels (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Inside the field, expanded by `margin` on every side
    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.x <= self.width + margin
            && pos.y >= -margin
            && pos.y <= self.height + margin
    }
}

/// The player's permanent stat bundle (mutated by upgrades only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub speed: f32,
    /// Shots per second
    pub fire_rate: f32,
    pub damage: i32,
    pub bullet_speed: f32,
    pub bullet_size: f32,
    /// Radians between fanned shots, capped at SPREAD_CAP
    pub spread: f32,
    pub shot_count: u32,
    /// Extra enemies a bullet may pass through
    pub pierce: u32,
    /// Capped at CRIT_CHANCE_CAP
    pub crit_chance: f32,
    pub crit_mult: f32,
    /// Hp per second
    pub regen: f32,
}

impl From<&PlayerTuning> for PlayerStats {
    fn from(t: &PlayerTuning) -> Self {
        Self {
            speed: t.speed,
            fire_rate: t.fire_rate.max(0.1),
            damage: t.damage.max(1),
            bullet_speed: t.bullet_speed,
            bullet_size: t.bullet_size,
            spread: t.spread.clamp(0.0, SPREAD_CAP),
            shot_count: t.shot_count.max(1),
            pierce: t.pierce,
            crit_chance: t.crit_chance.clamp(0.0, CRIT_CHANCE_CAP),
            crit_mult: t.crit_mult.max(1.0),
            regen: t.regen.max(0.0),
        }
    }
}

/// The player ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Collision radius proxy
    pub size: f32,
    pub hp: f32,
    pub hp_max: f32,
    /// Seconds of damage immunity left
    pub invuln: f32,
    pub stats: PlayerStats,
    /// Seconds until the next volley may fire (never banks below zero while idle)
    pub fire_cooldown: f32,
}

impl Player {
    pub fn new(pos: Vec2, tuning: &PlayerTuning) -> Self {
        let hp_max = tuning.hp_max.max(1.0);
        Self {
            pos,
            size: tuning.size,
            hp: hp_max,
            hp_max,
            invuln: 0.0,
            stats: PlayerStats::from(tuning),
            fire_cooldown: 0.0,
        }
    }

    /// Restore hp, capped at max
    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount.max(0.0)).min(self.hp_max);
    }

    /// Apply contact damage unless invulnerable. Returns true if it landed.
    pub fn take_hit(&mut self, damage: f32) -> bool {
        if self.invuln > 0.0 {
            return false;
        }
        self.hp = (self.hp - damage).clamp(0.0, self.hp_max);
        self.invuln = INVULN_SECONDS;
        true
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }
}

/// A player-fired bullet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub damage: i32,
    /// Seconds left
    pub life: f32,
    /// Remaining enemies this bullet may pass through
    pub pierce_left: u32,
    pub crit: bool,
    /// Enemies already damaged (a pierce never hits the same enemy twice)
    #[serde(default)]
    pub hit_ids: Vec<u32>,
}

/// A projectile fired by a shooter enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyBullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub damage: i32,
    pub life: f32,
}

/// Enemy archetype tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyType {
    Chaser,
    Runner,
    Tank,
    Zigzag,
    Shooter,
    Splitter,
}

impl EnemyType {
    pub const ALL: [EnemyType; 6] = [
        EnemyType::Chaser,
        EnemyType::Runner,
        EnemyType::Tank,
        EnemyType::Zigzag,
        EnemyType::Shooter,
        EnemyType::Splitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyType::Chaser => "chaser",
            EnemyType::Runner => "runner",
            EnemyType::Tank => "tank",
            EnemyType::Zigzag => "zigzag",
            EnemyType::Shooter => "shooter",
            EnemyType::Splitter => "splitter",
        }
    }
}

/// Type-specific enemy behavior state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyKind {
    Chaser,
    Runner,
    Tank,
    /// Oscillates sideways while closing in
    Zigzag { phase: f32, freq: f32 },
    /// Holds a firing distance and shoots on its own cooldown
    Shooter { cooldown: f32, desired_range: f32 },
    /// Breaks into runners on death
    Splitter { splits: u32 },
}

impl EnemyKind {
    pub fn enemy_type(&self) -> EnemyType {
        match self {
            EnemyKind::Chaser => EnemyType::Chaser,
            EnemyKind::Runner => EnemyType::Runner,
            EnemyKind::Tank => EnemyType::Tank,
            EnemyKind::Zigzag { .. } => EnemyType::Zigzag,
            EnemyKind::Shooter { .. } => EnemyType::Shooter,
            EnemyKind::Splitter { .. } => EnemyType::Splitter,
        }
    }
}

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub hp: i32,
    pub hp_max: i32,
    pub speed: f32,
    pub touch_damage: i32,
    /// Render hue (degrees)
    pub hue: f32,
    pub kind: EnemyKind,
}

impl Enemy {
    pub fn enemy_type(&self) -> EnemyType {
        self.kind.enemy_type()
    }
}

/// A cosmetic particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds left
    pub life: f32,
    pub radius: f32,
    pub hue: f32,
}

/// Things that happened during a tick, drained by the frame driver
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    WaveStarted { wave: u32 },
    Shot { crit: bool },
    EnemyKilled { kind: EnemyType, score: u64 },
    PlayerHit { damage: f32 },
    WaveCleared { wave: u32 },
    UpgradeApplied { id: UpgradeId },
    GameOver { wave: u32, score: u64 },
}

/// Complete state of one game session
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed this session was started with
    pub seed: u64,
    pub rng: SimRng,
    pub tuning: Tuning,
    pub field: Field,
    pub phase: GamePhase,
    pub wave: WaveState,
    pub score: u64,
    pub player: Player,
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<EnemyBullet>,
    pub enemies: Vec<Enemy>,
    pub particles: Vec<Particle>,
    /// Cards on offer while `phase == ChoosingUpgrade`
    pub offers: Vec<UpgradeId>,
    /// Camera shake intensity (0-1)
    pub shake: f32,
    /// Effective particle cap (quality setting and tuning combined)
    pub max_particles: usize,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Start a fresh session at wave 1
    pub fn new(seed: u64, field: Field, tuning: Tuning) -> Self {
        let spawn = Vec2::new(field.width / 2.0, field.height * 0.7);
        let player = Player::new(spawn, &tuning.player);
        let max_particles = tuning.caps.max_particles;

        let mut state = Self {
            seed,
            rng: rng::seeded(seed),
            tuning,
            field,
            phase: GamePhase::Playing,
            wave: WaveState::default(),
            score: 0,
            player,
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            enemies: Vec::new(),
            particles: Vec::new(),
            offers: Vec::new(),
            shake: 0.0,
            max_particles,
            events: Vec::new(),
            next_id: 1,
        };
        state.clamp_player_to_field();

        log::info!("Session started with seed {seed}");
        wave::start_wave(&mut state, 1);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Record an event for the frame driver
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Lower the particle cap (e.g. from the quality preset); never raises past tuning
    pub fn set_particle_budget(&mut self, budget: usize) {
        self.max_particles = budget.min(self.tuning.caps.max_particles);
        self.particles.truncate(self.max_particles);
    }

    /// Add an enemy unless the enemy cap is reached. Returns false when dropped.
    pub fn push_enemy(&mut self, enemy: Enemy) -> bool {
        if self.enemies.len() >= self.tuning.caps.max_enemies {
            log::debug!("Enemy cap reached, dropping spawn");
            return false;
        }
        self.enemies.push(enemy);
        true
    }

    /// Spray `count` particles from `pos`. Silently truncated at the particle cap.
    pub fn burst(&mut self, pos: Vec2, count: usize, hue: f32) {
        let room = self.max_particles.saturating_sub(self.particles.len());
        for _ in 0..count.min(room) {
            let angle = rng::range(&mut self.rng, 0.0, std::f32::consts::TAU);
            let speed = rng::range(&mut self.rng, 60.0, 260.0);
            self.particles.push(Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life: rng::range(&mut self.rng, 0.25, 0.55),
                radius: rng::range(&mut self.rng, 1.5, 3.2),
                hue,
            });
        }
    }

    /// Raise camera shake to at least `amount`
    pub fn add_shake(&mut self, amount: f32) {
        self.shake = self.shake.max(amount);
    }

    /// Per-rendered-frame shake decay
    pub fn decay_shake(&mut self) {
        self.shake = (self.shake - SHAKE_DECAY).max(0.0);
    }

    /// Resize the play field, keeping the player inside
    pub fn resize(&mut self, width: f32, height: f32) {
        self.field = Field::new(width, height);
        self.clamp_player_to_field();
    }

    /// Clamp the player into the movable area
    pub fn clamp_player_to_field(&mut self) {
        let f = &self.tuning.field;
        let max_x = (self.field.width - f.player_margin).max(f.player_margin);
        let max_y = (self.field.height - f.player_margin).max(f.player_top);
        self.player.pos.x = self.player.pos.x.clamp(f.player_margin, max_x);
        self.player.pos.y = self.player.pos.y.clamp(f.player_top, max_y);
    }

    /// Nearest live enemy to the player (squared distance)
    pub fn nearest_enemy(&self) -> Option<&Enemy> {
        let origin = self.player.pos;
        self.enemies.iter().min_by(|a, b| {
            crate::dist2(origin, a.pos)
                .partial_cmp(&crate::dist2(origin, b.pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Final line shown on the game-over screen
    pub fn final_line(&self) -> String {
        format!(
            "You reached Wave {} with Score {}.",
            self.wave.number, self.score
        )
    }

    /// Plain-text score summary for sharing
    pub fn share_text(&self) -> String {
        format!(
            "NEON DEFENDER \u{2014} Wave {} \u{2014} Score {}",
            self.wave.number, self.score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameState {
        GameState::new(42, Field::new(800.0, 600.0), Tuning::default())
    }

    #[test]
    fn test_new_session_defaults() {
        let state = session();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.wave.number, 1);
        assert_eq!(state.score, 0);
        assert_eq!(state.player.hp, 10.0);
        assert_eq!(state.player.pos, Vec2::new(400.0, 420.0));
    }

    #[test]
    fn test_take_hit_respects_invuln() {
        let mut state = session();
        assert!(state.player.take_hit(3.0));
        assert_eq!(state.player.hp, 7.0);
        assert_eq!(state.player.invuln, INVULN_SECONDS);
        assert!(!state.player.take_hit(3.0));
        assert_eq!(state.player.hp, 7.0);
    }

    #[test]
    fn test_take_hit_clamps_at_zero() {
        let mut state = session();
        state.player.take_hit(99.0);
        assert_eq!(state.player.hp, 0.0);
        assert!(!state.player.is_alive());
    }

    #[test]
    fn test_burst_respects_cap() {
        let mut state = session();
        state.set_particle_budget(5);
        state.burst(Vec2::ZERO, 18, 190.0);
        assert_eq!(state.particles.len(), 5);
        assert!(state.particles.iter().all(|p| p.life > 0.0));
    }

    #[test]
    fn test_resize_clamps_player() {
        let mut state = session();
        state.player.pos = Vec2::new(790.0, 590.0);
        state.resize(400.0, 300.0);
        assert_eq!(state.player.pos, Vec2::new(380.0, 280.0));
    }

    #[test]
    fn test_share_and_final_text() {
        let mut state = session();
        state.score = 120;
        assert_eq!(state.final_line(), "You reached Wave 1 with Score 120.");
        assert!(state.share_text().contains("Score 120"));
    }
}
