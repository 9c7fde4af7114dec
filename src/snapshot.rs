//! Read-only per-frame views for rendering
//!
//! The renderer never sees `GameState` directly; it draws a snapshot built
//! once per frame after the tick.

use glam::Vec2;
use serde::Serialize;

use crate::consts::HUE_ENEMY_BULLET;
use crate::settings::Settings;
use crate::sim::{EnemyType, Field, GamePhase, GameState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub size: f32,
    /// Currently immune to damage (drawn flickering)
    pub invulnerable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulletView {
    pub pos: Vec2,
    pub size: f32,
    pub crit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemyView {
    pub pos: Vec2,
    pub size: f32,
    pub hue: f32,
    pub kind: EnemyType,
    /// Remaining hp as a fraction of max (0-1)
    pub health: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotView {
    pub pos: Vec2,
    pub size: f32,
    pub hue: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleView {
    pub pos: Vec2,
    pub radius: f32,
    pub hue: f32,
    /// Fades out with remaining lifetime
    pub alpha: f32,
}

/// Aim indicator drawn around the enemy the gun is tracking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetView {
    pub pos: Vec2,
    pub radius: f32,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub field: Field,
    pub phase: GamePhase,
    /// Camera shake (0 when disabled by settings)
    pub shake: f32,
    pub player: PlayerView,
    pub bullets: Vec<BulletView>,
    pub enemy_bullets: Vec<ShotView>,
    pub enemies: Vec<EnemyView>,
    pub particles: Vec<ParticleView>,
    pub target: Option<TargetView>,
}

/// Particles stay opaque until their last ~0.45s
const PARTICLE_FADE: f32 = 2.2;
/// Target ring radius relative to enemy size
const TARGET_RING_SCALE: f32 = 0.75;

impl RenderSnapshot {
    pub fn capture(state: &GameState, settings: &Settings) -> Self {
        let shake = if settings.effective_screen_shake() {
            state.shake
        } else {
            0.0
        };

        Self {
            field: state.field,
            phase: state.phase,
            shake,
            player: PlayerView {
                pos: state.player.pos,
                size: state.player.size,
                invulnerable: state.player.invuln > 0.0,
            },
            bullets: state
                .bullets
                .iter()
                .map(|b| BulletView {
                    pos: b.pos,
                    size: b.size,
                    crit: b.crit,
                })
                .collect(),
            enemy_bullets: state
                .enemy_bullets
                .iter()
                .map(|s| ShotView {
                    pos: s.pos,
                    size: s.size,
                    hue: HUE_ENEMY_BULLET,
                })
                .collect(),
            enemies: state
                .enemies
                .iter()
                .map(|e| EnemyView {
                    pos: e.pos,
                    size: e.size,
                    hue: e.hue,
                    kind: e.enemy_type(),
                    health: (e.hp.max(0) as f32 / e.hp_max.max(1) as f32).clamp(0.0, 1.0),
                })
                .collect(),
            particles: state
                .particles
                .iter()
                .map(|p| ParticleView {
                    pos: p.pos,
                    radius: p.radius,
                    hue: p.hue,
                    alpha: (p.life * PARTICLE_FADE).clamp(0.0, 1.0),
                })
                .collect(),
            target: state.nearest_enemy().map(|e| TargetView {
                pos: e.pos,
                radius: e.size * TARGET_RING_SCALE,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::wave::make_enemy;
    use crate::tuning::Tuning;

    #[test]
    fn test_capture_mirrors_state() {
        let mut state = GameState::new(3, Field::new(800.0, 600.0), Tuning::default());
        state.shake = 0.3;
        state.burst(Vec2::new(10.0, 10.0), 3, 190.0);
        let snap = RenderSnapshot::capture(&state, &Settings::default());

        assert_eq!(snap.enemies.len(), state.enemies.len());
        assert_eq!(snap.particles.len(), 3);
        assert_eq!(snap.player.pos, state.player.pos);
        assert!(snap.enemies.iter().all(|e| e.health == 1.0));
        assert_eq!(snap.shake, 0.3);
    }

    #[test]
    fn test_target_tracks_nearest_enemy() {
        let mut state = GameState::new(3, Field::new(800.0, 600.0), Tuning::default());
        state.enemies.clear();
        assert!(RenderSnapshot::capture(&state, &Settings::default()).target.is_none());

        state.player.pos = Vec2::new(400.0, 500.0);
        let far = make_enemy(&mut state.rng, 1, EnemyType::Runner, 1, Vec2::new(400.0, 50.0));
        let near = make_enemy(&mut state.rng, 2, EnemyType::Tank, 1, Vec2::new(380.0, 420.0));
        state.enemies.push(far);
        state.enemies.push(near.clone());

        let target = RenderSnapshot::capture(&state, &Settings::default())
            .target
            .unwrap();
        assert_eq!(target.pos, near.pos);
        assert_eq!(target.radius, near.size * 0.75);
    }

    #[test]
    fn test_particle_alpha_fades_at_end_of_life() {
        let mut state = GameState::new(3, Field::new(800.0, 600.0), Tuning::default());
        state.burst(Vec2::ZERO, 2, 190.0);
        state.particles[0].life = 0.5;
        state.particles[1].life = 0.1;
        let snap = RenderSnapshot::capture(&state, &Settings::default());
        assert_eq!(snap.particles[0].alpha, 1.0);
        assert!((snap.particles[1].alpha - 0.22).abs() < 1e-5);
    }

    #[test]
    fn test_reduced_motion_disables_shake() {
        let mut state = GameState::new(3, Field::new(800.0, 600.0), Tuning::default());
        state.shake = 0.3;
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert_eq!(RenderSnapshot::capture(&state, &settings).shake, 0.0);
    }
}
