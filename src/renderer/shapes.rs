//! Packing of render snapshots into GPU shape records
//!
//! Every drawable is an axis-aligned glowing box; the fragment shader
//! composites them in buffer order, so packing order is draw order.

use bytemuck::{Pod, Zeroable};

use crate::consts::{HUE_CRIT, HUE_PLAYER_SHOT};
use crate::snapshot::RenderSnapshot;

/// Shape kinds understood by the shader
pub mod kind {
    pub const ENEMY: u32 = 0;
    pub const BULLET: u32 = 1;
    pub const CRIT_BULLET: u32 = 2;
    pub const ENEMY_SHOT: u32 = 3;
    pub const PLAYER: u32 = 4;
    pub const PARTICLE: u32 = 5;
    pub const TARGET: u32 = 6;
    /// Player drawn as a translucent white flash while invulnerable
    pub const PLAYER_FLASH: u32 = 7;
}

/// Player magenta (#ff2bd6)
const HUE_PLAYER: f32 = 313.0;
/// Auto-aim ring green (#a6ff4d)
const HUE_TARGET: f32 = 88.0;
const TARGET_ALPHA: f32 = 0.35;
const FLASH_ALPHA: f32 = 0.55;
/// Invulnerability blink period in ms
const BLINK_MS: f64 = 80.0;

/// One shape record (must match `Shape` in the shader)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShapeData {
    pub pos: [f32; 2],
    pub half: f32,
    pub hue: f32,
    pub kind: u32,
    pub alpha: f32,
    /// Enemy health fraction for the hp pip (unused otherwise)
    pub health: f32,
    pub _pad: u32,
}

impl ShapeData {
    fn new(pos: glam::Vec2, half: f32, hue: f32, kind: u32, alpha: f32) -> Self {
        Self {
            pos: pos.to_array(),
            half,
            hue,
            kind,
            alpha,
            health: 1.0,
            _pad: 0,
        }
    }
}

/// Flatten a snapshot into at most `max` shapes
///
/// Order: bullets, enemy shots, enemies, player, particles, target.
/// Particles are the first thing dropped when the budget runs out, then
/// projectiles and enemies; the player always keeps its slot.
pub fn pack_shapes(snapshot: &RenderSnapshot, time_ms: f64, max: usize) -> Vec<ShapeData> {
    if max == 0 {
        return Vec::new();
    }
    let mut shapes = Vec::with_capacity(
        (snapshot.bullets.len()
            + snapshot.enemy_bullets.len()
            + snapshot.enemies.len()
            + snapshot.particles.len()
            + 2)
            .min(max),
    );

    for b in &snapshot.bullets {
        let (hue, k) = if b.crit {
            (HUE_CRIT, kind::CRIT_BULLET)
        } else {
            (HUE_PLAYER_SHOT, kind::BULLET)
        };
        shapes.push(ShapeData::new(b.pos, b.size * 0.5, hue, k, 1.0));
    }

    for s in &snapshot.enemy_bullets {
        shapes.push(ShapeData::new(s.pos, s.size * 0.5, s.hue, kind::ENEMY_SHOT, 1.0));
    }

    for e in &snapshot.enemies {
        shapes.push(ShapeData {
            health: e.health,
            ..ShapeData::new(e.pos, e.size * 0.5, e.hue, kind::ENEMY, 1.0)
        });
    }

    // Room for the target ring and the player
    let target_slot = usize::from(snapshot.target.is_some());
    shapes.truncate(max.saturating_sub(target_slot + 1));

    let player = &snapshot.player;
    let blink = player.invulnerable && (time_ms / BLINK_MS).floor() as i64 % 2 == 0;
    shapes.push(if blink {
        ShapeData::new(
            player.pos,
            player.size * 0.5,
            0.0,
            kind::PLAYER_FLASH,
            FLASH_ALPHA,
        )
    } else {
        ShapeData::new(player.pos, player.size * 0.5, HUE_PLAYER, kind::PLAYER, 1.0)
    });

    let room = max.saturating_sub(shapes.len() + target_slot);
    for p in snapshot.particles.iter().take(room) {
        shapes.push(ShapeData::new(p.pos, p.radius, p.hue, kind::PARTICLE, p.alpha));
    }

    if let Some(target) = &snapshot.target {
        if shapes.len() < max {
            shapes.push(ShapeData::new(
                target.pos,
                target.radius,
                HUE_TARGET,
                kind::TARGET,
                TARGET_ALPHA,
            ));
        }
    }

    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::wave::make_enemy;
    use crate::sim::{Bullet, EnemyType, Field, GameState};
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn state_with_enemy() -> GameState {
        let mut state = GameState::new(9, Field::new(800.0, 600.0), Tuning::default());
        state.enemies.clear();
        let enemy = make_enemy(&mut state.rng, 1, EnemyType::Tank, 1, Vec2::new(400.0, 100.0));
        state.enemies.push(enemy);
        state
    }

    #[test]
    fn test_shape_layout_is_32_bytes() {
        assert_eq!(std::mem::size_of::<ShapeData>(), 32);
    }

    #[test]
    fn test_draw_order_and_target() {
        let mut state = state_with_enemy();
        state.burst(Vec2::new(50.0, 50.0), 4, 190.0);
        let snap = RenderSnapshot::capture(&state, &Settings::default());
        let shapes = pack_shapes(&snap, 0.0, 1024);

        let kinds: Vec<u32> = shapes.iter().map(|s| s.kind).collect();
        assert_eq!(kinds[0], kind::ENEMY);
        assert_eq!(kinds[1], kind::PLAYER);
        assert!(kinds[2..6].iter().all(|&k| k == kind::PARTICLE));
        assert_eq!(*kinds.last().unwrap(), kind::TARGET);
        assert_eq!(shapes.last().unwrap().alpha, TARGET_ALPHA);
    }

    #[test]
    fn test_crit_bullets_use_crit_kind() {
        let mut state = GameState::new(9, Field::new(800.0, 600.0), Tuning::default());
        for crit in [false, true] {
            state.bullets.push(Bullet {
                pos: Vec2::new(10.0, 10.0),
                vel: Vec2::new(0.0, -500.0),
                size: 6.0,
                damage: 1,
                life: 1.0,
                pierce_left: 0,
                crit,
                hit_ids: Vec::new(),
            });
        }
        let snap = RenderSnapshot::capture(&state, &Settings::default());
        let shapes = pack_shapes(&snap, 0.0, 1024);
        assert_eq!(shapes[0].kind, kind::BULLET);
        assert_eq!(shapes[1].kind, kind::CRIT_BULLET);
        assert_eq!(shapes[1].hue, HUE_CRIT);
        assert_eq!(shapes[0].half, 3.0);
    }

    #[test]
    fn test_invulnerable_player_blinks() {
        let mut state = GameState::new(9, Field::new(800.0, 600.0), Tuning::default());
        state.enemies.clear();
        state.player.invuln = 0.5;
        let snap = RenderSnapshot::capture(&state, &Settings::default());

        let on = pack_shapes(&snap, 0.0, 16);
        let off = pack_shapes(&snap, 80.0, 16);
        assert_eq!(on[0].kind, kind::PLAYER_FLASH);
        assert_eq!(on[0].alpha, FLASH_ALPHA);
        assert_eq!(off[0].kind, kind::PLAYER);
    }

    #[test]
    fn test_budget_drops_particles_first() {
        let mut state = state_with_enemy();
        state.burst(Vec2::new(50.0, 50.0), 20, 190.0);
        let snap = RenderSnapshot::capture(&state, &Settings::default());
        let shapes = pack_shapes(&snap, 0.0, 5);

        assert_eq!(shapes.len(), 5);
        assert_eq!(shapes[0].kind, kind::ENEMY);
        assert_eq!(shapes[1].kind, kind::PLAYER);
        assert_eq!(shapes[4].kind, kind::TARGET);
        assert_eq!(
            shapes.iter().filter(|s| s.kind == kind::PARTICLE).count(),
            2
        );
    }

    #[test]
    fn test_player_survives_crowded_frame() {
        let mut state = state_with_enemy();
        for i in 0..40 {
            let pos = Vec2::new(20.0 + i as f32 * 18.0, 80.0);
            let enemy = make_enemy(&mut state.rng, 10 + i, EnemyType::Chaser, 1, pos);
            state.enemies.push(enemy);
        }
        state.burst(Vec2::new(50.0, 50.0), 10, 190.0);
        let snap = RenderSnapshot::capture(&state, &Settings::default());
        assert!(snap.target.is_some());

        let shapes = pack_shapes(&snap, 0.0, 12);
        assert_eq!(shapes.len(), 12);
        assert_eq!(shapes[10].kind, kind::PLAYER);
        assert_eq!(shapes[11].kind, kind::TARGET);
        assert!(shapes[..10].iter().all(|s| s.kind == kind::ENEMY));

        // Budget of one: the player beats the target ring
        let tight = pack_shapes(&snap, 0.0, 1);
        assert_eq!(tight.len(), 1);
        assert_eq!(tight[0].kind, kind::PLAYER);
        assert!(pack_shapes(&snap, 0.0, 0).is_empty());
    }
}
