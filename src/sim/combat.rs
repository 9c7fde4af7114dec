//! Combat resolution
//!
//! Player fire, projectile integration, enemy steering and every contact
//! check. All overlap tests use the sum-of-radii heuristic on squared
//! distances.

use glam::Vec2;

use super::rng;
use super::state::{
    Bullet, Enemy, EnemyBullet, EnemyKind, EnemyType, GameEvent, GameState,
};
use super::wave;
use crate::consts::*;
use crate::{direction_to, overlaps};

/// Sideways speed of a zigzag enemy at the crest of its swing (px/s)
pub const ZIGZAG_AMPLITUDE: f32 = 90.0;
/// Shooters hold position within this band around their desired range
pub const SHOOTER_RANGE_SLACK: f32 = 24.0;
/// Scatter radius for splitter children
pub const SPLIT_OFFSET: f32 = 12.0;

// ===== Player fire =====

/// Advance the fire cooldown and fire as many volleys as are due
pub fn update_shooting(state: &mut GameState, shooting: bool, dt: f32) {
    state.player.fire_cooldown -= dt;
    if !shooting {
        // No banking: releasing fire never builds up a burst
        state.player.fire_cooldown = state.player.fire_cooldown.max(0.0);
        return;
    }

    let interval = 1.0 / state.player.stats.fire_rate.max(0.1);
    let mut volleys = 0;
    while state.player.fire_cooldown <= 0.0 && volleys < MAX_VOLLEYS_PER_TICK {
        fire_volley(state);
        state.player.fire_cooldown += interval;
        volleys += 1;
    }
    state.player.fire_cooldown = state.player.fire_cooldown.max(0.0);
}

/// Fire one volley at the nearest enemy (straight up if there are none)
pub fn fire_volley(state: &mut GameState) {
    let origin = state.player.pos;
    let target = state
        .nearest_enemy()
        .map(|e| e.pos)
        .unwrap_or(origin + Vec2::new(0.0, -200.0));
    let aim = direction_to(origin, target);
    let base_angle = if aim == Vec2::ZERO {
        -std::f32::consts::FRAC_PI_2
    } else {
        aim.y.atan2(aim.x)
    };

    let stats = &state.player.stats;
    let shots = stats.shot_count.max(1);
    let step = stats.spread.max(MIN_FAN_STEP);
    let crit = rng::chance(&mut state.rng, stats.crit_chance);
    let damage = if crit {
        ((stats.damage as f32 * stats.crit_mult).round() as i32).max(1)
    } else {
        stats.damage
    };
    let (speed, size, pierce) = (stats.bullet_speed, stats.bullet_size, stats.pierce);

    let room = state
        .tuning
        .caps
        .max_bullets
        .saturating_sub(state.bullets.len());
    if room == 0 {
        log::debug!("Bullet cap reached, volley dropped");
        return;
    }

    let center = (shots - 1) as f32 / 2.0;
    for i in 0..(shots as usize).min(room) {
        let offset = if shots == 1 {
            0.0
        } else {
            (i as f32 - center) * step
        };
        let angle = base_angle + offset;
        state.bullets.push(Bullet {
            pos: origin,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            size,
            damage,
            life: BULLET_LIFETIME,
            pierce_left: pierce,
            crit,
            hit_ids: Vec::new(),
        });
    }

    state.burst(origin, MUZZLE_BURST, HUE_PLAYER_SHOT);
    state.emit(GameEvent::Shot { crit });
}

// ===== Player bullets =====

/// Integrate player bullets and resolve them against enemies.
///
/// A bullet damages at most one enemy per tick: the first overlapping enemy
/// in list order that it has not already hit.
pub fn update_bullets(state: &mut GameState, dt: f32) {
    let margin = state.tuning.field.bullet_margin;
    let top = state.tuning.field.bullet_top;
    let field = state.field;

    let mut bullets = std::mem::take(&mut state.bullets);
    bullets.retain_mut(|b| {
        b.pos += b.vel * dt;
        b.life -= dt;

        if b.life <= 0.0
            || b.pos.x < -margin
            || b.pos.x > field.width + margin
            || b.pos.y < top
            || b.pos.y > field.height + margin
        {
            return false;
        }

        let Some(idx) = state
            .enemies
            .iter()
            .position(|e| !b.hit_ids.contains(&e.id) && overlaps(b.pos, b.size, e.pos, e.size))
        else {
            return true;
        };

        let enemy = &mut state.enemies[idx];
        enemy.hp -= b.damage;
        b.hit_ids.push(enemy.id);
        let (hue, dead) = (enemy.hue, enemy.hp <= 0);

        state.add_shake(SHAKE_ENEMY_HIT);
        if b.crit {
            state.burst(b.pos, CRIT_BURST, HUE_CRIT);
        } else {
            state.burst(b.pos, HIT_BURST, hue);
        }

        if dead {
            kill_enemy(state, idx);
        }

        if b.pierce_left > 0 {
            b.pierce_left -= 1;
            true
        } else {
            false
        }
    });

    // Nothing spawns player bullets mid-resolution, but keep any that did
    bullets.append(&mut state.bullets);
    state.bullets = bullets;
}

/// Score a kill, burst, and split if needed
fn kill_enemy(state: &mut GameState, idx: usize) {
    let enemy = state.enemies.remove(idx);
    let kind = enemy.enemy_type();

    let mut score = KILL_SCORE_BASE + KILL_SCORE_PER_WAVE * state.wave.number as u64;
    if kind == EnemyType::Tank {
        score += TANK_BONUS;
    }
    state.score += score;
    state.burst(enemy.pos, DEATH_BURST, enemy.hue);
    state.emit(GameEvent::EnemyKilled { kind, score });

    if let EnemyKind::Splitter { splits } = enemy.kind {
        let wave = state.wave.number;
        for _ in 0..splits {
            let offset = Vec2::new(
                rng::range(&mut state.rng, -SPLIT_OFFSET, SPLIT_OFFSET),
                rng::range(&mut state.rng, -SPLIT_OFFSET, SPLIT_OFFSET),
            );
            let id = state.next_entity_id();
            let child = wave::make_enemy(
                &mut state.rng,
                id,
                EnemyType::Runner,
                wave,
                enemy.pos + offset,
            );
            state.push_enemy(child);
        }
    }
}

// ===== Enemy bullets =====

/// Integrate enemy bullets and resolve hits on the player
pub fn update_enemy_bullets(state: &mut GameState, dt: f32) {
    let margin = state.tuning.field.enemy_bullet_margin;
    let field = state.field;

    let mut shots = std::mem::take(&mut state.enemy_bullets);
    shots.retain_mut(|s| {
        s.pos += s.vel * dt;
        s.life -= dt;
        if s.life <= 0.0 || !field.contains(s.pos, margin) {
            return false;
        }

        // Invulnerable players let shots pass through untouched
        if state.player.invuln > 0.0
            || !overlaps(s.pos, s.size, state.player.pos, state.player.size)
        {
            return true;
        }

        if state.player.take_hit(s.damage as f32) {
            on_player_hit(state, s.damage as f32);
        }
        false
    });

    shots.append(&mut state.enemy_bullets);
    state.enemy_bullets = shots;
}

fn on_player_hit(state: &mut GameState, damage: f32) {
    state.add_shake(SHAKE_PLAYER_HIT);
    let pos = state.player.pos;
    state.burst(pos, PLAYER_HIT_BURST, HUE_PLAYER_HIT);
    state.emit(GameEvent::PlayerHit { damage });
}

// ===== Enemies =====

/// Velocity for one enemy this tick (advances zigzag phase)
pub fn steer(enemy: &mut Enemy, target: Vec2, dt: f32) -> Vec2 {
    let dir = direction_to(enemy.pos, target);
    match &mut enemy.kind {
        EnemyKind::Chaser | EnemyKind::Runner | EnemyKind::Tank | EnemyKind::Splitter { .. } => {
            dir * enemy.speed
        }
        EnemyKind::Zigzag { phase, freq } => {
            *phase += dt * *freq;
            let side = Vec2::new(-dir.y, dir.x);
            dir * enemy.speed + side * phase.sin() * ZIGZAG_AMPLITUDE
        }
        EnemyKind::Shooter { desired_range, .. } => {
            let dist = enemy.pos.distance(target);
            if dist > *desired_range + SHOOTER_RANGE_SLACK {
                dir * enemy.speed
            } else if dist < *desired_range - SHOOTER_RANGE_SLACK {
                -dir * enemy.speed * 0.8
            } else {
                Vec2::ZERO
            }
        }
    }
}

/// Move enemies, let shooters fire, then resolve enemy-player contact
pub fn update_enemies(state: &mut GameState, dt: f32) {
    let target = state.player.pos;
    let wave_number = state.wave.number;
    let difficulty = state.wave.difficulty;
    let mut new_shots: Vec<EnemyBullet> = Vec::new();

    for enemy in state.enemies.iter_mut() {
        let vel = steer(enemy, target, dt);
        enemy.pos += vel * dt;

        let pos = enemy.pos;
        if let EnemyKind::Shooter { cooldown, .. } = &mut enemy.kind {
            *cooldown -= dt;
            // Hold fire until on screen
            if *cooldown <= 0.0 && state.field.contains(pos, 0.0) {
                new_shots.push(enemy_shot(pos, target, wave_number, difficulty));
                *cooldown = wave::shooter_cooldown(&mut state.rng, wave_number);
            }
        }
    }

    let room = state
        .tuning
        .caps
        .max_enemy_bullets
        .saturating_sub(state.enemy_bullets.len());
    state
        .enemy_bullets
        .extend(new_shots.into_iter().take(room));

    for i in 0..state.enemies.len() {
        if state.player.invuln > 0.0 {
            break;
        }
        let e = &state.enemies[i];
        if overlaps(e.pos, e.size, state.player.pos, state.player.size) {
            let damage = e.touch_damage as f32;
            if state.player.take_hit(damage) {
                on_player_hit(state, damage);
            }
        }
    }

    state.player.invuln = (state.player.invuln - dt).max(0.0);
}

/// Aimed shot from a shooter; speed and damage grow with wave and difficulty
pub fn enemy_shot(from: Vec2, target: Vec2, wave: u32, difficulty: f32) -> EnemyBullet {
    let speed = (200.0 + 6.0 * wave as f32) * (1.0 + 0.25 * (difficulty - 1.0));
    let base = 1.0 + (wave / 8) as f32;
    let damage = ((base * (1.0 + 0.5 * (difficulty - 1.0))).round() as i32).max(1);
    EnemyBullet {
        pos: from,
        vel: direction_to(from, target) * speed,
        size: ENEMY_BULLET_SIZE,
        damage,
        life: ENEMY_BULLET_LIFETIME,
    }
}

// ===== Particles =====

/// Integrate and damp particles, dropping expired ones
pub fn update_particles(state: &mut GameState, dt: f32) {
    let damping = 0.001f32.powf(dt);
    for p in state.particles.iter_mut() {
        p.pos += p.vel * dt;
        p.vel *= damping;
        p.life -= dt;
    }
    state.particles.retain(|p| p.life > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Field;
    use crate::sim::wave::WavePhase;
    use crate::tuning::Tuning;

    fn empty_session() -> GameState {
        let mut state = GameState::new(99, Field::new(800.0, 600.0), Tuning::default());
        state.enemies.clear();
        state.particles.clear();
        state.drain_events();
        state.wave.phase = WavePhase::Draining;
        state
    }

    fn enemy(state: &mut GameState, kind: EnemyKind, pos: Vec2, hp: i32) -> Enemy {
        Enemy {
            id: state.next_entity_id(),
            pos,
            size: 20.0,
            hp,
            hp_max: hp,
            speed: 0.0,
            touch_damage: 1,
            hue: 185.0,
            kind,
        }
    }

    fn bullet_at(pos: Vec2, pierce: u32) -> Bullet {
        Bullet {
            pos,
            vel: Vec2::ZERO,
            size: 6.0,
            damage: 1,
            life: 1.0,
            pierce_left: pierce,
            crit: false,
            hit_ids: Vec::new(),
        }
    }

    #[test]
    fn test_bullet_without_pierce_consumed_on_hit() {
        let mut state = empty_session();
        let e = enemy(&mut state, EnemyKind::Chaser, Vec2::new(400.0, 300.0), 5);
        state.enemies.push(e);
        state.bullets.push(bullet_at(Vec2::new(400.0, 300.0), 0));

        update_bullets(&mut state, 0.016);
        assert!(state.bullets.is_empty());
        assert_eq!(state.enemies[0].hp, 4);
        assert_eq!(state.particles.len(), HIT_BURST);
    }

    #[test]
    fn test_bullet_hits_only_first_enemy_in_list_order() {
        let mut state = empty_session();
        let a = enemy(&mut state, EnemyKind::Chaser, Vec2::new(400.0, 300.0), 5);
        let b = enemy(&mut state, EnemyKind::Chaser, Vec2::new(401.0, 300.0), 5);
        state.enemies.push(a);
        state.enemies.push(b);
        state.bullets.push(bullet_at(Vec2::new(401.0, 300.0), 3));

        update_bullets(&mut state, 0.016);
        assert_eq!(state.enemies[0].hp, 4);
        assert_eq!(state.enemies[1].hp, 5);
        assert_eq!(state.bullets[0].pierce_left, 2);
    }

    #[test]
    fn test_pierce_never_rehits_same_enemy() {
        let mut state = empty_session();
        let e = enemy(&mut state, EnemyKind::Tank, Vec2::new(400.0, 300.0), 10);
        state.enemies.push(e);
        state.bullets.push(bullet_at(Vec2::new(400.0, 300.0), 2));

        let mut last_pierce = 2;
        for _ in 0..5 {
            update_bullets(&mut state, 0.016);
            let pierce = state.bullets[0].pierce_left;
            assert!(pierce <= last_pierce);
            last_pierce = pierce;
        }
        assert_eq!(state.enemies[0].hp, 9);
        assert_eq!(last_pierce, 1);
    }

    #[test]
    fn test_tank_kill_score() {
        let mut state = empty_session();
        state.wave.number = 3;
        let e = enemy(&mut state, EnemyKind::Tank, Vec2::new(400.0, 300.0), 1);
        state.enemies.push(e);
        state.bullets.push(bullet_at(Vec2::new(400.0, 300.0), 0));

        update_bullets(&mut state, 0.016);
        assert!(state.enemies.is_empty());
        assert_eq!(state.score, 10 + 2 * 3 + 8);
        assert!(state.drain_events().contains(&GameEvent::EnemyKilled {
            kind: EnemyType::Tank,
            score: 24
        }));
    }

    #[test]
    fn test_chaser_kill_score() {
        let mut state = empty_session();
        state.wave.number = 5;
        let e = enemy(&mut state, EnemyKind::Chaser, Vec2::new(400.0, 300.0), 1);
        state.enemies.push(e);
        state.bullets.push(bullet_at(Vec2::new(400.0, 300.0), 0));
        update_bullets(&mut state, 0.016);
        assert_eq!(state.score, 20);
        // hit burst + death burst
        assert_eq!(state.particles.len(), HIT_BURST + DEATH_BURST);
    }

    #[test]
    fn test_splitter_spawns_runners() {
        let mut state = empty_session();
        state.wave.number = 4;
        let death_pos = Vec2::new(300.0, 200.0);
        let e = enemy(&mut state, EnemyKind::Splitter { splits: 2 }, death_pos, 1);
        state.enemies.push(e);
        state.bullets.push(bullet_at(death_pos, 0));

        update_bullets(&mut state, 0.016);
        assert_eq!(state.enemies.len(), 2);
        for child in &state.enemies {
            assert_eq!(child.enemy_type(), EnemyType::Runner);
            assert!((child.pos - death_pos).abs().max_element() <= SPLIT_OFFSET);
            assert!(child.hp >= 1);
        }
    }

    #[test]
    fn test_crit_bullet_burst() {
        let mut state = empty_session();
        let e = enemy(&mut state, EnemyKind::Chaser, Vec2::new(400.0, 300.0), 10);
        state.enemies.push(e);
        let mut b = bullet_at(Vec2::new(400.0, 300.0), 0);
        b.crit = true;
        state.bullets.push(b);
        update_bullets(&mut state, 0.016);
        assert_eq!(state.particles.len(), CRIT_BURST);
        assert!(state.particles.iter().all(|p| p.hue == HUE_CRIT));
    }

    #[test]
    fn test_bullets_culled_out_of_bounds_and_expired() {
        let mut state = empty_session();
        let mut up = bullet_at(Vec2::new(400.0, 45.0), 0);
        up.vel = Vec2::new(0.0, -520.0);
        let mut old = bullet_at(Vec2::new(400.0, 300.0), 0);
        old.life = 0.01;
        state.bullets.push(up);
        state.bullets.push(old);
        update_bullets(&mut state, 0.02);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_enemy_bullet_hits_player_once() {
        let mut state = empty_session();
        let pos = state.player.pos;
        for _ in 0..2 {
            state.enemy_bullets.push(EnemyBullet {
                pos,
                vel: Vec2::ZERO,
                size: 7.0,
                damage: 2,
                life: 1.0,
            });
        }
        update_enemy_bullets(&mut state, 0.016);
        assert_eq!(state.player.hp, 8.0);
        assert_eq!(state.player.invuln, INVULN_SECONDS);
        // Second shot passes through while invulnerable
        assert_eq!(state.enemy_bullets.len(), 1);
    }

    #[test]
    fn test_contact_damage_and_invuln() {
        let mut state = empty_session();
        let pos = state.player.pos;
        let mut e = enemy(&mut state, EnemyKind::Chaser, pos, 3);
        e.touch_damage = 2;
        state.enemies.push(e);

        update_enemies(&mut state, 0.016);
        assert_eq!(state.player.hp, 8.0);
        assert!((state.player.invuln - (INVULN_SECONDS - 0.016)).abs() < 1e-6);

        // Still overlapping, but invulnerable
        update_enemies(&mut state, 0.016);
        assert_eq!(state.player.hp, 8.0);
    }

    #[test]
    fn test_chaser_moves_toward_player() {
        let mut state = empty_session();
        let mut e = enemy(&mut state, EnemyKind::Chaser, Vec2::new(400.0, 0.0), 3);
        e.speed = 100.0;
        state.enemies.push(e);
        let before = state.enemies[0].pos.distance(state.player.pos);
        update_enemies(&mut state, 0.03);
        let after = state.enemies[0].pos.distance(state.player.pos);
        assert!((before - after - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_zigzag_oscillates_sideways() {
        let mut state = empty_session();
        let mut e = enemy(
            &mut state,
            EnemyKind::Zigzag {
                phase: std::f32::consts::FRAC_PI_2,
                freq: 0.0,
            },
            Vec2::new(400.0, 0.0),
            3,
        );
        e.speed = 0.0;
        let vel = steer(&mut e, Vec2::new(400.0, 500.0), 0.016);
        // Facing +y, sideways is -x; sin(pi/2) = 1
        assert!((vel.x + ZIGZAG_AMPLITUDE).abs() < 1e-3);
        assert!(vel.y.abs() < 1e-3);
    }

    #[test]
    fn test_shooter_keeps_range() {
        let mut state = empty_session();
        let target = Vec2::new(400.0, 400.0);
        let kind = EnemyKind::Shooter {
            cooldown: 10.0,
            desired_range: 200.0,
        };
        let mut far = enemy(&mut state, kind, Vec2::new(400.0, 0.0), 3);
        far.speed = 50.0;
        assert!(steer(&mut far, target, 0.016).y > 0.0);

        let mut near = enemy(&mut state, kind, Vec2::new(400.0, 300.0), 3);
        near.speed = 50.0;
        assert!(steer(&mut near, target, 0.016).y < 0.0);

        let mut held = enemy(&mut state, kind, Vec2::new(400.0, 200.0), 3);
        held.speed = 50.0;
        assert_eq!(steer(&mut held, target, 0.016), Vec2::ZERO);
    }

    #[test]
    fn test_shooter_fires_when_ready() {
        let mut state = empty_session();
        let kind = EnemyKind::Shooter {
            cooldown: 0.01,
            desired_range: 200.0,
        };
        let e = enemy(&mut state, kind, Vec2::new(400.0, 220.0), 3);
        state.enemies.push(e);
        update_enemies(&mut state, 0.016);
        assert_eq!(state.enemy_bullets.len(), 1);
        let shot = &state.enemy_bullets[0];
        assert!(shot.vel.y > 0.0);
        if let EnemyKind::Shooter { cooldown, .. } = state.enemies[0].kind {
            assert!(cooldown > 0.0);
        }
    }

    #[test]
    fn test_enemy_shot_scaling() {
        let shot = enemy_shot(Vec2::ZERO, Vec2::new(0.0, 10.0), 1, 1.0);
        assert_eq!(shot.damage, 1);
        assert!((shot.vel.length() - 206.0).abs() < 1e-2);
        let late = enemy_shot(Vec2::ZERO, Vec2::new(0.0, 10.0), 16, crate::difficulty_for_wave(16));
        assert!(late.damage >= 3);
    }

    #[test]
    fn test_fire_volley_fan_and_aim() {
        let mut state = empty_session();
        state.player.stats.shot_count = 3;
        state.player.stats.spread = 0.1;
        fire_volley(&mut state);
        assert_eq!(state.bullets.len(), 3);
        // No enemies: centre shot straight up
        let centre = state.bullets[1].vel.normalize();
        assert!(centre.x.abs() < 1e-4 && centre.y < -0.99);
        assert_eq!(state.particles.len(), MUZZLE_BURST);
    }

    #[test]
    fn test_fire_volley_aims_at_nearest() {
        let mut state = empty_session();
        let p = state.player.pos;
        let far = enemy(&mut state, EnemyKind::Chaser, p + Vec2::new(0.0, -300.0), 1);
        let near = enemy(&mut state, EnemyKind::Chaser, p + Vec2::new(100.0, 0.0), 1);
        state.enemies.push(far);
        state.enemies.push(near);
        fire_volley(&mut state);
        let dir = state.bullets[0].vel.normalize();
        assert!(dir.x > 0.99);
    }

    #[test]
    fn test_shooting_cadence_no_banking() {
        let mut state = empty_session();
        // Idle for a while: no burst builds up
        for _ in 0..60 {
            update_shooting(&mut state, false, 0.033);
        }
        update_shooting(&mut state, true, 0.016);
        assert_eq!(state.bullets.len(), 1);
        // 6 shots/s: next volley due after ~0.1667s
        for _ in 0..9 {
            update_shooting(&mut state, true, 0.016);
        }
        assert_eq!(state.bullets.len(), 1);
        update_shooting(&mut state, true, 0.016);
        assert_eq!(state.bullets.len(), 2);
    }

    #[test]
    fn test_volleys_per_tick_bounded() {
        let mut state = empty_session();
        state.player.stats.fire_rate = 10_000.0;
        update_shooting(&mut state, true, 0.033);
        assert_eq!(state.bullets.len(), MAX_VOLLEYS_PER_TICK as usize);
    }

    #[test]
    fn test_particles_damp_and_expire() {
        let mut state = empty_session();
        state.burst(Vec2::new(100.0, 100.0), 10, 190.0);
        let speed_before: f32 = state.particles.iter().map(|p| p.vel.length()).sum();
        update_particles(&mut state, 0.1);
        let speed_after: f32 = state.particles.iter().map(|p| p.vel.length()).sum();
        assert!(speed_after < speed_before * 0.6);
        for _ in 0..30 {
            update_particles(&mut state, 0.033);
        }
        assert!(state.particles.is_empty());
    }
}
