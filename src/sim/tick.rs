//! Simulation tick
//!
//! One call advances a session by `dt` seconds in a fixed order: regen,
//! movement, shooting, spawning, combat, then phase transitions.

use glam::Vec2;

use super::combat;
use super::state::{GameEvent, GamePhase, GameState};
use super::upgrades::{self, UpgradeId};
use super::wave;
use crate::consts::*;

/// Input intents sampled for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Movement intent, each axis in [-1, 1]
    pub move_dir: Vec2,
    /// Fire held
    pub shoot: bool,
}

/// Advance the session by `dt` seconds.
///
/// `dt` is clamped to `MAX_FRAME_DT` here as well as in the frame driver;
/// larger steps let fast bullets tunnel through enemies.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase != GamePhase::Playing {
        return;
    }
    let dt = if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };

    // Regen only once the post-hit grace is over
    if state.player.invuln <= 0.0 && state.player.stats.regen > 0.0 {
        let amount = state.player.stats.regen * dt;
        state.player.heal(amount);
    }

    let dir = if input.move_dir.is_finite() {
        input.move_dir.clamp_length_max(1.0)
    } else {
        Vec2::ZERO
    };
    state.player.pos += dir * state.player.stats.speed * dt;
    state.clamp_player_to_field();

    combat::update_shooting(state, input.shoot, dt);

    wave::advance(state, dt);

    combat::update_bullets(state, dt);
    combat::update_enemy_bullets(state, dt);
    combat::update_enemies(state, dt);
    combat::update_particles(state, dt);

    if !state.player.is_alive() {
        end_session(state);
    } else if wave::check_complete(state) {
        clear_wave(state);
    }
}

fn end_session(state: &mut GameState) {
    state.phase = GamePhase::GameOver;
    state.player.hp = 0.0;
    log::info!(
        "Game over on wave {} with score {}",
        state.wave.number,
        state.score
    );
    state.emit(GameEvent::GameOver {
        wave: state.wave.number,
        score: state.score,
    });
}

fn clear_wave(state: &mut GameState) {
    state.player.heal(WAVE_CLEAR_HEAL);
    state.bullets.clear();
    state.offers = upgrades::draw_offers(&mut state.rng, UPGRADE_OFFER_COUNT);
    state.phase = GamePhase::ChoosingUpgrade;
    log::info!(
        "Wave {} cleared, offering {:?}",
        state.wave.number,
        state.offers
    );
    state.emit(GameEvent::WaveCleared {
        wave: state.wave.number,
    });
}

/// Take the card at `index` and start the next wave.
///
/// Returns false (and changes nothing) outside the upgrade screen or when the
/// index is out of range.
pub fn select_upgrade(state: &mut GameState, index: usize) -> bool {
    if state.phase != GamePhase::ChoosingUpgrade {
        log::warn!("Upgrade selected while not choosing ({:?})", state.phase);
        return false;
    }
    let Some(&id) = state.offers.get(index) else {
        log::warn!(
            "Upgrade index {} out of range ({} offers)",
            index,
            state.offers.len()
        );
        return false;
    };

    apply_upgrade(state, id);
    state.offers.clear();
    state.phase = GamePhase::Playing;
    let next = state.wave.number + 1;
    wave::start_wave(state, next);
    true
}

fn apply_upgrade(state: &mut GameState, id: UpgradeId) {
    id.apply(&mut state.player);
    log::info!("Upgrade applied: {}", id.name());
    state.emit(GameEvent::UpgradeApplied { id });
}
