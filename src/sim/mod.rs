//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches the DOM,
//! audio or rendering:
//! - One seeded RNG per session
//! - Caller-clamped variable timestep (see `tick`)
//! - Stable iteration order (entity list order)

pub mod combat;
pub mod rng;
pub mod state;
pub mod tick;
pub mod upgrades;
pub mod wave;

pub use state::{
    Bullet, Enemy, EnemyBullet, EnemyKind, EnemyType, Field, GameEvent, GamePhase, GameState,
    Particle, Player, PlayerStats,
};
pub use tick::{TickInput, select_upgrade, tick};
pub use upgrades::{UpgradeId, UpgradeOffer};
pub use wave::{WavePhase, WavePlan, WaveState};
