//! Upgrade cards offered between waves
//!
//! Every card is a permanent tweak to the player's stat bundle. Ceilings on
//! spread and crit chance are enforced inside the effects, not by the picker.

use serde::{Deserialize, Serialize};

use super::rng::SimRng;
use super::state::Player;
use crate::consts::{CRIT_CHANCE_CAP, SPREAD_CAP};
use rand::Rng;

/// Identifies one card in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeId {
    Overclock,
    HotterLasers,
    Thrusters,
    ReinforcedHull,
    RailCharge,
    WideBolts,
    TriSpark,
    TwinBarrel,
    PiercingRounds,
    TargetingChip,
    VolatileCore,
    NaniteRepair,
    FieldPatch,
}

/// Full catalog, in display order
pub const CATALOG: [UpgradeId; 13] = [
    UpgradeId::Overclock,
    UpgradeId::HotterLasers,
    UpgradeId::Thrusters,
    UpgradeId::ReinforcedHull,
    UpgradeId::RailCharge,
    UpgradeId::WideBolts,
    UpgradeId::TriSpark,
    UpgradeId::TwinBarrel,
    UpgradeId::PiercingRounds,
    UpgradeId::TargetingChip,
    UpgradeId::VolatileCore,
    UpgradeId::NaniteRepair,
    UpgradeId::FieldPatch,
];

/// A card as presented to the player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeOffer {
    pub id: UpgradeId,
    pub name: &'static str,
    pub description: &'static str,
    /// e.g. "Fire rate 6.0 → 7.2"
    pub preview: String,
}

impl UpgradeId {
    pub fn name(self) -> &'static str {
        match self {
            UpgradeId::Overclock => "Overclock",
            UpgradeId::HotterLasers => "Hotter Lasers",
            UpgradeId::Thrusters => "Thrusters",
            UpgradeId::ReinforcedHull => "Reinforced Hull",
            UpgradeId::RailCharge => "Rail Charge",
            UpgradeId::WideBolts => "Wide Bolts",
            UpgradeId::TriSpark => "Tri-Spark",
            UpgradeId::TwinBarrel => "Twin Barrel",
            UpgradeId::PiercingRounds => "Piercing Rounds",
            UpgradeId::TargetingChip => "Targeting Chip",
            UpgradeId::VolatileCore => "Volatile Core",
            UpgradeId::NaniteRepair => "Nanite Repair",
            UpgradeId::FieldPatch => "Field Patch",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            UpgradeId::Overclock => "+20% fire rate",
            UpgradeId::HotterLasers => "+1 damage",
            UpgradeId::Thrusters => "+12% move speed",
            UpgradeId::ReinforcedHull => "+3 max HP (heal 3)",
            UpgradeId::RailCharge => "+18% bullet speed",
            UpgradeId::WideBolts => "+2 bullet size",
            UpgradeId::TriSpark => "Add slight spread (more coverage)",
            UpgradeId::TwinBarrel => "+1 projectile per shot",
            UpgradeId::PiercingRounds => "Bullets pass through +1 enemy",
            UpgradeId::TargetingChip => "+8% crit chance",
            UpgradeId::VolatileCore => "+0.5x crit damage",
            UpgradeId::NaniteRepair => "Regenerate 0.3 HP/s",
            UpgradeId::FieldPatch => "Heal 40% of max HP",
        }
    }

    /// Apply this card's effect once
    pub fn apply(self, player: &mut Player) {
        let s = &mut player.stats;
        match self {
            UpgradeId::Overclock => s.fire_rate *= 1.2,
            UpgradeId::HotterLasers => s.damage += 1,
            UpgradeId::Thrusters => s.speed *= 1.12,
            UpgradeId::ReinforcedHull => {
                player.hp_max += 3.0;
                player.heal(3.0);
            }
            UpgradeId::RailCharge => s.bullet_speed *= 1.18,
            UpgradeId::WideBolts => s.bullet_size += 2.0,
            UpgradeId::TriSpark => {
                s.spread = (s.spread + 0.08).clamp(0.0, SPREAD_CAP);
                s.shot_count = s.shot_count.max(3);
            }
            UpgradeId::TwinBarrel => s.shot_count += 1,
            UpgradeId::PiercingRounds => s.pierce += 1,
            UpgradeId::TargetingChip => {
                s.crit_chance = (s.crit_chance + 0.08).clamp(0.0, CRIT_CHANCE_CAP)
            }
            UpgradeId::VolatileCore => s.crit_mult += 0.5,
            UpgradeId::NaniteRepair => s.regen += 0.3,
            UpgradeId::FieldPatch => {
                let amount = player.hp_max * 0.4;
                player.heal(amount);
            }
        }
    }

    /// Label and current value of the stat this card touches
    fn stat_line(self, player: &Player) -> (&'static str, String) {
        let s = &player.stats;
        match self {
            UpgradeId::Overclock => ("Fire rate", format!("{:.1}", s.fire_rate)),
            UpgradeId::HotterLasers => ("Damage", s.damage.to_string()),
            UpgradeId::Thrusters => ("Speed", format!("{:.0}", s.speed)),
            UpgradeId::ReinforcedHull => ("Max HP", format!("{:.0}", player.hp_max)),
            UpgradeId::RailCharge => ("Bullet speed", format!("{:.0}", s.bullet_speed)),
            UpgradeId::WideBolts => ("Bullet size", format!("{:.0}", s.bullet_size)),
            UpgradeId::TriSpark => (
                "Spread",
                format!("{:.2} x{}", s.spread, s.shot_count),
            ),
            UpgradeId::TwinBarrel => ("Projectiles", s.shot_count.to_string()),
            UpgradeId::PiercingRounds => ("Pierce", s.pierce.to_string()),
            UpgradeId::TargetingChip => (
                "Crit chance",
                format!("{:.0}%", s.crit_chance * 100.0),
            ),
            UpgradeId::VolatileCore => ("Crit damage", format!("{:.1}x", s.crit_mult)),
            UpgradeId::NaniteRepair => ("Regen", format!("{:.1}/s", s.regen)),
            UpgradeId::FieldPatch => ("HP", format!("{:.0}", player.hp.ceil())),
        }
    }

    /// "Label before → after" without mutating the player
    pub fn preview(self, player: &Player) -> String {
        let (label, before) = self.stat_line(player);
        let mut after_player = player.clone();
        self.apply(&mut after_player);
        let (_, after) = self.stat_line(&after_player);
        format!("{label} {before} \u{2192} {after}")
    }

    pub fn offer(self, player: &Player) -> UpgradeOffer {
        UpgradeOffer {
            id: self,
            name: self.name(),
            description: self.description(),
            preview: self.preview(player),
        }
    }
}

/// Draw `count` distinct cards uniformly (draw-and-remove from the full catalog)
pub fn draw_offers(rng: &mut SimRng, count: usize) -> Vec<UpgradeId> {
    let mut pool: Vec<UpgradeId> = CATALOG.to_vec();
    let mut picks = Vec::with_capacity(count);
    while picks.len() < count && !pool.is_empty() {
        let idx = rng.random_range(0..pool.len());
        picks.push(pool.remove(idx));
    }
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng;
    use crate::tuning::PlayerTuning;
    use glam::Vec2;

    fn player() -> Player {
        Player::new(Vec2::ZERO, &PlayerTuning::default())
    }

    #[test]
    fn test_overclock_compounds() {
        let mut p = player();
        UpgradeId::Overclock.apply(&mut p);
        UpgradeId::Overclock.apply(&mut p);
        assert!((p.stats.fire_rate - 6.0 * 1.2 * 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_spread_capped() {
        let mut p = player();
        for _ in 0..10 {
            UpgradeId::TriSpark.apply(&mut p);
        }
        assert_eq!(p.stats.spread, SPREAD_CAP);
        assert_eq!(p.stats.shot_count, 3);
    }

    #[test]
    fn test_crit_chance_capped() {
        let mut p = player();
        for _ in 0..10 {
            UpgradeId::TargetingChip.apply(&mut p);
        }
        assert_eq!(p.stats.crit_chance, CRIT_CHANCE_CAP);
    }

    #[test]
    fn test_reinforced_hull_partial_heal() {
        let mut p = player();
        p.hp = 9.0;
        UpgradeId::ReinforcedHull.apply(&mut p);
        assert_eq!(p.hp_max, 13.0);
        assert_eq!(p.hp, 12.0);
    }

    #[test]
    fn test_field_patch_caps_at_max() {
        let mut p = player();
        p.hp = 8.0;
        UpgradeId::FieldPatch.apply(&mut p);
        assert_eq!(p.hp, 10.0);
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let p = player();
        let preview = UpgradeId::Overclock.preview(&p);
        assert_eq!(preview, "Fire rate 6.0 \u{2192} 7.2");
        assert_eq!(p.stats.fire_rate, 6.0);
    }

    #[test]
    fn test_draw_offers_distinct() {
        let mut rng = rng::seeded(9);
        for _ in 0..100 {
            let offers = draw_offers(&mut rng, 3);
            assert_eq!(offers.len(), 3);
            assert_ne!(offers[0], offers[1]);
            assert_ne!(offers[0], offers[2]);
            assert_ne!(offers[1], offers[2]);
        }
    }

    #[test]
    fn test_draw_offers_more_than_catalog() {
        let mut rng = rng::seeded(9);
        assert_eq!(draw_offers(&mut rng, 50).len(), CATALOG.len());
    }
}
