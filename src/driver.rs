//! Frame driver
//!
//! Owns the session, the music sequencer and the input intents. The host
//! calls `frame` once per display refresh; everything else arrives through
//! the command queue and is applied at the start of the next frame, before
//! the tick.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use crate::audio::{Sequencer, SoundEffect, ToneSink, effects};
use crate::consts::MAX_FRAME_DT;
use crate::settings::Settings;
use crate::sim::rng::{self, SimRng};
use crate::sim::{
    Field, GameEvent, GamePhase, GameState, TickInput, UpgradeOffer, select_upgrade, tick,
};
use crate::snapshot::RenderSnapshot;
use crate::tuning::Tuning;

/// Intents from the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fire held / released
    SetShoot(bool),
    /// Movement intent, each axis in [-1, 1]
    Move(Vec2),
    /// Pick upgrade card `n` (0-based)
    SelectUpgrade(usize),
    /// Start a session (or restart after game over)
    Start,
    ToggleMute,
    Resize { width: f32, height: f32 },
    ApplySettings(Settings),
}

/// Numbers shown in the HUD
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub wave: u32,
    pub score: u64,
    pub hp: f32,
    pub hp_max: f32,
}

/// Session milestones the UI reacts to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notification {
    WaveCleared { wave: u32 },
    GameOver {
        final_wave: u32,
        final_score: u64,
        /// "You reached Wave N with Score S."
        line: String,
    },
}

/// Per-frame orchestrator for one page
pub struct FrameDriver<S: ToneSink> {
    tuning: Tuning,
    settings: Settings,
    field: Field,
    session: Option<GameState>,
    input: TickInput,
    commands: VecDeque<Command>,
    notifications: Vec<Notification>,
    sequencer: Sequencer,
    sink: S,
    /// Seeds new sessions and picks death music
    rng: SimRng,
    last_frame_ms: Option<f64>,
}

impl<S: ToneSink> FrameDriver<S> {
    pub fn new(mut sink: S, tuning: Tuning, settings: Settings, field: Field, seed: u64) -> Self {
        let mut sequencer = Sequencer::new(&tuning.music);
        sequencer.set_volume(&mut sink, settings.music_volume);
        Self {
            tuning,
            settings,
            field,
            session: None,
            input: TickInput::default(),
            commands: VecDeque::new(),
            notifications: Vec::new(),
            sequencer,
            sink,
            rng: rng::seeded(seed),
            last_frame_ms: None,
        }
    }

    /// Queue a command for the next frame
    pub fn push(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Run one frame at host timestamp `now_ms`. Returns the dt used.
    ///
    /// The first frame (and any clock going backwards) steps by zero.
    pub fn frame(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_frame_ms {
            Some(last) => ((now_ms - last) / 1000.0).clamp(0.0, MAX_FRAME_DT as f64) as f32,
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);
        self.step(dt);
        dt
    }

    /// Apply queued commands, tick, route events, feed the sequencer
    pub fn step(&mut self, dt: f32) {
        while let Some(command) = self.commands.pop_front() {
            self.apply(command);
        }

        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        if let Some(session) = self.session.as_mut() {
            tick(session, &self.input, dt);
        }
        self.route_events();

        // Music runs through pauses and the game-over screen
        self.sequencer.schedule(&mut self.sink);

        if let Some(session) = self.session.as_mut() {
            session.decay_shake();
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SetShoot(active) => self.input.shoot = active,
            Command::Move(dir) => {
                self.input.move_dir = if dir.is_finite() {
                    dir.clamp(Vec2::splat(-1.0), Vec2::ONE)
                } else {
                    Vec2::ZERO
                };
            }
            Command::SelectUpgrade(index) => match self.session.as_mut() {
                Some(session) => {
                    select_upgrade(session, index);
                }
                None => log::warn!("Upgrade {index} selected with no session"),
            },
            Command::Start => self.start_session(),
            Command::ToggleMute => {
                self.sequencer.start(&mut self.sink);
                let muted = !self.sequencer.is_muted();
                self.sequencer.set_muted(&mut self.sink, muted);
            }
            Command::Resize { width, height } => {
                if !(width > 0.0 && height > 0.0) {
                    log::warn!("Ignoring resize to {width}x{height}");
                    return;
                }
                self.field = Field::new(width, height);
                if let Some(session) = self.session.as_mut() {
                    session.resize(width, height);
                }
            }
            Command::ApplySettings(settings) => {
                self.sequencer
                    .set_volume(&mut self.sink, settings.music_volume);
                if let Some(session) = self.session.as_mut() {
                    session.set_particle_budget(settings.max_particles());
                }
                log::info!("Settings applied: quality {}", settings.quality.as_str());
                self.settings = settings;
            }
        }
    }

    fn start_session(&mut self) {
        self.sequencer.start(&mut self.sink);

        if matches!(&self.session, Some(s) if s.phase != GamePhase::GameOver) {
            log::debug!("Start requested during a running session, ignored");
            return;
        }

        let seed = self.rng.random::<u64>();
        let mut session = GameState::new(seed, self.field, self.tuning.clone());
        session.set_particle_budget(self.settings.max_particles());
        self.session = Some(session);
        self.input = TickInput::default();
        self.sequencer.on_session_start(&mut self.rng);
    }

    fn route_events(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for event in session.drain_events() {
            let effect = match event {
                GameEvent::WaveStarted { wave } => {
                    log::debug!("Wave {wave} started");
                    Some(SoundEffect::WaveStart)
                }
                GameEvent::Shot { crit } => Some(if crit {
                    SoundEffect::CritShot
                } else {
                    SoundEffect::Shot
                }),
                GameEvent::EnemyKilled { .. } => Some(SoundEffect::EnemyDown),
                GameEvent::PlayerHit { damage } => {
                    log::debug!("Player hit for {damage}");
                    Some(SoundEffect::PlayerHit)
                }
                GameEvent::UpgradeApplied { id } => {
                    log::debug!("Upgrade applied: {id:?}");
                    Some(SoundEffect::Upgrade)
                }
                GameEvent::WaveCleared { wave } => {
                    self.notifications.push(Notification::WaveCleared { wave });
                    Some(SoundEffect::WaveClear)
                }
                GameEvent::GameOver { wave, score } => {
                    // The death pattern carries its own sting
                    self.sequencer
                        .on_player_death(&mut self.sink, &mut self.rng);
                    self.notifications.push(Notification::GameOver {
                        final_wave: wave,
                        final_score: score,
                        line: session.final_line(),
                    });
                    None
                }
            };
            if let Some(effect) = effect {
                if self.sequencer.is_active() {
                    effects::play(&mut self.sink, effect);
                }
            }
        }
    }

    /// Take notifications raised since the last call
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// HUD numbers; before the first session this shows the starting stats
    pub fn hud(&self) -> HudSnapshot {
        match &self.session {
            Some(s) => HudSnapshot {
                wave: s.wave.number,
                score: s.score,
                hp: s.player.hp,
                hp_max: s.player.hp_max,
            },
            None => HudSnapshot {
                wave: 1,
                score: 0,
                hp: self.tuning.player.hp_max,
                hp_max: self.tuning.player.hp_max,
            },
        }
    }

    /// Cards on offer (empty unless the upgrade screen is up)
    pub fn upgrade_offers(&self) -> Vec<UpgradeOffer> {
        match &self.session {
            Some(s) if s.phase == GamePhase::ChoosingUpgrade => {
                s.offers.iter().map(|id| id.offer(&s.player)).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn snapshot(&self) -> Option<RenderSnapshot> {
        self.session
            .as_ref()
            .map(|s| RenderSnapshot::capture(s, &self.settings))
    }

    pub fn phase(&self) -> Option<GamePhase> {
        self.session.as_ref().map(|s| s.phase)
    }

    pub fn session(&self) -> Option<&GameState> {
        self.session.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn is_muted(&self) -> bool {
        self.sequencer.is_muted()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Score summary for sharing, once a session exists
    pub fn share_text(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.share_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{PatternKind, RecordingSink};
    use crate::sim::WavePhase;

    fn driver() -> FrameDriver<RecordingSink> {
        FrameDriver::new(
            RecordingSink::default(),
            Tuning::default(),
            Settings::default(),
            Field::new(800.0, 600.0),
            17,
        )
    }

    fn started() -> FrameDriver<RecordingSink> {
        let mut d = driver();
        d.push(Command::Start);
        d.step(0.0);
        d
    }

    /// Empty the field of a started session so the wave clears next tick
    fn force_clear(d: &mut FrameDriver<RecordingSink>) {
        let s = d.session.as_mut().unwrap();
        s.enemies.clear();
        s.wave.to_spawn = 0;
        s.wave.time_left = 0.0;
        s.wave.phase = WavePhase::Draining;
    }

    #[test]
    fn test_frame_clamps_dt() {
        let mut d = started();
        assert_eq!(d.frame(1000.0), 0.0);
        assert!((d.frame(1016.0) - 0.016).abs() < 1e-6);
        assert_eq!(d.frame(3000.0), MAX_FRAME_DT);
        // Clock going backwards
        assert_eq!(d.frame(2000.0), 0.0);
    }

    #[test]
    fn test_hud_before_and_after_start() {
        let mut d = driver();
        assert_eq!(d.hud().wave, 1);
        assert_eq!(d.hud().hp, 10.0);
        assert!(d.phase().is_none());

        d.push(Command::Start);
        d.step(0.0);
        assert_eq!(d.phase(), Some(GamePhase::Playing));
        assert!(d.sequencer().is_started());
    }

    #[test]
    fn test_commands_apply_before_tick() {
        let mut d = started();
        let start = d.session().unwrap().player.pos;
        d.push(Command::Move(Vec2::new(5.0, 0.0)));
        d.step(0.02);
        let moved = d.session().unwrap().player.pos.x - start.x;
        // Axis clamped to 1.0
        assert!((moved - 260.0 * 0.02).abs() < 1e-3);
    }

    #[test]
    fn test_shoot_intent_is_sticky() {
        let mut d = started();
        d.push(Command::SetShoot(true));
        d.step(0.016);
        let after_first = d.session().unwrap().bullets.len();
        assert!(after_first >= 1);
        for _ in 0..20 {
            d.step(0.016);
        }
        assert!(d.session().unwrap().bullets.len() > after_first);
    }

    fn has_freq(d: &FrameDriver<RecordingSink>, freq: f32) -> bool {
        d.sink().tones.iter().any(|t| t.freq == freq)
    }

    #[test]
    fn test_gameplay_events_play_effects() {
        let mut d = started();
        // Wave 1 announced on the first frame
        assert!(has_freq(&d, 392.0));

        d.push(Command::SetShoot(true));
        d.step(0.016);
        assert!(has_freq(&d, 880.0) || has_freq(&d, 1320.0));

        force_clear(&mut d);
        d.step(0.016);
        assert!(has_freq(&d, 783.99));

        d.push(Command::SelectUpgrade(0));
        d.step(0.016);
        assert!(has_freq(&d, 1046.5));
    }

    #[test]
    fn test_muted_driver_plays_no_effects() {
        let mut d = driver();
        d.push(Command::ToggleMute);
        d.push(Command::Start);
        d.push(Command::SetShoot(true));
        for _ in 0..10 {
            d.step(0.016);
        }
        assert!(!d.session().unwrap().bullets.is_empty());
        assert!(d.sink().tones.is_empty());
    }

    #[test]
    fn test_wave_clear_notification_and_selection() {
        let mut d = started();
        force_clear(&mut d);
        d.step(0.016);

        assert_eq!(
            d.drain_notifications(),
            vec![Notification::WaveCleared { wave: 1 }]
        );
        let offers = d.upgrade_offers();
        assert_eq!(offers.len(), 3);
        assert!(offers.iter().all(|o| o.preview.contains('\u{2192}')));

        // Out of range is ignored
        d.push(Command::SelectUpgrade(9));
        d.step(0.016);
        assert_eq!(d.phase(), Some(GamePhase::ChoosingUpgrade));

        d.push(Command::SelectUpgrade(0));
        d.step(0.016);
        assert_eq!(d.phase(), Some(GamePhase::Playing));
        assert_eq!(d.hud().wave, 2);
        assert!(d.upgrade_offers().is_empty());
    }

    #[test]
    fn test_music_keeps_running_while_paused() {
        let mut d = started();
        force_clear(&mut d);
        d.step(0.016);
        assert_eq!(d.phase(), Some(GamePhase::ChoosingUpgrade));

        let before = d.sink().tones.len();
        d.sink.time = 5.0;
        d.step(0.016);
        assert!(d.sink().tones.len() > before);
    }

    #[test]
    fn test_game_over_notification_and_death_music() {
        let mut d = started();
        {
            let s = d.session.as_mut().unwrap();
            s.player.hp = 0.0;
            s.score = 77;
        }
        d.step(0.016);

        assert_eq!(d.phase(), Some(GamePhase::GameOver));
        let notes = d.drain_notifications();
        assert_eq!(
            notes,
            vec![Notification::GameOver {
                final_wave: 1,
                final_score: 77,
                line: "You reached Wave 1 with Score 77.".to_string(),
            }]
        );
        assert_eq!(d.sequencer().pattern().kind, PatternKind::Death);
        assert!(d.share_text().unwrap().contains("Score 77"));
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut d = started();
        d.session.as_mut().unwrap().player.hp = 0.0;
        d.step(0.016);
        let old_seed = d.session().unwrap().seed;

        d.push(Command::Start);
        d.step(0.0);
        let s = d.session().unwrap();
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.wave.number, 1);
        assert_eq!(s.score, 0);
        assert_ne!(s.seed, old_seed);
        // Default policy restores the normal loop
        assert_eq!(d.sequencer().pattern().kind, PatternKind::Normal);
    }

    #[test]
    fn test_start_ignored_mid_session() {
        let mut d = started();
        d.session.as_mut().unwrap().score = 40;
        d.push(Command::Start);
        d.step(0.0);
        assert_eq!(d.session().unwrap().score, 40);
    }

    #[test]
    fn test_toggle_mute() {
        let mut d = driver();
        d.push(Command::ToggleMute);
        d.step(0.0);
        // Mute also unlocks audio on first use
        assert!(d.sequencer().is_started());
        assert!(d.is_muted());
        assert_eq!(d.sink().master_gain, 0.0);

        d.push(Command::ToggleMute);
        d.step(0.0);
        assert!(!d.is_muted());
        assert!(d.sink().master_gain > 0.0);
    }

    #[test]
    fn test_resize_and_settings() {
        let mut d = started();
        d.push(Command::Resize {
            width: 320.0,
            height: 240.0,
        });
        d.push(Command::ApplySettings(Settings::from_preset(
            crate::settings::QualityPreset::Low,
        )));
        d.step(0.0);
        assert_eq!(d.field(), Field::new(320.0, 240.0));
        assert_eq!(d.session().unwrap().field, Field::new(320.0, 240.0));
        assert_eq!(d.session().unwrap().max_particles, 150);

        d.push(Command::Resize {
            width: 0.0,
            height: f32::NAN,
        });
        d.step(0.0);
        assert_eq!(d.field(), Field::new(320.0, 240.0));
    }

    #[test]
    fn test_snapshot_only_with_session() {
        let mut d = driver();
        assert!(d.snapshot().is_none());
        d.push(Command::Start);
        d.step(0.0);
        assert!(d.snapshot().is_some());
    }
}
