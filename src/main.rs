//! Neon Defender entry point
//!
//! In the browser: DOM wiring, WebGPU setup and the requestAnimationFrame
//! loop. Natively: a headless scripted session for smoke testing.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use neon_defender::audio::WebAudioSink;
    use neon_defender::renderer::SdfRenderState;
    use neon_defender::sim::{Field, GamePhase, UpgradeOffer};
    use neon_defender::{Command, FrameDriver, Notification, QualityPreset, Settings, Tuning};

    /// Directions currently held on the keyboard
    #[derive(Default)]
    struct HeldKeys {
        up: bool,
        down: bool,
        left: bool,
        right: bool,
    }

    impl HeldKeys {
        fn dir(&self) -> Vec2 {
            let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
            Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
        }

        /// Returns true if `key` is a movement key
        fn set(&mut self, key: &str, held: bool) -> bool {
            let slot = match key {
                "w" | "W" | "ArrowUp" => &mut self.up,
                "s" | "S" | "ArrowDown" => &mut self.down,
                "a" | "A" | "ArrowLeft" => &mut self.left,
                "d" | "D" | "ArrowRight" => &mut self.right,
                _ => return false,
            };
            *slot = held;
            true
        }
    }

    /// Game instance holding all state
    struct Game {
        driver: FrameDriver<WebAudioSink>,
        render_state: Option<SdfRenderState>,
        keys: HeldKeys,
        /// Upgrade cards currently in the DOM
        cards_shown: bool,
    }

    impl Game {
        fn new(field: Field, seed: u64) -> Self {
            let tuning = Tuning::default();
            let sink = WebAudioSink::new(tuning.music.master_gain);
            Self {
                driver: FrameDriver::new(sink, tuning, Settings::default(), field, seed),
                render_state: None,
                keys: HeldKeys::default(),
                cards_shown: false,
            }
        }

        fn render(&mut self, time: f64) {
            let (Some(render_state), Some(snapshot)) =
                (self.render_state.as_mut(), self.driver.snapshot())
            else {
                return;
            };
            match render_state.render(&snapshot, self.driver.settings(), time) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            let hud = self.driver.hud();
            set_text(document, "hud-wave", &hud.wave.to_string());
            set_text(document, "hud-score", &hud.score.to_string());
            set_text(
                document,
                "hud-hp",
                &format!("{} / {}", hud.hp.max(0.0).ceil(), hud.hp_max.round()),
            );
            set_text(
                document,
                "mute-btn",
                if self.driver.is_muted() { "Unmute" } else { "Mute" },
            );

            let phase = self.driver.phase();
            set_hidden(document, "start-overlay", phase.is_some());
            set_hidden(document, "hud", phase.is_none());
            set_hidden(
                document,
                "upgrade-overlay",
                phase != Some(GamePhase::ChoosingUpgrade),
            );
            set_hidden(document, "gameover-overlay", phase != Some(GamePhase::GameOver));
        }

        fn cycle_quality(&mut self) {
            let mut settings = self.driver.settings().clone();
            settings.quality = match settings.quality {
                QualityPreset::Low => QualityPreset::Medium,
                QualityPreset::Medium => QualityPreset::High,
                QualityPreset::High => QualityPreset::Low,
            };
            log::info!("Quality: {}", settings.quality.as_str());
            self.driver.push(Command::ApplySettings(settings));
        }

        fn toggle_reduced_motion(&mut self) {
            let mut settings = self.driver.settings().clone();
            settings.reduced_motion = !settings.reduced_motion;
            log::info!("Reduced motion: {}", settings.reduced_motion);
            self.driver.push(Command::ApplySettings(settings));
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    /// Canvas backing size in device pixels, field size in CSS pixels
    fn fit_canvas(canvas: &HtmlCanvasElement) -> ((u32, u32), Field) {
        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
        let client_w = canvas.client_width().max(1);
        let client_h = canvas.client_height().max(1);
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        ((width, height), Field::new(client_w as f32, client_h as f32))
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Neon Defender starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let ((width, height), field) = fit_canvas(&canvas);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(field, seed)));
        log::info!("Driver initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await;

        match adapter {
            Ok(adapter) => {
                log::info!("Using adapter: {:?}", adapter.get_info().name);
                match SdfRenderState::new(surface, &adapter, width, height).await {
                    Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
                    Err(e) => log::error!("Failed to create device: {e}"),
                }
            }
            Err(e) => log::error!("No WebGPU adapter ({e}) - playing without graphics"),
        }

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());
        setup_resize(canvas, game.clone());

        request_animation_frame(game);

        log::info!("Neon Defender running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let key = event.key();
                if g.keys.set(&key, true) {
                    event.prevent_default();
                    let dir = g.keys.dir();
                    g.driver.push(Command::Move(dir));
                    return;
                }
                match key.as_str() {
                    " " => {
                        event.prevent_default();
                        g.driver.push(Command::SetShoot(true));
                    }
                    "Enter" => g.driver.push(Command::Start),
                    "m" | "M" => g.driver.push(Command::ToggleMute),
                    "q" | "Q" => g.cycle_quality(),
                    "r" | "R" => g.toggle_reduced_motion(),
                    "1" | "2" | "3" => {
                        let index = key.parse::<usize>().unwrap_or(1) - 1;
                        g.driver.push(Command::SelectUpgrade(index));
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let key = event.key();
                if g.keys.set(&key, false) {
                    let dir = g.keys.dir();
                    g.driver.push(Command::Move(dir));
                } else if key == " " {
                    g.driver.push(Command::SetShoot(false));
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse held on the canvas fires
        for (event_name, shoot) in [("mousedown", true), ("mouseup", false), ("mouseleave", false)]
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().driver.push(Command::SetShoot(shoot));
            });
            let _ = canvas
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur drops every held input
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.keys = HeldKeys::default();
                g.driver.push(Command::Move(Vec2::ZERO));
                g.driver.push(Command::SetShoot(false));
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, game: Rc<RefCell<Game>>, command: Command) {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().driver.push(command.clone());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else {
            return;
        };
        on_click(&document, "start-btn", game.clone(), Command::Start);
        on_click(&document, "restart-btn", game.clone(), Command::Start);
        on_click(&document, "mute-btn", game, Command::ToggleMute);
    }

    fn setup_resize(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let ((width, height), field) = fit_canvas(&canvas);
            let mut g = game.borrow_mut();
            if let Some(render_state) = g.render_state.as_mut() {
                render_state.resize(width, height);
            }
            g.driver.push(Command::Resize {
                width: field.width,
                height: field.height,
            });
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Rebuild the upgrade card buttons
    fn show_upgrade_cards(document: &Document, offers: &[UpgradeOffer], game: &Rc<RefCell<Game>>) {
        let Some(container) = document.get_element_by_id("upgrade-cards") else {
            return;
        };
        container.set_inner_html("");

        for (index, offer) in offers.iter().enumerate() {
            let Ok(card) = document.create_element("button") else {
                continue;
            };
            card.set_class_name("card");
            let title = format!("{}. {}", index + 1, offer.name);
            for (class, text) in [
                ("card-title", title.as_str()),
                ("card-desc", offer.description),
                ("card-preview", offer.preview.as_str()),
            ] {
                if let Ok(line) = document.create_element("div") {
                    line.set_class_name(class);
                    line.set_text_content(Some(text));
                    let _ = card.append_child(&line);
                }
            }

            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().driver.push(Command::SelectUpgrade(index));
            });
            let _ = card.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();

            let _ = container.append_child(&card);
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        if let Some(document) = document() {
            let (notifications, offers) = {
                let mut g = game.borrow_mut();
                g.driver.frame(time);
                g.render(time);
                g.update_hud(&document);

                let offers = g.driver.upgrade_offers();
                let fresh_offers = !offers.is_empty() && !g.cards_shown;
                g.cards_shown = !offers.is_empty();
                (g.driver.drain_notifications(), fresh_offers.then_some(offers))
            };

            if let Some(offers) = offers {
                show_upgrade_cards(&document, &offers, &game);
            }

            for notification in notifications {
                match notification {
                    Notification::WaveCleared { wave } => {
                        set_text(&document, "upgrade-title", &format!("Wave {wave} cleared"));
                    }
                    Notification::GameOver { line, .. } => {
                        set_text(&document, "final-line", &line);
                        if let Some(share) = game.borrow().driver.share_text() {
                            set_text(&document, "share-text", &share);
                        }
                    }
                }
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use neon_defender::audio::SilentSink;
    use neon_defender::sim::Field;
    use neon_defender::{Command, FrameDriver, Notification, Settings, Tuning};

    /// Simulated display refresh
    const FRAME_MS: f64 = 1000.0 / 60.0;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Neon Defender (native, headless) starting...");

    let seconds: f64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(90.0);
    let tuning = match std::env::var("NEON_TUNING") {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(json) => Tuning::from_json_or_default(&json),
            Err(e) => {
                log::warn!("Cannot read tuning file {path}: {e}");
                Tuning::default()
            }
        },
        Err(_) => Tuning::default(),
    };
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64);

    let mut driver = FrameDriver::new(
        SilentSink,
        tuning,
        Settings::default(),
        Field::new(960.0, 640.0),
        seed,
    );
    driver.push(Command::Start);
    driver.push(Command::SetShoot(true));

    // Hold fire and circle-strafe; always take the first card
    let frames = (seconds * 1000.0 / FRAME_MS) as u64;
    'run: for frame in 0..frames {
        let t = (frame as f64 * FRAME_MS / 1000.0) as f32;
        driver.push(Command::Move(Vec2::new(t.cos(), (t * 0.7).sin())));
        driver.frame(frame as f64 * FRAME_MS);

        for notification in driver.drain_notifications() {
            match notification {
                Notification::WaveCleared { wave } => {
                    if let Some(offer) = driver.upgrade_offers().first() {
                        log::info!("Wave {wave} cleared, taking {} ({})", offer.name, offer.preview);
                    }
                    driver.push(Command::SelectUpgrade(0));
                }
                Notification::GameOver { line, .. } => {
                    log::info!("{line}");
                    break 'run;
                }
            }
        }
    }

    let hud = driver.hud();
    log::info!(
        "Finished: wave {}, score {}, hp {:.1}/{:.1}",
        hud.wave,
        hud.score,
        hud.hp,
        hud.hp_max
    );
    if let Some(text) = driver.share_text() {
        println!("{text}");
    }
}
