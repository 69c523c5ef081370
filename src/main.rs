//! Sonar Scope entry point
//!
//! Handles platform-specific initialization and runs the animation loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_scope {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        AddEventListenerOptions, Document, Element, HtmlButtonElement, HtmlCanvasElement,
        HtmlElement, MouseEvent,
    };

    use sonar_scope::Settings;
    use sonar_scope::audio::AudioManager;
    use sonar_scope::consts::*;
    use sonar_scope::renderer::{ParticleRenderer, SweepRenderer};
    use sonar_scope::sim::{
        CountdownState, ParticleField, PopupState, ScopeEvent, ScopeState, TickInput, tick,
    };

    /// Impact overlay durations
    const FLASH_MS: f64 = 500.0;
    const FIREBALL_MS: f64 = 3000.0;

    /// DOM readouts and controls
    struct Hud {
        range: Element,
        contacts: Element,
        power_btn: Element,
        missile_btn: HtmlButtonElement,
        countdown_label: Element,
        popup: Element,
        popup_lat: Element,
        popup_lon: Element,
        popup_bearing: Element,
        popup_distance: Element,
        popup_threat: HtmlElement,
        popup_time: Element,
        explosion: Element,
        flash: Element,
    }

    /// Scope instance holding all state
    struct Scope {
        state: ScopeState,
        field: ParticleField,
        audio: AudioManager,
        settings: Settings,
        sweep_renderer: SweepRenderer,
        particle_renderer: ParticleRenderer,
        input: TickInput,
        hud: Hud,
        canvas: HtmlCanvasElement,
        particle_canvas: HtmlCanvasElement,
        last_time: f64,
        /// Popup DOM is rewritten only when the activation epoch changes
        synced_popup_epoch: u64,
        // Impact overlay deadlines, checked each frame
        flash_until_ms: f64,
        fireball_until_ms: f64,
    }

    impl Scope {
        /// Run one animation frame
        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (((time - self.last_time) / 1000.0) as f32).min(0.1)
            } else {
                1.0 / 60.0
            };
            self.last_time = time;
            let now_ms = js_sys::Date::now();

            tick(&mut self.state, &self.input, dt, now_ms);
            // Clear one-shot inputs after processing
            self.input.toggle_power = false;
            self.input.launch = false;
            self.input.click = None;

            self.field.update(dt);
            self.sweep_renderer.draw(&self.state, now_ms);
            if self.settings.particles_enabled {
                self.particle_renderer.draw(&self.field);
            }

            let events: Vec<ScopeEvent> = self.state.events.drain(..).collect();
            for event in events {
                self.handle_event(event, now_ms);
            }

            self.update_hud(now_ms);
        }

        fn handle_event(&mut self, event: ScopeEvent, now_ms: f64) {
            match event {
                ScopeEvent::SweepContact { target } => {
                    let (freq, dur, vol) = if target { PING_TARGET } else { PING_CONTACT };
                    self.audio.play_ping(freq, dur, vol);
                }
                ScopeEvent::CountdownTick { .. } => {
                    let (freq, dur, vol) = PING_COUNTDOWN;
                    self.audio.play_ping(freq, dur, vol);
                }
                ScopeEvent::Impact => {
                    self.audio.play_explosion();
                    if !self.settings.reduced_motion {
                        self.flash_until_ms = now_ms + FLASH_MS;
                    }
                    self.fireball_until_ms = now_ms + FIREBALL_MS;
                }
            }
        }

        /// Sync readouts, buttons, popup, and overlays to the sim state
        fn update_hud(&mut self, now_ms: f64) {
            let state = &self.state;

            self.hud
                .range
                .set_text_content(Some(&format!("{:.1}", state.range_reading)));
            self.hud
                .contacts
                .set_text_content(Some(&state.contacts_observed.to_string()));

            // Power button label/classes, and the scope dimming class
            let label = if state.powered { "POWER" } else { "OFF" };
            self.hud.power_btn.set_text_content(Some(label));
            self.hud
                .power_btn
                .class_list()
                .toggle_with_force("active", state.powered)
                .ok();
            self.canvas
                .class_list()
                .toggle_with_force("power-off", !state.powered)
                .ok();

            // Launch control is held disabled through counting, impact, and rearm
            let engaged = state.countdown.is_engaged();
            self.hud.missile_btn.set_disabled(engaged);
            let opacity = if engaged { "0.5" } else { "1" };
            self.hud
                .missile_btn
                .style()
                .set_property("opacity", opacity)
                .ok();

            let countdown_text = match state.countdown {
                CountdownState::Idle => "WARHEAD ARMED".to_string(),
                CountdownState::Counting { remaining, .. } => {
                    format!("IMPACT IN {remaining}...")
                }
                CountdownState::Impact { .. } => "IMPACT!".to_string(),
            };
            self.hud.countdown_label.set_text_content(Some(&countdown_text));

            match &state.popup {
                PopupState::Open { report, epoch, .. } => {
                    if *epoch != self.synced_popup_epoch {
                        self.synced_popup_epoch = *epoch;
                        self.hud.popup_lat.set_text_content(Some(&report.latitude));
                        self.hud.popup_lon.set_text_content(Some(&report.longitude));
                        self.hud
                            .popup_bearing
                            .set_text_content(Some(&format!("{:.0}", report.bearing_deg)));
                        self.hud
                            .popup_distance
                            .set_text_content(Some(&format!("{:.1}", report.distance_units)));
                        self.hud
                            .popup_threat
                            .set_text_content(Some(report.threat.as_str()));
                        self.hud
                            .popup_threat
                            .style()
                            .set_property("color", report.threat.css_color())
                            .ok();
                        self.hud.popup_time.set_text_content(Some(&report.logged_at));
                    }
                    self.hud.popup.class_list().toggle_with_force("show", true).ok();
                }
                PopupState::Closed => {
                    self.hud.popup.class_list().toggle_with_force("show", false).ok();
                }
            }

            self.hud
                .flash
                .class_list()
                .toggle_with_force("active", now_ms < self.flash_until_ms)
                .ok();
            self.hud
                .explosion
                .class_list()
                .toggle_with_force("active", now_ms < self.fireball_until_ms)
                .ok();
        }

        /// Fit both canvases to the viewport and rebuild the particle field
        fn resize(&mut self) {
            let window = web_sys::window().expect("no window");
            let document = window.document().expect("no document");

            let viewport_w = window
                .inner_width()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            let viewport_h = window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);

            // Square scope canvas, fit to its container, capped
            let (container_w, container_h) = match document
                .query_selector(".sonar-container")
                .ok()
                .flatten()
            {
                Some(container) => {
                    let rect = container.get_bounding_client_rect();
                    (rect.width(), rect.height())
                }
                None => (viewport_w, viewport_h),
            };
            let size = (container_w * 0.9)
                .min(container_h * 0.9)
                .min(MAX_SURFACE as f64);
            self.canvas.set_width(size as u32);
            self.canvas.set_height(size as u32);
            self.state.set_surface(size as f32);

            self.particle_canvas.set_width(viewport_w as u32);
            self.particle_canvas.set_height(viewport_h as u32);
            self.field
                .resize(viewport_w as f32, viewport_h as f32, &mut self.state.rng);

            log::info!(
                "Resized: scope {size:.0}px, particle field {} particles",
                self.field.particles.len()
            );
        }
    }

    fn element(document: &Document, id: &str) -> Element {
        document
            .get_element_by_id(id)
            .unwrap_or_else(|| panic!("missing #{id}"))
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Sonar Scope starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = element(&document, "sonar")
            .dyn_into()
            .expect("not a canvas");
        let particle_canvas: HtmlCanvasElement = element(&document, "particles")
            .dyn_into()
            .expect("not a canvas");

        let hud = Hud {
            range: element(&document, "range"),
            contacts: element(&document, "contacts"),
            power_btn: element(&document, "powerBtn"),
            missile_btn: element(&document, "missileBtn")
                .dyn_into()
                .expect("not a button"),
            countdown_label: element(&document, "nukeTimer"),
            popup: element(&document, "detectionPopup"),
            popup_lat: element(&document, "popupLat"),
            popup_lon: element(&document, "popupLon"),
            popup_bearing: element(&document, "popupBearing"),
            popup_distance: element(&document, "popupDistance"),
            popup_threat: element(&document, "popupThreat")
                .dyn_into()
                .expect("not an html element"),
            popup_time: element(&document, "popupTime"),
            explosion: element(&document, "explosion"),
            flash: element(&document, "nukeFlash"),
        };

        let settings = Settings::load();
        let mut audio = AudioManager::new();
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);

        let now = js_sys::Date::now();
        let seed = now as u64;
        let state = ScopeState::new(seed, now);

        let sweep_renderer = SweepRenderer::new(&canvas).expect("no 2d context on scope canvas");
        let particle_renderer =
            ParticleRenderer::new(&particle_canvas).expect("no 2d context on particle canvas");

        let scope = Rc::new(RefCell::new(Scope {
            state,
            field: ParticleField::new(),
            audio,
            settings,
            sweep_renderer,
            particle_renderer,
            input: TickInput::default(),
            hud,
            canvas: canvas.clone(),
            particle_canvas,
            last_time: 0.0,
            synced_popup_epoch: 0,
            flash_until_ms: 0.0,
            fireball_until_ms: 0.0,
        }));

        log::info!("Scope initialized with seed: {seed}");

        scope.borrow_mut().resize();
        setup_controls(&document, &canvas, scope.clone());
        setup_resize_handlers(scope.clone());
        setup_audio_unlock(&document, scope.clone());

        request_animation_frame(scope);

        log::info!("Sonar Scope running!");
    }

    fn setup_controls(document: &Document, canvas: &HtmlCanvasElement, scope: Rc<RefCell<Scope>>) {
        // Power toggle
        {
            let scope = scope.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut s = scope.borrow_mut();
                s.input.toggle_power = true;
                s.audio.init();
            });
            let _ = element(document, "powerBtn")
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Missile launch
        {
            let scope = scope.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut s = scope.borrow_mut();
                s.input.launch = true;
                s.audio.init();
            });
            let _ = element(document, "missileBtn")
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Surface click spawns a contact at the translated coordinate
        {
            let scope = scope.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut s = scope.borrow_mut();
                let rect = canvas_clone.get_bounding_client_rect();
                if rect.width() <= 0.0 || rect.height() <= 0.0 {
                    return;
                }
                let scale_x = canvas_clone.width() as f64 / rect.width();
                let scale_y = canvas_clone.height() as f64 / rect.height();
                let x = (event.client_x() as f64 - rect.left()) * scale_x;
                let y = (event.client_y() as f64 - rect.top()) * scale_y;
                s.input.click = Some(Vec2::new(x as f32, y as f32));
                s.audio.init();
            });
            let _ = canvas
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handlers(scope: Rc<RefCell<Scope>>) {
        let window = web_sys::window().expect("no window");

        {
            let scope = scope.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                scope.borrow_mut().resize();
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Orientation changes report stale dimensions briefly; re-measure after 100ms
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let scope = scope.clone();
                let delayed = Closure::once(move || {
                    scope.borrow_mut().resize();
                });
                if let Some(window) = web_sys::window() {
                    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                        delayed.as_ref().unchecked_ref(),
                        100,
                    );
                }
                delayed.forget();
            });
            let _ = web_sys::window()
                .expect("no window")
                .add_event_listener_with_callback(
                    "orientationchange",
                    closure.as_ref().unchecked_ref(),
                );
            closure.forget();
        }
    }

    /// Audio graphs may only be built after a user gesture; hook one-shot
    /// listeners that initialize the context on the first click or touch.
    fn setup_audio_unlock(document: &Document, scope: Rc<RefCell<Scope>>) {
        for kind in ["click", "touchstart"] {
            let scope = scope.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                scope.borrow_mut().audio.init();
            });
            let options = AddEventListenerOptions::new();
            options.set_once(true);
            let _ = document.add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                closure.as_ref().unchecked_ref(),
                &options,
            );
            closure.forget();
        }
    }

    fn request_animation_frame(scope: Rc<RefCell<Scope>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move |time: f64| {
            frame_loop(scope, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(scope: Rc<RefCell<Scope>>, time: f64) {
        scope.borrow_mut().frame(time);
        request_animation_frame(scope);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_scope::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Sonar Scope (native) starting...");
    log::info!("Native mode is headless - serve the web build for the display");

    run_headless_sweep();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Run a short headless sweep so the sim can be exercised off-browser
#[cfg(not(target_arch = "wasm32"))]
fn run_headless_sweep() {
    use sonar_scope::sim::{ScopeEvent, ScopeState, TickInput, tick};

    let mut state = ScopeState::new(0xC0FFEE, 0.0);
    let mut detections = 0usize;
    let mut now_ms = 0.0;

    // 30 simulated seconds at 60 Hz
    for _ in 0..(30 * 60) {
        now_ms += 1000.0 / 60.0;
        tick(&mut state, &TickInput::default(), 1.0 / 60.0, now_ms);
        detections += state
            .events
            .drain(..)
            .filter(|e| matches!(e, ScopeEvent::SweepContact { .. }))
            .count();
    }

    println!(
        "30s sweep: {} contacts observed, {} detections, {} live",
        state.contacts_observed,
        detections,
        state.contacts.len()
    );
    assert!(state.contacts_observed > 0, "spawner should have fired");
    println!("Headless sweep OK");
}
