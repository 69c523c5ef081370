//! Sonar scope painting: range rings, crosshair, sweep line with fade trail,
//! and contact markers.

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::*;
use crate::sim::ScopeState;

const SCOPE_GREEN: &str = "#00ff41";
const TARGET_RED: &str = "#ff3333";
const CONTACT_YELLOW: &str = "#ffff00";

pub struct SweepRenderer {
    ctx: CanvasRenderingContext2d,
}

impl SweepRenderer {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { ctx })
    }

    /// Paint one frame from the current state
    pub fn draw(&self, state: &ScopeState, now_ms: f64) {
        let size = state.surface as f64;
        let center = size / 2.0;
        let radius = (state.scope_radius() as f64).max(0.0);

        self.ctx.clear_rect(0.0, 0.0, size, size);

        if !state.powered {
            self.draw_rings("#333333", 0.3, center, radius);
            self.ctx.set_global_alpha(1.0);
            return;
        }

        self.draw_rings(SCOPE_GREEN, 0.3, center, radius);
        self.draw_crosshair(center, radius);
        self.draw_sweep_line(state.sweep_angle as f64, center, radius);
        self.draw_sweep_trail(state.sweep_angle as f64, center, radius);
        self.draw_contacts(state, now_ms);

        self.ctx.set_global_alpha(1.0);
    }

    fn draw_rings(&self, color: &str, alpha: f64, center: f64, radius: f64) {
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(1.0);
        self.ctx.set_global_alpha(alpha);
        for i in 1..=5 {
            let r = radius / 5.0 * i as f64;
            self.ctx.begin_path();
            self.ctx.arc(center, center, r, 0.0, TAU).ok();
            self.ctx.stroke();
        }
    }

    fn draw_crosshair(&self, center: f64, radius: f64) {
        self.ctx.set_global_alpha(0.5);
        self.ctx.begin_path();
        self.ctx.move_to(center - radius, center);
        self.ctx.line_to(center + radius, center);
        self.ctx.move_to(center, center - radius);
        self.ctx.line_to(center, center + radius);
        self.ctx.stroke();
    }

    /// Gradient-shaded line from center to the rim at the sweep angle
    fn draw_sweep_line(&self, angle: f64, center: f64, radius: f64) {
        let tip_x = center + radius * angle.cos();
        let tip_y = center + radius * angle.sin();

        self.ctx.set_global_alpha(1.0);
        let gradient = self.ctx.create_linear_gradient(center, center, tip_x, tip_y);
        gradient.add_color_stop(0.0, "#00ff4100").ok();
        gradient.add_color_stop(0.7, "#00ff4180").ok();
        gradient.add_color_stop(1.0, SCOPE_GREEN).ok();

        self.ctx.set_stroke_style_canvas_gradient(&gradient);
        self.ctx.set_line_width(3.0);
        self.ctx.begin_path();
        self.ctx.move_to(center, center);
        self.ctx.line_to(tip_x, tip_y);
        self.ctx.stroke();
    }

    /// Discrete fading arc segments trailing the sweep line
    fn draw_sweep_trail(&self, angle: f64, center: f64, radius: f64) {
        self.ctx.set_stroke_style_str(SCOPE_GREEN);
        self.ctx.set_line_width(2.0);
        for i in 0..TRAIL_SEGMENTS {
            let fade_angle = angle - i as f64 * TRAIL_STEP as f64;
            let alpha = (1.0 - i as f64 / TRAIL_SEGMENTS as f64).max(0.0);
            self.ctx.set_global_alpha(alpha * 0.1);
            self.ctx.begin_path();
            self.ctx
                .arc(center, center, radius, fade_angle - 0.1, fade_angle)
                .ok();
            self.ctx.stroke();
        }
    }

    fn draw_contacts(&self, state: &ScopeState, now_ms: f64) {
        for contact in &state.contacts {
            let age = contact.age_ms(now_ms);
            let alpha = (1.0 - age / CONTACT_MAX_AGE_MS).max(0.0);
            // Pulsing marker
            let size = 3.0 + (age * 0.01).sin() * 2.0;
            let color = if contact.is_target { TARGET_RED } else { CONTACT_YELLOW };

            self.ctx.set_global_alpha(alpha);
            self.ctx.set_fill_style_str(color);
            self.ctx.set_shadow_color(color);
            self.ctx.set_shadow_blur(15.0);
            self.ctx.begin_path();
            self.ctx
                .arc(contact.pos.x as f64, contact.pos.y as f64, size, 0.0, TAU)
                .ok();
            self.ctx.fill();

            // Designation ring around hostiles
            if contact.is_target {
                self.ctx.set_shadow_blur(0.0);
                self.ctx.set_stroke_style_str(TARGET_RED);
                self.ctx.set_line_width(1.0);
                self.ctx.begin_path();
                self.ctx
                    .arc(contact.pos.x as f64, contact.pos.y as f64, 15.0, 0.0, TAU)
                    .ok();
                self.ctx.stroke();
            }

            self.ctx.set_shadow_blur(0.0);
        }
    }
}
