//! Background particle field painting with proximity links

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::sim::ParticleField;
use crate::sim::field::LINK_DISTANCE;

const FIELD_GREEN: &str = "#00ff41";

pub struct ParticleRenderer {
    ctx: CanvasRenderingContext2d,
}

impl ParticleRenderer {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { ctx })
    }

    pub fn draw(&self, field: &ParticleField) {
        self.ctx
            .clear_rect(0.0, 0.0, field.width as f64, field.height as f64);

        for (index, particle) in field.particles.iter().enumerate() {
            let pulse = particle.pulse() as f64;

            self.ctx
                .set_global_alpha(particle.opacity as f64 * pulse);
            self.ctx.set_fill_style_str(FIELD_GREEN);
            self.ctx.begin_path();
            self.ctx
                .arc(
                    particle.pos.x as f64,
                    particle.pos.y as f64,
                    particle.size as f64 * pulse,
                    0.0,
                    TAU,
                )
                .ok();
            self.ctx.fill();

            // Faint links to nearby neighbors; each pair drawn once
            for other in &field.particles[index + 1..] {
                let distance = particle.pos.distance(other.pos);
                if distance < LINK_DISTANCE {
                    let alpha = (1.0 - distance / LINK_DISTANCE) as f64 * 0.1;
                    self.ctx.set_global_alpha(alpha);
                    self.ctx.set_stroke_style_str(FIELD_GREEN);
                    self.ctx.set_line_width(0.5);
                    self.ctx.begin_path();
                    self.ctx.move_to(particle.pos.x as f64, particle.pos.y as f64);
                    self.ctx.line_to(other.pos.x as f64, other.pos.y as f64);
                    self.ctx.stroke();
                }
            }
        }

        self.ctx.set_global_alpha(1.0);
    }
}
