//! 2D canvas surface.

use std::f64::consts::TAU;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::color::Color;
use crate::error::{OrreryError, OrreryResult};
use crate::render::{RenderCommand, Surface};

/// Label font.
const FONT: &str = "12px monospace";

/// Draws render commands on an HTML canvas.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
    released: bool,
}

impl std::fmt::Debug for CanvasSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasSurface")
            .field("width", &self.canvas.width())
            .field("height", &self.canvas.height())
            .field("acquired", &self.ctx.is_some())
            .field("released", &self.released)
            .finish()
    }
}

impl CanvasSurface {
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self {
            canvas,
            ctx: None,
            released: false,
        }
    }

    #[must_use]
    pub const fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn draw(ctx: &CanvasRenderingContext2d, command: &RenderCommand, width: f64, height: f64) -> OrreryResult<()> {
        let js = |e: wasm_bindgen::JsValue| OrreryError::unavailable(format!("{e:?}"));
        match command {
            RenderCommand::Clear { color } => {
                ctx.set_global_alpha(1.0);
                ctx.set_fill_style_str(&css(*color));
                ctx.fill_rect(0.0, 0.0, width, height);
            }
            RenderCommand::DrawCircle {
                x,
                y,
                radius,
                color,
                filled,
            } => {
                ctx.set_global_alpha(color.alpha());
                ctx.begin_path();
                ctx.arc(*x, *y, *radius, 0.0, TAU).map_err(js)?;
                if *filled {
                    ctx.set_fill_style_str(&css(*color));
                    ctx.fill();
                } else {
                    ctx.set_stroke_style_str(&css(*color));
                    ctx.set_line_width(2.0);
                    ctx.stroke();
                }
            }
            RenderCommand::DrawGlow { x, y, radius, color } => {
                // Three stacked discs stand in for a radial gradient.
                ctx.set_fill_style_str(&css(*color));
                for (scale, alpha) in [(1.0, 0.15), (0.6, 0.25), (0.3, 0.4)] {
                    ctx.set_global_alpha(color.alpha() * alpha);
                    ctx.begin_path();
                    ctx.arc(*x, *y, radius * scale, 0.0, TAU).map_err(js)?;
                    ctx.fill();
                }
            }
            RenderCommand::DrawPolyline { points, color } => {
                let Some((first, rest)) = points.split_first() else {
                    return Ok(());
                };
                ctx.set_global_alpha(color.alpha());
                ctx.set_stroke_style_str(&css(*color));
                ctx.set_line_width(1.0);
                ctx.begin_path();
                ctx.move_to(first.0, first.1);
                for (x, y) in rest {
                    ctx.line_to(*x, *y);
                }
                ctx.stroke();
            }
            RenderCommand::DrawPoints { points, size, color } => {
                ctx.set_global_alpha(color.alpha());
                ctx.set_fill_style_str(&css(*color));
                for (x, y) in points {
                    ctx.fill_rect(x - size / 2.0, y - size / 2.0, *size, *size);
                }
            }
            RenderCommand::DrawText { x, y, text, color } => {
                ctx.set_global_alpha(color.alpha());
                ctx.set_fill_style_str(&css(*color));
                ctx.set_font(FONT);
                ctx.set_text_align("center");
                ctx.fill_text(text, *x, *y).map_err(js)?;
            }
        }
        Ok(())
    }
}

fn css(color: Color) -> String {
    format!("#{:06x}", color.to_hex())
}

impl Surface for CanvasSurface {
    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn acquire(&mut self) -> OrreryResult<()> {
        if self.released {
            return Err(OrreryError::Disposed("canvas".to_string()));
        }
        let ctx = self
            .canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or_else(|| OrreryError::unavailable("2d canvas context unavailable"))?;
        self.ctx = Some(ctx);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn present(&mut self, commands: &[RenderCommand]) -> OrreryResult<()> {
        if self.released {
            return Err(OrreryError::Disposed("canvas".to_string()));
        }
        let ctx = self
            .ctx
            .as_ref()
            .ok_or_else(|| OrreryError::unavailable("canvas not acquired"))?;
        let (width, height) = (f64::from(self.canvas.width()), f64::from(self.canvas.height()));
        for command in commands {
            Self::draw(ctx, command, width, height)?;
        }
        ctx.set_global_alpha(1.0);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            let (width, height) = (f64::from(self.canvas.width()), f64::from(self.canvas.height()));
            ctx.clear_rect(0.0, 0.0, width, height);
        }
        self.released = true;
    }
}
