//! Software raster canvas.
//!
//! A small subset of the 2D canvas model, enough for the texture recipes:
//! solid and gradient paints, rectangles, circles, ellipses, polylines and
//! a box blur, composited with one of three operators.
//!
//! Shapes are rasterised by pixel-centre inclusion without antialiasing.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{OrreryError, OrreryResult};

/// Largest accepted canvas side.
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// Compositing operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeOp {
    /// Normal alpha compositing.
    #[default]
    SourceOver,
    /// Additive.
    Lighter,
    /// `1 − (1 − a)(1 − b)`.
    Screen,
}

/// Fill or stroke paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Gradient along x between `x0` and `x1`.
    LinearX { x0: f64, x1: f64, stops: Vec<(f64, Color)> },
    /// Gradient along y between `y0` and `y1`.
    LinearY { y0: f64, y1: f64, stops: Vec<(f64, Color)> },
    /// Radial gradient from the centre out to `radius`.
    Radial { cx: f64, cy: f64, radius: f64, stops: Vec<(f64, Color)> },
}

impl Paint {
    /// Colour of the paint at a point.
    #[must_use]
    pub fn color_at(&self, x: f64, y: f64) -> Color {
        match self {
            Self::Solid(c) => *c,
            Self::LinearX { x0, x1, stops } => sample_stops(stops, ratio(x, *x0, *x1)),
            Self::LinearY { y0, y1, stops } => sample_stops(stops, ratio(y, *y0, *y1)),
            Self::Radial { cx, cy, radius, stops } => {
                let d = (x - cx).hypot(y - cy);
                sample_stops(stops, if *radius > 0.0 { d / radius } else { 1.0 })
            }
        }
    }
}

impl From<Color> for Paint {
    fn from(c: Color) -> Self {
        Self::Solid(c)
    }
}

fn ratio(v: f64, from: f64, to: f64) -> f64 {
    let span = to - from;
    if span.abs() < f64::EPSILON {
        0.0
    } else {
        (v - from) / span
    }
}

fn sample_stops(stops: &[(f64, Color)], t: f64) -> Color {
    let Some(&(first_t, first)) = stops.first() else {
        return Color::TRANSPARENT;
    };
    if t <= first_t {
        return first;
    }
    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let local = if t1 > t0 { (t - t0) / (t1 - t0) } else { 1.0 };
            return c0.lerp(c1, local);
        }
    }
    stops.last().map_or(first, |&(_, c)| c)
}

/// RGBA raster with a current composite operator and global alpha.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
    op: CompositeOp,
    global_alpha: f64,
}

impl Canvas {
    /// Transparent canvas.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::Texture`] for a zero or oversized side.
    pub fn new(width: u32, height: u32) -> OrreryResult<Self> {
        if width == 0 || height == 0 || width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(OrreryError::texture(format!(
                "canvas size {width}x{height} outside 1..={MAX_CANVAS_SIDE}"
            )));
        }
        Ok(Self {
            image: RgbaImage::new(width, height),
            op: CompositeOp::SourceOver,
            global_alpha: 1.0,
        })
    }

    /// Canvas pre-filled with an opaque colour.
    ///
    /// # Errors
    ///
    /// Same as [`Canvas::new`].
    pub fn filled(width: u32, height: u32, color: Color) -> OrreryResult<Self> {
        let mut canvas = Self::new(width, height)?;
        let px = Rgba([color.r, color.g, color.b, color.a]);
        for p in canvas.image.pixels_mut() {
            *p = px;
        }
        Ok(canvas)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Set the compositing operator for subsequent draws.
    pub fn set_composite(&mut self, op: CompositeOp) {
        self.op = op;
    }

    /// Set the alpha multiplier for subsequent draws.
    pub fn set_global_alpha(&mut self, alpha: f64) {
        self.global_alpha = alpha.clamp(0.0, 1.0);
    }

    /// Read one pixel. Out-of-range coordinates return transparent.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.image
            .get_pixel_checked(x, y)
            .map_or(Color::TRANSPARENT, |p| Color::new(p[0], p[1], p[2], p[3]))
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Fill an axis-aligned rectangle.
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, paint: &Paint) {
        let (x0, x1) = self.span_x(x, x + w);
        let (y0, y1) = self.span_y(y, y + h);
        for py in y0..y1 {
            for px in x0..x1 {
                self.paint_pixel(px, py, paint);
            }
        }
    }

    /// Fill a circle.
    pub fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, paint: &Paint) {
        self.fill_ellipse(cx, cy, r, r, paint);
    }

    /// Stroke the outline of a circle.
    pub fn stroke_circle(&mut self, cx: f64, cy: f64, r: f64, line_width: f64, color: Color) {
        let half = line_width.max(1.0) / 2.0;
        let (x0, x1) = self.span_x(cx - r - half, cx + r + half);
        let (y0, y1) = self.span_y(cy - r - half, cy + r + half);
        let paint = Paint::Solid(color);
        for py in y0..y1 {
            for px in x0..x1 {
                let d = (f64::from(px) + 0.5 - cx).hypot(f64::from(py) + 0.5 - cy);
                if (d - r).abs() <= half {
                    self.paint_pixel(px, py, &paint);
                }
            }
        }
    }

    /// Fill an axis-aligned ellipse.
    pub fn fill_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, paint: &Paint) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let (x0, x1) = self.span_x(cx - rx, cx + rx);
        let (y0, y1) = self.span_y(cy - ry, cy + ry);
        for py in y0..y1 {
            let dy = (f64::from(py) + 0.5 - cy) / ry;
            for px in x0..x1 {
                let dx = (f64::from(px) + 0.5 - cx) / rx;
                if dx * dx + dy * dy <= 1.0 {
                    self.paint_pixel(px, py, paint);
                }
            }
        }
    }

    /// Stroke an open polyline. Each covered pixel is painted once.
    pub fn stroke_polyline(&mut self, points: &[(f64, f64)], line_width: f64, paint: &Paint) {
        let half = (line_width.max(1.0) - 1.0) / 2.0;
        let mut covered: Vec<(u32, u32)> = Vec::new();

        for seg in points.windows(2) {
            let (ax, ay) = seg[0];
            let (bx, by) = seg[1];
            let len = (bx - ax).hypot(by - ay);
            let steps = (len * 2.0).ceil().max(1.0) as usize;
            for s in 0..=steps {
                let t = s as f64 / steps as f64;
                let x = ax + (bx - ax) * t;
                let y = ay + (by - ay) * t;
                let (x0, x1) = self.span_x(x - half - 0.5, x + half + 0.5);
                let (y0, y1) = self.span_y(y - half - 0.5, y + half + 0.5);
                for py in y0..y1 {
                    for px in x0..x1 {
                        covered.push((px, py));
                    }
                }
            }
        }

        covered.sort_unstable();
        covered.dedup();
        for (px, py) in covered {
            self.paint_pixel(px, py, paint);
        }
    }

    /// Separable three-pass box blur approximating a Gaussian of the
    /// given radius. Colour is blurred premultiplied.
    pub fn box_blur(&mut self, radius: u32) {
        if radius == 0 {
            return;
        }
        let (w, h) = (self.width() as usize, self.height() as usize);
        let mut buf: Vec<[f32; 4]> = self
            .image
            .pixels()
            .map(|p| {
                let a = f32::from(p[3]) / 255.0;
                [
                    f32::from(p[0]) * a,
                    f32::from(p[1]) * a,
                    f32::from(p[2]) * a,
                    f32::from(p[3]),
                ]
            })
            .collect();
        let mut tmp = buf.clone();
        let r = radius as usize;

        for _ in 0..3 {
            blur_pass(&buf, &mut tmp, w, h, r, true);
            blur_pass(&tmp, &mut buf, w, h, r, false);
        }

        for (p, v) in self.image.pixels_mut().zip(buf) {
            let a = v[3];
            let un = if a > 0.0 { 255.0 / a } else { 0.0 };
            *p = Rgba([
                (v[0] * un).round().clamp(0.0, 255.0) as u8,
                (v[1] * un).round().clamp(0.0, 255.0) as u8,
                (v[2] * un).round().clamp(0.0, 255.0) as u8,
                a.round().clamp(0.0, 255.0) as u8,
            ]);
        }
    }

    /// Composite another canvas of the same size on top of this one.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::Texture`] on a size mismatch.
    pub fn draw_canvas(&mut self, layer: &Self) -> OrreryResult<()> {
        if layer.width() != self.width() || layer.height() != self.height() {
            return Err(OrreryError::texture("layer size mismatch"));
        }
        for (x, y, p) in layer.image.enumerate_pixels() {
            if p[3] > 0 {
                self.blend(x, y, Color::new(p[0], p[1], p[2], p[3]));
            }
        }
        Ok(())
    }

    fn span_x(&self, from: f64, to: f64) -> (u32, u32) {
        span(from, to, self.width())
    }

    fn span_y(&self, from: f64, to: f64) -> (u32, u32) {
        span(from, to, self.height())
    }

    fn paint_pixel(&mut self, x: u32, y: u32, paint: &Paint) {
        let color = paint.color_at(f64::from(x) + 0.5, f64::from(y) + 0.5);
        self.blend(x, y, color);
    }

    fn blend(&mut self, x: u32, y: u32, src: Color) {
        let sa = src.alpha() * self.global_alpha;
        if sa <= 0.0 {
            return;
        }
        let op = self.op;
        let Some(dst) = self.image.get_pixel_mut_checked(x, y) else {
            return;
        };
        let da = f64::from(dst[3]) / 255.0;
        let s = [f64::from(src.r), f64::from(src.g), f64::from(src.b)].map(|c| c / 255.0);
        let d = [f64::from(dst[0]), f64::from(dst[1]), f64::from(dst[2])].map(|c| c / 255.0);

        let (out_a, premul) = match op {
            CompositeOp::Lighter => {
                let out_a = (sa + da).min(1.0);
                (out_a, [0, 1, 2].map(|i| (s[i] * sa + d[i] * da).min(1.0)))
            }
            CompositeOp::SourceOver | CompositeOp::Screen => {
                let out_a = sa + da * (1.0 - sa);
                let premul = [0, 1, 2].map(|i| {
                    let mixed = if op == CompositeOp::Screen {
                        s[i] + d[i] - s[i] * d[i]
                    } else {
                        s[i]
                    };
                    s[i] * sa * (1.0 - da) + d[i] * da * (1.0 - sa) + sa * da * mixed
                });
                (out_a, premul)
            }
        };

        let un = if out_a > 0.0 { 1.0 / out_a } else { 0.0 };
        let to_byte = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        *dst = Rgba([
            to_byte(premul[0] * un),
            to_byte(premul[1] * un),
            to_byte(premul[2] * un),
            to_byte(out_a),
        ]);
    }
}

/// Pixel index range whose centres fall in `[from, to)`.
fn span(from: f64, to: f64, limit: u32) -> (u32, u32) {
    let lo = (from - 0.5).ceil().max(0.0);
    let hi = (to - 0.5).ceil().max(0.0);
    let lo = (lo as u64).min(u64::from(limit)) as u32;
    let hi = (hi as u64).min(u64::from(limit)) as u32;
    (lo, hi.max(lo))
}

fn blur_pass(src: &[[f32; 4]], dst: &mut [[f32; 4]], w: usize, h: usize, r: usize, horizontal: bool) {
    let (lines, len) = if horizontal { (h, w) } else { (w, h) };
    let idx = |line: usize, i: usize| if horizontal { line * w + i } else { i * w + line };
    let norm = 1.0 / (2 * r + 1) as f32;

    for line in 0..lines {
        let mut acc = [0.0f32; 4];
        // Edge pixels are repeated beyond the border.
        for k in 0..=(2 * r) {
            let i = k.saturating_sub(r).min(len - 1);
            let v = src[idx(line, i)];
            for c in 0..4 {
                acc[c] += v[c];
            }
        }
        for i in 0..len {
            dst[idx(line, i)] = acc.map(|a| a * norm);
            let out = src[idx(line, i.saturating_sub(r))];
            let inn = src[idx(line, (i + r + 1).min(len - 1))];
            for c in 0..4 {
                acc[c] += inn[c] - out[c];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(w: u32, h: u32, c: Color) -> Canvas {
        Canvas::filled(w, h, c).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(Canvas::new(0, 10), Err(OrreryError::Texture(_))));
        assert!(Canvas::new(MAX_CANVAS_SIDE + 1, 1).is_err());
    }

    #[test]
    fn test_fill_rect_covers_pixel_centres() {
        let mut c = canvas(8, 8, Color::BLACK);
        c.fill_rect(2.0, 2.0, 2.0, 2.0, &Paint::Solid(Color::WHITE));
        assert_eq!(c.pixel(2, 2), Color::WHITE);
        assert_eq!(c.pixel(3, 3), Color::WHITE);
        assert_eq!(c.pixel(4, 4), Color::BLACK);
        assert_eq!(c.pixel(1, 2), Color::BLACK);
    }

    #[test]
    fn test_fill_rect_clips_to_canvas() {
        let mut c = canvas(4, 4, Color::BLACK);
        c.fill_rect(-10.0, -10.0, 100.0, 100.0, &Paint::Solid(Color::WHITE));
        assert!(c.image().pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_source_over_half_alpha() {
        let mut c = canvas(1, 1, Color::BLACK);
        c.fill_rect(0.0, 0.0, 1.0, 1.0, &Paint::Solid(Color::rgba(255, 255, 255, 0.5)));
        let p = c.pixel(0, 0);
        assert!((i32::from(p.r) - 128).abs() <= 1);
        assert_eq!(p.a, 255);
    }

    #[test]
    fn test_lighter_accumulates() {
        let mut c = canvas(1, 1, Color::BLACK);
        c.set_composite(CompositeOp::Lighter);
        let paint = Paint::Solid(Color::rgba(100, 0, 0, 1.0));
        c.fill_rect(0.0, 0.0, 1.0, 1.0, &paint);
        c.fill_rect(0.0, 0.0, 1.0, 1.0, &paint);
        assert_eq!(c.pixel(0, 0).r, 200);
        c.fill_rect(0.0, 0.0, 1.0, 1.0, &paint);
        assert_eq!(c.pixel(0, 0).r, 255);
    }

    #[test]
    fn test_screen_never_darkens() {
        let base = Color::rgb(120, 60, 30);
        let mut c = canvas(1, 1, base);
        c.set_composite(CompositeOp::Screen);
        c.fill_rect(0.0, 0.0, 1.0, 1.0, &Paint::Solid(Color::rgba(20, 25, 50, 0.4)));
        let p = c.pixel(0, 0);
        assert!(p.r >= base.r && p.g >= base.g && p.b >= base.b);
    }

    #[test]
    fn test_global_alpha_scales_source() {
        let mut c = canvas(1, 1, Color::BLACK);
        c.set_global_alpha(0.0);
        c.fill_rect(0.0, 0.0, 1.0, 1.0, &Paint::Solid(Color::WHITE));
        assert_eq!(c.pixel(0, 0), Color::BLACK);
    }

    #[test]
    fn test_fill_circle_area() {
        let mut c = canvas(64, 64, Color::BLACK);
        c.fill_circle(32.0, 32.0, 10.0, &Paint::Solid(Color::WHITE));
        let lit = c.image().pixels().filter(|p| p[0] == 255).count() as f64;
        let expected = std::f64::consts::PI * 100.0;
        assert!((lit - expected).abs() / expected < 0.1, "lit {lit}");
    }

    #[test]
    fn test_stroke_circle_leaves_centre() {
        let mut c = canvas(32, 32, Color::BLACK);
        c.stroke_circle(16.0, 16.0, 8.0, 1.0, Color::WHITE);
        assert_eq!(c.pixel(16, 16), Color::BLACK);
        assert_eq!(c.pixel(23, 16), Color::WHITE);
    }

    #[test]
    fn test_vertical_gradient_midpoint() {
        let mut c = canvas(1, 101, Color::BLACK);
        let paint = Paint::LinearY {
            y0: 0.0,
            y1: 101.0,
            stops: vec![(0.0, Color::BLACK), (1.0, Color::WHITE)],
        };
        c.fill_rect(0.0, 0.0, 1.0, 101.0, &paint);
        let mid = c.pixel(0, 50).r;
        assert!((i32::from(mid) - 128).abs() <= 2, "mid {mid}");
        assert!(c.pixel(0, 0).r < c.pixel(0, 100).r);
    }

    #[test]
    fn test_radial_gradient_fades_out() {
        let paint = Paint::Radial {
            cx: 0.0,
            cy: 0.0,
            radius: 10.0,
            stops: vec![(0.0, Color::WHITE), (1.0, Color::TRANSPARENT)],
        };
        assert_eq!(paint.color_at(0.0, 0.0), Color::WHITE);
        assert_eq!(paint.color_at(20.0, 0.0).a, 0);
    }

    #[test]
    fn test_polyline_paints_each_pixel_once() {
        let mut c = canvas(16, 4, Color::BLACK);
        c.set_composite(CompositeOp::Lighter);
        c.stroke_polyline(
            &[(0.0, 1.5), (8.0, 1.5), (16.0, 1.5)],
            1.0,
            &Paint::Solid(Color::rgb(10, 10, 10)),
        );
        // The shared vertex would be brighter if painted twice.
        assert_eq!(c.pixel(8, 1).r, 10);
        assert_eq!(c.pixel(3, 1).r, 10);
    }

    #[test]
    fn test_box_blur_spreads_and_conserves() {
        let mut c = canvas(21, 21, Color::BLACK);
        c.fill_rect(10.0, 10.0, 1.0, 1.0, &Paint::Solid(Color::WHITE));
        let before: u64 = c.image().pixels().map(|p| u64::from(p[0])).sum();
        c.box_blur(2);
        assert!(c.pixel(10, 10).r < 255);
        assert!(c.pixel(12, 10).r > 0);
        let after: u64 = c.image().pixels().map(|p| u64::from(p[0])).sum();
        let drift = (after as f64 - before as f64).abs() / before as f64;
        assert!(drift < 0.2, "energy drift {drift}");
    }

    #[test]
    fn test_draw_canvas_size_mismatch() {
        let mut a = canvas(4, 4, Color::BLACK);
        let b = canvas(2, 2, Color::WHITE);
        assert!(a.draw_canvas(&b).is_err());
    }
}
