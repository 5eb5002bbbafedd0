/// Host-independent drawing commands and the surface that executes them
use crate::geometry::Rgb;
use crate::projection::Viewport;

/// Colour with opacity in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f64,
}

impl Rgba {
    pub fn new(rgb: Rgb, alpha: f64) -> Self {
        Self {
            rgb,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn to_css(self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.rgb.r, self.rgb.g, self.rgb.b, self.alpha
        )
    }
}

/// Two-stop linear gradient between screen points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub from: Rgb,
    pub to: Rgb,
}

impl Gradient {
    /// Light-to-dark gradient over `base`, running top to bottom of `points`
    pub fn over(points: &[(f64, f64)], base: Rgb) -> Self {
        let (mut top, mut bottom) = ((0.0, f64::INFINITY), (0.0, f64::NEG_INFINITY));
        for &(x, y) in points {
            if y < top.1 {
                top = (x, y);
            }
            if y > bottom.1 {
                bottom = (x, y);
            }
        }
        if points.is_empty() {
            top = (0.0, 0.0);
            bottom = (0.0, 0.0);
        }
        Self {
            start: top,
            end: bottom,
            from: base.lighten(0.15),
            to: base.darken(0.2),
        }
    }

    /// Colour at parameter `t` (0 = start, 1 = end)
    pub fn sample(&self, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(
            lerp(self.from.r, self.to.r),
            lerp(self.from.g, self.to.g),
            lerp(self.from.b, self.to.b),
        )
    }

    /// Project `(x, y)` onto the gradient axis and sample there
    pub fn color_at(&self, x: f64, y: f64) -> Rgb {
        let (ax, ay) = (self.end.0 - self.start.0, self.end.1 - self.start.1);
        let length_sq = ax * ax + ay * ay;
        if length_sq <= f64::EPSILON {
            return self.sample(0.0);
        }
        let t = ((x - self.start.0) * ax + (y - self.start.1) * ay) / length_sq;
        self.sample(t)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    Clear,
    Polygon {
        points: Vec<(f64, f64)>,
        gradient: Gradient,
        stroke: Rgba,
    },
}

/// A drawing target provided by the host
pub trait Surface {
    fn size(&self) -> Viewport;

    fn resize(&mut self, width: f64, height: f64);

    fn clear(&mut self);

    fn fill_polygon(&mut self, points: &[(f64, f64)], gradient: &Gradient, stroke: Rgba);

    /// Execute commands in order
    fn paint(&mut self, commands: &[PaintCommand]) {
        for command in commands {
            match command {
                PaintCommand::Clear => self.clear(),
                PaintCommand::Polygon {
                    points,
                    gradient,
                    stroke,
                } => self.fill_polygon(points, gradient, *stroke),
            }
        }
    }
}
