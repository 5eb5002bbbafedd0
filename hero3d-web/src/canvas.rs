/// 2D canvas implementation of the paint surface
use hero3d_core::{Gradient, InitError, Rgba, Surface, Viewport};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Get the 2D context of `canvas` and size its backing store to the layout
    pub fn acquire(canvas: &HtmlCanvasElement) -> Result<Self, InitError> {
        let context = canvas
            .get_context("2d")
            .map_err(|err| InitError::SurfaceUnavailable(format!("{err:?}")))?
            .ok_or_else(|| InitError::SurfaceUnavailable("no 2d context".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| InitError::SurfaceUnavailable("unexpected context type".to_string()))?;

        let mut surface = Self {
            canvas: canvas.clone(),
            context,
        };
        let (width, height) = surface.client_size();
        surface.resize(width, height);
        Ok(surface)
    }

    /// Size the canvas occupies in the page layout
    pub fn client_size(&self) -> (f64, f64) {
        (
            self.canvas.client_width().max(0) as f64,
            self.canvas.client_height().max(0) as f64,
        )
    }

    pub(crate) fn context(&self) -> &CanvasRenderingContext2d {
        &self.context
    }

    fn trace(&self, points: &[(f64, f64)]) {
        self.context.begin_path();
        self.context.move_to(points[0].0, points[0].1);
        for &(x, y) in &points[1..] {
            self.context.line_to(x, y);
        }
        self.context.close_path();
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Viewport {
        Viewport::new(self.canvas.width() as f64, self.canvas.height() as f64)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.canvas.set_width(width.max(0.0) as u32);
        self.canvas.set_height(height.max(0.0) as u32);
    }

    fn clear(&mut self) {
        let size = self.size();
        self.context.clear_rect(0.0, 0.0, size.width, size.height);
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)], gradient: &Gradient, stroke: Rgba) {
        if points.len() < 3 {
            return;
        }
        self.trace(points);

        let fill = self.context.create_linear_gradient(
            gradient.start.0,
            gradient.start.1,
            gradient.end.0,
            gradient.end.1,
        );
        // Stops only fail on malformed colour strings
        let _ = fill.add_color_stop(0.0, &gradient.from.to_css());
        let _ = fill.add_color_stop(1.0, &gradient.to.to_css());
        self.context.set_fill_style_canvas_gradient(&fill);
        self.context.fill();

        self.context.set_stroke_style_str(&stroke.to_css());
        self.context.set_line_width(1.0);
        self.context.stroke();
    }
}
