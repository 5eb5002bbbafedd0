/// Coloured-cell rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use hero3d_core::{Gradient, Rgb, Rgba, Surface, Viewport};
use std::io::Write;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f64 = 2.0;

const BACKGROUND: Rgb = Rgb::new(12, 14, 22);

/// Painter's-order surface over a grid of terminal cells.
///
/// Surface coordinates are in half-cell units vertically so that a square in
/// scene space stays square on screen.
pub struct CellSurface {
    columns: usize,
    rows: usize,
    /// Terminal row where surface row 0 is drawn
    row_offset: u16,
    cells: Vec<Rgb>,
}

impl CellSurface {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            row_offset: 0,
            cells: vec![BACKGROUND; columns * rows],
        }
    }

    pub fn with_row_offset(mut self, row_offset: u16) -> Self {
        self.row_offset = row_offset;
        self
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<Rgb> {
        (column < self.columns && row < self.rows).then(|| self.cells[row * self.columns + column])
    }

    /// Centre of a surface cell in surface coordinates
    pub fn to_surface(column: u16, row: u16) -> (f64, f64) {
        (column as f64 + 0.5, (row as f64 + 0.5) * CELL_ASPECT)
    }

    /// Terminal position to surface coordinates, accounting for the row offset
    pub fn from_terminal(&self, column: u16, row: u16) -> (f64, f64) {
        Self::to_surface(column, row.saturating_sub(self.row_offset))
    }

    /// Surface size for a terminal of `columns` x `rows`
    pub fn extent_for(&self, columns: u16, rows: u16) -> (f64, f64) {
        (
            columns as f64,
            rows.saturating_sub(self.row_offset) as f64 * CELL_ASPECT,
        )
    }

    fn fill_triangle(&mut self, v0: (f64, f64), v1: (f64, f64), v2: (f64, f64), gradient: &Gradient) {
        // Bounding box in cells
        let min_x = v0.0.min(v1.0).min(v2.0).floor().max(0.0) as usize;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil().min(self.columns as f64) as usize;
        let min_y = (v0.1.min(v1.1).min(v2.1) / CELL_ASPECT).floor().max(0.0) as usize;
        let max_y = (v0.1.max(v1.1).max(v2.1) / CELL_ASPECT)
            .ceil()
            .min(self.rows as f64) as usize;

        for row in min_y..max_y {
            for column in min_x..max_x {
                let (px, py) = Self::to_surface(column as u16, row as u16);
                if let Some((w0, w1, w2)) = barycentric(v0, v1, v2, (px, py)) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        self.cells[row * self.columns + column] = gradient.color_at(px, py);
                    }
                }
            }
        }
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), stroke: Rgba) {
        let (x0, y0) = (from.0, from.1 / CELL_ASPECT);
        let (x1, y1) = (to.0, to.1 / CELL_ASPECT);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let x = (x0 + (x1 - x0) * t).floor();
            let y = (y0 + (y1 - y0) * t).floor();
            if x < 0.0 || y < 0.0 || x >= self.columns as f64 || y >= self.rows as f64 {
                continue;
            }
            let index = y as usize * self.columns + x as usize;
            self.cells[index] = blend(self.cells[index], stroke);
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in 0..self.rows {
            writer.queue(cursor::MoveTo(0, row as u16 + self.row_offset))?;
            for column in 0..self.columns {
                let c = self.cells[row * self.columns + column];
                writer.queue(SetBackgroundColor(Color::Rgb {
                    r: c.r,
                    g: c.g,
                    b: c.b,
                }))?;
                writer.queue(Print(' '))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    /// Print `text` centred on the bottom row
    pub fn draw_caption<W: Write>(&self, writer: &mut W, text: &str) -> std::io::Result<()> {
        if self.rows == 0 {
            return Ok(());
        }
        let column = self.columns.saturating_sub(text.chars().count()) / 2;
        writer.queue(cursor::MoveTo(
            column as u16,
            (self.rows - 1) as u16 + self.row_offset,
        ))?;
        writer.queue(SetForegroundColor(Color::Grey))?;
        writer.queue(Print(text))?;
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Surface for CellSurface {
    fn size(&self) -> Viewport {
        Viewport::new(self.columns as f64, self.rows as f64 * CELL_ASPECT)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.columns = width.max(0.0) as usize;
        self.rows = (height / CELL_ASPECT).max(0.0) as usize;
        self.cells = vec![BACKGROUND; self.columns * self.rows];
    }

    fn clear(&mut self) {
        self.cells.fill(BACKGROUND);
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)], gradient: &Gradient, stroke: Rgba) {
        if points.len() < 3 {
            return;
        }
        // Convex faces: fan out from the first corner
        for i in 1..points.len() - 1 {
            self.fill_triangle(points[0], points[i], points[i + 1], gradient);
        }
        for i in 0..points.len() {
            self.stroke_line(points[i], points[(i + 1) % points.len()], stroke);
        }
    }
}

fn blend(under: Rgb, over: Rgba) -> Rgb {
    let mix = |a: u8, b: u8| (a as f64 * (1.0 - over.alpha) + b as f64 * over.alpha).round() as u8;
    Rgb::new(
        mix(under.r, over.rgb.r),
        mix(under.g, over.rgb.g),
        mix(under.b, over.rgb.b),
    )
}

/// Calculate barycentric coordinates for a point in a triangle.
///
/// Winding-independent: weights are normalised by the signed area.
fn barycentric(
    v0: (f64, f64),
    v1: (f64, f64),
    v2: (f64, f64),
    p: (f64, f64),
) -> Option<(f64, f64, f64)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-9 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: Rgb) -> Gradient {
        Gradient {
            start: (0.0, 0.0),
            end: (0.0, 0.0),
            from: color,
            to: color,
        }
    }

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);
    const NO_STROKE: Rgba = Rgba {
        rgb: Rgb::new(255, 255, 255),
        alpha: 0.0,
    };

    #[test]
    fn test_size_compensates_cell_aspect() {
        let surface = CellSurface::new(80, 24);
        assert_eq!(surface.size(), Viewport::new(80.0, 48.0));
    }

    #[test]
    fn test_fill_quad_either_winding() {
        let mut surface = CellSurface::new(10, 10);
        let square = [(2.0, 4.0), (8.0, 4.0), (8.0, 16.0), (2.0, 16.0)];
        surface.fill_polygon(&square, &solid(RED), NO_STROKE);
        assert_eq!(surface.cell(5, 4), Some(RED));
        assert_eq!(surface.cell(0, 0), Some(BACKGROUND));

        let mut reversed = square;
        reversed.reverse();
        surface.clear();
        surface.fill_polygon(&reversed, &solid(BLUE), NO_STROKE);
        assert_eq!(surface.cell(5, 4), Some(BLUE));
    }

    #[test]
    fn test_later_polygons_paint_over_earlier() {
        let mut surface = CellSurface::new(10, 10);
        let big = [(0.0, 0.0), (10.0, 0.0), (10.0, 20.0), (0.0, 20.0)];
        let small = [(4.0, 8.0), (6.0, 8.0), (6.0, 12.0), (4.0, 12.0)];
        surface.fill_polygon(&big, &solid(RED), NO_STROKE);
        surface.fill_polygon(&small, &solid(BLUE), NO_STROKE);
        assert_eq!(surface.cell(4, 4), Some(BLUE));
        assert_eq!(surface.cell(1, 1), Some(RED));
    }

    #[test]
    fn test_clipping_and_resize() {
        let mut surface = CellSurface::new(4, 4);
        let huge = [(-100.0, -100.0), (100.0, -100.0), (100.0, 100.0), (-100.0, 100.0)];
        surface.fill_polygon(&huge, &solid(RED), NO_STROKE);
        assert_eq!(surface.cell(3, 3), Some(RED));

        surface.resize(6.0, 4.0);
        assert_eq!((surface.columns(), surface.rows()), (6, 2));
        assert_eq!(surface.cell(0, 0), Some(BACKGROUND));
        assert_eq!(surface.cell(6, 0), None);
    }

    #[test]
    fn test_stroke_blends() {
        let mut surface = CellSurface::new(10, 10);
        let stroke = Rgba::new(Rgb::new(255, 255, 255), 0.5);
        surface.stroke_line((0.5, 1.0), (9.5, 1.0), stroke);
        let edge = surface.cell(5, 0).unwrap();
        assert!(edge.r > BACKGROUND.r && edge.r < 255);
        assert_eq!(surface.cell(5, 5), Some(BACKGROUND));
    }

    #[test]
    fn test_row_offset_mapping() {
        let surface = CellSurface::new(80, 23).with_row_offset(1);
        assert_eq!(surface.from_terminal(3, 1), (3.5, 1.0));
        assert_eq!(surface.extent_for(100, 31), (100.0, 60.0));
    }

    #[test]
    fn test_draw_writes_every_cell() {
        let surface = CellSurface::new(3, 2);
        let mut out = Vec::new();
        surface.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(' ').count(), 6);
    }
}
