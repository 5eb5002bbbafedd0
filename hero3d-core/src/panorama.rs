/// Look-around viewer over an equirectangular image.
///
/// Drags move longitude/latitude targets instead of rotating an object.
/// Latitude is clamped so the view never flips over a pole.
use crate::config::PanoramaConfig;
use crate::interaction::DragTarget;

/// Viewing direction in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaView {
    pub longitude: f64,
    pub latitude: f64,
    pub target_longitude: f64,
    pub target_latitude: f64,
    sensitivity: f64,
    latitude_limit: f64,
    damping: f64,
    auto_rotate: Option<f64>,
    field_of_view: f64,
}

impl PanoramaView {
    pub fn new(config: &PanoramaConfig) -> Self {
        Self {
            longitude: 0.0,
            latitude: 0.0,
            target_longitude: 0.0,
            target_latitude: 0.0,
            sensitivity: config.sensitivity,
            latitude_limit: config.latitude_limit,
            damping: config.damping,
            auto_rotate: config.auto_rotate.then_some(config.auto_rotate_speed),
            field_of_view: config.field_of_view,
        }
    }

    /// Rectangle of an `image_width` x `image_height` equirectangular image
    /// visible through a viewport of the given aspect ratio (width / height)
    pub fn source_window(&self, image_width: f64, image_height: f64, aspect: f64) -> SourceWindow {
        let width = (image_width * self.field_of_view / 360.0).min(image_width);
        let height = if aspect > 0.0 {
            (width / aspect).min(image_height)
        } else {
            image_height
        };

        let center_x = self.longitude.rem_euclid(360.0) / 360.0 * image_width;
        let center_y = (90.0 - self.latitude) / 180.0 * image_height;

        SourceWindow {
            x: (center_x - width / 2.0).rem_euclid(image_width.max(f64::MIN_POSITIVE)),
            y: (center_y - height / 2.0).clamp(0.0, (image_height - height).max(0.0)),
            width,
            height,
        }
    }
}

impl DragTarget for PanoramaView {
    fn drag(&mut self, dx: f64, dy: f64) {
        self.target_longitude -= dx * self.sensitivity;
        self.target_latitude = (self.target_latitude + dy * self.sensitivity)
            .clamp(-self.latitude_limit, self.latitude_limit);
    }

    fn idle(&mut self) {
        if let Some(speed) = self.auto_rotate {
            self.target_longitude += speed;
        }
    }

    fn settle(&mut self) {
        self.longitude += (self.target_longitude - self.longitude) * self.damping;
        self.latitude += (self.target_latitude - self.latitude) * self.damping;
    }
}

/// Source rectangle in image pixels; `x` may run past the right edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceWindow {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A horizontal piece of a [`SourceWindow`] and where it lands on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slice {
    pub src_x: f64,
    pub src_width: f64,
    /// Fraction of the destination width where this slice starts
    pub dst_start: f64,
    pub dst_fraction: f64,
}

impl SourceWindow {
    /// Split at the image seam so each piece is a contiguous source rectangle
    pub fn slices(&self, image_width: f64) -> Vec<Slice> {
        if self.width <= 0.0 {
            return Vec::new();
        }
        let first = (image_width - self.x).min(self.width);
        let mut slices = vec![Slice {
            src_x: self.x,
            src_width: first,
            dst_start: 0.0,
            dst_fraction: first / self.width,
        }];
        if first < self.width {
            slices.push(Slice {
                src_x: 0.0,
                src_width: self.width - first,
                dst_start: first / self.width,
                dst_fraction: (self.width - first) / self.width,
            });
        }
        slices
    }
}
