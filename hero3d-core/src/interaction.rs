/// Pointer and touch drag handling.
///
/// [`InteractionController`] is a two-state machine (idle / dragging) that
/// turns pointer deltas into target changes on a [`DragTarget`]. Object
/// rotation and the panorama look-around share it; they differ only in what
/// a drag moves.
use crate::config::SceneConfig;
use crate::transform::RotationState;

/// Something a drag gesture steers
pub trait DragTarget {
    /// Apply a pointer delta in pixels
    fn drag(&mut self, dx: f64, dy: f64);
    /// Called once per frame while no gesture is in progress
    fn idle(&mut self);
    /// Called once per frame in every state: ease current values to targets
    fn settle(&mut self);
}

/// Drag-driven rotation of a rigid scene
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRotation {
    pub rotation: RotationState,
    pub sensitivity_x: f64,
    pub sensitivity_y: f64,
    pub damping: f64,
    /// Per-frame yaw added while idle, if auto-rotation is on
    pub auto_rotate: Option<f64>,
}

impl ObjectRotation {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            rotation: RotationState::zero(),
            sensitivity_x: config.sensitivity_x,
            sensitivity_y: config.sensitivity_y,
            damping: config.damping,
            auto_rotate: config.auto_rotate.then_some(config.auto_rotate_speed),
        }
    }
}

impl DragTarget for ObjectRotation {
    fn drag(&mut self, dx: f64, dy: f64) {
        self.rotation.rotate(dy * self.sensitivity_y, dx * self.sensitivity_x);
    }

    fn idle(&mut self) {
        if let Some(speed) = self.auto_rotate {
            self.rotation.target_y += speed;
        }
    }

    fn settle(&mut self) {
        self.rotation.step(self.damping);
    }
}

/// One continuous press-drag-release gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerDragSession {
    pub last_x: f64,
    pub last_y: f64,
    /// Identifier of the driving touch point; `None` for a mouse
    pub touch: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging(PointerDragSession),
}

/// Two-state gesture machine feeding a [`DragTarget`]
#[derive(Debug, Clone)]
pub struct InteractionController<T> {
    target: T,
    state: DragState,
}

impl<T: DragTarget> InteractionController<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            state: DragState::Idle,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.begin(x, y, None);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if let DragState::Dragging(session) = self.state {
            if session.touch.is_none() {
                self.advance(x, y);
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.end_pointer();
    }

    /// The cursor left the drawing surface
    pub fn pointer_leave(&mut self) {
        self.end_pointer();
    }

    /// A finger touched down. Only the first simultaneous touch drives.
    pub fn touch_start(&mut self, id: i64, x: f64, y: f64) {
        self.begin(x, y, Some(id));
    }

    pub fn touch_move(&mut self, id: i64, x: f64, y: f64) {
        if let DragState::Dragging(session) = self.state {
            if session.touch == Some(id) {
                self.advance(x, y);
            }
        }
    }

    pub fn touch_end(&mut self, id: i64) {
        if let DragState::Dragging(session) = self.state {
            if session.touch == Some(id) {
                self.state = DragState::Idle;
            }
        }
    }

    /// Per-frame update: idle behaviour, then smoothing
    pub fn tick(&mut self) {
        if !self.is_dragging() {
            self.target.idle();
        }
        self.target.settle();
    }

    fn begin(&mut self, x: f64, y: f64, touch: Option<i64>) {
        if self.is_dragging() {
            return;
        }
        self.state = DragState::Dragging(PointerDragSession {
            last_x: x,
            last_y: y,
            touch,
        });
    }

    fn advance(&mut self, x: f64, y: f64) {
        if let DragState::Dragging(ref mut session) = self.state {
            let dx = x - session.last_x;
            let dy = y - session.last_y;
            session.last_x = x;
            session.last_y = y;
            self.target.drag(dx, dy);
        }
    }

    fn end_pointer(&mut self) {
        if let DragState::Dragging(session) = self.state {
            if session.touch.is_none() {
                self.state = DragState::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(auto_rotate: bool) -> InteractionController<ObjectRotation> {
        let config = SceneConfig {
            auto_rotate,
            ..SceneConfig::default()
        };
        InteractionController::new(ObjectRotation::from_config(&config))
    }

    #[test]
    fn test_drag_moves_targets() {
        let mut c = controller(false);
        c.pointer_down(100.0, 100.0);
        assert!(c.is_dragging());
        c.pointer_move(130.0, 80.0);
        let r = c.target().rotation;
        assert!((r.target_y - 0.3).abs() < 1e-12);
        assert!((r.target_x + 0.2).abs() < 1e-12);
        assert_eq!(r.current_y, 0.0);

        // last position was updated, so the next delta is relative to it
        c.pointer_move(140.0, 80.0);
        assert!((c.target().rotation.target_y - 0.4).abs() < 1e-12);

        c.pointer_up();
        assert_eq!(c.state(), DragState::Idle);
        c.pointer_move(500.0, 500.0);
        assert!((c.target().rotation.target_y - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_leave_ends_drag() {
        let mut c = controller(false);
        c.pointer_down(0.0, 0.0);
        c.pointer_leave();
        assert!(!c.is_dragging());
    }

    #[test]
    fn test_idle_auto_rotation_is_linear() {
        let mut c = controller(true);
        let speed = SceneConfig::default().auto_rotate_speed;
        let initial = c.target().rotation.target_y;
        let frames = 37;
        for _ in 0..frames {
            c.tick();
        }
        let expected = initial + frames as f64 * speed;
        assert!((c.target().rotation.target_y - expected).abs() < 1e-12);
    }

    #[test]
    fn test_no_auto_rotation_while_dragging() {
        let mut c = controller(true);
        c.pointer_down(0.0, 0.0);
        for _ in 0..10 {
            c.tick();
        }
        assert_eq!(c.target().rotation.target_y, 0.0);
    }

    #[test]
    fn test_tick_smooths_towards_target() {
        let mut c = controller(false);
        c.target_mut().rotation.target_x = 1.0;
        c.tick();
        assert!((c.target().rotation.current_x - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_only_first_touch_drives() {
        let mut c = controller(false);
        c.touch_start(1, 10.0, 10.0);
        c.touch_start(2, 50.0, 50.0);
        c.touch_move(2, 90.0, 90.0);
        assert_eq!(c.target().rotation.target_y, 0.0);

        c.touch_move(1, 20.0, 10.0);
        assert!((c.target().rotation.target_y - 0.1).abs() < 1e-12);

        c.touch_end(2);
        assert!(c.is_dragging());
        c.touch_end(1);
        assert!(!c.is_dragging());
    }

    #[test]
    fn test_mouse_does_not_hijack_touch() {
        let mut c = controller(false);
        c.touch_start(7, 0.0, 0.0);
        c.pointer_down(100.0, 100.0);
        c.pointer_move(200.0, 100.0);
        c.pointer_up();
        assert!(c.is_dragging());
        assert_eq!(c.target().rotation.target_y, 0.0);
    }
}
