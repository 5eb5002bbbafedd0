/// Mount/teardown of a scene on a host view.
///
/// A host (terminal loop, browser canvas) implements [`FrameHost`] to supply
/// frame scheduling and event listener registration. [`SceneHandle`] owns all
/// per-view state; there is nothing global. Everything acquired by
/// [`SceneHandle::create`] is released by [`SceneHandle::dispose`], which may
/// be called any number of times.
use tracing::{debug, trace, warn};

use crate::config::SceneConfig;
use crate::error::{InitError, LoadError};
use crate::geometry::{Mesh, Scene};
use crate::interaction::{InteractionController, ObjectRotation};
use crate::paint::Surface;
use crate::projection::Viewport;
use crate::render::FrameRenderer;
use crate::transform::RotationState;

pub type FrameToken = u64;
pub type ListenerId = u64;

/// Input the module listens for on the host view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
    TouchStart,
    TouchMove,
    TouchEnd,
    Resize,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 8] = [
        ListenerKind::PointerDown,
        ListenerKind::PointerMove,
        ListenerKind::PointerUp,
        ListenerKind::PointerLeave,
        ListenerKind::TouchStart,
        ListenerKind::TouchMove,
        ListenerKind::TouchEnd,
        ListenerKind::Resize,
    ];
}

/// Scheduling and listener services provided by the embedding view
pub trait FrameHost {
    /// Ask for one callback on the next display refresh.
    ///
    /// `None` means the host cannot schedule frames at all.
    fn request_frame(&mut self) -> Option<FrameToken>;

    fn cancel_frame(&mut self, token: FrameToken);

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId);

    /// Free graphics resources (buffers, textures) held for this view
    fn release_resources(&mut self);
}

/// Listener and frame-request bookkeeping shared by every mounted view.
///
/// At most one frame request is in flight at a time.
#[derive(Debug)]
pub struct Lifecycle<H: FrameHost> {
    host: H,
    listeners: Vec<ListenerId>,
    pending: Option<FrameToken>,
    disposed: bool,
}

impl<H: FrameHost> Lifecycle<H> {
    /// Register `kinds` and request the first frame
    pub fn start(mut host: H, kinds: &[ListenerKind]) -> Self {
        let listeners = kinds.iter().map(|&kind| host.add_listener(kind)).collect();
        let mut lifecycle = Self {
            host,
            listeners,
            pending: None,
            disposed: false,
        };
        lifecycle.schedule();
        lifecycle
    }

    /// Already torn down: nothing registered, nothing scheduled
    pub fn inert(mut host: H) -> Self {
        host.release_resources();
        Self {
            host,
            listeners: Vec::new(),
            pending: None,
            disposed: true,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Claim `token` as the current frame. Stale or foreign tokens are refused.
    pub fn accept(&mut self, token: FrameToken) -> bool {
        if self.disposed || self.pending != Some(token) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Request the next frame unless one is already pending.
    ///
    /// A host that refuses the request can never paint again, so the
    /// lifecycle tears itself down instead of waiting forever.
    pub fn schedule(&mut self) {
        if self.disposed || self.pending.is_some() {
            return;
        }
        match self.host.request_frame() {
            Some(token) => self.pending = Some(token),
            None => {
                warn!("host refused a frame request, tearing down");
                self.dispose();
            }
        }
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(token) = self.pending.take() {
            self.host.cancel_frame(token);
        }
        for id in self.listeners.drain(..) {
            self.host.remove_listener(id);
        }
        self.host.release_resources();
    }
}

struct Mounted<S> {
    surface: S,
    scene: Scene,
    controller: InteractionController<ObjectRotation>,
    renderer: FrameRenderer,
    frames: u64,
}

/// A scene mounted on one host view
pub struct SceneHandle<H: FrameHost, S: Surface> {
    lifecycle: Lifecycle<H>,
    mounted: Option<Mounted<S>>,
}

impl<H: FrameHost, S: Surface> SceneHandle<H, S> {
    /// Mount `scene` on the surface the host managed to acquire.
    ///
    /// If the surface or configuration is unusable the handle is inert:
    /// it never schedules a frame and renders nothing.
    pub fn create(
        host: H,
        surface: Result<S, InitError>,
        scene: Scene,
        config: &SceneConfig,
    ) -> Self {
        let surface = config
            .validate()
            .map_err(InitError::from)
            .and_then(|_| surface);
        let surface = match surface {
            Ok(surface) => surface,
            Err(err) => {
                warn!(%err, "scene initialization failed, rendering nothing");
                return Self {
                    lifecycle: Lifecycle::inert(host),
                    mounted: None,
                };
            }
        };

        let viewport = surface.size();
        debug!(
            meshes = scene.meshes.len(),
            faces = scene.face_count(),
            width = viewport.width,
            height = viewport.height,
            "mounting scene"
        );
        let renderer = FrameRenderer::new(config, &scene, viewport);
        let mounted = Mounted {
            surface,
            controller: InteractionController::new(ObjectRotation::from_config(config)),
            scene,
            renderer,
            frames: 0,
        };

        Self {
            lifecycle: Lifecycle::start(host, &ListenerKind::ALL),
            mounted: Some(mounted),
        }
    }

    /// Frame callback from the host
    pub fn on_frame(&mut self, token: FrameToken) {
        if !self.lifecycle.accept(token) {
            trace!(token, "ignoring stale frame");
            return;
        }
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };

        mounted.controller.tick();
        let commands = mounted
            .renderer
            .frame(&mounted.scene, &mounted.controller.target().rotation);
        mounted.surface.paint(&commands);
        mounted.frames += 1;
        trace!(frame = mounted.frames, commands = commands.len(), "painted");

        self.lifecycle.schedule();
    }

    /// The drawing surface changed size; takes effect before the next paint
    pub fn resize(&mut self, width: f64, height: f64) {
        if self.lifecycle.is_disposed() {
            return;
        }
        if let Some(mounted) = self.mounted.as_mut() {
            mounted.surface.resize(width, height);
            let viewport = Viewport::new(width, height);
            mounted.renderer.resize(&mounted.scene, viewport);
            debug!(width, height, "resized");
        }
    }

    /// A model load finished. Success replaces the placeholder scene; the
    /// most recent completion wins. Failure keeps the current scene.
    pub fn model_loaded(&mut self, result: Result<Mesh, LoadError>) {
        if self.lifecycle.is_disposed() {
            return;
        }
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        match result {
            Ok(mesh) => {
                let mut scene = Scene::new();
                match scene.add_mesh(mesh) {
                    Ok(_) => {
                        debug!(faces = scene.face_count(), "model loaded");
                        mounted.renderer.resize(&scene, mounted.renderer.viewport());
                        mounted.scene = scene;
                    }
                    Err(err) => warn!(%err, "loaded model is malformed, keeping placeholder"),
                }
            }
            Err(err) => warn!(%err, "model failed to load, keeping placeholder"),
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.with_controller(|c| c.pointer_down(x, y));
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.with_controller(|c| c.pointer_move(x, y));
    }

    pub fn pointer_up(&mut self) {
        self.with_controller(|c| c.pointer_up());
    }

    pub fn pointer_leave(&mut self) {
        self.with_controller(|c| c.pointer_leave());
    }

    pub fn touch_start(&mut self, id: i64, x: f64, y: f64) {
        self.with_controller(|c| c.touch_start(id, x, y));
    }

    pub fn touch_move(&mut self, id: i64, x: f64, y: f64) {
        self.with_controller(|c| c.touch_move(id, x, y));
    }

    pub fn touch_end(&mut self, id: i64) {
        self.with_controller(|c| c.touch_end(id));
    }

    fn with_controller(&mut self, f: impl FnOnce(&mut InteractionController<ObjectRotation>)) {
        if self.lifecycle.is_disposed() {
            return;
        }
        if let Some(mounted) = self.mounted.as_mut() {
            f(&mut mounted.controller);
        }
    }

    /// True once the first frame has been painted
    pub fn is_ready(&self) -> bool {
        self.mounted.as_ref().is_some_and(|m| m.frames > 0)
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }

    pub fn rotation(&self) -> Option<RotationState> {
        self.mounted
            .as_ref()
            .map(|m| m.controller.target().rotation)
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.mounted.as_ref().map(|m| &m.scene)
    }

    pub fn surface(&self) -> Option<&S> {
        self.mounted.as_ref().map(|m| &m.surface)
    }

    pub fn host(&self) -> &H {
        self.lifecycle.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.lifecycle.host_mut()
    }

    /// Stop frames, remove listeners and release resources. Idempotent.
    pub fn dispose(&mut self) {
        if self.lifecycle.is_disposed() {
            return;
        }
        debug!("disposing scene");
        self.lifecycle.dispose();
    }
}
