/// Hero3D Web - canvas hosts for hero scenes in the browser
///
/// Failures never surface as exceptions: an element that cannot be set up
/// stays blank and the reason goes to the console.
use std::cell::RefCell;
use std::rc::Rc;

use hero3d_core::{
    stl, InitError, Mesh, MeshError, PanoramaConfig, Rgb, Scene, SceneConfig, SceneHandle,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, HtmlImageElement, Window};

mod canvas;
mod host;
mod panorama;

pub use canvas::CanvasSurface;
pub use host::{Input, WebHost};

use host::{CanvasView, Slot};
use panorama::PanoramaState;

/// Log a diagnostic to tracing and to the browser console
pub(crate) fn report(message: &str) {
    tracing::warn!("{message}");
    web_sys::console::warn_1(&JsValue::from_str(message));
}

fn find_canvas(canvas_id: &str) -> Option<(Window, HtmlCanvasElement)> {
    let window = web_sys::window()?;
    let canvas = window
        .document()?
        .get_element_by_id(canvas_id)?
        .dyn_into::<HtmlCanvasElement>()
        .ok()?;
    Some((window, canvas))
}

fn build_scene(name: &str, palette: &[Rgb]) -> Result<Scene, MeshError> {
    match name {
        "cube" => Ok(Scene::single_cube(2.0, palette)),
        "house" => Scene::house(palette),
        "building" => Scene::building(palette),
        other => {
            report(&format!("unknown scene '{other}', showing the building"));
            Scene::building(palette)
        }
    }
}

struct HeroView(SceneHandle<WebHost, CanvasSurface>);

impl CanvasView for HeroView {
    fn frame(&mut self) {
        if let Some(token) = self.0.host_mut().take_due() {
            self.0.on_frame(token);
        }
    }

    fn input(&mut self, input: Input) {
        let handle = &mut self.0;
        match input {
            Input::PointerDown(x, y) => handle.pointer_down(x, y),
            Input::PointerMove(x, y) => handle.pointer_move(x, y),
            Input::PointerUp => handle.pointer_up(),
            Input::PointerLeave => handle.pointer_leave(),
            Input::TouchStart(id, x, y) => handle.touch_start(id, x, y),
            Input::TouchMove(id, x, y) => handle.touch_move(id, x, y),
            Input::TouchEnd(id) => handle.touch_end(id),
            Input::Resize => {
                if let Some((width, height)) = handle.surface().map(|s| s.client_size()) {
                    handle.resize(width, height);
                }
            }
        }
    }
}

/// A rotating scene mounted on a `<canvas>` element
#[wasm_bindgen]
pub struct HeroCanvas {
    view: Slot<HeroView>,
    color: Rgb,
}

#[wasm_bindgen]
impl HeroCanvas {
    /// Mount `scene` ("cube", "building" or "house") on the canvas with id
    /// `canvas_id`. `config_json` optionally overrides [`SceneConfig`] fields.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, scene: &str, config_json: Option<String>) -> HeroCanvas {
        let view: Slot<HeroView> = Rc::new(RefCell::new(None));

        let config = match config_json.as_deref().map(SceneConfig::from_json) {
            Some(Ok(config)) => Ok(config),
            Some(Err(err)) => Err(InitError::from(err)),
            None => Ok(SceneConfig::default()),
        };
        let color = config
            .as_ref()
            .ok()
            .and_then(|c| c.palette.first().copied())
            .unwrap_or(Rgb::GREY);

        let Some((window, canvas)) = find_canvas(canvas_id) else {
            report(&format!("no canvas with id '{canvas_id}'"));
            return HeroCanvas { view, color };
        };

        let (config, surface) = match config {
            Ok(config) => {
                let surface = CanvasSurface::acquire(&canvas);
                (config, surface)
            }
            Err(err) => (SceneConfig::default(), Err(err)),
        };
        let scene = build_scene(scene, &config.palette).unwrap_or_else(|err| {
            report(&format!("scene failed to build: {err}"));
            Scene::single_cube(2.0, &config.palette)
        });

        if let Err(err) = &surface {
            report(&format!("hero canvas unavailable: {err}"));
        }
        let host = WebHost::attach(window, canvas, &view);
        let handle = SceneHandle::create(host, surface, scene, &config);
        *view.borrow_mut() = Some(HeroView(handle));

        HeroCanvas { view, color }
    }

    /// Replace the scene with a model from STL bytes (binary or ASCII)
    pub fn load_stl(&self, bytes: &[u8]) {
        let result = stl::parse_stl(bytes, self.color).map(stl::normalize);
        if let Err(err) = &result {
            report(&format!("model failed to load: {err}"));
        }
        self.deliver(result);
    }

    /// True once the first frame has been painted
    pub fn is_ready(&self) -> bool {
        self.view
            .borrow()
            .as_ref()
            .is_some_and(|view| view.0.is_ready())
    }

    /// Stop rendering and remove every listener. Safe to call more than once.
    pub fn dispose(&self) {
        if let Some(view) = self.view.borrow_mut().as_mut() {
            view.0.dispose();
        }
    }
}

impl HeroCanvas {
    fn deliver(&self, result: Result<Mesh, hero3d_core::LoadError>) {
        if let Some(view) = self.view.borrow_mut().as_mut() {
            view.0.model_loaded(result);
        }
    }
}

impl Drop for HeroCanvas {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Drag-to-look viewer over an equirectangular image
#[wasm_bindgen]
pub struct PanoramaCanvas {
    view: Slot<PanoramaState>,
    image: Option<HtmlImageElement>,
    _on_load: Option<Closure<dyn FnMut()>>,
    _on_error: Option<Closure<dyn FnMut()>>,
}

#[wasm_bindgen]
impl PanoramaCanvas {
    /// Mount on the canvas with id `canvas_id` and start loading `image_url`
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, image_url: &str, config_json: Option<String>) -> PanoramaCanvas {
        let view: Slot<PanoramaState> = Rc::new(RefCell::new(None));
        let inert = |view| PanoramaCanvas {
            view,
            image: None,
            _on_load: None,
            _on_error: None,
        };

        let Some((window, canvas)) = find_canvas(canvas_id) else {
            report(&format!("no canvas with id '{canvas_id}'"));
            return inert(view);
        };
        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(err) => {
                report(&format!("cannot create image element: {err:?}"));
                return inert(view);
            }
        };

        let (config, surface) = match config_json.as_deref().map(PanoramaConfig::from_json) {
            Some(Err(err)) => {
                report(&format!("invalid panorama config: {err}"));
                (PanoramaConfig::default(), None)
            }
            parsed => {
                let config = parsed.and_then(Result::ok).unwrap_or_default();
                let surface = CanvasSurface::acquire(&canvas)
                    .map_err(|err| report(&format!("panorama canvas unavailable: {err}")))
                    .ok();
                (config, surface)
            }
        };

        let host = WebHost::attach(window, canvas, &view);
        let state = PanoramaState::mount(host, surface, image.clone(), &config);
        let mounted = !state.is_disposed();
        *view.borrow_mut() = Some(state);
        if !mounted {
            return inert(view);
        }

        let weak = Rc::downgrade(&view);
        let on_load = Closure::<dyn FnMut()>::new(move || {
            if let Some(view) = weak.upgrade() {
                if let Some(state) = view.borrow_mut().as_mut() {
                    state.image_loaded();
                }
            }
        });
        let url = image_url.to_string();
        // The view keeps its caption over a blank background
        let on_error = Closure::<dyn FnMut()>::new(move || {
            report(&format!("panorama image failed to load: {url}"));
        });
        image.set_onload(Some(on_load.as_ref().unchecked_ref()));
        image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        image.set_src(image_url);

        PanoramaCanvas {
            view,
            image: Some(image),
            _on_load: Some(on_load),
            _on_error: Some(on_error),
        }
    }

    /// Stop rendering and remove every listener. Safe to call more than once.
    pub fn dispose(&self) {
        if let Some(image) = &self.image {
            image.set_onload(None);
            image.set_onerror(None);
        }
        if let Some(state) = self.view.borrow_mut().as_mut() {
            state.dispose();
        }
    }
}

impl Drop for PanoramaCanvas {
    fn drop(&mut self) {
        self.dispose();
    }
}
