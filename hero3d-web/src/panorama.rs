/// Image-backed look-around canvas
use hero3d_core::{
    InteractionController, Lifecycle, ListenerKind, PanoramaConfig, PanoramaView, Surface,
};
use web_sys::HtmlImageElement;

use crate::canvas::CanvasSurface;
use crate::host::{CanvasView, Input, WebHost};

const CAPTION_FONT: &str = "16px sans-serif";
const CAPTION_COLOR: &str = "rgba(255, 255, 255, 0.85)";

pub(crate) struct PanoramaState {
    lifecycle: Lifecycle<WebHost>,
    surface: Option<CanvasSurface>,
    controller: InteractionController<PanoramaView>,
    image: HtmlImageElement,
    loaded: bool,
    caption: String,
}

impl PanoramaState {
    pub(crate) fn mount(
        host: WebHost,
        surface: Option<CanvasSurface>,
        image: HtmlImageElement,
        config: &PanoramaConfig,
    ) -> Self {
        let lifecycle = match &surface {
            Some(_) => Lifecycle::start(host, &ListenerKind::ALL),
            None => Lifecycle::inert(host),
        };
        Self {
            lifecycle,
            surface,
            controller: InteractionController::new(PanoramaView::new(config)),
            image,
            loaded: false,
            caption: config.caption.clone(),
        }
    }

    pub(crate) fn image_loaded(&mut self) {
        self.loaded = self.image.natural_width() > 0;
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }

    pub(crate) fn dispose(&mut self) {
        self.lifecycle.dispose();
    }

    fn paint(&self, surface: &CanvasSurface) {
        let context = surface.context();
        let size = surface.size();
        context.clear_rect(0.0, 0.0, size.width, size.height);

        if self.loaded && size.height > 0.0 {
            let image_width = self.image.natural_width() as f64;
            let image_height = self.image.natural_height() as f64;
            let window = self.controller.target().source_window(
                image_width,
                image_height,
                size.width / size.height,
            );
            for slice in window.slices(image_width) {
                let _ = context
                    .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                        &self.image,
                        slice.src_x,
                        window.y,
                        slice.src_width,
                        window.height,
                        slice.dst_start * size.width,
                        0.0,
                        slice.dst_fraction * size.width,
                        size.height,
                    );
            }
        }

        context.set_font(CAPTION_FONT);
        context.set_text_align("center");
        context.set_fill_style_str(CAPTION_COLOR);
        let _ = context.fill_text(&self.caption, size.width / 2.0, size.height - 24.0);
    }
}

impl CanvasView for PanoramaState {
    fn frame(&mut self) {
        let Some(token) = self.lifecycle.host_mut().take_due() else {
            return;
        };
        if !self.lifecycle.accept(token) {
            return;
        }
        self.controller.tick();
        if let Some(surface) = &self.surface {
            self.paint(surface);
        }
        self.lifecycle.schedule();
    }

    fn input(&mut self, input: Input) {
        if self.lifecycle.is_disposed() {
            return;
        }
        let controller = &mut self.controller;
        match input {
            Input::PointerDown(x, y) => controller.pointer_down(x, y),
            Input::PointerMove(x, y) => controller.pointer_move(x, y),
            Input::PointerUp => controller.pointer_up(),
            Input::PointerLeave => controller.pointer_leave(),
            Input::TouchStart(id, x, y) => controller.touch_start(id, x, y),
            Input::TouchMove(id, x, y) => controller.touch_move(id, x, y),
            Input::TouchEnd(id) => controller.touch_end(id),
            Input::Resize => {
                if let Some(surface) = self.surface.as_mut() {
                    let (width, height) = surface.client_size();
                    surface.resize(width, height);
                }
            }
        }
    }
}
