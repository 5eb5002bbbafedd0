/// Browser-backed frame scheduling and event listener registry
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use hero3d_core::{FrameHost, FrameToken, ListenerId, ListenerKind};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, HtmlCanvasElement, MouseEvent, TouchEvent, Window};

/// Host input translated to canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    PointerDown(f64, f64),
    PointerMove(f64, f64),
    PointerUp,
    PointerLeave,
    TouchStart(i64, f64, f64),
    TouchMove(i64, f64, f64),
    TouchEnd(i64),
    Resize,
}

/// A view the host drives: one callback per animation frame, plus input
pub(crate) trait CanvasView: 'static {
    fn frame(&mut self);

    fn input(&mut self, input: Input);
}

/// Shared cell the host callbacks reach the view through.
///
/// Empty until the view is mounted.
pub(crate) type Slot<V> = Rc<RefCell<Option<V>>>;

fn event_name(kind: ListenerKind) -> &'static str {
    match kind {
        ListenerKind::PointerDown => "mousedown",
        ListenerKind::PointerMove => "mousemove",
        ListenerKind::PointerUp => "mouseup",
        ListenerKind::PointerLeave => "mouseleave",
        ListenerKind::TouchStart => "touchstart",
        ListenerKind::TouchMove => "touchmove",
        ListenerKind::TouchEnd => "touchend",
        ListenerKind::Resize => "resize",
    }
}

fn with_view<V: CanvasView>(slot: &Weak<RefCell<Option<V>>>, f: impl FnOnce(&mut V)) {
    let Some(slot) = slot.upgrade() else {
        return;
    };
    // A callback arriving while the view is busy is dropped
    let Ok(mut view) = slot.try_borrow_mut() else {
        return;
    };
    if let Some(view) = view.as_mut() {
        f(view);
    }
}

fn mouse_position(event: &Event) -> Option<(f64, f64)> {
    let event = event.dyn_ref::<MouseEvent>()?;
    Some((event.offset_x() as f64, event.offset_y() as f64))
}

/// Changed touches as (id, x, y) relative to the canvas
fn touches(event: &Event, canvas: &HtmlCanvasElement) -> Vec<(i64, f64, f64)> {
    let Some(event) = event.dyn_ref::<TouchEvent>() else {
        return Vec::new();
    };
    let rect = canvas.get_bounding_client_rect();
    let list = event.changed_touches();
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|touch| {
            (
                touch.identifier() as i64,
                touch.client_x() as f64 - rect.left(),
                touch.client_y() as f64 - rect.top(),
            )
        })
        .collect()
}

fn translate(kind: ListenerKind, event: &Event, canvas: &HtmlCanvasElement) -> Vec<Input> {
    match kind {
        ListenerKind::PointerDown => mouse_position(event)
            .map(|(x, y)| Input::PointerDown(x, y))
            .into_iter()
            .collect(),
        ListenerKind::PointerMove => mouse_position(event)
            .map(|(x, y)| Input::PointerMove(x, y))
            .into_iter()
            .collect(),
        ListenerKind::PointerUp => vec![Input::PointerUp],
        ListenerKind::PointerLeave => vec![Input::PointerLeave],
        ListenerKind::TouchStart => {
            event.prevent_default();
            touches(event, canvas)
                .into_iter()
                .map(|(id, x, y)| Input::TouchStart(id, x, y))
                .collect()
        }
        ListenerKind::TouchMove => {
            event.prevent_default();
            touches(event, canvas)
                .into_iter()
                .map(|(id, x, y)| Input::TouchMove(id, x, y))
                .collect()
        }
        ListenerKind::TouchEnd => touches(event, canvas)
            .into_iter()
            .map(|(id, _, _)| Input::TouchEnd(id))
            .collect(),
        ListenerKind::Resize => vec![Input::Resize],
    }
}

/// [`FrameHost`] over `requestAnimationFrame` and DOM event listeners.
///
/// Resize is observed on the window; everything else on the canvas.
pub struct WebHost {
    window: Window,
    canvas: HtmlCanvasElement,
    on_frame: Closure<dyn FnMut(f64)>,
    handlers: HashMap<ListenerKind, Closure<dyn FnMut(Event)>>,
    registered: HashMap<ListenerId, ListenerKind>,
    next_listener: ListenerId,
    due: Option<FrameToken>,
}

impl WebHost {
    /// Build callbacks that forward frames and input into `slot`
    pub(crate) fn attach<V: CanvasView>(
        window: Window,
        canvas: HtmlCanvasElement,
        slot: &Slot<V>,
    ) -> Self {
        let weak = Rc::downgrade(slot);
        let on_frame = Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
            with_view(&weak, |view| view.frame());
        });

        let handlers = ListenerKind::ALL
            .iter()
            .map(|&kind| {
                let weak = Rc::downgrade(slot);
                let target = canvas.clone();
                let handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                    let inputs = translate(kind, &event, &target);
                    with_view(&weak, |view| {
                        for input in inputs {
                            view.input(input);
                        }
                    });
                });
                (kind, handler)
            })
            .collect();

        Self {
            window,
            canvas,
            on_frame,
            handlers,
            registered: HashMap::new(),
            next_listener: 0,
            due: None,
        }
    }

    /// Take the frame request the browser is answering, if any
    pub fn take_due(&mut self) -> Option<FrameToken> {
        self.due.take()
    }

    fn target(&self, kind: ListenerKind) -> &EventTarget {
        match kind {
            ListenerKind::Resize => self.window.as_ref(),
            _ => self.canvas.as_ref(),
        }
    }

    fn handler(&self, kind: ListenerKind) -> Option<&js_sys::Function> {
        self.handlers
            .get(&kind)
            .map(|closure| closure.as_ref().unchecked_ref())
    }
}

impl FrameHost for WebHost {
    fn request_frame(&mut self) -> Option<FrameToken> {
        match self
            .window
            .request_animation_frame(self.on_frame.as_ref().unchecked_ref())
        {
            Ok(id) => {
                let token = id as FrameToken;
                self.due = Some(token);
                Some(token)
            }
            Err(err) => {
                crate::report(&format!("requestAnimationFrame failed: {err:?}"));
                None
            }
        }
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.due == Some(token) {
            self.due = None;
        }
        if let Err(err) = self.window.cancel_animation_frame(token as i32) {
            crate::report(&format!("cancelAnimationFrame failed: {err:?}"));
        }
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_listener += 1;
        let id = self.next_listener;
        if let Some(handler) = self.handler(kind) {
            match self
                .target(kind)
                .add_event_listener_with_callback(event_name(kind), handler)
            {
                Ok(()) => {
                    self.registered.insert(id, kind);
                }
                Err(err) => crate::report(&format!(
                    "failed to listen for {}: {err:?}",
                    event_name(kind)
                )),
            }
        }
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        let Some(kind) = self.registered.remove(&id) else {
            return;
        };
        if let Some(handler) = self.handler(kind) {
            let _ = self
                .target(kind)
                .remove_event_listener_with_callback(event_name(kind), handler);
        }
    }

    fn release_resources(&mut self) {
        // Nothing can reach the handlers any more; drop them
        self.handlers.clear();
        // Free the canvas backing store; layout size comes from CSS
        self.canvas.set_width(0);
        self.canvas.set_height(0);
    }
}
