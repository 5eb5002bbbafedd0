/// Terminal host for interactive 3D scenes
use crossterm::{
    cursor,
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use hero3d_core::{
    FrameHost, FrameToken, ListenerId, ListenerKind, LoadError, Mesh, Scene, SceneConfig,
    SceneHandle,
};
use std::collections::HashMap;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub mod renderer;

pub use renderer::CellSurface;

/// Frame scheduling and listener registry backed by the terminal event loop
#[derive(Debug, Default)]
pub struct TerminalHost {
    next_id: u64,
    due: Option<FrameToken>,
    listeners: HashMap<ListenerId, ListenerKind>,
    released: bool,
}

impl TerminalHost {
    /// Take the frame request that is due this tick, if any
    pub fn take_due(&mut self) -> Option<FrameToken> {
        self.due.take()
    }

    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.listeners.values().any(|&k| k == kind)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl FrameHost for TerminalHost {
    fn request_frame(&mut self) -> Option<FrameToken> {
        self.next_id += 1;
        self.due = Some(self.next_id);
        Some(self.next_id)
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.due == Some(token) {
            self.due = None;
        }
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_id += 1;
        self.listeners.insert(self.next_id, kind);
        self.next_id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn release_resources(&mut self) {
        self.released = true;
    }
}

/// Raw mode, alternate screen and mouse capture for the lifetime of the value.
///
/// The terminal is restored on drop, including when entering fails halfway.
struct ScreenSession<W: Write> {
    out: W,
    raw: bool,
}

impl<W: Write> ScreenSession<W> {
    fn enter(out: W, raw: bool) -> io::Result<Self> {
        if raw {
            terminal::enable_raw_mode()?;
        }
        let mut session = Self { out, raw };
        execute!(
            session.out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture,
            EnableFocusChange
        )?;
        Ok(session)
    }
}

impl<W: Write> Drop for ScreenSession<W> {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            DisableFocusChange,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        );
        if self.raw {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    handle: SceneHandle<TerminalHost, CellSurface>,
    models: Option<flume::Receiver<Result<Mesh, LoadError>>>,
    frame_time: Duration,
    caption: Option<String>,
    running: bool,
    last_fps: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(scene: Scene, config: &SceneConfig, fps: u32) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        // Leave the top row for the status line
        let surface =
            CellSurface::new(width as usize, height.saturating_sub(1) as usize).with_row_offset(1);
        let handle = SceneHandle::create(TerminalHost::default(), Ok(surface), scene, config);

        Ok(Self {
            handle,
            models: None,
            frame_time: Duration::from_millis(1000 / fps.max(1) as u64),
            caption: None,
            running: true,
            last_fps: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    /// Deliver completed model loads from `receiver` into the scene
    pub fn with_model_loads(mut self, receiver: flume::Receiver<Result<Mesh, LoadError>>) -> Self {
        self.models = Some(receiver);
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn run(&mut self) -> io::Result<()> {
        let session = ScreenSession::enter(stdout(), true)?;
        let result = self.main_loop();
        self.handle.dispose();
        drop(session);
        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        info!("terminal render loop started");
        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            self.poll_models();

            // Render
            if let Some(token) = self.handle.host_mut().take_due() {
                self.handle.on_frame(token);
                self.present()?;
                self.frame_count += 1;
            } else if self.handle.is_disposed() {
                // Initialization failed: nothing will ever be painted
                self.running = false;
            }

            // Frame timing
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps).as_secs_f32();
                self.frame_count = 0;
                self.last_fps = now;
            }
        }
        info!("terminal render loop stopped");
        Ok(())
    }

    fn listens(&self, kind: ListenerKind) -> bool {
        self.handle.host().is_listening(kind)
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, .. }) => {
                if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
                    self.running = false;
                }
            }
            Event::Mouse(MouseEvent {
                kind, column, row, ..
            }) => {
                let Some((x, y)) = self.handle.surface().map(|s| s.from_terminal(column, row))
                else {
                    return;
                };
                match kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        if self.listens(ListenerKind::PointerDown) {
                            self.handle.pointer_down(x, y);
                        }
                    }
                    MouseEventKind::Drag(MouseButton::Left) => {
                        if self.listens(ListenerKind::PointerMove) {
                            self.handle.pointer_move(x, y);
                        }
                    }
                    MouseEventKind::Up(MouseButton::Left) => {
                        if self.listens(ListenerKind::PointerUp) {
                            self.handle.pointer_up();
                        }
                    }
                    _ => {}
                }
            }
            Event::FocusLost => {
                if self.listens(ListenerKind::PointerLeave) {
                    self.handle.pointer_leave();
                }
            }
            Event::Resize(columns, rows) => {
                if !self.listens(ListenerKind::Resize) {
                    return;
                }
                if let Some((width, height)) =
                    self.handle.surface().map(|s| s.extent_for(columns, rows))
                {
                    self.handle.resize(width, height);
                    debug!(columns, rows, "terminal resized");
                }
            }
            _ => {}
        }
    }

    fn poll_models(&mut self) {
        let Some(receiver) = &self.models else {
            return;
        };
        let mut finished = false;
        loop {
            match receiver.try_recv() {
                Ok(result) => self.handle.model_loaded(result),
                Err(flume::TryRecvError::Empty) => break,
                Err(flume::TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }
        if finished {
            self.models = None;
        }
    }

    fn present(&mut self) -> io::Result<()> {
        let Some(surface) = self.handle.surface() else {
            return Ok(());
        };

        let mut stdout = stdout();
        surface.draw(&mut stdout)?;
        if let Some(caption) = &self.caption {
            surface.draw_caption(&mut stdout, caption)?;
        }

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Hero3D Terminal | FPS: {:.1} | Drag with the mouse to rotate | Q=Quit",
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_keeps_one_due_frame() {
        let mut host = TerminalHost::default();
        let first = host.request_frame().unwrap();
        let second = host.request_frame().unwrap();
        assert_ne!(first, second);
        assert_eq!(host.take_due(), Some(second));
        assert_eq!(host.take_due(), None);

        let third = host.request_frame().unwrap();
        host.cancel_frame(third);
        assert_eq!(host.take_due(), None);
    }

    #[test]
    fn test_host_listener_registry() {
        let mut host = TerminalHost::default();
        let id = host.add_listener(ListenerKind::PointerDown);
        assert!(host.is_listening(ListenerKind::PointerDown));
        assert!(!host.is_listening(ListenerKind::Resize));
        host.remove_listener(id);
        assert!(!host.is_listening(ListenerKind::PointerDown));
    }

    #[test]
    fn test_scene_lifecycle_on_terminal_host() {
        let config = SceneConfig::default();
        let mut handle = SceneHandle::create(
            TerminalHost::default(),
            Ok(CellSurface::new(40, 20)),
            Scene::single_cube(2.0, &config.palette),
            &config,
        );
        assert!(handle.host().is_listening(ListenerKind::PointerMove));

        let token = handle.host_mut().take_due().unwrap();
        handle.on_frame(token);
        assert!(handle.is_ready());
        let centre = handle.surface().unwrap().cell(20, 10).unwrap();
        assert_ne!(centre, CellSurface::new(1, 1).cell(0, 0).unwrap());

        handle.dispose();
        assert!(handle.host().is_released());
        assert!(!handle.host().is_listening(ListenerKind::PointerMove));
        assert_eq!(handle.host_mut().take_due(), None);
    }

    /// Writer whose first write fails, recording everything after that
    struct FailFirstWrite {
        failed: bool,
        written: std::rc::Rc<std::cell::RefCell<Vec<u8>>>,
    }

    impl Write for FailFirstWrite {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.failed {
                self.failed = true;
                return Err(io::Error::new(io::ErrorKind::Other, "terminal gone"));
            }
            self.written.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_screen_restored_when_enter_fails() {
        let written = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let out = FailFirstWrite {
            failed: false,
            written: written.clone(),
        };
        assert!(ScreenSession::enter(out, false).is_err());

        let text = String::from_utf8(written.borrow().clone()).unwrap();
        assert!(text.contains("\x1b[?1049l"), "left alternate screen: {text:?}");
        assert!(text.contains("\x1b[?25h"), "cursor shown: {text:?}");
    }

    #[test]
    fn test_screen_session_round_trip() {
        let written = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let out = FailFirstWrite {
            failed: true,
            written: written.clone(),
        };
        let session = ScreenSession::enter(out, false).unwrap();
        assert!(String::from_utf8_lossy(&written.borrow()).contains("\x1b[?1049h"));
        drop(session);
        assert!(String::from_utf8_lossy(&written.borrow()).contains("\x1b[?1049l"));
    }
}
