/// Terminal host for the globe scene
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{self},
};
use globe_core::{
    build_scene, config, AnimationLoop, ConfigError, FrameInput, GlobeConfig, LoopControl,
    PointerTracker, Texture, Viewport,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io::{self, stdout, Stdout, Write};
use std::path::Path;
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::TerminalRenderer;

/// Terminal-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub target_fps: u32,
    /// Pointer units per terminal column, so drags feel like pixel drags
    pub pointer_scale: f32,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            pointer_scale: 8.0,
        }
    }
}

/// Full configuration file: the shared sections plus `[terminal]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub globe: GlobeConfig,
    pub terminal: TerminalConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        config::load(path)
    }
}

/// Surface size in pixels for a terminal of `cols x rows` cells
pub fn surface_size(cols: u16, rows: u16) -> (u32, u32) {
    (cols as u32, rows as u32 * 2)
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp<W: Write = Stdout> {
    animation: AnimationLoop<TerminalRenderer<W>>,
    pointer: PointerTracker,
    config: TerminalConfig,
    last_frame: Instant,
    last_fps_update: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp<Stdout> {
    pub fn new(config: AppConfig, texture: Option<Texture>) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        Ok(Self::with_writer(config, texture, stdout(), cols, rows))
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;

        let result = self.main_loop();

        // Cleanup
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_secs_f64(1.0 / self.config.target_fps.max(1) as f64);
        info!("starting frame loop at {} fps", self.config.target_fps.max(1));

        loop {
            let frame_start = Instant::now();

            // Drain input; only the latest pointer position survives
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            if self.frame()? == LoopControl::Stop {
                break;
            }

            // Frame timing
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }
        }

        Ok(())
    }
}

impl<W: Write> TerminalApp<W> {
    pub fn with_writer(
        config: AppConfig,
        texture: Option<Texture>,
        out: W,
        cols: u16,
        rows: u16,
    ) -> Self {
        let (width, height) = surface_size(cols, rows);
        let (scene, camera) = build_scene(
            width as f32 / height.max(1) as f32,
            &config.globe.scene,
        );

        let mut renderer = TerminalRenderer::new(out);
        if let Some(texture) = texture {
            renderer
                .textures_mut()
                .insert(config.globe.scene.texture.clone(), texture);
        }

        let viewport = Viewport::with_renderer(camera, renderer);
        let mut animation = AnimationLoop::new(scene, viewport, config.globe.animation);
        animation.resize(width, height);

        let now = Instant::now();
        Self {
            animation,
            pointer: PointerTracker::new(),
            config: config.terminal,
            last_frame: now,
            last_fps_update: now,
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn animation(&self) -> &AnimationLoop<TerminalRenderer<W>> {
        &self.animation
    }

    pub fn frame_input(&self) -> FrameInput {
        self.pointer.frame_input()
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code, modifiers, ..
            }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => self.animation.stop(),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    self.animation.stop()
                }
                _ => {}
            },
            Event::Mouse(MouseEvent { kind, column, .. }) => match kind {
                MouseEventKind::Down(MouseButton::Left) => self.pointer.pointer_down(),
                MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                    self.pointer
                        .pointer_move(column as f32 * self.config.pointer_scale)
                }
                MouseEventKind::Up(MouseButton::Left) => self.pointer.pointer_up(),
                _ => {}
            },
            Event::Resize(cols, rows) => {
                let (width, height) = surface_size(cols, rows);
                debug!("terminal resized to {}x{} cells", cols, rows);
                self.animation.resize(width, height);
            }
            _ => {}
        }
    }

    /// Advance and draw one frame
    pub fn frame(&mut self) -> io::Result<LoopControl> {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;

        // Update FPS counter
        self.frame_count += 1;
        if (now - self.last_fps_update).as_secs() >= 1 {
            self.fps = self.frame_count as f32 / (now - self.last_fps_update).as_secs_f32();
            self.frame_count = 0;
            self.last_fps_update = now;
        }

        let status = format!(
            "Globe | FPS: {:.1} | Drag=Spin globe  Q=Quit",
            self.fps
        );
        if let Some(renderer) = self.animation.viewport_mut().renderer_mut() {
            renderer.set_status(status);
        }

        let input = self.pointer.take_frame_input();
        self.animation.frame(&input, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use globe_core::{ObjectId, Renderer};

    fn app() -> TerminalApp<Vec<u8>> {
        TerminalApp::with_writer(AppConfig::default(), None, Vec::new(), 40, 12)
    }

    fn mouse(kind: MouseEventKind, column: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row: 0,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_startup_sizes_viewport() {
        let app = app();
        let viewport = app.animation().viewport();
        assert_eq!(viewport.camera().aspect(), 40.0 / 24.0);
        assert_eq!(viewport.renderer().unwrap().size(), (40, 24));
    }

    #[test]
    fn test_resize_event() {
        let mut app = app();
        app.handle_event(Event::Resize(100, 25));
        let viewport = app.animation().viewport();
        assert_eq!(viewport.camera().aspect(), 2.0);
        assert_eq!(viewport.renderer().unwrap().size(), (100, 50));
    }

    #[test]
    fn test_drag_events_feed_pointer() {
        let mut app = app();
        app.handle_event(mouse(MouseEventKind::Moved, 3));
        assert_eq!(app.frame_input(), FrameInput::idle());

        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 10));
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 12));
        assert_eq!(app.frame_input(), FrameInput::dragging(96.0));

        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 12));
        assert!(!app.frame_input().mouse_is_down);
    }

    #[test]
    fn test_each_move_steers_one_frame() {
        let mut app = app();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 10));
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 40));
        app.frame().unwrap();
        assert_eq!(app.animation().state().drag.start_x, Some(320.0));

        // Button still held, no movement since the last frame
        app.frame().unwrap();
        assert!(app.frame_input().mouse_is_down);
        assert_eq!(app.frame_input().pointer_x, None);
        assert!(!app.animation().state().drag.is_active());
    }

    #[test]
    fn test_other_buttons_and_scroll_are_ignored() {
        let mut app = app();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Right), 5));
        app.handle_event(mouse(MouseEventKind::ScrollUp, 5));
        assert_eq!(app.frame_input(), FrameInput::idle());
    }

    #[test]
    fn test_frames_render_and_quit() {
        let mut app = app();
        assert_eq!(app.frame().unwrap(), LoopControl::Continue);
        assert_eq!(app.animation().state().frame, 1);
        assert!(!app
            .animation()
            .viewport()
            .renderer()
            .unwrap()
            .writer()
            .is_empty());

        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert_eq!(app.frame().unwrap(), LoopControl::Stop);
        assert_eq!(app.animation().state().frame, 1);
    }

    #[test]
    fn test_ctrl_c_stops() {
        let mut app = app();
        let mut key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        key.kind = KeyEventKind::Press;
        app.handle_event(Event::Key(key));
        assert!(app.animation().is_stopped());
    }

    #[test]
    fn test_texture_is_registered_under_scene_name() {
        let texture = Texture::new(1, 1, vec![globe_core::Color::BLACK]).unwrap();
        let app = TerminalApp::with_writer(AppConfig::default(), Some(texture), Vec::new(), 40, 12);
        let sphere = app.animation().scene().object(ObjectId::Sphere).unwrap();
        let name = sphere.material().map.as_deref().unwrap();
        let renderer = app.animation().viewport().renderer().unwrap();
        assert_eq!(renderer.textures().len(), 1);
        assert!(renderer.textures().get(name).is_some());
    }

    #[test]
    fn test_app_config_sections() {
        let config: AppConfig = config::from_toml_str(
            r#"
            [scene]
            fov = 3.0

            [terminal]
            target_fps = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.globe.scene.fov, 3.0);
        assert_eq!(config.terminal.target_fps, 60);
        assert_eq!(config.terminal.pointer_scale, 8.0);
    }
}
