/// Truecolor half-block presenter for terminal rendering
use crossterm::{
    cursor,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use globe_core::{Camera, Color, Rasterizer, Renderer, Scene, TextureStore};
use std::io::{self, Write};

/// Upper half block: foreground paints the top pixel, background the bottom
const HALF_BLOCK: char = '\u{2580}';

/// Renders into a framebuffer two pixels tall per terminal cell and writes
/// it out as colored half blocks.
pub struct TerminalRenderer<W: Write> {
    raster: Rasterizer,
    out: W,
    status: Option<String>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            raster: Rasterizer::default(),
            out,
            status: None,
        }
    }

    pub fn textures(&self) -> &TextureStore {
        self.raster.textures()
    }

    pub fn textures_mut(&mut self) -> &mut TextureStore {
        self.raster.textures_mut()
    }

    /// Text drawn over the first row of every subsequent frame
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    fn present(&mut self) -> io::Result<()> {
        let fb = self.raster.framebuffer();
        let (width, height) = (fb.width(), fb.height());

        self.out.queue(cursor::MoveTo(0, 0))?;
        let mut current: Option<(Color, Color)> = None;

        for row in 0..height.div_ceil(2) {
            self.out.queue(cursor::MoveTo(0, row as u16))?;
            for x in 0..width {
                let top = fb.pixel(x, row * 2);
                let bottom = if row * 2 + 1 < height {
                    fb.pixel(x, row * 2 + 1)
                } else {
                    top
                };

                // Only emit color changes
                if current != Some((top, bottom)) {
                    self.out.queue(SetForegroundColor(term_color(top)))?;
                    self.out.queue(SetBackgroundColor(term_color(bottom)))?;
                    current = Some((top, bottom));
                }
                self.out.queue(Print(HALF_BLOCK))?;
            }
        }
        self.out.queue(ResetColor)?;

        if let Some(status) = &self.status {
            self.out.queue(cursor::MoveTo(0, 0))?;
            self.out.queue(SetForegroundColor(TermColor::Yellow))?;
            self.out.queue(SetBackgroundColor(TermColor::Black))?;
            self.out.queue(Print(status))?;
            self.out.queue(ResetColor)?;
        }

        self.out.flush()
    }
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    type Error = io::Error;

    fn clear(&mut self) {
        self.raster.clear(Color::BLACK);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.raster.resize(width, height);
    }

    fn size(&self) -> (u32, u32) {
        let fb = self.raster.framebuffer();
        (fb.width(), fb.height())
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> io::Result<()> {
        self.raster.draw_scene(scene, camera);
        self.present()
    }
}
