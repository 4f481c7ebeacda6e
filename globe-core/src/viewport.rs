//! Viewport controller: keeps the renderer's buffer and the camera's
//! aspect ratio in step with the host surface.

use log::{debug, warn};

use crate::projection::Camera;
use crate::scene::Scene;

/// A drawable surface that can paint a scene through a camera
pub trait Renderer {
    type Error;

    /// Clear the current frame buffer
    fn clear(&mut self);

    /// Resize the output buffer. Presentation-side sizing (CSS, window
    /// chrome) is left to the host.
    fn set_size(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), Self::Error>;
}

/// Owns the camera and, once the host surface exists, the renderer
pub struct Viewport<R> {
    renderer: Option<R>,
    camera: Camera,
}

impl<R: Renderer> Viewport<R> {
    pub fn new(camera: Camera) -> Self {
        Self {
            renderer: None,
            camera,
        }
    }

    pub fn with_renderer(camera: Camera, renderer: R) -> Self {
        Self {
            renderer: Some(renderer),
            camera,
        }
    }

    pub fn attach(&mut self, renderer: R) {
        self.renderer = Some(renderer);
    }

    pub fn detach(&mut self) -> Option<R> {
        self.renderer.take()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut R> {
        self.renderer.as_mut()
    }

    /// Match the buffer and projection to a `width x height` surface.
    ///
    /// Repeated calls are harmless; the last one wins. A zero height is
    /// treated as one pixel for the aspect computation.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.clear();
            renderer.set_size(width, height);
        }

        if height == 0 {
            warn!("surface height is zero, clamping aspect ratio to width {}", width);
        }
        let aspect = width as f32 / height.max(1) as f32;
        self.camera.set_aspect_ratio(aspect);
        self.camera.update_projection_matrix();

        debug!("viewport resized to {}x{} (aspect {:.4})", width, height, aspect);
    }

    /// Render one frame. Returns `Ok(false)` without drawing when no
    /// renderer is attached yet.
    pub fn render(&mut self, scene: &Scene) -> Result<bool, R::Error> {
        match self.renderer.as_mut() {
            Some(renderer) => {
                renderer.render(scene, &self.camera)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
