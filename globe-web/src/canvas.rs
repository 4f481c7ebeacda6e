//! Canvas 2D presenter for the CPU rasterizer

use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, ImageData};

use globe_core::{Camera, Color, Rasterizer, Renderer, Scene, Texture, TextureStore};

/// Rasterizes into an RGBA buffer and blits it with `putImageData`.
pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    raster: Rasterizer,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = context_2d(&canvas)?;
        let raster = Rasterizer::new(canvas.width(), canvas.height());
        Ok(Self {
            canvas,
            context,
            raster,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn textures_mut(&mut self) -> &mut TextureStore {
        self.raster.textures_mut()
    }

    fn present(&self) -> Result<(), JsValue> {
        let fb = self.raster.framebuffer();
        if fb.width() == 0 || fb.height() == 0 {
            return Ok(());
        }
        let image =
            ImageData::new_with_u8_clamped_array_and_sh(Clamped(fb.as_rgba()), fb.width(), fb.height())?;
        self.context.put_image_data(&image, 0.0, 0.0)
    }
}

impl Renderer for CanvasRenderer {
    type Error = JsValue;

    fn clear(&mut self) {
        self.raster.clear(Color::BLACK);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.raster.resize(width, height);
    }

    fn size(&self) -> (u32, u32) {
        let fb = self.raster.framebuffer();
        (fb.width(), fb.height())
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), JsValue> {
        self.raster.draw_scene(scene, camera);
        self.present()
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("2d context has unexpected type"))
}

/// Read a decoded image's pixels by drawing it onto a scratch canvas.
pub fn texture_from_image(image: &HtmlImageElement) -> Result<Texture, JsValue> {
    let (width, height) = (image.natural_width(), image.natural_height());
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let scratch = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("created element is not a canvas"))?;
    scratch.set_width(width);
    scratch.set_height(height);

    let context = context_2d(&scratch)?;
    context.draw_image_with_html_image_element(image, 0.0, 0.0)?;
    let data = context.get_image_data(0.0, 0.0, width as f64, height as f64)?;

    Texture::from_rgba(width, height, &data.data()).map_err(|err| JsValue::from_str(&err.to_string()))
}
