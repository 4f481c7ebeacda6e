/// Globe Web - WASM host drawing the globe scene onto a 2D canvas
///
/// The browser window is the surface: the canvas follows `innerWidth` x
/// `innerHeight`, mouse drags anywhere in the window spin the globe, and
/// frames are paced by requestAnimationFrame.
use std::cell::RefCell;
use std::rc::Rc;

use log::{error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, HtmlImageElement, MouseEvent, Window};

use globe_core::{build_scene, AnimationLoop, GlobeConfig, LoopControl, PointerTracker, Viewport};

pub mod canvas;
pub mod scheduler;

pub use canvas::CanvasRenderer;
pub use scheduler::{frame_delta, FrameScheduler};

type SharedLoop = Rc<RefCell<AnimationLoop<CanvasRenderer>>>;
type Listener = Closure<dyn FnMut(web_sys::Event)>;

/// Browser entry point
#[wasm_bindgen]
pub struct WebGlobe {
    window: Window,
    animation: SharedLoop,
    pointer: Rc<RefCell<PointerTracker>>,
    scheduler: FrameScheduler,
    /// Registered window listeners; removed on drop
    listeners: Vec<(&'static str, Listener)>,
    _texture: Option<PendingTexture>,
}

#[wasm_bindgen]
impl WebGlobe {
    /// Attach to the canvas with id `canvas_id`.
    ///
    /// `config_toml` overrides the default scene and animation settings;
    /// `texture_url` overrides `scene.texture` as the earth image source.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        config_toml: Option<String>,
        texture_url: Option<String>,
    ) -> Result<WebGlobe, JsValue> {
        let config = match config_toml {
            Some(text) => GlobeConfig::from_toml_str(&text)
                .map_err(|err| JsValue::from_str(&err.to_string()))?,
            None => GlobeConfig::default(),
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let canvas = window
            .document()
            .and_then(|d| d.get_element_by_id(canvas_id))
            .ok_or_else(|| JsValue::from_str(&format!("canvas '{}' not found", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str(&format!("'{}' is not a canvas", canvas_id)))?;

        let (width, height) = window_size(&window);
        let (scene, camera) = build_scene(width as f32 / height.max(1) as f32, &config.scene);
        let viewport = Viewport::with_renderer(camera, CanvasRenderer::new(canvas)?);
        let mut animation = AnimationLoop::new(scene, viewport, config.animation);
        animation.resize(width, height);
        let animation = Rc::new(RefCell::new(animation));

        let mut globe = WebGlobe {
            window,
            animation,
            pointer: Rc::new(RefCell::new(PointerTracker::new())),
            scheduler: FrameScheduler::new(),
            listeners: Vec::new(),
            _texture: None,
        };
        globe.install_listeners()?;

        let texture_name = config.scene.texture.clone();
        let url = texture_url.unwrap_or_else(|| texture_name.clone());
        globe._texture = Some(load_texture(&url, texture_name, globe.animation.clone())?);

        info!("globe attached to '{}' at {}x{}", canvas_id, width, height);
        Ok(globe)
    }

    /// Begin the frame loop, or resume it after [`WebGlobe::stop`]
    pub fn start(&self) {
        if self.scheduler.is_running() {
            return;
        }
        self.animation.borrow().resume();

        let animation = self.animation.clone();
        let pointer = self.pointer.clone();
        let mut last_timestamp: Option<f64> = None;

        self.scheduler.start(move |timestamp| {
            let dt = frame_delta(last_timestamp, timestamp);
            last_timestamp = Some(timestamp);

            let input = pointer.borrow_mut().take_frame_input();
            match animation.borrow_mut().frame(&input, dt) {
                Ok(LoopControl::Continue) => true,
                Ok(LoopControl::Stop) => false,
                Err(err) => {
                    error!("frame failed: {:?}", err);
                    false
                }
            }
        });
    }

    /// Stop the frame loop. Takes effect before the next frame is drawn.
    pub fn stop(&self) {
        self.animation.borrow().stop();
        self.scheduler.stop();
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.scheduler.is_running()
    }

    #[wasm_bindgen(getter)]
    pub fn frame(&self) -> u64 {
        self.animation.borrow().state().frame
    }
}

impl WebGlobe {
    fn install_listeners(&mut self) -> Result<(), JsValue> {
        let pointer = self.pointer.clone();
        self.listen("mousedown", move |_| pointer.borrow_mut().pointer_down())?;

        let pointer = self.pointer.clone();
        self.listen("mousemove", move |event| {
            if let Ok(event) = event.dyn_into::<MouseEvent>() {
                pointer.borrow_mut().pointer_move(event.client_x() as f32);
            }
        })?;

        let pointer = self.pointer.clone();
        self.listen("mouseup", move |_| pointer.borrow_mut().pointer_up())?;

        let animation = self.animation.clone();
        let window = self.window.clone();
        self.listen("resize", move |_| {
            let (width, height) = window_size(&window);
            match animation.try_borrow_mut() {
                Ok(mut animation) => animation.resize(width, height),
                Err(_) => warn!("resize to {}x{} dropped while drawing", width, height),
            }
        })?;

        Ok(())
    }

    fn listen<F>(&mut self, name: &'static str, handler: F) -> Result<(), JsValue>
    where
        F: FnMut(web_sys::Event) + 'static,
    {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        self.window
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        self.listeners.push((name, closure));
        Ok(())
    }
}

impl Drop for WebGlobe {
    fn drop(&mut self) {
        self.scheduler.stop();
        for (name, closure) in &self.listeners {
            self.window
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .ok();
        }
    }
}

fn window_size(window: &Window) -> (u32, u32) {
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0).max(0.0) as u32
    };
    (dimension(window.inner_width()), dimension(window.inner_height()))
}

/// An in-flight earth image and its load handlers
struct PendingTexture {
    _image: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

/// Start fetching the earth image. When it decodes, its pixels are
/// registered under `name`; until then, or if it fails, the sphere draws
/// untextured.
fn load_texture(url: &str, name: String, animation: SharedLoop) -> Result<PendingTexture, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_cross_origin(Some("anonymous"));

    let loaded = image.clone();
    let onload = Closure::<dyn FnMut()>::new(move || match canvas::texture_from_image(&loaded) {
        Ok(texture) => {
            info!("loaded texture {} ({}x{})", name, texture.width(), texture.height());
            let mut animation = animation.borrow_mut();
            if let Some(renderer) = animation.viewport_mut().renderer_mut() {
                renderer.textures_mut().insert(name.clone(), texture);
            }
        }
        Err(err) => warn!("texture {} unreadable, drawing untextured: {:?}", name, err),
    });

    let failed_url = url.to_string();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        warn!("texture {} failed to load, drawing untextured", failed_url);
    });

    image.set_onload(Some(onload.as_ref().unchecked_ref()));
    image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    image.set_src(url);

    Ok(PendingTexture {
        _image: image,
        _onload: onload,
        _onerror: onerror,
    })
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(())
}
