//! requestAnimationFrame loop

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use log::error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use globe_core::animation::REFERENCE_FPS;

/// Drives a callback once per display refresh until it returns `false` or
/// [`FrameScheduler::stop`] is called.
pub struct FrameScheduler {
    running: Rc<RefCell<bool>>,
    request_id: Rc<RefCell<Option<i32>>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            running: Rc::new(RefCell::new(false)),
            request_id: Rc::new(RefCell::new(None)),
        }
    }

    /// Start the loop. The callback receives the requestAnimationFrame
    /// timestamp in milliseconds and returns whether to keep going.
    pub fn start<F>(&self, mut callback: F)
    where
        F: FnMut(f64) -> bool + 'static,
    {
        if *self.running.borrow() {
            return;
        }
        *self.running.borrow_mut() = true;

        let running = self.running.clone();
        let request_id = self.request_id.clone();

        // The closure holds `f` to reschedule itself; the cycle keeps it alive
        let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        let g = f.clone();

        *g.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
            if !*running.borrow() {
                return;
            }

            if callback(timestamp) && *running.borrow() {
                let id = f.borrow().as_ref().and_then(request_frame);
                if id.is_none() {
                    *running.borrow_mut() = false;
                }
                *request_id.borrow_mut() = id;
            } else {
                *running.borrow_mut() = false;
                *request_id.borrow_mut() = None;
            }
        }));

        let id = g.borrow().as_ref().and_then(request_frame);
        if id.is_none() {
            *self.running.borrow_mut() = false;
        }
        *self.request_id.borrow_mut() = id;
    }

    pub fn stop(&self) {
        *self.running.borrow_mut() = false;

        if let Some(id) = self.request_id.borrow_mut().take() {
            if let Some(window) = web_sys::window() {
                window.cancel_animation_frame(id).ok();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn request_frame(closure: &Closure<dyn FnMut(f64)>) -> Option<i32> {
    let window = web_sys::window()?;
    match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
        Ok(id) => Some(id),
        Err(err) => {
            error!("requestAnimationFrame failed: {:?}", err);
            None
        }
    }
}

/// Elapsed time between two requestAnimationFrame timestamps.
///
/// The first frame counts as one reference-rate frame; clock steps
/// backwards count as zero.
pub fn frame_delta(last_ms: Option<f64>, now_ms: f64) -> Duration {
    match last_ms {
        Some(last) => Duration::from_secs_f64(((now_ms - last) / 1000.0).max(0.0)),
        None => Duration::from_secs_f64(1.0 / REFERENCE_FPS as f64),
    }
}
