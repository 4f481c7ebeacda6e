//! Per-frame animation: cube spin, drag-steered sphere rotation, redraw.
//!
//! [`advance_frame`] is a pure function from one [`AnimationState`] to the
//! next. [`AnimationLoop`] wraps it with the scene and viewport and is what
//! a host frame scheduler calls once per display refresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::input::{DragState, FrameInput};
use crate::scene::{ObjectId, Scene};
use crate::transform::{Axis, Transform};
use crate::viewport::{Renderer, Viewport};

/// Refresh rate the per-frame steps were tuned for
pub const REFERENCE_FPS: f32 = 60.0;

/// Rotation rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Cube step about the horizontal axis, radians per frame
    pub cube_step_x: f32,
    /// Cube step about the vertical axis, radians per frame
    pub cube_step_y: f32,
    /// Sphere step about the vertical axis when not dragging
    pub idle_step: f32,
    /// Pixels of drag displacement per radian of rotation per frame
    pub drag_divisor: f32,
    /// Scale steps by elapsed time relative to [`REFERENCE_FPS`]
    pub time_scaled: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            cube_step_x: 0.003,
            cube_step_y: 0.0008,
            idle_step: 0.0008,
            drag_divisor: 100_000.0,
            time_scaled: false,
        }
    }
}

impl AnimationConfig {
    fn step_scale(&self, dt: Duration) -> f32 {
        if self.time_scaled {
            dt.as_secs_f32() * REFERENCE_FPS
        } else {
            1.0
        }
    }
}

/// Everything the loop mutates from frame to frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimationState {
    pub cube: Transform,
    pub sphere: Transform,
    pub shell: Transform,
    pub drag: DragState,
    pub frame: u64,
}

impl AnimationState {
    /// Capture the current transforms of the scene's objects
    pub fn from_scene(scene: &Scene) -> Self {
        let transform = |id| {
            scene
                .object(id)
                .map(|o| o.transform)
                .unwrap_or_default()
        };
        Self {
            cube: transform(ObjectId::Cube),
            sphere: transform(ObjectId::Sphere),
            shell: transform(ObjectId::SphereShell),
            drag: DragState::default(),
            frame: 0,
        }
    }

    /// Write the transforms back into the scene
    pub fn apply(&self, scene: &mut Scene) {
        for (id, transform) in [
            (ObjectId::Cube, self.cube),
            (ObjectId::Sphere, self.sphere),
            (ObjectId::SphereShell, self.shell),
        ] {
            if let Some(object) = scene.object_mut(id) {
                object.transform = transform;
            }
        }
    }

    /// Rotation the spheres get this frame for a given drag
    pub fn drag_rotation(drag: &DragState, config: &AnimationConfig) -> f32 {
        drag.displacement() / config.drag_divisor
    }
}

/// Compute the next state from the current one and this frame's input
pub fn advance_frame(
    state: &AnimationState,
    input: &FrameInput,
    dt: Duration,
    config: &AnimationConfig,
) -> AnimationState {
    let mut next = state.clone();
    let scale = config.step_scale(dt);

    next.cube.rotate(Axis::X, config.cube_step_x * scale);
    next.cube.rotate(Axis::Y, config.cube_step_y * scale);

    let sphere_step = match input.drag_sample() {
        Some(x) => {
            next.drag.sample(x);
            AnimationState::drag_rotation(&next.drag, config) * scale
        }
        None => {
            next.drag.reset();
            config.idle_step * scale
        }
    };

    // Same delta for both so the shell stays registered with the surface
    next.sphere.rotate(Axis::Y, sphere_step);
    next.shell.rotate(Axis::Y, sphere_step);

    next.frame += 1;
    next
}

/// Shared cancellation flag for a running loop
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear a previous stop so the loop can be scheduled again
    pub fn resume(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Whether the scheduler should call the loop again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// The self-rescheduling frame task
pub struct AnimationLoop<R> {
    scene: Scene,
    viewport: Viewport<R>,
    state: AnimationState,
    config: AnimationConfig,
    stop: StopHandle,
}

impl<R: Renderer> AnimationLoop<R> {
    pub fn new(scene: Scene, viewport: Viewport<R>, config: AnimationConfig) -> Self {
        let state = AnimationState::from_scene(&scene);
        Self {
            scene,
            viewport,
            state,
            config,
            stop: StopHandle::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn viewport(&self) -> &Viewport<R> {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport<R> {
        &mut self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.resize(width, height);
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn resume(&self) {
        self.stop.resume();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Run one frame: advance, apply to the scene, redraw.
    ///
    /// Once stopped, returns [`LoopControl::Stop`] without doing any work.
    pub fn frame(&mut self, input: &FrameInput, dt: Duration) -> Result<LoopControl, R::Error> {
        if self.stop.is_stopped() {
            return Ok(LoopControl::Stop);
        }

        self.state = advance_frame(&self.state, input, dt, &self.config);
        self.state.apply(&mut self.scene);
        self.viewport.render(&self.scene)?;

        if self.stop.is_stopped() {
            info!("animation loop stopped after {} frames", self.state.frame);
            return Ok(LoopControl::Stop);
        }
        Ok(LoopControl::Continue)
    }
}
