//! Pointer input: host notifications collapsed into one sample per frame.

/// What the animation loop sees of the pointer at the start of a frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    pub mouse_is_down: bool,
    /// Latest horizontal pointer position reported since the previous
    /// frame, `None` if the pointer did not move in between.
    pub pointer_x: Option<f32>,
}

impl FrameInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn dragging(x: f32) -> Self {
        Self {
            mouse_is_down: true,
            pointer_x: Some(x),
        }
    }

    /// A drag only steers the spheres once there is a position to steer with
    pub fn drag_sample(&self) -> Option<f32> {
        if self.mouse_is_down {
            self.pointer_x
        } else {
            None
        }
    }
}

/// Progress of the current drag
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragState {
    /// First pointer position of the drag, `None` until captured
    pub start_x: Option<f32>,
    pub current_x: Option<f32>,
}

impl DragState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a pointer sample, capturing the start on the first one
    pub fn sample(&mut self, x: f32) {
        if self.start_x.is_none() {
            self.start_x = Some(x);
        }
        self.current_x = Some(x);
    }

    /// Horizontal displacement since the drag started, start minus current
    pub fn displacement(&self) -> f32 {
        match (self.start_x, self.current_x) {
            (Some(start), Some(current)) => start - current,
            _ => 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.start_x.is_some()
    }
}

/// Accumulates pointer events delivered by the host between frames.
///
/// Only the latest position matters; intermediate moves are overwritten.
/// Each position is handed to exactly one frame, so holding the button
/// still lets the spheres fall back to the idle spin.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    down: bool,
    last_x: Option<f32>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&mut self) {
        self.down = true;
        self.last_x = None;
    }

    pub fn pointer_move(&mut self, x: f32) {
        if self.down {
            self.last_x = Some(x);
        }
    }

    pub fn pointer_up(&mut self) {
        self.down = false;
        self.last_x = None;
    }

    pub fn is_down(&self) -> bool {
        self.down
    }

    /// Peek at what the next frame would see
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            mouse_is_down: self.down,
            pointer_x: self.last_x,
        }
    }

    /// Sample for the frame about to run, consuming the pending position
    pub fn take_frame_input(&mut self) -> FrameInput {
        FrameInput {
            mouse_is_down: self.down,
            pointer_x: self.last_x.take(),
        }
    }
}
