/// Globe Core Library - scene, viewport and animation loop
///
/// Builds the fixed three-object scene (wireframe cube, textured sphere,
/// translucent shell), keeps the camera in step with the host surface, and
/// advances rotations one frame at a time. Hosts supply a `Renderer` and a
/// frame scheduler; `raster` provides a CPU renderer they can share.

pub mod animation;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod material;
pub mod projection;
pub mod raster;
pub mod scene;
pub mod texture;
pub mod transform;
pub mod viewport;

// Re-export commonly used types
pub use animation::{advance_frame, AnimationConfig, AnimationLoop, AnimationState, LoopControl, StopHandle};
pub use config::GlobeConfig;
pub use error::{ConfigError, TextureError};
pub use geometry::{Mesh, Triangle, Vertex};
pub use input::{DragState, FrameInput, PointerTracker};
pub use material::{Color, Material};
pub use projection::{Camera, ScreenPoint};
pub use raster::{Framebuffer, Rasterizer};
pub use scene::{build_scene, ObjectId, Scene, SceneConfig, SceneObject};
pub use texture::{Texture, TextureStore};
pub use transform::{Axis, RotationState, Transform};
pub use viewport::{Renderer, Viewport};
