/// Hero3D Core Library - real-time interactive 3D scene logic
///
/// Geometry building, rotation and perspective projection, painter's-algorithm
/// depth sorting, drag interaction and the per-frame render loop. Hosts
/// (terminal, browser canvas) supply a drawing surface and frame scheduling.

pub mod builder;
pub mod config;
pub mod depth;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod paint;
pub mod panorama;
pub mod projection;
pub mod render;
pub mod runtime;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use builder::WindowGrid;
pub use config::{PanoramaConfig, SceneConfig};
pub use depth::DrawableFace;
pub use error::{ConfigError, InitError, LoadError, MeshError};
pub use geometry::{Face, LocalTransform, Mesh, Rgb, Scene};
pub use interaction::{DragTarget, InteractionController, ObjectRotation};
pub use paint::{Gradient, PaintCommand, Rgba, Surface};
pub use panorama::PanoramaView;
pub use projection::{ProjectedVertex, Projector, Viewport};
pub use render::FrameRenderer;
pub use runtime::{FrameHost, FrameToken, Lifecycle, ListenerId, ListenerKind, SceneHandle};
pub use transform::{RotationState, Transform};
