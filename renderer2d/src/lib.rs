//! Batched 2D renderer for the Ember engine.
//!
//! [`Renderer2D`] collects quads, circles and lines between
//! [`begin_scene`](Renderer2D::begin_scene) and
//! [`end_scene`](Renderer2D::end_scene) and draws each batch with one indexed
//! draw call. Untextured quads sample the device's white texture in slot 0,
//! so textured and untextured quads share one batch.
//!
//! The renderer is an explicit context object: create one per render loop
//! and drop it on shutdown.

mod renderer;
mod stats;
mod vertex;

pub use renderer::{NO_ENTITY, Renderer2D, Renderer2DConfig};
pub use stats::Renderer2DStats;
pub use vertex::{CameraUniforms, CircleVertex, LineVertex, QuadVertex};
