//! RAII handles for device resources.
//!
//! [`Buffer`] and [`Texture`] are created by [`GraphicsDevice`](crate::GraphicsDevice)
//! and shared through `Arc`. A handle keeps only a weak link to its device;
//! dropping the last `Arc` submits the matching release command on the
//! device's queue, after every command that still referenced it.

mod buffer;
mod texture;

pub use buffer::Buffer;
pub use texture::Texture;
