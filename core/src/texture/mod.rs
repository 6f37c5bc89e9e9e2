//! CPU-side texture types.
//!
//! Provides [`CpuTexture`] for holding decoded RGBA pixel data, along with
//! [`TextureFormat`] shared between CPU and GPU code and the
//! [`TextureError`] returned by the decoders.

mod types;

pub use types::{CpuTexture, TextureError, TextureFormat};
