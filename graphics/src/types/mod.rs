//! Resource descriptors and usage flags accepted by
//! [`GraphicsDevice`](crate::GraphicsDevice).

mod buffer;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use texture::{TextureDescriptor, TextureUsage};

pub use ember_core::texture::TextureFormat;
