//! GPU backend abstraction layer.
//!
//! The engine never talks to a graphics API directly. Every resource
//! operation is turned into a [`BackendCommand`] and submitted to a
//! [`GpuBackend`], which executes commands strictly in submission order.
//! Callers never wait for a command to complete.
//!
//! # Available Backends
//!
//! - [`DummyBackend`]: records commands in memory, used by tests and tools

pub mod dummy;

pub use dummy::{DummyBackend, RecordedDraw};

use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, TextureDescriptor};

/// Opaque identifier of a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// Opaque identifier of a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Programmable stage a uniform block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Pixel => write!(f, "pixel"),
        }
    }
}

/// A single operation for the GPU backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    CreateBuffer {
        id: BufferId,
        descriptor: BufferDescriptor,
    },
    WriteBuffer {
        id: BufferId,
        offset: u64,
        data: Vec<u8>,
    },
    CreateTexture {
        id: TextureId,
        descriptor: TextureDescriptor,
        data: Option<Vec<u8>>,
    },
    /// Select the pipeline built from the named shader.
    BindShader {
        name: String,
    },
    BindVertexBuffer {
        id: BufferId,
    },
    BindIndexBuffer {
        id: BufferId,
    },
    /// Bind a uniform buffer to a bind group shared by every pipeline.
    BindUniformBuffer {
        id: BufferId,
        group: u32,
    },
    /// Upload a material uniform block for one stage.
    UploadUniforms {
        stage: ShaderStage,
        data: Vec<u8>,
    },
    /// Per-draw constants (object transform).
    PushConstants {
        data: Vec<u8>,
    },
    BindTexture {
        id: TextureId,
        slot: u32,
    },
    DrawIndexed {
        index_count: u32,
        base_index: u32,
        base_vertex: u32,
    },
    ReleaseBuffer {
        id: BufferId,
    },
    ReleaseTexture {
        id: TextureId,
    },
}

/// A command-consuming GPU backend.
///
/// Implementations must execute commands in the order they are submitted.
pub trait GpuBackend: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Enqueue one command.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::DeviceLost`] if the backend can no longer
    /// accept work.
    fn submit(&self, command: BackendCommand) -> Result<(), GraphicsError>;
}
