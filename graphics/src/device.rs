//! Graphics device.
//!
//! The [`GraphicsDevice`] is the main interface for creating GPU resources and
//! issuing binds and draws. It validates every request and turns it into a
//! [`BackendCommand`] for its [`GpuBackend`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use ember_core::texture::CpuTexture;

use crate::backend::{BackendCommand, BufferId, GpuBackend, ShaderStage, TextureId};
use crate::error::GraphicsError;
use crate::materials::Material;
use crate::resources::{Buffer, Texture};
use crate::types::{BufferDescriptor, BufferUsage, TextureDescriptor, TextureUsage};

/// Limits a [`GraphicsDevice`] validates requests against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Largest texture width or height.
    pub max_texture_dimension: u32,
    /// Largest buffer in bytes.
    pub max_buffer_size: u64,
    /// Number of texture slots a shader may sample from at once.
    pub max_texture_slots: u32,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: 16384,
            max_buffer_size: 1 << 30, // 1 GB
            max_texture_slots: 32,
        }
    }
}

/// Front end of a [`GpuBackend`]: hands out resource ids and submits
/// validated commands.
///
/// The device is `Send + Sync`. Commands reach the backend in call order.
///
/// # Example
///
/// ```ignore
/// let backend = Arc::new(DummyBackend::new());
/// let device = GraphicsDevice::new(backend.clone())?;
///
/// let buffer = device.create_buffer(&BufferDescriptor::new(1024, BufferUsage::VERTEX))?;
/// device.bind_vertex_buffer(&buffer)?;
/// ```
pub struct GraphicsDevice {
    backend: Arc<dyn GpuBackend>,
    capabilities: DeviceCapabilities,
    next_id: AtomicU64,
    white_texture: Arc<Texture>,
    black_texture: Arc<Texture>,
    buffers: LiveSet<Buffer>,
    textures: LiveSet<Texture>,
    materials: LiveSet<Material>,
}

/// Weak list of resources created by a device; dead entries are pruned on
/// insert.
struct LiveSet<T>(Mutex<Vec<Weak<T>>>);

impl<T> LiveSet<T> {
    fn new() -> Self {
        Self(Mutex::new(Vec::new()))
    }

    fn insert(&self, item: &Arc<T>) {
        let mut items = self.0.lock();
        items.retain(|weak| weak.strong_count() > 0);
        items.push(Arc::downgrade(item));
    }

    fn live(&self) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl GraphicsDevice {
    /// Create a device with default capabilities on top of `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the default textures.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Result<Arc<Self>, GraphicsError> {
        Self::with_capabilities(backend, DeviceCapabilities::default())
    }

    /// Create a device with explicit capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the default textures.
    pub fn with_capabilities(
        backend: Arc<dyn GpuBackend>,
        capabilities: DeviceCapabilities,
    ) -> Result<Arc<Self>, GraphicsError> {
        let white = CpuTexture::solid_color([255, 255, 255, 255]).with_name("white");
        let black = CpuTexture::solid_color([0, 0, 0, 255]).with_name("black");
        let white_id = TextureId(1);
        let black_id = TextureId(2);

        for (id, texture) in [(white_id, &white), (black_id, &black)] {
            backend.submit(BackendCommand::CreateTexture {
                id,
                descriptor: cpu_texture_descriptor(texture),
                data: Some(texture.data.clone()),
            })?;
        }

        let device = Arc::new_cyclic(|weak: &Weak<Self>| Self {
            backend,
            capabilities,
            next_id: AtomicU64::new(3),
            white_texture: Arc::new(Texture::new(
                white_id,
                weak.clone(),
                cpu_texture_descriptor(&white),
            )),
            black_texture: Arc::new(Texture::new(
                black_id,
                weak.clone(),
                cpu_texture_descriptor(&black),
            )),
            buffers: LiveSet::new(),
            textures: LiveSet::new(),
            materials: LiveSet::new(),
        });

        log::trace!("GraphicsDevice: created on {}", device.name());
        Ok(device)
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Shared 1x1 opaque white texture.
    pub fn white_texture(&self) -> &Arc<Texture> {
        &self.white_texture
    }

    /// Shared 1x1 opaque black texture.
    pub fn black_texture(&self) -> &Arc<Texture> {
        &self.black_texture
    }

    /// Create an uninitialized buffer.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or oversized buffer, or if the backend
    /// rejects the command.
    pub fn create_buffer(
        self: &Arc<Self>,
        descriptor: &BufferDescriptor,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        let max = self.capabilities.max_buffer_size;
        if descriptor.size == 0 || descriptor.size > max {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer {:?}: size {} outside 1..={max}",
                descriptor.label, descriptor.size
            )));
        }

        let id = BufferId(self.allocate_id());
        self.submit(BackendCommand::CreateBuffer {
            id,
            descriptor: descriptor.clone(),
        })?;

        let buffer = Arc::new(Buffer::new(id, Arc::downgrade(self), descriptor.clone()));
        self.buffers.insert(&buffer);
        log::trace!("buffer {id:?} {:?}: {} bytes", descriptor.label, descriptor.size);

        Ok(buffer)
    }

    /// Create a GPU buffer and upload its initial contents.
    ///
    /// # Errors
    ///
    /// Same as [`create_buffer`](Self::create_buffer) and
    /// [`write_buffer`](Self::write_buffer).
    pub fn create_buffer_init(
        self: &Arc<Self>,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<Arc<Buffer>, GraphicsError> {
        let descriptor = BufferDescriptor {
            usage: descriptor.usage | BufferUsage::COPY_DST,
            ..descriptor.clone()
        };
        let buffer = self.create_buffer(&descriptor)?;
        self.write_buffer(&buffer, 0, data)?;
        Ok(buffer)
    }

    /// Upload `data` into `buffer` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is not writable or the range does not
    /// fit inside it.
    pub fn write_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        if !buffer.descriptor().usage.contains(BufferUsage::COPY_DST) {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer {:?} is not writable (missing COPY_DST)",
                buffer.label()
            )));
        }

        let end = offset + data.len() as u64;
        if end > buffer.size() {
            return Err(GraphicsError::InvalidParameter(format!(
                "write of {} bytes at offset {} exceeds buffer size {}",
                data.len(),
                offset,
                buffer.size()
            )));
        }

        if data.is_empty() {
            return Ok(());
        }

        self.submit(BackendCommand::WriteBuffer {
            id: buffer.id(),
            offset,
            data: data.to_vec(),
        })
    }

    /// Create a texture, optionally filled with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or oversized dimensions, or if `data` does
    /// not match the descriptor's byte size.
    pub fn create_texture(
        self: &Arc<Self>,
        descriptor: &TextureDescriptor,
        data: Option<&[u8]>,
    ) -> Result<Arc<Texture>, GraphicsError> {
        let max = self.capabilities.max_texture_dimension;
        let valid = 1..=max;
        if !valid.contains(&descriptor.width) || !valid.contains(&descriptor.height) {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture {:?}: {}x{} outside 1..={max}",
                descriptor.label, descriptor.width, descriptor.height
            )));
        }

        if let Some(data) = data
            && data.len() as u64 != descriptor.byte_size()
        {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture data is {} bytes, expected {}",
                data.len(),
                descriptor.byte_size()
            )));
        }

        let id = TextureId(self.allocate_id());
        self.submit(BackendCommand::CreateTexture {
            id,
            descriptor: descriptor.clone(),
            data: data.map(<[u8]>::to_vec),
        })?;

        let texture = Arc::new(Texture::new(id, Arc::downgrade(self), descriptor.clone()));
        self.textures.insert(&texture);
        log::trace!(
            "texture {id:?} {:?}: {}x{}",
            descriptor.label,
            descriptor.width,
            descriptor.height
        );

        Ok(texture)
    }

    /// Create a sampled texture from decoded CPU pixels.
    ///
    /// # Errors
    ///
    /// Same as [`create_texture`](Self::create_texture).
    pub fn create_texture_from_cpu(
        self: &Arc<Self>,
        texture: &CpuTexture,
    ) -> Result<Arc<Texture>, GraphicsError> {
        self.create_texture(&cpu_texture_descriptor(texture), Some(&texture.data))
    }

    /// Select the pipeline of the named shader for subsequent draws.
    pub fn bind_shader(&self, name: &str) -> Result<(), GraphicsError> {
        self.submit(BackendCommand::BindShader {
            name: name.to_string(),
        })
    }

    /// Bind a vertex buffer for subsequent draws.
    pub fn bind_vertex_buffer(&self, buffer: &Buffer) -> Result<(), GraphicsError> {
        require_usage(buffer, BufferUsage::VERTEX)?;
        self.submit(BackendCommand::BindVertexBuffer { id: buffer.id() })
    }

    /// Bind an index buffer for subsequent draws.
    pub fn bind_index_buffer(&self, buffer: &Buffer) -> Result<(), GraphicsError> {
        require_usage(buffer, BufferUsage::INDEX)?;
        self.submit(BackendCommand::BindIndexBuffer { id: buffer.id() })
    }

    /// Bind a uniform buffer to a shared bind group.
    pub fn bind_uniform_buffer(&self, buffer: &Buffer, group: u32) -> Result<(), GraphicsError> {
        require_usage(buffer, BufferUsage::UNIFORM)?;
        self.submit(BackendCommand::BindUniformBuffer {
            id: buffer.id(),
            group,
        })
    }

    /// Upload a material uniform block for one shader stage.
    pub fn upload_uniforms(&self, stage: ShaderStage, data: &[u8]) -> Result<(), GraphicsError> {
        self.submit(BackendCommand::UploadUniforms {
            stage,
            data: data.to_vec(),
        })
    }

    /// Set per-draw constants.
    pub fn push_constants(&self, data: &[u8]) -> Result<(), GraphicsError> {
        self.submit(BackendCommand::PushConstants {
            data: data.to_vec(),
        })
    }

    /// Bind a texture to a sampler slot.
    ///
    /// # Errors
    ///
    /// Returns an error if `slot` is outside the device's texture slots.
    pub fn bind_texture(&self, texture: &Texture, slot: u32) -> Result<(), GraphicsError> {
        if slot >= self.capabilities.max_texture_slots {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture slot {slot} exceeds maximum {}",
                self.capabilities.max_texture_slots
            )));
        }
        self.submit(BackendCommand::BindTexture {
            id: texture.id(),
            slot,
        })
    }

    /// Issue an indexed draw with the currently bound state.
    pub fn draw_indexed(
        &self,
        index_count: u32,
        base_index: u32,
        base_vertex: u32,
    ) -> Result<(), GraphicsError> {
        self.submit(BackendCommand::DrawIndexed {
            index_count,
            base_index,
            base_vertex,
        })
    }

    /// Buffers created by this device that are still alive.
    pub fn buffer_count(&self) -> usize {
        self.buffers.live()
    }

    /// Live textures, not counting the white and black defaults.
    pub fn texture_count(&self) -> usize {
        self.textures.live()
    }

    pub fn material_count(&self) -> usize {
        self.materials.live()
    }

    pub(crate) fn track_material(&self, material: &Arc<Material>) {
        self.materials.insert(material);
    }

    pub(crate) fn release_buffer(&self, id: BufferId) {
        if let Err(e) = self.submit(BackendCommand::ReleaseBuffer { id }) {
            log::warn!("release of buffer {id:?} failed: {e}");
        }
    }

    pub(crate) fn release_texture(&self, id: TextureId) {
        if let Err(e) = self.submit(BackendCommand::ReleaseTexture { id }) {
            log::warn!("release of texture {id:?} failed: {e}");
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn submit(&self, command: BackendCommand) -> Result<(), GraphicsError> {
        self.backend.submit(command)
    }
}

fn require_usage(buffer: &Buffer, usage: BufferUsage) -> Result<(), GraphicsError> {
    if buffer.descriptor().usage.contains(usage) {
        Ok(())
    } else {
        Err(GraphicsError::InvalidParameter(format!(
            "buffer {:?} lacks usage {:?}",
            buffer.label(),
            usage
        )))
    }
}

fn cpu_texture_descriptor(texture: &CpuTexture) -> TextureDescriptor {
    let descriptor = TextureDescriptor::new_2d(
        texture.width,
        texture.height,
        texture.format,
        TextureUsage::default(),
    );
    match &texture.name {
        Some(name) => descriptor.with_label(name.clone()),
        None => descriptor,
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);
