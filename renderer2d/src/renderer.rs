use std::sync::Arc;

use ember_core::math::{Mat4, Vec3, Vec4, mat4_from_scale_rotation_translation, quat_from_rotation_z};
use ember_graphics::device::GraphicsDevice;
use ember_graphics::error::GraphicsError;
use ember_graphics::resources::{Buffer, Texture};
use ember_graphics::shader::library::{RENDERER2D_CIRCLE, RENDERER2D_LINE, RENDERER2D_QUAD};
use ember_graphics::shader::{FRAME_GROUP, ShaderLibrary};
use ember_graphics::types::{BufferDescriptor, BufferUsage};

use crate::stats::Renderer2DStats;
use crate::vertex::{CameraUniforms, CircleVertex, LineVertex, QuadVertex};

/// Entity id written into vertices drawn without one.
pub const NO_ENTITY: i32 = -1;

/// Name of the texture array the quad shader samples.
const TEXTURE_ARRAY: &str = "uTextures";

/// Unit quad corners: bottom-left, bottom-right, top-right, top-left.
const QUAD_POSITIONS: [[f32; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];
const QUAD_TEX_COORDS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Edge softness of circles, in units of the radius.
const CIRCLE_FADE: f32 = 0.005;

/// Batch limits of a [`Renderer2D`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer2DConfig {
    /// Quads per batch. Circles have their own batch of the same size.
    pub max_quads: u32,
    /// Texture slots per batch, including the white texture in slot 0.
    pub max_texture_slots: u32,
    /// Lines per batch.
    pub max_lines: u32,
}

impl Default for Renderer2DConfig {
    fn default() -> Self {
        Self {
            max_quads: 20000,
            max_texture_slots: 32,
            max_lines: 10000,
        }
    }
}

impl Renderer2DConfig {
    #[must_use]
    pub fn with_max_quads(mut self, max_quads: u32) -> Self {
        self.max_quads = max_quads;
        self
    }

    #[must_use]
    pub fn with_max_texture_slots(mut self, max_texture_slots: u32) -> Self {
        self.max_texture_slots = max_texture_slots;
        self
    }

    #[must_use]
    pub fn with_max_lines(mut self, max_lines: u32) -> Self {
        self.max_lines = max_lines;
        self
    }

    pub fn max_vertices(&self) -> u32 {
        self.max_quads * 4
    }

    pub fn max_indices(&self) -> u32 {
        self.max_quads * 6
    }

    pub fn max_line_vertices(&self) -> u32 {
        self.max_lines * 2
    }
}

/// Batched renderer for 2D quads, circles and lines.
///
/// Quads are collected into one vertex batch and drawn with a single indexed
/// draw per batch. Circles and lines each get a batch and a draw of their
/// own, issued after the quads. A batch is flushed when it is full, when every texture
/// slot is taken and a new texture arrives, or at [`end_scene`](Self::end_scene).
/// Flushing draws everything collected so far before the next quad is
/// accepted, so submission order is draw order.
///
/// # Usage
///
/// ```ignore
/// let mut renderer = Renderer2D::new(&device, &library, Renderer2DConfig::default())?;
///
/// renderer.begin_scene(&camera.view_projection())?;
/// renderer.draw_quad_at([0.0, 0.0, 0.0], [1.0, 1.0], [1.0, 0.0, 0.0, 1.0])?;
/// renderer.draw_textured_quad(&transform, &sprite, 1.0, [1.0; 4])?;
/// renderer.end_scene()?;
/// ```
pub struct Renderer2D {
    device: Arc<GraphicsDevice>,
    config: Renderer2DConfig,

    camera_buffer: Arc<Buffer>,
    quad_vertex_buffer: Arc<Buffer>,
    quad_index_buffer: Arc<Buffer>,
    circle_vertex_buffer: Arc<Buffer>,
    line_vertex_buffer: Arc<Buffer>,
    line_index_buffer: Arc<Buffer>,

    quad_vertices: Vec<QuadVertex>,
    quad_index_count: u32,
    circle_vertices: Vec<CircleVertex>,
    circle_index_count: u32,
    line_vertices: Vec<LineVertex>,

    /// Slot 0 always holds the white texture.
    texture_slots: Vec<Option<Arc<Texture>>>,
    texture_slot_index: u32,

    stats: Renderer2DStats,
}

impl Renderer2D {
    /// Create the renderer and its GPU buffers.
    ///
    /// The quad index buffer is filled once with the quad pattern for the
    /// whole batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the 2D shaders are missing from `library`, if the
    /// configuration does not fit the shader or the device, or if a buffer
    /// cannot be created.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        library: &ShaderLibrary,
        config: Renderer2DConfig,
    ) -> Result<Self, GraphicsError> {
        validate_config(device, library, &config)?;

        let camera_buffer = device.create_buffer(
            &BufferDescriptor::new(
                std::mem::size_of::<CameraUniforms>() as u64,
                BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            )
            .with_label("renderer2d_camera"),
        )?;

        let quad_vertex_buffer = device.create_buffer(
            &BufferDescriptor::new(
                u64::from(config.max_vertices()) * std::mem::size_of::<QuadVertex>() as u64,
                BufferUsage::VERTEX | BufferUsage::COPY_DST,
            )
            .with_label("renderer2d_quad_vertices"),
        )?;

        let quad_indices: Vec<u32> = (0..config.max_quads)
            .flat_map(|quad| QUAD_INDICES.map(|index| quad * 4 + index))
            .collect();
        let quad_index_buffer = device.create_buffer_init(
            &BufferDescriptor::new(
                std::mem::size_of_val(quad_indices.as_slice()) as u64,
                BufferUsage::INDEX,
            )
            .with_label("renderer2d_quad_indices"),
            bytemuck::cast_slice(&quad_indices),
        )?;

        let circle_vertex_buffer = device.create_buffer(
            &BufferDescriptor::new(
                u64::from(config.max_vertices()) * std::mem::size_of::<CircleVertex>() as u64,
                BufferUsage::VERTEX | BufferUsage::COPY_DST,
            )
            .with_label("renderer2d_circle_vertices"),
        )?;

        let line_vertex_buffer = device.create_buffer(
            &BufferDescriptor::new(
                u64::from(config.max_line_vertices()) * std::mem::size_of::<LineVertex>() as u64,
                BufferUsage::VERTEX | BufferUsage::COPY_DST,
            )
            .with_label("renderer2d_line_vertices"),
        )?;

        let line_indices: Vec<u32> = (0..config.max_line_vertices()).collect();
        let line_index_buffer = device.create_buffer_init(
            &BufferDescriptor::new(
                std::mem::size_of_val(line_indices.as_slice()) as u64,
                BufferUsage::INDEX,
            )
            .with_label("renderer2d_line_indices"),
            bytemuck::cast_slice(&line_indices),
        )?;

        let mut texture_slots = vec![None; config.max_texture_slots as usize];
        texture_slots[0] = Some(Arc::clone(device.white_texture()));

        log::debug!(
            "Renderer2D: {} quads, {} texture slots, {} lines per batch",
            config.max_quads,
            config.max_texture_slots,
            config.max_lines
        );

        Ok(Self {
            device: Arc::clone(device),
            config,
            camera_buffer,
            quad_vertex_buffer,
            quad_index_buffer,
            circle_vertex_buffer,
            line_vertex_buffer,
            line_index_buffer,
            quad_vertices: Vec::with_capacity(config.max_vertices() as usize),
            quad_index_count: 0,
            circle_vertices: Vec::new(),
            circle_index_count: 0,
            line_vertices: Vec::new(),
            texture_slots,
            texture_slot_index: 1,
            stats: Renderer2DStats::default(),
        })
    }

    pub fn config(&self) -> &Renderer2DConfig {
        &self.config
    }

    /// Upload the camera and start an empty batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera upload is rejected.
    pub fn begin_scene(&mut self, view_projection: &Mat4) -> Result<(), GraphicsError> {
        let uniforms = CameraUniforms {
            view_projection: (*view_projection).into(),
        };
        self.device
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniforms))?;
        self.start_batch();
        Ok(())
    }

    /// Draw everything collected since the last flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects a command.
    pub fn end_scene(&mut self) -> Result<(), GraphicsError> {
        self.flush()
    }

    /// Draw the pending batch and start a new one.
    ///
    /// The batch is reset even when drawing fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects a command.
    pub fn flush(&mut self) -> Result<(), GraphicsError> {
        let result = self.draw_batch();
        self.start_batch();
        result
    }

    // -- Quads -------------------------------------------------------------

    /// Draw a unit quad transformed by `transform`.
    ///
    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_quad(&mut self, transform: &Mat4, color: [f32; 4]) -> Result<(), GraphicsError> {
        self.draw_quad_with_entity(transform, color, NO_ENTITY)
    }

    /// Draw a colored quad tagged with `entity_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_quad_with_entity(
        &mut self,
        transform: &Mat4,
        color: [f32; 4],
        entity_id: i32,
    ) -> Result<(), GraphicsError> {
        self.reserve_quad()?;
        self.push_quad(transform, color, 0, 1.0, entity_id);
        Ok(())
    }

    /// Draw a textured quad. `tint` multiplies the sampled color and
    /// `tiling_factor` scales the texture coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_textured_quad(
        &mut self,
        transform: &Mat4,
        texture: &Arc<Texture>,
        tiling_factor: f32,
        tint: [f32; 4],
    ) -> Result<(), GraphicsError> {
        self.draw_textured_quad_with_entity(transform, texture, tiling_factor, tint, NO_ENTITY)
    }

    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_textured_quad_with_entity(
        &mut self,
        transform: &Mat4,
        texture: &Arc<Texture>,
        tiling_factor: f32,
        tint: [f32; 4],
        entity_id: i32,
    ) -> Result<(), GraphicsError> {
        self.reserve_quad()?;
        let slot = self.texture_slot(texture)?;
        self.push_quad(transform, tint, slot, tiling_factor, entity_id);
        Ok(())
    }

    /// Draw an axis-aligned quad centred at `position`.
    ///
    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_quad_at(
        &mut self,
        position: [f32; 3],
        size: [f32; 2],
        color: [f32; 4],
    ) -> Result<(), GraphicsError> {
        self.draw_quad(&quad_transform(position, size, 0.0), color)
    }

    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_textured_quad_at(
        &mut self,
        position: [f32; 3],
        size: [f32; 2],
        texture: &Arc<Texture>,
        tiling_factor: f32,
        tint: [f32; 4],
    ) -> Result<(), GraphicsError> {
        self.draw_textured_quad(
            &quad_transform(position, size, 0.0),
            texture,
            tiling_factor,
            tint,
        )
    }

    /// Draw a quad centred at `position`, rotated by `rotation` radians
    /// around the z axis.
    ///
    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_rotated_quad(
        &mut self,
        position: [f32; 3],
        size: [f32; 2],
        rotation: f32,
        color: [f32; 4],
    ) -> Result<(), GraphicsError> {
        self.draw_quad(&quad_transform(position, size, rotation), color)
    }

    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_rotated_textured_quad(
        &mut self,
        position: [f32; 3],
        size: [f32; 2],
        rotation: f32,
        texture: &Arc<Texture>,
        tiling_factor: f32,
        tint: [f32; 4],
    ) -> Result<(), GraphicsError> {
        self.draw_textured_quad(
            &quad_transform(position, size, rotation),
            texture,
            tiling_factor,
            tint,
        )
    }

    // -- Circles -----------------------------------------------------------

    /// Draw a circle inscribed in the unit quad transformed by `transform`.
    ///
    /// `thickness` is the ring width as a fraction of the radius: 1.0 fills
    /// the disc, smaller values leave a hole in the middle.
    ///
    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_circle(
        &mut self,
        transform: &Mat4,
        color: [f32; 4],
        thickness: f32,
        entity_id: i32,
    ) -> Result<(), GraphicsError> {
        if self.circle_index_count >= self.config.max_indices() {
            self.flush()?;
        }
        for [x, y] in QUAD_POSITIONS {
            self.circle_vertices.push(CircleVertex {
                world_position: transform_corner(transform, [x, y]),
                local_position: [x * 2.0, y * 2.0, 0.0],
                color,
                thickness,
                fade: CIRCLE_FADE,
                entity_id,
            });
        }
        self.circle_index_count += 6;
        self.stats.circle_count += 1;
        Ok(())
    }

    // -- Lines -------------------------------------------------------------

    /// Draw a line segment.
    ///
    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_line(
        &mut self,
        start: [f32; 3],
        end: [f32; 3],
        color: [f32; 4],
        entity_id: i32,
    ) -> Result<(), GraphicsError> {
        if self.line_vertices.len() as u32 >= self.config.max_line_vertices() {
            self.flush()?;
        }
        for position in [start, end] {
            self.line_vertices.push(LineVertex {
                position,
                color,
                entity_id,
            });
        }
        self.stats.line_count += 1;
        Ok(())
    }

    /// Outline an axis-aligned rectangle centred at `position`.
    ///
    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_rect(
        &mut self,
        position: [f32; 3],
        size: [f32; 2],
        color: [f32; 4],
        entity_id: i32,
    ) -> Result<(), GraphicsError> {
        let [x, y, z] = position;
        let [hw, hh] = [size[0] * 0.5, size[1] * 0.5];
        let corners = [
            [x - hw, y - hh, z],
            [x + hw, y - hh, z],
            [x + hw, y + hh, z],
            [x - hw, y + hh, z],
        ];
        self.draw_outline(corners, color, entity_id)
    }

    /// Outline the unit quad transformed by `transform`.
    ///
    /// # Errors
    ///
    /// Returns an error if an implicit flush fails.
    pub fn draw_rect_transform(
        &mut self,
        transform: &Mat4,
        color: [f32; 4],
        entity_id: i32,
    ) -> Result<(), GraphicsError> {
        let corners = QUAD_POSITIONS.map(|corner| transform_corner(transform, corner));
        self.draw_outline(corners, color, entity_id)
    }

    // -- Stats -------------------------------------------------------------

    pub fn stats(&self) -> Renderer2DStats {
        self.stats
    }

    /// Stats are only cleared here, never by the frame calls.
    pub fn reset_stats(&mut self) {
        self.stats = Renderer2DStats::default();
    }

    /// Indices reserved by the pending quad batch.
    pub fn index_count(&self) -> u32 {
        self.quad_index_count
    }

    /// Indices reserved by the pending circle batch.
    pub fn circle_index_count(&self) -> u32 {
        self.circle_index_count
    }

    /// Next free texture slot of the pending batch.
    pub fn texture_slot_index(&self) -> u32 {
        self.texture_slot_index
    }

    // -- Batching ----------------------------------------------------------

    fn start_batch(&mut self) {
        self.quad_vertices.clear();
        self.quad_index_count = 0;
        self.circle_vertices.clear();
        self.circle_index_count = 0;
        self.line_vertices.clear();
        for slot in &mut self.texture_slots[1..] {
            *slot = None;
        }
        self.texture_slot_index = 1;
    }

    fn reserve_quad(&mut self) -> Result<(), GraphicsError> {
        if self.quad_index_count >= self.config.max_indices() {
            self.flush()?;
        }
        Ok(())
    }

    /// Slot of `texture` in the pending batch, binding it to the next free
    /// slot if needed. A full slot table flushes first.
    fn texture_slot(&mut self, texture: &Arc<Texture>) -> Result<u32, GraphicsError> {
        let resident = (1..self.texture_slot_index).find(|&slot| {
            self.texture_slots[slot as usize]
                .as_ref()
                .is_some_and(|bound| bound.id() == texture.id())
        });
        if let Some(slot) = resident {
            return Ok(slot);
        }

        if self.texture_slot_index >= self.config.max_texture_slots {
            self.flush()?;
        }
        let slot = self.texture_slot_index;
        self.texture_slots[slot as usize] = Some(Arc::clone(texture));
        self.texture_slot_index += 1;
        Ok(slot)
    }

    fn push_quad(
        &mut self,
        transform: &Mat4,
        color: [f32; 4],
        texture_slot: u32,
        tiling_factor: f32,
        entity_id: i32,
    ) {
        for (corner, tex_coord) in QUAD_POSITIONS.into_iter().zip(QUAD_TEX_COORDS) {
            self.quad_vertices.push(QuadVertex {
                position: transform_corner(transform, corner),
                color,
                tex_coord,
                tex_index: texture_slot as f32,
                tiling_factor,
                entity_id,
            });
        }
        self.quad_index_count += 6;
        self.stats.quad_count += 1;
    }

    fn draw_outline(
        &mut self,
        corners: [[f32; 3]; 4],
        color: [f32; 4],
        entity_id: i32,
    ) -> Result<(), GraphicsError> {
        for i in 0..4 {
            self.draw_line(corners[i], corners[(i + 1) % 4], color, entity_id)?;
        }
        Ok(())
    }

    fn draw_batch(&mut self) -> Result<(), GraphicsError> {
        if self.quad_index_count > 0 {
            // Only the written prefix of the vertex buffer is uploaded.
            self.device.write_buffer(
                &self.quad_vertex_buffer,
                0,
                bytemuck::cast_slice(&self.quad_vertices),
            )?;
            self.device.bind_shader(RENDERER2D_QUAD)?;
            self.device
                .bind_uniform_buffer(&self.camera_buffer, FRAME_GROUP)?;
            for (slot, texture) in self.texture_slots[..self.texture_slot_index as usize]
                .iter()
                .enumerate()
            {
                if let Some(texture) = texture {
                    self.device.bind_texture(texture, slot as u32)?;
                }
            }
            self.device.bind_vertex_buffer(&self.quad_vertex_buffer)?;
            self.device.bind_index_buffer(&self.quad_index_buffer)?;
            self.device.draw_indexed(self.quad_index_count, 0, 0)?;
            self.stats.draw_calls += 1;
        }

        if self.circle_index_count > 0 {
            self.device.write_buffer(
                &self.circle_vertex_buffer,
                0,
                bytemuck::cast_slice(&self.circle_vertices),
            )?;
            self.device.bind_shader(RENDERER2D_CIRCLE)?;
            self.device
                .bind_uniform_buffer(&self.camera_buffer, FRAME_GROUP)?;
            self.device.bind_vertex_buffer(&self.circle_vertex_buffer)?;
            // Circles are quads, so the prefilled quad pattern applies.
            self.device.bind_index_buffer(&self.quad_index_buffer)?;
            self.device.draw_indexed(self.circle_index_count, 0, 0)?;
            self.stats.draw_calls += 1;
        }

        if !self.line_vertices.is_empty() {
            self.device.write_buffer(
                &self.line_vertex_buffer,
                0,
                bytemuck::cast_slice(&self.line_vertices),
            )?;
            self.device.bind_shader(RENDERER2D_LINE)?;
            self.device
                .bind_uniform_buffer(&self.camera_buffer, FRAME_GROUP)?;
            self.device.bind_vertex_buffer(&self.line_vertex_buffer)?;
            self.device.bind_index_buffer(&self.line_index_buffer)?;
            self.device
                .draw_indexed(self.line_vertices.len() as u32, 0, 0)?;
            self.stats.draw_calls += 1;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Renderer2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer2D")
            .field("config", &self.config)
            .field("index_count", &self.quad_index_count)
            .field("circle_index_count", &self.circle_index_count)
            .field("texture_slot_index", &self.texture_slot_index)
            .field("line_vertices", &self.line_vertices.len())
            .field("stats", &self.stats)
            .finish()
    }
}

fn validate_config(
    device: &GraphicsDevice,
    library: &ShaderLibrary,
    config: &Renderer2DConfig,
) -> Result<(), GraphicsError> {
    if config.max_quads == 0 || config.max_lines == 0 {
        return Err(GraphicsError::InvalidParameter(
            "Renderer2D needs room for at least one quad and one line".into(),
        ));
    }
    if config.max_texture_slots < 2 {
        return Err(GraphicsError::InvalidParameter(format!(
            "Renderer2D needs at least 2 texture slots, got {}",
            config.max_texture_slots
        )));
    }
    let device_slots = device.capabilities().max_texture_slots;
    if config.max_texture_slots > device_slots {
        return Err(GraphicsError::InvalidParameter(format!(
            "{} texture slots requested but the device has {}",
            config.max_texture_slots, device_slots
        )));
    }

    library.require(RENDERER2D_CIRCLE)?;
    library.require(RENDERER2D_LINE)?;
    let reflection = library.require(RENDERER2D_QUAD)?.reflection();
    let shader_slots = reflection
        .find_resource(TEXTURE_ARRAY)
        .map(|(_, resource)| resource.count)
        .ok_or_else(|| {
            GraphicsError::Shader(format!(
                "'{RENDERER2D_QUAD}' does not declare '{TEXTURE_ARRAY}'"
            ))
        })?;
    if config.max_texture_slots > shader_slots {
        return Err(GraphicsError::InvalidParameter(format!(
            "{} texture slots requested but '{RENDERER2D_QUAD}' declares {}",
            config.max_texture_slots, shader_slots
        )));
    }
    Ok(())
}

fn quad_transform(position: [f32; 3], size: [f32; 2], rotation: f32) -> Mat4 {
    mat4_from_scale_rotation_translation(
        Vec3::new(size[0], size[1], 1.0),
        quat_from_rotation_z(rotation),
        Vec3::from(position),
    )
}

fn transform_corner(transform: &Mat4, [x, y]: [f32; 2]) -> [f32; 3] {
    let p = transform * Vec4::new(x, y, 0.0, 1.0);
    [p.x, p.y, p.z]
}
