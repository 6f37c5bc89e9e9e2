/// A vertex of a batched quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
    /// Texture slot, as a float for the vertex input.
    pub tex_index: f32,
    pub tiling_factor: f32,
    pub entity_id: i32,
}

/// A corner of a batched circle's bounding quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CircleVertex {
    pub world_position: [f32; 3],
    /// Corner in circle space, each component in `[-1, 1]`.
    pub local_position: [f32; 3],
    pub color: [f32; 4],
    /// Ring width as a fraction of the radius; 1.0 fills the disc.
    pub thickness: f32,
    pub fade: f32,
    pub entity_id: i32,
}

/// A line-list vertex: every pair forms one segment.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub entity_id: i32,
}

/// Uniform buffer data shared by the 2D shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    /// Column-major 4x4 view-projection matrix.
    pub view_projection: [[f32; 4]; 4],
}
