/// Post-processing applied while importing a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Generate smooth normals for primitives that have none. When disabled,
    /// a primitive without normals is a fatal content error.
    pub generate_normals: bool,
    /// Generate tangents and binormals from texture coordinates when the file
    /// has none. When disabled, missing tangents are left zero.
    pub generate_tangents: bool,
    /// Rescale each animated vertex's bone weights to sum to one.
    /// Weights are kept as authored by default.
    pub normalize_bone_weights: bool,
    /// Scene to import. `None` picks the file's default scene, or the first.
    pub scene: Option<usize>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            generate_normals: true,
            generate_tangents: true,
            normalize_bone_weights: false,
            scene: None,
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_generate_normals(mut self, enabled: bool) -> Self {
        self.generate_normals = enabled;
        self
    }

    #[must_use]
    pub fn with_generate_tangents(mut self, enabled: bool) -> Self {
        self.generate_tangents = enabled;
        self
    }

    #[must_use]
    pub fn with_normalize_bone_weights(mut self, enabled: bool) -> Self {
        self.normalize_bone_weights = enabled;
        self
    }

    #[must_use]
    pub fn with_scene(mut self, scene: usize) -> Self {
        self.scene = Some(scene);
        self
    }
}
