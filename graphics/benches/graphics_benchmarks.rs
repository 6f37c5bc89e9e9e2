use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ember_core::math::Mat4;
use ember_core::mesh::{MeshSource, StaticVertex, Submesh, VertexData};
use ember_graphics::materials::ALBEDO_COLOR_UNIFORM;
use ember_graphics::{
    BufferDescriptor, BufferUsage, DummyBackend, GraphicsDevice, MaterialAsset, Mesh, MeshAsset,
    MeshRenderer, ShaderLibrary,
};

fn setup() -> (Arc<GraphicsDevice>, Arc<DummyBackend>, ShaderLibrary) {
    let backend = Arc::new(DummyBackend::new());
    let device = GraphicsDevice::new(backend.clone()).expect("device");
    let library = ShaderLibrary::with_standard_shaders().expect("standard shaders");
    (device, backend, library)
}

/// `parts` quads, one submesh each.
fn quad_grid(parts: u32) -> MeshSource {
    let quad = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]].map(|[x, y]| StaticVertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, 1.0],
        ..Default::default()
    });
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut submeshes = Vec::new();
    for part in 0..parts {
        vertices.extend(quad);
        indices.extend([[0, 1, 2], [2, 3, 0]]);
        submeshes
            .push(Submesh::new(part * 4, part * 6, 4, 6, 0).with_mesh_name(format!("part_{part}")));
    }
    MeshSource::from_parts(VertexData::Static(vertices), indices, submeshes)
}

// ---------------------------------------------------------------------------
// Shader reflection
// ---------------------------------------------------------------------------

fn bench_standard_shaders(c: &mut Criterion) {
    c.bench_function("shader_library_standard", |b| {
        b.iter(|| black_box(ShaderLibrary::with_standard_shaders().expect("standard shaders")));
    });
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

fn bench_material_set(c: &mut Criterion) {
    let (device, _, library) = setup();
    let asset = MaterialAsset::new(&device, library.pbr(false).expect("pbr"), "bench");
    let instances: Vec<_> = (0..16)
        .map(|i| asset.create_instance(format!("instance_{i}")))
        .collect();

    c.bench_function("material_set_16_instances", |b| {
        b.iter(|| {
            asset
                .handle()
                .set(ALBEDO_COLOR_UNIFORM, black_box([0.5f32, 0.25, 1.0]));
        });
    });
    black_box(instances);
}

fn bench_material_bind(c: &mut Criterion) {
    let (device, backend, library) = setup();
    let asset = MaterialAsset::new(&device, library.pbr(false).expect("pbr"), "bench");

    c.bench_function("material_bind", |b| {
        b.iter(|| {
            asset.bind().expect("bind");
            backend.clear();
        });
    });
}

// ---------------------------------------------------------------------------
// Mesh submission
// ---------------------------------------------------------------------------

fn bench_mesh_submit_flush(c: &mut Criterion) {
    let (device, backend, library) = setup();
    let asset = MeshAsset::new(&device, &library, quad_grid(64)).expect("asset");
    let mesh = Mesh::new(&asset);
    let mut renderer = MeshRenderer::new(&device).expect("renderer");

    c.bench_function("mesh_submit_flush_64_submeshes", |b| {
        b.iter(|| {
            renderer.begin_frame(&Mat4::identity()).expect("begin");
            renderer.submit(&mesh, &Mat4::identity());
            black_box(renderer.flush().expect("flush"));
            backend.clear();
        });
    });
}

fn bench_dummy_create_buffer(c: &mut Criterion) {
    let (device, backend, _) = setup();

    c.bench_function("dummy_create_buffer", |b| {
        b.iter(|| {
            let buffer = device
                .create_buffer(&BufferDescriptor::new(1024, BufferUsage::VERTEX))
                .expect("buffer");
            black_box(&buffer);
            drop(buffer);
            backend.clear();
        });
    });
}

criterion_group!(
    benches,
    bench_standard_shaders,
    bench_material_set,
    bench_material_bind,
    bench_mesh_submit_flush,
    bench_dummy_create_buffer,
);

criterion_main!(benches);
