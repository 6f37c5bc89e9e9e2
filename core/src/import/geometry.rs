//! Topology conversion and generation of missing vertex attributes.

use crate::math::Vec3;
use crate::mesh::Aabb;

/// Convert a primitive's index list to a triangle list.
///
/// Returns `None` for point and line topologies, which carry no faces.
pub(super) fn triangulate(mode: gltf_dep::mesh::Mode, indices: Vec<u32>) -> Option<Vec<u32>> {
    use gltf_dep::mesh::Mode;

    match mode {
        Mode::Triangles => Some(indices),
        Mode::TriangleStrip => {
            let mut out = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
            for (i, w) in indices.windows(3).enumerate() {
                // Every other strip triangle is flipped to keep the winding.
                if i % 2 == 0 {
                    out.extend_from_slice(&[w[0], w[1], w[2]]);
                } else {
                    out.extend_from_slice(&[w[1], w[0], w[2]]);
                }
            }
            Some(out)
        }
        Mode::TriangleFan => {
            let mut out = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
            if let Some((&center, rest)) = indices.split_first() {
                for pair in rest.windows(2) {
                    out.extend_from_slice(&[center, pair[0], pair[1]]);
                }
            }
            Some(out)
        }
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip => None,
    }
}

/// Smooth per-vertex normals from area-weighted face normals.
pub(super) fn generate_normals(positions: &[[f32; 3]], triangles: &[u32]) -> Vec<[f32; 3]> {
    let mut accum = vec![Vec3::zeros(); positions.len()];
    for tri in triangles.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from(positions[a]);
        let pb = Vec3::from(positions[b]);
        let pc = Vec3::from(positions[c]);
        let face = (pb - pa).cross(&(pc - pa));
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }
    accum
        .into_iter()
        .map(|n| {
            let n = n.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::z);
            [n.x, n.y, n.z]
        })
        .collect()
}

/// Per-vertex tangents (xyz + handedness in w) from texture coordinates.
pub(super) fn generate_tangents(
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    triangles: &[u32],
) -> Vec<[f32; 4]> {
    let mut tan = vec![Vec3::zeros(); positions.len()];
    let mut bitan = vec![Vec3::zeros(); positions.len()];

    for tri in triangles.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let e1 = Vec3::from(positions[b]) - Vec3::from(positions[a]);
        let e2 = Vec3::from(positions[c]) - Vec3::from(positions[a]);
        let (du1, dv1) = (
            tex_coords[b][0] - tex_coords[a][0],
            tex_coords[b][1] - tex_coords[a][1],
        );
        let (du2, dv2) = (
            tex_coords[c][0] - tex_coords[a][0],
            tex_coords[c][1] - tex_coords[a][1],
        );
        let det = du1 * dv2 - du2 * dv1;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let t = (e1 * dv2 - e2 * dv1) * r;
        let bt = (e2 * du1 - e1 * du2) * r;
        for i in [a, b, c] {
            tan[i] += t;
            bitan[i] += bt;
        }
    }

    normals
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let n = Vec3::from(*n);
            // Gram-Schmidt against the normal.
            let t = (tan[i] - n * n.dot(&tan[i]))
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(|| any_orthogonal(&n));
            let w = if n.cross(&t).dot(&bitan[i]) < 0.0 {
                -1.0
            } else {
                1.0
            };
            [t.x, t.y, t.z, w]
        })
        .collect()
}

fn any_orthogonal(n: &Vec3) -> Vec3 {
    let axis = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    n.cross(&axis).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::x)
}

/// Planar texture coordinates projected onto the two largest extents of
/// the primitive's bounding box.
pub(super) fn generate_planar_uvs(positions: &[[f32; 3]]) -> Vec<[f32; 2]> {
    let bounds = Aabb::from_points(positions.iter().map(|p| Vec3::from(*p)));
    if bounds.is_empty() {
        return vec![[0.0, 0.0]; positions.len()];
    }
    let extent = bounds.max - bounds.min;
    let mut axes = [0usize, 1, 2];
    axes.sort_by(|&a, &b| extent[b].total_cmp(&extent[a]));
    let (u, v) = (axes[0], axes[1]);

    positions
        .iter()
        .map(|p| {
            let s = if extent[u] > 0.0 {
                (p[u] - bounds.min[u]) / extent[u]
            } else {
                0.0
            };
            let t = if extent[v] > 0.0 {
                (p[v] - bounds.min[v]) / extent[v]
            } else {
                0.0
            };
            [s, t]
        })
        .collect()
}

/// Binormal from a normal and a tangent with handedness.
pub(super) fn binormal(normal: [f32; 3], tangent: [f32; 4]) -> [f32; 3] {
    let n = Vec3::from(normal);
    let t = Vec3::new(tangent[0], tangent[1], tangent[2]);
    let b = n.cross(&t) * tangent[3];
    [b.x, b.y, b.z]
}
