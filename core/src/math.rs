//! Math type aliases and helper functions.
//!
//! All rendering math is `f32` and built on `nalgebra`. Matrices are
//! column-major and multiply column vectors, so `parent * local` applies
//! `local` first.

pub type Vec2 = nalgebra::Vector2<f32>;
pub type Vec3 = nalgebra::Vector3<f32>;
pub type Vec4 = nalgebra::Vector4<f32>;
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Quaternion (f32). Imported keyframes are `[x, y, z, w]`; see
/// [`quat_from_array`].
pub type Quat = nalgebra::Quaternion<f32>;

/// Compose `T * R * S`: scale first, then rotate, then translate.
///
/// `rotation` is normalized before use.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    let rotation = nalgebra::UnitQuaternion::new_normalize(rotation).to_homogeneous();
    Mat4::new_translation(&translation) * rotation * Mat4::new_nonuniform_scaling(&scale)
}

pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Quaternion from glTF component order `[x, y, z, w]`.
pub fn quat_from_array(a: [f32; 4]) -> Quat {
    Quat::new(a[3], a[0], a[1], a[2])
}

/// Inverse of [`quat_from_array`].
pub fn quat_to_array(q: Quat) -> [f32; 4] {
    [q.i, q.j, q.k, q.w]
}

pub fn quat_from_rotation_y(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&Vec3::y_axis(), angle).into_inner()
}

pub fn quat_from_rotation_z(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&Vec3::z_axis(), angle).into_inner()
}

pub fn quat_rotate_vec3(q: Quat, v: Vec3) -> Vec3 {
    nalgebra::UnitQuaternion::new_normalize(q) * v
}

/// Shortest-arc spherical interpolation, always returning a unit quaternion.
///
/// Nearly identical rotations, where slerp is unstable, use normalized
/// linear interpolation instead.
pub fn quat_slerp(a: Quat, b: Quat, t: f32) -> Quat {
    let from = nalgebra::UnitQuaternion::new_normalize(a);
    let to = nalgebra::UnitQuaternion::new_normalize(b);
    if let Some(q) = from.try_slerp(&to, t, 1.0e-6) {
        return q.into_inner();
    }
    let b = if a.coords.dot(&b.coords) < 0.0 { -b } else { b };
    a.lerp(&b, t).normalize()
}

pub fn vec3_lerp(a: &Vec3, b: &Vec3, t: f32) -> Vec3 {
    a.lerp(b, t)
}

/// Transform a point (w = 1).
pub fn transform_point(m: &Mat4, p: &Vec3) -> Vec3 {
    m.transform_point(&nalgebra::Point3::from(*p)).coords
}
