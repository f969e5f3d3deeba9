//! Mathematical types shared between the simulation, render and sync crates.
//!
//! These are the canonical representations used in the wire protocol and
//! the render transform pipeline. Matrices are column-major, matching the
//! convention of the camera feed.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 3D Vector - position, velocity, direction
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit-length copy of this vector.
    ///
    /// Returns `None` for vectors too short to normalize safely.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len <= f32::EPSILON {
            return None;
        }
        Some(self * (1.0 / len))
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// 2D Vector - star layout positions on the editor canvas
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

/// 4D Vector - homogeneous coordinates and matrix columns
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec4 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Vec4 {
    /// Creates a new Vec4
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// The xyz part of this vector.
    #[must_use]
    pub const fn truncate(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// RGBA color with float channels in 0..=1
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel
    pub a: f32,
}

impl Color {
    /// Creates a new color
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// 4x4 matrix, column-major.
///
/// `cols[c][r]` is the element in column `c`, row `r`, so the translation
/// of a rigid transform lives in `cols[3]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Mat4 {
    /// The four columns.
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    /// Identity matrix
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a matrix from columns
    #[must_use]
    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Translation-only transform
    #[must_use]
    pub const fn from_translation(t: Vec3) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [t.x, t.y, t.z, 1.0],
            ],
        }
    }

    /// Rotation about the Y axis by `angle` radians
    #[must_use]
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Rotation about the X axis by `angle` radians
    #[must_use]
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// The translation column as a vector.
    #[must_use]
    pub const fn translation(&self) -> Vec3 {
        Vec3::new(self.cols[3][0], self.cols[3][1], self.cols[3][2])
    }

    /// Copy of this matrix with the translation column zeroed.
    ///
    /// Used to strip the camera position out of a view matrix so only its
    /// rotation remains.
    #[must_use]
    pub const fn without_translation(&self) -> Self {
        let mut cols = self.cols;
        cols[3] = [0.0, 0.0, 0.0, 1.0];
        Self { cols }
    }

    /// Transposed copy.
    ///
    /// For a matrix whose upper 3x3 is orthonormal and whose translation is
    /// zero (a pure rotation), the transpose is the inverse.
    #[must_use]
    pub fn transposed(&self) -> Self {
        let m = &self.cols;
        Self {
            cols: [
                [m[0][0], m[1][0], m[2][0], m[3][0]],
                [m[0][1], m[1][1], m[2][1], m[3][1]],
                [m[0][2], m[1][2], m[2][2], m[3][2]],
                [m[0][3], m[1][3], m[2][3], m[3][3]],
            ],
        }
    }

    /// Transforms a point (w = 1).
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.transform(Vec4::new(p.x, p.y, p.z, 1.0)).truncate()
    }

    /// Transforms a direction (w = 0, translation ignored).
    #[must_use]
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        self.transform(Vec4::new(d.x, d.y, d.z, 0.0)).truncate()
    }

    /// Full homogeneous transform of a Vec4.
    #[must_use]
    pub fn transform(&self, v: Vec4) -> Vec4 {
        let m = &self.cols;
        Vec4::new(
            m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z + m[3][0] * v.w,
            m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z + m[3][1] * v.w,
            m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z + m[3][2] * v.w,
            m[0][3] * v.x + m[1][3] * v.y + m[2][3] * v.z + m[3][3] * v.w,
        )
    }

    /// World position of the camera described by this view matrix.
    #[must_use]
    pub fn camera_position(&self) -> Vec3 {
        // view = [R | t] with world->camera rotation R; eye = -R^T t.
        let t = self.translation();
        let m = &self.cols;
        -Vec3::new(
            m[0][0] * t.x + m[0][1] * t.y + m[0][2] * t.z,
            m[1][0] * t.x + m[1][1] * t.y + m[1][2] * t.z,
            m[2][0] * t.x + m[2][1] * t.y + m[2][2] * t.z,
        )
    }

    /// World-space forward direction of the camera described by this view
    /// matrix (the direction the camera looks along).
    #[must_use]
    pub fn camera_forward(&self) -> Vec3 {
        // Camera space looks down -Z; the camera z basis is the third row.
        let m = &self.cols;
        -Vec3::new(m[0][2], m[1][2], m[2][2])
    }

    /// Right-handed look-at view matrix.
    ///
    /// Falls back to the identity basis when `eye` and `center` coincide.
    #[must_use]
    pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Self {
        let z = (eye - center).normalized().unwrap_or(Vec3::Z);
        let x = up.cross(z).normalized().unwrap_or(Vec3::X);
        let y = z.cross(x);
        let t = Vec3::new(-x.dot(eye), -y.dot(eye), -z.dot(eye));
        Self {
            cols: [
                [x.x, y.x, z.x, 0.0],
                [x.y, y.y, z.y, 0.0],
                [x.z, y.z, z.z, 0.0],
                [t.x, t.y, t.z, 1.0],
            ],
        }
    }

    /// Right-handed perspective projection.
    #[must_use]
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let y_scale = 1.0 / (fov_y * 0.5).tan();
        let x_scale = y_scale / aspect;
        let z_range = far - near;
        let z_scale = -(far + near) / z_range;
        let wz_scale = -2.0 * far * near / z_range;
        Self {
            cols: [
                [x_scale, 0.0, 0.0, 0.0],
                [0.0, y_scale, 0.0, 0.0],
                [0.0, 0.0, z_scale, -1.0],
                [0.0, 0.0, wz_scale, 0.0],
            ],
        }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut cols = [[0.0f32; 4]; 4];
        for (c, col) in cols.iter_mut().enumerate() {
            for (r, cell) in col.iter_mut().enumerate() {
                *cell = self.cols[0][r] * rhs.cols[c][0]
                    + self.cols[1][r] * rhs.cols[c][1]
                    + self.cols[2][r] * rhs.cols[c][2]
                    + self.cols[3][r] * rhs.cols[c][3];
            }
        }
        Self { cols }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
    }

    #[test]
    fn test_vec3_normalized() {
        let v = Vec3::new(0.0, 3.0, 4.0).normalized().unwrap();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!(Vec3::ZERO.normalized().is_none());
    }

    #[test]
    fn test_mat4_identity_mul() {
        let t = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Mat4::IDENTITY * t, t);
        assert_eq!(t * Mat4::IDENTITY, t);
    }

    #[test]
    fn test_mat4_translation_composes() {
        let a = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let b = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        let p = (a * b).transform_point(Vec3::ZERO);
        assert_vec3_eq(p, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_rotation_transpose_is_inverse() {
        let r = Mat4::from_rotation_y(0.7) * Mat4::from_rotation_x(-1.2);
        let product = r * r.transposed();
        for c in 0..4 {
            for row in 0..4 {
                let expect = if c == row { 1.0 } else { 0.0 };
                assert!((product.cols[c][row] - expect).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_look_at_camera_position_roundtrip() {
        let eye = Vec3::new(3.0, 1.5, -2.0);
        let view = Mat4::look_at(eye, Vec3::ZERO, Vec3::Y);
        assert_vec3_eq(view.camera_position(), eye);

        // The eye maps to the camera-space origin.
        assert_vec3_eq(view.transform_point(eye), Vec3::ZERO);
    }

    #[test]
    fn test_look_at_forward_points_at_target() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let view = Mat4::look_at(eye, Vec3::ZERO, Vec3::Y);
        assert_vec3_eq(view.camera_forward(), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_vec3_bytemuck() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 12);
    }
}
