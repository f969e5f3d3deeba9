//! The unit particle quad.

use bytemuck::{Pod, Zeroable};

use skyshell_shared::Color;

/// One vertex of a particle quad.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    /// Position in model space, homogeneous.
    pub position: [f32; 4],
    /// Vertex tint.
    pub color: [f32; 4],
    /// Coordinates in -0.5..=0.5 across the quad, for the radial falloff.
    pub tex_coord: [f32; 2],
}

impl ParticleVertex {
    /// Vertex attributes: position, color, tex_coord.
    pub const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x4,
        1 => Float32x4,
        2 => Float32x2,
    ];

    /// Buffer layout for the render pipeline.
    #[must_use]
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Builds the two-triangle quad for one particle, sized and tinted.
///
/// Six vertices, counter-clockwise triangles, centered on the model-space
/// origin so the billboard rotation spins it in place.
#[must_use]
pub fn particle_quad(size: f32, color: Color) -> [ParticleVertex; 6] {
    let half = size / 2.0;
    let tint = color.to_array();
    let v = |x: f32, y: f32, u: f32, w: f32| ParticleVertex {
        position: [x, y, 0.0, 1.0],
        color: tint,
        tex_coord: [u, w],
    };
    let v0 = v(-half, -half, -0.5, -0.5);
    let v1 = v(half, -half, 0.5, -0.5);
    let v2 = v(-half, half, -0.5, 0.5);
    let v3 = v(half, half, 0.5, 0.5);
    [v0, v1, v2, v1, v3, v2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_gpu_aligned() {
        // 4 + 4 + 2 floats = 40 bytes, tightly packed.
        assert_eq!(std::mem::size_of::<ParticleVertex>(), 40);
    }

    #[test]
    fn test_quad_spans_size() {
        let quad = particle_quad(0.2, Color::WHITE);
        for vertex in &quad {
            assert!((vertex.position[0].abs() - 0.1).abs() < 1e-6);
            assert!((vertex.position[1].abs() - 0.1).abs() < 1e-6);
            assert_eq!(vertex.position[2], 0.0);
            assert_eq!(vertex.position[3], 1.0);
        }
    }

    #[test]
    fn test_quad_covers_both_triangles() {
        let quad = particle_quad(1.0, Color::WHITE);
        // Two triangles sharing the v1/v2 diagonal.
        assert_eq!(quad[1], quad[3]);
        assert_eq!(quad[2], quad[5]);
        assert_ne!(quad[0], quad[4]);
    }

    #[test]
    fn test_tex_coords_center_on_origin() {
        for vertex in &particle_quad(2.0, Color::WHITE) {
            assert!(vertex.tex_coord[0].abs() <= 0.5);
            assert!(vertex.tex_coord[1].abs() <= 0.5);
        }
    }
}
