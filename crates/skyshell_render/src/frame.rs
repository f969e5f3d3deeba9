//! CPU-side frame preparation.
//!
//! The transform math lives here so it is testable without a GPU device;
//! [`crate::pipeline::ParticleRenderer`] only uploads and draws what this
//! module produced.

use skyshell_shared::{Color, Mat4};
use skyshell_sim::Particle;

use crate::billboard::mvp_matrix;
use crate::camera::CameraMatrices;

/// Everything needed to draw one particle.
#[derive(Clone, Copy, Debug)]
pub struct DrawCommand {
    /// Per-draw uniform: projection x view x translation x billboard.
    pub mvp: Mat4,
    /// Quad tint.
    pub color: Color,
    /// Quad edge length, metres.
    pub size: f32,
}

/// Per-frame statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Draw calls this frame (one per particle).
    pub draw_calls: u32,
    /// Live risers drawn.
    pub risers: u32,
    /// Live stars drawn.
    pub stars: u32,
}

/// One prepared frame.
#[derive(Clone, Debug, Default)]
pub struct RenderFrame {
    /// Draw list, one command per live particle.
    pub draws: Vec<DrawCommand>,
    /// Whether another redraw should be chained after this one.
    ///
    /// True while particles remain; false lets rendering go idle so an
    /// empty scene costs no GPU or CPU time.
    pub redraw_needed: bool,
    /// Statistics for this frame.
    pub stats: FrameStats,
}

impl RenderFrame {
    /// An empty, idle frame.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Projects the live particle set through the camera into a draw list.
#[must_use]
pub fn build_frame(particles: &[Particle], camera: &CameraMatrices) -> RenderFrame {
    let mut stats = FrameStats::default();
    let draws: Vec<DrawCommand> = particles
        .iter()
        .map(|particle| {
            if particle.is_riser() {
                stats.risers += 1;
            } else {
                stats.stars += 1;
            }
            DrawCommand {
                mvp: mvp_matrix(particle.position, &camera.view, &camera.projection),
                color: particle.color,
                size: particle.size,
            }
        })
        .collect();
    stats.draw_calls = draws.len() as u32;

    RenderFrame {
        redraw_needed: !draws.is_empty(),
        draws,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyshell_shared::{Vec3, Vec4};
    use skyshell_sim::ParticleKind;

    fn star_at(position: Vec3) -> Particle {
        Particle {
            position,
            velocity: Vec3::ZERO,
            color: Color::new(1.0, 0.5, 0.2, 1.0),
            size: 0.04,
            remaining_lifetime: 1.0,
            kind: ParticleKind::Star,
        }
    }

    fn camera() -> CameraMatrices {
        CameraMatrices {
            view: Mat4::look_at(Vec3::new(0.0, 1.6, 6.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective(1.2, 1.77, 0.1, 100.0),
        }
    }

    #[test]
    fn test_one_draw_per_particle() {
        let particles = vec![star_at(Vec3::ZERO), star_at(Vec3::Y), star_at(Vec3::X)];
        let frame = build_frame(&particles, &camera());
        assert_eq!(frame.draws.len(), 3);
        assert_eq!(frame.stats.draw_calls, 3);
        assert_eq!(frame.stats.stars, 3);
        assert!(frame.redraw_needed);
    }

    #[test]
    fn test_empty_scene_goes_idle() {
        let frame = build_frame(&[], &camera());
        assert!(frame.draws.is_empty());
        assert!(!frame.redraw_needed);
    }

    #[test]
    fn test_mvp_projects_particle_into_clip_space() {
        let cam = camera();
        let frame = build_frame(&[star_at(Vec3::new(0.0, 1.6, 0.0))], &cam);

        // The particle sits straight ahead of the camera: the quad center
        // must land on the clip-space axis with positive w.
        let clip = frame.draws[0].mvp.transform(Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert!(clip.x.abs() < 1e-4);
        assert!(clip.y.abs() < 1e-4);
        assert!(clip.w > 0.0);
    }

    #[test]
    fn test_draw_carries_particle_attributes() {
        let frame = build_frame(&[star_at(Vec3::ZERO)], &camera());
        assert_eq!(frame.draws[0].color, Color::new(1.0, 0.5, 0.2, 1.0));
        assert!((frame.draws[0].size - 0.04).abs() < f32::EPSILON);
    }
}
