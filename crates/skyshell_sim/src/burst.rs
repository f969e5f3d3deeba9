//! The one-time conversion of a riser into its star set.

use rand::Rng;

use skyshell_shared::constants::{
    CANVAS_TO_UNIT, EXPLOSION_SPEED, STAR_LIFETIME, STAR_SIZE_SCALE, STAR_Z_JITTER,
};
use skyshell_shared::{ShellDefinition, Vec3};

use crate::particle::{Particle, ParticleKind};

/// Explodes a shell at `position` into its star particles.
///
/// Pure apart from the caller-supplied jitter source. For each star layout:
/// the 2D canvas position is normalized against [`CANVAS_TO_UNIT`], a small
/// uniform random z offset adds visual depth, the 3D direction is
/// renormalized and scaled by [`EXPLOSION_SPEED`]. Color and size carry
/// over from the layout (size converted to metres). The output length
/// equals `shell.stars.len()` exactly, and every star leaves at exactly
/// burst speed.
#[must_use]
pub fn explode<R: Rng>(position: Vec3, shell: &ShellDefinition, rng: &mut R) -> Vec<Particle> {
    shell
        .stars
        .iter()
        .map(|star| {
            let z = rng.gen_range(-STAR_Z_JITTER..=STAR_Z_JITTER);
            let raw = Vec3::new(
                star.position.x / CANVAS_TO_UNIT,
                star.position.y / CANVAS_TO_UNIT,
                z,
            );
            // A star at the canvas center with near-zero jitter has no
            // usable direction; send it straight out of the plane so the
            // burst-speed invariant still holds.
            let direction = raw.normalized().unwrap_or(Vec3::Z);
            Particle {
                position,
                velocity: direction * EXPLOSION_SPEED,
                color: star.color,
                size: star.size * STAR_SIZE_SCALE,
                remaining_lifetime: STAR_LIFETIME,
                kind: ParticleKind::Star,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use skyshell_shared::{Color, StarLayout, StarShape, Vec2};

    fn shell_with_stars(positions: &[(f32, f32)]) -> ShellDefinition {
        ShellDefinition {
            name: "test".to_string(),
            stars: positions
                .iter()
                .map(|&(x, y)| StarLayout {
                    position: Vec2::new(x, y),
                    color: Color::new(0.8, 0.3, 0.1, 1.0),
                    shape: StarShape::Circle,
                    size: 5.0,
                })
                .collect(),
            shell_radius: 80.0,
        }
    }

    #[test]
    fn test_star_count_matches_layout() {
        let shell = shell_with_stars(&[(10.0, 0.0), (0.0, 10.0), (-10.0, -10.0)]);
        let mut rng = StdRng::seed_from_u64(7);
        let stars = explode(Vec3::new(0.0, 20.0, 0.0), &shell, &mut rng);
        assert_eq!(stars.len(), shell.star_count());
    }

    #[test]
    fn test_burst_speed_and_lifetime() {
        let shell = shell_with_stars(&[(80.0, 0.0), (0.0, -60.0), (30.0, 30.0)]);
        let mut rng = StdRng::seed_from_u64(42);
        for star in explode(Vec3::ZERO, &shell, &mut rng) {
            assert!((star.velocity.length() - EXPLOSION_SPEED).abs() < 1e-4);
            assert!((star.remaining_lifetime - STAR_LIFETIME).abs() < f32::EPSILON);
            assert!(star.is_star());
        }
    }

    #[test]
    fn test_center_star_still_leaves_at_burst_speed() {
        let shell = shell_with_stars(&[(0.0, 0.0)]);
        let mut rng = StdRng::seed_from_u64(0);
        let stars = explode(Vec3::ZERO, &shell, &mut rng);
        assert!((stars[0].velocity.length() - EXPLOSION_SPEED).abs() < 1e-4);
    }

    #[test]
    fn test_direction_follows_layout() {
        // A star far out on +x should leave mostly along +x.
        let shell = shell_with_stars(&[(100.0, 0.0)]);
        let mut rng = StdRng::seed_from_u64(3);
        let stars = explode(Vec3::ZERO, &shell, &mut rng);
        let v = stars[0].velocity;
        assert!(v.x > 0.9 * EXPLOSION_SPEED);
        assert!(v.z.abs() <= STAR_Z_JITTER * EXPLOSION_SPEED);
    }

    #[test]
    fn test_size_converted_to_metres() {
        let shell = shell_with_stars(&[(10.0, 10.0)]);
        let mut rng = StdRng::seed_from_u64(1);
        let stars = explode(Vec3::ZERO, &shell, &mut rng);
        assert!((stars[0].size - 5.0 * STAR_SIZE_SCALE).abs() < f32::EPSILON);
    }
}
