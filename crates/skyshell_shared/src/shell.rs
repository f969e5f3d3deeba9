//! The firework shell data model.
//!
//! A shell is a named, reusable layout of stars designed on a 2D canvas.
//! Shells are created by the editor, persisted as JSON, and read-only for
//! the core: the simulation and sync crates never mutate one.

use serde::{Deserialize, Serialize};

use crate::math::{Color, Vec2};

/// Shape a star is drawn with on the editor canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarShape {
    /// A filled circle. Currently the only shape.
    #[default]
    Circle,
}

/// One star in a shell layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarLayout {
    /// Position relative to the canvas center, in canvas points.
    pub position: Vec2,
    /// Star color, float channels in 0..=1.
    pub color: Color,
    /// Canvas shape of the star.
    pub shape: StarShape,
    /// Star diameter, in canvas points.
    pub size: f32,
}

/// A complete shell definition: the burst pattern of one firework.
///
/// Immutable once created. Owned by the shell library; the core only
/// reads it (usually through an `Arc`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShellDefinition {
    /// Display name chosen in the editor.
    pub name: String,
    /// Ordered star layout. Burst order follows this sequence.
    pub stars: Vec<StarLayout>,
    /// Shell radius on the canvas, in canvas points.
    #[serde(rename = "shellRadius")]
    pub shell_radius: f32,
}

impl ShellDefinition {
    /// Number of stars this shell bursts into.
    #[must_use]
    pub fn star_count(&self) -> usize {
        self.stars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shell() -> ShellDefinition {
        ShellDefinition {
            name: "peony".to_string(),
            stars: vec![StarLayout {
                position: Vec2::new(50.0, 0.0),
                color: Color::new(1.0, 0.2, 0.1, 1.0),
                shape: StarShape::Circle,
                size: 4.0,
            }],
            shell_radius: 60.0,
        }
    }

    #[test]
    fn test_persisted_field_names() {
        let json = serde_json::to_value(sample_shell()).unwrap();
        assert!(json.get("shellRadius").is_some());
        let star = &json["stars"][0];
        assert_eq!(star["position"]["x"], 50.0);
        assert_eq!(star["color"]["r"], 1.0);
        assert_eq!(star["shape"], "circle");
    }

    #[test]
    fn test_shell_roundtrip() {
        let shell = sample_shell();
        let json = serde_json::to_string(&shell).unwrap();
        let back: ShellDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shell);
    }
}
