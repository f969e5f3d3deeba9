//! Wire protocol for peer-synchronized launches.
//!
//! One message per launch, broadcast reliably to every connected peer:
//!
//! ```json
//! {
//!   "shell": "<base64 of the shell's JSON form>",   // absent for default
//!   "position": [x, y, z],                          // group-relative, f32
//!   "timestamp": 1725100000.123                     // epoch seconds, f64
//! }
//! ```
//!
//! Both sides must agree on these definitions. A message that fails to
//! decode is dropped and logged by the receiver - no retry, no crash.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::events::LaunchEvent;
use crate::math::Vec3;
use crate::shell::ShellDefinition;

/// Service type peers advertise and browse under.
pub const SERVICE_TYPE: &str = "firework-sync";

/// Discovery metadata key carrying a hosted group's name.
pub const GROUP_NAME_KEY: &str = "groupName";

/// Errors raised while encoding or decoding a launch message.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Envelope or embedded shell was not valid JSON.
    #[error("malformed launch payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Embedded shell was not valid base64.
    #[error("invalid shell encoding: {0}")]
    ShellEncoding(#[from] base64::DecodeError),
}

/// The JSON envelope as it travels on the wire.
#[derive(Serialize, Deserialize)]
struct LaunchMessage {
    /// Base64 of the shell's encoded form; absent for the default firework.
    #[serde(skip_serializing_if = "Option::is_none")]
    shell: Option<String>,
    /// Group-relative launch origin.
    position: [f32; 3],
    /// Absolute fire instant, epoch seconds.
    timestamp: f64,
}

/// Serializes a launch event into its wire form.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] if the shell or envelope fails to
/// serialize; the caller aborts the send and logs.
pub fn encode_launch(event: &LaunchEvent) -> Result<Vec<u8>, ProtocolError> {
    let shell = match &event.shell {
        Some(shell) => Some(BASE64.encode(serde_json::to_vec(shell.as_ref())?)),
        None => None,
    };
    let message = LaunchMessage {
        shell,
        position: event.origin.to_array(),
        timestamp: event.scheduled_at,
    };
    Ok(serde_json::to_vec(&message)?)
}

/// Deserializes a wire payload back into a launch event.
///
/// # Errors
///
/// Returns a [`ProtocolError`] for malformed JSON or base64; the receiver
/// drops the message and logs.
pub fn decode_launch(payload: &[u8]) -> Result<LaunchEvent, ProtocolError> {
    let message: LaunchMessage = serde_json::from_slice(payload)?;
    let shell = match message.shell {
        Some(encoded) => {
            let raw = BASE64.decode(encoded)?;
            Some(Arc::new(serde_json::from_slice::<ShellDefinition>(&raw)?))
        }
        None => None,
    };
    Ok(LaunchEvent {
        shell,
        origin: Vec3::from_array(message.position),
        scheduled_at: message.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Color, Vec2};
    use crate::shell::{StarLayout, StarShape};

    fn sample_shell() -> Arc<ShellDefinition> {
        Arc::new(ShellDefinition {
            name: "chrysanthemum".to_string(),
            stars: vec![
                StarLayout {
                    position: Vec2::new(0.0, 80.0),
                    color: Color::new(0.9, 0.9, 0.2, 1.0),
                    shape: StarShape::Circle,
                    size: 5.0,
                },
                StarLayout {
                    position: Vec2::new(-40.0, -40.0),
                    color: Color::new(0.2, 0.4, 1.0, 1.0),
                    shape: StarShape::Circle,
                    size: 3.0,
                },
            ],
            shell_radius: 90.0,
        })
    }

    #[test]
    fn test_roundtrip_with_shell() {
        let event = LaunchEvent::new(
            Some(sample_shell()),
            Vec3::new(0.5, 1.0, -2.0),
            1_725_100_000.123,
        );
        let bytes = encode_launch(&event).unwrap();
        let back = decode_launch(&bytes).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_roundtrip_default_firework() {
        let event = LaunchEvent::new(None, Vec3::new(0.0, 1.0, 0.0), 42.0);
        let bytes = encode_launch(&event).unwrap();

        // The shell key must be absent, not null.
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json.get("shell").is_none());

        let back = decode_launch(&bytes).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_launch(b"not json at all").is_err());
        assert!(decode_launch(b"{}").is_err());
        assert!(decode_launch(br#"{"position":[0,1],"timestamp":1.0}"#).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_base64_shell() {
        let payload = br#"{"shell":"!!!not-base64!!!","position":[0,1,0],"timestamp":1.0}"#;
        assert!(matches!(
            decode_launch(payload),
            Err(ProtocolError::ShellEncoding(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_shell_json() {
        let truncated = BASE64.encode(b"{\"name\":\"x\"");
        let payload =
            format!(r#"{{"shell":"{truncated}","position":[0,1,0],"timestamp":1.0}}"#);
        assert!(matches!(
            decode_launch(payload.as_bytes()),
            Err(ProtocolError::Json(_))
        ));
    }
}
