use serde::{Deserialize, Serialize};
use std::fmt;

pub mod protocol;

pub use protocol::{
    ClientMessage, Color, ColliderInfo, Envelope, PlatformInfo, ProtocolError, RayInfo,
    ServerMessage,
};

/// Pixels per physics meter. Every position on the wire is in pixels.
pub const PIXELS_PER_METER: f32 = 50.0;
/// World gravity in meters per second squared. Positive y points down.
pub const GRAVITY: Vector2 = Vector2 { x: 0.0, y: 10.0 };

/// Horizontal speed (m/s) set by a single left/right input.
pub const PLAYER_SPEED: f32 = 3.0;
/// Vertical velocity (m/s) set by a jump.
pub const JUMP_VELOCITY: f32 = -9.0;
pub const PLAYER_RADIUS: f32 = 20.0;
pub const PLAYER_FRICTION: f32 = 3.0;
pub const PLAYER_DENSITY: f32 = 1.0;
pub const SPAWN_POSITION: Vector2 = Vector2 { x: 100.0, y: 450.0 };

pub const PLATFORM_FRICTION: f32 = 3.0;
pub const WALL_FRICTION: f32 = 0.0;

/// Horizontal distance (px) of the ground rays from the body center.
pub const RAY_OFFSET_X: f32 = 12.0;
/// Vertical start (px) of the ground rays below the body center.
pub const RAY_BEGIN_Y: f32 = 5.0;
/// Vertical end (px) of the ground rays below the body center.
pub const RAY_END_Y: f32 = 25.0;

pub const TICK_INTERVAL_MS: u64 = 16;
pub const STEP_DT: f32 = 0.016;
pub const VELOCITY_ITERATIONS: usize = 3;
pub const POSITION_ITERATIONS: usize = 2;

pub const DEFAULT_PORT: u16 = 3000;

///Represents a vector in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector2 {
    ///Value along the x-axis.
    /// Positive direction is to the right.
    pub x: f32,
    ///Value along the y-axis.
    /// Positive direction is down, matching screen space.
    pub y: f32,
}

impl Vector2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns the difference of two vectors.
    pub fn sub(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// Opaque, stable identity of a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        ClientId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Direction flags carried by one `csInput` message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub down: bool,
}

impl InputState {
    pub fn is_idle(&self) -> bool {
        !(self.up || self.left || self.right || self.down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_vector_arithmetic() {
        let a = Vector2::new(1.5, -2.0);
        let b = Vector2::new(0.5, 4.0);

        let sum = a.add(&b);
        assert_approx_eq!(sum.x, 2.0);
        assert_approx_eq!(sum.y, 2.0);

        let diff = a.sub(&b);
        assert_approx_eq!(diff.x, 1.0);
        assert_approx_eq!(diff.y, -6.0);

        let scaled = a.scale(PIXELS_PER_METER);
        assert_approx_eq!(scaled.x, 75.0);
        assert_approx_eq!(scaled.y, -100.0);
    }

    #[test]
    fn test_client_id_serializes_as_plain_string() {
        let id = ClientId::new("abc123XYZ");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123XYZ\"");
        assert_eq!(id.to_string(), "abc123XYZ");
        assert_eq!(id.as_str(), "abc123XYZ");
    }

    #[test]
    fn test_input_state_missing_flags_default_to_false() {
        let input: InputState = serde_json::from_str(r#"{"left":true}"#).unwrap();
        assert!(input.left);
        assert!(!input.right);
        assert!(!input.up);
        assert!(!input.down);
        assert!(!input.is_idle());
        assert!(InputState::default().is_idle());
    }

    #[test]
    fn test_spawn_point_is_in_pixels() {
        let spawn_m = SPAWN_POSITION.scale(1.0 / PIXELS_PER_METER);
        assert_approx_eq!(spawn_m.x, 2.0);
        assert_approx_eq!(spawn_m.y, 9.0);
    }
}
