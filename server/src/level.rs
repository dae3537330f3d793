//! Fixed level geometry, registered once before the server accepts connections.

use crate::physics::{FixtureKind, PhysicsWorld};
use shared::{PlatformInfo, Vector2, PLATFORM_FRICTION, WALL_FRICTION};

/// A platform as laid out in pixel space. `w`/`h` are the unscaled sprite size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Platform {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub scale: f32,
}

impl Platform {
    pub fn half_extents(&self) -> Vector2 {
        Vector2::new(self.w * self.scale / 2.0, self.h * self.scale / 2.0)
    }

    pub fn info(&self) -> PlatformInfo {
        PlatformInfo {
            x: self.x,
            y: self.y,
            scale: self.scale,
        }
    }
}

/// A boundary wall. The offset pushes the box outside the visible area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

impl Wall {
    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x + self.x_offset, self.y + self.y_offset)
    }

    pub fn half_extents(&self) -> Vector2 {
        Vector2::new(self.w / 2.0, self.h / 2.0)
    }
}

pub const PLATFORMS: [Platform; 4] = [
    Platform { x: 400.0, y: 568.0, w: 400.0, h: 32.0, scale: 2.0 },
    Platform { x: 600.0, y: 400.0, w: 400.0, h: 32.0, scale: 1.0 },
    Platform { x: 50.0, y: 250.0, w: 400.0, h: 32.0, scale: 1.0 },
    Platform { x: 750.0, y: 220.0, w: 400.0, h: 32.0, scale: 1.0 },
];

pub const WALLS: [Wall; 3] = [
    Wall { x: 0.0, y: 300.0, w: 10.0, h: 600.0, x_offset: -5.0, y_offset: 0.0 },
    Wall { x: 800.0, y: 300.0, w: 10.0, h: 600.0, x_offset: 5.0, y_offset: 0.0 },
    Wall { x: 400.0, y: 0.0, w: 800.0, h: 10.0, x_offset: 0.0, y_offset: -5.0 },
];

/// Registers every platform and wall with the world.
pub fn build(world: &mut PhysicsWorld) {
    for platform in &PLATFORMS {
        world.add_static_box(
            Vector2::new(platform.x, platform.y),
            platform.half_extents(),
            PLATFORM_FRICTION,
            FixtureKind::Platform,
        );
    }
    for wall in &WALLS {
        world.add_static_box(
            wall.center(),
            wall.half_extents(),
            WALL_FRICTION,
            FixtureKind::Wall,
        );
    }
}

/// Platform layout as sent in `scPlatformInfo`.
pub fn platform_info() -> Vec<PlatformInfo> {
    PLATFORMS.iter().map(Platform::info).collect()
}
