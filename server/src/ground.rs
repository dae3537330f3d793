//! Ground detection with two short downward rays per player.
//!
//! A platform hit sets that side's flag. A miss leaves it alone: only a jump
//! clears the flags, which tolerates one-tick gaps between contacts.

use crate::physics::{BodyHandle, FixtureKind, PhysicsWorld};
use shared::{RayInfo, Vector2, RAY_BEGIN_Y, RAY_END_Y, RAY_OFFSET_X};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grounded {
    pub left: bool,
    pub right: bool,
}

impl Grounded {
    /// A jump is allowed when either side touches a platform.
    pub fn any(&self) -> bool {
        self.left || self.right
    }

    pub fn clear(&mut self) {
        self.left = false;
        self.right = false;
    }
}

/// Ray endpoints for a body centered at `center`, in pixels.
pub fn ground_rays(center: Vector2) -> RayInfo {
    RayInfo {
        left_ray_begin_point: Vector2::new(center.x - RAY_OFFSET_X, center.y + RAY_BEGIN_Y),
        left_ray_end_point: Vector2::new(center.x - RAY_OFFSET_X, center.y + RAY_END_Y),
        right_ray_begin_point: Vector2::new(center.x + RAY_OFFSET_X, center.y + RAY_BEGIN_Y),
        right_ray_end_point: Vector2::new(center.x + RAY_OFFSET_X, center.y + RAY_END_Y),
    }
}

fn hits_platform(world: &PhysicsWorld, from: Vector2, to: Vector2) -> bool {
    let mut hit = false;
    world.ray_cast(from, to, |ray_hit| {
        if ray_hit.kind == FixtureKind::Platform {
            hit = true;
        }
    });
    hit
}

/// Casts both rays for `body` and sets the flags of the sides that hit a platform.
pub fn update_grounded(world: &PhysicsWorld, body: BodyHandle, grounded: &mut Grounded) {
    let Some(center) = world.position(body) else {
        return;
    };
    let rays = ground_rays(center);

    if hits_platform(world, rays.left_ray_begin_point, rays.left_ray_end_point) {
        grounded.left = true;
    }
    if hits_platform(world, rays.right_ray_begin_point, rays.right_ray_end_point) {
        grounded.right = true;
    }
}
