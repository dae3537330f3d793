//! Adapter around the rigid-body engine.
//!
//! This is the only module that talks to `rapier2d` and the only place that
//! converts between pixel space (everything outside) and meters (everything
//! inside). Positions cross the boundary in pixels; velocities are exchanged
//! in meters per second, which is also what the wire carries.

use crate::debug_draw::{DebugDrawSink, ShapeCollector, ShapeRecord};
use rapier2d::prelude::*;
use shared::{Color, Vector2};
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// Fixed pixels-per-meter conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale(pub f32);

impl PixelScale {
    pub fn to_world(&self, px: Vector2) -> Vector<Real> {
        vector![px.x / self.0, px.y / self.0]
    }

    pub fn to_world_len(&self, px: f32) -> Real {
        px / self.0
    }

    pub fn to_pixels(&self, v: &Vector<Real>) -> Vector2 {
        Vector2::new(v.x * self.0, v.y * self.0)
    }

    pub fn to_pixels_point(&self, p: &Point<Real>) -> Vector2 {
        Vector2::new(p.x * self.0, p.y * self.0)
    }

    pub fn to_pixels_len(&self, m: Real) -> f32 {
        m * self.0
    }
}

/// Semantic classification of a fixture, used to interpret ray hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Player,
    Platform,
    Wall,
}

/// Stable identifier issued for every collider the adapter creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixtureId(u64);

/// Handle to a dynamic body owned by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

/// A collider crossed by a ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub fixture: FixtureId,
    pub kind: FixtureKind,
}

pub struct PhysicsWorld {
    scale: PixelScale,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    fixtures: HashMap<FixtureId, FixtureKind>,
    next_fixture_id: u64,
}

impl PhysicsWorld {
    /// Creates an empty world. `gravity` is in meters per second squared.
    pub fn new(gravity: Vector2, scale: PixelScale) -> Self {
        Self {
            scale,
            gravity: vector![gravity.x, gravity.y],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            fixtures: HashMap::new(),
            next_fixture_id: 1,
        }
    }

    pub fn scale(&self) -> PixelScale {
        self.scale
    }

    fn tag_fixture(&mut self, kind: FixtureKind) -> FixtureId {
        let id = FixtureId(self.next_fixture_id);
        self.next_fixture_id += 1;
        self.fixtures.insert(id, kind);
        id
    }

    /// Registers a fixed box. Center and half extents are in pixels.
    pub fn add_static_box(
        &mut self,
        center: Vector2,
        half_extents: Vector2,
        friction: f32,
        kind: FixtureKind,
    ) -> FixtureId {
        let fixture = self.tag_fixture(kind);
        let body = RigidBodyBuilder::fixed()
            .translation(self.scale.to_world(center))
            .build();
        let body_handle = self.bodies.insert(body);

        let half = self.scale.to_world(half_extents);
        let collider = ColliderBuilder::cuboid(half.x, half.y)
            .friction(friction)
            .user_data(fixture.0 as u128)
            .build();
        self.colliders
            .insert_with_parent(collider, body_handle, &mut self.bodies);
        fixture
    }

    /// Creates a rotation-locked dynamic circle. Center and radius are in pixels.
    pub fn add_dynamic_circle_body(
        &mut self,
        center: Vector2,
        radius: f32,
        friction: f32,
        density: f32,
    ) -> BodyHandle {
        let fixture = self.tag_fixture(FixtureKind::Player);
        let body = RigidBodyBuilder::dynamic()
            .translation(self.scale.to_world(center))
            .locked_axes(LockedAxes::ROTATION_LOCKED)
            .build();
        let body_handle = self.bodies.insert(body);

        let collider = ColliderBuilder::ball(self.scale.to_world_len(radius))
            .friction(friction)
            .density(density)
            .user_data(fixture.0 as u128)
            .build();
        self.colliders
            .insert_with_parent(collider, body_handle, &mut self.bodies);
        BodyHandle(body_handle)
    }

    /// Removes a body together with its colliders and their tags.
    /// Returns false if the handle was already gone.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> bool {
        let Some(body) = self.bodies.get(handle.0) else {
            return false;
        };
        let tags: Vec<FixtureId> = body
            .colliders()
            .iter()
            .filter_map(|collider| self.colliders.get(*collider))
            .map(|collider| FixtureId(collider.user_data as u64))
            .collect();

        self.bodies.remove(
            handle.0,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        for tag in tags {
            self.fixtures.remove(&tag);
        }
        true
    }

    pub fn step(&mut self, dt: f32, velocity_iterations: usize, position_iterations: usize) {
        self.integration_parameters.dt = dt;
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(velocity_iterations.max(1)).unwrap_or(NonZeroUsize::MIN);
        self.integration_parameters.num_internal_stabilization_iterations = position_iterations;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Body center in pixels.
    pub fn position(&self, handle: BodyHandle) -> Option<Vector2> {
        self.bodies
            .get(handle.0)
            .map(|body| self.scale.to_pixels(body.translation()))
    }

    /// Body velocity in meters per second.
    pub fn velocity(&self, handle: BodyHandle) -> Option<Vector2> {
        self.bodies.get(handle.0).map(|body| {
            let v = body.linvel();
            Vector2::new(v.x, v.y)
        })
    }

    /// Sets the body velocity in meters per second and wakes it.
    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vector2) -> bool {
        match self.bodies.get_mut(handle.0) {
            Some(body) => {
                body.set_linvel(vector![velocity.x, velocity.y], true);
                true
            }
            None => false,
        }
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of dynamic (player) bodies currently simulated.
    pub fn dynamic_body_count(&self) -> usize {
        self.bodies.iter().filter(|(_, b)| b.is_dynamic()).count()
    }

    /// Classification of a fixture.
    ///
    /// # Panics
    /// Every collider is tagged at creation, so a missing entry means the
    /// side table went out of sync with the collider set.
    pub fn fixture_kind(&self, fixture: FixtureId) -> FixtureKind {
        match self.fixtures.get(&fixture) {
            Some(kind) => *kind,
            None => panic!("fixture {:?} has no classification tag", fixture),
        }
    }

    /// Casts the segment `from -> to` (pixels) and reports every collider it crosses.
    ///
    /// Colliders containing `from` are reported as well; callers filter by kind.
    pub fn ray_cast(&self, from: Vector2, to: Vector2, mut on_hit: impl FnMut(RayHit)) {
        let origin = self.scale.to_world(from);
        let dir = self.scale.to_world(to) - origin;
        let ray = Ray::new(point![origin.x, origin.y], dir);

        self.query_pipeline.intersections_with_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            1.0,
            true,
            QueryFilter::default(),
            |handle, _| {
                if let Some(collider) = self.colliders.get(handle) {
                    let fixture = FixtureId(collider.user_data as u64);
                    on_hit(RayHit {
                        fixture,
                        kind: self.fixture_kind(fixture),
                    });
                }
                true
            },
        );
    }

    /// Walks every collider and emits its geometry in pixels.
    pub fn draw_debug(&self, sink: &mut impl DebugDrawSink) {
        for (_, collider) in self.colliders.iter() {
            let color = self.debug_color(collider);
            let iso = collider.position();
            let shape = collider.shape();

            if let Some(cuboid) = shape.as_cuboid() {
                let h = cuboid.half_extents;
                let vertices = [
                    point![-h.x, -h.y],
                    point![h.x, -h.y],
                    point![h.x, h.y],
                    point![-h.x, h.y],
                ]
                .map(|corner| self.scale.to_pixels_point(&(iso * corner)));
                sink.solid_polygon(&vertices, color);
            } else if let Some(ball) = shape.as_ball() {
                let center = self.scale.to_pixels(&iso.translation.vector);
                sink.solid_circle(center, self.scale.to_pixels_len(ball.radius), color);
            }
        }
    }

    /// Runs a debug pass and returns the captured shapes.
    pub fn collect_debug_geometry(&self) -> Vec<ShapeRecord> {
        let mut collector = ShapeCollector::default();
        self.draw_debug(&mut collector);
        collector.into_shapes()
    }

    fn debug_color(&self, collider: &Collider) -> Color {
        let body = collider.parent().and_then(|parent| self.bodies.get(parent));
        match body {
            Some(body) if !body.is_enabled() => Color { r: 0.5, g: 0.5, b: 0.3 },
            Some(body) if body.is_fixed() => Color { r: 0.5, g: 0.9, b: 0.5 },
            Some(body) if body.is_kinematic() => Color { r: 0.5, g: 0.5, b: 0.9 },
            Some(body) if body.is_sleeping() => Color { r: 0.6, g: 0.6, b: 0.6 },
            Some(_) => Color { r: 0.9, g: 0.7, b: 0.7 },
            None => Color { r: 0.5, g: 0.9, b: 0.5 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{GRAVITY, PIXELS_PER_METER, POSITION_ITERATIONS, STEP_DT, VELOCITY_ITERATIONS};

    fn empty_world() -> PhysicsWorld {
        PhysicsWorld::new(GRAVITY, PixelScale(PIXELS_PER_METER))
    }

    fn step(world: &mut PhysicsWorld, ticks: usize) {
        for _ in 0..ticks {
            world.step(STEP_DT, VELOCITY_ITERATIONS, POSITION_ITERATIONS);
        }
    }

    #[test]
    fn test_pixel_scale_conversion() {
        let scale = PixelScale(50.0);
        let world = scale.to_world(Vector2::new(100.0, 450.0));
        assert_approx_eq!(world.x, 2.0);
        assert_approx_eq!(world.y, 9.0);

        let back = scale.to_pixels(&world);
        assert_approx_eq!(back.x, 100.0);
        assert_approx_eq!(back.y, 450.0);
        assert_approx_eq!(scale.to_world_len(20.0), 0.4);
        assert_approx_eq!(scale.to_pixels_len(0.4), 20.0);
    }

    #[test]
    fn test_dynamic_body_position_round_trips_in_pixels() {
        let mut world = empty_world();
        let body = world.add_dynamic_circle_body(Vector2::new(100.0, 450.0), 20.0, 3.0, 1.0);

        let position = world.position(body).unwrap();
        assert_approx_eq!(position.x, 100.0, 1e-3);
        assert_approx_eq!(position.y, 450.0, 1e-3);
        assert_eq!(world.dynamic_body_count(), 1);
    }

    #[test]
    fn test_gravity_pulls_toward_positive_y() {
        let mut world = empty_world();
        let body = world.add_dynamic_circle_body(Vector2::new(100.0, 100.0), 20.0, 3.0, 1.0);

        step(&mut world, 10);

        assert!(world.position(body).unwrap().y > 100.0);
        assert!(world.velocity(body).unwrap().y > 0.0);
    }

    #[test]
    fn test_set_velocity_is_in_meters_per_second() {
        let mut world = empty_world();
        let body = world.add_dynamic_circle_body(Vector2::new(100.0, 100.0), 20.0, 3.0, 1.0);

        assert!(world.set_velocity(body, Vector2::new(-3.0, 0.0)));
        step(&mut world, 1);

        let velocity = world.velocity(body).unwrap();
        assert_approx_eq!(velocity.x, -3.0, 1e-4);
        // 3 m/s over one 16ms step is 0.048m, i.e. 2.4px.
        assert_approx_eq!(world.position(body).unwrap().x, 100.0 - 2.4, 0.05);
    }

    #[test]
    fn test_rotation_is_locked() {
        let mut world = empty_world();
        world.add_static_box(
            Vector2::new(400.0, 568.0),
            Vector2::new(400.0, 32.0),
            3.0,
            FixtureKind::Platform,
        );
        let body = world.add_dynamic_circle_body(Vector2::new(100.0, 450.0), 20.0, 3.0, 1.0);
        world.set_velocity(body, Vector2::new(3.0, 0.0));

        step(&mut world, 60);

        let rotation = world.bodies.get(body.0).unwrap().rotation().angle();
        assert_approx_eq!(rotation, 0.0, 1e-5);
    }

    #[test]
    fn test_destroy_body_drops_tags() {
        let mut world = empty_world();
        world.add_static_box(
            Vector2::new(400.0, 568.0),
            Vector2::new(400.0, 32.0),
            3.0,
            FixtureKind::Platform,
        );
        let body = world.add_dynamic_circle_body(Vector2::new(100.0, 450.0), 20.0, 3.0, 1.0);
        assert_eq!(world.fixtures.len(), 2);

        assert!(world.destroy_body(body));
        assert!(!world.contains_body(body));
        assert!(world.position(body).is_none());
        assert_eq!(world.fixtures.len(), 1);
        assert_eq!(world.body_count(), 1);

        assert!(!world.destroy_body(body));
    }

    #[test]
    fn test_ray_cast_reports_platform() {
        let mut world = empty_world();
        world.add_static_box(
            Vector2::new(400.0, 568.0),
            Vector2::new(400.0, 32.0),
            3.0,
            FixtureKind::Platform,
        );
        step(&mut world, 1);

        let mut kinds = Vec::new();
        world.ray_cast(Vector2::new(100.0, 520.0), Vector2::new(100.0, 545.0), |hit| {
            kinds.push(hit.kind)
        });
        assert_eq!(kinds, vec![FixtureKind::Platform]);

        let mut misses = 0;
        world.ray_cast(Vector2::new(100.0, 300.0), Vector2::new(100.0, 320.0), |_| {
            misses += 1
        });
        assert_eq!(misses, 0);
    }

    #[test]
    fn test_ray_cast_distinguishes_walls() {
        let mut world = empty_world();
        world.add_static_box(
            Vector2::new(-5.0, 300.0),
            Vector2::new(5.0, 300.0),
            0.0,
            FixtureKind::Wall,
        );
        step(&mut world, 1);

        let mut kinds = Vec::new();
        world.ray_cast(Vector2::new(-3.0, 100.0), Vector2::new(-3.0, 120.0), |hit| {
            kinds.push(hit.kind)
        });
        assert_eq!(kinds, vec![FixtureKind::Wall]);
    }

    #[test]
    #[should_panic(expected = "no classification tag")]
    fn test_missing_fixture_tag_is_a_fault() {
        let world = empty_world();
        world.fixture_kind(FixtureId(42));
    }

    #[test]
    fn test_debug_geometry_in_pixels() {
        let mut world = empty_world();
        world.add_static_box(
            Vector2::new(400.0, 568.0),
            Vector2::new(400.0, 32.0),
            3.0,
            FixtureKind::Platform,
        );
        world.add_dynamic_circle_body(Vector2::new(100.0, 450.0), 20.0, 3.0, 1.0);

        let shapes = world.collect_debug_geometry();
        assert_eq!(shapes.len(), 2);

        let mut saw_rectangle = false;
        let mut saw_circle = false;
        for shape in &shapes {
            match shape {
                ShapeRecord::Rectangle { vertices, color } => {
                    saw_rectangle = true;
                    assert_approx_eq!(vertices[0].x, 0.0, 1e-3);
                    assert_approx_eq!(vertices[0].y, 536.0, 1e-3);
                    assert_approx_eq!(vertices[2].x, 800.0, 1e-3);
                    assert_approx_eq!(vertices[2].y, 600.0, 1e-3);
                    assert_approx_eq!(color.g, 0.9);
                }
                ShapeRecord::Circle {
                    center, radius, ..
                } => {
                    saw_circle = true;
                    assert_approx_eq!(center.x, 100.0, 1e-3);
                    assert_approx_eq!(*radius, 20.0, 1e-3);
                }
            }
        }
        assert!(saw_rectangle && saw_circle);

        // Each pass starts from scratch.
        assert_eq!(world.collect_debug_geometry().len(), 2);
    }
}
