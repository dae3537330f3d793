use crate::broadcast::{self, Outbox};
use crate::ground;
use crate::level;
use crate::physics::{PhysicsWorld, PixelScale};
use crate::session::SessionRegistry;
use log::debug;
use shared::{
    ClientId, InputState, GRAVITY, PIXELS_PER_METER, POSITION_ITERATIONS, STEP_DT,
    VELOCITY_ITERATIONS,
};

/// Authoritative simulation: the world plus the sessions that drive it.
///
/// Owned by the server loop, which is the only caller; socket events and
/// ticks are interleaved on that one task and never overlap.
pub struct GameState {
    pub tick: u64,
    pub world: PhysicsWorld,
    pub sessions: SessionRegistry,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Builds the world and registers the static level.
    pub fn new() -> Self {
        let mut world = PhysicsWorld::new(GRAVITY, PixelScale(PIXELS_PER_METER));
        level::build(&mut world);
        Self {
            tick: 0,
            world,
            sessions: SessionRegistry::new(),
        }
    }

    pub fn on_ready(&mut self, id: ClientId, outbox: Outbox) -> bool {
        self.sessions.on_ready(&mut self.world, id, outbox)
    }

    pub fn on_input(&mut self, id: &ClientId, input: &InputState) -> bool {
        self.sessions.on_input(&mut self.world, id, input)
    }

    pub fn on_debug_toggle(&mut self, id: &ClientId, enabled: bool) -> bool {
        self.sessions.on_debug_toggle(id, enabled)
    }

    pub fn on_disconnect(&mut self, id: &ClientId) -> bool {
        self.sessions.on_disconnect(&mut self.world, id)
    }

    /// Runs one simulation tick to completion.
    ///
    /// Steps the world, updates ground contact for every player, sends the
    /// full snapshot to every session, then the debug frame if anyone asked.
    pub fn tick(&mut self) {
        self.world
            .step(STEP_DT, VELOCITY_ITERATIONS, POSITION_ITERATIONS);

        for session in self.sessions.iter_mut() {
            ground::update_grounded(&self.world, session.body, &mut session.grounded);
        }

        broadcast::send_current_states(&self.world, &self.sessions);
        broadcast::send_debug_frame(&self.world, &self.sessions);

        self.tick += 1;
        if self.tick % 60 == 0 && !self.sessions.is_empty() {
            debug!(
                "Tick {}: {} players, {} in debug mode",
                self.tick,
                self.sessions.len(),
                self.sessions.debug_sessions().count()
            );
        }
    }
}
