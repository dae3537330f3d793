//! Player sessions and their join/leave lifecycle.
//!
//! This module handles the server-side bookkeeping of ready players:
//! - Session creation on the ready handshake, with exactly one body each
//! - Input application (horizontal speed and jumps)
//! - Debug-mode opt in and opt out
//! - Teardown on disconnect, including the body and the removal notice
//!
//! The registry references bodies by handle; the world owns them.

use crate::broadcast::{self, Outbox};
use crate::ground::Grounded;
use crate::level;
use crate::physics::{BodyHandle, PhysicsWorld};
use log::{debug, info, warn};
use shared::{
    ClientId, InputState, ServerMessage, JUMP_VELOCITY, PLAYER_DENSITY, PLAYER_FRICTION,
    PLAYER_RADIUS, PLAYER_SPEED, SPAWN_POSITION,
};

/// A ready player.
#[derive(Debug)]
pub struct Session {
    /// Identity assigned when the socket connected
    pub id: ClientId,
    /// Outbound channel; `None` or closed means sends are skipped
    pub outbox: Option<Outbox>,
    /// The player's body in the world
    pub body: BodyHandle,
    /// Ground contact per ray side
    pub grounded: Grounded,
    /// Whether this session receives debug geometry
    pub debug_mode: bool,
}

impl Session {
    pub fn new(id: ClientId, outbox: Option<Outbox>, body: BodyHandle) -> Self {
        Self {
            id,
            outbox,
            body,
            grounded: Grounded::default(),
            debug_mode: false,
        }
    }

    /// Queues `message` if the channel is still open.
    pub fn send(&self, message: &ServerMessage) {
        if let Some(outbox) = &self.outbox {
            outbox.send(message);
        }
    }
}

/// Applies one input message to a body.
///
/// Left/right set a fixed horizontal speed rather than accumulating. A jump
/// needs at least one grounded side and clears both sides together with the
/// velocity change.
pub fn apply_input(
    world: &mut PhysicsWorld,
    body: BodyHandle,
    grounded: &mut Grounded,
    input: &InputState,
) {
    let Some(mut velocity) = world.velocity(body) else {
        return;
    };
    let before = velocity;

    if input.left {
        velocity.x = -PLAYER_SPEED;
    }
    if input.right {
        velocity.x = PLAYER_SPEED;
    }
    if input.up && grounded.any() {
        velocity.y = JUMP_VELOCITY;
        grounded.clear();
    }

    if velocity != before {
        world.set_velocity(body, velocity);
    }
}

/// All ready sessions, in join order.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
        }
    }

    /// Handles the ready handshake for a connected client.
    ///
    /// Creates the body at the spawn point and sends, in order: the client
    /// id, the join notice (to everyone, the newcomer included), the current
    /// position of every earlier peer, and the platform layout. Returns false
    /// and changes nothing if `id` already has a session.
    pub fn on_ready(&mut self, world: &mut PhysicsWorld, id: ClientId, outbox: Outbox) -> bool {
        if self.contains(&id) {
            warn!("Client {} sent ready twice, ignoring", id);
            return false;
        }

        let body = world.add_dynamic_circle_body(
            SPAWN_POSITION,
            PLAYER_RADIUS,
            PLAYER_FRICTION,
            PLAYER_DENSITY,
        );
        let session = Session::new(id.clone(), Some(outbox), body);

        session.send(&ServerMessage::ClientId {
            client_id: id.clone(),
        });
        self.sessions.push(session);

        broadcast::send_to_all(
            self,
            &ServerMessage::InitialState {
                client_id: id.clone(),
                player_position: SPAWN_POSITION,
            },
            None,
        );

        if let Some(newcomer) = self.get(&id) {
            for peer in self.sessions.iter().filter(|s| s.id != id) {
                if let Some(player_position) = world.position(peer.body) {
                    newcomer.send(&ServerMessage::InitialState {
                        client_id: peer.id.clone(),
                        player_position,
                    });
                }
            }
            newcomer.send(&ServerMessage::PlatformInfo(level::platform_info()));
        }

        info!("Client {} is ready ({} players)", id, self.sessions.len());
        true
    }

    /// Applies one input message. Returns false for an unknown session.
    pub fn on_input(&mut self, world: &mut PhysicsWorld, id: &ClientId, input: &InputState) -> bool {
        match self.get_mut(id) {
            Some(session) => {
                apply_input(world, session.body, &mut session.grounded, input);
                true
            }
            None => false,
        }
    }

    /// Adds or removes a session from the debug broadcast set.
    pub fn on_debug_toggle(&mut self, id: &ClientId, enabled: bool) -> bool {
        match self.get_mut(id) {
            Some(session) => {
                session.debug_mode = enabled;
                debug!("Client {} debug mode {}", id, enabled);
                true
            }
            None => false,
        }
    }

    /// Removes a session and its body, then notifies the remaining sessions.
    /// Returns false if `id` had no session.
    pub fn on_disconnect(&mut self, world: &mut PhysicsWorld, id: &ClientId) -> bool {
        let Some(index) = self.sessions.iter().position(|s| &s.id == id) else {
            return false;
        };
        let session = self.sessions.remove(index);
        world.destroy_body(session.body);

        broadcast::send_to_all(
            self,
            &ServerMessage::RemoveClient {
                client_id: session.id.clone(),
            },
            None,
        );
        info!("Client {} left ({} players)", id, self.sessions.len());
        true
    }

    pub fn get(&self, id: &ClientId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    pub fn get_mut(&mut self, id: &ClientId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.iter_mut()
    }

    pub fn ids(&self) -> Vec<ClientId> {
        self.sessions.iter().map(|s| s.id.clone()).collect()
    }

    pub fn debug_sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter().filter(|s| s.debug_mode)
    }

    pub fn any_debug(&self) -> bool {
        self.sessions.iter().any(|s| s.debug_mode)
    }

    /// Returns the number of ready sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
