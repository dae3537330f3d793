//! Outbound message fan-out.
//!
//! Each connection owns an unbounded queue drained by its writer task. A send
//! never blocks and never fails at the call site: if the queue's receiver is
//! gone the message is skipped. Order within one queue is call order.
//!
//! Per-tick state fan-out is O(n²) in connected sessions. That is fine for
//! the handful of players a level holds and is left as is.

use crate::debug_draw::ShapeRecord;
use crate::ground::ground_rays;
use crate::physics::PhysicsWorld;
use crate::session::SessionRegistry;
use log::{error, warn};
use shared::{ClientId, ServerMessage};
use tokio::sync::mpsc;

/// Sending half of one connection's outbound queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<String>,
}

impl Outbox {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Creates an outbox together with the receiver a writer task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn is_live(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn send(&self, message: &ServerMessage) {
        if !self.is_live() {
            return;
        }
        match message.encode() {
            Ok(text) => self.send_encoded(text),
            Err(e) => error!("Failed to encode {}: {}", message.action(), e),
        }
    }

    /// Queues an already encoded frame.
    pub fn send_encoded(&self, text: String) {
        // Receiver may close between the liveness check and here; that's a skip too.
        let _ = self.tx.send(text);
    }
}

/// Encodes once and queues the frame on every live outbox yielded by `targets`.
fn fan_out<'a>(targets: impl Iterator<Item = &'a Outbox>, message: &ServerMessage) {
    let text = match message.encode() {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to encode {}: {}", message.action(), e);
            return;
        }
    };
    for outbox in targets.filter(|outbox| outbox.is_live()) {
        outbox.send_encoded(text.clone());
    }
}

/// Sends `message` to every session, optionally skipping one.
pub fn send_to_all(sessions: &SessionRegistry, message: &ServerMessage, except: Option<&ClientId>) {
    let targets = sessions
        .iter()
        .filter(|session| Some(&session.id) != except)
        .filter_map(|session| session.outbox.as_ref());
    fan_out(targets, message);
}

/// Sends `message` to every session in debug mode.
pub fn send_to_debug(sessions: &SessionRegistry, message: &ServerMessage) {
    fan_out(sessions.debug_sessions().filter_map(|s| s.outbox.as_ref()), message);
}

/// Snapshot of every connected player as `scCurrentState` messages, in join order.
pub fn current_states(world: &PhysicsWorld, sessions: &SessionRegistry) -> Vec<ServerMessage> {
    sessions
        .iter()
        .filter_map(|session| {
            let position = world.position(session.body);
            let velocity = world.velocity(session.body);
            match (position, velocity) {
                (Some(player_position), Some(player_velocity)) => {
                    Some(ServerMessage::CurrentState {
                        client_id: session.id.clone(),
                        player_position,
                        player_velocity,
                    })
                }
                _ => {
                    warn!("Session {} has no body in the world", session.id);
                    None
                }
            }
        })
        .collect()
}

/// Queues the full player snapshot on every session's channel.
pub fn send_current_states(world: &PhysicsWorld, sessions: &SessionRegistry) {
    for state in current_states(world, sessions) {
        send_to_all(sessions, &state, None);
    }
}

/// Ground ray overlay of every connected player.
pub fn rays(world: &PhysicsWorld, sessions: &SessionRegistry) -> Vec<ServerMessage> {
    sessions
        .iter()
        .filter_map(|session| {
            world.position(session.body).map(|center| ServerMessage::Rays {
                client_id: session.id.clone(),
                info: ground_rays(center),
            })
        })
        .collect()
}

/// Colliders, ray overlays and the trailing clear notice for debug sessions.
///
/// Does nothing, including the debug draw pass, when no session is in debug mode.
pub fn send_debug_frame(world: &PhysicsWorld, sessions: &SessionRegistry) {
    if !sessions.any_debug() {
        return;
    }

    let shapes: Vec<ShapeRecord> = world.collect_debug_geometry();
    for shape in &shapes {
        send_to_debug(sessions, &ServerMessage::ColliderInfo(shape.to_collider_info()));
    }
    for ray in rays(world, sessions) {
        send_to_debug(sessions, &ray);
    }
    send_to_debug(sessions, &ServerMessage::ClearColliderInfo);
}
