//! # Platformer Server Library
//!
//! This library provides the authoritative server for the multiplayer
//! platformer. It owns the physics world, applies client input to player
//! bodies, and streams positions and velocities to thin rendering clients
//! over one WebSocket per player.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the only physics world. Clients never simulate; they draw
//! whatever the latest `scCurrentState` says.
//!
//! ### Session Management
//! Handles the lifecycle of a player:
//! - Identity assignment when the socket connects
//! - Body creation and the join handshake on `csReady`
//! - Input and debug-mode toggles while connected
//! - Body removal and peer notification on disconnect
//!
//! ### State Broadcasting
//! Every tick each session receives the pose of every connected player,
//! itself included. Sessions in debug mode additionally receive collider
//! outlines and the ground rays of every player.
//!
//! ## Architecture Design
//!
//! ### Single Writer Event Loop
//! Socket reader tasks forward frames over a channel to one loop that also
//! owns the tick timer. Only that loop touches the world and the session
//! registry, so there is no locking around physics.
//!
//! ### Fire and Forget Sends
//! Each connection has an unbounded outbound queue drained by its own writer
//! task. A send to a closed queue is skipped; a slow client is never
//! throttled.
//!
//! ### Pixel Boundary
//! The physics adapter works in meters. Positions are converted to pixels at
//! the adapter boundary and nowhere else.
//!
//! ## Module Organization
//!
//! - `physics`: rigid-body world adapter, fixture classification, ray casts
//! - `debug_draw`: collider geometry capture for debug clients
//! - `ground`: per-player ground rays and the grounded flags
//! - `level`: fixed platforms and walls
//! - `session`: ready sessions, input rules, join/leave notices
//! - `broadcast`: outbound queues and per-tick fan-out
//! - `game`: the simulation tick
//! - `network`: listener, connection tasks and the main loop
//! - `config`: command-line and environment settings
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::bind(&ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod debug_draw;
pub mod game;
pub mod ground;
pub mod level;
pub mod network;
pub mod physics;
pub mod session;
pub mod utils;
