//! Server network layer handling WebSocket connections and game loop coordination

use crate::broadcast::Outbox;
use crate::config::ServerConfig;
use crate::game::GameState;
use crate::utils::generate_client_id;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientId, ClientMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerEvent {
    Accepted {
        stream: TcpStream,
        addr: SocketAddr,
    },
    MessageReceived {
        client_id: ClientId,
        text: String,
    },
    Disconnected {
        client_id: ClientId,
    },
}

/// Main server coordinating networking and game simulation
pub struct Server {
    listener: Arc<TcpListener>,
    game_state: GameState,
    tick_duration: Duration,
    /// Open sockets, ready or not, keyed by the identity assigned on accept
    connections: HashMap<ClientId, Outbox>,

    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    /// Builds the world, then binds the listener.
    pub async fn bind(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let game_state = GameState::new();

        let listener = Arc::new(TcpListener::bind(config.address()).await?);
        info!("Listening at {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            game_state,
            tick_duration: config.tick_duration,
            connections: HashMap::new(),
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Spawns task that continuously accepts TCP connections
    fn spawn_acceptor(&self) {
        let listener = Arc::clone(&self.listener);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        if let Err(e) = event_tx.send(ServerEvent::Accepted { stream, addr }) {
                            error!("Failed to send connection to main loop: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the reader and writer halves of one WebSocket connection
    fn spawn_connection(
        &self,
        client_id: ClientId,
        stream: TcpStream,
        addr: SocketAddr,
        mut outgoing: mpsc::UnboundedReceiver<String>,
    ) {
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let socket = match tokio_tungstenite::accept_async(stream).await {
                Ok(socket) => socket,
                Err(e) => {
                    warn!("WebSocket handshake with {} failed: {}", addr, e);
                    let _ = event_tx.send(ServerEvent::Disconnected { client_id });
                    return;
                }
            };
            info!("Client with id={} was connected from {}", client_id, addr);

            let (mut sink, mut source) = socket.split();

            let writer = tokio::spawn(async move {
                while let Some(text) = outgoing.recv().await {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        debug!("Stopped writing to closed socket: {}", e);
                        break;
                    }
                }
                let _ = sink.close().await;
            });

            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let event = ServerEvent::MessageReceived {
                            client_id: client_id.clone(),
                            text,
                        };
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(Message::Binary(_)) => {
                        warn!("Ignoring binary frame from {}", client_id);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Read error from {}: {}", client_id, e);
                        break;
                    }
                }
            }

            info!("Client with id={} was disconnected", client_id);
            let _ = event_tx.send(ServerEvent::Disconnected { client_id });
            // The writer ends once the main loop drops every outbox for this client.
            drop(writer);
        });
    }

    fn handle_accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        let client_id = {
            let connections = &self.connections;
            generate_client_id(&mut rand::thread_rng(), |id| connections.contains_key(id))
        };
        let (outbox, outgoing) = Outbox::channel();
        self.connections.insert(client_id.clone(), outbox);
        self.spawn_connection(client_id, stream, addr, outgoing);
    }

    /// Dispatches one decoded client message to the game state
    fn handle_message(&mut self, client_id: ClientId, text: &str) {
        let message = match ClientMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Ignoring message from {}: {}", client_id, e);
                return;
            }
        };

        match message {
            ClientMessage::Ready => match self.connections.get(&client_id) {
                Some(outbox) => {
                    let outbox = outbox.clone();
                    self.game_state.on_ready(client_id, outbox);
                }
                None => warn!("Ready from unknown connection {}", client_id),
            },
            ClientMessage::ToggleDebugMode { debug_mode } => {
                if !self.game_state.on_debug_toggle(&client_id, debug_mode) {
                    warn!("Debug toggle from {} before ready, ignoring", client_id);
                }
            }
            ClientMessage::Input(input) => {
                if !self.game_state.on_input(&client_id, &input) {
                    warn!("Input from {} before ready, ignoring", client_id);
                }
            }
        }
    }

    fn handle_disconnect(&mut self, client_id: ClientId) {
        self.connections.remove(&client_id);
        if !self.game_state.on_disconnect(&client_id) {
            debug!("Client {} left before becoming ready", client_id);
        }
    }

    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Accepted { stream, addr } => self.handle_accept(stream, addr),
            ServerEvent::MessageReceived { client_id, text } => {
                self.handle_message(client_id, &text)
            }
            ServerEvent::Disconnected { client_id } => self.handle_disconnect(client_id),
        }
    }

    /// Main server loop coordinating all operations.
    ///
    /// Socket events and ticks are handled on this one task, so game state
    /// mutations never race the physics step.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_acceptor();

        let mut tick_interval = interval(self.tick_duration);
        // A late tick pushes the schedule back instead of bursting to catch up.
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Server started successfully");

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.game_state.tick();
                },
            }
        }

        Ok(())
    }
}
