use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use shared::{ClientMessage, InputState, ServerMessage};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Headless probe that joins the game, walks left, jumps and logs the replies
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the server
    #[arg(short, long, default_value = "ws://127.0.0.1:3000")]
    url: String,

    /// Ask for debug geometry
    #[arg(short, long)]
    debug: bool,

    /// Seconds to stay connected
    #[arg(short, long, default_value = "3")]
    seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let (socket, _) = connect_async(args.url.as_str()).await?;
    info!("Connected to {}", args.url);
    let (mut sink, mut source) = socket.split();

    sink.send(Message::Text(ClientMessage::Ready.encode()?)).await?;
    if args.debug {
        let toggle = ClientMessage::ToggleDebugMode { debug_mode: true };
        sink.send(Message::Text(toggle.encode()?)).await?;
    }

    let writer = tokio::spawn(async move {
        let inputs = [
            InputState {
                left: true,
                ..InputState::default()
            },
            InputState {
                up: true,
                ..InputState::default()
            },
            InputState {
                right: true,
                ..InputState::default()
            },
        ];
        for input in inputs.iter().cycle().take(30) {
            let Ok(text) = ClientMessage::Input(*input).encode() else {
                break;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }
    });

    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    let mut snapshots = 0usize;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let frame = match timeout(remaining, source.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => {
                warn!("Socket error: {}", e);
                break;
            }
            Ok(None) | Err(_) => break,
        };
        let Message::Text(text) = frame else {
            continue;
        };
        match ServerMessage::decode(&text) {
            Ok(ServerMessage::CurrentState { .. }) => snapshots += 1,
            Ok(message) => info!("{:?}", message),
            Err(e) => warn!("Undecodable frame: {}", e),
        }
    }

    writer.abort();
    info!("Received {} state snapshots", snapshots);
    Ok(())
}
