//! Wire vocabulary spoken over the per-client WebSocket.
//!
//! Every frame in either direction is a JSON [`Envelope`] `{action, data}`.
//! `data` is itself a JSON document serialized to a string (or `null`), so a
//! message is decoded in two passes: first the envelope, then the payload
//! selected by `action`.

use crate::{ClientId, InputState, Vector2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Action names as they appear on the wire.
pub mod actions {
    pub const READY: &str = "csReady";
    pub const TOGGLE_DEBUG_MODE: &str = "csToggleDebugMode";
    pub const INPUT: &str = "csInput";

    pub const CLIENT_ID: &str = "scClientId";
    pub const INITIAL_STATE: &str = "scInitialState";
    pub const CURRENT_STATE: &str = "scCurrentState";
    pub const PLATFORM_INFO: &str = "scPlatformInfo";
    pub const COLLIDER_INFO: &str = "scColliderInfo";
    pub const CLEAR_COLLIDER_INFO: &str = "scClearColliderInfo";
    pub const REMOVE_CLIENT: &str = "scRemoveClient";
    pub const RAYS: &str = "scRays";
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("action `{0}` requires a data payload")]
    MissingData(&'static str),
}

/// Outer frame shared by both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl Envelope {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    fn payload<T: for<'de> Deserialize<'de>>(
        &self,
        action: &'static str,
    ) -> Result<T, ProtocolError> {
        let data = self
            .data
            .as_deref()
            .ok_or(ProtocolError::MissingData(action))?;
        Ok(serde_json::from_str(data)?)
    }
}

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Ready,
    ToggleDebugMode { debug_mode: bool },
    Input(InputState),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugModeData {
    debug_mode: bool,
}

#[derive(Serialize, Deserialize)]
struct InputData {
    input: InputState,
}

impl ClientMessage {
    pub fn action(&self) -> &'static str {
        match self {
            ClientMessage::Ready => actions::READY,
            ClientMessage::ToggleDebugMode { .. } => actions::TOGGLE_DEBUG_MODE,
            ClientMessage::Input(_) => actions::INPUT,
        }
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope = Envelope::parse(text)?;
        match envelope.action.as_str() {
            actions::READY => Ok(ClientMessage::Ready),
            actions::TOGGLE_DEBUG_MODE => {
                let data: DebugModeData = envelope.payload(actions::TOGGLE_DEBUG_MODE)?;
                Ok(ClientMessage::ToggleDebugMode {
                    debug_mode: data.debug_mode,
                })
            }
            actions::INPUT => {
                let data: InputData = envelope.payload(actions::INPUT)?;
                Ok(ClientMessage::Input(data.input))
            }
            _ => Err(ProtocolError::UnknownAction(envelope.action)),
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        let data = match self {
            ClientMessage::Ready => None,
            ClientMessage::ToggleDebugMode { debug_mode } => Some(serde_json::to_string(
                &DebugModeData {
                    debug_mode: *debug_mode,
                },
            )?),
            ClientMessage::Input(input) => {
                Some(serde_json::to_string(&InputData { input: *input })?)
            }
        };
        encode_envelope(self.action(), data)
    }
}

/// Static platform layout entry as the client draws it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// One debug collider shape, in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "colliderType", rename_all = "lowercase")]
pub enum ColliderInfo {
    Rectangle {
        vertices: Vec<Vector2>,
        color: Color,
    },
    Circle {
        position: Vector2,
        radius: f32,
        color: Color,
    },
}

/// Endpoints of both ground rays of one player, in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RayInfo {
    pub left_ray_begin_point: Vector2,
    pub left_ray_end_point: Vector2,
    pub right_ray_begin_point: Vector2,
    pub right_ray_end_point: Vector2,
}

/// Messages the server sends to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    ClientId {
        client_id: ClientId,
    },
    InitialState {
        client_id: ClientId,
        player_position: Vector2,
    },
    CurrentState {
        client_id: ClientId,
        player_position: Vector2,
        player_velocity: Vector2,
    },
    PlatformInfo(Vec<PlatformInfo>),
    ColliderInfo(ColliderInfo),
    ClearColliderInfo,
    RemoveClient {
        client_id: ClientId,
    },
    Rays {
        client_id: ClientId,
        info: RayInfo,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientIdData {
    client_id: ClientId,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitialStateData {
    client_id: ClientId,
    player_position: Vector2,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentStateData {
    client_id: ClientId,
    player_position: Vector2,
    player_velocity: Vector2,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RaysData {
    client_id: ClientId,
    info: RayInfo,
}

impl ServerMessage {
    pub fn action(&self) -> &'static str {
        match self {
            ServerMessage::ClientId { .. } => actions::CLIENT_ID,
            ServerMessage::InitialState { .. } => actions::INITIAL_STATE,
            ServerMessage::CurrentState { .. } => actions::CURRENT_STATE,
            ServerMessage::PlatformInfo(_) => actions::PLATFORM_INFO,
            ServerMessage::ColliderInfo(_) => actions::COLLIDER_INFO,
            ServerMessage::ClearColliderInfo => actions::CLEAR_COLLIDER_INFO,
            ServerMessage::RemoveClient { .. } => actions::REMOVE_CLIENT,
            ServerMessage::Rays { .. } => actions::RAYS,
        }
    }

    fn data(&self) -> Result<Option<String>, serde_json::Error> {
        let data = match self {
            ServerMessage::ClientId { client_id } | ServerMessage::RemoveClient { client_id } => {
                serde_json::to_string(&ClientIdData {
                    client_id: client_id.clone(),
                })?
            }
            ServerMessage::InitialState {
                client_id,
                player_position,
            } => serde_json::to_string(&InitialStateData {
                client_id: client_id.clone(),
                player_position: *player_position,
            })?,
            ServerMessage::CurrentState {
                client_id,
                player_position,
                player_velocity,
            } => serde_json::to_string(&CurrentStateData {
                client_id: client_id.clone(),
                player_position: *player_position,
                player_velocity: *player_velocity,
            })?,
            ServerMessage::PlatformInfo(platforms) => serde_json::to_string(platforms)?,
            ServerMessage::ColliderInfo(collider) => serde_json::to_string(collider)?,
            ServerMessage::ClearColliderInfo => return Ok(None),
            ServerMessage::Rays { client_id, info } => serde_json::to_string(&RaysData {
                client_id: client_id.clone(),
                info: *info,
            })?,
        };
        Ok(Some(data))
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        encode_envelope(self.action(), self.data()?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope = Envelope::parse(text)?;
        let message = match envelope.action.as_str() {
            actions::CLIENT_ID => {
                let data: ClientIdData = envelope.payload(actions::CLIENT_ID)?;
                ServerMessage::ClientId {
                    client_id: data.client_id,
                }
            }
            actions::INITIAL_STATE => {
                let data: InitialStateData = envelope.payload(actions::INITIAL_STATE)?;
                ServerMessage::InitialState {
                    client_id: data.client_id,
                    player_position: data.player_position,
                }
            }
            actions::CURRENT_STATE => {
                let data: CurrentStateData = envelope.payload(actions::CURRENT_STATE)?;
                ServerMessage::CurrentState {
                    client_id: data.client_id,
                    player_position: data.player_position,
                    player_velocity: data.player_velocity,
                }
            }
            actions::PLATFORM_INFO => {
                ServerMessage::PlatformInfo(envelope.payload(actions::PLATFORM_INFO)?)
            }
            actions::COLLIDER_INFO => {
                ServerMessage::ColliderInfo(envelope.payload(actions::COLLIDER_INFO)?)
            }
            actions::CLEAR_COLLIDER_INFO => ServerMessage::ClearColliderInfo,
            actions::REMOVE_CLIENT => {
                let data: ClientIdData = envelope.payload(actions::REMOVE_CLIENT)?;
                ServerMessage::RemoveClient {
                    client_id: data.client_id,
                }
            }
            actions::RAYS => {
                let data: RaysData = envelope.payload(actions::RAYS)?;
                ServerMessage::Rays {
                    client_id: data.client_id,
                    info: data.info,
                }
            }
            _ => return Err(ProtocolError::UnknownAction(envelope.action)),
        };
        Ok(message)
    }
}

fn encode_envelope(action: &str, data: Option<String>) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(&Envelope {
        action: action.to_string(),
        data,
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use serde_json::Value;

    #[test]
    fn test_decode_ready_without_data() {
        let message = ClientMessage::decode(r#"{"action":"csReady","data":null}"#).unwrap();
        assert_eq!(message, ClientMessage::Ready);

        let message = ClientMessage::decode(r#"{"action":"csReady"}"#).unwrap();
        assert_eq!(message, ClientMessage::Ready);
    }

    #[test]
    fn test_decode_toggle_debug_mode() {
        let text = r#"{"action":"csToggleDebugMode","data":"{\"debugMode\":true}"}"#;
        match ClientMessage::decode(text).unwrap() {
            ClientMessage::ToggleDebugMode { debug_mode } => assert!(debug_mode),
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_input() {
        let text = r#"{"action":"csInput","data":"{\"input\":{\"up\":true,\"left\":false,\"right\":true,\"down\":false}}"}"#;
        match ClientMessage::decode(text).unwrap() {
            ClientMessage::Input(input) => {
                assert!(input.up);
                assert!(input.right);
                assert!(!input.left);
                assert!(!input.down);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_action() {
        let err = ClientMessage::decode(r#"{"action":"csTeleport","data":null}"#).unwrap_err();
        match err {
            ProtocolError::UnknownAction(action) => assert_eq!(action, "csTeleport"),
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_missing_payload() {
        let err = ClientMessage::decode(r#"{"action":"csInput","data":null}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingData(actions::INPUT)));
    }

    #[test]
    fn test_decode_malformed_json() {
        assert!(matches!(
            ClientMessage::decode("not json"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            ClientMessage::decode(r#"{"action":"csInput","data":"{\"input\":7}"}"#),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_data_is_a_nested_json_string() {
        let message = ServerMessage::CurrentState {
            client_id: ClientId::new("p1"),
            player_position: Vector2::new(100.0, 450.0),
            player_velocity: Vector2::new(-3.0, 0.5),
        };
        let outer: Value = serde_json::from_str(&message.encode().unwrap()).unwrap();
        assert_eq!(outer["action"], "scCurrentState");

        let data = outer["data"].as_str().expect("data should be a string");
        let inner: Value = serde_json::from_str(data).unwrap();
        assert_eq!(inner["clientId"], "p1");
        assert_eq!(inner["playerPosition"]["x"], 100.0);
        assert_eq!(inner["playerVelocity"]["x"], -3.0);
    }

    #[test]
    fn test_clear_collider_info_has_null_data() {
        let outer: Value =
            serde_json::from_str(&ServerMessage::ClearColliderInfo.encode().unwrap()).unwrap();
        assert_eq!(outer["action"], "scClearColliderInfo");
        assert!(outer["data"].is_null());
    }

    #[test]
    fn test_collider_info_shapes() {
        let color = Color {
            r: 0.5,
            g: 0.9,
            b: 0.5,
        };
        let circle = ServerMessage::ColliderInfo(ColliderInfo::Circle {
            position: Vector2::new(10.0, 20.0),
            radius: 20.0,
            color,
        });
        let outer: Value = serde_json::from_str(&circle.encode().unwrap()).unwrap();
        let inner: Value = serde_json::from_str(outer["data"].as_str().unwrap()).unwrap();
        assert_eq!(inner["colliderType"], "circle");
        assert_eq!(inner["radius"], 20.0);
        assert_eq!(inner["position"]["y"], 20.0);

        let rectangle = ServerMessage::ColliderInfo(ColliderInfo::Rectangle {
            vertices: vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(10.0, 0.0),
                Vector2::new(10.0, 5.0),
                Vector2::new(0.0, 5.0),
            ],
            color,
        });
        let outer: Value = serde_json::from_str(&rectangle.encode().unwrap()).unwrap();
        let inner: Value = serde_json::from_str(outer["data"].as_str().unwrap()).unwrap();
        assert_eq!(inner["colliderType"], "rectangle");
        assert_eq!(inner["vertices"].as_array().unwrap().len(), 4);
        assert_eq!(inner["color"]["g"], 0.9);
    }

    #[test]
    fn test_rays_field_names() {
        let message = ServerMessage::Rays {
            client_id: ClientId::new("p1"),
            info: RayInfo {
                left_ray_begin_point: Vector2::new(88.0, 455.0),
                left_ray_end_point: Vector2::new(88.0, 475.0),
                right_ray_begin_point: Vector2::new(112.0, 455.0),
                right_ray_end_point: Vector2::new(112.0, 475.0),
            },
        };
        let outer: Value = serde_json::from_str(&message.encode().unwrap()).unwrap();
        let inner: Value = serde_json::from_str(outer["data"].as_str().unwrap()).unwrap();
        assert_eq!(inner["info"]["leftRayBeginPoint"]["x"], 88.0);
        assert_eq!(inner["info"]["rightRayEndPoint"]["y"], 475.0);
    }

    #[test]
    fn test_server_message_decode_platform_info() {
        let message = ServerMessage::PlatformInfo(vec![PlatformInfo {
            x: 400.0,
            y: 568.0,
            scale: 2.0,
        }]);
        match ServerMessage::decode(&message.encode().unwrap()).unwrap() {
            ServerMessage::PlatformInfo(platforms) => {
                assert_eq!(platforms.len(), 1);
                assert_approx_eq!(platforms[0].scale, 2.0);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_client_message_encode_matches_decode() {
        let toggle = ClientMessage::ToggleDebugMode { debug_mode: false };
        assert_eq!(ClientMessage::decode(&toggle.encode().unwrap()).unwrap(), toggle);

        let input = ClientMessage::Input(InputState {
            left: true,
            ..InputState::default()
        });
        assert_eq!(ClientMessage::decode(&input.encode().unwrap()).unwrap(), input);
    }
}
