//! Lanyard socket protocol.
//!
//! Every frame is a JSON envelope `{op, t?, d?}`. The relay sends Hello
//! (op 1) right after the socket opens and Event (op 0) frames carrying
//! presence snapshots; the client answers with Initialize (op 2) and then
//! keeps the socket alive with Heartbeat (op 3).

use serde::{Deserialize, Serialize};

use crate::presence::PresenceSnapshot;

// ---------------------------------------------------------------------------
// Opcodes & event names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Event = 0,
    Hello = 1,
    Initialize = 2,
    Heartbeat = 3,
}

impl Opcode {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Opcode::Event),
            1 => Some(Opcode::Hello),
            2 => Some(Opcode::Initialize),
            3 => Some(Opcode::Heartbeat),
            _ => None,
        }
    }

    pub fn code(self) -> u64 {
        self as u64
    }
}

/// Event names (`t`) carried by op 0 frames.
pub mod events {
    pub const INIT_STATE: &str = "INIT_STATE";
    pub const PRESENCE_UPDATE: &str = "PRESENCE_UPDATE";
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The wire envelope shared by every inbound and outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub op: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<serde_json::Value>,
}

impl Envelope {
    /// `{"op":2,"d":{"subscribe_to_id":"<user_id>"}}`
    pub fn initialize(user_id: &str) -> Self {
        Self {
            op: Opcode::Initialize.code(),
            t: None,
            d: Some(serde_json::json!({ "subscribe_to_id": user_id })),
        }
    }

    /// `{"op":3}`
    pub fn heartbeat() -> Self {
        Self {
            op: Opcode::Heartbeat.code(),
            t: None,
            d: None,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Inbound decoding
// ---------------------------------------------------------------------------

/// Which of the two presence events produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEventKind {
    InitState,
    PresenceUpdate,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Hello {
        /// Milliseconds between heartbeats, if the relay sent one.
        heartbeat_interval: Option<u64>,
    },
    Presence {
        kind: PresenceEventKind,
        /// `None` when the event carried no payload (`d` absent or `null`).
        snapshot: Option<Box<PresenceSnapshot>>,
    },
    /// Valid envelope the client has no use for.
    Ignored { op: u64, t: Option<String> },
}

/// Decode one text frame.
///
/// Fails only when the frame is not an envelope at all, or when a
/// presence event's payload is present but not shaped like a snapshot.
pub fn decode(text: &str) -> Result<Inbound, serde_json::Error> {
    let envelope: Envelope = serde_json::from_str(text)?;

    match Opcode::from_code(envelope.op) {
        Some(Opcode::Hello) => {
            let heartbeat_interval = envelope
                .d
                .as_ref()
                .and_then(|d| d.get("heartbeat_interval"))
                .and_then(|v| v.as_u64());
            Ok(Inbound::Hello { heartbeat_interval })
        }
        Some(Opcode::Event) => {
            let kind = match envelope.t.as_deref() {
                Some(events::INIT_STATE) => PresenceEventKind::InitState,
                Some(events::PRESENCE_UPDATE) => PresenceEventKind::PresenceUpdate,
                _ => {
                    return Ok(Inbound::Ignored {
                        op: envelope.op,
                        t: envelope.t,
                    })
                }
            };
            let snapshot = match envelope.d {
                Some(payload) => Some(Box::new(serde_json::from_value::<PresenceSnapshot>(
                    payload,
                )?)),
                None => None,
            };
            Ok(Inbound::Presence { kind, snapshot })
        }
        _ => Ok(Inbound::Ignored {
            op: envelope.op,
            t: envelope.t,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_bit_exact() {
        let json = Envelope::initialize("94490510688792576").to_json().unwrap();
        assert_eq!(json, r#"{"op":2,"d":{"subscribe_to_id":"94490510688792576"}}"#);
    }

    #[test]
    fn heartbeat_is_bit_exact() {
        assert_eq!(Envelope::heartbeat().to_json().unwrap(), r#"{"op":3}"#);
    }

    #[test]
    fn decodes_hello() {
        let inbound = decode(r#"{"op":1,"d":{"heartbeat_interval":30000}}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Hello {
                heartbeat_interval: Some(30000)
            }
        );
    }

    #[test]
    fn hello_without_payload_has_no_interval() {
        let inbound = decode(r#"{"op":1}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Hello {
                heartbeat_interval: None
            }
        );
    }

    #[test]
    fn decodes_init_state() {
        let text = r#"{
            "op": 0,
            "t": "INIT_STATE",
            "d": {
                "discord_user": {"id": "1", "username": "ana", "discriminator": "0", "avatar": null},
                "discord_status": "idle",
                "activities": [],
                "listening_to_spotify": false
            }
        }"#;
        match decode(text).unwrap() {
            Inbound::Presence { kind, snapshot } => {
                assert_eq!(kind, PresenceEventKind::InitState);
                assert_eq!(snapshot.unwrap().discord_user.username, "ana");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn presence_update_kind() {
        let text = r#"{"op":0,"t":"PRESENCE_UPDATE","d":{"discord_status":"dnd"}}"#;
        assert!(matches!(
            decode(text).unwrap(),
            Inbound::Presence {
                kind: PresenceEventKind::PresenceUpdate,
                ..
            }
        ));
    }

    #[test]
    fn null_payload_decodes_to_empty_presence() {
        for text in [
            r#"{"op":0,"t":"PRESENCE_UPDATE","d":null}"#,
            r#"{"op":0,"t":"INIT_STATE"}"#,
        ] {
            match decode(text).unwrap() {
                Inbound::Presence { snapshot, .. } => assert!(snapshot.is_none()),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_event_name_is_ignored() {
        let inbound = decode(r#"{"op":0,"t":"SOMETHING_ELSE","d":{}}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Ignored {
                op: 0,
                t: Some("SOMETHING_ELSE".into())
            }
        );
    }

    #[test]
    fn unknown_opcode_is_ignored() {
        assert!(matches!(
            decode(r#"{"op":7}"#).unwrap(),
            Inbound::Ignored { op: 7, t: None }
        ));
    }

    #[test]
    fn malformed_frames_fail() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"t":"INIT_STATE"}"#).is_err());
        assert!(decode(r#"{"op":0,"t":"INIT_STATE","d":{"activities":5}}"#).is_err());
        assert!(decode(r#"{"op":0,"t":"INIT_STATE","d":"oops"}"#).is_err());
    }
}
