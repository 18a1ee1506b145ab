//! Presence payload types as pushed by the Lanyard relay.
//!
//! Every struct is `serde(default)` so a snapshot missing optional fields
//! still decodes, and non-optional fields also accept an explicit `null`
//! (the relay sends one for e.g. the track id of a local Spotify file).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One complete presence snapshot for the tracked user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceSnapshot {
    pub spotify: Option<SpotifyTrack>,
    #[serde(deserialize_with = "null_as_default")]
    pub listening_to_spotify: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub discord_user: DiscordUser,
    #[serde(deserialize_with = "null_as_default")]
    pub discord_status: DiscordStatus,
    #[serde(deserialize_with = "null_as_default")]
    pub activities: Vec<Activity>,
    #[serde(deserialize_with = "null_as_default")]
    pub active_on_discord_mobile: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub active_on_discord_desktop: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub active_on_discord_web: bool,
    /// Lanyard key/value store entries.
    #[serde(deserialize_with = "null_as_default")]
    pub kv: BTreeMap<String, String>,
}

/// Discord online status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscordStatus {
    Online,
    Idle,
    Dnd,
    #[default]
    Offline,
}

impl DiscordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscordStatus::Online => "online",
            DiscordStatus::Idle => "idle",
            DiscordStatus::Dnd => "dnd",
            DiscordStatus::Offline => "offline",
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordUser {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub discriminator: String,
    /// Avatar hash; `None` means the default avatar.
    pub avatar: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub bot: bool,
    pub global_name: Option<String>,
    pub avatar_decoration_data: Option<AvatarDecoration>,
    pub display_name: Option<String>,
    pub public_flags: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarDecoration {
    #[serde(deserialize_with = "null_as_default")]
    pub asset: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sku_id: String,
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

/// Discord activity type.
///
/// Serialized as its integer code; unknown codes survive as `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub enum ActivityType {
    #[default]
    Playing,
    Streaming,
    Listening,
    Watching,
    Custom,
    Competing,
    Other(u64),
}

impl From<u64> for ActivityType {
    fn from(code: u64) -> Self {
        match code {
            0 => ActivityType::Playing,
            1 => ActivityType::Streaming,
            2 => ActivityType::Listening,
            3 => ActivityType::Watching,
            4 => ActivityType::Custom,
            5 => ActivityType::Competing,
            n => ActivityType::Other(n),
        }
    }
}

impl From<ActivityType> for u64 {
    fn from(kind: ActivityType) -> Self {
        match kind {
            ActivityType::Playing => 0,
            ActivityType::Streaming => 1,
            ActivityType::Listening => 2,
            ActivityType::Watching => 3,
            ActivityType::Custom => 4,
            ActivityType::Competing => 5,
            ActivityType::Other(n) => n,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub kind: ActivityType,
    pub url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: u64,
    pub timestamps: Option<ActivityTimestamps>,
    pub application_id: Option<String>,
    pub details: Option<String>,
    pub state: Option<String>,
    pub emoji: Option<Emoji>,
    pub party: Option<ActivityParty>,
    pub assets: Option<ActivityAssets>,
    pub secrets: Option<ActivitySecrets>,
    pub instance: Option<bool>,
    pub flags: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub buttons: Vec<String>,
    pub sync_id: Option<String>,
    pub session_id: Option<String>,
}

/// Start/end of an activity, in epoch milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityTimestamps {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityAssets {
    pub large_image: Option<String>,
    pub large_text: Option<String>,
    pub small_image: Option<String>,
    pub small_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityParty {
    pub id: Option<String>,
    /// `[current, max]`
    pub size: Option<[u32; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySecrets {
    pub join: Option<String>,
    pub spectate: Option<String>,
    #[serde(rename = "match")]
    pub match_secret: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emoji {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub id: Option<String>,
    pub animated: Option<bool>,
}

// ---------------------------------------------------------------------------
// Spotify
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyTrack {
    #[serde(deserialize_with = "null_as_default")]
    pub timestamps: ActivityTimestamps,
    #[serde(deserialize_with = "null_as_default")]
    pub song: String,
    #[serde(deserialize_with = "null_as_default")]
    pub artist: String,
    #[serde(deserialize_with = "null_as_default")]
    pub album_art_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub album: String,
    #[serde(deserialize_with = "null_as_default")]
    pub track_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "spotify": {
            "track_id": "4cOdK2wGLETKBW3PvgPWqT",
            "timestamps": {"start": 1700000000000, "end": 1700000200000},
            "song": "Never Gonna Give You Up",
            "artist": "Rick Astley",
            "album_art_url": "https://i.scdn.co/image/ab67616d0000b273",
            "album": "Whenever You Need Somebody"
        },
        "listening_to_spotify": true,
        "discord_user": {
            "id": "94490510688792576",
            "username": "phineas",
            "avatar": "a_7484f82375f47a487f41650f36d30318",
            "discriminator": "0",
            "bot": false,
            "global_name": "Phineas",
            "public_flags": 131584
        },
        "discord_status": "online",
        "activities": [
            {
                "type": 2,
                "state": "Rick Astley",
                "name": "Spotify",
                "id": "spotify:1",
                "details": "Never Gonna Give You Up",
                "created_at": 1700000000500,
                "timestamps": {"start": 1700000000000, "end": 1700000200000},
                "assets": {"large_image": "spotify:ab67616d0000b273"},
                "party": {"id": "spotify:94490510688792576"},
                "sync_id": "4cOdK2wGLETKBW3PvgPWqT",
                "flags": 48
            },
            {
                "type": 0,
                "name": "Visual Studio Code",
                "id": "abc",
                "application_id": "383226320970055681",
                "created_at": 1700000000600,
                "buttons": ["View Repository"]
            }
        ],
        "active_on_discord_mobile": false,
        "active_on_discord_desktop": true,
        "active_on_discord_web": false,
        "kv": {"location": "London"}
    }"#;

    #[test]
    fn decodes_full_snapshot() {
        let snapshot: PresenceSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        assert!(snapshot.listening_to_spotify);
        assert_eq!(snapshot.discord_status, DiscordStatus::Online);
        assert_eq!(snapshot.discord_user.global_name.as_deref(), Some("Phineas"));
        assert_eq!(snapshot.activities.len(), 2);
        assert_eq!(snapshot.activities[0].kind, ActivityType::Listening);
        assert_eq!(snapshot.activities[1].kind, ActivityType::Playing);
        assert_eq!(snapshot.activities[1].buttons, vec!["View Repository"]);
        assert_eq!(snapshot.kv.get("location").map(String::as_str), Some("London"));
        let spotify = snapshot.spotify.unwrap();
        assert_eq!(spotify.artist, "Rick Astley");
        assert_eq!(spotify.timestamps.end, Some(1700000200000));
    }

    #[test]
    fn missing_fields_default() {
        let snapshot: PresenceSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot.discord_status, DiscordStatus::Offline);
        assert!(snapshot.activities.is_empty());
        assert!(snapshot.spotify.is_none());
    }

    #[test]
    fn unknown_activity_type_is_preserved() {
        let activity: Activity = serde_json::from_str(r#"{"type": 9, "name": "x"}"#).unwrap();
        assert_eq!(activity.kind, ActivityType::Other(9));
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], 9);
    }

    #[test]
    fn match_secret_uses_wire_name() {
        let secrets: ActivitySecrets =
            serde_json::from_str(r#"{"match": "m1", "join": "j1"}"#).unwrap();
        assert_eq!(secrets.match_secret.as_deref(), Some("m1"));
        assert_eq!(secrets.join.as_deref(), Some("j1"));
    }

    #[test]
    fn local_spotify_file_with_null_fields_decodes() {
        let snapshot: PresenceSnapshot = serde_json::from_str(
            r#"{
                "spotify": {
                    "track_id": null,
                    "timestamps": {"start": 1700000000000, "end": 1700000200000},
                    "song": "demo take 3",
                    "artist": "Me",
                    "album_art_url": null,
                    "album": null
                },
                "listening_to_spotify": true,
                "discord_user": {"id": "1", "username": "ana", "discriminator": null, "bot": null},
                "discord_status": "online",
                "activities": [{"type": 2, "name": "Spotify", "id": null, "buttons": null}]
            }"#,
        )
        .unwrap();

        let spotify = snapshot.spotify.unwrap();
        assert_eq!(spotify.song, "demo take 3");
        assert_eq!(spotify.track_id, "");
        assert_eq!(spotify.album_art_url, "");
        assert_eq!(snapshot.discord_user.discriminator, "");
        assert!(!snapshot.discord_user.bot);
        assert!(snapshot.activities[0].buttons.is_empty());
    }

    #[test]
    fn status_strings() {
        assert_eq!(DiscordStatus::Dnd.as_str(), "dnd");
        let status: DiscordStatus = serde_json::from_str("\"idle\"").unwrap();
        assert_eq!(status, DiscordStatus::Idle);
    }
}
