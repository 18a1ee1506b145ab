//! Presentation helpers for presence data.
//!
//! Pure functions that turn raw presence fields into labels, URLs and
//! progress values. Nothing here touches the connection.

use crate::presence::{Activity, ActivityType};

const SPOTIFY_IMAGE_CDN: &str = "https://i.scdn.co/image";
const DISCORD_MEDIA_PROXY: &str = "https://media.discordapp.net";
const DISCORD_CDN: &str = "https://cdn.discordapp.com";

// ---------------------------------------------------------------------------
// Labels & names
// ---------------------------------------------------------------------------

/// Verb shown before an activity name ("Playing", "Listening to", ...).
pub fn activity_type_label(kind: ActivityType) -> &'static str {
    match kind {
        ActivityType::Playing => "Playing",
        ActivityType::Streaming => "Streaming",
        ActivityType::Listening => "Listening to",
        ActivityType::Watching => "Watching",
        ActivityType::Custom => "Custom",
        ActivityType::Competing => "Competing in",
        ActivityType::Other(_) => "Active on",
    }
}

/// First non-empty of `global_name` and `username`, else "Discord User".
pub fn display_name<'a>(global_name: Option<&'a str>, username: Option<&'a str>) -> &'a str {
    global_name
        .filter(|s| !s.is_empty())
        .or(username.filter(|s| !s.is_empty()))
        .unwrap_or("Discord User")
}

// ---------------------------------------------------------------------------
// URLs
// ---------------------------------------------------------------------------

/// Resolve an activity asset reference to a fetchable URL.
///
/// `spotify:<id>` and `mp:external/...` references are rewritten to their
/// CDNs; bare asset ids need the activity's application id. Anything else
/// is returned unchanged.
pub fn parse_image_url(image: &str, application_id: Option<&str>) -> String {
    if image.is_empty() {
        return String::new();
    }

    if image.starts_with("spotify:") {
        let id = image.rsplit(':').next().unwrap_or_default();
        return format!("{SPOTIFY_IMAGE_CDN}/{id}");
    }

    if let Some(rest) = image.strip_prefix("mp:") {
        if rest.starts_with("external") {
            return if rest.contains("/https/") {
                format!("{DISCORD_MEDIA_PROXY}/{rest}")
            } else {
                image.to_string()
            };
        }
    }

    match application_id.filter(|id| !id.is_empty()) {
        Some(app) => format!("{DISCORD_CDN}/app-assets/{app}/{image}.png"),
        None => image.to_string(),
    }
}

/// Avatar URL for a user; falls back to the numbered default avatar.
pub fn avatar_url(user_id: &str, avatar: Option<&str>, discriminator: Option<&str>) -> String {
    match avatar.filter(|a| !a.is_empty()) {
        Some(hash) => format!("{DISCORD_CDN}/avatars/{user_id}/{hash}.png?size=128"),
        None => {
            let index = discriminator
                .and_then(|d| d.trim().parse::<u64>().ok())
                .map_or(0, |d| d % 5);
            format!("{DISCORD_CDN}/embed/avatars/{index}.png")
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Percentage of `[start, end]` elapsed right now, in `[0, 100]`.
pub fn calculate_progress(start: Option<u64>, end: Option<u64>) -> f64 {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    calculate_progress_at(start, end, now)
}

/// [`calculate_progress`] at an explicit `now` (epoch ms).
///
/// Zero or missing bounds give 0. A window with no length is complete once
/// `now` reaches its end.
pub fn calculate_progress_at(start: Option<u64>, end: Option<u64>, now: u64) -> f64 {
    let (Some(start), Some(end)) = (start.filter(|s| *s > 0), end.filter(|e| *e > 0)) else {
        return 0.0;
    };

    if end <= start {
        return if now >= end { 100.0 } else { 0.0 };
    }

    let total = (end - start) as f64;
    let elapsed = now as f64 - start as f64;
    (elapsed / total * 100.0).clamp(0.0, 100.0)
}

/// `M:SS` for a duration in milliseconds.
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

// ---------------------------------------------------------------------------
// Music services
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicService {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

const SPOTIFY: MusicService = MusicService {
    name: "Spotify",
    icon: "https://open.spotify.com/favicon.ico",
    color: "#1DB954",
};

/// (application id, lowercase name fragment, service)
const MUSIC_SERVICES: &[(&str, &str, MusicService)] = &[
    (
        "463151177836658699",
        "youtube",
        MusicService {
            name: "YouTube Music",
            icon: "https://music.youtube.com/favicon.ico",
            color: "#FF0000",
        },
    ),
    (
        "367827983903490050",
        "apple music",
        MusicService {
            name: "Apple Music",
            icon: "https://music.apple.com/favicon.ico",
            color: "#FA243C",
        },
    ),
    (
        "174403736877957120",
        "soundcloud",
        MusicService {
            name: "SoundCloud",
            icon: "https://soundcloud.com/favicon.ico",
            color: "#FF5500",
        },
    ),
    (
        "432980957394370572",
        "deezer",
        MusicService {
            name: "Deezer",
            icon: "https://www.deezer.com/favicon.ico",
            color: "#FEAA2D",
        },
    ),
    (
        "408785106942164992",
        "tidal",
        MusicService {
            name: "Tidal",
            icon: "https://tidal.com/favicon.ico",
            color: "#000000",
        },
    ),
    (
        "1020414178047041596",
        "amazon",
        MusicService {
            name: "Amazon Music",
            icon: "https://music.amazon.com/favicon.ico",
            color: "#FF9900",
        },
    ),
    (
        "1043708582735806464",
        "pandora",
        MusicService {
            name: "Pandora",
            icon: "https://www.pandora.com/favicon.ico",
            color: "#005483",
        },
    ),
];

/// Which service a listening activity comes from. Spotify when unknown.
///
/// Returns `None` for anything that is not a listening activity.
pub fn detect_music_service(activity: &Activity) -> Option<MusicService> {
    if activity.kind != ActivityType::Listening {
        return None;
    }

    if let Some(app) = activity.application_id.as_deref() {
        if let Some((_, _, service)) = MUSIC_SERVICES.iter().find(|(id, _, _)| *id == app) {
            return Some(*service);
        }
    }

    let name = activity.name.to_lowercase();
    let by_name = MUSIC_SERVICES
        .iter()
        .find(|(_, needle, _)| name.contains(needle))
        .map(|(_, _, service)| *service);

    Some(by_name.unwrap_or(SPOTIFY))
}

// ---------------------------------------------------------------------------
// Activity lists
// ---------------------------------------------------------------------------

fn priority(activity: &Activity) -> u8 {
    match activity.kind {
        ActivityType::Listening => 0,
        ActivityType::Playing => 1,
        _ => 2,
    }
}

/// Listening first, then playing, then the rest; order otherwise kept.
pub fn sort_activities_by_priority(activities: &[Activity]) -> Vec<Activity> {
    let mut sorted = activities.to_vec();
    sorted.sort_by_key(priority);
    sorted
}

pub fn most_relevant_activity(activities: &[Activity]) -> Option<&Activity> {
    activities.iter().min_by_key(|a| priority(a))
}

pub fn non_listening_activities(activities: &[Activity]) -> Vec<Activity> {
    activities
        .iter()
        .filter(|a| a.kind != ActivityType::Listening)
        .cloned()
        .collect()
}

/// Drop listening activities when the dedicated Spotify block already
/// shows the track.
pub fn filter_duplicate_spotify_activities(
    activities: &[Activity],
    listening_to_spotify: bool,
) -> Vec<Activity> {
    if listening_to_spotify {
        non_listening_activities(activities)
    } else {
        activities.to_vec()
    }
}
