//! Plain-text rendering of connection state.

use lanyard_client::format::{
    activity_type_label, avatar_url, calculate_progress_at, detect_music_service, display_name,
    filter_duplicate_spotify_activities, format_duration, sort_activities_by_priority,
};
use lanyard_client::{ConnectionPhase, ConnectionState, PresenceSnapshot, SpotifyTrack};

/// Render `state` as it stands at `now_ms` (epoch milliseconds).
pub fn summarize(state: &ConnectionState, now_ms: u64) -> String {
    let mut lines = vec![connection_line(state)];
    if let Some(presence) = state.presence() {
        presence_lines(presence, now_ms, &mut lines);
    } else if state.is_loading {
        lines.push("  waiting for presence...".to_string());
    }
    lines.join("\n")
}

fn connection_line(state: &ConnectionState) -> String {
    match state.phase {
        ConnectionPhase::Idle => "[idle]".to_string(),
        ConnectionPhase::Connecting => "[connecting]".to_string(),
        ConnectionPhase::Connected => "[connected]".to_string(),
        ConnectionPhase::Reconnecting => {
            format!("[reconnecting, attempt {}]", state.reconnect_attempts)
        }
        ConnectionPhase::Failed => match &state.error {
            Some(e) => format!("[failed] {e}"),
            None => "[failed]".to_string(),
        },
    }
}

fn presence_lines(presence: &PresenceSnapshot, now_ms: u64, lines: &mut Vec<String>) {
    let user = &presence.discord_user;
    let name = display_name(user.global_name.as_deref(), Some(user.username.as_str()));
    lines.push(format!("  {name} is {}", presence.discord_status.as_str()));
    lines.push(format!(
        "  avatar: {}",
        avatar_url(&user.id, user.avatar.as_deref(), Some(user.discriminator.as_str()))
    ));

    if presence.listening_to_spotify {
        if let Some(track) = &presence.spotify {
            lines.push(format!("  {}", spotify_line(track, now_ms)));
        }
    }

    let activities = sort_activities_by_priority(&filter_duplicate_spotify_activities(
        &presence.activities,
        presence.listening_to_spotify,
    ));
    for activity in &activities {
        let mut line = format!("  {} {}", activity_type_label(activity.kind), activity.name);
        if let Some(service) = detect_music_service(activity) {
            line.push_str(&format!(" ({})", service.name));
        }
        if let Some(details) = activity.details.as_deref().filter(|d| !d.is_empty()) {
            line.push_str(&format!(": {details}"));
        }
        if let Some(state) = activity.state.as_deref().filter(|s| !s.is_empty()) {
            line.push_str(&format!(" / {state}"));
        }
        lines.push(line);
    }
}

fn spotify_line(track: &SpotifyTrack, now_ms: u64) -> String {
    let mut line = format!("Spotify: {} by {}", track.song, track.artist);
    if let (Some(start), Some(end)) = (track.timestamps.start, track.timestamps.end) {
        let progress = calculate_progress_at(Some(start), Some(end), now_ms);
        let elapsed = now_ms.saturating_sub(start).min(end.saturating_sub(start));
        line.push_str(&format!(
            " [{} / {}, {progress:.0}%]",
            format_duration(elapsed),
            format_duration(end.saturating_sub(start)),
        ));
    }
    line
}
