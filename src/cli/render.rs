// src/cli/render.rs — Plain-text views of sessions and world state

use chrono::DateTime;
use std::fmt::Write;

use crate::session::{ChatMessage, HistoryPoint, Role, SessionMetadata, WorldState};

const BAR_WIDTH: usize = 20;

/// `[#####...............]  25%`
pub fn percent_bar(value: u8) -> String {
    let filled = (value.min(100) as usize * BAR_WIDTH + 50) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        value.min(100)
    )
}

pub fn world_state(world: &WorldState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Year:       {}", world.year);
    let _ = writeln!(out, "  Chaos:      {}", percent_bar(world.chaos_level));
    let _ = writeln!(
        out,
        "  Stability:  {}",
        percent_bar(world.geopolitical_stability)
    );
    let _ = writeln!(out, "  Mood:       {}", world.population_mood);
    if !world.deviations.is_empty() {
        let _ = writeln!(out, "  Deviations:");
        for deviation in &world.deviations {
            let _ = writeln!(out, "    - {deviation}");
        }
    }
    out
}

/// One line per recorded turn, oldest first.
pub fn timeline(points: &[HistoryPoint]) -> String {
    if points.is_empty() {
        return "  Timeline is empty.\n".to_string();
    }
    let mut out = String::new();
    for point in points {
        let _ = writeln!(out, "  {:>6}  {}", point.year, percent_bar(point.chaos));
    }
    out
}

/// Numbered so the player can answer with the number.
pub fn suggestions(actions: &[String]) -> String {
    let mut out = String::new();
    for (i, action) in actions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {action}", i + 1);
    }
    out
}

pub fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

pub fn session_list(sessions: &[SessionMetadata], active_id: Option<&str>) -> String {
    if sessions.is_empty() {
        return "  No saved sessions.\n".to_string();
    }
    let mut out = String::new();
    for s in sessions {
        let marker = if Some(s.id.as_str()) == active_id { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {:<15} {:<34} {:>6}  {}",
            s.id,
            s.title,
            s.year,
            format_millis(s.last_updated)
        );
    }
    out
}

pub fn message(msg: &ChatMessage) -> String {
    let who = match msg.role {
        Role::User => "You",
        Role::Ai => "Chronos",
        Role::System => "System",
    };
    format!("[{}] {who}: {}", msg.timestamp.format("%H:%M"), msg.content)
}

pub fn transcript(messages: &[ChatMessage]) -> String {
    let mut out = String::new();
    for msg in messages {
        let _ = writeln!(out, "{}\n", message(msg));
    }
    out
}
