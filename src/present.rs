//! Terminal rendering of session state: header, participant strip, output panel.
//!
//! The `*_view` functions compute plain data (easy to test); the `render_*`
//! functions turn that into colored terminal text.

use colored::*;

use crate::session::{ExecutionResult, Participant, Session};

/// Maximum number of avatars shown before collapsing into `+N`.
pub const MAX_AVATARS: usize = 5;

pub const EMPTY_OUTPUT_HINT: &str = "Click \"Run Code\" to execute your solution";
pub const RUNNING_TEXT: &str = "Running code...";

// ---------------------------------------------------------------------------
// Participant strip
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub initial: char,
    pub name: String,
    pub is_host: bool,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantStrip {
    pub online_count: usize,
    pub avatars: Vec<Avatar>,
    /// Online participants not shown as avatars.
    pub overflow: usize,
}

/// Upper-cased first letter of a display name (`?` for an empty name).
pub fn initial(name: &str) -> char {
    name.chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('?')
}

pub fn participant_strip(participants: &[Participant], current_id: Option<&str>) -> ParticipantStrip {
    let online: Vec<&Participant> = participants.iter().filter(|p| p.is_online).collect();
    let avatars = online
        .iter()
        .take(MAX_AVATARS)
        .map(|p| Avatar {
            initial: initial(&p.name),
            name: p.name.clone(),
            is_host: p.is_host,
            is_current: current_id == Some(p.id.as_str()),
        })
        .collect();
    ParticipantStrip {
        online_count: online.len(),
        avatars,
        overflow: online.len().saturating_sub(MAX_AVATARS),
    }
}

pub fn render_participants(participants: &[Participant], current_id: Option<&str>) -> String {
    let strip = participant_strip(participants, current_id);
    let mut parts = vec![format!("👥 {}", strip.online_count).dimmed().to_string()];
    for avatar in &strip.avatars {
        let mut badge = format!("[{}]", avatar.initial);
        if avatar.is_host {
            badge.push('♛');
        }
        let badge = if avatar.is_current {
            badge.black().on_bright_cyan().bold().to_string()
        } else {
            badge.bright_white().to_string()
        };
        parts.push(badge);
    }
    if strip.overflow > 0 {
        parts.push(format!("+{}", strip.overflow).dimmed().to_string());
    }
    parts.join(" ")
}

// ---------------------------------------------------------------------------
// Output panel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum OutputView<'a> {
    Running,
    Empty,
    Failed { error: &'a str, elapsed_ms: f64 },
    Succeeded { output: &'a str, elapsed_ms: f64 },
}

pub fn output_view(result: Option<&ExecutionResult>, is_executing: bool) -> OutputView<'_> {
    if is_executing {
        return OutputView::Running;
    }
    match result {
        None => OutputView::Empty,
        Some(r) => match &r.error {
            Some(error) => OutputView::Failed {
                error,
                elapsed_ms: r.execution_time_ms,
            },
            None => OutputView::Succeeded {
                output: &r.output,
                elapsed_ms: r.execution_time_ms,
            },
        },
    }
}

pub fn render_output(result: Option<&ExecutionResult>, is_executing: bool) -> String {
    match output_view(result, is_executing) {
        OutputView::Running => RUNNING_TEXT.bright_blue().to_string(),
        OutputView::Empty => EMPTY_OUTPUT_HINT.dimmed().to_string(),
        OutputView::Failed { error, elapsed_ms } => format!(
            "{} {}\n{}",
            "✗ failed".bright_red().bold(),
            format!("({:.0}ms)", elapsed_ms).dimmed(),
            error.red()
        ),
        OutputView::Succeeded { output, elapsed_ms } => format!(
            "{} {}\n{}",
            "✓ ok".bright_green().bold(),
            format!("({:.0}ms)", elapsed_ms).dimmed(),
            output
        ),
    }
}

// ---------------------------------------------------------------------------
// Header / share link
// ---------------------------------------------------------------------------

/// Link a candidate can open to join `session_id`.
pub fn share_link(base_url: &str, session_id: &str) -> String {
    format!("{}/interview/{}", base_url.trim_end_matches('/'), session_id)
}

pub fn render_header(session: &Session, current_id: Option<&str>) -> String {
    format!(
        "{}  {}  {}  {}",
        session.title.bold(),
        format!("[{}]", session.language.label()).bright_magenta(),
        session.id.dimmed(),
        render_participants(&session.participants, current_id)
    )
}

/// Code listing with line numbers.
pub fn render_code(code: &str) -> String {
    let width = code.lines().count().max(1).to_string().len();
    code.lines()
        .enumerate()
        .map(|(i, line)| format!("{} {}", format!("{:>width$}", i + 1, width = width).dimmed(), line))
        .collect::<Vec<_>>()
        .join("\n")
}
