//! Theme and Colors
//!
//! The chat palette: green for the user, magenta for the bot, dim gray for
//! chrome and pending replies, red for failures.

use ratatui::style::{Color, Modifier, Style};

use crate::display::DisplayRole;

// ============================================================================
// Message Colors
// ============================================================================

/// User input green
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// Bot replies, the signature magenta
pub const BOT_MAGENTA: Color = Color::Magenta;

/// Reply on its way - soft blue
pub const WAITING_BLUE: Color = Color::Rgb(150, 180, 255);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

// ============================================================================
// UI Colors
// ============================================================================

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Staged files indicator
pub const ATTACHMENT_YELLOW: Color = Color::Rgb(255, 223, 128);

/// Style for a transcript line
pub fn message_style(role: Option<DisplayRole>) -> Style {
    match role {
        Some(DisplayRole::User) => Style::default().fg(USER_GREEN),
        Some(DisplayRole::Bot) => Style::default().fg(BOT_MAGENTA),
        Some(DisplayRole::Waiting) => Style::default()
            .fg(WAITING_BLUE)
            .add_modifier(Modifier::ITALIC),
        Some(DisplayRole::Failed) => Style::default().fg(DIM_GRAY).add_modifier(Modifier::DIM),
        None => Style::default(),
    }
}
