//! # Attach Prompt Component
//!
//! Centered overlay for typing (or pasting / dropping) the path of a PDF to
//! attach. Opened with Ctrl+O, confirmed with Enter, dismissed with Esc.
//! Validation happens in the composer's attachment selector once the path is
//! confirmed; this overlay only collects it.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `AttachPromptState` lives in `TuiState` while the overlay is open
//! - `AttachPrompt` is created each frame with borrowed state

use std::path::PathBuf;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::tui::component::Component;
use crate::tui::event::TuiEvent;

const OVERLAY_HEIGHT: u16 = 3;

/// Events emitted by the attach prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachEvent {
    Confirm(PathBuf),
    Dismiss,
}

/// Persistent state for the attach prompt overlay.
#[derive(Debug, Clone, Default)]
pub struct AttachPromptState {
    pub path: String,
}

impl AttachPromptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key event, returning an AttachEvent if the overlay should close.
    pub fn handle_event(&mut self, event: &TuiEvent) -> Option<AttachEvent> {
        match event {
            TuiEvent::Escape => Some(AttachEvent::Dismiss),
            TuiEvent::Submit => {
                let path = normalize_path(&self.path)?;
                Some(AttachEvent::Confirm(path))
            }
            TuiEvent::InputChar(c) => {
                self.path.push(*c);
                None
            }
            TuiEvent::Paste(text) => {
                self.path.push_str(text.trim_end_matches(['\r', '\n']));
                None
            }
            TuiEvent::Backspace => {
                self.path.pop();
                None
            }
            _ => None,
        }
    }
}

/// Turn what the user typed into a path: trims whitespace, strips the quotes
/// terminals add around dropped files, and expands a leading `~`.
/// Returns `None` for an empty entry.
pub fn normalize_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    let unquoted = ['\'', '"']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed);
    if unquoted.is_empty() {
        return None;
    }

    if let Some(rest) = unquoted.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return Some(home.join(rest));
    }
    Some(PathBuf::from(unquoted))
}

/// Transient render wrapper for the attach prompt overlay.
pub struct AttachPrompt<'a> {
    state: &'a AttachPromptState,
}

impl<'a> AttachPrompt<'a> {
    pub fn new(state: &'a AttachPromptState) -> Self {
        Self { state }
    }
}

impl<'a> Component for AttachPrompt<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_row(70, OVERLAY_HEIGHT, area);
        frame.render_widget(Clear, overlay);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Attach PDF ")
            .title_bottom(Line::from(" Enter Attach  Esc Cancel ").centered())
            .padding(Padding::horizontal(1));
        let inner = block.inner(overlay);

        // Keep the tail of long paths visible
        let path = self.state.path.as_str();
        let available = usize::from(inner.width.saturating_sub(1));
        let shown = tail_fitting(path, available);

        let line = if path.is_empty() {
            Line::from(Span::styled(
                "/path/to/document.pdf",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(shown)
        };
        frame.render_widget(Paragraph::new(line).block(block), overlay);

        let col = u16::try_from(shown.width()).unwrap_or(inner.width);
        frame.set_cursor_position((inner.x + col.min(inner.width), inner.y));
    }
}

/// Longest suffix of `text` that fits in `width` columns.
fn tail_fitting(text: &str, width: usize) -> &str {
    let mut start = text.len();
    let mut used = 0;
    for (i, c) in text.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = i;
    }
    &text[start..]
}

/// A rect `percent_x` wide and `height` tall, centered in `outer`.
fn centered_row(percent_x: u16, height: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}
