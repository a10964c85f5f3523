//! # Stage Renderers
//!
//! Pure functions from a resolved stage payload to styled text. They know
//! nothing about loading, turns or layout; `TurnView` decides whether a
//! stage region exists at all and these only fill it in.

pub mod stage1;
pub mod stage2;
pub mod stage3;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

/// Body text color for model output.
pub(crate) const BODY_FG: Color = Color::White;

/// Header line naming the model that produced a section.
pub(crate) fn model_header(model: &str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled("▸ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            model.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ])
}

pub(crate) fn note(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    ))
}

/// Appends `section` to `text`, with a blank line between sections.
pub(crate) fn append_section(text: &mut Text<'static>, section: Text<'static>) {
    if !text.lines.is_empty() {
        text.lines.push(Line::default());
    }
    text.lines.extend(section.lines);
}
