//! # TitleBar Component
//!
//! Top status bar: conversation title, status line and the "↓ New"
//! indicator when content arrived below the current scroll position.
//!
//! Purely presentational. All data arrives as props:
//! - `title`: conversation title from the backend (core state)
//! - `status_message`: status line (core state)
//! - `busy`: a request is in flight (core state)
//! - `has_unseen_content`: scroll indicator (TUI state)
//!
//! Segments are joined with " | " and the title is omitted until the backend
//! has generated one:
//!
//! 1. `"Council | Rust memory model | Consulting the council... | ↓ New"`
//! 2. `"Council | Ready"`
//! 3. `"Council"`

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

pub const APP_NAME: &str = "Council";

/// Top status bar component.
pub struct TitleBar<'a> {
    pub title: Option<&'a str>,
    pub status_message: &'a str,
    pub busy: bool,
    pub has_unseen_content: bool,
}

impl<'a> TitleBar<'a> {
    pub fn new(
        title: Option<&'a str>,
        status_message: &'a str,
        busy: bool,
        has_unseen_content: bool,
    ) -> Self {
        Self {
            title,
            status_message,
            busy,
            has_unseen_content,
        }
    }

    fn line(&self) -> Line<'a> {
        let separator = || Span::styled(" | ", Style::default().fg(Color::DarkGray));
        let mut spans = vec![Span::styled(
            APP_NAME,
            Style::default().add_modifier(Modifier::BOLD),
        )];

        if let Some(title) = self.title.filter(|t| !t.is_empty()) {
            spans.push(separator());
            spans.push(Span::raw(title));
        }
        if !self.status_message.is_empty() {
            let style = if self.busy {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            spans.push(separator());
            spans.push(Span::styled(self.status_message, style));
        }
        if self.has_unseen_content {
            spans.push(separator());
            spans.push(Span::styled(
                "↓ New",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));
        }
        Line::from(spans)
    }
}

impl<'a> Component for TitleBar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render(mut title_bar: TitleBar) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 1)).unwrap();
        terminal.draw(|f| title_bar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn full_bar() {
        let text = render(TitleBar::new(
            Some("Rust memory model"),
            "Consulting the council...",
            true,
            true,
        ));
        assert!(text.starts_with("Council | Rust memory model | Consulting the council... | ↓ New"));
    }

    #[test]
    fn status_without_title() {
        let text = render(TitleBar::new(None, "Ready", false, false));
        assert!(text.starts_with("Council | Ready"));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn bare_name_when_nothing_to_show() {
        let text = render(TitleBar::new(Some(""), "", false, false));
        assert_eq!(text.trim_end(), "Council");
    }
}
