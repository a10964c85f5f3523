//! # Landing Page Component
//!
//! Shown in place of the turn list while the transcript is empty: a small
//! animated council, the welcome line and the key hints.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::core::state::WELCOME_MESSAGE;
use crate::tui::component::Component;

const SEATS: usize = 5;
const HINTS: &str = "Enter send  Shift+Enter newline  Ctrl+O attach PDF  Ctrl+C quit";

pub struct LandingPage<'a> {
    frame_index: usize,
    base_url: &'a str,
}

impl<'a> LandingPage<'a> {
    pub fn new(frame_index: usize, base_url: &'a str) -> Self {
        Self {
            frame_index,
            base_url,
        }
    }

    /// One seat lit at a time, sweeping left to right.
    fn seats(&self) -> Line<'static> {
        let active = self.frame_index / 3 % SEATS;
        let spans: Vec<Span> = (0..SEATS)
            .flat_map(|i| {
                let seat = if i == active {
                    Span::styled("◉", Style::default().fg(Color::Yellow))
                } else {
                    Span::styled("○", Style::default().fg(Color::DarkGray))
                };
                [seat, Span::raw(" ")]
            })
            .collect();
        Line::from(spans)
    }
}

impl Component for LandingPage<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            self.seats(),
            Line::default(),
            Line::from(Span::styled(
                WELCOME_MESSAGE,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("Council v{}", env!("CARGO_PKG_VERSION")),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                format!("Backend {}", self.base_url),
                Style::default().fg(Color::DarkGray),
            )),
            Line::default(),
            Line::from(Span::styled(HINTS, Style::default().fg(Color::DarkGray))),
        ];

        let height = u16::try_from(lines.len()).unwrap_or(area.height);
        let [centered] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);

        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center),
            centered,
        );
    }
}
