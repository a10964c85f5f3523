use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use super::{BODY_FG, note};
use crate::core::stage::Stage3Result;
use crate::tui::markdown;

pub const NO_ANSWER: &str = "The chairman returned no answer.";

pub fn render(result: &Stage3Result) -> Text<'static> {
    let mut text = Text::from(Line::from(vec![
        Span::styled("Chairman: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            result.model.clone(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    ]));

    if result.response.trim().is_empty() {
        text.lines.push(note(NO_ANSWER));
    } else {
        text.lines
            .extend(markdown::render(&result.response, BODY_FG).lines);
    }
    text
}
