use ratatui::style::Color;
use ratatui::text::Text;

use super::{BODY_FG, append_section, model_header, note};
use crate::core::stage::Stage1Result;
use crate::tui::markdown;

pub const NO_RESPONSES: &str = "No responses received.";

/// One section per council member: the model id, then its answer.
pub fn render(result: &Stage1Result) -> Text<'static> {
    if result.is_empty() {
        return Text::from(note(NO_RESPONSES));
    }

    let mut text = Text::default();
    for response in result {
        let mut section = Text::from(model_header(&response.model, Color::Cyan));
        section
            .lines
            .extend(markdown::render(&response.response, BODY_FG).lines);
        append_section(&mut text, section);
    }
    text
}
