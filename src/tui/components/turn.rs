use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::stage::{Stage, StageState};
use crate::core::turn::{AssistantTurn, Turn, UserTurn};
use crate::tui::component::Component;
use crate::tui::components::stage::{append_section, note, stage1, stage2, stage3};

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub const WAITING: &str = "Waiting for the council...";
pub const INTERRUPTED_BEFORE_START: &str = "Interrupted before the council started.";

/// Renders one transcript turn inside a bordered box.
///
/// Transient: built each frame by `TurnList` for the turns in view.
/// Assistant turns show their stages in order. A pending stage takes no space,
/// a loading stage is a spinner line, a resolved stage is its renderer's output.
#[derive(Clone, Copy)]
pub struct TurnView<'a> {
    pub turn: &'a Turn,
    pub spinner_frame: usize,
}

impl<'a> TurnView<'a> {
    pub fn new(turn: &'a Turn, spinner_frame: usize) -> Self {
        Self {
            turn,
            spinner_frame,
        }
    }

    /// Rows this turn occupies at `width`, borders included, without drawing it.
    ///
    /// Uses the same `Paragraph` the widget draws, so the prediction matches
    /// what ends up on screen.
    pub fn calculate_height(turn: &Turn, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let lines = paragraph(body(turn, 0)).line_count(content_width);
        let lines = u16::try_from(lines).unwrap_or(u16::MAX - VERTICAL_OVERHEAD);
        lines.max(1) + VERTICAL_OVERHEAD
    }
}

fn paragraph(text: Text<'static>) -> Paragraph<'static> {
    Paragraph::new(text).wrap(Wrap { trim: false })
}

fn body(turn: &Turn, spinner_frame: usize) -> Text<'static> {
    match turn {
        Turn::User(user) => user_body(user),
        Turn::Assistant(assistant) => assistant_body(assistant, spinner_frame),
    }
}

fn user_body(turn: &UserTurn) -> Text<'static> {
    let style = Style::default().fg(Color::Green);
    let mut text: Text<'static> = turn
        .text
        .trim_end()
        .lines()
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect::<Vec<_>>()
        .into();
    if let Some(attachment) = &turn.attachment {
        text.lines.push(Line::from(vec![
            Span::styled("📎 ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                attachment.filename.clone(),
                Style::default().fg(Color::Cyan),
            ),
        ]));
    }
    text
}

fn assistant_body(turn: &AssistantTurn, spinner_frame: usize) -> Text<'static> {
    let spinner = SPINNER[spinner_frame % SPINNER.len()];
    let mut text = Text::default();

    let sections = [
        stage_section(&turn.stage1, Stage::One, turn.interrupted, spinner, stage1::render),
        stage_section(&turn.stage2, Stage::Two, turn.interrupted, spinner, |r| {
            stage2::render(r, turn.metadata.as_ref())
        }),
        stage_section(&turn.stage3, Stage::Three, turn.interrupted, spinner, stage3::render),
    ];
    for section in sections.into_iter().flatten() {
        append_section(&mut text, section);
    }

    if text.lines.is_empty() {
        let placeholder = if turn.interrupted {
            INTERRUPTED_BEFORE_START
        } else {
            WAITING
        };
        text.lines.push(note(placeholder));
    }
    text
}

fn stage_section<T>(
    state: &StageState<T>,
    stage: Stage,
    interrupted: bool,
    spinner: &str,
    render: impl FnOnce(&T) -> Text<'static>,
) -> Option<Text<'static>> {
    match state {
        StageState::Pending => None,
        StageState::Loading if interrupted => Some(Text::from(note(&format!(
            "{} interrupted",
            stage.title()
        )))),
        StageState::Loading => Some(Text::from(Line::from(vec![
            Span::styled(format!("{spinner} "), Style::default().fg(Color::Yellow)),
            Span::styled(stage.loading_label(), Style::default().fg(Color::Yellow)),
        ]))),
        StageState::Resolved(result) => {
            let mut section = Text::from(Line::from(Span::styled(
                stage.title(),
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )));
            section.lines.extend(render(result).lines);
            Some(section)
        }
    }
}

impl<'a> Widget for TurnView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (role, color) = match self.turn {
            Turn::User(_) => ("you", Color::Green),
            Turn::Assistant(_) => ("council", Color::Blue),
        };
        let mut border_style = Style::default().fg(color);
        if !self.turn.is_open() {
            border_style = border_style.add_modifier(Modifier::DIM);
        }

        let block = Block::bordered()
            .title(role)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        let inner = block.inner(area);
        block.render(area, buf);

        paragraph(body(self.turn, self.spinner_frame)).render(inner, buf);
    }
}

impl<'a> Component for TurnView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::StagePayload;
    use crate::core::transcript::{StageUpdate, Transcript};
    use crate::core::turn::FileRef;
    use crate::test_support::{stage1_payload, synthesis};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn user(text: &str, attachment: Option<&str>) -> Turn {
        Turn::User(UserTurn {
            text: text.to_string(),
            attachment: attachment.map(|name| FileRef {
                path: format!("/tmp/{name}").into(),
                filename: name.to_string(),
            }),
        })
    }

    fn screen(turn: &Turn, width: u16) -> String {
        let height = TurnView::calculate_height(turn, width);
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| f.render_widget(TurnView::new(turn, 0), f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn user_turn_height_counts_lines_and_attachment() {
        assert_eq!(TurnView::calculate_height(&user("Hello", None), 80), 3);
        assert_eq!(
            TurnView::calculate_height(&user("Hello\nworld", Some("a.pdf")), 80),
            5
        );
    }

    #[test]
    fn height_wraps_long_text() {
        // 10 content columns at width 14
        assert_eq!(TurnView::calculate_height(&user("abcdefghijklmno", None), 14), 4);
    }

    #[test]
    fn zero_width_is_degenerate() {
        assert_eq!(TurnView::calculate_height(&user("Hello", None), 0), 1);
    }

    #[test]
    fn pending_turn_shows_waiting() {
        let turn = Turn::Assistant(AssistantTurn::new());
        assert_eq!(TurnView::calculate_height(&turn, 80), 3);
        assert!(screen(&turn, 80).contains(WAITING));
    }

    #[test]
    fn loading_stage_shows_label() {
        let mut transcript = Transcript::new();
        let index = transcript.append_pending_assistant_turn();
        transcript
            .apply_stage_update(StageUpdate::started(index, Stage::One))
            .unwrap();

        let text = screen(&transcript.turns()[index], 80);
        assert!(text.contains(Stage::One.loading_label()));
        assert!(!text.contains(WAITING));
    }

    #[test]
    fn stages_render_in_order_while_overlapping() {
        let mut transcript = Transcript::new();
        let index = transcript.append_pending_assistant_turn();
        transcript
            .apply_stage_update(StageUpdate::started(index, Stage::One))
            .unwrap();
        transcript
            .apply_stage_update(StageUpdate::started(index, Stage::Two))
            .unwrap();
        transcript
            .apply_stage_update(StageUpdate::resolved(
                index,
                StagePayload::One(stage1_payload()),
                None,
            ))
            .unwrap();

        let text = screen(&transcript.turns()[index], 100);
        let stage1_at = text.find(Stage::One.title()).unwrap();
        let stage2_at = text.find(Stage::Two.loading_label()).unwrap();
        assert!(stage1_at < stage2_at);
        assert!(text.contains("openai/gpt-5.1"));
        assert!(!text.contains(Stage::Three.loading_label()));
    }

    #[test]
    fn interrupted_loading_stage_is_marked() {
        let mut transcript = Transcript::new();
        let index = transcript.append_pending_assistant_turn();
        transcript
            .apply_stage_update(StageUpdate::started(index, Stage::One))
            .unwrap();
        transcript.interrupt_open_turn();

        let text = screen(&transcript.turns()[index], 80);
        assert!(text.contains("Stage 1: Individual Responses interrupted"));
        assert!(!text.contains(Stage::One.loading_label()));
    }

    #[test]
    fn interrupted_before_start_has_placeholder() {
        let mut transcript = Transcript::new();
        let index = transcript.append_pending_assistant_turn();
        transcript.interrupt_open_turn();
        assert!(screen(&transcript.turns()[index], 80).contains(INTERRUPTED_BEFORE_START));
    }

    #[test]
    fn resolved_final_answer_is_shown() {
        let mut transcript = Transcript::new();
        let index = transcript.append_pending_assistant_turn();
        for update in [
            StageUpdate::resolved(index, StagePayload::One(stage1_payload()), None),
            StageUpdate::started(index, Stage::Two),
            StageUpdate::started(index, Stage::Three),
            StageUpdate::resolved(index, StagePayload::Three(synthesis("All agree.")), None),
        ] {
            transcript.apply_stage_update(update).unwrap();
        }

        let text = screen(&transcript.turns()[index], 80);
        assert!(text.contains(Stage::Three.title()));
        assert!(text.contains("All agree."));
    }
}
