//! # InputBox Component
//!
//! Edits the composer draft and shows the pending attachment.
//!
//! ## Responsibilities
//!
//! - Capture text input and editing (backspace, delete, cursor movement, paste)
//! - Route Enter / Shift+Enter through `Composer::handle_confirm`
//! - Remove the pending attachment (Ctrl+X)
//! - Display the draft, the attachment chip and key hints
//!
//! ## State Management
//!
//! The draft and attachment live in the `Composer` (core state); the input box
//! borrows it for the frame. Cursor and internal scroll live in
//! `InputBoxState`, persisted by the TUI.

mod layout;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Padding, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};

use crate::core::composer::{Composer, ConfirmKey, ConfirmOutcome, Submission};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use layout::{
    MAX_VISIBLE_LINES, TEXT_OFFSET_X, VERTICAL_OVERHEAD, cursor_position, inner_width,
    move_vertically, next_char_boundary, prev_char_boundary, rows,
};

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The composer handed off its draft (Enter pressed)
    Submitted(Submission),
    /// Draft text or cursor changed
    ContentChanged,
    /// The pending attachment was removed (Ctrl+X)
    AttachmentCleared,
}

/// Cursor and scroll tracking, persisted across frames.
#[derive(Debug, Clone)]
pub struct InputBoxState {
    /// Cursor position as byte offset in the draft
    cursor: usize,
    /// First visible row when the draft is taller than the box
    scroll_offset: u16,
    /// Area width from the last render (used for vertical movement)
    last_width: u16,
}

impl Default for InputBoxState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBoxState {
    const DEFAULT_WIDTH: u16 = 80;

    pub fn new() -> Self {
        Self {
            cursor: 0,
            scroll_offset: 0,
            last_width: Self::DEFAULT_WIDTH,
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.scroll_offset = 0;
    }
}

/// Text input component.
///
/// # Props
///
/// - `composer`: draft and attachment (from App state)
/// - `busy`: a request is in flight, so Enter does not submit
pub struct InputBox<'a> {
    pub composer: &'a mut Composer,
    pub state: &'a mut InputBoxState,
    pub busy: bool,
}

impl<'a> InputBox<'a> {
    pub fn new(composer: &'a mut Composer, state: &'a mut InputBoxState, busy: bool) -> Self {
        Self {
            composer,
            state,
            busy,
        }
    }

    /// Rows needed for the current draft, clamped to
    /// [1 + VERTICAL_OVERHEAD, MAX_VISIBLE_LINES + VERTICAL_OVERHEAD].
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let count = rows(self.composer.text(), inner_width(area_width)).len();
        let visible = u16::try_from(count)
            .unwrap_or(MAX_VISIBLE_LINES)
            .clamp(1, MAX_VISIBLE_LINES);
        visible + VERTICAL_OVERHEAD
    }

    /// Cursor clamped to the draft, which the composer may have changed.
    fn cursor(&self) -> usize {
        let text = self.composer.text();
        let pos = self.state.cursor.min(text.len());
        if text.is_char_boundary(pos) {
            pos
        } else {
            prev_char_boundary(text, pos)
        }
    }

    fn set_cursor(&mut self, pos: usize) -> Option<InputEvent> {
        self.state.cursor = pos;
        Some(InputEvent::ContentChanged)
    }

    fn insert(&mut self, text: &str) -> Option<InputEvent> {
        let pos = self.cursor();
        self.composer.text_mut().insert_str(pos, text);
        self.set_cursor(pos + text.len())
    }

    fn new_line(&mut self) -> Option<InputEvent> {
        let pos = self.cursor();
        if pos == self.composer.text().len() {
            self.composer.handle_confirm(ConfirmKey::Modified, self.busy);
            let end = self.composer.text().len();
            self.set_cursor(end)
        } else {
            self.insert("\n")
        }
    }

    fn submit(&mut self) -> Option<InputEvent> {
        match self.composer.handle_confirm(ConfirmKey::Plain, self.busy) {
            ConfirmOutcome::Submitted(submission) => {
                self.state.reset();
                Some(InputEvent::Submitted(submission))
            }
            ConfirmOutcome::NewlineInserted | ConfirmOutcome::Ignored => None,
        }
    }

    fn update_scroll_offset(&mut self, width: u16) {
        let text = self.composer.text();
        let all = rows(text, width);
        if all.len() <= usize::from(MAX_VISIBLE_LINES) {
            self.state.scroll_offset = 0;
            return;
        }
        let (row, _) = cursor_position(text, &all, self.cursor());
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        if row < self.state.scroll_offset {
            self.state.scroll_offset = row;
        } else if row >= self.state.scroll_offset + MAX_VISIBLE_LINES {
            self.state.scroll_offset = row.saturating_sub(MAX_VISIBLE_LINES - 1);
        }
    }

    fn bottom_title(&self) -> Line<'static> {
        match self.composer.attachment() {
            Some(attachment) => Line::from(vec![
                Span::styled(
                    format!(" 📎 {} ", attachment.filename),
                    Style::default().fg(Color::Black).bg(Color::Cyan),
                ),
                Span::styled(" Ctrl+X remove ", Style::default().fg(Color::DarkGray)),
            ]),
            None => Line::from(Span::styled(
                " Ctrl+O attach PDF ",
                Style::default().fg(Color::DarkGray),
            )),
        }
    }

    fn render_scrollbar(&self, frame: &mut Frame, area: Rect, total_rows: usize) {
        let visible = usize::from(MAX_VISIBLE_LINES);
        if total_rows <= visible {
            return;
        }
        // content_length is the max scroll position, not the row count
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(total_rows - visible)
            .position(usize::from(self.state.scroll_offset));
        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 1,
            width: 1,
            height: area.height.saturating_sub(2),
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

impl<'a> Component for InputBox<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.state.last_width = area.width;
        let width = inner_width(area.width);
        self.update_scroll_offset(width);

        let text = self.composer.text();
        let all = rows(text, width);
        let start = usize::from(self.state.scroll_offset);
        let visible: Vec<Line> = all
            .iter()
            .skip(start)
            .take(usize::from(MAX_VISIBLE_LINES))
            .map(|r| Line::raw(&text[r.start..r.end]))
            .collect();

        let border_style = if self.busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green)
        };
        let title = if self.busy {
            " Council is deliberating (Esc to cancel) "
        } else {
            " Ask the council "
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(Span::styled(title, border_style.add_modifier(Modifier::BOLD)))
            .title_bottom(self.bottom_title())
            .padding(Padding::horizontal(1));

        frame.render_widget(
            Paragraph::new(visible)
                .block(block)
                .style(Style::default().fg(Color::Green)),
            area,
        );
        self.render_scrollbar(frame, area, all.len());

        let (row, col) = cursor_position(text, &all, self.cursor());
        let visible_row = u16::try_from(row)
            .unwrap_or(u16::MAX)
            .saturating_sub(self.state.scroll_offset);
        // Trailing spaces may run past the edge; keep the cursor inside
        frame.set_cursor_position((
            area.x + TEXT_OFFSET_X + col.min(width),
            area.y + 1 + visible_row,
        ));
    }
}

impl<'a> EventHandler for InputBox<'a> {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        let pos = self.cursor();
        let text = self.composer.text();
        match event {
            TuiEvent::InputChar(c) => self.insert(c.encode_utf8(&mut [0; 4])),
            TuiEvent::Paste(pasted) => {
                // Terminals send CR for line breaks inside pastes
                let normalized = pasted.replace("\r\n", "\n").replace('\r', "\n");
                self.insert(&normalized)
            }
            TuiEvent::NewLine => self.new_line(),
            TuiEvent::Submit => self.submit(),
            TuiEvent::Backspace if pos > 0 => {
                let prev = prev_char_boundary(text, pos);
                self.composer.text_mut().drain(prev..pos);
                self.set_cursor(prev)
            }
            TuiEvent::Delete if pos < text.len() => {
                let next = next_char_boundary(text, pos);
                self.composer.text_mut().drain(pos..next);
                self.set_cursor(pos)
            }
            TuiEvent::CursorLeft if pos > 0 => {
                let prev = prev_char_boundary(text, pos);
                self.set_cursor(prev)
            }
            TuiEvent::CursorRight if pos < text.len() => {
                let next = next_char_boundary(text, pos);
                self.set_cursor(next)
            }
            TuiEvent::CursorHome => {
                let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
                (line_start != pos).then_some(line_start).and_then(|p| self.set_cursor(p))
            }
            TuiEvent::CursorEnd => {
                let line_end = text[pos..].find('\n').map(|i| pos + i).unwrap_or(text.len());
                (line_end != pos).then_some(line_end).and_then(|p| self.set_cursor(p))
            }
            TuiEvent::CursorUp | TuiEvent::CursorDown => {
                let direction = if *event == TuiEvent::CursorUp { -1 } else { 1 };
                let width = inner_width(self.state.last_width);
                move_vertically(text, pos, direction, width).and_then(|p| self.set_cursor(p))
            }
            TuiEvent::ClearAttachment if self.composer.attachment().is_some() => {
                self.composer.clear_attachment();
                Some(InputEvent::AttachmentCleared)
            }
            _ => None,
        }
    }
}
