use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{AttachPrompt, InputBox, LandingPage, TitleBar, TurnList};

/// Lays out one frame: title bar, transcript (or the landing page while it is
/// empty), input box, and the attach prompt on top when open.
pub fn draw_ui(
    frame: &mut Frame,
    app: &mut App,
    tui: &mut TuiState,
    spinner_frame: usize,
    now: Instant,
) {
    use Constraint::{Length, Min};

    let mut input_box = InputBox::new(&mut app.composer, &mut tui.input_box, app.busy);
    let input_height = input_box.calculate_height(frame.area().width);
    let [title_area, main_area, input_area] =
        Layout::vertical([Length(1), Min(0), Length(input_height)]).areas(frame.area());

    if app.transcript.is_empty() {
        LandingPage::new(spinner_frame, &app.base_url).render(frame, main_area);
    } else {
        TurnList::new(&mut tui.turn_list, &app.transcript, spinner_frame, now)
            .render(frame, main_area);
    }

    TitleBar::new(
        app.title.as_deref(),
        &app.status_message,
        app.busy,
        tui.turn_list.has_unseen_content(),
    )
    .render(frame, title_area);

    input_box.render(frame, input_area);

    if let Some(prompt) = &tui.attach_prompt {
        AttachPrompt::new(prompt).render(frame, frame.area());
    }
}
