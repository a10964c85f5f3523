//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Animating** (landing page, council deliberating, follow pending):
//!   draws every ~80ms so spinners move and the debounced follow fires.
//! - **Idle**: sleeps up to 500ms, only redraws on events or terminal resize.
//!
//! ## Requests
//!
//! Each submission runs on two tokio tasks: one drives the transport, the
//! other forwards its `StreamEvent`s as `Action`s over a std mpsc channel
//! drained between frames. Every action is tagged with the generation of the
//! request that produced it; after Esc or a new submission, stragglers from
//! an older generation are dropped.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod component;
mod components;
mod event;
pub mod markdown;
mod ui;

use std::cell::Cell;
use std::io::stdout;
use std::rc::Rc;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};
use tokio::task::AbortHandle;

use crate::core::action::{Action, Effect, update};
use crate::core::composer::Submission;
use crate::core::config::ResolvedConfig;
use crate::core::state::App;
use crate::transport::{CouncilBackend, CouncilClient, StreamEvent, build_request};
use crate::tui::component::EventHandler;
use crate::tui::components::{
    AttachEvent, AttachPromptState, InputBox, InputBoxState, InputEvent, TurnListState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Actions from background tasks, tagged with their request generation.
type Tagged = (u64, Action);

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub turn_list: TurnListState,
    pub input_box: InputBoxState,
    /// Attach prompt overlay (None = hidden)
    pub attach_prompt: Option<AttachPromptState>,
}

impl TuiState {
    pub fn new(follow_debounce: Duration) -> Self {
        Self {
            turn_list: TurnListState::new(follow_debounce),
            input_box: InputBoxState::new(),
            attach_prompt: None,
        }
    }
}

/// The request currently in flight, if any.
#[derive(Default)]
struct Requests {
    generation: u64,
    handles: Vec<AbortHandle>,
}

impl Requests {
    fn start(&mut self) -> u64 {
        self.abort();
        self.generation += 1;
        self.generation
    }

    fn abort(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    /// Abort and make any queued actions from the aborted request stale.
    fn cancel(&mut self) {
        self.abort();
        self.generation += 1;
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol allows Shift+Enter detection; terminals
        // without it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!(
            "Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)"
        );
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let client = CouncilClient::new(
        config.base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )
    .map_err(std::io::Error::other)?;
    let backend: Arc<dyn CouncilBackend> = Arc::new(client);
    info!("Using {} backend at {}", backend.name(), config.base_url);

    let mut app = App::from_config(backend, &config);
    let mut tui = TuiState::new(Duration::from_millis(config.follow_debounce_ms));

    // Set by the transcript after every mutation; drained once per loop
    let transcript_changed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&transcript_changed);
    app.transcript.subscribe(move |change| {
        debug!("Transcript changed: {:?}", change);
        flag.set(true);
    });

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let (tx, rx) = mpsc::channel::<Tagged>();
    let mut requests = Requests::default();

    let start_time = Instant::now();
    let mut needs_redraw = true;

    'main: loop {
        if transcript_changed.replace(false) {
            tui.turn_list.on_transcript_change(Instant::now());
        }

        let animating =
            app.busy || app.transcript.is_empty() || tui.turn_list.follow.is_pending();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &mut app, &mut tui, spinner_frame, Instant::now()))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if handle_event(event, &mut app, &mut tui, &mut requests, &tx) == Effect::Quit {
                break 'main;
            }
        }

        // Background actions (stream events)
        while let Ok((generation, action)) = rx.try_recv() {
            if !requests.is_current(generation) {
                debug!("Dropping stale action from request {}: {:?}", generation, action);
                continue;
            }
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            if let Effect::SpawnRequest { .. } | Effect::Quit = update(&mut app, action) {
                warn!("Unexpected effect from background action");
            }
        }
    }

    ratatui::restore();
    info!("Council shutting down");
    Ok(())
}

/// Routes one terminal event. Returns the effect of any core action it caused.
fn handle_event(
    event: TuiEvent,
    app: &mut App,
    tui: &mut TuiState,
    requests: &mut Requests,
    tx: &mpsc::Sender<Tagged>,
) -> Effect {
    match event {
        TuiEvent::Resize => Effect::None,
        TuiEvent::ForceQuit => {
            requests.cancel();
            update(app, Action::Quit)
        }
        // Overlay takes every other key while open
        _ if tui.attach_prompt.is_some() => {
            let Some(prompt) = tui.attach_prompt.as_mut() else {
                return Effect::None;
            };
            match prompt.handle_event(&event) {
                Some(AttachEvent::Confirm(path)) => {
                    tui.attach_prompt = None;
                    match app.composer.select_attachment(path) {
                        Ok(attachment) => {
                            info!("Attached {}", attachment.filename);
                            app.status_message = format!("Attached {}", attachment.filename);
                            Effect::None
                        }
                        Err(rejected) => update(app, Action::AttachmentRejected(rejected)),
                    }
                }
                Some(AttachEvent::Dismiss) => {
                    tui.attach_prompt = None;
                    Effect::None
                }
                None => Effect::None,
            }
        }
        TuiEvent::OpenAttachPrompt => {
            tui.attach_prompt = Some(AttachPromptState::new());
            Effect::None
        }
        TuiEvent::Escape => {
            if app.busy {
                requests.cancel();
            }
            update(app, Action::CancelGeneration)
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.turn_list.handle_event(&event);
            Effect::None
        }
        _ => {
            let mut input_box = InputBox::new(&mut app.composer, &mut tui.input_box, app.busy);
            match input_box.handle_event(&event) {
                Some(InputEvent::Submitted(submission)) => {
                    match update(app, Action::Submit(submission)) {
                        Effect::SpawnRequest {
                            turn_index,
                            submission,
                        } => {
                            let generation = requests.start();
                            requests.handles =
                                spawn_request(app, turn_index, submission, generation, tx.clone());
                            Effect::None
                        }
                        effect => effect,
                    }
                }
                Some(InputEvent::AttachmentCleared) => {
                    app.status_message = "Attachment removed".to_string();
                    Effect::None
                }
                Some(InputEvent::ContentChanged) | None => Effect::None,
            }
        }
    }
}

fn spawn_request(
    app: &App,
    turn_index: usize,
    submission: Submission,
    generation: u64,
    tx: mpsc::Sender<Tagged>,
) -> Vec<AbortHandle> {
    info!("Spawning council request for turn {} (generation {})", turn_index, generation);

    let backend = Arc::clone(&app.backend);
    let conversation_id = app.conversation_id.clone();
    let (event_tx, mut event_rx) = tokio::sync::mpsc::channel::<StreamEvent>(64);
    let tx_stream = tx.clone();

    let stream_handle = tokio::spawn(async move {
        let error_tx = event_tx.clone();
        let result = async {
            let conversation_id = match conversation_id {
                Some(id) => id,
                None => {
                    let id = backend.create_conversation().await?;
                    if tx_stream
                        .send((generation, Action::ConversationCreated(id.clone())))
                        .is_err()
                    {
                        warn!("Failed to send ConversationCreated: receiver dropped");
                    }
                    id
                }
            };
            let request = build_request(&submission).await?;
            backend
                .send_message_stream(&conversation_id, &request, event_tx)
                .await
        }
        .await;

        // Errors go through the event channel so they stay ordered after
        // whatever the stream already delivered
        if let Err(e) = result {
            warn!("Council request failed: {}", e);
            let event = StreamEvent::Error {
                message: e.to_string(),
            };
            if error_tx.send(event).await.is_err() {
                warn!("Failed to report request error: forwarder gone");
            }
        }
    });

    let forward_handle = tokio::spawn(async move {
        let mut forwarded = 0usize;
        let mut finished = false;
        while let Some(event) = event_rx.recv().await {
            forwarded += 1;
            let terminal = matches!(event, StreamEvent::Complete | StreamEvent::Error { .. });
            let action = Action::from_stream_event(event, turn_index);
            if tx.send((generation, action)).is_err() {
                warn!("Failed to forward stream action: receiver dropped");
                return;
            }
            if terminal {
                finished = true;
            }
        }

        info!("Stream closed after {} events", forwarded);
        // Fallback: the stream ended without a complete/error event
        if !finished && tx.send((generation, Action::ResponseDone)).is_err() {
            warn!("Failed to send ResponseDone: receiver dropped");
        }
    });

    vec![stream_handle.abort_handle(), forward_handle.abort_handle()]
}
