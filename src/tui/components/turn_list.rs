//! # TurnList Component
//!
//! Scrollable view of the transcript.
//!
//! ## Responsibilities
//!
//! - Lay out every turn with `TurnView::calculate_height`, caching heights
//! - Render only the turns near the viewport into a `ScrollView`
//! - Follow the latest turn after transcript changes, debounced
//! - Report unseen content when the user has scrolled away from the bottom
//!
//! ## Architecture
//!
//! `TurnList` is a transient component (created each frame) that wraps
//! `&'a mut TurnListState` (persistent state) and the `Transcript` (props).
//! Since `Component::render` takes `&mut self`, the layout cache and the
//! scroll state are updated during the render pass.
//!
//! ## Auto-follow
//!
//! The event loop forwards transcript change notifications to
//! `TurnListState::on_transcript_change`. While pinned to the bottom this
//! requests a follow; requests within the debounce window coalesce into a
//! single scroll. When the user has scrolled up nothing moves and the title
//! bar shows "↓ New" instead.

use std::time::{Duration, Instant};

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::transcript::Transcript;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::turn::TurnView;
use crate::tui::event::TuiEvent;

/// Coalesces follow requests so bursts of stage updates scroll once.
#[derive(Debug, Clone)]
pub struct FollowState {
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl FollowState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending_since: None,
        }
    }

    /// Ask for a follow. The first request opens the window; later requests
    /// inside it are absorbed.
    pub fn request(&mut self, now: Instant) {
        if self.pending_since.is_none() {
            self.pending_since = Some(now);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// True once the window has elapsed. Does not clear the request.
    pub fn due(&self, now: Instant) -> bool {
        self.pending_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.debounce)
    }

    /// Consume a due request.
    pub fn take_due(&mut self, now: Instant) -> bool {
        let due = self.due(now);
        if due {
            self.pending_since = None;
        }
        due
    }

    pub fn cancel(&mut self) {
        self.pending_since = None;
    }
}

/// Layout and scroll state for the turn list.
/// Must be persisted in the parent TuiState.
pub struct TurnListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, follow the latest turn on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    pub follow: FollowState,
    /// Content changed while the user was scrolled away from the bottom
    unseen: bool,
}

impl TurnListState {
    pub fn new(follow_debounce: Duration) -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
            follow: FollowState::new(follow_debounce),
            unseen: false,
        }
    }

    pub fn on_transcript_change(&mut self, now: Instant) {
        if self.stick_to_bottom {
            self.follow.request(now);
        } else {
            self.unseen = true;
        }
    }

    pub fn has_unseen_content(&self) -> bool {
        self.unseen && !self.stick_to_bottom
    }

    fn max_offset(&self) -> u16 {
        self.layout
            .total_height()
            .saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage following once the user has scrolled back to the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.pin_to_bottom();
        }
    }

    fn scroll_to_end(&mut self) {
        self.scroll_state.set_offset(Position {
            x: 0,
            y: self.max_offset(),
        });
    }

    fn pin_to_bottom(&mut self) {
        self.stick_to_bottom = true;
        self.unseen = false;
        self.scroll_to_end();
    }

    fn unpin(&mut self) {
        self.stick_to_bottom = false;
        self.follow.cancel();
    }
}

impl EventHandler for TurnListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.unpin();
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.unpin();
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => self.pin_to_bottom(),
            _ => {}
        }
        None
    }
}

/// Scrollable transcript view.
/// Created fresh each frame with references to state and data.
pub struct TurnList<'a> {
    pub state: &'a mut TurnListState,
    pub transcript: &'a Transcript,
    pub spinner_frame: usize,
    pub now: Instant,
}

impl<'a> TurnList<'a> {
    pub fn new(
        state: &'a mut TurnListState,
        transcript: &'a Transcript,
        spinner_frame: usize,
        now: Instant,
    ) -> Self {
        Self {
            state,
            transcript,
            spinner_frame,
            now,
        }
    }
}

impl<'a> Component for TurnList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // scrollbar column
        let turns = self.transcript.turns();
        let open_turn = self.transcript.open_turn();

        // 1. Refresh layout from the first volatile turn onward
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(turns.len(), content_width, open_turn);
        layout.heights.truncate(reusable);
        for turn in turns.iter().skip(layout.heights.len()) {
            layout
                .heights
                .push(TurnView::calculate_height(turn, content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(turns.len(), content_width, open_turn);

        let total_height = self.state.layout.total_height();

        // 2. Scroll bookkeeping
        self.state.viewport_height = area.height;
        if self.state.stick_to_bottom && self.state.follow.take_due(self.now) {
            self.state.scroll_to_end();
        }
        self.state.clamp_scroll();

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible turns into the scroll view
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset = self.state.layout.top_of(visible_range.start);
        for i in visible_range {
            let height = self.state.layout.heights[i];
            let rect = Rect::new(0, y_offset, content_width, height);
            scroll_view.render_widget(TurnView::new(&turns[i], self.spinner_frame), rect);
            y_offset = y_offset.saturating_add(height);
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// Cached turn heights.
///
/// A closed turn never changes height at a given width, so only the open
/// turn (and whichever turn was open when the cache was last built, in case
/// it closed since) is measured again.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    turn_count: usize,
    content_width: u16,
    cached_open_turn: Option<usize>,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            turn_count: 0,
            content_width: 0,
            cached_open_turn: None,
        }
    }

    pub fn reusable_count(
        &self,
        turn_count: usize,
        content_width: u16,
        open_turn: Option<usize>,
    ) -> usize {
        if self.content_width != content_width || self.heights.is_empty() {
            return 0;
        }
        if turn_count < self.turn_count {
            return 0;
        }
        let volatile_from = [self.cached_open_turn, open_turn]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(self.turn_count);
        volatile_from.min(self.heights.len()).min(turn_count)
    }

    pub fn update_metadata(
        &mut self,
        turn_count: usize,
        content_width: u16,
        open_turn: Option<usize>,
    ) {
        self.turn_count = turn_count;
        self.content_width = content_width;
        self.cached_open_turn = open_turn;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    /// Canvas row where turn `index` starts.
    pub fn top_of(&self, index: usize) -> u16 {
        match index {
            0 => 0,
            i => self.prefix_heights.get(i - 1).copied().unwrap_or(0),
        }
    }

    pub fn visible_range(
        &self,
        scroll_offset: u16,
        viewport_height: u16,
    ) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::{Stage, StagePayload};
    use crate::core::transcript::StageUpdate;
    use crate::test_support::stage1_payload;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    const DEBOUNCE: Duration = Duration::from_millis(120);

    fn draw(state: &mut TurnListState, transcript: &Transcript, now: Instant, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, height)).unwrap();
        terminal
            .draw(|f| TurnList::new(state, transcript, 0, now).render(f, f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn conversation(questions: usize) -> Transcript {
        let mut transcript = Transcript::new();
        for i in 0..questions {
            transcript.append_user_turn(format!("question {i}"), None);
            let index = transcript.append_pending_assistant_turn();
            transcript
                .apply_stage_update(StageUpdate::resolved(
                    index,
                    StagePayload::One(stage1_payload()),
                    None,
                ))
                .unwrap();
        }
        transcript
    }

    #[test]
    fn follow_requests_coalesce_within_window() {
        let start = Instant::now();
        let mut follow = FollowState::new(DEBOUNCE);
        assert!(!follow.due(start));

        follow.request(start);
        follow.request(start + Duration::from_millis(100));
        assert!(follow.is_pending());
        assert!(!follow.take_due(start + Duration::from_millis(110)));
        assert!(follow.take_due(start + DEBOUNCE));
        assert!(!follow.is_pending());
    }

    #[test]
    fn change_while_scrolled_up_marks_unseen() {
        let now = Instant::now();
        let mut state = TurnListState::new(DEBOUNCE);
        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);

        state.on_transcript_change(now);
        assert!(state.has_unseen_content());
        assert!(!state.follow.is_pending());

        state.handle_event(&TuiEvent::ScrollToBottom);
        assert!(state.stick_to_bottom);
        assert!(!state.has_unseen_content());
    }

    #[test]
    fn change_while_pinned_requests_follow() {
        let mut state = TurnListState::new(DEBOUNCE);
        state.on_transcript_change(Instant::now());
        assert!(state.follow.is_pending());
        assert!(!state.has_unseen_content());
    }

    #[test]
    fn follow_scrolls_to_latest_after_debounce() {
        let transcript = conversation(4);
        let mut state = TurnListState::new(DEBOUNCE);
        let start = Instant::now();

        state.on_transcript_change(start);
        draw(&mut state, &transcript, start, 12);
        assert_eq!(state.scroll_state.offset().y, 0);
        assert!(state.follow.is_pending());

        let text = draw(&mut state, &transcript, start + DEBOUNCE, 12);
        assert!(state.scroll_state.offset().y > 0);
        assert!(!state.follow.is_pending());
        assert!(text.contains("Ownership replaces a GC."));
    }

    #[test]
    fn scroll_up_cancels_pending_follow() {
        let mut state = TurnListState::new(DEBOUNCE);
        state.on_transcript_change(Instant::now());
        state.handle_event(&TuiEvent::ScrollPageUp);
        assert!(!state.follow.is_pending());
    }

    #[test]
    fn layout_cache_reuses_closed_turns() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![3; 4];
        cache.update_metadata(4, 80, None);

        assert_eq!(cache.reusable_count(4, 80, None), 4);
        // new turns appended
        assert_eq!(cache.reusable_count(6, 80, Some(5)), 4);
        // width change
        assert_eq!(cache.reusable_count(4, 40, None), 0);
        // transcript shrank
        assert_eq!(cache.reusable_count(2, 80, None), 0);
    }

    #[test]
    fn layout_cache_remeasures_turn_that_just_closed() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![3, 5];
        cache.update_metadata(2, 80, Some(1));

        // still open
        assert_eq!(cache.reusable_count(2, 80, Some(1)), 1);
        // closed since the last frame
        assert_eq!(cache.reusable_count(2, 80, None), 1);
    }

    #[test]
    fn open_turn_height_is_refreshed_between_frames() {
        let mut transcript = Transcript::new();
        transcript.append_user_turn("hi".into(), None);
        let index = transcript.append_pending_assistant_turn();
        let mut state = TurnListState::new(DEBOUNCE);
        let now = Instant::now();

        draw(&mut state, &transcript, now, 40);
        let before = state.layout.heights[index];

        transcript
            .apply_stage_update(StageUpdate::started(index, Stage::One))
            .unwrap();
        transcript
            .apply_stage_update(StageUpdate::resolved(
                index,
                StagePayload::One(stage1_payload()),
                None,
            ))
            .unwrap();
        draw(&mut state, &transcript, now, 40);

        assert!(state.layout.heights[index] > before);
        assert_eq!(
            state.layout.total_height(),
            state.layout.heights.iter().sum::<u16>()
        );
    }

    #[test]
    fn visible_range_covers_viewport() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![10; 10];
        cache.rebuild_prefix_heights();

        let range = cache.visible_range(50, 10);
        assert!(range.contains(&5));
        assert!(!range.contains(&0));
        assert_eq!(cache.top_of(5), 50);
    }
}
