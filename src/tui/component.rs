use ratatui::Frame;
use ratatui::layout::Rect;

/// A UI element that draws itself into a region of the frame.
///
/// Props arrive as struct fields; persistent state is borrowed as
/// `&'a mut FooState` so the component can be rebuilt every frame.
/// `render` takes `&mut self` so caches (layout, scroll) can be updated
/// during the draw, like ratatui's `StatefulWidget`.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that reacts to terminal events.
pub trait EventHandler {
    /// What the component reports back to the event loop.
    type Event;

    /// Handle a low-level `TuiEvent` and optionally return a high-level event.
    fn handle_event(&mut self, event: &super::event::TuiEvent) -> Option<Self::Event>;
}
