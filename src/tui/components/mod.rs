//! # TUI Components
//!
//! UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as fields:
//! - `TitleBar`: app name, conversation title, status, "↓ New" indicator
//! - `TurnView` (in `turn`): one transcript turn, including the stage sections
//! - `LandingPage`: shown while the transcript is empty
//! - `stage`: pure renderers from stage payloads to styled text
//!
//! ### Stateful Components (Event-Driven)
//!
//! Persistent state lives in `TuiState`; a transient wrapper borrows it each
//! frame:
//! - `InputBox` / `InputBoxState`: edits the composer draft
//! - `TurnList` / `TurnListState`: scrollable transcript with layout caching
//!   and debounced auto-follow
//! - `AttachPrompt` / `AttachPromptState`: path entry overlay
//!
//! Each file holds the component's state, events, rendering, event handling
//! and tests.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs            (this file)
//! ├── title_bar.rs      (top status bar)
//! ├── landing.rs        (empty-transcript screen)
//! ├── turn.rs           (single turn renderer)
//! ├── turn_list.rs      (scrollable turn container)
//! ├── attach_prompt.rs  (attachment path overlay)
//! ├── stage/            (stage 1/2/3 renderers)
//! └── input_box/        (draft editor and row layout)
//! ```

pub mod attach_prompt;
pub mod input_box;
pub mod landing;
pub mod stage;
mod title_bar;
pub mod turn;
pub mod turn_list;

pub use attach_prompt::{AttachEvent, AttachPrompt, AttachPromptState};
pub use input_box::{InputBox, InputBoxState, InputEvent};
pub use landing::LandingPage;
pub use title_bar::TitleBar;
pub use turn_list::{TurnList, TurnListState};
