//! # Transport
//!
//! Talks to the council backend and turns its event stream into values the
//! core understands. Nothing here touches the transcript directly; the TUI
//! forwards events into `core::action::update`.

pub mod backend;
pub mod client;
pub mod types;

pub use backend::{CouncilBackend, TransportError};
pub use client::{CouncilClient, DEFAULT_BASE_URL, build_request};
pub use types::{AttachmentPayload, SendMessageRequest, SseDecoder, StreamEvent, TitleData};
