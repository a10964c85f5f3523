//! # Application State
//!
//! Core business state for the council client. This module contains domain
//! logic only, no TUI-specific types. Presentation state lives in the `tui`
//! module.
//!
//! ```text
//! App
//! ├── backend: Arc<dyn CouncilBackend>  // transport to the council server
//! ├── base_url: String                  // where the backend lives
//! ├── transcript: Transcript            // turns + stage machines
//! ├── composer: Composer                // draft text + pending attachment
//! ├── busy: bool                        // a request is in flight
//! ├── status_message: String            // status bar text
//! ├── title: Option<String>             // conversation title from the backend
//! └── conversation_id: Option<String>   // created lazily on first send
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::core::composer::Composer;
use crate::core::config::ResolvedConfig;
use crate::core::transcript::Transcript;
use crate::transport::CouncilBackend;

pub const WELCOME_MESSAGE: &str = "Ask the council anything.";

pub struct App {
    pub backend: Arc<dyn CouncilBackend>,
    pub base_url: String,
    pub transcript: Transcript,
    pub composer: Composer,
    /// True from submit until the stream ends, fails or is cancelled.
    pub busy: bool,
    pub status_message: String,
    pub title: Option<String>,
    pub conversation_id: Option<String>,
}

impl App {
    pub fn new(backend: Arc<dyn CouncilBackend>, base_url: String) -> Self {
        Self {
            backend,
            base_url,
            transcript: Transcript::new(),
            composer: Composer::new(),
            busy: false,
            status_message: String::from(WELCOME_MESSAGE),
            title: None,
            conversation_id: None,
        }
    }

    pub fn from_config(backend: Arc<dyn CouncilBackend>, config: &ResolvedConfig) -> Self {
        let mut app = Self::new(backend, config.base_url.clone());
        app.conversation_id = config.conversation_id.clone();
        app
    }

    /// Whether the composer would accept a plain confirm right now.
    pub fn can_submit(&self) -> bool {
        self.composer.submit_eligible(self.busy)
    }
}
