//! # Composer
//!
//! Draft text plus at most one pending PDF attachment, and the rules for
//! turning them into a `Submission`.
//!
//! ```text
//! Composer
//! ├── draft: String
//! └── selector: AttachmentSelector
//!     ├── control: FileControl            // last value written by the file picker
//!     └── attachment: Option<PendingAttachment>
//! ```
//!
//! The composer hands the draft off and forgets it. Whether the send succeeds
//! is the caller's business.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::core::turn::FileRef;

/// Extension every attachment must carry (compared case-insensitively).
pub const ACCEPTED_EXTENSION: &str = ".pdf";

pub type PendingAttachment = FileRef;

/// A file the selector refused to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub filename: String,
}

impl fmt::Display for RejectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a PDF file", self.filename)
    }
}

impl std::error::Error for RejectedFile {}

/// Accepts iff the case-folded name ends with `.pdf`.
pub fn validate(filename: &str) -> Result<(), RejectedFile> {
    if filename.to_lowercase().ends_with(ACCEPTED_EXTENSION) {
        Ok(())
    } else {
        Err(RejectedFile {
            filename: filename.to_string(),
        })
    }
}

/// The value held by the file-picker control. Cleared after a rejection so
/// choosing the same file again is seen as a fresh selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileControl {
    value: Option<PathBuf>,
}

impl FileControl {
    pub fn value(&self) -> Option<&Path> {
        self.value.as_deref()
    }

    fn set(&mut self, path: PathBuf) {
        self.value = Some(path);
    }

    fn reset(&mut self) {
        self.value = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttachmentSelector {
    control: FileControl,
    attachment: Option<PendingAttachment>,
}

impl AttachmentSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachment(&self) -> Option<&PendingAttachment> {
        self.attachment.as_ref()
    }

    pub fn control(&self) -> &FileControl {
        &self.control
    }

    /// Validates `path` and, on success, replaces any held attachment.
    /// A rejected file leaves the held attachment alone and resets the control.
    pub fn select(&mut self, path: impl Into<PathBuf>) -> Result<&PendingAttachment, RejectedFile> {
        let path = path.into();
        self.control.set(path.clone());

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        if let Err(rejected) = validate(&filename) {
            info!("Rejected attachment: {}", rejected.filename);
            self.control.reset();
            return Err(rejected);
        }

        debug!("Attachment selected: {}", path.display());
        Ok(self.attachment.insert(PendingAttachment { path, filename }))
    }

    pub fn clear(&mut self) {
        self.attachment = None;
        self.control.reset();
    }

    fn take(&mut self) -> Option<PendingAttachment> {
        self.control.reset();
        self.attachment.take()
    }
}

/// What the composer hands to the send handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    pub attachment: Option<PendingAttachment>,
}

/// The confirm key, with or without a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmKey {
    /// Enter on its own: submit.
    Plain,
    /// Enter with Shift (or Alt): line break.
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The draft was handed off; the newline the key would have typed is dropped.
    Submitted(Submission),
    NewlineInserted,
    /// Plain confirm while nothing could be submitted.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
    selector: AttachmentSelector,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.draft
    }

    /// Mutable access for editors that manage their own cursor.
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn attachment(&self) -> Option<&PendingAttachment> {
        self.selector.attachment()
    }

    pub fn selector(&self) -> &AttachmentSelector {
        &self.selector
    }

    pub fn select_attachment(
        &mut self,
        path: impl Into<PathBuf>,
    ) -> Result<&PendingAttachment, RejectedFile> {
        self.selector.select(path)
    }

    pub fn clear_attachment(&mut self) {
        self.selector.clear();
    }

    pub fn submit_eligible(&self, busy: bool) -> bool {
        let has_content = !self.draft.trim().is_empty() || self.selector.attachment().is_some();
        has_content && !busy
    }

    /// Hands the draft off and resets the composer. Returns `None` without
    /// touching anything when not eligible.
    pub fn submit(&mut self, busy: bool) -> Option<Submission> {
        if !self.submit_eligible(busy) {
            return None;
        }
        let submission = Submission {
            text: std::mem::take(&mut self.draft),
            attachment: self.selector.take(),
        };
        info!(
            "Submitting draft ({} bytes, attachment: {})",
            submission.text.len(),
            submission.attachment.is_some()
        );
        Some(submission)
    }

    pub fn handle_confirm(&mut self, key: ConfirmKey, busy: bool) -> ConfirmOutcome {
        match key {
            ConfirmKey::Plain => match self.submit(busy) {
                Some(submission) => ConfirmOutcome::Submitted(submission),
                None => ConfirmOutcome::Ignored,
            },
            ConfirmKey::Modified => {
                self.draft.push('\n');
                ConfirmOutcome::NewlineInserted
            }
        }
    }
}
