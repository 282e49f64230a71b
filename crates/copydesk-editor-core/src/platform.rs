//! Host and platform abstraction traits.
//!
//! These define everything the editor needs from the application embedding
//! it. A browser build would implement them over DOM APIs; the CLI and the
//! tests implement them over plain buffers.

use crate::error::ClipboardError;
use crate::types::Notice;

/// Callbacks into the application that owns the content string.
pub trait EditorHost {
    /// New plain-text content, delivered when fullscreen editing closes.
    fn on_change(&mut self, content: &str);

    /// Explicit save gesture (Ctrl/Cmd+S).
    fn on_save(&mut self) {}

    /// Suppress or restore page scrolling behind the fullscreen editor.
    fn set_scroll_locked(&mut self, _locked: bool) {}

    /// Show a transient message to the user.
    fn notify(&mut self, _notice: Notice) {}
}

/// Platform clipboard writes.
pub trait ClipboardPlatform {
    /// Write a plain text payload.
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// Write HTML together with its plain-text fallback as one clipboard item.
    fn write_html(&self, html: &str, plain_text: &str) -> Result<(), ClipboardError>;
}
