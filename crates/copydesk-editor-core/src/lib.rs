//! copydesk-editor-core: headless hybrid markdown/HTML content editor.
//!
//! This crate provides:
//! - `Surface` - arena document tree standing in for the editable DOM
//! - Selection capture/restore as child-index paths
//! - `DualHistory` - paired plain-text/HTML undo stack
//! - Markdown to HTML, sanitization and plain-text projection
//! - Toolbar command transforms with list repair
//! - `EditorSession` - the fullscreen lifecycle tying it all together

pub mod actions;
pub mod config;
pub mod error;
pub mod execute;
mod html;
mod list;
pub mod platform;
pub mod render;
pub mod sanitize;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod surface;
pub mod types;
pub mod undo;

pub use actions::{
    HeadingLevel, Key, KeyCombo, KeydownResult, Modifiers, ToolbarCommand, UnknownCommand,
};
pub use config::EditorConfig;
pub use error::{ClipboardError, SelectionError};
pub use execute::execute_command;
pub use platform::{ClipboardPlatform, EditorHost};
pub use render::{html_to_plain_text, inner_text, markdown_to_html, plain_text};
pub use sanitize::{HtmlPolicy, sanitize_html, trusted_html};
pub use scheduler::Scheduler;
pub use session::{EditorProps, EditorSession};
pub use smol_str::SmolStr;
pub use surface::{NodeId, Surface};
pub use types::{DomPoint, DomRange, EditorMode, Notice, NoticeKind, SelectionRecord};
pub use undo::{DualHistory, HistoryEntry};
