//! Error types for editor operations.
//!
//! None of these escape an [`EditorSession`](crate::EditorSession): the session
//! logs them and degrades to a no-op (or a toast, for clipboard failures).
//! They exist so the lower-level functions report failure as a value.

use thiserror::Error;

/// Failure to map a stored selection path back onto the surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    /// A path step pointed past the end of a node's children.
    #[error("path index {index} out of range at depth {depth} (node has {len} children)")]
    PathOutOfRange {
        depth: usize,
        index: usize,
        len: usize,
    },

    /// The node is not attached beneath the surface root.
    #[error("node is not attached to the surface root")]
    Detached,
}

/// Clipboard write failures reported by a [`ClipboardPlatform`](crate::ClipboardPlatform).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClipboardError {
    /// The platform refused clipboard access.
    #[error("clipboard permission denied")]
    PermissionDenied,

    /// The platform has no clipboard API for this representation.
    #[error("clipboard not supported: {0}")]
    Unsupported(String),

    /// The write was attempted and failed.
    #[error("clipboard write failed: {0}")]
    Write(String),
}
