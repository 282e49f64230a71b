//! The editor session: one content field with its optional fullscreen
//! rich-editing surface.
//!
//! While closed, the host's content string is authoritative and the session
//! only holds a copy. Opening converts that string to sanitized HTML and
//! installs it into a fresh surface; from then on the surface is
//! authoritative until close hands its plain-text projection back.
//!
//! Every surface change goes through [`EditorSession::on_input`] (called
//! internally by the editing methods): capture selection, sanitize, reinstall
//! if the sanitizer changed anything, update the HTML state and arm a
//! debounced history capture.

use std::time::Duration;

use crate::actions::{Key, KeyCombo, KeydownResult, ToolbarCommand};
use crate::config::EditorConfig;
use crate::execute::{execute_command, normalize_range, point_node};
use crate::platform::{ClipboardPlatform, EditorHost};
use crate::render::{html_to_plain_text, inner_text, markdown_to_html, plain_text};
use crate::sanitize::HtmlPolicy;
use crate::scheduler::Scheduler;
use crate::selection::{self, end_point, point_at_char};
use crate::surface::{NodeId, Surface};
use crate::types::{DomPoint, DomRange, EditorMode, Notice, SelectionRecord};
use crate::undo::{DualHistory, HistoryEntry};

/// Initial properties supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorProps {
    /// Plain/markdown content.
    pub content: String,
    /// Hint shown while the content is empty.
    pub placeholder: String,
    /// Start in fullscreen mode.
    pub initial_fullscreen: bool,
}

impl EditorProps {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Work deferred on the session's virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    HistoryCapture,
}

pub struct EditorSession<H: EditorHost> {
    host: H,
    config: EditorConfig,
    policy: HtmlPolicy,
    mode: EditorMode,
    content: String,
    placeholder: String,
    surface: Surface,
    /// Last trusted HTML of the surface.
    html_state: String,
    history: DualHistory,
    scheduler: Scheduler<Deferred>,
    selection: Option<DomRange>,
    /// Selection as of the last edit or command, kept across blur.
    saved_selection: Option<SelectionRecord>,
    composing: bool,
    applying_history: bool,
}

impl<H: EditorHost> std::fmt::Debug for EditorSession<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("mode", &self.mode)
            .field("html_state", &self.html_state)
            .field("history_len", &self.history.len())
            .field("history_cursor", &self.history.cursor())
            .field("composing", &self.composing)
            .finish_non_exhaustive()
    }
}

impl<H: EditorHost> EditorSession<H> {
    pub fn new(props: EditorProps, host: H) -> Self {
        Self::with_config(props, host, EditorConfig::default())
    }

    pub fn with_config(props: EditorProps, host: H, config: EditorConfig) -> Self {
        let history = DualHistory::new(config.history_capacity);
        let mut session = Self {
            host,
            config,
            policy: HtmlPolicy::new(),
            mode: EditorMode::Closed,
            content: props.content,
            placeholder: props.placeholder,
            surface: Surface::new(),
            html_state: String::new(),
            history,
            scheduler: Scheduler::new(),
            selection: None,
            saved_selection: None,
            composing: false,
            applying_history: false,
        };
        if props.initial_fullscreen {
            session.open_fullscreen();
        }
        session
    }

    // === Accessors ===

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode == EditorMode::Open
    }

    /// The host-owned content as last handed in or out.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Whether the placeholder should be visible.
    pub fn show_placeholder(&self) -> bool {
        match self.mode {
            EditorMode::Closed => self.content.is_empty(),
            EditorMode::Open => self.surface.text_content(self.surface.root()).trim().is_empty(),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Direct access for hosts that mutate the surface themselves (as a
    /// browser does on input). Call [`on_input`](Self::on_input) afterwards.
    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// Trusted HTML of the surface as of the last sync.
    pub fn html(&self) -> &str {
        &self.html_state
    }

    /// Plain-text projection of the document.
    pub fn plain_text(&self) -> String {
        match self.mode {
            EditorMode::Open => plain_text(&self.surface, self.surface.root()),
            EditorMode::Closed => self.content.clone(),
        }
    }

    pub fn selection(&self) -> Option<DomRange> {
        self.selection
    }

    pub fn saved_selection(&self) -> Option<&SelectionRecord> {
        self.saved_selection.as_ref()
    }

    pub fn history(&self) -> &DualHistory {
        &self.history
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Whether a debounced history capture is waiting to fire.
    pub fn capture_pending(&self) -> bool {
        self.scheduler.is_pending(Deferred::HistoryCapture)
    }

    pub fn can_undo(&self) -> bool {
        self.is_open() && (self.history.can_undo() || self.capture_pending())
    }

    pub fn can_redo(&self) -> bool {
        self.is_open() && !self.capture_pending() && self.history.can_redo()
    }

    // === Lifecycle ===

    /// Host prop update. Ignored while open; the surface is authoritative then.
    pub fn set_content(&mut self, content: impl Into<String>) {
        if self.is_open() {
            tracing::debug!(target: "copydesk::session", "ignoring content update while open");
            return;
        }
        self.content = content.into();
    }

    /// Enter fullscreen rich editing.
    pub fn open_fullscreen(&mut self) {
        if self.is_open() {
            return;
        }
        let html = self.policy.trusted(&markdown_to_html(&self.content));
        self.surface = Surface::from_html(&html);
        self.html_state = self.surface.html();
        self.selection = Some(DomRange::caret(end_point(&self.surface, self.surface.root())));
        self.persist_selection();

        self.scheduler.cancel(Deferred::HistoryCapture);
        self.composing = false;
        self.history.clear();
        self.history
            .push(html_to_plain_text(&self.html_state), self.html_state.clone());

        self.mode = EditorMode::Open;
        self.host.set_scroll_locked(true);
        tracing::debug!(target: "copydesk::session", html = %self.html_state, "opened fullscreen");
    }

    /// Leave fullscreen, handing the plain-text projection to the host.
    pub fn close_fullscreen(&mut self) {
        if !self.is_open() {
            return;
        }
        self.scheduler.cancel(Deferred::HistoryCapture);
        let text = plain_text(&self.surface, self.surface.root());
        self.host.on_change(&text);
        self.content = text;
        self.host.set_scroll_locked(false);

        self.mode = EditorMode::Closed;
        self.surface = Surface::new();
        self.html_state.clear();
        self.history.clear();
        self.selection = None;
        self.saved_selection = None;
        self.composing = false;
        tracing::debug!(target: "copydesk::session", content = %self.content, "closed fullscreen");
    }

    /// Explicit save gesture.
    pub fn save(&mut self) {
        self.host.on_save();
    }

    /// Advance the session clock, running any deferred work that comes due.
    pub fn tick(&mut self, elapsed: Duration) {
        for task in self.scheduler.advance(elapsed) {
            match task {
                Deferred::HistoryCapture => self.capture_history(),
            }
        }
    }

    // === Sync ===

    /// Resynchronize after the surface changed.
    ///
    /// Skipped entirely during composition. The selection is captured before
    /// the sanitizer gets a chance to rewrite the surface, and the HTML state
    /// is updated before history capture is armed.
    pub fn on_input(&mut self) {
        if !self.is_open() || self.composing {
            return;
        }
        let root = self.surface.root();
        let record = selection::capture(&self.surface, root, self.selection.as_ref());
        let raw = self.surface.html();
        let trusted = self.policy.trusted(&raw);

        if trusted != raw {
            tracing::debug!(target: "copydesk::session", "sanitizer rewrote surface content");
            self.surface.set_inner_html(&trusted);
            self.selection = Some(self.restore_or_end(record.as_ref()));
        }

        if trusted != self.html_state {
            self.html_state = trusted;
            if !self.applying_history {
                self.scheduler
                    .schedule(Deferred::HistoryCapture, self.config.capture_delay());
                tracing::trace!(target: "copydesk::history", "armed history capture");
            }
        }
        self.persist_selection();
    }

    fn capture_history(&mut self) {
        if !self.is_open() {
            return;
        }
        let plain = html_to_plain_text(&self.html_state);
        self.history.push(plain, self.html_state.clone());
    }

    /// Commit a pending capture now instead of waiting for the debounce.
    fn flush_pending_capture(&mut self) {
        if self.scheduler.cancel(Deferred::HistoryCapture) {
            self.capture_history();
        }
    }

    fn persist_selection(&mut self) {
        let root = self.surface.root();
        if let Some(record) = selection::capture(&self.surface, root, self.selection.as_ref()) {
            self.saved_selection = Some(record);
        }
    }

    fn restore_or_end(&self, record: Option<&SelectionRecord>) -> DomRange {
        let root = self.surface.root();
        record
            .and_then(|record| match selection::restore(&self.surface, root, record) {
                Ok(range) => Some(range),
                Err(err) => {
                    tracing::warn!(target: "copydesk::selection", %err, "could not restore selection");
                    None
                }
            })
            .unwrap_or_else(|| DomRange::caret(end_point(&self.surface, root)))
    }

    /// The live selection, falling back to the saved one and then to the end
    /// of the document.
    fn working_range(&mut self) -> DomRange {
        let root = self.surface.root();
        match self.selection {
            Some(range) if range.is_within(&self.surface, root) => range,
            _ => {
                let range = self.restore_or_end(self.saved_selection.as_ref());
                self.selection = Some(range);
                range
            }
        }
    }

    // === History ===

    pub fn undo(&mut self) -> bool {
        if !self.is_open() || self.composing {
            return false;
        }
        self.flush_pending_capture();
        match self.history.undo() {
            Some(entry) => {
                self.apply_history_entry(entry);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if !self.is_open() || self.composing {
            return false;
        }
        self.flush_pending_capture();
        match self.history.redo() {
            Some(entry) => {
                self.apply_history_entry(entry);
                true
            }
            None => false,
        }
    }

    fn apply_history_entry(&mut self, entry: HistoryEntry) {
        let root = self.surface.root();
        let record = selection::capture(&self.surface, root, self.selection.as_ref())
            .or_else(|| self.saved_selection.clone());

        self.applying_history = true;
        self.surface.set_inner_html(&entry.html);
        self.selection = Some(self.restore_or_end(record.as_ref()));
        self.on_input();
        self.applying_history = false;

        tracing::debug!(
            target: "copydesk::history",
            cursor = self.history.cursor(),
            len = self.history.len(),
            "applied history entry"
        );
    }

    // === Commands ===

    /// Run a toolbar command. Fullscreen only.
    pub fn execute(&mut self, command: ToolbarCommand) -> bool {
        if !self.is_open() {
            tracing::debug!(target: "copydesk::command", %command, "ignoring command while closed");
            return false;
        }
        match command {
            ToolbarCommand::Undo => return self.undo(),
            ToolbarCommand::Redo => return self.redo(),
            _ => {}
        }

        let mut range = self.working_range();
        let changed = execute_command(&mut self.surface, &mut range, command);
        self.selection = Some(range);
        self.on_input();
        changed
    }

    // === Selection input ===

    pub fn set_selection(&mut self, range: DomRange) {
        if !self.is_open() {
            tracing::debug!(target: "copydesk::selection", "ignoring selection while closed");
            return;
        }
        if !range.is_within(&self.surface, self.surface.root()) {
            tracing::warn!(target: "copydesk::selection", "ignoring selection outside the surface");
            return;
        }
        let mut range = range;
        normalize_range(&self.surface, &mut range);
        self.selection = Some(range);
        self.persist_selection();
    }

    pub fn set_caret(&mut self, point: DomPoint) {
        self.set_selection(DomRange::caret(point));
    }

    /// Select by char offsets into the document's text.
    pub fn select_text(&mut self, start: usize, end: usize) {
        let root = self.surface.root();
        let anchor = point_at_char(&self.surface, root, start);
        let focus = point_at_char(&self.surface, root, end);
        self.set_selection(DomRange::new(anchor, focus));
    }

    /// Focus left the surface (e.g. a toolbar button was clicked). The saved
    /// selection survives.
    pub fn blur(&mut self) {
        self.selection = None;
    }

    // === Text input ===

    pub fn composition_start(&mut self) {
        self.composing = true;
    }

    pub fn composition_end(&mut self) {
        self.composing = false;
        self.on_input();
    }

    /// Type `text` at the caret. A selection within one text node is
    /// replaced; newlines become line breaks.
    pub fn insert_text(&mut self, text: &str) {
        if !self.is_open() {
            return;
        }
        let root = self.surface.root();
        let range = self.working_range();
        let (start, end) = range.ordered(&self.surface, root);
        let mut caret = start;
        if start.node == end.node && self.surface.is_text(start.node) {
            self.delete_chars(start.node, start.offset, end.offset);
        }

        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                caret = self.insert_break_at(caret);
            }
            if !line.is_empty() {
                caret = self.insert_str_at(caret, line);
            }
        }

        tracing::trace!(target: "copydesk::session", text, "inserted text");
        self.selection = Some(DomRange::caret(caret));
        self.on_input();
    }

    /// Backspace: remove the selected text, or the character before the caret.
    pub fn delete_backward(&mut self) {
        if !self.is_open() {
            return;
        }
        let root = self.surface.root();
        let range = self.working_range();
        let (start, end) = range.ordered(&self.surface, root);

        let caret = if !range.is_collapsed() && start.node == end.node && self.surface.is_text(start.node) {
            self.delete_chars(start.node, start.offset, end.offset);
            start
        } else if self.surface.is_text(start.node) && start.offset > 0 {
            self.delete_chars(start.node, start.offset - 1, start.offset);
            DomPoint::new(start.node, start.offset - 1)
        } else {
            match self.leaf_before(start) {
                Some(leaf) => match self.surface.text(leaf).map(|t| t.chars().count()) {
                    Some(len) if len > 0 => {
                        self.delete_chars(leaf, len - 1, len);
                        DomPoint::new(leaf, len - 1)
                    }
                    _ => {
                        self.surface.remove(leaf);
                        start
                    }
                },
                None => start,
            }
        };

        let mut range = DomRange::caret(caret);
        normalize_range(&self.surface, &mut range);
        self.selection = Some(range);
        self.on_input();
    }

    fn delete_chars(&mut self, node: NodeId, from: usize, to: usize) {
        let Some(text) = self.surface.text(node) else {
            return;
        };
        let kept: String = text
            .chars()
            .enumerate()
            .filter(|(i, _)| *i < from || *i >= to)
            .map(|(_, c)| c)
            .collect();
        self.surface.set_text(node, kept);
    }

    fn insert_str_at(&mut self, point: DomPoint, s: &str) -> DomPoint {
        let added = s.chars().count();
        if let Some(text) = self.surface.text(point.node) {
            let byte = crate::surface::char_to_byte(text, point.offset);
            let mut updated = text.to_string();
            updated.insert_str(byte, s);
            self.surface.set_text(point.node, updated);
            return DomPoint::new(point.node, point.offset + added);
        }

        // Element boundary: extend an adjacent text node if there is one.
        let children = self.surface.children(point.node);
        let before = point
            .offset
            .checked_sub(1)
            .and_then(|i| children.get(i))
            .copied()
            .filter(|&id| self.surface.is_text(id));
        if let Some(before) = before {
            let len = self.surface.node_len(before);
            return self.insert_str_at(DomPoint::new(before, len), s);
        }
        let after = children
            .get(point.offset)
            .copied()
            .filter(|&id| self.surface.is_text(id));
        if let Some(after) = after {
            return self.insert_str_at(DomPoint::new(after, 0), s);
        }
        let node = self.surface.create_text(s);
        self.surface.insert_child(point.node, point.offset, node);
        DomPoint::new(node, added)
    }

    fn insert_break_at(&mut self, point: DomPoint) -> DomPoint {
        let br = self.surface.create_element("br");
        if self.surface.is_text(point.node) {
            let len = self.surface.node_len(point.node);
            if point.offset == 0 {
                self.surface.insert_before(point.node, br);
                return point;
            }
            if point.offset < len {
                if let Some(right) = self.surface.split_text(point.node, point.offset) {
                    self.surface.insert_before(right, br);
                    return DomPoint::new(right, 0);
                }
            }
            self.surface.insert_after(point.node, br);
        } else {
            self.surface.insert_child(point.node, point.offset, br);
        }
        match (self.surface.parent(br), self.surface.index_in_parent(br)) {
            (Some(parent), Some(index)) => DomPoint::new(parent, index + 1),
            _ => point,
        }
    }

    /// The deepest last node preceding `point` in document order.
    fn leaf_before(&self, point: DomPoint) -> Option<NodeId> {
        let root = self.surface.root();
        let mut node = if !self.surface.is_text(point.node) && point.offset > 0 {
            self.surface.child(point.node, point.offset - 1)?
        } else {
            let mut current = point.node;
            loop {
                if current == root {
                    return None;
                }
                if let Some(prev) = self.surface.previous_sibling(current) {
                    break prev;
                }
                current = self.surface.parent(current)?;
            }
        };
        while let Some(&last) = self.surface.children(node).last() {
            node = last;
        }
        Some(node)
    }

    // === Keyboard ===

    pub fn handle_keydown(&mut self, combo: &KeyCombo) -> KeydownResult {
        if !self.is_open() {
            return KeydownResult::NotHandled;
        }
        let modifiers = combo.modifiers;
        if modifiers.primary() {
            if combo.key.is_char('z') {
                if modifiers.shift {
                    self.redo();
                } else {
                    self.undo();
                }
                return KeydownResult::Handled;
            }
            if combo.key.is_char('y') {
                self.redo();
                return KeydownResult::Handled;
            }
            if combo.key.is_char('s') {
                self.save();
                return KeydownResult::Handled;
            }
            return KeydownResult::NotHandled;
        }

        match &combo.key {
            Key::Escape => {
                self.close_fullscreen();
                KeydownResult::Handled
            }
            Key::Tab if self.caret_in_list_item() => {
                let command = if modifiers.shift {
                    ToolbarCommand::Outdent
                } else {
                    ToolbarCommand::Indent
                };
                self.execute(command);
                KeydownResult::Handled
            }
            key if key.is_navigation() => KeydownResult::PassThrough,
            _ => KeydownResult::NotHandled,
        }
    }

    fn caret_in_list_item(&mut self) -> bool {
        let range = self.working_range();
        let node = point_node(&self.surface, &range.focus);
        self.surface
            .closest_tag(node, self.surface.root(), &["li"])
            .is_some()
    }

    // === Clipboard ===

    /// Copy the rendered text of the document.
    pub fn copy_plain(&mut self, clipboard: &impl ClipboardPlatform) {
        let text = match self.mode {
            EditorMode::Open => inner_text(&self.surface, self.surface.root()),
            EditorMode::Closed => self.content.clone(),
        };
        let result = clipboard.write_text(&text);
        self.report_copy(result, "Copied as plain text");
    }

    /// Copy the document as HTML together with its plain-text projection.
    pub fn copy_formatted(&mut self, clipboard: &impl ClipboardPlatform) {
        let html = match self.mode {
            EditorMode::Open => self.html_state.clone(),
            EditorMode::Closed => self.policy.trusted(&markdown_to_html(&self.content)),
        };
        let plain = html_to_plain_text(&html);
        let result = clipboard.write_html(&html, &plain);
        self.report_copy(result, "Copied with formatting");
    }

    fn report_copy(&mut self, result: Result<(), crate::error::ClipboardError>, success: &str) {
        match result {
            Ok(()) => self.host.notify(Notice::success(success)),
            Err(err) => {
                tracing::warn!(target: "copydesk::session", %err, "clipboard write failed");
                self.host.notify(Notice::error(format!("Copy failed: {err}")));
            }
        }
    }
}
