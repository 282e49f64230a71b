//! End-to-end editing sessions driven through the public API.

use std::cell::RefCell;
use std::time::Duration;

use copydesk_editor_core::{
    ClipboardError, ClipboardPlatform, EditorConfig, EditorHost, EditorMode, EditorProps,
    EditorSession, HeadingLevel, Key, KeyCombo, KeydownResult, Modifiers, Notice, NoticeKind,
    ToolbarCommand,
};

#[derive(Debug, Default)]
struct RecordingHost {
    changes: Vec<String>,
    saves: usize,
    scroll_locked: bool,
    notices: Vec<Notice>,
}

impl EditorHost for RecordingHost {
    fn on_change(&mut self, content: &str) {
        self.changes.push(content.to_string());
    }

    fn on_save(&mut self) {
        self.saves += 1;
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

#[derive(Default)]
struct MemoryClipboard {
    text: RefCell<Option<String>>,
    html: RefCell<Option<(String, String)>>,
    deny: bool,
}

impl ClipboardPlatform for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.deny {
            return Err(ClipboardError::PermissionDenied);
        }
        *self.text.borrow_mut() = Some(text.to_string());
        Ok(())
    }

    fn write_html(&self, html: &str, plain_text: &str) -> Result<(), ClipboardError> {
        if self.deny {
            return Err(ClipboardError::PermissionDenied);
        }
        *self.html.borrow_mut() = Some((html.to_string(), plain_text.to_string()));
        Ok(())
    }
}

const SETTLE: Duration = Duration::from_millis(500);

fn session(content: &str) -> EditorSession<RecordingHost> {
    EditorSession::new(EditorProps::new(content), RecordingHost::default())
}

fn key(combo: &str) -> KeyCombo {
    combo.parse().unwrap()
}

#[test]
fn type_then_undo_back_to_original() {
    let mut editor = session("Hello **world**");
    editor.open_fullscreen();
    assert_eq!(editor.html(), "Hello <strong>world</strong>");
    assert_eq!(editor.plain_text(), "Hello world");

    for word in [",", " again", "!"] {
        editor.insert_text(word);
        editor.tick(SETTLE);
    }
    assert_eq!(editor.plain_text(), "Hello world, again!");
    assert_eq!(editor.history().len(), 4);

    while editor.can_undo() {
        assert_eq!(editor.handle_keydown(&key("Ctrl+z")), KeydownResult::Handled);
    }
    assert_eq!(editor.plain_text(), "Hello world");
    assert_eq!(editor.html(), "Hello <strong>world</strong>");

    assert_eq!(editor.handle_keydown(&key("Cmd+Shift+z")), KeydownResult::Handled);
    assert_eq!(editor.plain_text(), "Hello world,");
    editor.handle_keydown(&key("Ctrl+y"));
    assert_eq!(editor.plain_text(), "Hello world, again");
}

#[test]
fn undo_does_not_record_itself() {
    let mut editor = session("one");
    editor.open_fullscreen();
    editor.insert_text(" two");
    editor.tick(SETTLE);
    assert!(editor.undo());
    editor.tick(SETTLE * 4);
    assert_eq!(editor.history().len(), 2);
    assert!(editor.can_redo());
}

#[test]
fn typing_after_undo_drops_redo_branch() {
    let mut editor = session("a");
    editor.open_fullscreen();
    editor.insert_text("b");
    editor.tick(SETTLE);
    editor.undo();
    editor.insert_text("c");
    editor.tick(SETTLE);
    assert!(!editor.can_redo());
    let plains: Vec<&str> = editor.history().plain_entries().collect();
    assert_eq!(plains, vec!["a", "ac"]);
}

#[test]
fn history_capacity_from_config() {
    let config = EditorConfig {
        history_capacity: 5,
        capture_delay_ms: 100,
    };
    let mut editor =
        EditorSession::with_config(EditorProps::new(""), RecordingHost::default(), config);
    editor.open_fullscreen();
    for c in ["a", "b", "c", "d", "e", "f", "g"] {
        editor.insert_text(c);
        editor.tick(Duration::from_millis(100));
    }
    assert_eq!(editor.history().len(), 5);
    assert_eq!(editor.history().cursor(), 4);
}

#[test]
fn escape_closes_and_reports_plain_text() {
    let mut editor = session("Notes\nfirst line");
    editor.open_fullscreen();
    assert!(editor.host().scroll_locked);

    editor.execute(ToolbarCommand::BulletList);
    assert_eq!(editor.handle_keydown(&KeyCombo::new(Key::Escape)), KeydownResult::Handled);

    assert_eq!(editor.mode(), EditorMode::Closed);
    assert!(!editor.host().scroll_locked);
    let host = editor.into_host();
    assert_eq!(host.changes.len(), 1);
    assert_eq!(host.changes[0], "• Notes\nfirst line");
}

#[test]
fn reopen_starts_with_fresh_history() {
    let mut editor = session("draft");
    editor.open_fullscreen();
    editor.insert_text(" one");
    editor.tick(SETTLE);
    editor.close_fullscreen();
    assert_eq!(editor.content(), "draft one");

    editor.open_fullscreen();
    assert_eq!(editor.history().len(), 1);
    assert!(!editor.can_undo());
    assert_eq!(editor.plain_text(), "draft one");
}

#[test]
fn toolbar_after_blur_applies_to_saved_selection() {
    let mut editor = session("make this bold");
    editor.open_fullscreen();
    editor.select_text(10, 14);
    editor.blur();

    assert!(editor.execute(ToolbarCommand::Bold));
    assert_eq!(editor.html(), "make this <strong>bold</strong>");
    assert!(editor.saved_selection().is_some());

    // Markup-only change keeps the same plain text: no new history step.
    editor.tick(SETTLE);
    assert_eq!(editor.history().len(), 1);
}

#[test]
fn list_commands_and_tab_nesting() {
    let mut editor = session("");
    editor.open_fullscreen();
    editor.insert_text("first");
    editor.execute(ToolbarCommand::NumberedList);
    assert_eq!(editor.html(), "<ol><li>first</li></ol>");

    // Tab outside a nested position is still consumed inside a list.
    assert_eq!(editor.handle_keydown(&KeyCombo::new(Key::Tab)), KeydownResult::Handled);
    assert_eq!(editor.html(), "<ol><li>first</li></ol>");

    editor.execute(ToolbarCommand::NumberedList);
    assert_eq!(editor.html(), "<p>first</p>");
    assert_eq!(editor.handle_keydown(&KeyCombo::new(Key::Tab)), KeydownResult::NotHandled);
}

#[test]
fn shift_tab_outdents_nested_item() {
    let mut editor = session("<ul><li>a</li><li>b</li></ul>");
    editor.open_fullscreen();
    editor.select_text(2, 2);
    editor.handle_keydown(&KeyCombo::new(Key::Tab));
    assert_eq!(editor.html(), "<ul><li>a<ul><li>b</li></ul></li></ul>");

    let combo = KeyCombo::with_modifiers(Key::Tab, Modifiers::SHIFT);
    assert_eq!(editor.handle_keydown(&combo), KeydownResult::Handled);
    assert_eq!(editor.html(), "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn save_shortcut_and_passthrough() {
    let mut editor = session("x");
    assert_eq!(editor.handle_keydown(&key("Ctrl+s")), KeydownResult::NotHandled);
    editor.open_fullscreen();
    assert_eq!(editor.handle_keydown(&key("Ctrl+s")), KeydownResult::Handled);
    assert_eq!(editor.host().saves, 1);
    assert_eq!(
        editor.handle_keydown(&KeyCombo::new(Key::ArrowLeft)),
        KeydownResult::PassThrough
    );
    assert_eq!(editor.handle_keydown(&key("a")), KeydownResult::NotHandled);
}

#[test]
fn clipboard_copies_report_notices() {
    let mut editor = session("## Heading\n- item");
    editor.open_fullscreen();

    let clipboard = MemoryClipboard::default();
    editor.copy_plain(&clipboard);
    assert_eq!(clipboard.text.borrow().as_deref(), Some("Heading\n\n- item"));

    editor.copy_formatted(&clipboard);
    let (html, plain) = clipboard.html.borrow().clone().unwrap();
    assert_eq!(html, "<h2>Heading</h2><br>- item");
    assert_eq!(plain, "Heading\n\n\n- item");

    let denied = MemoryClipboard {
        deny: true,
        ..Default::default()
    };
    editor.copy_plain(&denied);

    let kinds: Vec<NoticeKind> = editor.host().notices.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![NoticeKind::Success, NoticeKind::Success, NoticeKind::Error]
    );
}

#[test]
fn composition_is_one_history_step() {
    let mut editor = session("");
    editor.open_fullscreen();
    editor.composition_start();
    editor.insert_text("に");
    editor.tick(SETTLE);
    editor.insert_text("ほん");
    editor.tick(SETTLE);
    assert_eq!(editor.history().len(), 1);
    editor.composition_end();
    editor.tick(SETTLE);
    assert_eq!(editor.history().len(), 2);
    assert_eq!(editor.plain_text(), "にほん");
}

#[test]
fn stale_saved_selection_falls_back_to_end() {
    let mut editor = session("<p>one</p><p>two</p>");
    editor.open_fullscreen();
    editor.select_text(4, 6);
    editor.blur();
    assert_eq!(editor.saved_selection().unwrap().anchor_path, vec![1, 0]);

    // The host rewrites the surface so the saved path no longer resolves.
    editor.surface_mut().set_inner_html("a");
    editor.on_input();
    assert_eq!(editor.saved_selection().unwrap().anchor_path, vec![1, 0]);

    assert!(editor.execute(ToolbarCommand::Heading(HeadingLevel::H1)));
    assert_eq!(editor.html(), "<h1>a</h1>");
    let caret = editor.selection().unwrap();
    assert!(caret.is_within(editor.surface(), editor.surface().root()));
}
