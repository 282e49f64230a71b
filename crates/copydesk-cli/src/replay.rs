//! Scripted headless editing sessions.
//!
//! A replay script is a KDL document, one step per node:
//!
//! ```kdl
//! content "Hello **world**"
//! open
//! caret 11
//! type "!"
//! tick 500
//! key "Ctrl+z"
//! close
//! ```

use copydesk_editor_core::{
    EditorConfig, EditorHost, EditorProps, EditorSession, KeyCombo, Notice, NoticeKind,
    ToolbarCommand, UnknownCommand,
};
use kdl::{KdlDocument, KdlNode};
use miette::{Diagnostic, Result};
use std::time::Duration;

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ReplayError {
    #[error("unknown replay step `{0}`")]
    #[diagnostic(
        code(copydesk::replay::step),
        help(
            "steps are: content, open, close, type, backspace, command, key, tick, caret, select, blur, compose"
        )
    )]
    UnknownStep(String),

    #[error("`{step}` needs {expected}")]
    #[diagnostic(code(copydesk::replay::argument))]
    MissingArgument {
        step: String,
        expected: &'static str,
    },

    #[error(transparent)]
    #[diagnostic(code(copydesk::replay::command))]
    Command(#[from] UnknownCommand),
}

/// Host that records what the session hands back.
#[derive(Debug, Default)]
pub struct ReplayHost {
    pub changes: Vec<String>,
    pub saves: usize,
    pub notices: Vec<Notice>,
}

impl EditorHost for ReplayHost {
    fn on_change(&mut self, content: &str) {
        tracing::info!(chars = content.chars().count(), "content handed back");
        self.changes.push(content.to_string());
    }

    fn on_save(&mut self) {
        tracing::info!("save requested");
        self.saves += 1;
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        tracing::debug!(locked, "background scroll");
    }

    fn notify(&mut self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => tracing::info!(message = %notice.message, "notice"),
            NoticeKind::Error => tracing::warn!(message = %notice.message, "notice"),
        }
        self.notices.push(notice);
    }
}

/// Run `script` against a fresh session and return it for inspection.
pub fn run(script: &str, config: EditorConfig) -> Result<EditorSession<ReplayHost>> {
    let doc: KdlDocument = script.parse()?;
    let mut session = EditorSession::with_config(EditorProps::default(), ReplayHost::default(), config);
    for node in doc.nodes() {
        step(&mut session, node)?;
    }
    Ok(session)
}

/// Final document of a replayed session: HTML or plain text while open,
/// the handed-back content once closed.
pub fn output(session: &EditorSession<ReplayHost>, html: bool) -> String {
    if session.is_open() && html {
        session.html().to_string()
    } else {
        session.plain_text()
    }
}

fn step(session: &mut EditorSession<ReplayHost>, node: &KdlNode) -> Result<(), ReplayError> {
    let name = node.name().value();
    tracing::debug!(step = name, "replay");
    match name {
        "content" => session.set_content(string_arg(node, 0, "a string")?),
        "open" => session.open_fullscreen(),
        "close" => session.close_fullscreen(),
        "type" => session.insert_text(string_arg(node, 0, "the text to type")?),
        "backspace" => {
            let count = optional_count(node, 0)?.unwrap_or(1);
            for _ in 0..count {
                session.delete_backward();
            }
        }
        "command" => {
            let command: ToolbarCommand = string_arg(node, 0, "a command name")?.parse()?;
            session.execute(command);
        }
        "key" => {
            let Ok(combo) = string_arg(node, 0, "a key combo like \"Ctrl+z\"")?.parse::<KeyCombo>();
            session.handle_keydown(&combo);
        }
        "tick" => {
            let ms = count_arg(node, 0, "a duration in milliseconds")?;
            session.tick(Duration::from_millis(ms as u64));
        }
        "caret" => {
            let offset = count_arg(node, 0, "a character offset")?;
            session.select_text(offset, offset);
        }
        "select" => {
            let start = count_arg(node, 0, "start and end offsets")?;
            let end = count_arg(node, 1, "start and end offsets")?;
            session.select_text(start, end);
        }
        "blur" => session.blur(),
        "compose" => {
            let text = string_arg(node, 0, "the composed text")?;
            session.composition_start();
            session.insert_text(text);
            session.composition_end();
        }
        other => return Err(ReplayError::UnknownStep(other.to_string())),
    }
    Ok(())
}

fn positional(node: &KdlNode, index: usize) -> Option<&kdl::KdlValue> {
    node.entries()
        .iter()
        .filter(|entry| entry.name().is_none())
        .nth(index)
        .map(|entry| entry.value())
}

fn missing(node: &KdlNode, expected: &'static str) -> ReplayError {
    ReplayError::MissingArgument {
        step: node.name().value().to_string(),
        expected,
    }
}

fn string_arg<'a>(node: &'a KdlNode, index: usize, expected: &'static str) -> Result<&'a str, ReplayError> {
    positional(node, index)
        .and_then(|value| value.as_string())
        .ok_or_else(|| missing(node, expected))
}

fn count_arg(node: &KdlNode, index: usize, expected: &'static str) -> Result<usize, ReplayError> {
    optional_count(node, index)?.ok_or_else(|| missing(node, expected))
}

fn optional_count(node: &KdlNode, index: usize) -> Result<Option<usize>, ReplayError> {
    match positional(node, index) {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| missing(node, "a non-negative integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(script: &str) -> EditorSession<ReplayHost> {
        run(script, EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_type_and_undo() {
        let session = replay(
            r#"
            content "Hello **world**"
            open
            type " again"
            tick 500
            key "Ctrl+z"
            "#,
        );
        assert_eq!(output(&session, false), "Hello world");
        insta::assert_snapshot!(output(&session, true), @"Hello <strong>world</strong>");
    }

    #[test]
    fn test_commands_and_close() {
        let session = replay(
            r#"
            content "first"
            open
            select 0 5
            blur
            command "h2"
            command "justifyCenter"
            close
            "#,
        );
        assert_eq!(session.host().changes, vec!["first".to_string()]);
        assert_eq!(output(&session, true), "first");
    }

    #[test]
    fn test_compose_and_backspace() {
        let session = replay(
            r#"
            open
            compose "日本"
            backspace
            type "語"
            "#,
        );
        assert_eq!(output(&session, false), "日語");
    }

    #[test]
    fn test_bad_steps() {
        let err = run("open\nwiggle", EditorConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "unknown replay step `wiggle`");

        let err = run("open\ncommand \"blink\"", EditorConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "unknown editor command `blink`");

        let err = run("open\ntick", EditorConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "`tick` needs a duration in milliseconds");
    }
}
