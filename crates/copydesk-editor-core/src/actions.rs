//! Editor commands and keyboard input types.
//!
//! `ToolbarCommand` is the set of formatting operations a toolbar (or a
//! replay script) can ask for. `Key`, `Modifiers` and `KeyCombo` are the
//! platform-agnostic view of a keydown; hosts convert native events to them.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

/// Formatting commands available from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarCommand {
    Bold,
    Italic,
    Underline,
    Heading(HeadingLevel),
    BulletList,
    NumberedList,
    AlignLeft,
    AlignCenter,
    AlignRight,
    AlignJustify,
    Indent,
    Outdent,
    Undo,
    Redo,
}

impl ToolbarCommand {
    /// Every command, in toolbar order.
    pub const ALL: [ToolbarCommand; 16] = [
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Heading(HeadingLevel::H1),
        Self::Heading(HeadingLevel::H2),
        Self::Heading(HeadingLevel::H3),
        Self::BulletList,
        Self::NumberedList,
        Self::AlignLeft,
        Self::AlignCenter,
        Self::AlignRight,
        Self::AlignJustify,
        Self::Indent,
        Self::Outdent,
        Self::Undo,
        Self::Redo,
    ];

    /// Stable command name, as used by the toolbar and replay scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Heading(level) => level.tag(),
            Self::BulletList => "insertUnorderedList",
            Self::NumberedList => "insertOrderedList",
            Self::AlignLeft => "justifyLeft",
            Self::AlignCenter => "justifyCenter",
            Self::AlignRight => "justifyRight",
            Self::AlignJustify => "justifyFull",
            Self::Indent => "indent",
            Self::Outdent => "outdent",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }

    /// List tag produced by a list command.
    pub fn list_tag(&self) -> Option<&'static str> {
        match self {
            Self::BulletList => Some("ul"),
            Self::NumberedList => Some("ol"),
            _ => None,
        }
    }

    /// CSS `text-align` value of an alignment command.
    pub fn alignment(&self) -> Option<&'static str> {
        match self {
            Self::AlignLeft => Some("left"),
            Self::AlignCenter => Some("center"),
            Self::AlignRight => Some("right"),
            Self::AlignJustify => Some("justify"),
            _ => None,
        }
    }

    /// Whether the command edits the document tree (as opposed to history).
    pub fn is_transform(&self) -> bool {
        !matches!(self, Self::Undo | Self::Redo)
    }
}

impl fmt::Display for ToolbarCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Heading levels offered by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Element name, which doubles as the command name.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
        }
    }
}

/// Error for a command name that is not in [`ToolbarCommand::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown editor command `{0}`")]
pub struct UnknownCommand(pub SmolStr);

impl FromStr for ToolbarCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name() == s)
            .ok_or_else(|| UnknownCommand(SmolStr::new(s)))
    }
}

/// Key values for keyboard input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    Control,
    Meta,
    Shift,

    // === IME ===
    Process,
    Dead,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Whether this is the character key `c`, ignoring ASCII case.
    ///
    /// Shift changes the reported character on most platforms, so
    /// shortcuts compare case-insensitively.
    pub fn is_char(&self, c: char) -> bool {
        match self {
            Self::Character(s) => {
                let mut chars = s.chars();
                chars.next().is_some_and(|k| k.eq_ignore_ascii_case(&c)) && chars.next().is_none()
            }
            _ => false,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    /// Parse a DOM `KeyboardEvent.key` value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" | "Esc" => Self::Escape,
            " " | "Space" => Self::Space,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Alt" => Self::Alt,
            "Control" => Self::Control,
            "Meta" => Self::Meta,
            "Shift" => Self::Shift,
            "Process" => Self::Process,
            "Dead" => Self::Dead,
            "" | "Unidentified" => Self::Unidentified,
            other => Self::Character(SmolStr::new(other)),
        })
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Ctrl or Cmd held. Shortcuts accept either so one binding serves every
    /// platform.
    pub fn primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A key combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn ctrl(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::CTRL)
    }

    pub fn shift(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::SHIFT)
    }
}

impl FromStr for KeyCombo {
    type Err = std::convert::Infallible;

    /// Parse `"Ctrl+Shift+z"` style combos. Modifier names are
    /// case-insensitive; `Cmd` is an alias for `Meta`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::NONE;
        let mut parts: Vec<&str> = s.split('+').collect();
        // "Ctrl++" names the plus key.
        let key = if s.ends_with("++") {
            parts.truncate(parts.len().saturating_sub(2));
            "+"
        } else {
            parts.pop().unwrap_or_default()
        };
        for part in parts {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                _ => {}
            }
        }
        let Ok(key) = key.parse::<Key>();
        Ok(Self { key, modifiers })
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_roundtrip() {
        for cmd in ToolbarCommand::ALL {
            assert_eq!(cmd.name().parse::<ToolbarCommand>(), Ok(cmd));
        }
        assert_eq!(
            "strikeThrough".parse::<ToolbarCommand>(),
            Err(UnknownCommand("strikeThrough".into()))
        );
    }

    #[test]
    fn test_command_properties() {
        assert_eq!(ToolbarCommand::NumberedList.list_tag(), Some("ol"));
        assert_eq!(ToolbarCommand::AlignJustify.alignment(), Some("justify"));
        assert!(!ToolbarCommand::Redo.is_transform());
        assert!(ToolbarCommand::Heading(HeadingLevel::H2).is_transform());
        assert_eq!(ToolbarCommand::Heading(HeadingLevel::H3).to_string(), "h3");
        assert_eq!("h4".parse::<ToolbarCommand>(), Err(UnknownCommand("h4".into())));
    }

    #[test]
    fn test_parse_combo() {
        let combo: KeyCombo = "Ctrl+Shift+Z".parse().unwrap();
        assert!(combo.modifiers.primary());
        assert!(combo.modifiers.shift);
        assert!(combo.key.is_char('z'));

        let combo: KeyCombo = "Cmd+y".parse().unwrap();
        assert_eq!(combo.modifiers, Modifiers::META);

        let combo: KeyCombo = "Shift+Tab".parse().unwrap();
        assert_eq!(combo, KeyCombo::shift(Key::Tab));

        let combo: KeyCombo = "Escape".parse().unwrap();
        assert_eq!(combo, KeyCombo::new(Key::Escape));

        let combo: KeyCombo = "Ctrl++".parse().unwrap();
        assert_eq!(combo, KeyCombo::ctrl(Key::character("+")));
    }
}
