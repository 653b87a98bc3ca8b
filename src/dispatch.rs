//! Key-token dispatch: turns one abstract input token into exactly one
//! destination based on the current focus target.
//!
//! Tokens are a tagged variant rather than raw strings, so a symbolic command
//! can never collide with literal text. Symbolic lookup always wins over
//! literal interpretation; a command with no entry for the current focus
//! falls through to that focus's literal route.

use crate::focus::FocusTarget;
use crate::host::WebviewMessage;
use serde::{Deserialize, Serialize};

/// One unit of input: a literal string or a bracket-named command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyToken {
    Literal(String),
    Command(CommandKey),
}

impl KeyToken {
    /// Parse a raw token. `{name}` naming a known command becomes the
    /// command variant; anything else stays literal, so unknown bracketed
    /// text is typed out rather than dropped.
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
            if let Some(command) = CommandKey::from_name(name) {
                return KeyToken::Command(command);
            }
        }
        KeyToken::Literal(raw.to_string())
    }

    /// The token's literal rendering, used when it falls through to a
    /// literal route.
    pub fn text(&self) -> String {
        match self {
            KeyToken::Literal(text) => text.clone(),
            KeyToken::Command(command) => format!("{{{}}}", command.name()),
        }
    }
}

/// Named commands producible by the virtual keyboard and radial menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKey {
    Comment,
    Backspace,
    Enter,
    Space,
    Tab,
    Save,
    OpenTerminal,
    CreateTerminal,
    HideTerminal,
    ListTerminals,
    StopProcess,
    Cls,
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
}

impl CommandKey {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "comment" => CommandKey::Comment,
            "backspace" => CommandKey::Backspace,
            "enter" => CommandKey::Enter,
            "space" => CommandKey::Space,
            "tab" => CommandKey::Tab,
            "save" => CommandKey::Save,
            "open-terminal" => CommandKey::OpenTerminal,
            "create-terminal" => CommandKey::CreateTerminal,
            "hide-terminal" => CommandKey::HideTerminal,
            "list-terminals" => CommandKey::ListTerminals,
            "stop-process" => CommandKey::StopProcess,
            "cls" => CommandKey::Cls,
            "copy" => CommandKey::Copy,
            "cut" => CommandKey::Cut,
            "paste" => CommandKey::Paste,
            "undo" => CommandKey::Undo,
            "redo" => CommandKey::Redo,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandKey::Comment => "comment",
            CommandKey::Backspace => "backspace",
            CommandKey::Enter => "enter",
            CommandKey::Space => "space",
            CommandKey::Tab => "tab",
            CommandKey::Save => "save",
            CommandKey::OpenTerminal => "open-terminal",
            CommandKey::CreateTerminal => "create-terminal",
            CommandKey::HideTerminal => "hide-terminal",
            CommandKey::ListTerminals => "list-terminals",
            CommandKey::StopProcess => "stop-process",
            CommandKey::Cls => "cls",
            CommandKey::Copy => "copy",
            CommandKey::Cut => "cut",
            CommandKey::Paste => "paste",
            CommandKey::Undo => "undo",
            CommandKey::Redo => "redo",
        }
    }
}

/// Editing-surface operations reachable from the action table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOp {
    Insert(String),
    Delete,
    Enter,
    ToggleComment,
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
}

/// File/folder creation dialogs the session can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    CreateFile,
    CreateFolder,
}

/// A zero-argument effect from the action table, applied by the session.
/// Kept as plain data so routing stays pure and independently testable.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Editor(EditorOp),
    Send(WebviewMessage),
    SetFocus(FocusTarget),
    SendAndFocus(WebviewMessage, FocusTarget),
    DialogInsert(String),
    DialogDelete,
    DialogCommit,
    OpenDialog(DialogKind),
    /// Forward the session clipboard to the simulated terminal.
    TerminalPaste,
}

/// Where a token ends up: exactly one destination per `(token, focus)` pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Action(Action),
    EditorLiteral(String),
    TerminalLiteral(String),
    DialogLiteral(String),
}

/// The per-focus action table. `None` means the command has no symbolic
/// meaning under this focus and falls through to the literal route.
pub fn command_action(focus: FocusTarget, command: CommandKey) -> Option<Action> {
    match focus {
        FocusTarget::Editor => editor_action(command),
        FocusTarget::Terminal => terminal_action(command),
        FocusTarget::Dialog => dialog_action(command),
    }
}

fn editor_action(command: CommandKey) -> Option<Action> {
    Some(match command {
        CommandKey::Comment => Action::Editor(EditorOp::ToggleComment),
        CommandKey::Backspace => Action::Editor(EditorOp::Delete),
        CommandKey::Enter => Action::Editor(EditorOp::Enter),
        CommandKey::Space => Action::Editor(EditorOp::Insert(" ".into())),
        CommandKey::Tab => Action::Editor(EditorOp::Insert("\t".into())),
        CommandKey::Save => Action::Send(WebviewMessage::SaveFile),
        CommandKey::OpenTerminal => {
            Action::SendAndFocus(WebviewMessage::TerminalOpen, FocusTarget::Terminal)
        }
        CommandKey::CreateTerminal => {
            Action::SendAndFocus(WebviewMessage::TerminalCreate, FocusTarget::Terminal)
        }
        CommandKey::StopProcess => Action::Send(WebviewMessage::StopProcess),
        CommandKey::Copy => Action::Editor(EditorOp::Copy),
        CommandKey::Cut => Action::Editor(EditorOp::Cut),
        CommandKey::Paste => Action::Editor(EditorOp::Paste),
        CommandKey::Undo => Action::Editor(EditorOp::Undo),
        CommandKey::Redo => Action::Editor(EditorOp::Redo),
        CommandKey::HideTerminal | CommandKey::ListTerminals | CommandKey::Cls => return None,
    })
}

fn terminal_action(command: CommandKey) -> Option<Action> {
    Some(match command {
        CommandKey::Enter => Action::Send(WebviewMessage::TerminalEnter),
        CommandKey::Backspace => Action::Send(WebviewMessage::TerminalBksp),
        CommandKey::Space => Action::Send(WebviewMessage::TerminalSpace),
        CommandKey::Tab => Action::Send(WebviewMessage::TerminalInput { text: "\t".into() }),
        CommandKey::Cls => Action::Send(WebviewMessage::TerminalClear),
        CommandKey::Save => Action::Send(WebviewMessage::SaveFile),
        CommandKey::CreateTerminal => Action::Send(WebviewMessage::TerminalCreate),
        CommandKey::ListTerminals => Action::Send(WebviewMessage::TerminalList),
        CommandKey::HideTerminal => {
            Action::SendAndFocus(WebviewMessage::TerminalHide, FocusTarget::Editor)
        }
        CommandKey::OpenTerminal => Action::SetFocus(FocusTarget::Editor),
        CommandKey::StopProcess => Action::Send(WebviewMessage::StopProcess),
        CommandKey::Paste => Action::TerminalPaste,
        CommandKey::Comment | CommandKey::Copy | CommandKey::Cut | CommandKey::Undo
        | CommandKey::Redo => return None,
    })
}

fn dialog_action(command: CommandKey) -> Option<Action> {
    Some(match command {
        CommandKey::Backspace => Action::DialogDelete,
        CommandKey::Space => Action::DialogInsert(" ".into()),
        CommandKey::Enter => Action::DialogCommit,
        _ => return None,
    })
}

/// Route one token. Symbolic-command lookup takes priority over literal
/// interpretation, so `{save}` can never be typed as text — an accepted
/// limitation of the bracket-token design.
pub fn route(token: &KeyToken, focus: FocusTarget) -> Route {
    if let KeyToken::Command(command) = token {
        if let Some(action) = command_action(focus, *command) {
            return Route::Action(action);
        }
    }
    let text = token.text();
    match focus {
        FocusTarget::Editor => Route::EditorLiteral(text),
        FocusTarget::Terminal => Route::TerminalLiteral(text),
        FocusTarget::Dialog => Route::DialogLiteral(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_COMMANDS: &[CommandKey] = &[
        CommandKey::Comment,
        CommandKey::Backspace,
        CommandKey::Enter,
        CommandKey::Space,
        CommandKey::Tab,
        CommandKey::Save,
        CommandKey::OpenTerminal,
        CommandKey::CreateTerminal,
        CommandKey::HideTerminal,
        CommandKey::ListTerminals,
        CommandKey::StopProcess,
        CommandKey::Cls,
        CommandKey::Copy,
        CommandKey::Cut,
        CommandKey::Paste,
        CommandKey::Undo,
        CommandKey::Redo,
    ];

    const ALL_FOCI: &[FocusTarget] = &[
        FocusTarget::Editor,
        FocusTarget::Terminal,
        FocusTarget::Dialog,
    ];

    #[test]
    fn bracket_tokens_parse_to_commands() {
        assert_eq!(
            KeyToken::parse("{save}"),
            KeyToken::Command(CommandKey::Save)
        );
        assert_eq!(
            KeyToken::parse("{open-terminal}"),
            KeyToken::Command(CommandKey::OpenTerminal)
        );
        assert_eq!(KeyToken::parse("a"), KeyToken::Literal("a".into()));
        assert_eq!(
            KeyToken::parse("{nonsense}"),
            KeyToken::Literal("{nonsense}".into())
        );
    }

    #[test]
    fn command_names_round_trip() {
        for command in ALL_COMMANDS {
            assert_eq!(CommandKey::from_name(command.name()), Some(*command));
        }
    }

    #[test]
    fn every_token_routes_to_exactly_one_destination() {
        // dispatch totality: commands and literals both resolve for every focus
        for focus in ALL_FOCI {
            for command in ALL_COMMANDS {
                let _ = route(&KeyToken::Command(*command), *focus);
            }
            let route_taken = route(&KeyToken::Literal("x".into()), *focus);
            match (focus, route_taken) {
                (FocusTarget::Editor, Route::EditorLiteral(text)) => assert_eq!(text, "x"),
                (FocusTarget::Terminal, Route::TerminalLiteral(text)) => assert_eq!(text, "x"),
                (FocusTarget::Dialog, Route::DialogLiteral(text)) => assert_eq!(text, "x"),
                (focus, route_taken) => {
                    panic!("literal under {focus:?} routed to {route_taken:?}")
                }
            }
        }
    }

    #[test]
    fn symbolic_lookup_beats_literal_interpretation() {
        let route_taken = route(&KeyToken::parse("{save}"), FocusTarget::Editor);
        assert_eq!(
            route_taken,
            Route::Action(Action::Send(WebviewMessage::SaveFile))
        );
    }

    #[test]
    fn open_terminal_sends_and_switches_focus() {
        let route_taken = route(&KeyToken::parse("{open-terminal}"), FocusTarget::Editor);
        assert_eq!(
            route_taken,
            Route::Action(Action::SendAndFocus(
                WebviewMessage::TerminalOpen,
                FocusTarget::Terminal
            ))
        );
    }

    #[test]
    fn terminal_focus_maps_keys_to_terminal_messages() {
        assert_eq!(
            route(&KeyToken::parse("{enter}"), FocusTarget::Terminal),
            Route::Action(Action::Send(WebviewMessage::TerminalEnter))
        );
        assert_eq!(
            route(&KeyToken::parse("{cls}"), FocusTarget::Terminal),
            Route::Action(Action::Send(WebviewMessage::TerminalClear))
        );
        assert_eq!(
            route(&KeyToken::parse("ls"), FocusTarget::Terminal),
            Route::TerminalLiteral("ls".into())
        );
    }

    #[test]
    fn unmatched_command_falls_through_to_literal_route() {
        // {cls} has no editor entry, so it types out under editor focus
        assert_eq!(
            route(&KeyToken::parse("{cls}"), FocusTarget::Editor),
            Route::EditorLiteral("{cls}".into())
        );
    }

    #[test]
    fn dialog_focus_routes_text_to_the_active_input() {
        assert_eq!(
            route(&KeyToken::parse("n"), FocusTarget::Dialog),
            Route::DialogLiteral("n".into())
        );
        assert_eq!(
            route(&KeyToken::parse("{backspace}"), FocusTarget::Dialog),
            Route::Action(Action::DialogDelete)
        );
        assert_eq!(
            route(&KeyToken::parse("{enter}"), FocusTarget::Dialog),
            Route::Action(Action::DialogCommit)
        );
    }
}
