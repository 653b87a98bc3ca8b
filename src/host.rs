//! JSON message channel between the host extension and this session.
//!
//! Each line is a JSON object with a `type` discriminator. Messages are
//! fire-and-forget: the core never waits for a reply, and anything that looks
//! like a response arrives later as its own inbound message. Transport
//! reliability is the host's concern.
//!
//! Architecture:
//! - Stdin reader thread: parses inbound lines, sends them to the main loop
//!   via a channel
//! - Main loop: owns all session state, drains outbound messages to stdout

use crate::focus::FocusTarget;
use crate::log_debug;
use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::thread;

/// Messages arriving from the host, plus the UI-origin intents (virtual
/// keyboard, radial menu, switch input) that reach the core over the same
/// channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    /// Document handed over at session start.
    #[serde(rename = "init")]
    Init {
        content: String,
        filename: String,
        extension: String,
    },

    #[serde(rename = "set-theme")]
    SetTheme { theme: String },

    /// Host-driven focus reassignment.
    #[serde(rename = "set-focus")]
    SetFocus { target: FocusTarget },

    /// Response to an earlier `get-snippets` request.
    #[serde(rename = "snippets")]
    Snippets { snippets: Vec<Snippet> },

    /// Speech transcript submitted by the user.
    #[serde(rename = "transcript")]
    Transcript { text: String },

    #[serde(rename = "set-terminals")]
    SetTerminals { terminals: Vec<String> },

    #[serde(rename = "connection-status")]
    ConnectionStatus { status: ConnectionStatus },

    /// One key token from the virtual keyboard or radial menu.
    #[serde(rename = "key-token")]
    KeyToken { text: String },

    /// A raw key press checked against the configured confirm binding.
    #[serde(rename = "confirm-key")]
    ConfirmKey { key: String, code: String },

    /// The three-way highlighting stop/start switch.
    #[serde(rename = "toggle-highlighting")]
    ToggleHighlighting,

    /// Toolbar button identifiers in on-screen traversal order, re-reported
    /// whenever the toolbar layout changes.
    #[serde(rename = "button-order")]
    ButtonOrder { ids: Vec<String> },

    /// Direct activation of a toolbar button (click or gaze dwell).
    #[serde(rename = "activate-button")]
    ActivateButton { id: String },

    #[serde(rename = "set-radial-enabled")]
    SetRadialEnabled { enabled: bool },

    /// Insert a previously loaded snippet by name.
    #[serde(rename = "insert-snippet")]
    InsertSnippet { name: String },
}

/// Messages sent back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum WebviewMessage {
    #[serde(rename = "ready")]
    Ready,

    /// Full document content after an edit; the host keeps the real document
    /// in sync.
    #[serde(rename = "edit")]
    Edit { content: String },

    #[serde(rename = "get-snippets")]
    GetSnippets { extension: String },

    #[serde(rename = "terminal-open")]
    TerminalOpen,
    #[serde(rename = "terminal-create")]
    TerminalCreate,
    #[serde(rename = "terminal-input")]
    TerminalInput { text: String },
    #[serde(rename = "terminal-space")]
    TerminalSpace,
    #[serde(rename = "terminal-bksp")]
    TerminalBksp,
    #[serde(rename = "terminal-enter")]
    TerminalEnter,
    #[serde(rename = "terminal-clear")]
    TerminalClear,
    #[serde(rename = "terminal-hide")]
    TerminalHide,
    #[serde(rename = "terminal-list")]
    TerminalList,
    #[serde(rename = "terminal-show")]
    TerminalShow { name: String },
    #[serde(rename = "terminal-paste")]
    TerminalPaste { text: String },

    #[serde(rename = "create-file")]
    CreateFile { name: String },
    #[serde(rename = "create-folder")]
    CreateFolder { name: String },

    #[serde(rename = "openSimpleBrowser")]
    OpenSimpleBrowser { url: String },

    #[serde(rename = "save-file")]
    SaveFile,
    #[serde(rename = "stop-process")]
    StopProcess,

    #[serde(rename = "start-speech-server")]
    StartSpeechServer,
    #[serde(rename = "stop-speech-server")]
    StopSpeechServer,
    #[serde(rename = "start-listening")]
    StartListening,
    #[serde(rename = "stop-listening")]
    StopListening,
}

/// A code snippet loaded from the host; the body keeps its original lines so
/// placeholder-aware insertion can see the whole block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub name: String,
    pub body: Vec<String>,
}

/// Host-reported speech-server connection state. Observational only; the core
/// consumes it for gating (a server start is refused mid-handshake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    #[default]
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Disconnected => "Disconnected",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "plug",
            ConnectionStatus::Connecting => "sync~spin",
            ConnectionStatus::Disconnected => "debug-disconnect",
        }
    }
}

/// Serialize one outbound message as a JSON line.
pub fn write_message(out: &mut impl Write, message: &WebviewMessage) -> Result<()> {
    let json = serde_json::to_string(message).context("failed to encode outbound message")?;
    writeln!(out, "{json}").context("failed to write outbound message")?;
    out.flush().context("failed to flush outbound message")?;
    Ok(())
}

/// Read inbound JSON lines from stdin on a dedicated thread. Malformed lines
/// are logged and skipped; the thread exits when stdin closes or the main
/// loop goes away.
pub fn spawn_stdin_reader(tx: Sender<HostMessage>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<HostMessage>(trimmed) {
                Ok(message) => {
                    if tx.send(message).is_err() {
                        break;
                    }
                }
                Err(err) => log_debug(&format!("host: skipping malformed message: {err}")),
            }
        }
        log_debug("host: stdin reader exiting");
    })
}
