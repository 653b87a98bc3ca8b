//! Session state for one open document: focus routing, token dispatch, the
//! editing surface, dialogs, scanning, and the outbound message stream.

use std::{
    env, fs,
    io::Write,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use crate::config::AppConfig;
use crate::dispatch::{self, Action, CommandKey, DialogKind, EditorOp, KeyToken, Route};
use crate::editor::{SurfaceBridge, TextModel};
use crate::focus::{FocusEvent, FocusRegistry, FocusTarget, NativeInput};
use crate::host::{ConnectionStatus, HostMessage, Snippet, WebviewMessage};
use crate::prefs::{self, KeyMappings, PreferenceStore, RADIAL_ENABLED_KEY};
use crate::scan::{ConfirmOutcome, HighlightController};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Toolbar layout used until the webview reports its real button order.
pub const DEFAULT_TOOLBAR_BUTTONS: &[&str] = &[
    "comment",
    "save",
    "undo",
    "redo",
    "open-terminal",
    "create-file",
    "create-folder",
    "preview",
    "speech-server",
    "highlight-toggle",
];

const DEFAULT_PREVIEW_URL: &str = "http://localhost:3000";

/// Path to the temp log file we rotate between runs.
pub fn log_file_path() -> PathBuf {
    env::temp_dir().join("pupil_shell.log")
}

/// Write debug messages to a temp file so we can troubleshoot without
/// corrupting the stdio protocol stream.
pub fn log_debug(msg: &str) {
    use std::fs::OpenOptions;

    let log_path = log_file_path();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
        let _ = writeln!(file, "[{timestamp}] {msg}");
    }
}

/// Remove the log file if it grows past 5 MB between runs.
pub fn init_debug_log_file() {
    let log_path = log_file_path();
    if let Ok(metadata) = fs::metadata(&log_path) {
        const MAX_BYTES: u64 = 5 * 1024 * 1024;
        if metadata.len() > MAX_BYTES {
            let _ = fs::remove_file(&log_path);
        }
    }
}

/// One open create-file/create-folder dialog and its name input. The input is
/// shared with the focus registry as a weak reference, so dropping this state
/// is enough to make pending mutations inert.
struct DialogState {
    kind: DialogKind,
    input: Arc<Mutex<NativeInput>>,
}

/// The session: owns all state and is driven single-threaded by the main
/// loop, one inbound message or timer tick at a time.
pub struct App {
    config: AppConfig,
    focus: FocusTarget,
    registry: FocusRegistry,
    focus_events: Receiver<FocusEvent>,
    bridge: SurfaceBridge<TextModel>,
    highlight: HighlightController,
    prefs: PreferenceStore,
    key_mappings: KeyMappings,
    radial_enabled: bool,
    connection: ConnectionStatus,
    snippets: Vec<Snippet>,
    terminals: Vec<String>,
    button_ids: Vec<String>,
    dialog: Option<DialogState>,
    document_extension: String,
    theme: String,
    outbound: Sender<WebviewMessage>,
}

impl App {
    pub fn new(config: AppConfig, outbound: Sender<WebviewMessage>) -> Self {
        let (focus_tx, focus_rx) = unbounded();
        let prefs = PreferenceStore::open(&config.prefs_file);
        let key_mappings = prefs::load_key_mappings(&prefs);
        let radial_enabled = prefs.read(RADIAL_ENABLED_KEY, false);
        let highlight = HighlightController::new(config.scan_timing(), config.guide_mode);
        let bridge = SurfaceBridge::new(&config.comment_prefix);
        Self {
            config,
            focus: FocusTarget::Editor,
            registry: FocusRegistry::new(focus_tx),
            focus_events: focus_rx,
            bridge,
            highlight,
            prefs,
            key_mappings,
            radial_enabled,
            connection: ConnectionStatus::Disconnected,
            snippets: Vec::new(),
            terminals: Vec::new(),
            button_ids: DEFAULT_TOOLBAR_BUTTONS
                .iter()
                .map(|id| id.to_string())
                .collect(),
            dialog: None,
            document_extension: String::new(),
            theme: String::new(),
            outbound,
        }
    }

    pub fn focus(&self) -> FocusTarget {
        self.focus
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn radial_enabled(&self) -> bool {
        self.radial_enabled
    }

    pub fn key_mappings(&self) -> &KeyMappings {
        &self.key_mappings
    }

    pub fn terminals(&self) -> &[String] {
        &self.terminals
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn document_extension(&self) -> &str {
        &self.document_extension
    }

    pub fn document_content(&self) -> Option<String> {
        self.bridge.content()
    }

    /// Apply one inbound message. `now` feeds the scan engines so tests can
    /// drive time explicitly.
    pub fn handle_message(&mut self, message: HostMessage, now: Instant) {
        match message {
            HostMessage::Init {
                content,
                filename,
                extension,
            } => {
                log_debug(&format!("session: init '{filename}' (.{extension})"));
                self.bridge.mount(TextModel::from_content(&content));
                self.registry.set_editor_attached(true);
                self.document_extension = extension.clone();
                self.send(WebviewMessage::GetSnippets { extension });
            }
            HostMessage::SetTheme { theme } => self.theme = theme,
            HostMessage::SetFocus { target } => self.set_focus(target),
            HostMessage::Snippets { snippets } => self.snippets = snippets,
            HostMessage::Transcript { text } => {
                self.dispatch(KeyToken::Literal(text));
            }
            HostMessage::SetTerminals { terminals } => self.terminals = terminals,
            HostMessage::ConnectionStatus { status } => {
                log_debug(&format!("session: speech server {}", status.label()));
                self.connection = status;
            }
            HostMessage::KeyToken { text } => self.dispatch(KeyToken::parse(&text)),
            HostMessage::ConfirmKey { key, code } => self.handle_confirm_key(&key, &code, now),
            HostMessage::ToggleHighlighting => self.toggle_highlighting(now),
            HostMessage::ButtonOrder { ids } => self.button_ids = ids,
            HostMessage::ActivateButton { id } => self.activate_button(&id, now),
            HostMessage::SetRadialEnabled { enabled } => {
                self.radial_enabled = enabled;
                self.prefs.write(RADIAL_ENABLED_KEY, &enabled);
            }
            HostMessage::InsertSnippet { name } => self.insert_snippet(&name),
        }
        self.drain_focus_events();
    }

    /// Route one token to exactly one destination under the current focus.
    pub fn dispatch(&mut self, token: KeyToken) {
        match dispatch::route(&token, self.focus) {
            Route::Action(action) => self.apply(action),
            Route::EditorLiteral(text) => self.edit(|bridge| bridge.insert_at_cursor(&text)),
            Route::TerminalLiteral(text) => self.send(WebviewMessage::TerminalInput { text }),
            Route::DialogLiteral(text) => self.registry.insert_into_active_input(&text),
        }
        self.drain_focus_events();
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Editor(op) => self.apply_editor_op(op),
            Action::Send(message) => self.send_gated(message),
            Action::SetFocus(target) => self.set_focus(target),
            Action::SendAndFocus(message, target) => {
                self.send_gated(message);
                self.set_focus(target);
            }
            Action::DialogInsert(text) => self.registry.insert_into_active_input(&text),
            Action::DialogDelete => self.registry.delete_from_active_input(),
            Action::DialogCommit => self.commit_dialog(),
            Action::OpenDialog(kind) => self.open_dialog(kind),
            Action::TerminalPaste => {
                if let Some(text) = self.bridge.clipboard_text() {
                    let text = text.to_string();
                    self.send(WebviewMessage::TerminalPaste { text });
                }
            }
        }
    }

    fn apply_editor_op(&mut self, op: EditorOp) {
        self.edit(|bridge| match op {
            EditorOp::Insert(text) => bridge.insert_at_cursor(&text),
            EditorOp::Delete => bridge.delete_at_cursor(),
            EditorOp::Enter => bridge.enter_at_cursor(),
            EditorOp::ToggleComment => bridge.comment_at_cursor(),
            EditorOp::Copy => bridge.copy_selection(),
            EditorOp::Cut => bridge.cut_selection(),
            EditorOp::Paste => bridge.paste_clipboard(),
            EditorOp::Undo => bridge.undo(),
            EditorOp::Redo => bridge.redo(),
        });
    }

    /// Run one edit and report the new document when it actually changed.
    fn edit(&mut self, f: impl FnOnce(&mut SurfaceBridge<TextModel>)) {
        let before = self.bridge.content();
        f(&mut self.bridge);
        let Some(content) = self.bridge.content() else {
            return;
        };
        if before.as_deref() != Some(content.as_str()) {
            self.send(WebviewMessage::Edit { content });
        }
    }

    fn set_focus(&mut self, target: FocusTarget) {
        if target == FocusTarget::Dialog && self.dialog.is_none() {
            log_debug("session: ignoring dialog focus with no open dialog");
            return;
        }
        if target != FocusTarget::Dialog {
            self.close_dialog();
        }
        self.focus = target;
    }

    fn open_dialog(&mut self, kind: DialogKind) {
        let id = match kind {
            DialogKind::CreateFile => "create-file-name",
            DialogKind::CreateFolder => "create-folder-name",
        };
        let input = Arc::new(Mutex::new(NativeInput::new(id)));
        self.registry.set_active_input(Some(&input));
        self.dialog = Some(DialogState { kind, input });
        self.focus = FocusTarget::Dialog;
    }

    /// Send the create request if a name was typed, then close and refocus.
    fn commit_dialog(&mut self) {
        let Some(dialog) = self.dialog.take() else {
            return;
        };
        let name = {
            let guard = dialog.input.lock().unwrap_or_else(|e| e.into_inner());
            guard.value().trim().to_string()
        };
        if !name.is_empty() {
            let message = match dialog.kind {
                DialogKind::CreateFile => WebviewMessage::CreateFile { name },
                DialogKind::CreateFolder => WebviewMessage::CreateFolder { name },
            };
            self.send(message);
        }
        self.registry.set_active_input(None);
        self.focus = FocusTarget::Editor;
    }

    fn close_dialog(&mut self) {
        if self.dialog.take().is_some() {
            self.registry.set_active_input(None);
        }
    }

    /// Check a raw key press against the configured confirm binding and, on a
    /// match, commit whatever a scan loop currently highlights.
    pub fn handle_confirm_key(&mut self, key: &str, code: &str, now: Instant) {
        let binding = &self.key_mappings.highlight_sequence;
        if key != binding.key && code != binding.code {
            return;
        }
        let input_has_focus = self.registry.has_active_input();
        let outcome = self.highlight.confirm(now, &self.button_ids, input_has_focus);
        match outcome {
            ConfirmOutcome::ActivateButton(id) => self.activate_button(&id, now),
            ConfirmOutcome::GuideHandoff(target) => {
                log_debug(&format!("session: guide committed {target:?}"))
            }
            ConfirmOutcome::Ignored => {}
        }
    }

    /// Activate one toolbar button by id, whether from a click, gaze dwell,
    /// or a scan commit.
    pub fn activate_button(&mut self, id: &str, now: Instant) {
        if let Some(name) = id.strip_prefix("terminal:") {
            self.send(WebviewMessage::TerminalShow { name: name.into() });
            return;
        }
        match id {
            "highlight-toggle" => self.toggle_highlighting(now),
            "create-file" => self.open_dialog(DialogKind::CreateFile),
            "create-folder" => self.open_dialog(DialogKind::CreateFolder),
            "preview" => self.send(WebviewMessage::OpenSimpleBrowser {
                url: DEFAULT_PREVIEW_URL.into(),
            }),
            "speech-server" => self.toggle_speech_server(),
            "start-listening" => self.send(WebviewMessage::StartListening),
            "stop-listening" => self.send(WebviewMessage::StopListening),
            other => match CommandKey::from_name(other) {
                Some(command) => self.activate_command(command),
                None => log_debug(&format!("session: unknown button '{other}'")),
            },
        }
        self.drain_focus_events();
    }

    /// Command buttons act on their home target, not the current focus: a
    /// comment button clicked while the terminal has focus still toggles the
    /// editor comment, and a cls button always clears the terminal.
    fn activate_command(&mut self, command: CommandKey) {
        let action = dispatch::command_action(FocusTarget::Editor, command)
            .or_else(|| dispatch::command_action(FocusTarget::Terminal, command));
        match action {
            Some(action) => self.apply(action),
            None => log_debug(&format!("session: button '{}' has no action", command.name())),
        }
    }

    /// The three-way highlighting switch; restarting goes through the
    /// section guide.
    pub fn toggle_highlighting(&mut self, now: Instant) {
        self.highlight.toggle(now);
    }

    fn toggle_speech_server(&mut self) {
        match self.connection {
            ConnectionStatus::Disconnected => self.send(WebviewMessage::StartSpeechServer),
            ConnectionStatus::Connected => self.send(WebviewMessage::StopSpeechServer),
            ConnectionStatus::Connecting => {
                log_debug("session: speech server busy connecting; ignoring toggle")
            }
        }
    }

    /// A start request is refused mid-handshake; everything else passes
    /// through.
    fn send_gated(&mut self, message: WebviewMessage) {
        if message == WebviewMessage::StartSpeechServer
            && self.connection == ConnectionStatus::Connecting
        {
            log_debug("session: refusing speech server start while connecting");
            return;
        }
        self.send(message);
    }

    fn send(&self, message: WebviewMessage) {
        if self.outbound.send(message).is_err() {
            log_debug("session: outbound channel closed");
        }
    }

    fn insert_snippet(&mut self, name: &str) {
        let Some(snippet) = self.snippets.iter().find(|s| s.name == name) else {
            log_debug(&format!("session: unknown snippet '{name}'"));
            return;
        };
        let body = snippet.body.clone();
        self.edit(|bridge| bridge.insert_multiple_at_cursor(&body));
    }

    /// Advance the scan engines; called from the main loop on every poll
    /// timeout.
    pub fn tick(&mut self, now: Instant) {
        self.highlight.tick(now, &self.button_ids);
        self.drain_focus_events();
    }

    fn drain_focus_events(&mut self) {
        while let Ok(event) = self.focus_events.try_recv() {
            match event {
                FocusEvent::EditorRefocused => {
                    // only restore focus the dialog still holds; an explicit
                    // reassignment that closed the dialog wins over the
                    // implicit editor restore
                    if self.dialog.is_none() && self.focus == FocusTarget::Dialog {
                        self.focus = FocusTarget::Editor;
                    }
                }
                FocusEvent::InputChanged { id, value, caret } => {
                    if self.config.log_timings {
                        log_debug(&format!("session: input '{id}' = '{value}' caret {caret}"));
                    }
                }
            }
        }
    }
}
