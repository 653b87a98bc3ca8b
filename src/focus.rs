//! Focus routing: tracks the logical owner of keyboard input and the native
//! text input (if any) currently holding focus inside a dialog.

use crate::log_debug;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, Weak};

/// Logical owner of keyboard input. Exactly one target is active at a time;
/// the session starts on the editor and the value is only ever reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusTarget {
    #[default]
    Editor,
    Terminal,
    Dialog,
}

impl FocusTarget {
    pub fn display_name(&self) -> &'static str {
        match self {
            FocusTarget::Editor => "Editor",
            FocusTarget::Terminal => "Terminal",
            FocusTarget::Dialog => "Dialog",
        }
    }
}

/// A native text input inside an open dialog: a value plus a selection range
/// expressed in characters. `start <= end`; a collapsed range is the caret.
#[derive(Debug)]
pub struct NativeInput {
    id: String,
    value: String,
    selection_start: usize,
    selection_end: usize,
}

impl NativeInput {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            value: String::new(),
            selection_start: 0,
            selection_end: 0,
        }
    }

    pub fn with_value(id: &str, value: &str) -> Self {
        let mut input = Self::new(id);
        input.value = value.to_string();
        let len = input.char_len();
        input.selection_start = len;
        input.selection_end = len;
        input
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn caret(&self) -> usize {
        self.selection_end
    }

    pub fn selection(&self) -> (usize, usize) {
        (self.selection_start, self.selection_end)
    }

    /// Move the selection; indices are clamped to the value length and
    /// swapped if given out of order.
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.char_len();
        let (mut start, mut end) = (start.min(len), end.min(len));
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        self.selection_start = start;
        self.selection_end = end;
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    /// Replace the current selection with `text` and collapse the caret to
    /// the end of the inserted text.
    fn replace_selection(&mut self, text: &str) {
        let chars: Vec<char> = self.value.chars().collect();
        let mut next: String = chars[..self.selection_start].iter().collect();
        next.push_str(text);
        next.extend(&chars[self.selection_end..]);
        self.value = next;
        let caret = self.selection_start + text.chars().count();
        self.selection_start = caret;
        self.selection_end = caret;
    }

    /// Delete the selection, or one character before the caret when the
    /// selection is collapsed. No-op at position zero.
    fn delete_backward(&mut self) -> bool {
        if self.selection_start != self.selection_end {
            self.replace_selection("");
            return true;
        }
        if self.selection_start == 0 {
            return false;
        }
        self.selection_start -= 1;
        self.replace_selection("");
        true
    }
}

/// Notification emitted after every registry mutation so whatever owns the
/// input's rendered value stays consistent with the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    InputChanged {
        id: String,
        value: String,
        caret: usize,
    },
    EditorRefocused,
}

/// Session-wide handle to "the native input currently holding logical focus,
/// if any". Holds a weak reference only; the dialog owns its inputs and the
/// registry must survive the input being torn down mid-dispatch.
pub struct FocusRegistry {
    active_input: Option<Weak<Mutex<NativeInput>>>,
    editor_attached: bool,
    events: Sender<FocusEvent>,
}

impl FocusRegistry {
    pub fn new(events: Sender<FocusEvent>) -> Self {
        Self {
            active_input: None,
            editor_attached: false,
            events,
        }
    }

    /// Record whether an editing surface is mounted; clearing the active
    /// input only attempts an editor refocus while one is.
    pub fn set_editor_attached(&mut self, attached: bool) {
        self.editor_attached = attached;
    }

    /// Record the input that gained focus, or clear it when the dialog
    /// closes. Clearing attempts to hand focus back to the editing surface.
    pub fn set_active_input(&mut self, input: Option<&Arc<Mutex<NativeInput>>>) {
        match input {
            Some(input) => self.active_input = Some(Arc::downgrade(input)),
            None => {
                self.active_input = None;
                if self.editor_attached {
                    let _ = self.events.send(FocusEvent::EditorRefocused);
                }
            }
        }
    }

    /// True while the tracked input is still alive.
    pub fn has_active_input(&self) -> bool {
        self.active_input
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some()
    }

    /// Insert `text` at the active input's selection, replacing any selected
    /// range, then notify subscribers. No-op without an active input.
    pub fn insert_into_active_input(&mut self, text: &str) {
        self.mutate_active(|input| {
            input.replace_selection(text);
            true
        });
    }

    /// Delete the selection, or one character before the caret. No-op without
    /// an active input or at position zero.
    pub fn delete_from_active_input(&mut self) {
        self.mutate_active(NativeInput::delete_backward);
    }

    /// Read the active input's value, if one is alive.
    pub fn active_value(&self) -> Option<String> {
        let input = self.active_input.as_ref()?.upgrade()?;
        let guard = input.lock().unwrap_or_else(|e| e.into_inner());
        Some(guard.value().to_string())
    }

    fn mutate_active(&mut self, f: impl FnOnce(&mut NativeInput) -> bool) {
        let Some(input) = self.active_input.as_ref().and_then(Weak::upgrade) else {
            log_debug("focus: no active input; dropping mutation");
            return;
        };
        let mut guard = input.lock().unwrap_or_else(|e| e.into_inner());
        if f(&mut guard) {
            let _ = self.events.send(FocusEvent::InputChanged {
                id: guard.id().to_string(),
                value: guard.value().to_string(),
                caret: guard.caret(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Receiver};

    fn registry() -> (FocusRegistry, Receiver<FocusEvent>) {
        let (tx, rx) = unbounded();
        (FocusRegistry::new(tx), rx)
    }

    #[test]
    fn insert_replaces_selection_and_moves_caret() {
        let (mut registry, rx) = registry();
        let input = Arc::new(Mutex::new(NativeInput::with_value("name", "hello")));
        input.lock().unwrap().select(1, 4);
        registry.set_active_input(Some(&input));

        registry.insert_into_active_input("ipp");

        let guard = input.lock().unwrap();
        assert_eq!(guard.value(), "hippo");
        assert_eq!(guard.caret(), 4);
        let event = rx.try_recv().expect("change event");
        assert_eq!(
            event,
            FocusEvent::InputChanged {
                id: "name".into(),
                value: "hippo".into(),
                caret: 4,
            }
        );
    }

    #[test]
    fn delete_removes_one_char_before_caret() {
        let (mut registry, _rx) = registry();
        let input = Arc::new(Mutex::new(NativeInput::with_value("name", "abc")));
        registry.set_active_input(Some(&input));

        registry.delete_from_active_input();
        assert_eq!(input.lock().unwrap().value(), "ab");
    }

    #[test]
    fn delete_at_position_zero_is_a_noop() {
        let (mut registry, rx) = registry();
        let input = Arc::new(Mutex::new(NativeInput::with_value("name", "abc")));
        input.lock().unwrap().select(0, 0);
        registry.set_active_input(Some(&input));

        registry.delete_from_active_input();
        assert_eq!(input.lock().unwrap().value(), "abc");
        assert!(rx.try_recv().is_err(), "no-op must not notify");
    }

    #[test]
    fn delete_prefers_selection_over_backspace() {
        let (mut registry, _rx) = registry();
        let input = Arc::new(Mutex::new(NativeInput::with_value("name", "abcdef")));
        input.lock().unwrap().select(1, 4);
        registry.set_active_input(Some(&input));

        registry.delete_from_active_input();
        let guard = input.lock().unwrap();
        assert_eq!(guard.value(), "aef");
        assert_eq!(guard.caret(), 1);
    }

    #[test]
    fn clearing_active_input_requests_editor_refocus() {
        let (mut registry, rx) = registry();
        registry.set_editor_attached(true);
        let input = Arc::new(Mutex::new(NativeInput::new("name")));
        registry.set_active_input(Some(&input));

        registry.set_active_input(None);
        assert!(!registry.has_active_input());
        assert_eq!(rx.try_recv(), Ok(FocusEvent::EditorRefocused));
    }

    #[test]
    fn no_refocus_without_an_attached_editor() {
        let (mut registry, rx) = registry();
        registry.set_active_input(None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_input_behaves_like_no_input() {
        let (mut registry, rx) = registry();
        let input = Arc::new(Mutex::new(NativeInput::with_value("name", "x")));
        registry.set_active_input(Some(&input));
        drop(input);

        assert!(!registry.has_active_input());
        registry.insert_into_active_input("y");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn insert_handles_multibyte_values() {
        let (mut registry, _rx) = registry();
        let input = Arc::new(Mutex::new(NativeInput::with_value("name", "héllo")));
        input.lock().unwrap().select(2, 2);
        registry.set_active_input(Some(&input));

        registry.insert_into_active_input("ß");
        assert_eq!(input.lock().unwrap().value(), "héßllo");
    }
}
