//! The fixed operation contract the core requires from the text-editing
//! surface, plus the cursor-relative edit algorithms built on top of it.
//! Every bridge op is a silent no-op while no surface is mounted, since the
//! surface legitimately unmounts during dialog transitions.

use regex::Regex;
use std::sync::OnceLock;

/// 1-based line/column pair, columns counted in characters. Column `n` sits
/// before the line's `n`-th character; `len + 1` is the end of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A document range. `caret` spans are empty; `normalized` guarantees
/// `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn caret(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn normalized(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

/// Capability contract of the embedded editing surface. The core drives the
/// surface exclusively through this trait; `replace` is a single undoable
/// edit that leaves the cursor at the end of the inserted text.
pub trait EditingSurface {
    fn cursor(&self) -> Position;
    fn set_cursor(&mut self, position: Position);
    fn selection(&self) -> Option<Span>;
    fn set_selection(&mut self, span: Span);
    fn clear_selection(&mut self);
    fn line_count(&self) -> u32;
    fn line(&self, line: u32) -> Option<&str>;
    fn text_in(&self, span: Span) -> String;
    fn replace(&mut self, span: Span, text: &str);
    /// Placeholder-aware insertion; tab-stops stay interactive on surfaces
    /// that support them.
    fn insert_snippet(&mut self, snippet: &str);
    fn trigger_suggest(&mut self);
    fn undo(&mut self);
    fn redo(&mut self);
    fn content(&self) -> String;
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$(\d+|\{\d+(?::[^}]*)?\})").expect("static regex"))
}

/// True when `text` contains snippet placeholder syntax (`$n` or `${n:...}`).
pub fn has_snippet_placeholders(text: &str) -> bool {
    placeholder_re().is_match(text)
}

/// Replace placeholders with their default text (`${1:name}` → `name`,
/// `$1` / `${1}` → nothing). Used by surfaces without interactive tab-stops.
pub fn expand_placeholders(text: &str) -> String {
    placeholder_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let token = &caps[1];
            match token.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
                Some(inner) => inner
                    .split_once(':')
                    .map(|(_, default)| default.to_string())
                    .unwrap_or_default(),
                None => String::new(),
            }
        })
        .into_owned()
}

const UNDO_DEPTH: usize = 200;

#[derive(Debug, Clone)]
struct Snapshot {
    lines: Vec<String>,
    cursor: Position,
    selection: Option<Span>,
}

/// In-process implementation of the editing surface: a line buffer with
/// cursor, selection, and undo/redo history. Stands in for the embedded
/// editor component and backs all edit-algorithm tests.
#[derive(Debug)]
pub struct TextModel {
    lines: Vec<String>,
    cursor: Position,
    selection: Option<Span>,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    suggest_requests: usize,
    snippet_inserts: usize,
}

impl TextModel {
    pub fn new() -> Self {
        Self::from_content("")
    }

    pub fn from_content(content: &str) -> Self {
        let lines: Vec<String> = content.split('\n').map(str::to_string).collect();
        Self {
            lines,
            cursor: Position::new(1, 1),
            selection: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            suggest_requests: 0,
            snippet_inserts: 0,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of suggestion-popup requests seen so far.
    pub fn suggest_requests(&self) -> usize {
        self.suggest_requests
    }

    /// Number of placeholder-aware insertions seen so far.
    pub fn snippet_inserts(&self) -> usize {
        self.snippet_inserts
    }

    fn line_char_count(&self, line: u32) -> u32 {
        self.lines
            .get(line as usize - 1)
            .map(|l| l.chars().count() as u32)
            .unwrap_or(0)
    }

    fn clamp_position(&self, position: Position) -> Position {
        let line = position.line.clamp(1, self.lines.len() as u32);
        let column = position.column.clamp(1, self.line_char_count(line) + 1);
        Position::new(line, column)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            lines: self.lines.clone(),
            cursor: self.cursor,
            selection: self.selection,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.lines = snapshot.lines;
        self.cursor = snapshot.cursor;
        self.selection = snapshot.selection;
    }

    fn push_undo(&mut self) {
        self.undo_stack.push(self.snapshot());
        if self.undo_stack.len() > UNDO_DEPTH {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    fn char_prefix(text: &str, columns: u32) -> String {
        text.chars().take(columns as usize - 1).collect()
    }

    fn char_suffix(text: &str, columns: u32) -> String {
        text.chars().skip(columns as usize - 1).collect()
    }
}

impl Default for TextModel {
    fn default() -> Self {
        Self::new()
    }
}

impl EditingSurface for TextModel {
    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, position: Position) {
        self.cursor = self.clamp_position(position);
        self.selection = None;
    }

    fn selection(&self) -> Option<Span> {
        self.selection
    }

    fn set_selection(&mut self, span: Span) {
        let span = Span::new(
            self.clamp_position(span.start),
            self.clamp_position(span.end),
        )
        .normalized();
        self.cursor = span.end;
        self.selection = Some(span);
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    fn line(&self, line: u32) -> Option<&str> {
        self.lines.get(line as usize - 1).map(String::as_str)
    }

    fn text_in(&self, span: Span) -> String {
        let span = Span::new(
            self.clamp_position(span.start),
            self.clamp_position(span.end),
        )
        .normalized();
        if span.start.line == span.end.line {
            let line = &self.lines[span.start.line as usize - 1];
            return line
                .chars()
                .skip(span.start.column as usize - 1)
                .take((span.end.column - span.start.column) as usize)
                .collect();
        }
        let mut parts = Vec::new();
        parts.push(Self::char_suffix(
            &self.lines[span.start.line as usize - 1],
            span.start.column,
        ));
        for line in span.start.line + 1..span.end.line {
            parts.push(self.lines[line as usize - 1].clone());
        }
        parts.push(Self::char_prefix(
            &self.lines[span.end.line as usize - 1],
            span.end.column,
        ));
        parts.join("\n")
    }

    fn replace(&mut self, span: Span, text: &str) {
        let span = Span::new(
            self.clamp_position(span.start),
            self.clamp_position(span.end),
        )
        .normalized();
        self.push_undo();

        let prefix = Self::char_prefix(&self.lines[span.start.line as usize - 1], span.start.column);
        let suffix = Self::char_suffix(&self.lines[span.end.line as usize - 1], span.end.column);
        let parts: Vec<&str> = text.split('\n').collect();

        let mut replacement = Vec::with_capacity(parts.len());
        if parts.len() == 1 {
            replacement.push(format!("{prefix}{}{suffix}", parts[0]));
        } else {
            replacement.push(format!("{prefix}{}", parts[0]));
            for part in &parts[1..parts.len() - 1] {
                replacement.push((*part).to_string());
            }
            replacement.push(format!("{}{suffix}", parts[parts.len() - 1]));
        }
        self.lines.splice(
            span.start.line as usize - 1..span.end.line as usize,
            replacement,
        );

        self.cursor = if parts.len() == 1 {
            Position::new(
                span.start.line,
                span.start.column + parts[0].chars().count() as u32,
            )
        } else {
            Position::new(
                span.start.line + parts.len() as u32 - 1,
                parts[parts.len() - 1].chars().count() as u32 + 1,
            )
        };
        self.selection = None;
    }

    fn insert_snippet(&mut self, snippet: &str) {
        let expanded = expand_placeholders(snippet);
        let span = self
            .selection
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Span::caret(self.cursor));
        self.replace(span, &expanded);
        self.snippet_inserts += 1;
    }

    fn trigger_suggest(&mut self) {
        self.suggest_requests += 1;
    }

    fn undo(&mut self) {
        if let Some(snapshot) = self.undo_stack.pop() {
            self.redo_stack.push(self.snapshot());
            self.restore(snapshot);
        }
    }

    fn redo(&mut self) {
        if let Some(snapshot) = self.redo_stack.pop() {
            self.undo_stack.push(self.snapshot());
            self.restore(snapshot);
        }
    }

    fn content(&self) -> String {
        self.lines.join("\n")
    }
}

/// Cursor-relative edit algorithms over whichever surface is mounted, plus
/// the session clipboard. Ops guard on surface presence and never fail.
pub struct SurfaceBridge<S: EditingSurface = TextModel> {
    surface: Option<S>,
    clipboard: Option<String>,
    comment_prefix: String,
}

impl<S: EditingSurface> SurfaceBridge<S> {
    pub fn new(comment_prefix: &str) -> Self {
        Self {
            surface: None,
            clipboard: None,
            comment_prefix: comment_prefix.to_string(),
        }
    }

    pub fn mount(&mut self, surface: S) {
        self.surface = Some(surface);
    }

    pub fn unmount(&mut self) {
        self.surface = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn content(&self) -> Option<String> {
        self.surface.as_ref().map(EditingSurface::content)
    }

    pub fn clipboard_text(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    /// `{line, column}` of the caret, or `None` while unmounted.
    pub fn get_cursor_position(&self) -> Option<Position> {
        self.surface.as_ref().map(EditingSurface::cursor)
    }

    /// Insert at the caret (replacing any selection). Placeholder syntax
    /// routes through the snippet path so tab-stops stay interactive; plain
    /// text additionally wakes the suggestion popup.
    pub fn insert_at_cursor(&mut self, text: &str) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if has_snippet_placeholders(text) {
            surface.insert_snippet(text);
            return;
        }
        let span = surface
            .selection()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Span::caret(surface.cursor()));
        surface.replace(span, text);
        surface.trigger_suggest();
    }

    /// Insert several lines: one snippet block when placeholder syntax is
    /// present anywhere, otherwise plain inserts joined by synthesized enters
    /// so per-line auto-indent still applies.
    pub fn insert_multiple_at_cursor(&mut self, lines: &[String]) {
        if self.surface.is_none() || lines.is_empty() {
            return;
        }
        let joined = lines.join("\n");
        if has_snippet_placeholders(&joined) {
            if let Some(surface) = self.surface.as_mut() {
                surface.insert_snippet(&joined);
            }
            return;
        }
        for (index, line) in lines.iter().enumerate() {
            if index > 0 {
                self.enter_at_cursor();
            }
            self.insert_at_cursor(line);
        }
    }

    /// Insert lines and comment the full inserted range, regardless of the
    /// comment state at the insertion point.
    pub fn insert_comment_block_at_cursor(&mut self, lines: &[String]) {
        let Some(before) = self.get_cursor_position() else {
            return;
        };
        self.insert_multiple_at_cursor(lines);
        let Some(after) = self.get_cursor_position() else {
            return;
        };
        if let Some(surface) = self.surface.as_mut() {
            let end_column = surface
                .line(after.line)
                .map(|l| l.chars().count() as u32 + 1)
                .unwrap_or(1);
            surface.set_selection(Span::new(
                Position::new(before.line, 1),
                Position::new(after.line, end_column),
            ));
        }
        self.comment_at_cursor();
    }

    /// Delete the selection, or one character left of the caret. At column 1
    /// the line merges with its predecessor; at the very start of the
    /// document nothing happens.
    pub fn delete_at_cursor(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if let Some(selection) = surface.selection().filter(|s| !s.is_empty()) {
            surface.replace(selection.normalized(), "");
            return;
        }
        let cursor = surface.cursor();
        if cursor.column == 1 {
            if cursor.line <= 1 {
                return;
            }
            let previous_end = surface
                .line(cursor.line - 1)
                .map(|l| l.chars().count() as u32 + 1)
                .unwrap_or(1);
            surface.replace(
                Span::new(
                    Position::new(cursor.line - 1, previous_end),
                    Position::new(cursor.line, 1),
                ),
                "",
            );
            return;
        }
        surface.replace(
            Span::new(Position::new(cursor.line, cursor.column - 1), cursor),
            "",
        );
    }

    /// Newline plus the current line's leading whitespace (auto-indent).
    pub fn enter_at_cursor(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let span = surface
            .selection()
            .filter(|s| !s.is_empty())
            .map(Span::normalized)
            .unwrap_or_else(|| Span::caret(surface.cursor()));
        let indent: String = surface
            .line(span.start.line)
            .map(|l| l.chars().take_while(|c| *c == ' ' || *c == '\t').collect())
            .unwrap_or_default();
        surface.replace(span, &format!("\n{indent}"));
    }

    /// Toggle line comments over the selection span (or the current line).
    /// A fully commented range is uncommented; anything mixed is commented.
    pub fn comment_at_cursor(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let prefix = self.comment_prefix.clone();
        let prefix_columns = prefix.chars().count() as u32;
        let selection = surface
            .selection()
            .filter(|s| !s.is_empty())
            .map(Span::normalized);
        let cursor = surface.cursor();
        let (start_line, end_line) = match &selection {
            Some(span) => (span.start.line, span.end.line),
            None => (cursor.line, cursor.line),
        };

        let all_commented = (start_line..=end_line).all(|line| {
            surface
                .line(line)
                .map(|text| text.trim_start().starts_with(prefix.as_str()))
                .unwrap_or(false)
        });

        for line in start_line..=end_line {
            if all_commented {
                let indent = surface
                    .line(line)
                    .map(|text| text.chars().take_while(|c| c.is_whitespace()).count() as u32)
                    .unwrap_or(0);
                surface.replace(
                    Span::new(
                        Position::new(line, indent + 1),
                        Position::new(line, indent + 1 + prefix_columns),
                    ),
                    "",
                );
            } else {
                surface.replace(Span::caret(Position::new(line, 1)), &prefix);
            }
        }

        if selection.is_some() {
            let end_column = surface
                .line(end_line)
                .map(|l| l.chars().count() as u32 + 1)
                .unwrap_or(1);
            surface.set_selection(Span::new(
                Position::new(start_line, 1),
                Position::new(end_line, end_column),
            ));
        } else {
            let column = if all_commented {
                cursor.column.saturating_sub(prefix_columns).max(1)
            } else {
                cursor.column + prefix_columns
            };
            surface.set_cursor(Position::new(cursor.line, column));
        }
    }

    /// Copy the selected text to the clipboard. No-op without a selection.
    pub fn copy_selection(&mut self) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        let Some(selection) = surface.selection().filter(|s| !s.is_empty()) else {
            return;
        };
        self.clipboard = Some(surface.text_in(selection));
    }

    /// Copy then delete the selection, caret landing at its start.
    pub fn cut_selection(&mut self) {
        self.copy_selection();
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if let Some(selection) = surface.selection().filter(|s| !s.is_empty()) {
            surface.replace(selection.normalized(), "");
        }
    }

    /// Insert the clipboard text at the caret.
    pub fn paste_clipboard(&mut self) {
        let Some(text) = self.clipboard.clone() else {
            return;
        };
        self.insert_at_cursor(&text);
    }

    pub fn undo(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.undo();
        }
    }

    pub fn redo(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.redo();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge_with(content: &str) -> SurfaceBridge<TextModel> {
        let mut bridge = SurfaceBridge::new("//");
        bridge.mount(TextModel::from_content(content));
        bridge
    }

    fn lines(bridge: &SurfaceBridge<TextModel>) -> Vec<String> {
        bridge.surface().unwrap().lines().to_vec()
    }

    #[test]
    fn ops_without_a_mounted_surface_are_noops() {
        let mut bridge: SurfaceBridge<TextModel> = SurfaceBridge::new("//");
        bridge.insert_at_cursor("x");
        bridge.delete_at_cursor();
        bridge.enter_at_cursor();
        bridge.comment_at_cursor();
        bridge.paste_clipboard();
        assert_eq!(bridge.get_cursor_position(), None);
        assert_eq!(bridge.content(), None);
    }

    #[test]
    fn insert_at_cursor_replaces_selection() {
        let mut bridge = bridge_with("hello world");
        bridge
            .surface_mut()
            .unwrap()
            .set_selection(Span::new(Position::new(1, 7), Position::new(1, 12)));
        bridge.insert_at_cursor("there");
        assert_eq!(lines(&bridge), vec!["hello there"]);
        assert_eq!(bridge.get_cursor_position(), Some(Position::new(1, 12)));
    }

    #[test]
    fn plain_insert_wakes_the_suggestion_popup() {
        let mut bridge = bridge_with("");
        bridge.insert_at_cursor("pri");
        assert_eq!(bridge.surface().unwrap().suggest_requests(), 1);
        assert_eq!(bridge.surface().unwrap().snippet_inserts(), 0);
    }

    #[test]
    fn placeholder_text_takes_the_snippet_path() {
        let mut bridge = bridge_with("");
        bridge.insert_at_cursor("for ${1:item} in $2:");
        let surface = bridge.surface().unwrap();
        assert_eq!(surface.snippet_inserts(), 1);
        assert_eq!(surface.suggest_requests(), 0);
        assert_eq!(surface.lines(), ["for item in :"]);
    }

    #[test]
    fn multi_line_insert_with_placeholder_is_one_snippet_block() {
        let mut bridge = bridge_with("");
        bridge.insert_multiple_at_cursor(&["foo $1 bar".into()]);
        assert_eq!(bridge.surface().unwrap().snippet_inserts(), 1);

        let mut bridge = bridge_with("");
        bridge.insert_multiple_at_cursor(&["def f():".into(), "    pass $0".into()]);
        assert_eq!(bridge.surface().unwrap().snippet_inserts(), 1);
        assert_eq!(lines(&bridge), vec!["def f():", "    pass "]);
    }

    #[test]
    fn plain_multi_line_insert_synthesizes_enters() {
        let mut bridge = bridge_with("");
        bridge.insert_multiple_at_cursor(&["foo".into(), "bar".into()]);
        assert_eq!(lines(&bridge), vec!["foo", "bar"]);
        assert_eq!(bridge.surface().unwrap().snippet_inserts(), 0);
        // one plain insert per line
        assert_eq!(bridge.surface().unwrap().suggest_requests(), 2);
    }

    #[test]
    fn multi_line_insert_preserves_indentation_per_line() {
        let mut bridge = bridge_with("    start");
        bridge
            .surface_mut()
            .unwrap()
            .set_cursor(Position::new(1, 10));
        bridge.insert_multiple_at_cursor(&["one".into(), "two".into()]);
        assert_eq!(lines(&bridge), vec!["    startone", "    two"]);
    }

    #[test]
    fn comment_block_comments_inserted_lines() {
        let mut bridge = bridge_with("");
        bridge.insert_comment_block_at_cursor(&["note one".into(), "note two".into()]);
        assert_eq!(lines(&bridge), vec!["//note one", "//note two"]);
    }

    #[test]
    fn delete_at_column_one_merges_lines() {
        let mut bridge = bridge_with("abc\ndef");
        bridge.surface_mut().unwrap().set_cursor(Position::new(2, 1));
        bridge.delete_at_cursor();
        assert_eq!(lines(&bridge), vec!["abcdef"]);
        assert_eq!(bridge.get_cursor_position(), Some(Position::new(1, 4)));
    }

    #[test]
    fn delete_at_document_start_is_a_noop() {
        let mut bridge = bridge_with("abc");
        bridge.surface_mut().unwrap().set_cursor(Position::new(1, 1));
        bridge.delete_at_cursor();
        assert_eq!(lines(&bridge), vec!["abc"]);
    }

    #[test]
    fn delete_removes_selection_and_parks_caret_at_start() {
        let mut bridge = bridge_with("abcdef");
        bridge
            .surface_mut()
            .unwrap()
            .set_selection(Span::new(Position::new(1, 2), Position::new(1, 5)));
        bridge.delete_at_cursor();
        assert_eq!(lines(&bridge), vec!["aef"]);
        assert_eq!(bridge.get_cursor_position(), Some(Position::new(1, 2)));
    }

    #[test]
    fn enter_copies_leading_whitespace() {
        let mut bridge = bridge_with("    indented");
        bridge
            .surface_mut()
            .unwrap()
            .set_cursor(Position::new(1, 13));
        bridge.enter_at_cursor();
        assert_eq!(lines(&bridge), vec!["    indented", "    "]);
        assert_eq!(bridge.get_cursor_position(), Some(Position::new(2, 5)));
    }

    #[test]
    fn comment_toggle_is_idempotent_over_two_calls() {
        let mut bridge = bridge_with("a\nb");
        bridge
            .surface_mut()
            .unwrap()
            .set_selection(Span::new(Position::new(1, 1), Position::new(2, 2)));
        bridge.comment_at_cursor();
        assert_eq!(lines(&bridge), vec!["//a", "//b"]);
        // selection was re-established over the commented range
        bridge.comment_at_cursor();
        assert_eq!(lines(&bridge), vec!["a", "b"]);
    }

    #[test]
    fn mixed_selection_always_comments() {
        let mut bridge = bridge_with("foo\n//bar");
        bridge
            .surface_mut()
            .unwrap()
            .set_selection(Span::new(Position::new(1, 1), Position::new(2, 6)));
        bridge.comment_at_cursor();
        assert_eq!(lines(&bridge), vec!["//foo", "////bar"]);
    }

    #[test]
    fn comment_without_selection_shifts_the_caret() {
        let mut bridge = bridge_with("line");
        bridge.surface_mut().unwrap().set_cursor(Position::new(1, 3));
        bridge.comment_at_cursor();
        assert_eq!(lines(&bridge), vec!["//line"]);
        assert_eq!(bridge.get_cursor_position(), Some(Position::new(1, 5)));

        bridge.comment_at_cursor();
        assert_eq!(lines(&bridge), vec!["line"]);
        assert_eq!(bridge.get_cursor_position(), Some(Position::new(1, 3)));
    }

    #[test]
    fn uncomment_respects_indentation() {
        let mut bridge = bridge_with("    //code");
        bridge.surface_mut().unwrap().set_cursor(Position::new(1, 8));
        bridge.comment_at_cursor();
        assert_eq!(lines(&bridge), vec!["    code"]);
    }

    #[test]
    fn copy_cut_paste_round_trip() {
        let mut bridge = bridge_with("hello world");
        bridge
            .surface_mut()
            .unwrap()
            .set_selection(Span::new(Position::new(1, 1), Position::new(1, 6)));
        bridge.copy_selection();
        assert_eq!(bridge.clipboard_text(), Some("hello"));

        bridge
            .surface_mut()
            .unwrap()
            .set_selection(Span::new(Position::new(1, 7), Position::new(1, 12)));
        bridge.cut_selection();
        assert_eq!(lines(&bridge), vec!["hello "]);
        assert_eq!(bridge.clipboard_text(), Some("world"));

        bridge.paste_clipboard();
        assert_eq!(lines(&bridge), vec!["hello world"]);
    }

    #[test]
    fn copy_without_selection_is_a_noop() {
        let mut bridge = bridge_with("text");
        bridge.copy_selection();
        assert_eq!(bridge.clipboard_text(), None);
    }

    #[test]
    fn undo_and_redo_delegate_to_surface_history() {
        let mut bridge = bridge_with("one");
        bridge.insert_at_cursor("!");
        assert_eq!(lines(&bridge), vec!["!one"]);
        bridge.undo();
        assert_eq!(lines(&bridge), vec!["one"]);
        bridge.redo();
        assert_eq!(lines(&bridge), vec!["!one"]);
    }

    #[test]
    fn placeholder_detection_matches_both_forms() {
        assert!(has_snippet_placeholders("foo $1 bar"));
        assert!(has_snippet_placeholders("x ${2:default} y"));
        assert!(has_snippet_placeholders("${0}"));
        assert!(!has_snippet_placeholders("just $text"));
        assert!(!has_snippet_placeholders("price is $ 5"));
    }

    #[test]
    fn expand_placeholders_keeps_defaults() {
        assert_eq!(expand_placeholders("for ${1:i} in $2"), "for i in ");
        assert_eq!(expand_placeholders("${1}end$0"), "end");
    }

    #[test]
    fn multi_line_replace_positions_cursor_after_insert() {
        let mut model = TextModel::from_content("startend");
        model.replace(Span::caret(Position::new(1, 6)), "a\nbb\nccc");
        assert_eq!(model.lines(), ["starta", "bb", "cccend"]);
        assert_eq!(model.cursor(), Position::new(3, 4));
    }

    #[test]
    fn text_in_handles_multi_line_spans() {
        let model = TextModel::from_content("abc\ndef\nghi");
        let text = model.text_in(Span::new(Position::new(1, 2), Position::new(3, 2)));
        assert_eq!(text, "bc\ndef\ng");
    }
}
