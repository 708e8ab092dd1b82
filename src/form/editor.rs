//! Caret-aware text editing for form controls
//!
//! The caret is stored as a byte offset that always sits on a grapheme
//! boundary, so combined characters and emoji move as one unit.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Editable text buffer backing a text or multi-line field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextEditor {
    text: String,
    caret: usize,
    anchor: Option<usize>,
    multiline: bool,
}

impl TextEditor {
    /// Create an editor with the caret placed after `text`
    #[must_use]
    pub fn new(text: impl Into<String>, multiline: bool) -> Self {
        let text = if multiline {
            text.into()
        } else {
            strip_line_breaks(&text.into())
        };
        let caret = text.len();
        Self {
            text,
            caret,
            anchor: None,
            multiline,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn caret(&self) -> usize {
        self.caret
    }

    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    /// Selected byte range, if any text is selected
    #[must_use]
    pub fn selection(&self) -> Option<Range<usize>> {
        let anchor = self.anchor?;
        if anchor == self.caret {
            return None;
        }
        Some(anchor.min(self.caret)..anchor.max(self.caret))
    }

    /// Replace the whole value. Returns true if the value changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        let text = if self.multiline {
            text.to_string()
        } else {
            strip_line_breaks(text)
        };
        self.anchor = None;
        self.caret = text.len();
        if text == self.text {
            return false;
        }
        self.text = text;
        true
    }

    /// Empty the buffer
    pub fn clear(&mut self) -> bool {
        self.set_text("")
    }

    /// Insert a single character at the caret, replacing the selection
    pub fn insert_char(&mut self, c: char) -> bool {
        if c == '\n' && !self.multiline {
            return false;
        }
        let mut buf = [0u8; 4];
        self.replace_selection(c.encode_utf8(&mut buf))
    }

    /// Insert a string at the caret, replacing the selection.
    ///
    /// Line breaks are dropped in single-line editors.
    pub fn insert_str(&mut self, s: &str) -> bool {
        if self.multiline {
            let normalized = s.replace("\r\n", "\n").replace('\r', "\n");
            self.replace_selection(&normalized)
        } else {
            self.replace_selection(&strip_line_breaks(s))
        }
    }

    /// Insert `width` spaces at the caret instead of moving focus.
    ///
    /// The selection is replaced and the caret lands right after the spaces.
    pub fn insert_indent(&mut self, width: usize) -> bool {
        self.replace_selection(&" ".repeat(width))
    }

    /// Delete the selection or the grapheme before the caret
    pub fn backspace(&mut self) -> bool {
        if self.selection().is_some() {
            return self.replace_selection("");
        }
        self.anchor = None;
        let start = self.prev_boundary();
        if start == self.caret {
            return false;
        }
        self.text.replace_range(start..self.caret, "");
        self.caret = start;
        true
    }

    /// Delete the selection or the grapheme after the caret
    pub fn delete(&mut self) -> bool {
        if self.selection().is_some() {
            return self.replace_selection("");
        }
        self.anchor = None;
        let end = self.next_boundary();
        if end == self.caret {
            return false;
        }
        self.text.replace_range(self.caret..end, "");
        true
    }

    pub fn move_left(&mut self, extend: bool) {
        let target = self.prev_boundary();
        self.move_to(target, extend);
    }

    pub fn move_right(&mut self, extend: bool) {
        let target = self.next_boundary();
        self.move_to(target, extend);
    }

    /// Move to the start of the current line
    pub fn move_home(&mut self, extend: bool) {
        let target = self.text[..self.caret].rfind('\n').map_or(0, |i| i + 1);
        self.move_to(target, extend);
    }

    /// Move to the end of the current line
    pub fn move_end(&mut self, extend: bool) {
        let target = self.text[self.caret..]
            .find('\n')
            .map_or(self.text.len(), |i| self.caret + i);
        self.move_to(target, extend);
    }

    /// Caret position as (line, display column)
    #[must_use]
    pub fn caret_position(&self) -> (usize, usize) {
        let before = &self.text[..self.caret];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        (line, before[line_start..].width())
    }

    fn move_to(&mut self, target: usize, extend: bool) {
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.caret);
            }
        } else {
            self.anchor = None;
        }
        self.caret = target;
    }

    fn replace_selection(&mut self, replacement: &str) -> bool {
        let range = self.selection().unwrap_or(self.caret..self.caret);
        self.anchor = None;
        if range.is_empty() && replacement.is_empty() {
            return false;
        }
        let start = range.start;
        self.text.replace_range(range, replacement);
        self.caret = start + replacement.len();
        true
    }

    fn prev_boundary(&self) -> usize {
        self.text[..self.caret]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(i, _)| i)
    }

    fn next_boundary(&self) -> usize {
        self.text[self.caret..]
            .graphemes(true)
            .next()
            .map_or(self.caret, |g| self.caret + g.len())
    }
}

fn strip_line_breaks(s: &str) -> String {
    s.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace() {
        let mut editor = TextEditor::new("", false);
        assert!(editor.insert_char('h'));
        assert!(editor.insert_char('i'));
        assert_eq!(editor.text(), "hi");
        assert!(editor.backspace());
        assert_eq!(editor.text(), "h");
        assert_eq!(editor.caret(), 1);
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut editor = TextEditor::new("abc", false);
        editor.move_home(false);
        assert!(!editor.backspace());
        assert_eq!(editor.text(), "abc");
    }

    #[test]
    fn test_single_line_rejects_newlines() {
        let mut editor = TextEditor::new("a\nb", false);
        assert_eq!(editor.text(), "ab");
        assert!(!editor.insert_char('\n'));
        editor.insert_str("c\r\nd");
        assert_eq!(editor.text(), "abcd");
    }

    #[test]
    fn test_multiline_keeps_newlines() {
        let mut editor = TextEditor::new("", true);
        editor.insert_str("one\r\ntwo");
        assert_eq!(editor.text(), "one\ntwo");
        assert_eq!(editor.caret_position(), (1, 3));
    }

    #[test]
    fn test_indent_inserts_at_caret() {
        let mut editor = TextEditor::new("ab", true);
        editor.move_left(false);
        assert!(editor.insert_indent(4));
        assert_eq!(editor.text(), "a    b");
        assert_eq!(editor.caret(), 5);
    }

    #[test]
    fn test_indent_replaces_selection() {
        let mut editor = TextEditor::new("abcd", true);
        editor.move_home(false);
        editor.move_right(false);
        editor.move_right(true);
        editor.move_right(true);
        assert_eq!(editor.selection(), Some(1..3));
        editor.insert_indent(4);
        assert_eq!(editor.text(), "a    d");
        assert_eq!(editor.caret(), 5);
        assert!(editor.selection().is_none());
    }

    #[test]
    fn test_grapheme_navigation() {
        // "e" + combining acute accent is a single grapheme
        let mut editor = TextEditor::new("ae\u{301}", false);
        editor.move_left(false);
        assert_eq!(editor.caret(), 1);
        assert!(editor.delete());
        assert_eq!(editor.text(), "a");
    }

    #[test]
    fn test_home_end_follow_lines() {
        let mut editor = TextEditor::new("first\nsecond", true);
        editor.move_home(false);
        assert_eq!(editor.caret(), 6);
        editor.move_left(false);
        editor.move_home(false);
        assert_eq!(editor.caret(), 0);
        editor.move_end(false);
        assert_eq!(editor.caret(), 5);
    }

    #[test]
    fn test_set_text_reports_change() {
        let mut editor = TextEditor::new("same", false);
        assert!(!editor.set_text("same"));
        assert!(editor.set_text("other"));
        assert!(editor.clear());
        assert!(!editor.clear());
    }
}
