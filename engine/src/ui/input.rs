//! Single-line text drafts for the login and lookup forms.

use unicode_segmentation::UnicodeSegmentation;

/// Handles text editing with proper Unicode grapheme cluster support.
///
/// The cursor counts grapheme clusters, not bytes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DraftInput {
    text: String,
    cursor: usize,
}

impl DraftInput {
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut draft = Self::default();
        draft.set_text(text.into());
        draft
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        let cursor_moved_right = self.cursor.saturating_add(1);
        self.cursor = self.clamp_cursor(cursor_moved_right);
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.grapheme_count();
    }

    /// Line breaks are dropped; both forms are single-line.
    pub fn enter_char(&mut self, new_char: char) {
        if matches!(new_char, '\n' | '\r') {
            return;
        }
        let index = self.byte_index();
        self.text.insert(index, new_char);
        self.cursor_after(index + new_char.len_utf8());
    }

    /// Insert pasted text, flattening line breaks to nothing.
    pub fn enter_text(&mut self, text: &str) {
        let flat: String = text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
        if flat.is_empty() {
            return;
        }
        let index = self.byte_index();
        self.text.insert_str(index, &flat);
        self.cursor_after(index + flat.len());
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }

        let start = self.byte_index_at(self.cursor - 1);
        let end = self.byte_index_at(self.cursor);
        self.text.replace_range(start..end, "");
        self.move_cursor_left();
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor >= self.grapheme_count() {
            return;
        }

        let start = self.byte_index_at(self.cursor);
        let end = self.byte_index_at(self.cursor + 1);
        self.text.replace_range(start..end, "");
    }

    pub fn delete_word_backwards(&mut self) {
        while self.cursor > 0 && self.grapheme_is_whitespace(self.cursor - 1) {
            self.delete_char();
        }
        while self.cursor > 0 && !self.grapheme_is_whitespace(self.cursor - 1) {
            self.delete_char();
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.cursor = self.grapheme_count();
    }

    #[must_use]
    pub fn grapheme_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    /// Text before the cursor, for positioning the terminal caret.
    #[must_use]
    pub fn text_before_cursor(&self) -> &str {
        &self.text[..self.byte_index()]
    }

    fn grapheme_is_whitespace(&self, index: usize) -> bool {
        self.text
            .graphemes(true)
            .nth(index)
            .is_some_and(|grapheme| grapheme.chars().all(char::is_whitespace))
    }

    fn byte_index(&self) -> usize {
        self.byte_index_at(self.cursor)
    }

    fn byte_index_at(&self, grapheme_index: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .nth(grapheme_index)
            .map_or(self.text.len(), |(i, _)| i)
    }

    /// Move the cursor to just past byte `end`. Counted on the whole prefix
    /// because an inserted combining mark joins the preceding grapheme.
    fn cursor_after(&mut self, end: usize) {
        let count = self.text[..end].graphemes(true).count();
        self.cursor = self.clamp_cursor(count);
    }

    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.min(self.grapheme_count())
    }
}
