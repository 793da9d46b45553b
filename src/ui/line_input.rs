use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    /// The text was edited.
    Changed,
    Submit,
    Cancel,
}

/// Single-line editable text with a char-indexed cursor.
#[derive(Clone, Debug, Default)]
pub struct LineInput {
    text: String,
    /// Cursor position as a char index (0 = before first char).
    cursor: usize,
}

impl LineInput {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Returns (before_cursor, cursor_char, after_cursor) for styled rendering.
    /// When the cursor is at the end of the text, cursor_char is None.
    pub fn render_parts(&self) -> (&str, Option<char>, &str) {
        let byte_offset = self.char_to_byte(self.cursor);
        match self.text[byte_offset..].chars().next() {
            Some(ch) => {
                let next_byte = byte_offset + ch.len_utf8();
                (&self.text[..byte_offset], Some(ch), &self.text[next_byte..])
            }
            None => (&self.text, None, ""),
        }
    }

    pub fn handle(&mut self, key: KeyEvent) -> InputResult {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => InputResult::Cancel,
            KeyCode::Enter => InputResult::Submit,
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                InputResult::Continue
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.text.chars().count());
                InputResult::Continue
            }
            KeyCode::Home => {
                self.cursor = 0;
                InputResult::Continue
            }
            KeyCode::End => {
                self.cursor = self.text.chars().count();
                InputResult::Continue
            }
            KeyCode::Char('a') if ctrl => {
                self.cursor = 0;
                InputResult::Continue
            }
            KeyCode::Char('e') if ctrl => {
                self.cursor = self.text.chars().count();
                InputResult::Continue
            }
            KeyCode::Backspace => {
                if self.cursor == 0 {
                    return InputResult::Continue;
                }
                self.cursor -= 1;
                self.remove_at_cursor()
            }
            KeyCode::Delete => self.remove_at_cursor(),
            KeyCode::Char('u') if ctrl => {
                if self.text.is_empty() {
                    return InputResult::Continue;
                }
                self.clear();
                InputResult::Changed
            }
            KeyCode::Char('w') if ctrl => self.delete_word_back(),
            KeyCode::Char(ch) if !ctrl => {
                let byte_offset = self.char_to_byte(self.cursor);
                self.text.insert(byte_offset, ch);
                self.cursor += 1;
                InputResult::Changed
            }
            _ => InputResult::Continue,
        }
    }

    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    fn remove_at_cursor(&mut self) -> InputResult {
        let byte_offset = self.char_to_byte(self.cursor);
        match self.text[byte_offset..].chars().next() {
            Some(ch) => {
                self.text
                    .replace_range(byte_offset..byte_offset + ch.len_utf8(), "");
                InputResult::Changed
            }
            None => InputResult::Continue,
        }
    }

    /// unix-word-rubout: skip whitespace, then non-whitespace.
    fn delete_word_back(&mut self) -> InputResult {
        if self.cursor == 0 {
            return InputResult::Continue;
        }
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = self.cursor;
        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !chars[pos - 1].is_whitespace() {
            pos -= 1;
        }

        let start_byte = self.char_to_byte(pos);
        let end_byte = self.char_to_byte(self.cursor);
        self.text.replace_range(start_byte..end_byte, "");
        self.cursor = pos;
        InputResult::Changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn insert_at_start_middle_end() {
        let mut input = LineInput::new("ac");
        assert_eq!(input.handle(key(KeyCode::Char('d'))), InputResult::Changed);
        assert_eq!(input.value(), "acd");

        input.handle(key(KeyCode::Home));
        input.handle(key(KeyCode::Char('z')));
        assert_eq!(input.value(), "zacd");
        assert_eq!(input.cursor, 1);

        input.handle(key(KeyCode::Right));
        input.handle(key(KeyCode::Char('b')));
        assert_eq!(input.value(), "zabcd");
        assert_eq!(input.cursor, 3);
    }

    #[test]
    fn multibyte_vietnamese_editing() {
        let mut input = LineInput::new("việt");
        input.handle(key(KeyCode::Left));
        input.handle(key(KeyCode::Left));
        assert_eq!(input.render_parts(), ("vi", Some('ệ'), "t"));
        input.handle(key(KeyCode::Delete));
        assert_eq!(input.value(), "vit");
    }

    #[test]
    fn backspace_at_boundaries() {
        let mut input = LineInput::new("ab");
        assert_eq!(input.handle(key(KeyCode::Backspace)), InputResult::Changed);
        assert_eq!(input.value(), "a");
        input.handle(key(KeyCode::Backspace));
        assert_eq!(input.value(), "");
        assert_eq!(input.handle(key(KeyCode::Backspace)), InputResult::Continue);
    }

    #[test]
    fn delete_at_end_is_noop() {
        let mut input = LineInput::new("ab");
        assert_eq!(input.handle(key(KeyCode::Delete)), InputResult::Continue);
        assert_eq!(input.value(), "ab");
    }

    #[test]
    fn ctrl_w_word_delete() {
        let mut input = LineInput::new("good morning  ");
        input.handle(ctrl('w'));
        assert_eq!(input.value(), "good ");
        input.handle(ctrl('w'));
        assert_eq!(input.value(), "");
    }

    #[test]
    fn ctrl_u_clears() {
        let mut input = LineInput::new("hello");
        assert_eq!(input.handle(ctrl('u')), InputResult::Changed);
        assert!(input.is_empty());
        assert_eq!(input.handle(ctrl('u')), InputResult::Continue);
    }

    #[test]
    fn cursor_moves_do_not_report_changes() {
        let mut input = LineInput::new("abc");
        assert_eq!(input.handle(key(KeyCode::Left)), InputResult::Continue);
        assert_eq!(input.handle(ctrl('a')), InputResult::Continue);
        assert_eq!(input.cursor, 0);
        input.handle(ctrl('e'));
        assert_eq!(input.cursor, 3);
        input.handle(key(KeyCode::Right));
        assert_eq!(input.cursor, 3);
    }

    #[test]
    fn render_parts_at_end() {
        let input = LineInput::new("abc");
        assert_eq!(input.render_parts(), ("abc", None, ""));
    }

    #[test]
    fn submit_and_cancel() {
        let mut input = LineInput::new("x");
        assert_eq!(input.handle(key(KeyCode::Enter)), InputResult::Submit);
        assert_eq!(input.handle(key(KeyCode::Esc)), InputResult::Cancel);
    }
}
