use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOperation {
    Insert { col: usize, text: String },
    Delete { col: usize, text: String },
}

/// Single-line text field with selection, word movement and undo.
/// Columns are counted in chars, not bytes.
#[derive(Debug, Clone)]
pub struct Editor {
    chars: Vec<char>,
    pub cursor_col: usize,
    pub scroll_col: usize,
    pub selection_start: Option<usize>,
    undo_stack: Vec<EditOperation>,
    max_history: usize,
    masked: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            chars: Vec::new(),
            cursor_col: 0,
            scroll_col: 0,
            selection_start: None,
            undo_stack: Vec::new(),
            max_history: 100,
            masked: false,
        }
    }

    pub fn from_string(content: &str) -> Self {
        let chars: Vec<char> = content.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        let cursor_col = chars.len();
        Self {
            chars,
            cursor_col,
            ..Self::new()
        }
    }

    /// Field whose content is shown as `*` (passwords)
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::new()
        }
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor_col = 0;
        self.scroll_col = 0;
        self.selection_start = None;
        self.undo_stack.clear();
    }

    pub fn set_text(&mut self, content: &str) {
        let masked = self.masked;
        *self = Self::from_string(content);
        self.masked = masked;
    }

    fn add_to_undo(&mut self, op: EditOperation) {
        self.undo_stack.push(op);
        if self.undo_stack.len() > self.max_history {
            self.undo_stack.remove(0);
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        if self.has_selection() {
            self.delete_selection();
        }
        self.chars.insert(self.cursor_col, ch);
        self.add_to_undo(EditOperation::Insert {
            col: self.cursor_col,
            text: ch.to_string(),
        });
        self.cursor_col += 1;
        self.clear_selection();
    }

    /// Insert pasted text; line breaks become spaces
    pub fn insert_str(&mut self, text: &str) {
        if self.has_selection() {
            self.delete_selection();
        }
        let inserted: Vec<char> = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        if inserted.is_empty() {
            return;
        }
        let col = self.cursor_col;
        self.chars.splice(col..col, inserted.iter().copied());
        self.cursor_col += inserted.len();
        self.add_to_undo(EditOperation::Insert {
            col,
            text: inserted.into_iter().collect(),
        });
        self.clear_selection();
    }

    /// Backspace
    pub fn delete_char(&mut self) {
        if self.has_selection() {
            self.delete_selection();
            return;
        }
        self.clear_selection();
        if self.cursor_col == 0 {
            return;
        }
        self.cursor_col -= 1;
        let ch = self.chars.remove(self.cursor_col);
        self.add_to_undo(EditOperation::Delete {
            col: self.cursor_col,
            text: ch.to_string(),
        });
    }

    /// Delete key
    pub fn delete_forward(&mut self) {
        if self.has_selection() {
            self.delete_selection();
            return;
        }
        self.clear_selection();
        if self.cursor_col >= self.chars.len() {
            return;
        }
        let ch = self.chars.remove(self.cursor_col);
        self.add_to_undo(EditOperation::Delete {
            col: self.cursor_col,
            text: ch.to_string(),
        });
    }

    fn begin_move(&mut self, extend_selection: bool) {
        if extend_selection {
            if self.selection_start.is_none() {
                self.start_selection();
            }
        } else {
            self.clear_selection();
        }
    }

    pub fn move_cursor_left(&mut self, extend_selection: bool) {
        self.begin_move(extend_selection);
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self, extend_selection: bool) {
        self.begin_move(extend_selection);
        self.cursor_col = (self.cursor_col + 1).min(self.chars.len());
    }

    pub fn move_cursor_home(&mut self, extend_selection: bool) {
        self.begin_move(extend_selection);
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self, extend_selection: bool) {
        self.begin_move(extend_selection);
        self.cursor_col = self.chars.len();
    }

    pub fn move_cursor_word_left(&mut self, extend_selection: bool) {
        self.begin_move(extend_selection);
        let mut col = self.cursor_col;
        while col > 0 && !is_word_char(self.chars[col - 1]) {
            col -= 1;
        }
        while col > 0 && is_word_char(self.chars[col - 1]) {
            col -= 1;
        }
        self.cursor_col = col;
    }

    pub fn move_cursor_word_right(&mut self, extend_selection: bool) {
        self.begin_move(extend_selection);
        let len = self.chars.len();
        let mut col = self.cursor_col;
        while col < len && is_word_char(self.chars[col]) {
            col += 1;
        }
        while col < len && !is_word_char(self.chars[col]) {
            col += 1;
        }
        self.cursor_col = col;
    }

    pub fn start_selection(&mut self) {
        self.selection_start = Some(self.cursor_col);
    }

    pub fn clear_selection(&mut self) {
        self.selection_start = None;
    }

    pub fn select_all(&mut self) {
        self.selection_start = Some(0);
        self.cursor_col = self.chars.len();
    }

    pub fn has_selection(&self) -> bool {
        self.selection_start.is_some_and(|start| start != self.cursor_col)
    }

    pub fn get_selection_bounds(&self) -> Option<(usize, usize)> {
        let start = self.selection_start?;
        let (a, b) = (start.min(self.cursor_col), start.max(self.cursor_col));
        Some((a.min(self.chars.len()), b.min(self.chars.len())))
    }

    pub fn get_selected_text(&self) -> String {
        match self.get_selection_bounds() {
            Some((start, end)) if !self.masked => self.chars[start..end].iter().collect(),
            _ => String::new(),
        }
    }

    pub fn delete_selection(&mut self) {
        if let Some((start, end)) = self.get_selection_bounds() {
            if start < end {
                let removed: String = self.chars.drain(start..end).collect();
                self.add_to_undo(EditOperation::Delete {
                    col: start,
                    text: removed,
                });
            }
            self.cursor_col = start;
        }
        self.clear_selection();
    }

    pub fn undo(&mut self) -> bool {
        let Some(op) = self.undo_stack.pop() else {
            return false;
        };
        match op {
            EditOperation::Insert { col, text } => {
                let end = (col + text.chars().count()).min(self.chars.len());
                self.chars.drain(col.min(end)..end);
                self.cursor_col = col.min(self.chars.len());
            }
            EditOperation::Delete { col, text } => {
                let col = col.min(self.chars.len());
                let count = text.chars().count();
                self.chars.splice(col..col, text.chars());
                self.cursor_col = col + count;
            }
        }
        self.clear_selection();
        true
    }

    /// Keep the cursor inside a field `viewport_width` columns wide
    pub fn update_horizontal_scroll(&mut self, viewport_width: usize) {
        let effective_width = viewport_width.max(1);
        if self.cursor_col < self.scroll_col {
            self.scroll_col = self.cursor_col;
        } else if self.cursor_col >= self.scroll_col + effective_width {
            self.scroll_col = self.cursor_col + 1 - effective_width;
        }
    }

    fn display_char(&self, ch: char) -> char {
        if self.masked { '*' } else { ch }
    }

    /// Visible part of the text with the selection reversed
    pub fn styled_line(&self, style: Style, viewport_width: usize) -> Line<'static> {
        let end = (self.scroll_col + viewport_width).min(self.chars.len());
        let start = self.scroll_col.min(end);
        let selection = self.get_selection_bounds();

        let mut spans = Vec::new();
        let mut segment = String::new();
        let mut segment_selected = false;
        for col in start..end {
            let selected = selection.is_some_and(|(a, b)| col >= a && col < b);
            if selected != segment_selected && !segment.is_empty() {
                spans.push(segment_span(std::mem::take(&mut segment), style, segment_selected));
            }
            segment_selected = selected;
            segment.push(self.display_char(self.chars[col]));
        }
        if !segment.is_empty() {
            spans.push(segment_span(segment, style, segment_selected));
        }
        Line::from(spans)
    }

    /// Cursor cell inside a bordered one-line field
    pub fn get_cursor_screen_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if area.width < 3 || area.height < 3 {
            return None;
        }
        let visible_col = self.cursor_col.checked_sub(self.scroll_col)?;
        let max_x = area.width.saturating_sub(2) as usize;
        if visible_col >= max_x {
            return None;
        }
        Some((area.x + 1 + visible_col as u16, area.y + 1))
    }
}

fn segment_span(text: String, style: Style, selected: bool) -> Span<'static> {
    if selected {
        Span::styled(text, style.add_modifier(Modifier::REVERSED))
    } else {
        Span::styled(text, style)
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
