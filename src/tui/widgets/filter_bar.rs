use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::Config;
use crate::query::ListQuery;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::editor::Editor;
use crate::utils::format_key_binding_for_display as key;

/// Current list parameters. While searching, the search field is live and
/// gets the cursor.
pub fn render_filter_bar(f: &mut Frame, area: Rect, query: &ListQuery, search: Option<&mut Editor>, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let accent = parse_color(&active_theme.accent);
    let label = Style::default().fg(fg_color).add_modifier(Modifier::DIM);
    let value = Style::default().fg(fg_color);

    let kb = &config.key_bindings;
    let title = format!(
        "{}: Search  {}: Show  {}/{}: Sort",
        key(&kb.search),
        key(&kb.cycle_completed),
        key(&kb.order_by),
        key(&kb.order_direction)
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().fg(fg_color).bg(bg_color));
    let inner = block.inner(area);

    let tail = vec![
        Span::styled("  Show: ", label),
        Span::styled(query.completed.label(), value),
        Span::styled("  Sort: ", label),
        Span::styled(format!("{} {}", query.order_by.as_str(), query.order_direction.as_str()), value),
        Span::styled("  Page: ", label),
        Span::styled(query.page.to_string(), value),
    ];
    let tail_width: usize = tail.iter().map(|s| s.content.chars().count()).sum();
    let prefix = "Search: ";
    let search_width = (inner.width as usize).saturating_sub(tail_width + prefix.len()).max(1);

    let mut spans = vec![Span::styled(prefix, label)];
    let mut cursor = None;
    match search {
        Some(editor) => {
            editor.update_horizontal_scroll(search_width);
            let field = editor.styled_line(Style::default().fg(accent), search_width);
            let field_len: usize = field.spans.iter().map(|s| s.content.chars().count()).sum();
            spans.extend(field.spans);
            spans.push(Span::raw(" ".repeat(search_width.saturating_sub(field_len))));
            let visible_col = editor.cursor_col.saturating_sub(editor.scroll_col) as u16;
            cursor = Some((inner.x + prefix.len() as u16 + visible_col, inner.y));
        }
        None => {
            let shown: String = if query.search.is_empty() {
                "-".to_string()
            } else {
                query.search.chars().take(search_width).collect()
            };
            let shown_len = shown.chars().count();
            spans.push(Span::styled(shown, value));
            spans.push(Span::raw(" ".repeat(search_width.saturating_sub(shown_len))));
        }
    }
    spans.extend(tail);

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    if let Some(position) = cursor {
        f.set_cursor_position(position);
    }
}
