use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::Config;
use crate::models::Priority;
use crate::tui::app::{TaskField, TaskForm};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::editor::Editor;
use crate::tui::widgets::fixed_popup_area;

pub struct TaskFormView<'a> {
    pub editing: bool,
    pub saving: bool,
    pub error: Option<&'a str>,
}

fn render_text_field(f: &mut Frame, area: Rect, editor: &mut Editor, title: &str, style: Style, active: bool) {
    let width = area.width.saturating_sub(2) as usize;
    editor.update_horizontal_scroll(width);
    let paragraph = Paragraph::new(editor.styled_line(style, width))
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);

    if active {
        if let Some(position) = editor.get_cursor_screen_pos(area) {
            f.set_cursor_position(position);
        }
    }
}

fn priority_line(selected: Priority, style: Style) -> Line<'static> {
    let spans: Vec<Span> = Priority::ALL
        .iter()
        .flat_map(|priority| {
            let label = format!(" {} ", priority.label());
            let span = if *priority == selected {
                Span::styled(label, style.add_modifier(Modifier::REVERSED | Modifier::BOLD))
            } else {
                Span::styled(label, style)
            };
            [span, Span::raw(" ")]
        })
        .collect();
    Line::from(spans)
}

/// Create/edit modal centered over `area`
pub fn render_task_form(f: &mut Frame, area: Rect, form: &mut TaskForm, view: TaskFormView<'_>, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = if active_theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&active_theme.highlight_fg)
    };
    let highlight_style = Style::default().bg(highlight_bg).fg(highlight_fg);
    let inactive_field_style = Style::default().fg(fg_color).add_modifier(Modifier::DIM);
    let field_style = |field: TaskField| {
        if form.current_field == field { highlight_style } else { inactive_field_style }
    };
    let description_style = field_style(TaskField::Description);
    let priority_style = field_style(TaskField::Priority);
    let date_style = field_style(TaskField::Date);

    let popup = fixed_popup_area(area, 64, 13);
    f.render_widget(Clear, popup);
    let title = if view.editing { "Edit task" } else { "New task" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let field_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Description
            Constraint::Length(3), // Priority
            Constraint::Length(3), // Date
            Constraint::Min(1),    // Error / saving
        ])
        .split(inner);

    render_text_field(
        f,
        field_areas[0],
        &mut form.description,
        "Description",
        description_style,
        form.current_field == TaskField::Description,
    );

    let priority = Paragraph::new(priority_line(form.priority, priority_style))
        .block(Block::default().borders(Borders::ALL).title("Priority (←/→)"));
    f.render_widget(priority, field_areas[1]);

    render_text_field(
        f,
        field_areas[2],
        &mut form.date,
        "Date (YYYY-MM-DD, optional)",
        date_style,
        form.current_field == TaskField::Date,
    );

    let footer = if view.saving {
        Paragraph::new("Saving…").style(Style::default().fg(fg_color).add_modifier(Modifier::DIM))
    } else if let Some(error) = view.error {
        Paragraph::new(error.to_string()).style(Style::default().fg(parse_color("red")))
    } else {
        Paragraph::new("")
    };
    f.render_widget(footer, field_areas[3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_priority_is_highlighted() {
        let line = priority_line(Priority::Medium, Style::default());
        let selected: Vec<&str> = line
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::REVERSED))
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(selected, vec![" Medium "]);
    }
}
