use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    StatefulWidget,
};

use crate::Config;
use crate::models::{Priority, Task};
use crate::task_list::{EMPTY_MESSAGE, ListView};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};

const PRIORITY_WIDTH: usize = 6;
const DATE_WIDTH: usize = 10;

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "med",
        Priority::High => "HIGH",
    }
}

/// Fixed-column row text: status, description, priority, date
fn task_row(task: &Task, max_width: usize) -> String {
    let status = if task.completed { "✓" } else { "○" };
    let date = task.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    let fixed = 2 + 1 + PRIORITY_WIDTH + 1 + DATE_WIDTH;
    let desc_width = max_width.saturating_sub(fixed).max(1);

    let mut description: String = task.description.clone();
    if description.chars().count() > desc_width {
        description = description.chars().take(desc_width.saturating_sub(3)).collect::<String>() + "...";
    }

    format!(
        "{} {:<dw$} {:<pw$} {:<tw$}",
        status,
        description,
        priority_marker(task.priority),
        date,
        dw = desc_width,
        pw = PRIORITY_WIDTH,
        tw = DATE_WIDTH,
    )
}

pub fn render_task_list(f: &mut Frame, area: Rect, view: ListView<'_>, page: u32, list_state: &mut ListState, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = if active_theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&active_theme.highlight_fg)
    };

    let tasks = match view {
        ListView::Tasks(tasks) => tasks,
        other => {
            let (text, style) = match other {
                ListView::Loading => ("Loading…".to_string(), Style::default().fg(fg_color).add_modifier(Modifier::DIM)),
                ListView::Failed(message) => (
                    format!("Could not load tasks: {}", message),
                    Style::default().fg(parse_color("red")),
                ),
                _ => (EMPTY_MESSAGE.to_string(), Style::default().fg(fg_color)),
            };
            let paragraph = Paragraph::new(text)
                .block(Block::default().borders(Borders::ALL).title(format!("Tasks (page {})", page)))
                .style(style)
                .alignment(Alignment::Center)
                .wrap(ratatui::widgets::Wrap { trim: true });
            f.render_widget(paragraph, area);
            return;
        }
    };

    // Split area to reserve space for scrollbar
    let list_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let list_area = list_areas[0];
    let scrollbar_area = list_areas[1];

    // 2 for borders, 2 for the highlight symbol
    let max_width = list_area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| {
            let style = if task.completed {
                Style::default().fg(fg_color).add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
            } else if task.priority == Priority::High {
                Style::default().fg(parse_color(&active_theme.accent))
            } else {
                Style::default().fg(fg_color)
            };
            ListItem::new(Line::from(Span::styled(task_row(task, max_width), style)))
        })
        .collect();

    let title = format!("Tasks ({} on page {})", tasks.len(), page);
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(fg_color))
        .highlight_symbol("> ")
        .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg));

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);

    let visible_items = list_area.height.saturating_sub(2) as usize;
    if tasks.len() > visible_items && scrollbar_area.width > 0 && list_area.height > 2 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );
        let mut scrollbar_state = ScrollbarState::new(tasks.len())
            .viewport_content_length(visible_items)
            .position(list_state.selected().unwrap_or(0));
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(description: &str, completed: bool) -> Task {
        Task {
            id: "1".to_string(),
            description: description.to_string(),
            priority: Priority::High,
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            completed,
        }
    }

    #[test]
    fn row_shows_status_priority_and_date() {
        let row = task_row(&task("Buy milk", true), 40);
        assert!(row.starts_with("✓ Buy milk"));
        assert!(row.contains("HIGH"));
        assert!(row.ends_with("2024-01-01"));
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let row = task_row(&task("a very long description that will not fit", false), 30);
        assert!(row.starts_with("○ a very"));
        assert!(row.contains("..."));
        assert_eq!(row.chars().count(), 30);
    }
}
