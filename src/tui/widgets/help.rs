use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let active_theme = config.get_active_theme();
    let style = Style::default()
        .fg(parse_color(&active_theme.fg))
        .bg(parse_color(&active_theme.bg));

    let popup_area = popup_area(area, 60, 70);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(style),
        )
        .style(style)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!("  {} / {}: Move up/down\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str(&format!("  {} / {}: Previous/next page\n", key(&kb.prev_page), key(&kb.next_page)));
    text.push_str(&format!("  {}: Refresh\n", key(&kb.refresh)));
    text.push('\n');

    text.push_str("Tasks:\n");
    text.push_str(&format!("  {}: New task\n", key(&kb.new)));
    text.push_str(&format!("  {}: Edit selected (open tasks only)\n", key(&kb.edit)));
    text.push_str(&format!("  {}: Delete selected\n", key(&kb.delete)));
    text.push_str(&format!("  {}: Toggle completed\n", key(&kb.toggle_task_status)));
    text.push('\n');

    text.push_str("Filters:\n");
    text.push_str(&format!("  {}: Search (Enter keeps, Esc reverts)\n", key(&kb.search)));
    text.push_str(&format!("  {}: Cycle all/open/completed\n", key(&kb.cycle_completed)));
    text.push_str(&format!("  {}: Order by date/priority\n", key(&kb.order_by)));
    text.push_str(&format!("  {}: Ascending/descending\n", key(&kb.order_direction)));
    text.push('\n');

    text.push_str("Task form:\n");
    text.push_str("  Tab / Shift+Tab: Next/previous field\n");
    text.push_str("  ←/→ on Priority: Change priority\n");
    text.push_str(&format!("  Enter or {}: Save\n", key(&kb.save)));
    text.push_str("  Ctrl+z: Undo  Ctrl+a: Select all\n");
    text.push_str("  Ctrl+c / Ctrl+x / Ctrl+v: Copy/cut/paste\n");
    text.push_str("  Esc: Cancel\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Log out\n", key(&kb.logout)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_configured_bindings() {
        let mut config = Config::default();
        config.key_bindings.new = "a".to_string();
        let text = build_help_text(&config);
        assert!(text.contains("a: New task"));
        assert!(text.contains(&format!("{}: Save", key(&config.key_bindings.save))));
    }
}
