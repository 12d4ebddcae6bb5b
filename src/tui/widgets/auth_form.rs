use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::Config;
use crate::tui::app::{AuthField, AuthForm, Screen};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::fixed_popup_area;

/// Login or register form, centered on screen
pub fn render_auth_form(f: &mut Frame, area: Rect, screen: Screen, form: &mut AuthForm, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_style = Style::default().bg(highlight_bg).fg(get_contrast_text_color(highlight_bg));
    let inactive_field_style = Style::default().fg(fg_color).add_modifier(Modifier::DIM);

    let registering = screen == Screen::Register;
    let fields: &[(AuthField, &str)] = if registering {
        &[(AuthField::Name, "Name"), (AuthField::Email, "Email"), (AuthField::Password, "Password")]
    } else {
        &[(AuthField::Email, "Email"), (AuthField::Password, "Password")]
    };

    let height = 2 + 3 * fields.len() as u16 + 1;
    let popup = fixed_popup_area(area, 50, height);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(if registering { "Register" } else { "Log in" })
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Length(1));
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let active = form.current_field;
    for (index, (field, title)) in fields.iter().enumerate() {
        let is_active = *field == active;
        let style = if is_active { highlight_style } else { inactive_field_style };
        let editor = match field {
            AuthField::Name => &mut form.name,
            AuthField::Email => &mut form.email,
            AuthField::Password => &mut form.password,
        };
        let width = areas[index].width.saturating_sub(2) as usize;
        editor.update_horizontal_scroll(width);
        let paragraph = Paragraph::new(editor.styled_line(style, width))
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(*title));
        f.render_widget(paragraph, areas[index]);
        if is_active {
            if let Some(position) = editor.get_cursor_screen_pos(areas[index]) {
                f.set_cursor_position(position);
            }
        }
    }

    let footer = if form.pending {
        "Contacting server…".to_string()
    } else if registering {
        "Enter: Register • F2: Log in instead • Esc: Quit".to_string()
    } else {
        "Enter: Log in • F2: Register • Esc: Quit".to_string()
    };
    let footer = Paragraph::new(footer)
        .style(Style::default().fg(fg_color).add_modifier(Modifier::DIM))
        .alignment(Alignment::Center);
    f.render_widget(footer, areas[fields.len()]);
}
