use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};

use crate::tui::app::{Mode, Screen};
use crate::tui::widgets::{
    auth_form::render_auth_form,
    color::parse_color,
    filter_bar::render_filter_bar,
    header::render_header,
    help::render_help,
    status_bar::render_status_bar,
    task_form::{TaskFormView, render_task_form},
    task_list::render_task_list,
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("tdl")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(outer_block, f.area());

    let busy = app.dispatcher.in_flight() > 0;
    render_header(f, layout.header_area, app.session.state(), busy, &app.config);

    match app.ui.screen {
        Screen::Login | Screen::Register => {
            render_auth_form(f, layout.inner_area, app.ui.screen, &mut app.auth, &app.config);
        }
        Screen::Todos => {
            let search = if app.ui.mode == Mode::Search {
                Some(&mut app.search.editor)
            } else {
                None
            };
            render_filter_bar(f, layout.filters_area, app.tasks.query(), search, &app.config);

            let page = app.tasks.query().page;
            render_task_list(f, layout.main_area, app.tasks.view(), page, &mut app.ui.list_state, &app.config);

            if app.ui.mode == Mode::TaskModal {
                let editing = app.is_edit_mode();
                if let Some(form) = app.task_form.as_mut() {
                    let view = TaskFormView {
                        editing,
                        saving: app.workflow.is_saving(),
                        error: app.workflow.error(),
                    };
                    render_task_form(f, layout.inner_area, form, view, &app.config);
                }
            }

            if app.ui.mode == Mode::Help {
                render_help(f, f.area(), &app.config);
            }
        }
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_deref(), &key_hints, &app.config);
}

fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    if app.ui.screen != Screen::Todos {
        return vec![
            "Tab: Next field".to_string(),
            "Enter: Submit".to_string(),
            "F2: Switch login/register".to_string(),
            "Esc: Quit".to_string(),
        ];
    }

    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Exit help", key(&kb.help))],
        Mode::Search => vec!["Enter: Keep search".to_string(), "Esc: Revert search".to_string()],
        Mode::TaskModal => vec![
            "Tab/Shift+Tab: Next/previous field".to_string(),
            format!("Enter or {}: Save", key(&kb.save)),
            "Esc: Cancel".to_string(),
        ],
        Mode::View => vec![
            format!("{}: Quit", key(&kb.quit)),
            format!("{}: New", key(&kb.new)),
            format!("{}: Edit", key(&kb.edit)),
            format!("{}: Toggle", key(&kb.toggle_task_status)),
            format!("{}: Delete", key(&kb.delete)),
            format!("{}: Search", key(&kb.search)),
            format!("{}/{}: Page", key(&kb.prev_page), key(&kb.next_page)),
            format!("{}: Log out", key(&kb.logout)),
            format!("{}: Help", key(&kb.help)),
        ],
    }
}
