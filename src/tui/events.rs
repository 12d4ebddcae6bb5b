use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size as terminal_size,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use std::io;
use tracing::debug;

use crate::tui::App;
use crate::tui::app::{Mode, Screen, TaskField};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::editor::Editor;
use crate::utils::{ParsedKeyBinding, has_primary_modifier, parse_key_binding};

/// Restores the terminal even on panic, so the user's shell stays usable
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore on normal exit; the guard then does nothing on drop
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check before entering the alternate screen so the message is visible
    let (width, height) = terminal_size()?;
    if width < Layout::MIN_WIDTH || height < Layout::MIN_HEIGHT {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width,
            height,
            Layout::MIN_WIDTH,
            Layout::MIN_HEIGHT
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.check_status_message_timeout();
        app.process_completions();

        let terminal_size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, terminal_size.width, terminal_size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // Only Press events; Windows also reports releases
        if event::poll(std::time::Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    Ok(())
}

fn binding(value: &str) -> Result<ParsedKeyBinding, TuiError> {
    parse_key_binding(value).map_err(TuiError::KeyBindingError)
}

/// Returns true when the app should quit
fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    // Ctrl+c always quits outside text fields
    if key_event.code == KeyCode::Char('c')
        && key_event.modifiers.contains(KeyModifiers::CONTROL)
        && app.ui.screen == Screen::Todos
        && app.ui.mode == Mode::View
    {
        return Ok(true);
    }

    match app.ui.screen {
        Screen::Login | Screen::Register => handle_auth_screen(app, key_event),
        Screen::Todos => match app.ui.mode {
            Mode::View => handle_view_mode(app, key_event),
            Mode::Search => handle_search_mode(app, key_event),
            Mode::TaskModal => handle_task_modal_mode(app, key_event),
            Mode::Help => handle_help_mode(app, key_event),
        },
    }
}

fn handle_view_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let kb = app.config.key_bindings.clone();

    if binding(&kb.quit)?.matches(&key_event) {
        return Ok(true);
    }
    if binding(&kb.help)?.matches(&key_event) {
        app.enter_help_mode();
    } else if binding(&kb.logout)?.matches(&key_event) {
        app.logout();
    } else if binding(&kb.new)?.matches(&key_event) {
        app.enter_create_mode();
    } else if binding(&kb.edit)?.matches(&key_event) {
        app.enter_edit_mode();
    } else if binding(&kb.delete)?.matches(&key_event) {
        app.delete_selected_task();
    } else if binding(&kb.toggle_task_status)?.matches(&key_event) {
        app.toggle_task_status();
    } else if binding(&kb.search)?.matches(&key_event) {
        app.enter_search_mode();
    } else if binding(&kb.cycle_completed)?.matches(&key_event) {
        app.cycle_completed_filter();
    } else if binding(&kb.order_by)?.matches(&key_event) {
        app.toggle_order_by();
    } else if binding(&kb.order_direction)?.matches(&key_event) {
        app.toggle_order_direction();
    } else if binding(&kb.next_page)?.matches(&key_event) {
        app.next_page();
    } else if binding(&kb.prev_page)?.matches(&key_event) {
        app.prev_page();
    } else if binding(&kb.refresh)?.matches(&key_event) {
        app.refetch();
    } else if binding(&kb.list_up)?.matches(&key_event) || key_event.code == KeyCode::Up {
        app.move_selection_up();
    } else if binding(&kb.list_down)?.matches(&key_event) || key_event.code == KeyCode::Down {
        app.move_selection_down();
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let help = binding(&app.config.key_bindings.help)?;
    if key_event.code == KeyCode::Esc || help.matches(&key_event) {
        app.exit_help_mode();
    }
    Ok(false)
}

fn handle_search_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => app.exit_search_mode(false),
        KeyCode::Enter => app.exit_search_mode(true),
        _ => {
            if handle_editor_key(&mut app.search.editor, key_event) {
                app.update_search();
            }
        }
    }
    Ok(false)
}

fn handle_task_modal_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    // The draft is frozen until the in-flight save resolves
    if app.workflow.is_saving() {
        return Ok(false);
    }

    let save = binding(&app.config.key_bindings.save)?;
    if save.matches(&key_event) || key_event.code == KeyCode::Enter {
        app.save_task_form();
        return Ok(false);
    }

    if key_event.code == KeyCode::Esc {
        app.exit_task_modal();
        return Ok(false);
    }

    let Some(form) = app.task_form.as_mut() else {
        return Ok(false);
    };
    match key_event.code {
        KeyCode::Tab => form.navigate(true),
        KeyCode::BackTab => form.navigate(false),
        KeyCode::Left | KeyCode::Up if form.current_field == TaskField::Priority => {
            form.priority = form.priority.cycle_down();
        }
        KeyCode::Right | KeyCode::Down if form.current_field == TaskField::Priority => {
            form.priority = form.priority.cycle_up();
        }
        KeyCode::Char(c @ '1'..='3') if form.current_field == TaskField::Priority => {
            if let Ok(priority) = crate::models::Priority::try_from(c as u8 - b'0') {
                form.priority = priority;
            }
        }
        _ => {
            if let Some(editor) = form.current_editor() {
                handle_editor_key(editor, key_event);
            }
        }
    }
    Ok(false)
}

fn handle_auth_screen(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => return Ok(true),
        KeyCode::F(2) => app.switch_auth_screen(),
        KeyCode::Enter => app.submit_auth_form(),
        KeyCode::Tab | KeyCode::Down => app.auth.navigate(app.ui.screen, true),
        KeyCode::BackTab | KeyCode::Up => app.auth.navigate(app.ui.screen, false),
        _ => {
            if !app.auth.pending {
                handle_editor_key(app.auth.current_editor(), key_event);
            }
        }
    }
    Ok(false)
}

/// Apply a key to a text field. Returns true when the text changed.
fn handle_editor_key(editor: &mut Editor, key_event: KeyEvent) -> bool {
    let before = editor.text();
    let shift = key_event.modifiers.contains(KeyModifiers::SHIFT);
    let primary = has_primary_modifier(key_event.modifiers);

    match key_event.code {
        KeyCode::Char('a') if primary => editor.select_all(),
        KeyCode::Char('z') if primary => {
            editor.undo();
        }
        KeyCode::Char('c') if primary => copy_selection(editor),
        KeyCode::Char('x') if primary => {
            copy_selection(editor);
            editor.delete_selection();
        }
        KeyCode::Char('v') if primary => {
            if let Ok(mut clipboard) = arboard::Clipboard::new() {
                match clipboard.get_text() {
                    Ok(text) => editor.insert_str(&text),
                    Err(err) => debug!(error = %err, "clipboard read failed"),
                }
            }
        }
        KeyCode::Char(_) if primary => {}
        KeyCode::Char(c) => editor.insert_char(c),
        KeyCode::Backspace => editor.delete_char(),
        KeyCode::Delete => editor.delete_forward(),
        KeyCode::Left if primary => editor.move_cursor_word_left(shift),
        KeyCode::Right if primary => editor.move_cursor_word_right(shift),
        KeyCode::Left => editor.move_cursor_left(shift),
        KeyCode::Right => editor.move_cursor_right(shift),
        KeyCode::Home => editor.move_cursor_home(shift),
        KeyCode::End => editor.move_cursor_end(shift),
        _ => {}
    }

    editor.text() != before
}

fn copy_selection(editor: &Editor) {
    let selected = editor.get_selected_text();
    if selected.is_empty() {
        return;
    }
    if let Ok(mut clipboard) = arboard::Clipboard::new() {
        if let Err(err) = clipboard.set_text(selected) {
            debug!(error = %err, "clipboard write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_backspace_report_changes() {
        let mut editor = Editor::new();
        assert!(handle_editor_key(&mut editor, press(KeyCode::Char('a'))));
        assert!(!handle_editor_key(&mut editor, press(KeyCode::Left)));
        assert!(!handle_editor_key(&mut editor, press(KeyCode::Backspace)));
        assert!(handle_editor_key(&mut editor, press(KeyCode::Delete)));
        assert!(editor.is_empty());
    }

    #[test]
    fn shift_arrows_extend_the_selection() {
        let mut editor = Editor::from_string("milk");
        handle_editor_key(&mut editor, KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT));
        handle_editor_key(&mut editor, KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT));
        assert_eq!(editor.get_selected_text(), "lk");
        handle_editor_key(&mut editor, press(KeyCode::Backspace));
        assert_eq!(editor.text(), "mi");
    }
}
