use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::Config;
use crate::session::SessionState;
use crate::tui::widgets::color::parse_color;

/// One-line header: session indicator on the left, backend on the right
pub fn render_header(f: &mut Frame, area: Rect, state: SessionState, busy: bool, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let accent = parse_color(&active_theme.accent);

    let indicator = match state {
        SessionState::LoggedIn => "●",
        SessionState::LoggedOut => "○",
    };
    let mut spans = vec![
        Span::styled(format!("{} ", indicator), Style::default().fg(accent)),
        Span::styled(state.label(), Style::default().fg(fg_color).add_modifier(Modifier::BOLD)),
    ];
    if busy {
        spans.push(Span::styled("  loading…", Style::default().fg(fg_color).add_modifier(Modifier::DIM)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);

    let backend = Paragraph::new(config.api_url.as_str())
        .style(Style::default().fg(fg_color).add_modifier(Modifier::DIM))
        .alignment(Alignment::Right);
    f.render_widget(backend, area);
}
