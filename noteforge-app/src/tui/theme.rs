use ratatui::style::{Color, Style, Stylize};

pub fn title_style() -> Style { Style::default().fg(Color::Cyan).bold() }
pub fn answer_style() -> Style { Style::default().fg(Color::Green) }
pub fn selected_style() -> Style { Style::default().fg(Color::Yellow).bold() }
pub fn mastered_style() -> Style { Style::default().fg(Color::Green).bold() }
pub fn footer_style() -> Style { Style::default().fg(Color::Gray) }
pub fn status_style() -> Style { Style::default().fg(Color::Magenta) }
