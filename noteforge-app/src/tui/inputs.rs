use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Up,
    Down,
    Enter,
    Back,
    ToggleReveal,
    Next,
    Previous,
    Mastered,
    GenerateMore,
    None,
}

pub fn map_event(ev: Event) -> Action {
    match ev {
        Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => match code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Up | KeyCode::Char('k') => Action::Up,
            KeyCode::Down | KeyCode::Char('j') => Action::Down,
            KeyCode::Enter => Action::Enter,
            KeyCode::Esc | KeyCode::Backspace => Action::Back,
            KeyCode::Char(' ') => Action::ToggleReveal,
            KeyCode::Char('n') | KeyCode::Right => Action::Next,
            KeyCode::Char('p') | KeyCode::Left => Action::Previous,
            KeyCode::Char('m') => Action::Mastered,
            KeyCode::Char('g') => Action::GenerateMore,
            _ => Action::None,
        },
        _ => Action::None,
    }
}
