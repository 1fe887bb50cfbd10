use crate::tui::theme::*;
use noteforge_core::{Flashcard, FlashcardSet, SetProgress};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub enum RightPane<'a> {
    Idle,
    Card {
        card: &'a Flashcard,
        reveal: bool,
        position: usize,
        total: usize,
        progress: SetProgress,
    },
    Empty(&'a str),
}

pub fn draw_ui(
    f: &mut Frame,
    area: Rect,
    sets: &[FlashcardSet],
    sel: usize,
    right: RightPane,
    status: &str,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1), Constraint::Length(2)])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[0]);

    draw_sets(f, cols[0], sets, sel);
    draw_right(f, cols[1], right);

    f.render_widget(Paragraph::new(status).style(status_style()), rows[1]);

    let foot = Paragraph::new(Line::from(vec![
        Span::raw(" ↑/↓ select  "),
        Span::raw(" Enter study  "),
        Span::raw(" space reveal  "),
        Span::raw(" n/p next/prev  "),
        Span::raw(" m mastered  "),
        Span::raw(" g more cards  "),
        Span::raw(" Esc back  "),
        Span::raw(" q quit "),
    ]))
    .style(footer_style())
    .block(Block::default().borders(Borders::TOP));
    f.render_widget(foot, rows[2]);
}

fn draw_sets(f: &mut Frame, area: Rect, sets: &[FlashcardSet], sel: usize) {
    let items: Vec<_> = sets
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let label = format!("{} ({}/{})", s.title, s.mastered_cards, s.total_cards);
            let line = if i == sel {
                Line::from(label).style(selected_style())
            } else {
                Line::from(label)
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(Span::styled("Flashcard sets", title_style()))
            .borders(Borders::ALL),
    );
    f.render_widget(list, area);
}

fn draw_right(f: &mut Frame, area: Rect, pane: RightPane) {
    match pane {
        RightPane::Idle => {
            let p = Paragraph::new("Press Enter to study the selected set, g to generate more cards for it.")
                .wrap(Wrap { trim: true })
                .block(Block::default().title("Study").borders(Borders::ALL));
            f.render_widget(p, area);
        }
        RightPane::Empty(msg) => {
            let p = Paragraph::new(msg)
                .wrap(Wrap { trim: true })
                .block(Block::default().title("Study").borders(Borders::ALL));
            f.render_widget(p, area);
        }
        RightPane::Card { card, reveal, position, total, progress } => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(3)])
                .split(area);

            let gauge = Gauge::default()
                .block(Block::default().title("Progress").borders(Borders::ALL))
                .gauge_style(mastered_style())
                .percent(progress.percentage.min(100) as u16)
                .label(format!(
                    "{}/{} mastered ({}%)",
                    progress.mastered, progress.total, progress.percentage
                ));
            f.render_widget(gauge, chunks[0]);

            let heading = format!("Card {}/{} [{}]", position + 1, total, card.status.as_str());
            let mut text = vec![Line::from(Span::styled("Q:", title_style()))];
            // Multiple-choice options are stored one per line.
            text.extend(card.question.lines().map(|l| Line::from(l.to_string())));
            text.push(Line::from(""));
            if reveal {
                text.push(Line::from(Span::styled("A:", title_style())));
                text.extend(
                    card.answer
                        .lines()
                        .map(|l| Line::from(Span::styled(l.to_string(), answer_style()))),
                );
            } else {
                text.push(Line::from("(space to reveal)"));
            }
            if card.is_mastered() {
                text.push(Line::from(""));
                text.push(Line::from(Span::styled("mastered", mastered_style())));
            }

            let p = Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .block(Block::default().title(heading).borders(Borders::ALL));
            f.render_widget(p, chunks[1]);
        }
    }
}
