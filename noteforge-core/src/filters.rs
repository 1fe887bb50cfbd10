use crate::{CardStatus, Flashcard, FlashcardSet, Note};

pub fn filter_notes_by_text(notes: &[Note], query: &str) -> Vec<Note> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return notes.to_vec();
    }
    notes
        .iter()
        .filter(|n| {
            n.title.to_lowercase().contains(&q)
                || n.content.to_lowercase().contains(&q)
                || n.tags.iter().any(|t| t.to_lowercase().contains(&q))
        })
        .cloned()
        .collect()
}

pub fn filter_notes_by_tag(notes: &[Note], tag: &str) -> Vec<Note> {
    let q = tag.trim().to_lowercase();
    notes
        .iter()
        .filter(|n| n.tags.iter().any(|t| t.to_lowercase() == q))
        .cloned()
        .collect()
}

pub fn filter_sets_by_text(sets: &[FlashcardSet], query: &str) -> Vec<FlashcardSet> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return sets.to_vec();
    }
    sets.iter()
        .filter(|s| {
            s.title.to_lowercase().contains(&q)
                || s.description
                    .as_ref()
                    .map(|d| d.to_lowercase().contains(&q))
                    .unwrap_or(false)
        })
        .cloned()
        .collect()
}

pub fn filter_cards_by_status(cards: &[Flashcard], want: CardStatus) -> Vec<Flashcard> {
    cards.iter().filter(|c| c.status == want).cloned().collect()
}
