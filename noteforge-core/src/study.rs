use crate::{CardStatus, Flashcard};
use chrono::Utc;

/// Apply a study result to a card. `was_correct` is `None` when the status
/// changes without an answer being graded.
pub fn record_review(mut card: Flashcard, status: CardStatus, was_correct: Option<bool>) -> Flashcard {
    let now = Utc::now();

    card.status = status;
    card.last_reviewed = Some(now);
    card.updated_at = now;

    if let Some(correct) = was_correct {
        card.review_count += 1;
        if correct {
            card.correct_count += 1;
        }
    }

    card
}

pub fn mark_mastered(card: Flashcard) -> Flashcard {
    record_review(card, CardStatus::Mastered, Some(true))
}

/// Share of graded reviews answered correctly, 0.0 before the first review.
pub fn accuracy(card: &Flashcard) -> f32 {
    if card.review_count == 0 {
        0.0
    } else {
        card.correct_count as f32 / card.review_count as f32
    }
}
