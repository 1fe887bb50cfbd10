use serde::{Deserialize, Serialize};

use crate::{Flashcard, FlashcardId};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetProgress {
    pub total: u32,
    pub mastered: u32,
    pub percentage: u32,
}

impl SetProgress {
    pub fn new(total: u32, mastered: u32) -> Self {
        Self {
            total,
            mastered,
            percentage: percentage(mastered, total),
        }
    }
}

/// Whole-number percent, 0 for an empty set.
pub fn percentage(part: u32, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        ((part as f64 / total as f64) * 100.0).round() as u32
    }
}

pub fn progress_of(cards: &[Flashcard]) -> SetProgress {
    let mastered = cards.iter().filter(|c| c.is_mastered()).count() as u32;
    SetProgress::new(cards.len() as u32, mastered)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Card(FlashcardId),
    /// Already on the last card.
    End,
}

/// Sequential walk over a set's cards in their stored order.
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    ids: Vec<FlashcardId>,
}

impl Navigator {
    pub fn new(ids: Vec<FlashcardId>) -> Self {
        Self { ids }
    }

    /// Cards must already be in position order.
    pub fn from_cards(cards: &[Flashcard]) -> Self {
        Self::new(cards.iter().map(|c| c.id).collect())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn first(&self) -> Option<FlashcardId> {
        self.ids.first().copied()
    }

    /// Zero-based index of `id`, if it belongs to the set.
    pub fn position(&self, id: FlashcardId) -> Option<usize> {
        self.ids.iter().position(|x| *x == id)
    }

    /// `None` when `id` is not part of the set.
    pub fn next(&self, id: FlashcardId) -> Option<Step> {
        let idx = self.position(id)?;
        Some(match self.ids.get(idx + 1) {
            Some(next) => Step::Card(*next),
            None => Step::End,
        })
    }

    pub fn previous(&self, id: FlashcardId) -> Option<FlashcardId> {
        let idx = self.position(id)?;
        idx.checked_sub(1).map(|i| self.ids[i])
    }

    pub fn is_last(&self, id: FlashcardId) -> bool {
        self.position(id).is_some_and(|i| i + 1 == self.ids.len())
    }
}
