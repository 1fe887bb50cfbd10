use crate::{percentage, FlashcardSet, GenerationLog, Note, RequestStatus};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub notes: u32,
    pub sets: u32,
    pub cards: u32,
    pub mastered: u32,
    pub mastered_percentage: u32,
    pub generations: u32,
    pub failed_generations: u32,
    pub tokens_used: u64,
    pub cost_cents: u64,
}

pub fn summarize(notes: &[Note], sets: &[FlashcardSet], logs: &[GenerationLog]) -> DashboardStats {
    let mut stats = DashboardStats {
        notes: notes.len() as u32,
        sets: sets.len() as u32,
        ..Default::default()
    };
    for s in sets {
        stats.cards += s.total_cards;
        stats.mastered += s.mastered_cards;
    }
    stats.mastered_percentage = percentage(stats.mastered, stats.cards);

    for l in logs {
        stats.generations += 1;
        if l.status == RequestStatus::Failed {
            stats.failed_generations += 1;
        }
        stats.tokens_used += l.tokens_used.unwrap_or(0);
        stats.cost_cents += l.cost_cents.unwrap_or(0);
    }
    stats
}
