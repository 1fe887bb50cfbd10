use chrono::{DateTime, Utc};
use noteforge_core::{
    DifficultyChoice, Flashcard, FlashcardSet, GeneratedFlashcard, GenerationResult, Note,
    ReforgeAction, SetProgress,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize)]
pub struct NoteOut {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteOut {
    fn from(n: Note) -> Self {
        Self { id: n.id, title: n.title, content: n.content, tags: n.tags, updated_at: n.updated_at }
    }
}

#[derive(Serialize)]
pub struct SetOut {
    pub id: Uuid,
    pub note_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub total_cards: u32,
    pub mastered_cards: u32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl From<FlashcardSet> for SetOut {
    fn from(s: FlashcardSet) -> Self {
        Self {
            id: s.id,
            note_id: s.note_id,
            title: s.title,
            description: s.description,
            total_cards: s.total_cards,
            mastered_cards: s.mastered_cards,
            is_public: s.is_public,
            created_at: s.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct CardOut {
    pub id: Uuid,
    pub position: u32,
    pub question: String,
    pub answer: String,
    pub status: &'static str,
    pub difficulty: &'static str,
    pub review_count: u32,
}

impl From<Flashcard> for CardOut {
    fn from(c: Flashcard) -> Self {
        Self {
            id: c.id,
            position: c.position,
            status: c.status.as_str(),
            difficulty: c.difficulty().as_str(),
            review_count: c.review_count,
            question: c.question,
            answer: c.answer,
        }
    }
}

#[derive(Serialize)]
pub struct SetWithCards {
    pub set: SetOut,
    pub cards: Vec<CardOut>,
}

/// Result of a generate or reforge call. `set` is absent for previews.
#[derive(Serialize)]
pub struct GeneratedOut {
    pub set: Option<SetOut>,
    pub flashcards: Vec<GeneratedFlashcard>,
    pub estimated_tokens: u64,
    pub estimated_cost_cents: u64,
}

impl GeneratedOut {
    pub fn new(set: Option<FlashcardSet>, result: GenerationResult) -> Self {
        Self {
            set: set.map(SetOut::from),
            flashcards: result.flashcards,
            estimated_tokens: result.estimated_tokens,
            estimated_cost_cents: result.estimated_cost_cents,
        }
    }
}

#[derive(Serialize)]
pub struct MasteredOut {
    pub card: CardOut,
    pub progress: SetProgress,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateIn {
    pub count: Option<u32>,
    pub difficulty: Option<DifficultyChoice>,
    pub instructions: Option<String>,
    pub preview: bool,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ReforgeIn {
    pub action: Option<ReforgeAction>,
    pub count: Option<u32>,
    pub difficulty: Option<DifficultyChoice>,
    pub selected_section: Option<String>,
    pub preview: bool,
}
