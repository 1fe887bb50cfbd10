use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OwnerId = Uuid;
pub type NoteId = Uuid;
pub type SetId = Uuid;
pub type FlashcardId = Uuid;
pub type LogId = Uuid;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Lenient parse used on model output; anything unknown is `None`.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Numeric level stored on persisted flashcards.
    pub fn level(&self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn from_level(level: u8) -> Self {
        match level {
            1 => Difficulty::Easy,
            3 => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    #[default]
    New,
    Learning,
    Review,
    Mastered,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::New => "new",
            CardStatus::Learning => "learning",
            CardStatus::Review => "review",
            CardStatus::Mastered => "mastered",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "new" => Some(CardStatus::New),
            "learning" => Some(CardStatus::Learning),
            "review" => Some(CardStatus::Review),
            "mastered" => Some(CardStatus::Mastered),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub owner_id: OwnerId,
    pub title: String,
    pub content: String,
    pub status: NoteStatus,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(owner_id: OwnerId, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            content: content.into(),
            status: NoteStatus::Draft,
            tags: Vec::new(),
            is_public: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashcardSet {
    pub id: SetId,
    pub owner_id: OwnerId,
    pub note_id: Option<NoteId>,
    pub title: String,
    pub description: Option<String>,
    pub total_cards: u32,
    pub mastered_cards: u32,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlashcardSet {
    pub fn new(
        owner_id: OwnerId,
        note_id: Option<NoteId>,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            note_id,
            title: title.into(),
            description,
            total_cards: 0,
            mastered_cards: 0,
            is_public: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields the caller supplies when bulk-inserting cards; the store assigns
/// ids, positions and timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewFlashcard {
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub id: FlashcardId,
    pub set_id: SetId,
    pub note_id: Option<NoteId>,
    pub position: u32,
    pub question: String,
    pub answer: String,
    pub status: CardStatus,
    pub difficulty_level: u8,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub review_count: u32,
    pub correct_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn new(set_id: SetId, note_id: Option<NoteId>, position: u32, card: &NewFlashcard) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            set_id,
            note_id,
            position,
            question: card.question.clone(),
            answer: card.answer.clone(),
            status: CardStatus::New,
            difficulty_level: card.difficulty.level(),
            last_reviewed: None,
            review_count: 0,
            correct_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_level(self.difficulty_level)
    }

    pub fn is_mastered(&self) -> bool {
        self.status == CardStatus::Mastered
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Audit record for one call to the generation endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationLog {
    pub id: LogId,
    pub owner_id: OwnerId,
    pub note_id: Option<NoteId>,
    pub request_type: String,
    pub prompt: String,
    pub response: Option<String>,
    pub status: RequestStatus,
    pub tokens_used: Option<u64>,
    pub cost_cents: Option<u64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub const REQUEST_TYPE_GENERATION: &str = "flashcard_generation";
pub const REQUEST_TYPE_REFORGE: &str = "flashcard_reforge";

impl GenerationLog {
    pub fn new(
        owner_id: OwnerId,
        note_id: Option<NoteId>,
        request_type: &str,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            note_id,
            request_type: request_type.to_string(),
            prompt: prompt.into(),
            response: None,
            status: RequestStatus::Pending,
            tokens_used: None,
            cost_cents: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn completed(mut self, response: String, tokens: u64, cost_cents: u64) -> Self {
        self.status = RequestStatus::Completed;
        self.response = Some(response);
        self.tokens_used = Some(tokens);
        self.cost_cents = Some(cost_cents);
        self.completed_at = Some(Utc::now());
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = RequestStatus::Failed;
        self.error_message = Some(error.into());
        self.completed_at = Some(Utc::now());
        self
    }
}
