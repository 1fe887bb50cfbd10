use crate::{
    CoreError, Flashcard, FlashcardId, FlashcardSet, GenerationLog, NewFlashcard, Note, NoteId,
    OwnerId, SetId,
};
use async_trait::async_trait;

pub mod memory;

#[async_trait]
pub trait Repository: Send + Sync {
    // Notes
    async fn create_note(&self, note: &Note) -> Result<Note, CoreError>;
    async fn get_note(&self, id: NoteId) -> Result<Note, CoreError>;
    /// Most recently updated first.
    async fn list_notes(&self, owner: OwnerId) -> Result<Vec<Note>, CoreError>;
    async fn update_note(&self, note: &Note) -> Result<Note, CoreError>;
    async fn delete_note(&self, owner: OwnerId, id: NoteId) -> Result<(), CoreError>;

    // Flashcard sets
    async fn create_set(&self, set: &FlashcardSet) -> Result<FlashcardSet, CoreError>;
    async fn get_set(&self, id: SetId) -> Result<FlashcardSet, CoreError>;
    /// Newest first.
    async fn list_sets(&self, owner: OwnerId) -> Result<Vec<FlashcardSet>, CoreError>;
    async fn update_set_counts(&self, id: SetId, total: u32, mastered: u32) -> Result<(), CoreError>;
    async fn set_public(&self, id: SetId, is_public: bool) -> Result<(), CoreError>;
    /// Removes the set and all of its cards.
    async fn delete_set(&self, id: SetId) -> Result<(), CoreError>;

    // Flashcards
    /// Appends after the set's current last position, keeping input order.
    async fn insert_flashcards(
        &self,
        set_id: SetId,
        note_id: Option<NoteId>,
        cards: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError>;
    /// Ordered by position.
    async fn list_flashcards(&self, set_id: SetId) -> Result<Vec<Flashcard>, CoreError>;
    async fn get_flashcard(&self, id: FlashcardId) -> Result<Flashcard, CoreError>;
    async fn update_flashcard(&self, card: &Flashcard) -> Result<Flashcard, CoreError>;
    async fn delete_flashcards_in_set(&self, set_id: SetId) -> Result<u32, CoreError>;
    /// Swaps every card in the set for `cards` (positions from 0) in one
    /// step; on error the previous cards are still there.
    async fn replace_flashcards(
        &self,
        set_id: SetId,
        note_id: Option<NoteId>,
        cards: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError>;

    // Generation audit
    async fn insert_generation_log(&self, log: &GenerationLog) -> Result<(), CoreError>;
    async fn list_generation_logs(&self, owner: OwnerId) -> Result<Vec<GenerationLog>, CoreError>;
}
