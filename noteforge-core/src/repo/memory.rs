use crate::{
    CoreError, Flashcard, FlashcardId, FlashcardSet, GenerationLog, NewFlashcard, Note, NoteId,
    OwnerId, SetId,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryRepo {
    notes: RwLock<HashMap<NoteId, Note>>,
    sets: RwLock<HashMap<SetId, FlashcardSet>>,
    cards: RwLock<HashMap<FlashcardId, Flashcard>>,
    logs: RwLock<Vec<GenerationLog>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl crate::repo::Repository for MemoryRepo {
    async fn create_note(&self, note: &Note) -> Result<Note, CoreError> {
        let mut m = self.notes.write();
        if m.contains_key(&note.id) {
            return Err(CoreError::Conflict("note already exists"));
        }
        m.insert(note.id, note.clone());
        Ok(note.clone())
    }

    async fn get_note(&self, id: NoteId) -> Result<Note, CoreError> {
        self.notes
            .read()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("note"))
    }

    async fn list_notes(&self, owner: OwnerId) -> Result<Vec<Note>, CoreError> {
        let mut v: Vec<Note> = self
            .notes
            .read()
            .values()
            .filter(|n| n.owner_id == owner)
            .cloned()
            .collect();
        v.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(v)
    }

    async fn update_note(&self, note: &Note) -> Result<Note, CoreError> {
        let mut m = self.notes.write();
        match m.get(&note.id) {
            Some(existing) if existing.owner_id == note.owner_id => {}
            _ => return Err(CoreError::NotFound("note")),
        }
        m.insert(note.id, note.clone());
        Ok(note.clone())
    }

    async fn delete_note(&self, owner: OwnerId, id: NoteId) -> Result<(), CoreError> {
        {
            let mut m = self.notes.write();
            match m.get(&id) {
                Some(n) if n.owner_id == owner => {}
                _ => return Err(CoreError::NotFound("note")),
            }
            m.remove(&id);
        }
        for s in self.sets.write().values_mut() {
            if s.note_id == Some(id) {
                s.note_id = None;
            }
        }
        for c in self.cards.write().values_mut() {
            if c.note_id == Some(id) {
                c.note_id = None;
            }
        }
        Ok(())
    }

    async fn create_set(&self, set: &FlashcardSet) -> Result<FlashcardSet, CoreError> {
        let mut m = self.sets.write();
        if m.contains_key(&set.id) {
            return Err(CoreError::Conflict("set already exists"));
        }
        m.insert(set.id, set.clone());
        Ok(set.clone())
    }

    async fn get_set(&self, id: SetId) -> Result<FlashcardSet, CoreError> {
        self.sets
            .read()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("set"))
    }

    async fn list_sets(&self, owner: OwnerId) -> Result<Vec<FlashcardSet>, CoreError> {
        let mut v: Vec<FlashcardSet> = self
            .sets
            .read()
            .values()
            .filter(|s| s.owner_id == owner)
            .cloned()
            .collect();
        v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(v)
    }

    async fn update_set_counts(&self, id: SetId, total: u32, mastered: u32) -> Result<(), CoreError> {
        let mut m = self.sets.write();
        let Some(set) = m.get_mut(&id) else {
            return Err(CoreError::NotFound("set"));
        };
        set.total_cards = total;
        set.mastered_cards = mastered;
        set.updated_at = Utc::now();
        Ok(())
    }

    async fn set_public(&self, id: SetId, is_public: bool) -> Result<(), CoreError> {
        let mut m = self.sets.write();
        let Some(set) = m.get_mut(&id) else {
            return Err(CoreError::NotFound("set"));
        };
        set.is_public = is_public;
        set.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_set(&self, id: SetId) -> Result<(), CoreError> {
        self.sets
            .write()
            .remove(&id)
            .ok_or(CoreError::NotFound("set"))?;
        self.cards.write().retain(|_, c| c.set_id != id);
        Ok(())
    }

    async fn insert_flashcards(
        &self,
        set_id: SetId,
        note_id: Option<NoteId>,
        cards: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError> {
        if !self.sets.read().contains_key(&set_id) {
            return Err(CoreError::NotFound("set"));
        }
        let mut m = self.cards.write();
        let start = m
            .values()
            .filter(|c| c.set_id == set_id)
            .map(|c| c.position + 1)
            .max()
            .unwrap_or(0);
        let inserted: Vec<Flashcard> = cards
            .iter()
            .enumerate()
            .map(|(i, nc)| Flashcard::new(set_id, note_id, start + i as u32, nc))
            .collect();
        for c in &inserted {
            m.insert(c.id, c.clone());
        }
        Ok(inserted)
    }

    async fn list_flashcards(&self, set_id: SetId) -> Result<Vec<Flashcard>, CoreError> {
        let mut v: Vec<Flashcard> = self
            .cards
            .read()
            .values()
            .filter(|c| c.set_id == set_id)
            .cloned()
            .collect();
        v.sort_by_key(|c| c.position);
        Ok(v)
    }

    async fn get_flashcard(&self, id: FlashcardId) -> Result<Flashcard, CoreError> {
        self.cards
            .read()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("flashcard"))
    }

    async fn update_flashcard(&self, card: &Flashcard) -> Result<Flashcard, CoreError> {
        let mut m = self.cards.write();
        if !m.contains_key(&card.id) {
            return Err(CoreError::NotFound("flashcard"));
        }
        m.insert(card.id, card.clone());
        Ok(card.clone())
    }

    async fn delete_flashcards_in_set(&self, set_id: SetId) -> Result<u32, CoreError> {
        let mut m = self.cards.write();
        let before = m.len();
        m.retain(|_, c| c.set_id != set_id);
        Ok((before - m.len()) as u32)
    }

    async fn replace_flashcards(
        &self,
        set_id: SetId,
        note_id: Option<NoteId>,
        cards: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError> {
        if !self.sets.read().contains_key(&set_id) {
            return Err(CoreError::NotFound("set"));
        }
        let mut m = self.cards.write();
        m.retain(|_, c| c.set_id != set_id);
        let inserted: Vec<Flashcard> = cards
            .iter()
            .enumerate()
            .map(|(i, nc)| Flashcard::new(set_id, note_id, i as u32, nc))
            .collect();
        for c in &inserted {
            m.insert(c.id, c.clone());
        }
        Ok(inserted)
    }

    async fn insert_generation_log(&self, log: &GenerationLog) -> Result<(), CoreError> {
        self.logs.write().push(log.clone());
        Ok(())
    }

    async fn list_generation_logs(&self, owner: OwnerId) -> Result<Vec<GenerationLog>, CoreError> {
        let mut v: Vec<GenerationLog> = self
            .logs
            .read()
            .iter()
            .filter(|l| l.owner_id == owner)
            .cloned()
            .collect();
        v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(v)
    }
}
