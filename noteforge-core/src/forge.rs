//! Orchestration over a repository and a text generator.
//!
//! `Forge` owns no state of its own; both backends are handed in at
//! construction so tests can swap in `MemoryRepo` and a canned generator.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    dedupe_context, generate_flashcards, merge, progress_of, select_source, stats,
    study, validate_count, validate_source_text, CardStatus, CoreError, DashboardStats,
    Flashcard, FlashcardId, FlashcardSet, GeneratedFlashcard, GenerationError, GenerationLog,
    GenerationParams, GenerationRequest, GenerationResult, GenerationSettings, Navigator,
    NewFlashcard, Note, NoteId, OwnerId, ReforgeAction, ReforgeSettings, Repository, SetId,
    SetProgress, TextGenerator, MAX_FRESH_COUNT, MAX_REFORGE_COUNT, REQUEST_TYPE_GENERATION,
    REQUEST_TYPE_REFORGE,
};

pub const SET_DESCRIPTION: &str = "AI-generated flashcards from note content";

/// A set together with the cards it now holds.
#[derive(Clone, Debug)]
pub struct ForgedSet {
    pub set: FlashcardSet,
    pub cards: Vec<Flashcard>,
    pub result: GenerationResult,
}

pub struct Forge {
    repo: Arc<dyn Repository>,
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
}

impl Forge {
    pub fn new(repo: Arc<dyn Repository>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            repo,
            generator,
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn repo(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    // ===== Notes =====

    pub async fn create_note(
        &self,
        owner: OwnerId,
        title: &str,
        content: &str,
        tags: &[String],
    ) -> Result<Note, CoreError> {
        let mut note = Note::new(owner, title, content);
        note.tags = tags.to_vec();
        self.repo.create_note(&note).await
    }

    /// Saves title, content and tags. Untitled notes are not saved.
    pub async fn save_note(
        &self,
        owner: OwnerId,
        id: NoteId,
        title: &str,
        content: &str,
        tags: &[String],
    ) -> Result<Note, CoreError> {
        if title.trim().is_empty() {
            return Err(CoreError::Invalid("note title is required"));
        }
        let mut note = self.owned_note(owner, id).await?;
        note.title = title.to_string();
        note.content = content.to_string();
        note.tags = tags.to_vec();
        note.updated_at = chrono::Utc::now();
        self.repo.update_note(&note).await
    }

    pub async fn owned_note(&self, owner: OwnerId, id: NoteId) -> Result<Note, CoreError> {
        let note = self.repo.get_note(id).await?;
        if note.owner_id != owner {
            return Err(CoreError::NotFound("note"));
        }
        Ok(note)
    }

    pub async fn owned_set(&self, owner: OwnerId, id: SetId) -> Result<FlashcardSet, CoreError> {
        let set = self.repo.get_set(id).await?;
        if set.owner_id != owner {
            return Err(CoreError::NotFound("set"));
        }
        Ok(set)
    }

    // ===== Fresh generation =====

    /// Generate cards for a note without storing anything.
    pub async fn preview_for_note(
        &self,
        owner: OwnerId,
        note_id: NoteId,
        settings: &GenerationSettings,
    ) -> Result<GenerationResult, GenerationError> {
        let note = self.owned_note(owner, note_id).await?;
        let request = fresh_request(&note.content, settings)?;
        self.run(owner, Some(note.id), REQUEST_TYPE_GENERATION, &request, MAX_FRESH_COUNT)
            .await
    }

    /// Generate cards for a note and store them as a new set.
    pub async fn generate_for_note(
        &self,
        owner: OwnerId,
        note_id: NoteId,
        settings: &GenerationSettings,
    ) -> Result<ForgedSet, GenerationError> {
        let note = self.owned_note(owner, note_id).await?;
        let request = fresh_request(&note.content, settings)?;
        let result = self
            .run(owner, Some(note.id), REQUEST_TYPE_GENERATION, &request, MAX_FRESH_COUNT)
            .await?;
        self.save_generated(owner, Some(&note), result).await
    }

    /// Store previously generated cards (preview accepted) as a new set.
    pub async fn save_generated(
        &self,
        owner: OwnerId,
        note: Option<&Note>,
        result: GenerationResult,
    ) -> Result<ForgedSet, GenerationError> {
        let title = match note.map(|n| n.title.trim()).filter(|t| !t.is_empty()) {
            Some(t) => format!("Flashcards from: {t}"),
            None => "Generated Flashcards".to_string(),
        };
        let note_id = note.map(|n| n.id);
        let set = FlashcardSet::new(owner, note_id, title, Some(SET_DESCRIPTION.to_string()));
        let set = self.repo.create_set(&set).await?;

        let cards = self
            .repo
            .insert_flashcards(set.id, note_id, &to_new_cards(&result.flashcards))
            .await?;
        let progress = progress_of(&cards);
        self.repo
            .update_set_counts(set.id, progress.total, progress.mastered)
            .await?;
        let set = self.repo.get_set(set.id).await?;

        info!(set = %set.id, cards = cards.len(), "flashcard set created");
        Ok(ForgedSet { set, cards, result })
    }

    // ===== Reforge =====

    /// Reforge a set from the note it was generated from.
    pub async fn reforge(
        &self,
        owner: OwnerId,
        set_id: SetId,
        selected_section: Option<&str>,
        settings: &ReforgeSettings,
    ) -> Result<ForgedSet, GenerationError> {
        let set = self.owned_set(owner, set_id).await?;
        let note_id = set
            .note_id
            .ok_or_else(|| GenerationError::validation("This set has no source note to reforge from"))?;
        let note = self.owned_note(owner, note_id).await?;
        self.reforge_with_content(owner, set_id, &note.content, selected_section, settings)
            .await
    }

    /// Preview of a reforge: generate against the set's current cards, store nothing.
    pub async fn preview_reforge(
        &self,
        owner: OwnerId,
        set_id: SetId,
        note_content: &str,
        selected_section: Option<&str>,
        settings: &ReforgeSettings,
    ) -> Result<GenerationResult, GenerationError> {
        let set = self.owned_set(owner, set_id).await?;
        let existing = self.repo.list_flashcards(set.id).await?;
        let request = reforge_request(note_content, selected_section, settings, &existing)?;
        self.run(owner, set.note_id, REQUEST_TYPE_REFORGE, &request, MAX_REFORGE_COUNT)
            .await
    }

    pub async fn reforge_with_content(
        &self,
        owner: OwnerId,
        set_id: SetId,
        note_content: &str,
        selected_section: Option<&str>,
        settings: &ReforgeSettings,
    ) -> Result<ForgedSet, GenerationError> {
        let set = self.owned_set(owner, set_id).await?;
        let existing = self.repo.list_flashcards(set.id).await?;
        let request = reforge_request(note_content, selected_section, settings, &existing)?;
        let result = self
            .run(owner, set.note_id, REQUEST_TYPE_REFORGE, &request, MAX_REFORGE_COUNT)
            .await?;
        self.apply_reforge(owner, set_id, settings.action, result).await
    }

    /// Merge generated cards into a set per `action` and fix up its counters.
    pub async fn apply_reforge(
        &self,
        owner: OwnerId,
        set_id: SetId,
        action: ReforgeAction,
        result: GenerationResult,
    ) -> Result<ForgedSet, GenerationError> {
        let set = self.owned_set(owner, set_id).await?;
        let existing = self.repo.list_flashcards(set.id).await?;

        let new_cards = to_new_cards(&result.flashcards);
        let inserted = match action {
            ReforgeAction::Regenerate => {
                let inserted = self.repo.replace_flashcards(set.id, set.note_id, &new_cards).await?;
                info!(set = %set.id, removed = existing.len(), "cleared set for regeneration");
                inserted
            }
            ReforgeAction::AddMore => self.repo.insert_flashcards(set.id, set.note_id, &new_cards).await?,
        };

        let cards = merge(&existing, &inserted, action);
        let total = action.resulting_total(existing.len() as u32, inserted.len() as u32);
        debug_assert_eq!(total as usize, cards.len());
        let progress = progress_of(&cards);
        self.repo
            .update_set_counts(set.id, total, progress.mastered)
            .await?;
        let set = self.repo.get_set(set.id).await?;

        info!(
            set = %set.id,
            action = action.as_str(),
            added = inserted.len(),
            total,
            "set reforged"
        );
        Ok(ForgedSet { set, cards, result })
    }

    // ===== Study =====

    pub async fn mark_mastered(&self, card_id: FlashcardId) -> Result<(Flashcard, SetProgress), CoreError> {
        let card = self.repo.get_flashcard(card_id).await?;
        let card = self.repo.update_flashcard(&study::mark_mastered(card)).await?;
        let progress = self.refresh_counts(card.set_id).await?;
        Ok((card, progress))
    }

    pub async fn record_review(
        &self,
        card_id: FlashcardId,
        status: CardStatus,
        was_correct: Option<bool>,
    ) -> Result<(Flashcard, SetProgress), CoreError> {
        let card = self.repo.get_flashcard(card_id).await?;
        let card = self
            .repo
            .update_flashcard(&study::record_review(card, status, was_correct))
            .await?;
        let progress = self.refresh_counts(card.set_id).await?;
        Ok((card, progress))
    }

    /// Recount the set's cards and store the totals on the set.
    pub async fn refresh_counts(&self, set_id: SetId) -> Result<SetProgress, CoreError> {
        let progress = self.set_progress(set_id).await?;
        self.repo
            .update_set_counts(set_id, progress.total, progress.mastered)
            .await?;
        Ok(progress)
    }

    pub async fn set_progress(&self, set_id: SetId) -> Result<SetProgress, CoreError> {
        let cards = self.repo.list_flashcards(set_id).await?;
        Ok(progress_of(&cards))
    }

    pub async fn navigator(&self, set_id: SetId) -> Result<Navigator, CoreError> {
        let cards = self.repo.list_flashcards(set_id).await?;
        Ok(Navigator::from_cards(&cards))
    }

    // ===== Sharing & housekeeping =====

    pub async fn set_public(&self, owner: OwnerId, set_id: SetId, is_public: bool) -> Result<(), CoreError> {
        let set = self.owned_set(owner, set_id).await?;
        self.repo.set_public(set.id, is_public).await
    }

    /// A shared set with its cards; private sets read as not found.
    pub async fn public_set(&self, set_id: SetId) -> Result<(FlashcardSet, Vec<Flashcard>), CoreError> {
        let set = self.repo.get_set(set_id).await?;
        if !set.is_public {
            return Err(CoreError::NotFound("set"));
        }
        let cards = self.repo.list_flashcards(set.id).await?;
        Ok((set, cards))
    }

    pub async fn delete_set(&self, owner: OwnerId, set_id: SetId) -> Result<(), CoreError> {
        let set = self.owned_set(owner, set_id).await?;
        self.repo.delete_set(set.id).await
    }

    pub async fn dashboard(&self, owner: OwnerId) -> Result<DashboardStats, CoreError> {
        let notes = self.repo.list_notes(owner).await?;
        let sets = self.repo.list_sets(owner).await?;
        let logs = self.repo.list_generation_logs(owner).await?;
        Ok(stats::summarize(&notes, &sets, &logs))
    }

    // ===== Internals =====

    /// One adapter call, with its outcome written to the audit log.
    async fn run(
        &self,
        owner: OwnerId,
        note_id: Option<NoteId>,
        request_type: &str,
        request: &GenerationRequest,
        max_count: u32,
    ) -> Result<GenerationResult, GenerationError> {
        let summary = format!(
            "Generate {} {} flashcards from note content",
            request.requested_count, request.difficulty
        );
        let log = GenerationLog::new(owner, note_id, request_type, summary);

        match generate_flashcards(&*self.generator, request, max_count, &self.params).await {
            Ok(result) => {
                let response = serde_json::to_string(&result.flashcards).unwrap_or_default();
                let log = log.completed(response, result.estimated_tokens, result.estimated_cost_cents);
                self.write_log(&log).await;
                Ok(result)
            }
            Err(e @ GenerationError::Validation(_)) => Err(e),
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "flashcard generation failed");
                self.write_log(&log.failed(e.to_string())).await;
                Err(e)
            }
        }
    }

    async fn write_log(&self, log: &GenerationLog) {
        if let Err(e) = self.repo.insert_generation_log(log).await {
            warn!(error = %e, "could not record generation request");
        }
    }
}

fn fresh_request(
    content: &str,
    settings: &GenerationSettings,
) -> Result<GenerationRequest, GenerationError> {
    validate_source_text(content)?;
    validate_count(settings.min_count, MAX_FRESH_COUNT)?;
    let mut request = GenerationRequest::new(
        content,
        settings.min_count,
        settings.difficulty.to_difficulty(),
    );
    if !settings.custom_prompt.trim().is_empty() {
        request = request.with_custom_instructions(settings.custom_prompt.trim());
    }
    Ok(request)
}

fn reforge_request(
    note_content: &str,
    selected_section: Option<&str>,
    settings: &ReforgeSettings,
    existing: &[Flashcard],
) -> Result<GenerationRequest, GenerationError> {
    validate_source_text(note_content)?;
    validate_count(settings.min_count, MAX_REFORGE_COUNT)?;
    let source = select_source(note_content, settings.use_selected_section, selected_section)?;
    Ok(GenerationRequest::new(
        source,
        settings.min_count,
        settings.difficulty.to_difficulty(),
    )
    .with_dedupe_context(dedupe_context(existing.iter().map(|c| c.question.as_str()))))
}

fn to_new_cards(cards: &[GeneratedFlashcard]) -> Vec<NewFlashcard> {
    cards
        .iter()
        .map(|c| NewFlashcard {
            question: c.question.clone(),
            answer: c.answer.clone(),
            difficulty: c.difficulty,
        })
        .collect()
}
