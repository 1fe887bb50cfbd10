use async_trait::async_trait;
use chrono::{DateTime, Utc};
use noteforge_core::{
    repo::Repository, CoreError, Flashcard, FlashcardId, FlashcardSet, GenerationLog, NewFlashcard,
    Note, NoteId, OwnerId, SetId,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;
use tracing::{debug, warn};

pub mod paths;
pub mod settings;

pub use settings::SettingsFile;

const FILE_VERSION: u32 = 1;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    notes: Vec<Note>,
    #[serde(default)]
    sets: Vec<FlashcardSet>,
    #[serde(default)]
    flashcards: Vec<Flashcard>,
    #[serde(default)]
    generation_logs: Vec<GenerationLog>,
}

#[derive(Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    notes: HashMap<NoteId, Note>,
    sets: HashMap<SetId, FlashcardSet>,
    cards: HashMap<FlashcardId, Flashcard>,
    logs: Vec<GenerationLog>,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            notes: HashMap::new(),
            sets: HashMap::new(),
            cards: HashMap::new(),
            logs: Vec::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        let mut flashcards: Vec<Flashcard> = self.cards.values().cloned().collect();
        flashcards.sort_by_key(|c| (c.set_id, c.position));
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            notes: self.notes.values().cloned().collect(),
            sets: self.sets.values().cloned().collect(),
            flashcards,
            generation_logs: self.logs.clone(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        Self {
            created_at: img.created_at,
            updated_at: img.updated_at,
            notes: img.notes.into_iter().map(|n| (n.id, n)).collect(),
            sets: img.sets.into_iter().map(|s| (s.id, s)).collect(),
            cards: img.flashcards.into_iter().map(|c| (c.id, c)).collect(),
            logs: img.generation_logs,
        }
    }

    fn owned_note(&self, owner: OwnerId, id: NoteId) -> Result<&Note, CoreError> {
        match self.notes.get(&id) {
            Some(n) if n.owner_id == owner => Ok(n),
            _ => Err(CoreError::NotFound("note")),
        }
    }
}

/// Whole-file JSON store. Every mutation rewrites the file atomically and
/// drops a timestamped copy into the backups directory.
pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, 10).await
    }

    pub async fn open_with(
        path: PathBuf,
        backups_dir: PathBuf,
        max_backups: usize,
    ) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let max_backups = max_backups.max(1);
        let state = load_or_init(&path, &backups_dir, max_backups).await?;
        Ok(Self {
            path,
            backups_dir,
            max_backups,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self) -> Result<(), CoreError> {
        let snapshot = {
            let mut s = self.state.write();
            s.updated_at = Utc::now();
            s.to_image()
        };
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &snapshot))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|e| {
                warn!(error = %e, "failed to write store file");
                CoreError::Storage("io")
            })?;
        debug!(path = %self.path.display(), "store saved");
        Ok(())
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

async fn load_or_init(path: &Path, backups_dir: &Path, keep: usize) -> Result<State, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img: FileImage = task::spawn_blocking(move || {
            let buf = fs::read_to_string(&p)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))
        .and_then(|r| r.map_err(|_| CoreError::Storage("corrupt store file")))?;
        if img.version > FILE_VERSION {
            return Err(CoreError::Storage("store file written by a newer version"));
        }
        Ok(State::from_image(img))
    } else {
        let st = State::new_empty();
        write_with_backup(path, backups_dir, keep, &st.to_image())
            .map_err(|_| CoreError::Storage("io"))?;
        Ok(st)
    }
}

/// Write `bytes` to a temp file next to `path`, then rename it into place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    max_backups: usize,
    img: &FileImage,
) -> Result<(), std::io::Error> {
    let json = serde_json::to_vec_pretty(img)?;
    write_atomic(path, &json)?;

    fs::create_dir_all(backups_dir)?;
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    write_atomic(&backups_dir.join(format!("noteforge-{ts}.json")), &json)?;

    rotate_backups(backups_dir, max_backups)
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    // Timestamped names sort chronologically.
    entries.sort();
    if entries.len() > keep {
        for p in &entries[..entries.len() - keep] {
            let _ = fs::remove_file(p);
        }
    }
    Ok(())
}

#[async_trait]
impl Repository for JsonStore {
    async fn create_note(&self, note: &Note) -> Result<Note, CoreError> {
        {
            let mut s = self.state.write();
            if s.notes.contains_key(&note.id) {
                return Err(CoreError::Conflict("note already exists"));
            }
            s.notes.insert(note.id, note.clone());
        }
        self.save().await?;
        Ok(note.clone())
    }

    async fn get_note(&self, id: NoteId) -> Result<Note, CoreError> {
        let s = self.state.read();
        s.notes.get(&id).cloned().ok_or(CoreError::NotFound("note"))
    }

    async fn list_notes(&self, owner: OwnerId) -> Result<Vec<Note>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<Note> = s.notes.values().filter(|n| n.owner_id == owner).cloned().collect();
        v.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(v)
    }

    async fn update_note(&self, note: &Note) -> Result<Note, CoreError> {
        {
            let mut s = self.state.write();
            s.owned_note(note.owner_id, note.id)?;
            s.notes.insert(note.id, note.clone());
        }
        self.save().await?;
        Ok(note.clone())
    }

    async fn delete_note(&self, owner: OwnerId, id: NoteId) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            s.owned_note(owner, id)?;
            s.notes.remove(&id);
            for set in s.sets.values_mut().filter(|set| set.note_id == Some(id)) {
                set.note_id = None;
            }
            for card in s.cards.values_mut().filter(|c| c.note_id == Some(id)) {
                card.note_id = None;
            }
        }
        self.save().await
    }

    async fn create_set(&self, set: &FlashcardSet) -> Result<FlashcardSet, CoreError> {
        {
            let mut s = self.state.write();
            if s.sets.contains_key(&set.id) {
                return Err(CoreError::Conflict("set already exists"));
            }
            s.sets.insert(set.id, set.clone());
        }
        self.save().await?;
        Ok(set.clone())
    }

    async fn get_set(&self, id: SetId) -> Result<FlashcardSet, CoreError> {
        let s = self.state.read();
        s.sets.get(&id).cloned().ok_or(CoreError::NotFound("set"))
    }

    async fn list_sets(&self, owner: OwnerId) -> Result<Vec<FlashcardSet>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<FlashcardSet> =
            s.sets.values().filter(|set| set.owner_id == owner).cloned().collect();
        v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(v)
    }

    async fn update_set_counts(&self, id: SetId, total: u32, mastered: u32) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            let Some(set) = s.sets.get_mut(&id) else {
                return Err(CoreError::NotFound("set"));
            };
            set.total_cards = total;
            set.mastered_cards = mastered;
            set.updated_at = Utc::now();
        }
        self.save().await
    }

    async fn set_public(&self, id: SetId, is_public: bool) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            let Some(set) = s.sets.get_mut(&id) else {
                return Err(CoreError::NotFound("set"));
            };
            set.is_public = is_public;
            set.updated_at = Utc::now();
        }
        self.save().await
    }

    async fn delete_set(&self, id: SetId) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if s.sets.remove(&id).is_none() {
                return Err(CoreError::NotFound("set"));
            }
            s.cards.retain(|_, c| c.set_id != id);
        }
        self.save().await
    }

    async fn insert_flashcards(
        &self,
        set_id: SetId,
        note_id: Option<NoteId>,
        cards: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError> {
        let inserted = {
            let mut s = self.state.write();
            if !s.sets.contains_key(&set_id) {
                return Err(CoreError::NotFound("set"));
            }
            let start = s
                .cards
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
                s.cards.insert(c.id, c.clone());
            }
            inserted
        };
        self.save().await?;
        Ok(inserted)
    }

    async fn list_flashcards(&self, set_id: SetId) -> Result<Vec<Flashcard>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<Flashcard> = s.cards.values().filter(|c| c.set_id == set_id).cloned().collect();
        v.sort_by_key(|c| c.position);
        Ok(v)
    }

    async fn get_flashcard(&self, id: FlashcardId) -> Result<Flashcard, CoreError> {
        let s = self.state.read();
        s.cards.get(&id).cloned().ok_or(CoreError::NotFound("flashcard"))
    }

    async fn update_flashcard(&self, card: &Flashcard) -> Result<Flashcard, CoreError> {
        {
            let mut s = self.state.write();
            if !s.cards.contains_key(&card.id) {
                return Err(CoreError::NotFound("flashcard"));
            }
            s.cards.insert(card.id, card.clone());
        }
        self.save().await?;
        Ok(card.clone())
    }

    async fn delete_flashcards_in_set(&self, set_id: SetId) -> Result<u32, CoreError> {
        let removed = {
            let mut s = self.state.write();
            let before = s.cards.len();
            s.cards.retain(|_, c| c.set_id != set_id);
            (before - s.cards.len()) as u32
        };
        if removed > 0 {
            self.save().await?;
        }
        Ok(removed)
    }

    async fn replace_flashcards(
        &self,
        set_id: SetId,
        note_id: Option<NoteId>,
        cards: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError> {
        let inserted = {
            let mut s = self.state.write();
            if !s.sets.contains_key(&set_id) {
                return Err(CoreError::NotFound("set"));
            }
            s.cards.retain(|_, c| c.set_id != set_id);
            let inserted: Vec<Flashcard> = cards
                .iter()
                .enumerate()
                .map(|(i, nc)| Flashcard::new(set_id, note_id, i as u32, nc))
                .collect();
            for c in &inserted {
                s.cards.insert(c.id, c.clone());
            }
            inserted
        };
        self.save().await?;
        Ok(inserted)
    }

    async fn insert_generation_log(&self, log: &GenerationLog) -> Result<(), CoreError> {
        self.state.write().logs.push(log.clone());
        self.save().await
    }

    async fn list_generation_logs(&self, owner: OwnerId) -> Result<Vec<GenerationLog>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<GenerationLog> = s.logs.iter().filter(|l| l.owner_id == owner).cloned().collect();
        v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(v)
    }
}
