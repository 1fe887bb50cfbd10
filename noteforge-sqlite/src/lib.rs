use chrono::{DateTime, Utc};
use noteforge_core::{
    repo::Repository, CardStatus, CoreError, Flashcard, FlashcardId, FlashcardSet, GenerationLog,
    NewFlashcard, Note, NoteId, NoteStatus, OwnerId, RequestStatus, SetId,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqliteConnection, SqlitePool,
};
use std::path::Path;
use tracing::debug;

const NOTE_COLS: &str = "id,owner_id,title,content,status,tags,is_public,created_at,updated_at";
const SET_COLS: &str =
    "id,owner_id,note_id,title,description,total_cards,mastered_cards,is_public,created_at,updated_at";
const CARD_COLS: &str = "id,set_id,note_id,position,question,answer,status,difficulty_level,\
                         last_reviewed,review_count,correct_count,created_at,updated_at";
const LOG_COLS: &str = "id,owner_id,note_id,request_type,prompt,response,status,tokens_used,\
                        cost_cents,error_message,created_at,completed_at";

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|_| CoreError::Storage("io"))?;
        }
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        debug!(path = %path.as_ref().display(), "sqlite store opened");
        Ok(repo)
    }

    /// Single connection: every `:memory:` connection is a separate database.
    pub async fn open_memory() -> Result<Self, CoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS notes (
          id          TEXT PRIMARY KEY,
          owner_id    TEXT NOT NULL,
          title       TEXT NOT NULL,
          content     TEXT NOT NULL,
          status      TEXT NOT NULL DEFAULT 'draft',
          tags        TEXT NOT NULL,
          is_public   INTEGER NOT NULL DEFAULT 0,
          created_at  TEXT NOT NULL,
          updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS flashcard_sets (
          id              TEXT PRIMARY KEY,
          owner_id        TEXT NOT NULL,
          note_id         TEXT,
          title           TEXT NOT NULL,
          description     TEXT,
          total_cards     INTEGER NOT NULL DEFAULT 0,
          mastered_cards  INTEGER NOT NULL DEFAULT 0,
          is_public       INTEGER NOT NULL DEFAULT 0,
          created_at      TEXT NOT NULL,
          updated_at      TEXT NOT NULL,
          FOREIGN KEY(note_id) REFERENCES notes(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS flashcards (
          id                TEXT PRIMARY KEY,
          set_id            TEXT NOT NULL,
          note_id           TEXT,
          position          INTEGER NOT NULL,
          question          TEXT NOT NULL,
          answer            TEXT NOT NULL,
          status            TEXT NOT NULL DEFAULT 'new',
          difficulty_level  INTEGER NOT NULL DEFAULT 2,
          last_reviewed     TEXT,
          review_count      INTEGER NOT NULL DEFAULT 0,
          correct_count     INTEGER NOT NULL DEFAULT 0,
          created_at        TEXT NOT NULL,
          updated_at        TEXT NOT NULL,
          FOREIGN KEY(set_id) REFERENCES flashcard_sets(id) ON DELETE CASCADE,
          FOREIGN KEY(note_id) REFERENCES notes(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS generation_logs (
          id             TEXT PRIMARY KEY,
          owner_id       TEXT NOT NULL,
          note_id        TEXT,
          request_type   TEXT NOT NULL,
          prompt         TEXT NOT NULL,
          response       TEXT,
          status         TEXT NOT NULL,
          tokens_used    INTEGER,
          cost_cents     INTEGER,
          error_message  TEXT,
          created_at     TEXT NOT NULL,
          completed_at   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes (owner_id, updated_at);
        CREATE INDEX IF NOT EXISTS idx_sets_owner ON flashcard_sets (owner_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_flashcards_set_pos ON flashcards (set_id, position);
        CREATE INDEX IF NOT EXISTS idx_logs_owner ON generation_logs (owner_id, created_at);
        "#;

        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("sqlite schema"))?;
        }
        Ok(())
    }

    async fn set_exists(&self, id: SetId) -> Result<bool, CoreError> {
        Ok(sqlx::query("SELECT 1 FROM flashcard_sets WHERE id=? LIMIT 1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read set"))?
            .is_some())
    }
}

#[async_trait::async_trait]
impl Repository for SqliteRepo {
    // ===== Notes =====
    async fn create_note(&self, note: &Note) -> Result<Note, CoreError> {
        sqlx::query(
            r#"INSERT INTO notes (id,owner_id,title,content,status,tags,is_public,created_at,updated_at)
               VALUES (?,?,?,?,?,?,?,?,?)"#,
        )
        .bind(note.id.to_string())
        .bind(note.owner_id.to_string())
        .bind(&note.title)
        .bind(&note.content)
        .bind(note_status_to_str(note.status))
        .bind(tags_to_json(&note.tags))
        .bind(bool_to_i(note.is_public))
        .bind(dt_to_str(note.created_at))
        .bind(dt_to_str(note.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::Conflict("note already exists")
            }
            _ => CoreError::Storage("insert note"),
        })?;
        Ok(note.clone())
    }

    async fn get_note(&self, id: NoteId) -> Result<Note, CoreError> {
        let row = sqlx::query(&format!("SELECT {NOTE_COLS} FROM notes WHERE id=?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read note"))?;
        row_into_note(row.ok_or(CoreError::NotFound("note"))?)
    }

    async fn list_notes(&self, owner: OwnerId) -> Result<Vec<Note>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {NOTE_COLS} FROM notes WHERE owner_id=? ORDER BY updated_at DESC"
        ))
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list notes"))?;
        rows.into_iter().map(row_into_note).collect()
    }

    async fn update_note(&self, note: &Note) -> Result<Note, CoreError> {
        let res = sqlx::query(
            r#"UPDATE notes SET title=?, content=?, status=?, tags=?, is_public=?, updated_at=?
               WHERE id=? AND owner_id=?"#,
        )
        .bind(&note.title)
        .bind(&note.content)
        .bind(note_status_to_str(note.status))
        .bind(tags_to_json(&note.tags))
        .bind(bool_to_i(note.is_public))
        .bind(dt_to_str(note.updated_at))
        .bind(note.id.to_string())
        .bind(note.owner_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("update note"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("note"));
        }
        Ok(note.clone())
    }

    async fn delete_note(&self, owner: OwnerId, id: NoteId) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        let res = sqlx::query("DELETE FROM notes WHERE id=? AND owner_id=?")
            .bind(id.to_string())
            .bind(owner.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del note"))?;
        if res.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(CoreError::NotFound("note"));
        }

        // Detach explicitly; foreign key enforcement may be off on older files.
        for table in ["flashcard_sets", "flashcards"] {
            sqlx::query(&format!("UPDATE {table} SET note_id=NULL WHERE note_id=?"))
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|_| CoreError::Storage("detach note"))?;
        }

        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))
    }

    // ===== Sets =====
    async fn create_set(&self, set: &FlashcardSet) -> Result<FlashcardSet, CoreError> {
        sqlx::query(&format!(
            "INSERT INTO flashcard_sets ({SET_COLS}) VALUES (?,?,?,?,?,?,?,?,?,?)"
        ))
        .bind(set.id.to_string())
        .bind(set.owner_id.to_string())
        .bind(set.note_id.map(|n| n.to_string()))
        .bind(&set.title)
        .bind(set.description.clone())
        .bind(set.total_cards as i64)
        .bind(set.mastered_cards as i64)
        .bind(bool_to_i(set.is_public))
        .bind(dt_to_str(set.created_at))
        .bind(dt_to_str(set.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::Conflict("set already exists")
            }
            _ => CoreError::Storage("insert set"),
        })?;
        Ok(set.clone())
    }

    async fn get_set(&self, id: SetId) -> Result<FlashcardSet, CoreError> {
        let row = sqlx::query(&format!("SELECT {SET_COLS} FROM flashcard_sets WHERE id=?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read set"))?;
        row_into_set(row.ok_or(CoreError::NotFound("set"))?)
    }

    async fn list_sets(&self, owner: OwnerId) -> Result<Vec<FlashcardSet>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SET_COLS} FROM flashcard_sets WHERE owner_id=? ORDER BY created_at DESC"
        ))
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list sets"))?;
        rows.into_iter().map(row_into_set).collect()
    }

    async fn update_set_counts(&self, id: SetId, total: u32, mastered: u32) -> Result<(), CoreError> {
        let res = sqlx::query(
            "UPDATE flashcard_sets SET total_cards=?, mastered_cards=?, updated_at=? WHERE id=?",
        )
        .bind(total as i64)
        .bind(mastered as i64)
        .bind(dt_to_str(Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("update set"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("set"));
        }
        Ok(())
    }

    async fn set_public(&self, id: SetId, is_public: bool) -> Result<(), CoreError> {
        let res = sqlx::query("UPDATE flashcard_sets SET is_public=?, updated_at=? WHERE id=?")
            .bind(bool_to_i(is_public))
            .bind(dt_to_str(Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("update set"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("set"));
        }
        Ok(())
    }

    async fn delete_set(&self, id: SetId) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        sqlx::query("DELETE FROM flashcards WHERE set_id=?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del cards"))?;

        let res = sqlx::query("DELETE FROM flashcard_sets WHERE id=?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del set"))?;
        if res.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(CoreError::NotFound("set"));
        }

        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))
    }

    // ===== Flashcards =====
    async fn insert_flashcards(
        &self,
        set_id: SetId,
        note_id: Option<NoteId>,
        cards: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError> {
        if !self.set_exists(set_id).await? {
            return Err(CoreError::NotFound("set"));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        let next: i64 = sqlx::query("SELECT COALESCE(MAX(position) + 1, 0) AS next FROM flashcards WHERE set_id=?")
            .bind(set_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("read positions"))?
            .get("next");

        let inserted = insert_cards(&mut tx, set_id, note_id, next as u32, cards).await?;

        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))?;
        Ok(inserted)
    }

    async fn replace_flashcards(
        &self,
        set_id: SetId,
        note_id: Option<NoteId>,
        cards: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError> {
        if !self.set_exists(set_id).await? {
            return Err(CoreError::NotFound("set"));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        let removed = sqlx::query("DELETE FROM flashcards WHERE set_id=?")
            .bind(set_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del cards"))?
            .rows_affected();
        let inserted = insert_cards(&mut tx, set_id, note_id, 0, cards).await?;

        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))?;
        debug!(set = %set_id, removed, added = inserted.len(), "replaced flashcards");
        Ok(inserted)
    }

    async fn list_flashcards(&self, set_id: SetId) -> Result<Vec<Flashcard>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CARD_COLS} FROM flashcards WHERE set_id=? ORDER BY position ASC"
        ))
        .bind(set_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list flashcards"))?;
        rows.into_iter().map(row_into_card).collect()
    }

    async fn get_flashcard(&self, id: FlashcardId) -> Result<Flashcard, CoreError> {
        let row = sqlx::query(&format!("SELECT {CARD_COLS} FROM flashcards WHERE id=?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read flashcard"))?;
        row_into_card(row.ok_or(CoreError::NotFound("flashcard"))?)
    }

    async fn update_flashcard(&self, card: &Flashcard) -> Result<Flashcard, CoreError> {
        let res = sqlx::query(
            r#"
            UPDATE flashcards SET
              note_id=?, position=?, question=?, answer=?, status=?, difficulty_level=?,
              last_reviewed=?, review_count=?, correct_count=?, updated_at=?
            WHERE id=?
            "#,
        )
        .bind(card.note_id.map(|n| n.to_string()))
        .bind(card.position as i64)
        .bind(&card.question)
        .bind(&card.answer)
        .bind(card.status.as_str())
        .bind(card.difficulty_level as i64)
        .bind(card.last_reviewed.map(dt_to_str))
        .bind(card.review_count as i64)
        .bind(card.correct_count as i64)
        .bind(dt_to_str(card.updated_at))
        .bind(card.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("update flashcard"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("flashcard"));
        }
        Ok(card.clone())
    }

    async fn delete_flashcards_in_set(&self, set_id: SetId) -> Result<u32, CoreError> {
        let res = sqlx::query("DELETE FROM flashcards WHERE set_id=?")
            .bind(set_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("del cards"))?;
        Ok(res.rows_affected() as u32)
    }

    // ===== Generation logs =====
    async fn insert_generation_log(&self, log: &GenerationLog) -> Result<(), CoreError> {
        sqlx::query(&format!(
            "INSERT INTO generation_logs ({LOG_COLS}) VALUES (?,?,?,?,?,?,?,?,?,?,?,?)"
        ))
        .bind(log.id.to_string())
        .bind(log.owner_id.to_string())
        .bind(log.note_id.map(|n| n.to_string()))
        .bind(&log.request_type)
        .bind(&log.prompt)
        .bind(log.response.clone())
        .bind(request_status_to_str(log.status))
        .bind(log.tokens_used.map(|t| t as i64))
        .bind(log.cost_cents.map(|c| c as i64))
        .bind(log.error_message.clone())
        .bind(dt_to_str(log.created_at))
        .bind(log.completed_at.map(dt_to_str))
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("insert generation log"))?;
        Ok(())
    }

    async fn list_generation_logs(&self, owner: OwnerId) -> Result<Vec<GenerationLog>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {LOG_COLS} FROM generation_logs WHERE owner_id=? ORDER BY created_at DESC"
        ))
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list generation logs"))?;
        rows.into_iter().map(row_into_log).collect()
    }
}

/// Inserts `cards` on the caller's connection, numbering positions from `start`.
async fn insert_cards(
    conn: &mut SqliteConnection,
    set_id: SetId,
    note_id: Option<NoteId>,
    start: u32,
    cards: &[NewFlashcard],
) -> Result<Vec<Flashcard>, CoreError> {
    let mut inserted = Vec::with_capacity(cards.len());
    for (i, nc) in cards.iter().enumerate() {
        let card = Flashcard::new(set_id, note_id, start + i as u32, nc);
        sqlx::query(&format!(
            "INSERT INTO flashcards ({CARD_COLS}) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?)"
        ))
        .bind(card.id.to_string())
        .bind(card.set_id.to_string())
        .bind(card.note_id.map(|n| n.to_string()))
        .bind(card.position as i64)
        .bind(&card.question)
        .bind(&card.answer)
        .bind(card.status.as_str())
        .bind(card.difficulty_level as i64)
        .bind(card.last_reviewed.map(dt_to_str))
        .bind(card.review_count as i64)
        .bind(card.correct_count as i64)
        .bind(dt_to_str(card.created_at))
        .bind(dt_to_str(card.updated_at))
        .execute(&mut *conn)
        .await
        .map_err(|_| CoreError::Storage("insert flashcard"))?;
        inserted.push(card);
    }
    Ok(inserted)
}

// ===== Helpers =====
fn uuid_from_str(s: String) -> Result<uuid::Uuid, CoreError> {
    uuid::Uuid::parse_str(&s).map_err(|_| CoreError::Invalid("uuid"))
}

fn opt_uuid(s: Option<String>) -> Result<Option<uuid::Uuid>, CoreError> {
    s.map(uuid_from_str).transpose()
}

fn dt_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn dt_from_str(s: String) -> Result<DateTime<Utc>, CoreError> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map_err(|_| CoreError::Invalid("datetime"))
        .map(|dt| dt.with_timezone(&Utc))
}

fn bool_to_i(b: bool) -> i64 {
    if b {
        1
    } else {
        0
    }
}

fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

fn note_status_to_str(s: NoteStatus) -> &'static str {
    match s {
        NoteStatus::Draft => "draft",
        NoteStatus::Published => "published",
        NoteStatus::Archived => "archived",
    }
}

fn note_status_from_str(s: &str) -> NoteStatus {
    match s {
        "published" => NoteStatus::Published,
        "archived" => NoteStatus::Archived,
        _ => NoteStatus::Draft,
    }
}

fn request_status_to_str(s: RequestStatus) -> &'static str {
    match s {
        RequestStatus::Pending => "pending",
        RequestStatus::Processing => "processing",
        RequestStatus::Completed => "completed",
        RequestStatus::Failed => "failed",
    }
}

fn request_status_from_str(s: &str) -> Result<RequestStatus, CoreError> {
    match s {
        "pending" => Ok(RequestStatus::Pending),
        "processing" => Ok(RequestStatus::Processing),
        "completed" => Ok(RequestStatus::Completed),
        "failed" => Ok(RequestStatus::Failed),
        _ => Err(CoreError::Invalid("request status")),
    }
}

fn row_into_note(row: SqliteRow) -> Result<Note, CoreError> {
    let tags_json: String = row.get("tags");
    Ok(Note {
        id: uuid_from_str(row.get("id"))?,
        owner_id: uuid_from_str(row.get("owner_id"))?,
        title: row.get("title"),
        content: row.get("content"),
        status: note_status_from_str(row.get::<&str, _>("status")),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        is_public: row.get::<i64, _>("is_public") != 0,
        created_at: dt_from_str(row.get("created_at"))?,
        updated_at: dt_from_str(row.get("updated_at"))?,
    })
}

fn row_into_set(row: SqliteRow) -> Result<FlashcardSet, CoreError> {
    Ok(FlashcardSet {
        id: uuid_from_str(row.get("id"))?,
        owner_id: uuid_from_str(row.get("owner_id"))?,
        note_id: opt_uuid(row.get("note_id"))?,
        title: row.get("title"),
        description: row.get("description"),
        total_cards: row.get::<i64, _>("total_cards") as u32,
        mastered_cards: row.get::<i64, _>("mastered_cards") as u32,
        is_public: row.get::<i64, _>("is_public") != 0,
        created_at: dt_from_str(row.get("created_at"))?,
        updated_at: dt_from_str(row.get("updated_at"))?,
    })
}

fn row_into_card(row: SqliteRow) -> Result<Flashcard, CoreError> {
    Ok(Flashcard {
        id: uuid_from_str(row.get("id"))?,
        set_id: uuid_from_str(row.get("set_id"))?,
        note_id: opt_uuid(row.get("note_id"))?,
        position: row.get::<i64, _>("position") as u32,
        question: row.get("question"),
        answer: row.get("answer"),
        status: CardStatus::from_label(row.get::<&str, _>("status"))
            .ok_or(CoreError::Invalid("card status"))?,
        difficulty_level: row.get::<i64, _>("difficulty_level") as u8,
        last_reviewed: row
            .get::<Option<String>, _>("last_reviewed")
            .map(dt_from_str)
            .transpose()?,
        review_count: row.get::<i64, _>("review_count") as u32,
        correct_count: row.get::<i64, _>("correct_count") as u32,
        created_at: dt_from_str(row.get("created_at"))?,
        updated_at: dt_from_str(row.get("updated_at"))?,
    })
}

fn row_into_log(row: SqliteRow) -> Result<GenerationLog, CoreError> {
    Ok(GenerationLog {
        id: uuid_from_str(row.get("id"))?,
        owner_id: uuid_from_str(row.get("owner_id"))?,
        note_id: opt_uuid(row.get("note_id"))?,
        request_type: row.get("request_type"),
        prompt: row.get("prompt"),
        response: row.get("response"),
        status: request_status_from_str(row.get::<&str, _>("status"))?,
        tokens_used: row.get::<Option<i64>, _>("tokens_used").map(|t| t as u64),
        cost_cents: row.get::<Option<i64>, _>("cost_cents").map(|c| c as u64),
        error_message: row.get("error_message"),
        created_at: dt_from_str(row.get("created_at"))?,
        completed_at: row
            .get::<Option<String>, _>("completed_at")
            .map(dt_from_str)
            .transpose()?,
    })
}
