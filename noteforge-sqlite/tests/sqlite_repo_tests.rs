use noteforge_core::{
    repo::Repository, CardStatus, CoreError, Difficulty, FlashcardSet, GenerationLog, NewFlashcard,
    Note, RequestStatus, REQUEST_TYPE_REFORGE,
};
use noteforge_sqlite::SqliteRepo;
use uuid::Uuid;

fn card(q: &str, difficulty: Difficulty) -> NewFlashcard {
    NewFlashcard {
        question: q.to_string(),
        answer: "a".to_string(),
        difficulty,
    }
}

#[tokio::test]
async fn notes_round_trip_and_ownership() {
    let repo = SqliteRepo::open_memory().await.unwrap();
    let owner = Uuid::new_v4();
    let mut note = Note::new(owner, "Biology", "Cells divide by mitosis.");
    note.tags = vec!["bio".into(), "exam".into()];
    repo.create_note(&note).await.unwrap();

    let loaded = repo.get_note(note.id).await.unwrap();
    assert_eq!(loaded.tags, note.tags);
    assert_eq!(loaded.title, "Biology");

    assert!(matches!(repo.create_note(&note).await, Err(CoreError::Conflict(_))));

    let mut stranger = loaded.clone();
    stranger.owner_id = Uuid::new_v4();
    assert!(matches!(repo.update_note(&stranger).await, Err(CoreError::NotFound(_))));
    assert!(repo.list_notes(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn flashcards_keep_order_and_fields() {
    let repo = SqliteRepo::open_memory().await.unwrap();
    let owner = Uuid::new_v4();
    let note = repo.create_note(&Note::new(owner, "t", "content text")).await.unwrap();
    let set = repo
        .create_set(&FlashcardSet::new(owner, Some(note.id), "s", Some("d".into())))
        .await
        .unwrap();

    repo.insert_flashcards(set.id, Some(note.id), &[card("q1", Difficulty::Easy), card("q2", Difficulty::Hard)])
        .await
        .unwrap();
    let more = repo
        .insert_flashcards(set.id, Some(note.id), &[card("q3", Difficulty::Medium)])
        .await
        .unwrap();
    assert_eq!(more[0].position, 2);

    let cards = repo.list_flashcards(set.id).await.unwrap();
    let questions: Vec<&str> = cards.iter().map(|c| c.question.as_str()).collect();
    assert_eq!(questions, ["q1", "q2", "q3"]);
    assert_eq!(cards[0].difficulty_level, 1);
    assert_eq!(cards[1].difficulty(), Difficulty::Hard);

    let mut first = cards[0].clone();
    first.status = CardStatus::Mastered;
    first.review_count = 2;
    repo.update_flashcard(&first).await.unwrap();
    let reloaded = repo.get_flashcard(first.id).await.unwrap();
    assert!(reloaded.is_mastered());
    assert_eq!(reloaded.review_count, 2);

    assert_eq!(repo.delete_flashcards_in_set(set.id).await.unwrap(), 3);
    let again = repo
        .insert_flashcards(set.id, None, &[card("fresh", Difficulty::Medium)])
        .await
        .unwrap();
    assert_eq!(again[0].position, 0);
}

#[tokio::test]
async fn inserting_into_missing_set_fails() {
    let repo = SqliteRepo::open_memory().await.unwrap();
    let res = repo
        .insert_flashcards(Uuid::new_v4(), None, &[card("q", Difficulty::Easy)])
        .await;
    assert!(matches!(res, Err(CoreError::NotFound("set"))));
}

#[tokio::test]
async fn set_counts_sharing_and_deletion() {
    let repo = SqliteRepo::open_memory().await.unwrap();
    let owner = Uuid::new_v4();
    let set = repo.create_set(&FlashcardSet::new(owner, None, "s", None)).await.unwrap();
    let cards = repo
        .insert_flashcards(set.id, None, &[card("q", Difficulty::Easy)])
        .await
        .unwrap();

    repo.update_set_counts(set.id, 1, 1).await.unwrap();
    repo.set_public(set.id, true).await.unwrap();
    let loaded = repo.get_set(set.id).await.unwrap();
    assert_eq!((loaded.total_cards, loaded.mastered_cards), (1, 1));
    assert!(loaded.is_public);
    assert_eq!(repo.list_sets(owner).await.unwrap().len(), 1);

    repo.delete_set(set.id).await.unwrap();
    assert!(repo.get_flashcard(cards[0].id).await.is_err());
    assert!(matches!(repo.delete_set(set.id).await, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn deleting_note_keeps_generated_sets() {
    let repo = SqliteRepo::open_memory().await.unwrap();
    let owner = Uuid::new_v4();
    let note = repo.create_note(&Note::new(owner, "t", "content text")).await.unwrap();
    let set = repo
        .create_set(&FlashcardSet::new(owner, Some(note.id), "s", None))
        .await
        .unwrap();
    repo.insert_flashcards(set.id, Some(note.id), &[card("q", Difficulty::Easy)])
        .await
        .unwrap();

    repo.delete_note(owner, note.id).await.unwrap();
    assert_eq!(repo.get_set(set.id).await.unwrap().note_id, None);
    assert_eq!(repo.list_flashcards(set.id).await.unwrap()[0].note_id, None);
}

#[tokio::test]
async fn generation_logs_persist() {
    let repo = SqliteRepo::open_memory().await.unwrap();
    let owner = Uuid::new_v4();
    let ok = GenerationLog::new(owner, None, REQUEST_TYPE_REFORGE, "prompt").completed("[]".into(), 12, 0);
    let bad = GenerationLog::new(owner, None, REQUEST_TYPE_REFORGE, "prompt").failed("upstream");
    repo.insert_generation_log(&ok).await.unwrap();
    repo.insert_generation_log(&bad).await.unwrap();

    let logs = repo.list_generation_logs(owner).await.unwrap();
    assert_eq!(logs.len(), 2);
    let completed = logs.iter().find(|l| l.id == ok.id).unwrap();
    assert_eq!(completed.status, RequestStatus::Completed);
    assert_eq!(completed.tokens_used, Some(12));
    let failed = logs.iter().find(|l| l.id == bad.id).unwrap();
    assert_eq!(failed.error_message.as_deref(), Some("upstream"));
}

#[tokio::test]
async fn file_store_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.sqlite");
    let owner = Uuid::new_v4();
    let note_id = {
        let repo = SqliteRepo::open_file(&path).await.unwrap();
        repo.create_note(&Note::new(owner, "kept", "content text")).await.unwrap().id
    };
    let repo = SqliteRepo::open_file(&path).await.unwrap();
    assert_eq!(repo.get_note(note_id).await.unwrap().title, "kept");
}

#[tokio::test]
async fn replacing_cards_restarts_positions() {
    let repo = SqliteRepo::open_memory().await.unwrap();
    let owner = Uuid::new_v4();
    let set = repo.create_set(&FlashcardSet::new(owner, None, "s", None)).await.unwrap();
    repo.insert_flashcards(set.id, None, &[card("old1", Difficulty::Easy), card("old2", Difficulty::Easy)])
        .await
        .unwrap();

    let fresh = repo
        .replace_flashcards(set.id, None, &[card("new1", Difficulty::Hard)])
        .await
        .unwrap();
    assert_eq!(fresh[0].position, 0);
    let questions: Vec<String> = repo
        .list_flashcards(set.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.question)
        .collect();
    assert_eq!(questions, ["new1"]);

    let missing = repo.replace_flashcards(Uuid::new_v4(), None, &[]).await;
    assert!(matches!(missing, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn failed_replace_keeps_previous_cards() {
    use sqlx::{Connection, SqliteConnection};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cards.sqlite");
    let repo = SqliteRepo::open_file(&path).await.unwrap();
    let owner = Uuid::new_v4();
    let set = repo.create_set(&FlashcardSet::new(owner, None, "s", None)).await.unwrap();
    repo.insert_flashcards(set.id, None, &[card("q1", Difficulty::Easy), card("q2", Difficulty::Easy)])
        .await
        .unwrap();

    // Any insert into flashcards now aborts.
    let mut conn = SqliteConnection::connect(&format!("sqlite://{}", path.display()))
        .await
        .unwrap();
    sqlx::query("CREATE TRIGGER block_cards BEFORE INSERT ON flashcards BEGIN SELECT RAISE(ABORT, 'blocked'); END")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();

    let res = repo
        .replace_flashcards(set.id, None, &[card("new", Difficulty::Medium)])
        .await;
    assert!(matches!(res, Err(CoreError::Storage(_))));

    let kept: Vec<String> = repo
        .list_flashcards(set.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.question)
        .collect();
    assert_eq!(kept, ["q1", "q2"]);
}
