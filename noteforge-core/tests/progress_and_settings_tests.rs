use noteforge_core::{
    filter_notes_by_tag, filter_notes_by_text, mark_mastered, merge, percentage, progress_of,
    record_review, CardStatus, Difficulty, DifficultyChoice, Flashcard, GenerationError, NewFlashcard,
    Note, Navigator, ReforgeAction, Settings, Step, validate_count, validate_source_text,
    MAX_REFORGE_COUNT,
};
use uuid::Uuid;

fn card(set: Uuid, position: u32, q: &str) -> Flashcard {
    let nc = NewFlashcard { question: q.into(), answer: "a".into(), difficulty: Difficulty::Hard };
    Flashcard::new(set, None, position, &nc)
}

#[test]
fn navigation_walks_in_order() {
    let set = Uuid::new_v4();
    let cards = vec![card(set, 0, "one"), card(set, 1, "two"), card(set, 2, "three")];
    let nav = Navigator::from_cards(&cards);

    assert_eq!(nav.first(), Some(cards[0].id));
    assert_eq!(nav.position(cards[1].id), Some(1));
    assert_eq!(nav.next(cards[0].id), Some(Step::Card(cards[1].id)));
    assert_eq!(nav.next(cards[2].id), Some(Step::End));
    assert!(nav.is_last(cards[2].id));
    assert_eq!(nav.previous(cards[0].id), None);
    assert_eq!(nav.previous(cards[2].id), Some(cards[1].id));

    let stranger = Uuid::new_v4();
    assert_eq!(nav.next(stranger), None);
    assert_eq!(nav.previous(stranger), None);
}

#[test]
fn progress_counts_mastered_cards() {
    let set = Uuid::new_v4();
    let mut cards = vec![card(set, 0, "a"), card(set, 1, "b"), card(set, 2, "c"), card(set, 3, "d")];
    assert_eq!(progress_of(&cards).percentage, 0);

    cards[0] = mark_mastered(cards[0].clone());
    cards[1] = record_review(cards[1].clone(), CardStatus::Learning, Some(false));
    let p = progress_of(&cards);
    assert_eq!((p.total, p.mastered, p.percentage), (4, 1, 25));

    assert_eq!(cards[1].review_count, 1);
    assert_eq!(cards[1].correct_count, 0);
    assert!(cards[1].last_reviewed.is_some());
    assert_eq!(percentage(0, 0), 0);
    assert_eq!(percentage(2, 3), 67);
}

#[test]
fn status_change_without_grade_keeps_counters() {
    let c = record_review(card(Uuid::new_v4(), 0, "q"), CardStatus::Review, None);
    assert_eq!(c.status, CardStatus::Review);
    assert_eq!(c.review_count, 0);
}

#[test]
fn merge_by_action() {
    let existing = vec!["Q1", "Q2"];
    let generated = vec!["N1", "N2", "N3"];
    assert_eq!(merge(&existing, &generated, ReforgeAction::AddMore), ["Q1", "Q2", "N1", "N2", "N3"]);
    assert_eq!(merge(&existing, &generated, ReforgeAction::Regenerate), ["N1", "N2", "N3"]);
    assert_eq!(ReforgeAction::AddMore.resulting_total(2, 3), 5);
    assert_eq!(ReforgeAction::Regenerate.resulting_total(2, 3), 3);
}

#[test]
fn validation_bounds() {
    assert!(validate_count(1, MAX_REFORGE_COUNT).is_ok());
    assert!(validate_count(MAX_REFORGE_COUNT, MAX_REFORGE_COUNT).is_ok());
    assert!(matches!(validate_count(0, 30), Err(GenerationError::Validation(_))));
    assert!(validate_source_text("").is_err());
    assert!(validate_source_text("  123456789  ").is_err());
    assert!(validate_source_text("1234567890").is_ok());
}

#[test]
fn partial_settings_merge_over_defaults() {
    let s = Settings::from_json(r#"{ "generation": { "min_count": 12 }, "reforge": { "action": "regenerate" } }"#)
        .unwrap();
    assert_eq!(s.generation.min_count, 12);
    assert_eq!(s.generation.difficulty, DifficultyChoice::Medium);
    assert!(!s.generation.preview_mode);
    assert_eq!(s.reforge.action, ReforgeAction::Regenerate);
    assert_eq!(s.reforge.min_count, 3);
    assert_eq!(s.timeout_secs, 30);
    assert_eq!(s.params.top_k, 40);

    let back = Settings::from_json(&s.to_json().unwrap()).unwrap();
    assert_eq!(back, s);
    assert_eq!(DifficultyChoice::All.to_difficulty(), Difficulty::Medium);
}

#[test]
fn note_filters() {
    let owner = Uuid::new_v4();
    let mut a = Note::new(owner, "Chemistry", "Covalent bonds share electrons");
    a.tags = vec!["science".into()];
    let b = Note::new(owner, "History", "The Hanseatic League");
    let notes = vec![a, b];

    assert_eq!(filter_notes_by_text(&notes, "bonds").len(), 1);
    assert_eq!(filter_notes_by_text(&notes, "").len(), 2);
    assert_eq!(filter_notes_by_tag(&notes, "Science")[0].title, "Chemistry");
}
