use async_trait::async_trait;
use noteforge_core::{
    build_prompt, estimate_cost_cents, estimate_tokens, extract_json_array, generate_flashcards,
    normalize_multiple_choice, parse_flashcards, parse_response, Difficulty, GenerationError,
    GenerationParams, GenerationRequest, TextGenerator, MAX_FRESH_COUNT,
};
use std::sync::atomic::{AtomicUsize, Ordering};

struct Canned {
    reply: String,
    calls: AtomicUsize,
}

impl Canned {
    fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl TextGenerator for Canned {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

const NOTE: &str = "Photosynthesis turns light into chemical energy in chloroplasts.";

#[tokio::test]
async fn out_of_range_counts_never_reach_the_generator() {
    let gen = Canned::new("[]");
    for count in [0, MAX_FRESH_COUNT + 1, 500] {
        let req = GenerationRequest::new(NOTE, count, Difficulty::Medium);
        let err = generate_flashcards(&gen, &req, MAX_FRESH_COUNT, &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)), "count {count}: {err}");
    }
    assert_eq!(gen.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn short_source_text_is_rejected_before_any_call() {
    let gen = Canned::new("[]");
    let req = GenerationRequest::new("   too short ", 5, Difficulty::Easy);
    assert!(req.source_text.trim().len() < 10);
    let err = generate_flashcards(&gen, &req, MAX_FRESH_COUNT, &GenerationParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Validation(_)));
    assert_eq!(gen.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn one_call_per_generation() {
    let gen = Canned::new(r#"[{"question":"What is made?","answer":"Glucose"}]"#);
    let req = GenerationRequest::new(NOTE, 1, Difficulty::Medium);
    let out = generate_flashcards(&gen, &req, MAX_FRESH_COUNT, &GenerationParams::default())
        .await
        .unwrap();
    assert_eq!(out.flashcards.len(), 1);
    assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
    assert!(out.estimated_tokens > 0);
}

#[test]
fn prompt_sections_appear_in_order() {
    let req = GenerationRequest::new(NOTE, 4, Difficulty::Hard)
        .with_dedupe_context(vec!["Q1".into(), "Q2".into()])
        .with_custom_instructions("Keep it short");
    let p = build_prompt(&req);

    let framing = p.find("expert educator").unwrap();
    let calibration = p.find("concept complexity, NOT word count").unwrap();
    let existing = p.find("Existing flashcards:\nQ1\nQ2").unwrap();
    let source = p.find("Note Content:\nPhotosynthesis").unwrap();
    let rules = p.find("Instructions:").unwrap();
    assert!(framing < calibration && calibration < existing);
    assert!(existing < source && source < rules);

    assert!(p.contains("create 4 high-quality flashcards"));
    assert!(p.contains("hard difficulty level"));
    assert!(p.contains("6. Focus on topics and concepts that are NOT already covered"));
    assert!(p.contains("7. CRITICAL: Follow these specific instructions: Keep it short"));
    assert!(p.contains("8. Format your response as a JSON array"));
    assert!(!p.contains("SPECIAL INSTRUCTIONS FOR MULTIPLE CHOICE"));
}

#[test]
fn prompt_without_context_keeps_plain_numbering() {
    let p = build_prompt(&GenerationRequest::new(NOTE, 2, Difficulty::Easy));
    assert!(!p.contains("Existing flashcards:"));
    assert!(p.contains("5. Difficulty should reflect concept complexity"));
    assert!(p.contains("6. Format your response as a JSON array"));
    assert!(p.ends_with("Do not include any additional text outside the JSON array."));
}

#[test]
fn empty_dedupe_list_is_treated_as_absent() {
    let p = build_prompt(&GenerationRequest::new(NOTE, 2, Difficulty::Easy).with_dedupe_context(vec![]));
    assert!(!p.contains("Existing flashcards:"));
}

#[test]
fn multiple_choice_block_follows_instructions() {
    let req = GenerationRequest::new(NOTE, 3, Difficulty::Medium)
        .with_custom_instructions("Make them Multiple Choice please");
    let p = build_prompt(&req);
    let block = p.find("SPECIAL INSTRUCTIONS FOR MULTIPLE CHOICE").unwrap();
    assert!(block > p.find("Format your response").unwrap());
    assert!(p.contains("The answer should only be the correct option letter"));
}

#[test]
fn parse_keeps_order_and_defaults_difficulty() {
    let raw = "Here you go:\n[{\"question\":\"Q1\",\"answer\":\" A1 \"},\
               {\"question\":\"Q2\",\"answer\":\"A2\",\"difficulty\":\"hard\"},\
               {\"question\":\"Q3\",\"answer\":\"A3\",\"difficulty\":\"extreme\"}]\nEnjoy!";
    let cards = parse_flashcards(raw).unwrap();
    assert_eq!(cards.len(), 3);
    assert_eq!(cards[0].question, "Q1");
    assert_eq!(cards[0].answer, "A1");
    assert_eq!(cards[0].difficulty, Difficulty::Medium);
    assert_eq!(cards[1].difficulty, Difficulty::Hard);
    assert_eq!(cards[2].difficulty, Difficulty::Medium);
}

#[test]
fn parse_is_all_or_nothing() {
    let raw = r#"[{"question":"Q1","answer":"A1"},{"question":"Q2"}]"#;
    match parse_flashcards(raw) {
        Err(GenerationError::Parse(msg)) => assert!(msg.contains("index 1")),
        other => panic!("expected parse error, got {other:?}"),
    }

    let blank = r#"[{"question":"  ","answer":"A1"}]"#;
    assert!(matches!(parse_flashcards(blank), Err(GenerationError::Parse(_))));
}

#[test]
fn missing_bracket_or_prose_fails_to_parse() {
    let unterminated = r#"[{"question":"Q","answer":"A"}"#;
    assert!(extract_json_array(unterminated).is_none());
    assert!(matches!(parse_flashcards(unterminated), Err(GenerationError::Parse(_))));

    assert!(matches!(
        parse_flashcards("Sorry, I cannot help with that."),
        Err(GenerationError::Parse(_))
    ));
    assert!(matches!(parse_flashcards("] nope ["), Err(GenerationError::Parse(_))));
    assert!(matches!(parse_flashcards("[not json]"), Err(GenerationError::Parse(_))));
}

#[test]
fn inline_options_are_split_once() {
    let q = "Which is right? A) x B) y C) z D) w";
    let once = normalize_multiple_choice(q);
    assert!(!once.starts_with('\n'));
    let lines: Vec<&str> = once.lines().collect();
    assert_eq!(lines.len(), 5);
    for (line, marker) in lines[1..].iter().zip(["A)", "B)", "C)", "D)"]) {
        assert!(line.starts_with(marker), "{line:?}");
    }
    assert_eq!(normalize_multiple_choice(&once), once);
}

#[test]
fn options_at_start_of_question() {
    let out = normalize_multiple_choice("A) one B) two C) three D) four");
    assert_eq!(out, "A) one \nB) two \nC) three \nD) four");
    assert_eq!(normalize_multiple_choice(&out), out);
}

#[test]
fn preformatted_and_partial_questions_are_untouched() {
    let pre = "Pick one:\nA) x\nB) y\nC) z\nD) w";
    assert_eq!(normalize_multiple_choice(pre), pre);
    let partial = "Pick: A) x B) y C) z";
    assert_eq!(normalize_multiple_choice(partial), partial);
}

#[test]
fn parse_normalizes_multiple_choice_questions() {
    let raw = r#"[{"question":"Best? A) a B) b C) c D) d","answer":" B "}]"#;
    let cards = parse_flashcards(raw).unwrap();
    assert_eq!(cards[0].question, "Best? \nA) a \nB) b \nC) c \nD) d");
    assert_eq!(cards[0].answer, "B");
}

#[test]
fn token_and_cost_estimates() {
    assert_eq!(estimate_tokens(""), 0);
    assert_eq!(estimate_tokens("abcd"), 1);
    assert_eq!(estimate_tokens("abcde"), 2);
    assert_eq!(estimate_cost_cents(4000), 0);
    assert_eq!(estimate_cost_cents(4000), estimate_cost_cents(4000));
    assert_eq!(estimate_cost_cents(200_000), 15);
}

#[test]
fn tokens_cover_prompt_and_reply_together() {
    let result = parse_response("abc", r#"[{"question":"Q","answer":"A"}]"#).unwrap();
    // 3 + 31 chars, rounded up to whole tokens
    assert_eq!(result.estimated_tokens, 9);
    assert_eq!(result.estimated_cost_cents, 0);
}
