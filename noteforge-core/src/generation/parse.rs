use serde_json::Value;
use tracing::warn;

use crate::{
    estimate_cost_cents, tokens_for_chars, normalize_multiple_choice, Difficulty,
    GeneratedFlashcard, GenerationError, GenerationResult,
};

/// The slice from the first `[` to the last `]`, inclusive.
///
/// Bracket scanning is all the structure the generator reliably gives us;
/// callers go through this function so a stricter decoder can replace it.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (end > start).then(|| &raw[start..=end])
}

/// Parse generated text into flashcards. Any bad entry rejects the whole batch.
pub fn parse_flashcards(raw: &str) -> Result<Vec<GeneratedFlashcard>, GenerationError> {
    let json = extract_json_array(raw).ok_or_else(|| {
        warn!(raw_len = raw.len(), "no JSON array in generated text");
        GenerationError::parse("no valid JSON array found in response")
    })?;

    let value: Value = serde_json::from_str(json).map_err(|e| {
        warn!(error = %e, "generated JSON did not decode");
        GenerationError::parse(format!("invalid JSON: {e}"))
    })?;
    let Value::Array(items) = value else {
        return Err(GenerationError::parse("response is not an array"));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_card(index, item))
        .collect()
}

fn parse_card(index: usize, item: &Value) -> Result<GeneratedFlashcard, GenerationError> {
    let (Some(question), Some(answer)) = (text_field(item, "question"), text_field(item, "answer"))
    else {
        return Err(GenerationError::parse(format!("invalid flashcard at index {index}")));
    };

    let difficulty = item
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(Difficulty::from_label)
        .unwrap_or_default();

    Ok(GeneratedFlashcard {
        question: normalize_multiple_choice(question).trim().to_string(),
        answer: answer.to_string(),
        difficulty,
    })
}

fn text_field<'a>(item: &'a Value, name: &str) -> Option<&'a str> {
    item.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parse `raw` and attach the token and cost estimates for `prompt + raw`.
pub fn parse_response(prompt: &str, raw: &str) -> Result<GenerationResult, GenerationError> {
    let flashcards = parse_flashcards(raw)?;
    let estimated_tokens = tokens_for_chars(prompt.chars().count() + raw.chars().count());
    Ok(GenerationResult {
        flashcards,
        estimated_tokens,
        estimated_cost_cents: estimate_cost_cents(estimated_tokens),
    })
}
