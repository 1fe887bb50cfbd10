use crate::GenerationRequest;

const DIFFICULTY_GUIDANCE: &str = "IMPORTANT: Difficulty should be based on concept complexity, NOT word count. All answers should be concise and to the point:
- Easy: Basic facts, definitions, simple concepts
- Medium: Application of concepts, moderate complexity
- Hard: Advanced analysis, synthesis, complex relationships

Keep all answers concise regardless of difficulty level to minimize token usage.";

const JSON_FORMAT: &str = r#"Format your response as a JSON array with this exact structure:
[
  {
    "question": "What is...?",
    "answer": "The answer is...",
    "difficulty": "easy|medium|hard"
  }
]"#;

const MULTIPLE_CHOICE_BLOCK: &str = r#"SPECIAL INSTRUCTIONS FOR MULTIPLE CHOICE:
- FORMAT THE QUESTION WITH LINE BREAKS BETWEEN OPTIONS
- Question structure: "Which of the following is correct about [topic]?" followed by line break
- Then each option on its own line:
  A) [first option] (line break)
  B) [second option] (line break)
  C) [third option] (line break)
  D) [fourth option]
- The answer should only be the correct option letter (A, B, C, or D)
- Example format:
  "question": "Which of the following is correct about photosynthesis?
A) Plants convert sunlight into energy
B) Animals perform photosynthesis
C) Photosynthesis only occurs at night
D) No organisms use photosynthesis",
  "answer": "A"
- MANDATORY: Use actual line breaks between A), B), C), and D) options in the question field
- DO NOT put all options on the same line"#;

const CLOSING: &str = "Please ensure the JSON is valid and properly formatted.
IMPORTANT: Do not wrap the JSON in ```json or add any prefix/suffix.
Do not include any additional text outside the JSON array.";

/// True when the caller's instructions ask for multiple-choice cards.
pub fn wants_multiple_choice(instructions: &str) -> bool {
    instructions.to_lowercase().contains("multiple choice")
}

/// Build the single instruction string sent to the generator.
///
/// Sections appear in a fixed order: framing, difficulty calibration, the
/// existing-question context (if any), the source text, numbered formatting
/// rules, and the multiple-choice block when the custom instructions ask for
/// it.
pub fn build_prompt(req: &GenerationRequest) -> String {
    let count = req.requested_count;
    let existing = req.existing_questions();
    let custom = req.instructions();

    let mut prompt = format!(
        "You are an expert educator creating flashcards from study notes.\n\n\
         Please create {count} high-quality flashcards from the following note content. \
         The flashcards should be at a {} difficulty level.\n\n{DIFFICULTY_GUIDANCE}",
        req.difficulty
    );

    if let Some(existing) = &existing {
        prompt.push_str(&format!(
            "\n\nExisting flashcards:\n{existing}\n\n\
             Avoid repeating these topics. Please generate {count} new flashcards \
             that are different from the existing ones."
        ));
    }

    prompt.push_str("\n\nNote Content:\n");
    prompt.push_str(&req.source_text);

    let mut rules = vec![
        format!("Create exactly {count} flashcards"),
        "Each flashcard should have a clear question and concise answer".to_string(),
        "Questions should test understanding, not just memorization".to_string(),
        "Answers should be detailed but concise (aim for 1-3 sentences max)".to_string(),
        "Difficulty should reflect concept complexity, not answer length".to_string(),
    ];
    if existing.is_some() {
        rules.push(
            "Focus on topics and concepts that are NOT already covered in the existing \
             flashcards. Analyze the note content thoroughly to identify gaps."
                .to_string(),
        );
    }
    if let Some(custom) = custom {
        rules.push(format!("CRITICAL: Follow these specific instructions: {custom}"));
    }
    rules.push(JSON_FORMAT.to_string());

    prompt.push_str("\n\nInstructions:");
    for (i, rule) in rules.iter().enumerate() {
        prompt.push_str(&format!("\n{}. {rule}", i + 1));
    }

    if custom.is_some_and(wants_multiple_choice) {
        prompt.push_str("\n\n");
        prompt.push_str(MULTIPLE_CHOICE_BLOCK);
    }

    prompt.push_str("\n\n");
    prompt.push_str(CLOSING);
    prompt
}
