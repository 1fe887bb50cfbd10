//! Flashcard generation adapter: prompt construction, the call into a
//! text-generation backend, and parsing of whatever text comes back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{validate_count, validate_source_text, Difficulty, GenerationError};

pub mod cost;
pub mod parse;
pub mod prompt;

pub use cost::*;
pub use parse::*;
pub use prompt::*;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedFlashcard {
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub source_text: String,
    pub requested_count: u32,
    pub difficulty: Difficulty,
    /// Questions already in the set; the model is asked to steer clear of them.
    pub dedupe_context: Option<Vec<String>>,
    pub custom_instructions: Option<String>,
}

impl GenerationRequest {
    pub fn new(source_text: impl Into<String>, requested_count: u32, difficulty: Difficulty) -> Self {
        Self {
            source_text: source_text.into(),
            requested_count,
            difficulty,
            dedupe_context: None,
            custom_instructions: None,
        }
    }

    pub fn with_dedupe_context(mut self, questions: Vec<String>) -> Self {
        self.dedupe_context = Some(questions);
        self
    }

    pub fn with_custom_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = Some(instructions.into());
        self
    }

    /// Newline-joined existing questions, or `None` when there are none.
    pub fn existing_questions(&self) -> Option<String> {
        self.dedupe_context
            .as_ref()
            .filter(|qs| !qs.is_empty())
            .map(|qs| qs.join("\n"))
    }

    /// Custom instructions with surrounding whitespace removed; blank counts as absent.
    pub fn instructions(&self) -> Option<&str> {
        self.custom_instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn validate(&self, max_count: u32) -> Result<(), GenerationError> {
        validate_source_text(&self.source_text)?;
        validate_count(self.requested_count, max_count)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResult {
    pub flashcards: Vec<GeneratedFlashcard>,
    pub estimated_tokens: u64,
    pub estimated_cost_cents: u64,
}

/// Sampling knobs forwarded to the backend.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 2048,
        }
    }
}

/// Something that turns a prompt into generated text. One call is one
/// request; implementations do not retry.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams)
        -> Result<String, GenerationError>;
}

/// Validate, build the prompt, invoke the backend once, and parse the reply.
pub async fn generate_flashcards<G: TextGenerator + ?Sized>(
    generator: &G,
    request: &GenerationRequest,
    max_count: u32,
    params: &GenerationParams,
) -> Result<GenerationResult, GenerationError> {
    request.validate(max_count)?;

    let prompt = build_prompt(request);
    debug!(chars = prompt.len(), "built generation prompt");

    let raw = generator.generate(&prompt, params).await?;
    let result = parse_response(&prompt, &raw)?;

    info!(
        requested = request.requested_count,
        generated = result.flashcards.len(),
        tokens = result.estimated_tokens,
        cost_cents = result.estimated_cost_cents,
        "flashcards generated"
    );
    Ok(result)
}
