use serde::{Deserialize, Serialize};

/// How newly generated cards combine with a set's current cards.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReforgeAction {
    /// Drop every existing card and keep only the new ones.
    Regenerate,
    /// Keep existing cards and append the new ones after them.
    #[default]
    AddMore,
}

impl ReforgeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReforgeAction::Regenerate => "regenerate",
            ReforgeAction::AddMore => "add_more",
        }
    }

    /// Card total the set should record once the merge is stored.
    pub fn resulting_total(&self, existing: u32, generated: u32) -> u32 {
        match self {
            ReforgeAction::Regenerate => generated,
            ReforgeAction::AddMore => existing + generated,
        }
    }
}

/// Existing question texts, passed to the prompt as topics to avoid.
pub fn dedupe_context<'a, I>(questions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    questions.into_iter().map(str::to_string).collect()
}

/// Combine existing and generated items according to `action`.
///
/// No filtering happens here: whether the generator respected the dedupe
/// context is not checked.
pub fn merge<T: Clone>(existing: &[T], generated: &[T], action: ReforgeAction) -> Vec<T> {
    match action {
        ReforgeAction::Regenerate => generated.to_vec(),
        ReforgeAction::AddMore => existing.iter().chain(generated).cloned().collect(),
    }
}
