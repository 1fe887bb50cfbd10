use crate::GenerationError;

pub const MIN_SOURCE_CHARS: usize = 10;
pub const MAX_FRESH_COUNT: u32 = 30;
pub const MAX_REFORGE_COUNT: u32 = 50;

pub fn validate_source_text(text: &str) -> Result<(), GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::validation("Note content is required"));
    }
    if trimmed.chars().count() < MIN_SOURCE_CHARS {
        return Err(GenerationError::validation(format!(
            "Note content must be at least {MIN_SOURCE_CHARS} characters long"
        )));
    }
    Ok(())
}

pub fn validate_count(count: u32, max: u32) -> Result<(), GenerationError> {
    if count < 1 || count > max {
        return Err(GenerationError::validation(format!(
            "Flashcard count must be between 1 and {max}"
        )));
    }
    Ok(())
}

/// Returns the text to generate from: the selected section when asked for,
/// otherwise the whole note.
pub fn select_source<'a>(
    note_content: &'a str,
    use_selected_section: bool,
    selected_section: Option<&'a str>,
) -> Result<&'a str, GenerationError> {
    if !use_selected_section {
        return Ok(note_content);
    }
    match selected_section.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(GenerationError::validation(
            "Selected section is required when \"use selected section\" is enabled",
        )),
    }
}
