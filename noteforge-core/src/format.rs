//! Multiple-choice question layout.
//!
//! The generator emits options either inline (`"Q? A) x B) y C) z D) w"`) or
//! already one per line. Cards are stored in the line-broken form, and the
//! rewrite runs once, when a generated card is parsed. Stored text is shown
//! verbatim afterwards.

const OPTION_MARKERS: [&str; 4] = ["A)", "B)", "C)", "D)"];

/// True when all four option markers are present and the options have not
/// been broken onto their own lines yet.
pub fn needs_option_breaks(question: &str) -> bool {
    OPTION_MARKERS.iter().all(|m| question.contains(m))
        && !question.contains("\nA)")
        && !question.contains("\nB)")
}

/// Put each of `A)`..`D)` at the start of its own line.
///
/// Every occurrence of a marker gets a newline in front of it, then the
/// result is trimmed so no blank first line is left behind. Applying it to
/// its own output returns the input unchanged.
pub fn normalize_multiple_choice(question: &str) -> String {
    if !needs_option_breaks(question) {
        return question.to_string();
    }

    let mut out = String::with_capacity(question.len() + OPTION_MARKERS.len());
    for (i, ch) in question.char_indices() {
        let rest = &question[i..];
        if OPTION_MARKERS.iter().any(|m| rest.starts_with(m)) {
            out.push('\n');
        }
        out.push(ch);
    }

    let trimmed = out.trim();
    trimmed.strip_prefix('\n').unwrap_or(trimmed).to_string()
}
