// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for free-text answers.
pub const PLAIN_TEXT_SYSTEM: &str = "You are a concise, practical career advisor. \
    Respond with plain text only. No markdown, no headings, no lists.";

/// Common instruction appended to every skill-extraction prompt.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only list skills that appear verbatim in the provided text. \
    Do NOT infer, generalize, or invent skills. \
    Answers containing skills absent from the text are discarded.";

/// Truncates `text` to at most `max_chars` characters without splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
