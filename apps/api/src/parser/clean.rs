//! Text normalization for extracted CV content.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static ICON_GLYPHS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{E000}-\x{F8FF}\x{2500}-\x{27BF}]").expect("valid regex"));
static INVISIBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{200B}-\x{200F}\x{202A}-\x{202E}\x{2060}-\x{206F}\x{FEFF}]").expect("valid regex")
});
static CONTROL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("valid regex"));
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9.,\-+#:/@\s]").expect("valid regex"));
static REPEATED_DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").expect("valid regex"));
static REPEATED_COMMAS: Lazy<Regex> = Lazy::new(|| Regex::new(r",{2,}").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalizes raw extracted text:
/// 1. NFKC compatibility folding: ligatures and fullwidth letters become plain ASCII
/// 2. icon fonts (private use area), box drawing and dingbats become spaces
/// 3. zero-width and bidi controls are removed, other control chars become spaces
/// 4. anything outside letters, digits and `. , - + # : / @` becomes a space
/// 5. runs of `.` or `,` collapse to one, whitespace collapses to a single space
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text: String = text.nfkc().collect();
    let text = ICON_GLYPHS.replace_all(&text, " ");
    let text = INVISIBLE.replace_all(&text, "");
    let text = CONTROL.replace_all(&text, " ");
    let text = DISALLOWED.replace_all(&text, " ");
    let text = REPEATED_DOTS.replace_all(&text, ".");
    let text = REPEATED_COMMAS.replace_all(&text, ",");
    let text = WHITESPACE.replace_all(&text, " ");

    text.trim().to_string()
}
