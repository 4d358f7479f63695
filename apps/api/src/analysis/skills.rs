//! Skill names, their normalized keys, and word-boundary matching against free text.

use serde::Serialize;

/// Short forms that name the same skill as their expansion.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("py", "python"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("tf", "tensorflow"),
    ("k8s", "kubernetes"),
    ("golang", "go"),
    ("postgres", "postgresql"),
    ("sklearn", "scikitlearn"),
    ("cicd", "ci/cd"),
];

/// Comparison key for a skill name: lowercase, only `[a-z0-9+#/]` kept, aliases expanded.
/// `"ML Ops"`, `"ml-ops"` and `"MLOps"` share the key `"mlops"`.
pub fn normalize_key(name: &str) -> String {
    let compact: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '/'))
        .collect();
    let compact = compact.trim_matches('/').to_string();

    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == compact)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(compact)
}

/// Insertion-ordered set of skills, deduplicated by `normalize_key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SkillSet {
    names: Vec<String>,
    #[serde(skip)]
    keys: Vec<String>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` unless an equivalent skill is present. Blank names are ignored.
    /// Returns whether the set changed.
    pub fn insert(&mut self, name: &str) -> bool {
        let display = name.trim();
        let key = normalize_key(display);
        if key.is_empty() || self.keys.contains(&key) {
            return false;
        }
        self.names.push(display.to_string());
        self.keys.push(key);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contains_key(&normalize_key(name))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Display names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// (display name, key) pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.keys.iter().map(String::as_str))
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.clone()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SkillSet::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

fn is_term_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '#')
}

/// Byte offsets where `term` occurs in `haystack` as a whole word, ASCII case-insensitive.
/// A word boundary is any character other than `[A-Za-z0-9+#]`, so `C++` and `Node.js`
/// match but `java` does not match inside `javascript`.
pub fn term_positions(haystack: &str, term: &str) -> Vec<usize> {
    let term = term.trim();
    if term.is_empty() {
        return Vec::new();
    }
    let haystack_lower = haystack.to_ascii_lowercase();
    let term_lower = term.to_ascii_lowercase();

    haystack_lower
        .match_indices(&term_lower)
        .filter(|(start, matched)| {
            let end = start + matched.len();
            let before_ok = haystack_lower[..*start]
                .chars()
                .next_back()
                .map_or(true, |c| !is_term_char(c));
            let after_ok = haystack_lower[end..]
                .chars()
                .next()
                .map_or(true, |c| !is_term_char(c));
            before_ok && after_ok
        })
        .map(|(start, _)| start)
        .collect()
}

/// Number of whole-word occurrences of `term` in `haystack`.
pub fn count_occurrences(haystack: &str, term: &str) -> usize {
    term_positions(haystack, term).len()
}

/// True when `skill` can be found in `source`: as a case-insensitive substring, or with
/// both sides compacted to `[a-z0-9+#/]` (so `"ML Ops"` traces to `"MLOps"`).
pub fn is_traceable(skill: &str, source: &str) -> bool {
    let skill_lower = skill.trim().to_lowercase();
    if skill_lower.is_empty() {
        return false;
    }
    let source_lower = source.to_lowercase();
    if source_lower.contains(&skill_lower) {
        return true;
    }
    let compact_skill = compact(&skill_lower);
    !compact_skill.is_empty() && compact(&source_lower).contains(&compact_skill)
}

fn compact(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '/'))
        .collect()
}

/// Up to `limit` snippets of `text` around whole-word occurrences of `term`,
/// `radius` characters on each side.
pub fn contexts(text: &str, term: &str, radius: usize, limit: usize) -> Vec<String> {
    term_positions(text, term)
        .into_iter()
        .take(limit)
        .map(|start| {
            let end = start + term.trim().len();
            let from = text[..start]
                .char_indices()
                .rev()
                .take(radius)
                .last()
                .map_or(start, |(i, _)| i);
            let to = text[end..]
                .char_indices()
                .nth(radius)
                .map_or(text.len(), |(i, _)| end + i);
            text[from..to].trim().to_string()
        })
        .collect()
}
