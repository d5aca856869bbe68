//! Regex-based link discovery over raw page text
//!
//! Tag parsing only sees `href` attributes. Addresses that appear as plain
//! text, in comments or inside scripts are found here instead, and then go
//! through the same classify and resolve steps as tag links.

use regex::Regex;
use std::path::Path;

/// Matches absolute http(s) addresses and bare `www.` hosts
const BUILTIN_PATTERN: &str = r#"(?i)\b(?:https?://|www\.)[^\s"'<>()\[\]{}]+"#;

/// Characters that end a sentence rather than an address
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', ')', ']', '}', '>'];

/// Ordered set of link patterns: the built-in one first, then any
/// supplementary ones
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    patterns: Vec<Regex>,
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PatternExtractor {
    /// Creates an extractor with only the built-in address pattern
    pub fn builtin() -> Self {
        Self {
            patterns: builtin_regex(),
        }
    }

    /// Creates an extractor with supplementary patterns
    ///
    /// Patterns that fail to compile are skipped with a warning; the rest
    /// keep their order.
    ///
    /// # Examples
    ///
    /// ```
    /// use torcrawl::crawler::PatternExtractor;
    ///
    /// let extractor = PatternExtractor::with_patterns(["/hidden/[a-z]+", "(unclosed"]);
    /// assert_eq!(extractor.len(), 2);
    /// ```
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = builtin_regex();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match Regex::new(pattern) {
                Ok(regex) => compiled.push(regex),
                Err(e) => tracing::warn!("Skipping invalid link pattern '{}': {}", pattern, e),
            }
        }
        Self { patterns: compiled }
    }

    /// Loads supplementary patterns from a file, one per line
    ///
    /// Blank lines and lines starting with `#` are ignored. A missing file
    /// yields the built-in pattern only.
    pub fn from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let lines = content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'));
                Self::with_patterns(lines)
            }
            Err(e) => {
                tracing::debug!("No link patterns loaded from {}: {}", path.display(), e);
                Self::builtin()
            }
        }
    }

    /// Number of compiled patterns, built-in included
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Finds link-like substrings in `text`
    ///
    /// Matches are returned in pattern order, then text order, without
    /// duplicates. Each match is trimmed of trailing punctuation and a bare
    /// `www.` host gets an `https://` scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use torcrawl::crawler::PatternExtractor;
    ///
    /// let extractor = PatternExtractor::builtin();
    /// let links = extractor.find_links("See https://example.com/hidden-page. Or www.example.org!");
    /// assert_eq!(links, ["https://example.com/hidden-page", "https://www.example.org"]);
    /// ```
    pub fn find_links(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();

        for pattern in &self.patterns {
            for m in pattern.find_iter(text) {
                let Some(link) = clean_match(m.as_str()) else {
                    continue;
                };
                if !found.contains(&link) {
                    found.push(link);
                }
            }
        }

        found
    }
}

fn builtin_regex() -> Vec<Regex> {
    Regex::new(BUILTIN_PATTERN).into_iter().collect()
}

fn clean_match(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches(TRAILING_PUNCTUATION);
    if trimmed.is_empty() {
        return None;
    }

    if trimmed
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("www."))
    {
        return Some(format!("https://{}", trimmed));
    }
    Some(trimmed.to_string())
}
