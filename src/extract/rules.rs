//! Content classification rules
//!
//! A rule set decides whether fetched content is worth keeping. The
//! extractor only needs [`RuleMatcher`]; [`KeywordRules`] is the regex-based
//! implementation loaded from a TOML rule file:
//!
//! ```toml
//! [[rule]]
//! name = "market"
//! patterns = ["bitcoin", "escrow\\s+service"]
//! ```

use crate::ConfigError;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::path::Path;

/// One rule hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Name of the rule that fired
    pub rule: String,

    /// The text that triggered it
    pub matched: String,
}

/// Classifies content against a rule set
///
/// An empty result means nothing matched; it is not an error.
pub trait RuleMatcher {
    fn matches(&self, content: &str) -> Vec<RuleMatch>;
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(rename = "rule", default)]
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    name: String,
    patterns: Vec<String>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    name: String,
    patterns: Vec<Regex>,
}

/// Named groups of case-insensitive regular expressions
///
/// A rule fires when any of its patterns matches; each rule reports at most
/// one match, for its first matching pattern.
#[derive(Debug, Clone)]
pub struct KeywordRules {
    rules: Vec<CompiledRule>,
}

impl KeywordRules {
    /// Loads rules from a TOML file
    ///
    /// # Returns
    ///
    /// * `Ok(KeywordRules)` - All rules compiled
    /// * `Err(ConfigError)` - The file is unreadable, malformed, or holds an
    ///   invalid pattern
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses and compiles rules from TOML text
    ///
    /// # Examples
    ///
    /// ```
    /// use torcrawl::extract::{KeywordRules, RuleMatcher};
    ///
    /// let rules = KeywordRules::from_toml(r#"
    ///     [[rule]]
    ///     name = "greeting"
    ///     patterns = ["hello"]
    /// "#).unwrap();
    ///
    /// assert_eq!(rules.matches("Hello there").len(), 1);
    /// assert!(rules.matches("goodbye").is_empty());
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: RuleFile = toml::from_str(content)?;

        let mut rules = Vec::with_capacity(file.rules.len());
        for spec in file.rules {
            if spec.patterns.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Rule '{}' has no patterns",
                    spec.name
                )));
            }

            let patterns = spec
                .patterns
                .iter()
                .map(|pattern| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            ConfigError::InvalidPattern(format!(
                                "rule '{}', pattern '{}': {}",
                                spec.name, pattern, e
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            rules.push(CompiledRule {
                name: spec.name,
                patterns,
            });
        }

        tracing::debug!("Loaded {} content rule(s)", rules.len());
        Ok(Self { rules })
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleMatcher for KeywordRules {
    fn matches(&self, content: &str) -> Vec<RuleMatch> {
        self.rules
            .iter()
            .filter_map(|rule| {
                rule.patterns.iter().find_map(|pattern| {
                    pattern.find(content).map(|m| RuleMatch {
                        rule: rule.name.clone(),
                        matched: m.as_str().to_string(),
                    })
                })
            })
            .collect()
    }
}
