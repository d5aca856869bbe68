//! Crawl engine state definitions
//!
//! The engine walks the frontier one item at a time; these states describe
//! where it is in handling the current item.

use std::fmt;

/// Represents the current state of the crawl engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Frontier holds only the seed; nothing fetched yet
    Seeded,

    /// Waiting on the network for the current item
    Fetching,

    /// Turning the fetched body into a document
    Parsing,

    /// Classifying, resolving and enqueueing links of the current item
    ExtractingLinks,

    /// Current item finished (successfully or skipped); pacing before the next
    Advancing,

    /// All passes completed
    Done,
}

impl EngineState {
    /// Returns true if the engine may move from `self` to `next`
    ///
    /// Failures while fetching or parsing go straight to `Advancing`, so the
    /// item is skipped without touching link state.
    pub fn can_transition_to(&self, next: EngineState) -> bool {
        use EngineState::*;
        matches!(
            (self, next),
            (Seeded, Fetching)
                | (Seeded, Done)
                | (Fetching, Parsing)
                | (Fetching, Advancing)
                | (Parsing, ExtractingLinks)
                | (Parsing, Advancing)
                | (ExtractingLinks, Advancing)
                | (Advancing, Fetching)
                | (Advancing, Done)
        )
    }

    /// Returns true once the crawl has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Short lowercase name, used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::ExtractingLinks => "extracting_links",
            Self::Advancing => "advancing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
