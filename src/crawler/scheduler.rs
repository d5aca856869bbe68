//! Scheduler for managing the crawl frontier and pacing
//!
//! This module handles:
//! - The ordered frontier of discovered addresses, deduplicated by key
//! - Pass boundaries for the configured pass mode
//! - The visited set, so each key is fetched at most once per run
//! - Pausing between items of a pass

use crate::config::PassMode;
use crate::url::dedup_key;
use std::collections::HashSet;
use std::time::Duration;

/// Scheduler owns the frontier and decides what is fetched next
///
/// The frontier is an append-only list walked by a cursor that never moves
/// backwards, so items before the cursor have all been handed out. A pass
/// ends when the cursor reaches the frontier's end; in snapshot mode the end
/// is fixed when the pass begins, in growing mode it is read live so items
/// appended mid-pass are reached in the same pass.
#[derive(Debug)]
pub struct Scheduler {
    /// Every enqueued address, in discovery order
    frontier: Vec<String>,

    /// Dedup keys of every enqueued address
    keys: HashSet<String>,

    /// Dedup keys already handed out for fetching
    visited: HashSet<String>,

    /// Index of the next frontier item to consider
    cursor: usize,

    /// Frontier length at pass start (snapshot mode only)
    pass_limit: Option<usize>,

    pause: Duration,
    mode: PassMode,
}

impl Scheduler {
    /// Creates a new scheduler seeded with one address
    ///
    /// # Arguments
    ///
    /// * `seed` - The canonical seed address
    /// * `pause` - Delay between consecutive items of a pass
    /// * `mode` - Pass boundary behavior
    pub fn new(seed: &str, pause: Duration, mode: PassMode) -> Self {
        let mut scheduler = Self {
            frontier: Vec::new(),
            keys: HashSet::new(),
            visited: HashSet::new(),
            cursor: 0,
            pass_limit: None,
            pause,
            mode,
        };
        scheduler.enqueue(seed);
        scheduler
    }

    /// Marks the start of a pass
    pub fn begin_pass(&mut self) {
        self.pass_limit = match self.mode {
            PassMode::Growing => None,
            PassMode::Snapshot => Some(self.frontier.len()),
        };
    }

    fn limit(&self) -> usize {
        self.pass_limit.unwrap_or(self.frontier.len())
    }

    /// Returns the next unvisited address of the current pass
    ///
    /// The returned address is marked visited before it is handed out.
    ///
    /// # Returns
    ///
    /// * `Some(String)` - An address to fetch
    /// * `None` - The pass is exhausted
    pub fn next_item(&mut self) -> Option<String> {
        while self.cursor < self.limit() {
            let item = self.frontier[self.cursor].clone();
            self.cursor += 1;

            if self.visited.insert(dedup_key(&item)) {
                return Some(item);
            }
            tracing::trace!("Skipping already visited {}", item);
        }
        None
    }

    /// Appends an address unless an equivalent one is already known
    ///
    /// # Returns
    ///
    /// * `true` - The address was new and has been appended
    /// * `false` - An address with the same dedup key was already enqueued
    pub fn enqueue(&mut self, address: &str) -> bool {
        if !self.keys.insert(dedup_key(address)) {
            return false;
        }
        self.frontier.push(address.to_string());
        true
    }

    /// Returns true if the current pass has further items to consider
    pub fn has_more_in_pass(&self) -> bool {
        self.cursor < self.limit()
    }

    /// Sleeps for the configured pause, if any
    pub async fn pace(&self) {
        if self.pause.is_zero() {
            return;
        }
        tracing::trace!("Pausing {:?} before next item", self.pause);
        tokio::time::sleep(self.pause).await;
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Returns the number of addresses ever enqueued
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns the number of addresses handed out for fetching
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Returns true if every enqueued address has been handed out
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.frontier.len()
    }
}
