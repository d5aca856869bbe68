//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `EngineState`: Where the crawl engine is in handling the current item
//! - `CrawlResult`: The accumulated links, buckets, edges and titles of a run

mod crawl_result;
mod engine_state;

// Re-export main types
pub use crawl_result::{CrawlResult, Edge};
pub use engine_state::EngineState;
