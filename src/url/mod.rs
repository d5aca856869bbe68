//! URL handling module
//!
//! This module provides address canonicalization, link resolution, the
//! comparison keys used for deduplication, and the ordered link classifier.

mod classify;
mod domain;
mod normalize;

// Re-export main functions
pub use classify::{Bucket, LinkClassifier, Verdict};
pub use domain::{dedup_key, host_key};
pub use normalize::{canonicalize, is_absolute_http, origin, resolve};
