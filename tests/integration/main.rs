//! End-to-end tests against mock HTTP servers

mod check_tests;
mod crawl_tests;
mod extract_tests;
