//! Shared test utilities for platelog integration tests.
//!
//! - `TestHarness` wires stores, pipeline and workers over temp directories
//! - fake recognizers for driving enrichment without a network

pub mod harness;
pub mod recognizers;

pub use harness::{wait_for_terminal, TestHarness};
pub use recognizers::*;
