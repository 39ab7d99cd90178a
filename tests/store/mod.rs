//! Integration tests for the value store and extension
//!
//! These tests check the state of a freshly built store.

// Selection and defaults
mod selection_tests;
