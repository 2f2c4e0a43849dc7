//! Integration test crate for the Bazaar workspace.
//!
//! This crate exists solely to run tests that span the token and market
//! crates. It has no public API; all functionality is in the test modules.

#![forbid(unsafe_code)]
