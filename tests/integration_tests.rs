//! Integration tests for the cantus audio graph
//!
//! Test categories:
//! - Engine: builder, config, control-thread edits
//! - Graph: pull evaluation, routing, cycles
//! - Timeline: block timing, rate and block size changes
//!
//! Run with:
//! ```bash
//! cargo test -p cantus --test integration_tests
//! ```

mod helpers;
mod integration;
