//! Integration test modules for cantus
//!
//! - engine: Engine construction and control-thread edits
//! - graph: Graph construction, routing and signal flow
//! - timeline: Sample time, listeners and format changes

pub mod engine;
pub mod graph;
pub mod timeline;
