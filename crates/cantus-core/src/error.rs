//! Error types for cantus-core.

use crate::node::{NodeId, PinKind};
use thiserror::Error;

/// Error type for cantus-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {node} has no {kind} pin {index}")]
    PinOutOfRange {
        node: NodeId,
        kind: PinKind,
        index: usize,
    },

    #[error("Channel {channel} out of range (channel count {count})")]
    ChannelOutOfRange { channel: usize, count: usize },

    #[error("Worker thread error: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
