//! Pull-based, sample-accurate audio processing graph.
//!
//! # Primary API
//!
//! - [`NodeManager`]: Owns the graph and the timeline; call
//!   [`process`](NodeManager::process) from the device callback
//! - [`GraphHandle`]: Queue graph edits from control threads
//! - [`Node`], [`InputPin`], [`OutputPin`]: Write your own processing nodes
//! - [`RampedValue`], [`SmoothedValue`]: Per-sample control values
//! - [`SafeOwner`], [`SafePtr`], [`DeletionQueue`]: Deferred destruction of
//!   objects the audio thread can see
//! - [`WorkerThread`]: Background thread for disk I/O
//!
//! # Example
//!
//! ```
//! use cantus_core::prelude::*;
//!
//! let mut manager = NodeManager::new(44100.0, 64);
//! manager.set_input_channel_count(1);
//! let format = manager.format();
//!
//! let input = manager.add_node(InputNode::new(format, 0));
//! let output = manager.add_root_node(OutputNode::new(format, 0));
//! manager.connect(input.output(0), output, 0).unwrap();
//!
//! let device_in = vec![0.5f32; 128];
//! let mut left = vec![0.0f32; 128];
//! let mut right = vec![0.0f32; 128];
//! manager.process(&[device_in.as_slice()], &mut [left.as_mut_slice(), right.as_mut_slice()], 128);
//! assert_eq!(left, device_in);
//! ```

mod macros;

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod lockfree;
pub mod manager;
pub mod multichannel;
pub mod node;
pub mod ramp;
pub mod safe;
pub mod smooth;
pub mod worker;

pub use config::AudioConfig;
pub use error::{Error, Result};
pub use format::AudioFormat;
pub use io::{InputNode, OutputNode};
pub use lockfree::{AtomicCount, AtomicFlag, AtomicFloat};
pub use manager::{
    ChannelCountListener, GraphHandle, NodeManager, NodeOwner, ProcessContext, Task, UpdateListener,
};
pub use multichannel::{MultiChannel, MultiChannelInput, MultiChannelOutput};
pub use node::{AsAny, InputPin, Node, NodeId, NodeRef, OutputPin, PinKind, PinRef};
pub use ramp::{DestinationCallback, RampMode, RampedValue};
pub use safe::{DeletionQueue, SafeOwner, SafePtr};
pub use smooth::SmoothedValue;
pub use worker::{WorkerJob, WorkerThread, WorkerWaker};

pub mod prelude {
    pub use crate::{
        chain, pins, AudioConfig, AudioFormat, GraphHandle, InputNode, InputPin, MultiChannel,
        MultiChannelInput, MultiChannelOutput, Node, NodeId, NodeManager, NodeOwner, NodeRef,
        OutputNode, OutputPin, PinRef, ProcessContext, RampMode, RampedValue, SafeOwner, SafePtr,
        SmoothedValue,
    };
}
