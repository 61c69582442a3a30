//! Owner of the node graph, the sample timeline and the mutation queue.
//!
//! A [`NodeManager`] lives on the audio thread. Control threads never touch it
//! directly; they hold a [`GraphHandle`] and enqueue closures that run at the
//! start of the next [`process`](NodeManager::process) call, before any node
//! processes. Everything removed from the graph is handed to the
//! [`DeletionQueue`] and freed at the start of the following callback.

mod context;
mod handle;

pub use context::ProcessContext;
pub use handle::{GraphHandle, NodeOwner};

use crate::config::AudioConfig;
use crate::format::{AudioFormat, SharedFormat};
use crate::node::{InputPin, Node, NodeId, NodeRef, PinKind, PinRef};
use crate::safe::{DeletionQueue, SafeOwner};
use crate::{Error, Result};
use context::{Arena, Slot};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Graph mutation, run on the audio thread between callbacks.
pub type Task = Box<dyn FnOnce(&mut NodeManager) + Send>;

/// Called after every internal block with the new sample time.
pub type UpdateListener = Box<dyn FnMut(u64) + Send>;

/// Called with `(inputs, outputs)` whenever either channel count changes.
pub type ChannelCountListener = Box<dyn FnMut(usize, usize) + Send>;

pub struct NodeManager {
    sample_rate: f32,
    block_size: usize,
    input_channels: usize,
    sample_time: u64,
    generation: u64,
    nodes: Arena,
    roots: Vec<NodeId>,
    mix: Vec<Vec<f32>>,
    task_tx: Sender<Task>,
    task_rx: Receiver<Task>,
    deletion_queue: DeletionQueue,
    next_id: Arc<AtomicU64>,
    format: Arc<SharedFormat>,
    update_listeners: Vec<UpdateListener>,
    channel_count_listeners: Vec<ChannelCountListener>,
    cycles: u64,
    cycle_reported: bool,
}

impl NodeManager {
    /// Creates a manager with two output channels and its own deletion queue.
    ///
    /// # Panics
    /// If `block_size` is zero.
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self::with_deletion_queue(DeletionQueue::new(), sample_rate, block_size)
    }

    pub fn with_deletion_queue(
        deletion_queue: DeletionQueue,
        sample_rate: f32,
        block_size: usize,
    ) -> Self {
        assert!(block_size > 0, "internal buffer size must be greater than zero");
        let (task_tx, task_rx) = unbounded();
        Self {
            sample_rate,
            block_size,
            input_channels: 0,
            sample_time: 0,
            generation: 0,
            nodes: Arena::new(),
            roots: Vec::new(),
            mix: vec![vec![0.0; block_size]; 2],
            task_tx,
            task_rx,
            deletion_queue,
            next_id: Arc::new(AtomicU64::new(1)),
            format: Arc::new(SharedFormat::new(AudioFormat::new(sample_rate, block_size))),
            update_listeners: Vec::new(),
            channel_count_listeners: Vec::new(),
            cycles: 0,
            cycle_reported: false,
        }
    }

    /// Creates a manager from a validated config.
    pub fn from_config(config: &AudioConfig) -> Result<Self> {
        config.validate()?;
        let mut manager = Self::new(config.sample_rate, config.internal_buffer_size);
        manager.set_input_channel_count(config.input_channels);
        manager.set_output_channel_count(config.output_channels);
        manager.nodes.reserve(config.node_capacity);
        manager.roots.reserve(config.node_capacity);
        Ok(manager)
    }

    /// Returns a clonable, `Send` handle for control threads.
    pub fn handle(&self) -> GraphHandle {
        GraphHandle::new(
            self.task_tx.clone(),
            self.deletion_queue.clone(),
            Arc::clone(&self.next_id),
            Arc::clone(&self.format),
        )
    }

    // =========================================================================
    // Device callback
    // =========================================================================

    /// Renders `frame_count` frames.
    ///
    /// Runs queued tasks, frees the deletion queue, then processes the graph one
    /// internal block at a time. `inputs` and `outputs` hold one slice per
    /// channel; outputs are overwritten with the mix of all output nodes.
    ///
    /// # Panics
    /// If `frame_count` is not a multiple of the internal buffer size.
    pub fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], frame_count: usize) {
        assert!(
            frame_count % self.block_size == 0,
            "frame count {} is not a multiple of the internal buffer size {}",
            frame_count,
            self.block_size
        );

        self.apply_pending_tasks();
        self.deletion_queue.clear();

        for output in outputs.iter_mut() {
            let len = frame_count.min(output.len());
            output[..len].fill(0.0);
        }

        let block_size = self.block_size;
        let mut offset = 0;
        while offset < frame_count {
            self.process_block(inputs, offset);

            for (output, mix) in outputs.iter_mut().zip(&self.mix) {
                if let Some(dst) = output.get_mut(offset..offset + block_size) {
                    dst.copy_from_slice(mix);
                }
            }

            self.sample_time = self.sample_time.wrapping_add(block_size as u64);
            for listener in &mut self.update_listeners {
                listener(self.sample_time);
            }
            offset += block_size;
        }

        if self.cycles > 0 && !self.cycle_reported {
            self.cycle_reported = true;
            warn!(
                cycles = self.cycles,
                "feedback cycle in node graph, re-entrant pulls output silence"
            );
        }
    }

    fn process_block(&mut self, inputs: &[&[f32]], offset: usize) {
        self.generation = self.generation.wrapping_add(1);
        for channel in &mut self.mix {
            channel.fill(0.0);
        }

        let mut ctx = ProcessContext {
            nodes: &mut self.nodes,
            generation: self.generation,
            sample_time: self.sample_time,
            sample_rate: self.sample_rate,
            block_size: self.block_size,
            inputs,
            offset,
            outputs: &mut self.mix,
            cycles: &mut self.cycles,
        };
        for &root in &self.roots {
            ctx.ensure_processed(root);
        }
    }

    /// Offline convenience: renders `frame_count` frames with no device input and
    /// returns one buffer per output channel.
    pub fn render(&mut self, frame_count: usize) -> Vec<Vec<f32>> {
        let mut buffers = vec![vec![0.0; frame_count]; self.mix.len()];
        let mut outputs: Vec<&mut [f32]> = buffers.iter_mut().map(Vec::as_mut_slice).collect();
        self.process(&[], &mut outputs, frame_count);
        buffers
    }

    // =========================================================================
    // Tasks and deletion
    // =========================================================================

    /// Queues `task` to run at the start of the next `process` call.
    pub fn enqueue_task<F>(&self, task: F)
    where
        F: FnOnce(&mut NodeManager) + Send + 'static,
    {
        // The receiver lives in `self`, so the send cannot fail.
        let _ = self.task_tx.send(Box::new(task));
    }

    /// Runs every queued task in FIFO order. Returns how many ran.
    pub fn apply_pending_tasks(&mut self) -> usize {
        let mut count = 0;
        while let Ok(task) = self.task_rx.try_recv() {
            task(self);
            count += 1;
        }
        count
    }

    pub fn deletion_queue(&self) -> &DeletionQueue {
        &self.deletion_queue
    }

    /// Wraps `value` in a [`SafeOwner`] tied to this manager's deletion queue.
    pub fn make_safe<T: Send + Sync + 'static>(&self, value: T) -> SafeOwner<T> {
        SafeOwner::new(&self.deletion_queue, value)
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    pub fn add_node<N: Node>(&mut self, node: N) -> NodeRef<N> {
        let id = NodeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.insert_node(id, Box::new(node));
        NodeRef::new(id)
    }

    /// Adds `node` and registers it as a root.
    pub fn add_root_node<N: Node>(&mut self, node: N) -> NodeRef<N> {
        let node = self.add_node(node);
        self.register_root_node(node);
        node
    }

    pub(crate) fn insert_node(&mut self, id: NodeId, mut node: Box<dyn Node>) {
        self.conform(&mut *node);
        debug!(node = %id, name = node.name(), "node added");
        if let Some(previous) = self.nodes.insert(id, Slot::new(node)) {
            if let Some(previous) = previous.node {
                self.deletion_queue.enqueue(previous);
            }
        }
    }

    /// Resizes pins of a node built against another block size.
    fn conform(&self, node: &mut dyn Node) {
        let block_size = self.block_size;
        let mut stale = false;
        for index in 0..node.output_count() {
            if let Some(pin) = node.output(index) {
                stale |= pin.len() != block_size;
            }
        }
        for index in 0..node.input_count() {
            if let Some(pin) = node.input_mut(index) {
                stale |= pin.last_block().len() != block_size;
            }
        }

        if stale {
            resize_pins(node, block_size);
            node.buffer_size_changed(block_size);
        }
    }

    /// Removes a node from the graph. The node is freed through the deletion queue.
    ///
    /// Pins still connected to it read silence from now on.
    pub fn remove_node(&mut self, node: impl Into<NodeId>) -> bool {
        let id = node.into();
        self.roots.retain(|&root| root != id);
        match self.nodes.remove(&id) {
            Some(slot) => {
                if let Some(node) = slot.node {
                    self.deletion_queue.enqueue(node);
                }
                debug!(node = %id, "node removed");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, node: impl Into<NodeId>) -> bool {
        self.nodes.contains_key(&node.into())
    }

    pub fn node<N: Node>(&self, node: NodeRef<N>) -> Option<&N> {
        self.node_dyn(node.id())?.as_any().downcast_ref::<N>()
    }

    pub fn node_mut<N: Node>(&mut self, node: NodeRef<N>) -> Option<&mut N> {
        self.node_dyn_mut(node.id())?.as_any_mut().downcast_mut::<N>()
    }

    pub fn node_dyn(&self, id: NodeId) -> Option<&dyn Node> {
        let node = self.nodes.get(&id)?.node.as_deref()?;
        Some(node)
    }

    pub fn node_dyn_mut(&mut self, id: NodeId) -> Option<&mut dyn Node> {
        let node = self.nodes.get_mut(&id)?.node.as_deref_mut()?;
        Some(node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Connects output pin `source` to input `input` of `dest`, replacing any
    /// existing connection of that input.
    pub fn connect(&mut self, source: PinRef, dest: impl Into<NodeId>, input: usize) -> Result<()> {
        let dest = dest.into();
        let output_count = self
            .node_dyn(source.node)
            .ok_or(Error::NodeNotFound(source.node))?
            .output_count();
        if source.output >= output_count {
            return Err(Error::PinOutOfRange {
                node: source.node,
                kind: PinKind::Output,
                index: source.output,
            });
        }

        self.input_pin_mut(dest, input)?.connect(source);
        debug!(
            source = %source.node,
            output = source.output,
            dest = %dest,
            input,
            "pins connected"
        );
        Ok(())
    }

    pub fn disconnect(&mut self, dest: impl Into<NodeId>, input: usize) -> Result<()> {
        let dest = dest.into();
        self.input_pin_mut(dest, input)?.disconnect();
        debug!(dest = %dest, input, "pin disconnected");
        Ok(())
    }

    /// Disconnects every input fed by any output of `source`.
    pub fn disconnect_outputs(&mut self, source: impl Into<NodeId>) -> usize {
        let source = source.into();
        let mut count = 0;
        for slot in self.nodes.values_mut() {
            let Some(node) = slot.node.as_deref_mut() else {
                continue;
            };
            for index in 0..node.input_count() {
                if let Some(pin) = node.input_mut(index) {
                    if pin.source().is_some_and(|s| s.node == source) {
                        pin.disconnect();
                        count += 1;
                    }
                }
            }
        }
        count
    }

    pub fn input_source(&mut self, dest: impl Into<NodeId>, input: usize) -> Option<PinRef> {
        self.input_pin_mut(dest.into(), input).ok()?.source()
    }

    fn input_pin_mut(&mut self, node: NodeId, index: usize) -> Result<&mut InputPin> {
        let target = self
            .nodes
            .get_mut(&node)
            .and_then(|slot| slot.node.as_deref_mut())
            .ok_or(Error::NodeNotFound(node))?;
        target.input_mut(index).ok_or(Error::PinOutOfRange {
            node,
            kind: PinKind::Input,
            index,
        })
    }

    // =========================================================================
    // Roots
    // =========================================================================

    /// Registers a node to be processed once per block even if nothing pulls it.
    pub fn register_root_node(&mut self, node: impl Into<NodeId>) {
        let id = node.into();
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
    }

    pub fn unregister_root_node(&mut self, node: impl Into<NodeId>) {
        let id = node.into();
        self.roots.retain(|&root| root != id);
    }

    pub fn is_root(&self, node: impl Into<NodeId>) -> bool {
        self.roots.contains(&node.into())
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    // =========================================================================
    // Format and timeline
    // =========================================================================

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.format.set_sample_rate(sample_rate);
        for slot in self.nodes.values_mut() {
            if let Some(node) = slot.node.as_deref_mut() {
                node.sample_rate_changed(sample_rate);
            }
        }
        debug!(sample_rate, "sample rate changed");
    }

    /// Changes the internal block size, resizing every pin buffer.
    ///
    /// # Panics
    /// If `block_size` is zero.
    pub fn set_internal_buffer_size(&mut self, block_size: usize) {
        assert!(block_size > 0, "internal buffer size must be greater than zero");
        self.block_size = block_size;
        self.format.set_block_size(block_size);
        for channel in &mut self.mix {
            channel.resize(block_size, 0.0);
        }
        for slot in self.nodes.values_mut() {
            if let Some(node) = slot.node.as_deref_mut() {
                resize_pins(node, block_size);
                node.buffer_size_changed(block_size);
            }
        }
        debug!(block_size, "internal buffer size changed");
    }

    pub fn set_input_channel_count(&mut self, count: usize) {
        if self.input_channels == count {
            return;
        }
        self.input_channels = count;
        self.notify_channel_count();
    }

    pub fn set_output_channel_count(&mut self, count: usize) {
        if self.mix.len() == count {
            return;
        }
        self.mix.resize(count, vec![0.0; self.block_size]);
        self.notify_channel_count();
    }

    fn notify_channel_count(&mut self) {
        let (inputs, outputs) = (self.input_channels, self.mix.len());
        debug!(inputs, outputs, "channel count changed");
        for listener in &mut self.channel_count_listeners {
            listener(inputs, outputs);
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    pub fn samples_per_millisecond(&self) -> f32 {
        self.sample_rate / 1000.0
    }

    #[inline]
    pub fn internal_buffer_size(&self) -> usize {
        self.block_size
    }

    pub fn format(&self) -> AudioFormat {
        AudioFormat::new(self.sample_rate, self.block_size)
    }

    pub fn input_channel_count(&self) -> usize {
        self.input_channels
    }

    pub fn output_channel_count(&self) -> usize {
        self.mix.len()
    }

    /// Samples processed since creation.
    #[inline]
    pub fn sample_time(&self) -> u64 {
        self.sample_time
    }

    pub fn add_update_listener<F>(&mut self, listener: F)
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.update_listeners.push(Box::new(listener));
    }

    pub fn clear_update_listeners(&mut self) {
        self.update_listeners.clear();
    }

    /// Registers a callback for input or output channel count changes.
    pub fn add_channel_count_listener<F>(&mut self, listener: F)
    where
        F: FnMut(usize, usize) + Send + 'static,
    {
        self.channel_count_listeners.push(Box::new(listener));
    }

    pub fn clear_channel_count_listeners(&mut self) {
        self.channel_count_listeners.clear();
    }

    /// Number of re-entrant pulls answered with silence.
    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }
}

impl Drop for NodeManager {
    fn drop(&mut self) {
        for (_, slot) in self.nodes.drain() {
            if let Some(node) = slot.node {
                self.deletion_queue.enqueue(node);
            }
        }
        self.deletion_queue.clear();
    }
}

fn resize_pins(node: &mut dyn Node, block_size: usize) {
    for index in 0..node.input_count() {
        if let Some(pin) = node.input_mut(index) {
            pin.resize(block_size);
        }
    }
    for index in 0..node.output_count() {
        if let Some(pin) = node.output_mut(index) {
            pin.resize(block_size);
        }
    }
}
