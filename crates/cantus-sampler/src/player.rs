//! Playback of an in-memory [`SampleBuffer`].

use crate::SampleBuffer;
use cantus_core::{pins, AudioFormat, Node, OutputPin, ProcessContext, SafePtr};

/// Plays one channel of a shared [`SampleBuffer`] at a variable speed.
///
/// The buffer is observed through a [`SafePtr`]; if its owner releases it the
/// node falls silent instead of reading freed memory. Group several players in
/// a [`MultiChannel`](cantus_core::MultiChannel) for multichannel buffers.
pub struct BufferPlayerNode {
    pub output: OutputPin,
    buffer: SafePtr<SampleBuffer>,
    channel: usize,
    position: f64,
    speed: f64,
    playing: bool,
    looping: bool,
}

impl BufferPlayerNode {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            output: OutputPin::new(format.block_size),
            buffer: SafePtr::null(),
            channel: 0,
            position: 0.0,
            speed: 1.0,
            playing: false,
            looping: false,
        }
    }

    pub fn with_buffer(format: AudioFormat, buffer: SafePtr<SampleBuffer>, channel: usize) -> Self {
        let mut node = Self::new(format);
        node.set_buffer(buffer, channel);
        node
    }

    /// Swaps the buffer and rewinds.
    pub fn set_buffer(&mut self, buffer: SafePtr<SampleBuffer>, channel: usize) {
        self.buffer = buffer;
        self.channel = channel;
        self.position = 0.0;
    }

    /// Starts playing at `position` frames. A negative `speed` plays backwards.
    pub fn play(&mut self, position: f64, speed: f64) {
        self.position = position;
        self.speed = speed;
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl Node for BufferPlayerNode {
    fn process(&mut self, _ctx: &mut ProcessContext<'_>) {
        let output = self.output.buffer_mut();
        if !self.playing {
            output.fill(0.0);
            return;
        }
        let Some(buffer) = self.buffer.get() else {
            output.fill(0.0);
            self.playing = false;
            return;
        };
        let Some(samples) = buffer.channel(self.channel) else {
            output.fill(0.0);
            self.playing = false;
            return;
        };

        let frames = samples.len();
        for out in output.iter_mut() {
            if !self.playing {
                *out = 0.0;
                continue;
            }
            if self.position < 0.0 || self.position >= frames as f64 {
                if self.looping && frames > 0 {
                    self.position = self.position.rem_euclid(frames as f64);
                    // rem_euclid rounds tiny negatives up to exactly `frames`
                    if self.position >= frames as f64 {
                        self.position = 0.0;
                    }
                } else {
                    self.playing = false;
                    *out = 0.0;
                    continue;
                }
            }

            let index = self.position as usize;
            let frac = (self.position - index as f64) as f32;
            let Some(&a) = samples.get(index) else {
                self.playing = false;
                *out = 0.0;
                continue;
            };
            let b = match samples.get(index + 1) {
                Some(&next) => next,
                None if self.looping => samples[0],
                None => 0.0,
            };
            *out = a + (b - a) * frac;
            self.position += self.speed;
        }
    }

    pins!(inputs: [], outputs: [output]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantus_core::{DeletionQueue, NodeManager, SafeOwner};

    fn buffer(queue: &DeletionQueue) -> SafeOwner<SampleBuffer> {
        let samples = vec![0.0, 1.0, 2.0, 3.0];
        SafeOwner::new(queue, SampleBuffer::new(vec![samples], 4.0).unwrap())
    }

    #[test]
    fn test_plays_once_then_stops() {
        let mut manager = NodeManager::new(44100.0, 8);
        let owner = buffer(manager.deletion_queue());
        let mut node = BufferPlayerNode::with_buffer(manager.format(), owner.get_safe(), 0);
        node.play(0.0, 1.0);
        let player = manager.add_root_node(node);

        manager.render(8);
        let node = manager.node(player).unwrap();
        assert_eq!(node.output.buffer(), &[0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(!node.is_playing());
    }

    #[test]
    fn test_half_speed_interpolates() {
        let mut manager = NodeManager::new(44100.0, 4);
        let owner = buffer(manager.deletion_queue());
        let mut node = BufferPlayerNode::with_buffer(manager.format(), owner.get_safe(), 0);
        node.play(0.0, 0.5);
        let player = manager.add_root_node(node);

        manager.render(4);
        let node = manager.node(player).unwrap();
        assert_eq!(node.output.buffer(), &[0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_looping_wraps() {
        let mut manager = NodeManager::new(44100.0, 8);
        let owner = buffer(manager.deletion_queue());
        let mut node = BufferPlayerNode::with_buffer(manager.format(), owner.get_safe(), 0);
        node.set_looping(true);
        node.play(2.0, 1.0);
        let player = manager.add_root_node(node);

        manager.render(8);
        let node = manager.node(player).unwrap();
        assert_eq!(node.output.buffer(), &[2.0, 3.0, 0.0, 1.0, 2.0, 3.0, 0.0, 1.0]);
        assert!(node.is_playing());
    }

    #[test]
    fn test_looping_from_tiny_negative_position() {
        let mut manager = NodeManager::new(44100.0, 4);
        let owner = buffer(manager.deletion_queue());
        let mut node = BufferPlayerNode::with_buffer(manager.format(), owner.get_safe(), 0);
        node.set_looping(true);
        node.play(-1e-17, 1.0);
        let player = manager.add_root_node(node);

        manager.render(4);
        let node = manager.node(player).unwrap();
        assert_eq!(node.output.buffer(), &[0.0, 1.0, 2.0, 3.0]);
        assert!(node.is_playing());
    }

    #[test]
    fn test_looping_backwards_across_start() {
        let mut manager = NodeManager::new(44100.0, 8);
        let owner = buffer(manager.deletion_queue());
        let mut node = BufferPlayerNode::with_buffer(manager.format(), owner.get_safe(), 0);
        node.set_looping(true);
        node.play(1.0, -1.0);
        let player = manager.add_root_node(node);

        manager.render(8);
        let node = manager.node(player).unwrap();
        assert_eq!(node.output.buffer(), &[1.0, 0.0, 3.0, 2.0, 1.0, 0.0, 3.0, 2.0]);
        assert!(node.position() < 4.0);
    }

    #[test]
    fn test_released_buffer_is_silent() {
        let mut manager = NodeManager::new(44100.0, 4);
        let queue = manager.deletion_queue().clone();
        let mut owner = buffer(&queue);
        let mut node = BufferPlayerNode::with_buffer(manager.format(), owner.get_safe(), 0);
        node.play(0.0, 1.0);
        let player = manager.add_root_node(node);

        owner.reset();
        manager.render(4);
        assert_eq!(manager.node(player).unwrap().output.buffer(), &[0.0; 4]);
    }
}
