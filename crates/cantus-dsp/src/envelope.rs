//! Multi-segment envelope generator.

use crate::millis_to_steps;
use cantus_core::{pins, AudioFormat, Node, OutputPin, ProcessContext, RampMode, RampedValue};

/// One stage of an envelope: ramp to `destination` over `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub destination: f32,
    pub duration_ms: f32,
    pub mode: RampMode,
}

impl Segment {
    pub fn new(destination: f32, duration_ms: f32, mode: RampMode) -> Self {
        Self {
            destination,
            duration_ms,
            mode,
        }
    }

    pub fn linear(destination: f32, duration_ms: f32) -> Self {
        Self::new(destination, duration_ms, RampMode::Linear)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Segment(usize),
    Release,
}

/// Plays its segments in order after [`trigger`](EnvelopeNode::trigger),
/// starting from wherever the output currently is.
pub struct EnvelopeNode {
    pub output: OutputPin,
    segments: Vec<Segment>,
    stage: Stage,
    value: RampedValue,
    sample_rate: f32,
    on_finished: Option<Box<dyn FnMut() + Send>>,
}

impl EnvelopeNode {
    pub fn new(format: AudioFormat, segments: Vec<Segment>) -> Self {
        Self {
            output: OutputPin::new(format.block_size),
            segments,
            stage: Stage::Idle,
            value: RampedValue::new(0.0),
            sample_rate: format.sample_rate,
            on_finished: None,
        }
    }

    /// Attack, decay, sustain level; release is handled by [`stop`](Self::stop).
    pub fn adsr(format: AudioFormat, attack_ms: f32, decay_ms: f32, sustain: f32) -> Self {
        Self::new(
            format,
            vec![
                Segment::linear(1.0, attack_ms),
                Segment::new(sustain, decay_ms, RampMode::Exponential),
            ],
        )
    }

    pub fn trigger(&mut self) {
        self.start_segment(0);
    }

    /// Ramps to zero over `release_ms`, abandoning remaining segments.
    ///
    /// Does nothing, and does not fire the finished callback, when the
    /// envelope is idle at zero.
    pub fn stop(&mut self, release_ms: f32) {
        if self.stage == Stage::Idle && self.value.value() == 0.0 {
            return;
        }
        self.stage = Stage::Release;
        let steps = millis_to_steps(release_ms, self.sample_rate);
        self.value.ramp(0.0, steps, RampMode::Exponential);
        if !self.value.is_ramping() {
            self.finish();
        }
    }

    pub fn set_segments(&mut self, segments: Vec<Segment>) {
        self.segments = segments;
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn value(&self) -> f32 {
        self.value.value()
    }

    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    /// Fires on the audio thread when the last segment or the release ends.
    pub fn set_on_finished<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.on_finished = Some(Box::new(callback));
    }

    fn start_segment(&mut self, mut index: usize) {
        while let Some(segment) = self.segments.get(index) {
            let steps = millis_to_steps(segment.duration_ms, self.sample_rate);
            self.value.ramp(segment.destination, steps, segment.mode);
            if self.value.is_ramping() {
                self.stage = Stage::Segment(index);
                return;
            }
            index += 1;
        }
        self.finish();
    }

    fn advance(&mut self) {
        match self.stage {
            Stage::Segment(index) => self.start_segment(index + 1),
            Stage::Release => self.finish(),
            Stage::Idle => {}
        }
    }

    fn finish(&mut self) {
        self.stage = Stage::Idle;
        if let Some(callback) = self.on_finished.as_mut() {
            callback();
        }
    }
}

impl Node for EnvelopeNode {
    fn process(&mut self, _ctx: &mut ProcessContext<'_>) {
        if self.stage == Stage::Idle {
            let value = self.value.value();
            self.output.buffer_mut().fill(value);
            return;
        }
        for i in 0..self.output.len() {
            let value = self.value.next_value();
            self.output.buffer_mut()[i] = value;
            if self.stage != Stage::Idle && !self.value.is_ramping() {
                self.advance();
            }
        }
    }

    fn sample_rate_changed(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pins!(inputs: [], outputs: [output]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantus_core::NodeManager;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn render_values(manager: &mut NodeManager, env: cantus_core::NodeRef<EnvelopeNode>, blocks: usize) -> Vec<f32> {
        let mut values = Vec::new();
        for _ in 0..blocks {
            manager.render(4);
            values.extend_from_slice(manager.node(env).unwrap().output.buffer());
        }
        values
    }

    #[test]
    fn test_segments_play_in_order() {
        let mut manager = NodeManager::new(1000.0, 4);
        let env = manager.add_root_node(EnvelopeNode::new(
            manager.format(),
            vec![Segment::linear(1.0, 2.0), Segment::linear(0.5, 2.0)],
        ));
        manager.node_mut(env).unwrap().trigger();

        let values = render_values(&mut manager, env, 2);
        assert_eq!(values, vec![0.5, 1.0, 0.75, 0.5, 0.5, 0.5, 0.5, 0.5]);
        assert!(!manager.node(env).unwrap().is_active());
    }

    #[test]
    fn test_zero_length_segment_jumps() {
        let mut manager = NodeManager::new(1000.0, 4);
        let env = manager.add_root_node(EnvelopeNode::new(
            manager.format(),
            vec![Segment::linear(1.0, 0.0), Segment::linear(0.0, 4.0)],
        ));
        manager.node_mut(env).unwrap().trigger();

        let values = render_values(&mut manager, env, 1);
        assert_eq!(values, vec![0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_stop_releases_and_notifies() {
        let mut manager = NodeManager::new(1000.0, 4);
        let env = manager.add_root_node(EnvelopeNode::adsr(manager.format(), 4.0, 4.0, 0.5));
        let finished = Arc::new(AtomicUsize::new(0));
        {
            let finished = Arc::clone(&finished);
            let env = manager.node_mut(env).unwrap();
            env.set_on_finished(move || {
                finished.fetch_add(1, Ordering::SeqCst);
            });
            env.trigger();
        }
        render_values(&mut manager, env, 1);
        assert_eq!(manager.node(env).unwrap().value(), 1.0);

        manager.node_mut(env).unwrap().stop(8.0);
        let values = render_values(&mut manager, env, 3);
        assert_eq!(values[7], 0.0);
        assert!(values[..7].windows(2).all(|w| w[1] < w[0]));
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(!manager.node(env).unwrap().is_active());
    }

    #[test]
    fn test_stop_when_idle_at_zero_is_ignored() {
        let mut manager = NodeManager::new(1000.0, 4);
        let env = manager.add_root_node(EnvelopeNode::new(
            manager.format(),
            vec![Segment::linear(0.5, 2.0)],
        ));
        let finished = Arc::new(AtomicUsize::new(0));
        {
            let finished = Arc::clone(&finished);
            let env = manager.node_mut(env).unwrap();
            env.set_on_finished(move || {
                finished.fetch_add(1, Ordering::SeqCst);
            });
            env.stop(4.0);
            assert!(!env.is_active());
        }
        let values = render_values(&mut manager, env, 2);
        assert_eq!(values, vec![0.0; 8]);
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        // Idle but holding the last segment's level still releases.
        manager.node_mut(env).unwrap().trigger();
        render_values(&mut manager, env, 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(manager.node(env).unwrap().value(), 0.5);

        manager.node_mut(env).unwrap().stop(4.0);
        let values = render_values(&mut manager, env, 2);
        assert_eq!(values[3], 0.0);
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }
}
