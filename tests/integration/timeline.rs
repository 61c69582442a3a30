//! Timeline integration tests
//!
//! Sample time, update listeners and format changes while the graph runs.

use crate::helpers::*;
use approx::assert_abs_diff_eq;
use cantus::prelude::*;
use std::sync::{Arc, Mutex};

#[test]
fn test_sample_time_advances_per_block() {
    let mut manager = test_manager();
    let times = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&times);
    manager.add_update_listener(move |time| seen.lock().unwrap().push(time));

    manager.render(256);
    assert_eq!(manager.sample_time(), 256);
    assert_eq!(*times.lock().unwrap(), vec![64, 128, 192, 256]);
}

#[test]
#[should_panic(expected = "not a multiple")]
fn test_partial_block_panics() {
    let mut manager = test_manager();
    manager.render(100);
}

#[test]
fn test_sample_rate_change_reaches_nodes() {
    let (engine, mut manager) = test_engine();
    let format = engine.format();

    let osc = manager.add_root_node(OscillatorNode::sine(format));
    manager.node_mut(osc).unwrap().set_frequency(1000.0);
    manager.set_sample_rate(48000.0);

    assert_eq!(engine.sample_rate(), 48000.0);
    assert_eq!(manager.samples_per_millisecond(), 48.0);

    // 1 kHz at 48 kHz repeats every 48 samples.
    manager.render(128);
    let output = manager.node(osc).unwrap().output.buffer();
    assert_abs_diff_eq!(output[0], output[48], epsilon = 1e-3);
}

#[test]
fn test_block_size_change_resizes_pins() {
    let mut manager = test_manager();
    let format = manager.format();

    let signal = manager.add_node(SignalNode::new(format, generate_integer_staircase(256)));
    let out = manager.add_root_node(OutputNode::new(format, 0));
    manager.connect(signal.output(0), out, 0).unwrap();

    manager.set_internal_buffer_size(32);
    assert_eq!(manager.format().block_size, 32);
    assert_eq!(manager.node(signal).unwrap().output.len(), 32);

    let output = manager.render(96);
    assert_eq!(output[0], generate_integer_staircase(96));
}

#[test]
fn test_control_ramp_over_blocks() {
    let mut manager = NodeManager::new(1000.0, 4);
    let format = manager.format();

    let mut control = ControlNode::new(format, 0.0);
    control.ramp(1.0, 8.0, RampMode::Linear);
    let control = manager.add_node(control);
    let out = manager.add_root_node(OutputNode::new(format, 0));
    manager.connect(control.output(0), out, 0).unwrap();

    let output = manager.render(12);
    let expected = [0.125, 0.25, 0.375, 0.5, 0.625, 0.75, 0.875, 1.0, 1.0, 1.0, 1.0, 1.0];
    assert!(signals_approx_equal(&output[0], &expected, 1e-6));
    assert!(!manager.node(control).unwrap().is_ramping());
}
