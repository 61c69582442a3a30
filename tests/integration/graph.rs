//! Audio graph integration tests
//!
//! Tests node routing, pull evaluation and signal flow through a manager
//! driven block by block.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use cantus::prelude::*;

/// A node read by several downstream pins still runs once per block.
#[test]
fn test_shared_upstream_runs_once_per_block() {
    let mut manager = test_manager();
    let format = manager.format();

    let signal = manager.add_node(SignalNode::new(format, generate_integer_staircase(256)));
    let counter = manager.add_node(CountingNode::new(format));
    let left = manager.add_root_node(OutputNode::new(format, 0));
    let right = manager.add_root_node(OutputNode::new(format, 1));
    manager.connect(signal.output(0), counter, 0).unwrap();
    manager.connect(counter.output(0), left, 0).unwrap();
    manager.connect(counter.output(0), right, 0).unwrap();

    let output = manager.render(256);
    assert_eq!(manager.node(counter).unwrap().runs, 4);
    assert_eq!(output[0], generate_integer_staircase(256));
    assert_eq!(output[0], output[1]);
}

#[test]
fn test_chain_routes_signal() {
    let mut manager = test_manager();
    let format = manager.format();

    let signal = manager.add_node(SignalNode::new(format, vec![1.0; 128]));
    let gain = manager.add_node(GainNode::new(format, 0.5));
    let filter = manager.add_node(FilterNode::new(format, FilterMode::LowPass, 1000.0));
    let out = manager.add_root_node(OutputNode::new(format, 0));
    cantus::core::chain!(manager, signal, gain, filter, out).unwrap();

    assert_eq!(manager.input_source(out, 0), Some(filter.output(0)));
    let output = manager.render(128);
    assert_has_audio(&output[0], 0.1);
    // Lowpass settles towards the DC level.
    assert!((output[0][127] - 0.5).abs() < 0.05);
}

#[test]
fn test_fan_in_mix() {
    let mut manager = test_manager();
    let format = manager.format();

    let a = manager.add_node(SignalNode::new(format, vec![0.25; 64]));
    let b = manager.add_node(SignalNode::new(format, vec![0.5; 64]));
    let mix = manager.add_node(MixNode::new(format, 2));
    let out = manager.add_root_node(OutputNode::new(format, 0));
    manager.connect(a.output(0), mix, 0).unwrap();
    manager.connect(b.output(0), mix, 1).unwrap();
    manager.connect(mix.output(0), out, 0).unwrap();

    let output = manager.render(64);
    assert!(signals_approx_equal(&output[0], &[0.75; 64], FLOAT_EPSILON));
}

#[test]
fn test_connect_rejects_bad_pins() {
    let mut manager = test_manager();
    let format = manager.format();

    let signal = manager.add_node(SignalNode::new(format, Vec::new()));
    let out = manager.add_root_node(OutputNode::new(format, 0));

    assert!(matches!(
        manager.connect(signal.output(3), out, 0),
        Err(cantus::core::Error::PinOutOfRange { .. })
    ));
    assert!(matches!(
        manager.connect(signal.output(0), out, 1),
        Err(cantus::core::Error::PinOutOfRange { .. })
    ));
    assert!(manager.remove_node(signal));
    assert!(matches!(
        manager.connect(signal.output(0), out, 0),
        Err(cantus::core::Error::NodeNotFound(_))
    ));
}

#[test]
fn test_disconnect_silences_downstream() {
    let mut manager = test_manager();
    let format = manager.format();

    let signal = manager.add_node(SignalNode::new(format, vec![1.0; 256]));
    let out = manager.add_root_node(OutputNode::new(format, 0));
    manager.connect(signal.output(0), out, 0).unwrap();

    assert_eq!(manager.render(64)[0], vec![1.0; 64]);
    manager.disconnect(out, 0).unwrap();
    assert_silence(&manager.render(64)[0], 0.0);
}

#[test]
fn test_device_input_passthrough() {
    let mut manager = test_manager();
    manager.set_input_channel_count(1);
    let format = manager.format();

    let input = manager.add_node(InputNode::new(format, 0));
    let out = manager.add_root_node(OutputNode::new(format, 1));
    manager.connect(input.output(0), out, 0).unwrap();

    let signal = generate_noise(512, 7);
    let output = process_mono(&mut manager, &signal);
    assert_eq!(output[1], signal);
    assert_silence(&output[0], 0.0);
}

#[test]
fn test_multichannel_group() {
    let mut manager = test_manager();
    manager.set_input_channel_count(2);
    let format = manager.format();

    let inputs = MultiChannel::new(&mut manager, 2, |channel, format| {
        InputNode::new(format, channel)
    });
    let gains = MultiChannel::new(&mut manager, 2, |_, format| GainNode::new(format, 2.0));
    let outputs = MultiChannel::new(&mut manager, 2, |channel, format| {
        OutputNode::new(format, channel)
    });
    outputs.register_roots(&mut manager);
    gains.connect(&mut manager, &inputs).unwrap();
    outputs.connect(&mut manager, &gains).unwrap();
    assert_eq!(format.block_size, TEST_BLOCK_SIZE);

    let left = vec![0.25f32; 64];
    let right = vec![-0.5f32; 64];
    let mut out_left = vec![0.0f32; 64];
    let mut out_right = vec![0.0f32; 64];
    manager.process(
        &[left.as_slice(), right.as_slice()],
        &mut [out_left.as_mut_slice(), out_right.as_mut_slice()],
        64,
    );
    assert_eq!(out_left, vec![0.5; 64]);
    assert_eq!(out_right, vec![-1.0; 64]);
}
