//! Deterministic signal tests
//!
//! Tests that verify exact or near-exact sample values through passthrough and
//! simple processing chains.
//!
//! Run with:
//! ```bash
//! cargo test -p cantus --test deterministic_signal_tests
//! ```

mod helpers;

use helpers::tolerances::*;
use helpers::*;
use cantus::prelude::*;
use proptest::prelude::*;

fn sine_gain_graph(frequency: f32, gain: f32) -> NodeManager {
    let mut manager = test_manager();
    let format = manager.format();

    let mut osc = OscillatorNode::sine(format);
    osc.set_frequency(frequency);
    let osc = manager.add_node(osc);
    let gain = manager.add_node(GainNode::new(format, gain));
    let out = manager.add_root_node(OutputNode::new(format, 0));
    chain!(manager, osc, gain, out).unwrap();
    manager
}

// =============================================================================
// Oscillator and gain
// =============================================================================

/// A 440 Hz sine through a 0.5 gain matches the analytic signal.
#[test]
fn test_sine_through_gain_matches_reference() {
    let mut manager = sine_gain_graph(440.0, 0.5);
    let output = manager.render(1024);

    let reference: Vec<f32> = generate_sine(440.0, TEST_SAMPLE_RATE as f64, 1024)
        .into_iter()
        .map(|x| x * 0.5)
        .collect();
    assert!(signals_approx_equal(&output[0], &reference, PERCEPTUAL_EPSILON));
    assert!((peak(&output[0]) - 0.5).abs() < PERCEPTUAL_EPSILON);
}

/// Every block the gain output is the oscillator's own output times 0.5.
#[test]
fn test_gain_output_is_scaled_oscillator_output() {
    let mut manager = test_manager();
    let format = manager.format();

    let mut osc = OscillatorNode::sine(format);
    osc.set_frequency(440.0);
    let osc = manager.add_node(osc);
    let gain = manager.add_node(GainNode::new(format, 0.5));
    let out = manager.add_root_node(OutputNode::new(format, 0));
    chain!(manager, osc, gain, out).unwrap();

    for _ in 0..16 {
        let output = manager.render(TEST_BLOCK_SIZE);
        let source = manager.node(osc).unwrap().output.buffer().to_vec();
        let scaled = manager.node(gain).unwrap().output.buffer();
        assert_has_audio(&source, 0.1);
        for (i, (&s, &g)) in source.iter().zip(scaled).enumerate() {
            assert_eq!(g, s * 0.5, "sample {}", i);
        }
        assert_eq!(output[0].as_slice(), scaled);
    }
}

/// Two identically built graphs produce bit-identical output.
#[test]
fn test_rendering_is_deterministic() {
    let mut first = sine_gain_graph(330.0, 0.8);
    let mut second = sine_gain_graph(330.0, 0.8);

    for _ in 0..8 {
        assert_eq!(first.render(512), second.render(512));
    }
}

/// Block boundaries do not show up in the rendered signal.
#[test]
fn test_block_size_does_not_change_signal() {
    let mut coarse = sine_gain_graph(440.0, 1.0);
    let mut fine = sine_gain_graph(440.0, 1.0);
    fine.set_internal_buffer_size(16);

    let a = coarse.render(512);
    let b = fine.render(512);
    assert!(signals_approx_equal(&a[0], &b[0], FLOAT_EPSILON));
}

// =============================================================================
// Passthrough
// =============================================================================

/// Staircase through input, unity gain and output keeps every sample.
#[test]
fn test_staircase_passthrough() {
    let mut manager = test_manager();
    manager.set_input_channel_count(1);
    let format = manager.format();

    let input = manager.add_node(InputNode::new(format, 0));
    let gain = manager.add_node(GainNode::new(format, 1.0));
    let out = manager.add_root_node(OutputNode::new(format, 0));
    chain!(manager, input, gain, out).unwrap();

    let staircase = generate_integer_staircase(1024);
    let output = process_mono(&mut manager, &staircase);
    assert_eq!(output[0], staircase);
}

/// A fully wet delay with zero time passes its input through unchanged.
#[test]
fn test_zero_delay_is_identity() {
    let mut manager = test_manager();
    manager.set_input_channel_count(1);
    let format = manager.format();

    let input = manager.add_node(InputNode::new(format, 0));
    let delay = DelayNode::new(format, 0.0, 100.0);
    delay.params().set_dry_wet(1.0);
    delay.params().set_feedback(0.5);
    let delay = manager.add_node(delay);
    let out = manager.add_root_node(OutputNode::new(format, 0));
    chain!(manager, input, delay, out).unwrap();

    let signal = generate_noise(512, 42);
    let output = process_mono(&mut manager, &signal);
    assert_eq!(output[0], signal);
}

/// An impulse comes out of a 1 ms delay exactly one millisecond later.
#[test]
fn test_impulse_delay() {
    let mut manager = NodeManager::new(48000.0, 64);
    manager.set_input_channel_count(1);
    let format = manager.format();

    let input = manager.add_node(InputNode::new(format, 0));
    let delay = manager.add_node(DelayNode::new(format, 1.0, 10.0));
    let out = manager.add_root_node(OutputNode::new(format, 0));
    chain!(manager, input, delay, out).unwrap();

    let output = process_mono(&mut manager, &generate_impulse(256, 10));
    assert!(signals_approx_equal(
        &output[0],
        &generate_impulse(256, 58),
        FLOAT_EPSILON
    ));
}

proptest! {
    /// Gain scales any input sample by sample.
    #[test]
    fn prop_gain_scales_input(
        signal in prop::collection::vec(-1.0f32..1.0, 128),
        gain in 0.0f32..2.0,
    ) {
        let mut manager = test_manager();
        manager.set_input_channel_count(1);
        let format = manager.format();

        let input = manager.add_node(InputNode::new(format, 0));
        let node = manager.add_node(GainNode::new(format, gain));
        let out = manager.add_root_node(OutputNode::new(format, 0));
        chain!(manager, input, node, out).unwrap();

        let output = process_mono(&mut manager, &signal);
        let expected: Vec<f32> = signal.iter().map(|x| x * gain).collect();
        prop_assert!(signals_approx_equal(&output[0], &expected, FLOAT_EPSILON));
    }
}
