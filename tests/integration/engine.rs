//! Engine integration tests
//!
//! Edits made through the engine are queued on the control side and must only
//! become visible once the manager processes.

use crate::helpers::*;
use cantus::prelude::*;
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn test_engine_defaults() {
    let (engine, manager) = test_engine();

    assert_eq!(engine.sample_rate(), TEST_SAMPLE_RATE);
    assert_eq!(engine.format().block_size, TEST_BLOCK_SIZE);
    assert_eq!(engine.config().buffer_size, 512);
    assert_eq!(manager.output_channel_count(), 2);
    assert_eq!(manager.input_channel_count(), 0);
    assert!(engine.worker().is_running());
}

#[test]
fn test_invalid_block_size_rejected() {
    let result = Engine::builder()
        .buffer_size(512)
        .internal_buffer_size(100)
        .build();

    assert!(matches!(
        result,
        Err(Error::Core(cantus::core::Error::InvalidConfig(_)))
    ));
}

#[test]
fn test_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audio.toml");
    std::fs::write(
        &path,
        "sample_rate = 48000.0\ninternal_buffer_size = 32\noutput_channels = 4\n",
    )
    .unwrap();

    let (engine, manager) = Engine::builder().config_file(&path).unwrap().build().unwrap();
    assert_eq!(engine.sample_rate(), 48000.0);
    assert_eq!(manager.internal_buffer_size(), 32);
    assert_eq!(manager.output_channel_count(), 4);
}

#[test]
fn test_missing_config_file() {
    let result = Engine::builder().config_file("/no/such/config.toml");
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_edits_apply_on_next_process() {
    let (engine, mut manager) = test_engine();
    let format = engine.format();

    let signal = engine.add_node(SignalNode::new(format, vec![0.5; 64]));
    let out = engine.add_root_node(OutputNode::new(format, 1));
    engine.connect(signal.output(0), &out, 0);
    assert_eq!(manager.node_count(), 0);

    let output = manager.render(64);
    assert_eq!(manager.node_count(), 2);
    assert_silence(&output[0], 0.0);
    assert_eq!(output[1], vec![0.5; 64]);
}

#[test]
fn test_node_owner_drop_removes_node() {
    let (engine, mut manager) = test_engine();
    let format = engine.format();

    let out = engine.add_root_node(OutputNode::new(format, 0));
    manager.render(64);
    assert_eq!(manager.node_count(), 1);
    assert_eq!(manager.root_count(), 1);

    drop(out);
    manager.render(64);
    assert_eq!(manager.node_count(), 0);
    assert_eq!(manager.root_count(), 0);
}

#[test]
fn test_update_reaches_node() {
    let (engine, mut manager) = test_engine();
    let format = engine.format();

    let signal = engine.add_node(SignalNode::new(format, vec![1.0; 128]));
    let gain = engine.add_node(GainNode::new(format, 1.0));
    let out = engine.add_root_node(OutputNode::new(format, 0));
    engine.connect(signal.output(0), &gain, 0);
    engine.connect(gain.output(0), &out, 0);

    assert_eq!(manager.render(64)[0], vec![1.0; 64]);
    gain.update(|node| node.set_gain(0.25));
    assert_eq!(manager.render(64)[0], vec![0.25; 64]);
}

#[test]
fn test_tasks_keep_per_thread_order() {
    let (engine, mut manager) = test_engine();
    let log = Arc::new(Mutex::new(Vec::new()));

    let threads: Vec<_> = (0..2)
        .map(|thread_index| {
            let handle = engine.handle().clone();
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for i in 0..100 {
                    let log = Arc::clone(&log);
                    handle.enqueue_task(move |_| log.lock().unwrap().push((thread_index, i)));
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    manager.render(64);
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 200);
    for thread_index in 0..2 {
        let order: Vec<_> = log
            .iter()
            .filter(|(t, _)| *t == thread_index)
            .map(|&(_, i)| i)
            .collect();
        assert_eq!(order, (0..100).collect::<Vec<_>>());
    }
}

#[test]
fn test_shutdown_stops_worker() {
    let (engine, _manager) = test_engine();
    let worker_running = engine.worker().is_running();
    engine.shutdown();
    assert!(worker_running);
}
