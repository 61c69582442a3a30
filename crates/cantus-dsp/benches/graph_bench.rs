use cantus_core::{NodeManager, OutputNode};
use cantus_dsp::{FilterMode, FilterNode, GainNode, MixNode, OscillatorNode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// `voices` oscillator -> filter -> gain chains summed into a stereo output.
fn build_graph(voices: usize) -> NodeManager {
    let mut manager = NodeManager::new(48000.0, 64);
    let format = manager.format();
    let mix = manager.add_node(MixNode::new(format, voices));

    for voice in 0..voices {
        let osc = manager.add_node(OscillatorNode::sine(format));
        if let Some(osc) = manager.node_mut(osc) {
            osc.set_frequency(110.0 * (voice + 1) as f32);
        }
        let filter = manager.add_node(FilterNode::new(format, FilterMode::LowPass, 2000.0));
        let gain = manager.add_node(GainNode::new(format, 1.0 / voices as f32));
        cantus_core::chain!(manager, osc, filter, gain).unwrap();
        manager.connect(gain.output(0), mix, voice).unwrap();
    }

    for channel in 0..2 {
        let output = manager.add_root_node(OutputNode::new(format, channel));
        manager.connect(mix.output(0), output, 0).unwrap();
    }
    manager
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_manager_process");
    for voices in [1usize, 16, 64] {
        let mut manager = build_graph(voices);
        let mut left = vec![0.0f32; 512];
        let mut right = vec![0.0f32; 512];
        group.bench_with_input(BenchmarkId::from_parameter(voices), &voices, |b, _| {
            b.iter(|| {
                manager.process(
                    &[],
                    &mut [left.as_mut_slice(), right.as_mut_slice()],
                    black_box(512),
                );
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_process);
criterion_main!(benches);
