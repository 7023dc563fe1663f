//! Benchmarks for wrapper lookup and container conversion.
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use std::hint::black_box;
use std::ptr::NonNull;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use indexmap::IndexMap;
use scenebridge::prelude::*;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

struct Node {
    _tag: usize,
}

static NODE: ClassDescriptor = ClassDescriptor::root("Node");

impl NativeClass for Node {
    fn descriptor() -> &'static ClassDescriptor {
        &NODE
    }
}

fn make_nodes(count: usize) -> Vec<Box<Node>> {
    (0..count).map(|_tag| Box::new(Node { _tag })).collect()
}

fn proxy_lookup_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("proxy_lookup");

    for count in [16usize, 256, 4096] {
        let nodes = make_nodes(count);
        let ptrs: Vec<NonNull<Node>> = nodes.iter().map(|n| NonNull::from(&**n)).collect();
        let mut bridge = Bridge::with_heap(BridgeConfig::default());
        for ptr in &ptrs {
            bridge.wrap(ptr).unwrap();
        }

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("existing", count), &ptrs, |b, ptrs| {
            b.iter(|| {
                for ptr in ptrs {
                    black_box(bridge.wrap(ptr).unwrap());
                }
                end_profiling_frame();
            });
        });
    }

    group.finish();
}

fn sequence_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("sequence");

    for count in [16usize, 256, 4096] {
        let nodes = make_nodes(count);
        let ptrs: Vec<NonNull<Node>> = nodes.iter().map(|n| NonNull::from(&**n)).collect();
        let mut bridge = Bridge::with_heap(BridgeConfig::default());
        let value = bridge.sequence_to_script(&ptrs).unwrap();
        if let Some(array) = value.as_object() {
            bridge.runtime_mut().root(array);
        }

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("from_script", count), &value, |b, value| {
            b.iter(|| {
                let out: Vec<NonNull<Node>> = bridge.sequence_from_script(black_box(value)).unwrap();
                black_box(out);
                end_profiling_frame();
            });
        });
    }

    group.finish();
}

fn map_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("map");

    for count in [16usize, 256] {
        let nodes = make_nodes(count);
        let entries: Vec<(String, NonNull<Node>)> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (format!("node{}", i), NonNull::from(&**n)))
            .collect();
        let mut bridge = Bridge::with_heap(BridgeConfig::default());
        let value = bridge
            .map_to_script(entries.iter().map(|(k, v)| (k.as_str(), v)))
            .unwrap();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("from_script", count), &value, |b, value| {
            b.iter(|| {
                let out: IndexMap<String, NonNull<Node>> = bridge.map_from_script(black_box(value)).unwrap();
                black_box(out);
                end_profiling_frame();
            });
        });
    }

    group.finish();
}

fn compound_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("compound");
    let mut bridge = Bridge::with_heap(BridgeConfig::default());
    let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
    let value = bridge.to_script(&rect).unwrap();

    group.bench_function("rect_from_script", |b| {
        b.iter(|| black_box(bridge.from_script::<Rect>(black_box(&value)).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    proxy_lookup_benchmarks,
    sequence_benchmarks,
    map_benchmarks,
    compound_benchmarks
);

criterion_main!(benches);
