use criterion::{
    criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use framebridge::{
    layout::INPUT_QUEUE_CAPACITY, BridgeConfig, ClientBridge, InputEvent, RegionConfig,
    RendererBridge,
};
use std::{thread, time::Duration};
use tempfile::TempDir;

fn session(temp_dir: &TempDir, name: &str) -> (ClientBridge, RendererBridge) {
    let config = BridgeConfig::new(name).with_region(
        RegionConfig::new(name).with_file_path(temp_dir.path().join(format!("{}.shm", name))),
    );
    let client = ClientBridge::init(&config).unwrap();
    let renderer = RendererBridge::init(&config).unwrap();
    (client, renderer)
}

fn benchmark_push_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("InputQueue_SingleThreaded");
    let temp_dir = TempDir::new().unwrap();
    let (mut client, mut renderer) = session(&temp_dir, "bench_push_poll");

    for batch in [1usize, 32, INPUT_QUEUE_CAPACITY].iter() {
        group.throughput(Throughput::Elements(*batch as u64));
        group.bench_with_input(BenchmarkId::new("push_poll", batch), batch, |b, &batch| {
            b.iter(|| {
                for i in 0..batch {
                    renderer
                        .try_push_input(&InputEvent::key_down(i as u32))
                        .unwrap();
                }
                for _ in 0..batch {
                    client.poll_input().unwrap().unwrap();
                }
            });
        });
    }

    group.bench_function("poll_empty", |b| {
        b.iter(|| client.poll_input().unwrap());
    });

    group.finish();
}

fn benchmark_cross_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("InputQueue_CrossThread");
    group.measurement_time(Duration::from_secs(5));
    let event_count = 10_000u32;
    group.throughput(Throughput::Elements(event_count as u64));

    group.bench_function("mouse_move_stream", |b| {
        b.iter_batched(
            || {
                let temp_dir = TempDir::new().unwrap();
                let (client, renderer) = session(&temp_dir, "bench_stream");
                (temp_dir, client, renderer)
            },
            |(_temp_dir, mut client, mut renderer)| {
                let producer = thread::spawn(move || {
                    for i in 0..event_count {
                        let event = InputEvent::mouse_move(i as f32, 0.0);
                        while !renderer.push_input(&event).unwrap() {
                            thread::yield_now();
                        }
                    }
                });

                let mut received = 0;
                while received < event_count {
                    match client.poll_input().unwrap() {
                        Some(_) => received += 1,
                        None => thread::yield_now(),
                    }
                }
                producer.join().unwrap();
            },
            BatchSize::PerIteration,
        );
    });

    group.finish();
}

criterion_group!(benches, benchmark_push_poll, benchmark_cross_thread);
criterion_main!(benches);
