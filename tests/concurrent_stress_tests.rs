//! Concurrent stress tests with the client and renderer on separate threads
//! and separate mappings of the same region

use std::{
    sync::{Arc, Barrier},
    thread,
    time::{Duration, Instant},
};

use framebridge::{
    BridgeConfig, ClientBridge, InputEvent, RegionConfig, RendererBridge, WaitPolicy,
};
use tempfile::TempDir;

#[cfg(test)]
mod concurrent_stress_tests {
    use super::*;

    const DEADLINE: Duration = Duration::from_secs(30);

    fn session(temp_dir: &TempDir, name: &str) -> (ClientBridge, RendererBridge) {
        let config = BridgeConfig::new(name)
            .with_region(
                RegionConfig::new(name)
                    .with_file_path(temp_dir.path().join(format!("{}.shm", name))),
            )
            .with_wait_policy(WaitPolicy::default().with_timeout(Some(Duration::from_secs(10))));
        let client = ClientBridge::init(&config).unwrap();
        let renderer = RendererBridge::init(&config).unwrap();
        (client, renderer)
    }

    fn scene_for(frame: u32) -> Vec<u8> {
        vec![(frame % 251) as u8; 256 + (frame as usize % 769)]
    }

    /// Test: frames published as fast as possible arrive intact and in order
    #[test]
    fn stress_frame_handover() {
        let temp_dir = TempDir::new().unwrap();
        let (mut client, mut renderer) = session(&temp_dir, "frames");
        let frame_count = 2_000u32;
        let barrier = Arc::new(Barrier::new(2));

        let producer_barrier = barrier.clone();
        let producer = thread::spawn(move || {
            producer_barrier.wait();
            let mut last_id = 0;
            for frame in 1..=frame_count {
                let header = client
                    .publish_frame(&scene_for(frame), &frame.to_le_bytes())
                    .unwrap();
                assert!(header.frame_id > last_id);
                last_id = header.frame_id;
            }
            last_id
        });

        let consumer = thread::spawn(move || {
            barrier.wait();
            let started = Instant::now();
            let mut seen = Vec::new();
            let mut last_id = 0u32;

            while last_id != frame_count {
                assert!(started.elapsed() < DEADLINE, "consumer stalled at frame {}", last_id);
                let frame = match renderer.acquire_frame().unwrap() {
                    Some(frame) => frame,
                    None => {
                        thread::yield_now();
                        continue;
                    }
                };

                let id = frame.frame_id();
                assert!(id > last_id, "frame {} after {}", id, last_id);

                // The ui payload carries the publish index the scene was built from.
                let ui = frame.ui().unwrap();
                let index = u32::from_le_bytes([ui[0], ui[1], ui[2], ui[3]]);
                assert_eq!(frame.scene().unwrap(), scene_for(index).as_slice());

                last_id = id;
                seen.push(id);
            }
            seen
        });

        let last_published = producer.join().unwrap();
        let seen = consumer.join().unwrap();

        assert_eq!(last_published, frame_count);
        assert_eq!(seen.last().copied(), Some(frame_count));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    /// Test: every input event survives when the producer retries on a full queue
    #[test]
    fn stress_input_queue_ordering() {
        let temp_dir = TempDir::new().unwrap();
        let (mut client, mut renderer) = session(&temp_dir, "input");
        let event_count = 50_000u32;

        let producer = thread::spawn(move || {
            let started = Instant::now();
            for code in 0..event_count {
                let event = InputEvent::key_down(code);
                while !renderer.push_input(&event).unwrap() {
                    assert!(started.elapsed() < DEADLINE, "producer stalled at {}", code);
                    thread::yield_now();
                }
            }
            renderer.endpoints().unwrap().input.pushed()
        });

        let consumer = thread::spawn(move || {
            let started = Instant::now();
            let mut expected = 0u32;
            while expected < event_count {
                assert!(started.elapsed() < DEADLINE, "consumer stalled at {}", expected);
                match client.poll_input().unwrap() {
                    Some(event) => {
                        assert_eq!(event.key_code, expected);
                        expected += 1;
                    }
                    None => thread::yield_now(),
                }
            }
            expected
        });

        let pushed = producer.join().unwrap();
        let received = consumer.join().unwrap();
        assert_eq!(pushed, event_count as u64);
        assert_eq!(received, event_count);
    }
}
