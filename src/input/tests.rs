//! Tests for the shared memory input queue

#[cfg(target_os = "linux")]
mod tests {
    use std::sync::{atomic::Ordering, Arc};

    use crate::{
        input::{InputConsumer, InputEvent, InputKind, InputProducer},
        layout::{input_event_offset, BridgeRegion, EVENT_KIND, INPUT_QUEUE_CAPACITY},
        memory::{BackingType, RegionConfig, SharedMemoryRegion},
        sync::WaitPolicy,
        BridgeError,
    };

    fn queue() -> (Arc<BridgeRegion>, InputProducer, InputConsumer) {
        let config = RegionConfig::new("input").with_backing_type(BackingType::MemFd);
        let mapping = Arc::new(SharedMemoryRegion::open(&config).unwrap());
        let region = Arc::new(BridgeRegion::attach(mapping, &WaitPolicy::default()).unwrap());
        (
            region.clone(),
            InputProducer::new(region.clone()),
            InputConsumer::new(region),
        )
    }

    #[test]
    fn test_fifo_order() {
        let (_region, mut producer, mut consumer) = queue();
        let events = [
            InputEvent::key_down(87),
            InputEvent::mouse_move(10.0, 20.0),
            InputEvent::mouse_down(1, 10.0, 20.0),
            InputEvent::mouse_up(1, 11.0, 21.0),
            InputEvent::key_up(87),
        ];
        for event in &events {
            assert!(producer.push(event).unwrap());
        }
        assert_eq!(consumer.len().unwrap(), events.len());

        for expected in &events {
            assert_eq!(consumer.poll().unwrap().as_ref(), Some(expected));
        }
        assert_eq!(consumer.poll().unwrap(), None);
    }

    #[test]
    fn test_empty_poll_has_no_side_effects() {
        let (region, _producer, mut consumer) = queue();
        assert_eq!(consumer.poll().unwrap(), None);
        assert_eq!(consumer.poll().unwrap(), None);
        assert_eq!(region.input_queue_depth().unwrap(), 0);
        assert!(consumer.is_empty().unwrap());
    }

    #[test]
    fn test_overflow_drops_newest() {
        let (_region, mut producer, mut consumer) = queue();
        for i in 0..INPUT_QUEUE_CAPACITY as u32 {
            assert!(producer.push(&InputEvent::key_down(i)).unwrap());
        }
        assert!(!producer.push(&InputEvent::key_down(9999)).unwrap());
        assert!(matches!(
            producer.try_push(&InputEvent::key_down(9999)),
            Err(BridgeError::QueueFull { capacity: 256 })
        ));
        assert_eq!(producer.dropped(), 2);

        let received: Vec<u32> = consumer.drain().map(|e| e.key_code).collect();
        assert_eq!(received, (0..INPUT_QUEUE_CAPACITY as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_counters_wrap_around() {
        let (_region, mut producer, mut consumer) = queue();
        for round in 0..5u32 {
            for i in 0..200u32 {
                assert!(producer.push(&InputEvent::key_down(round * 1000 + i)).unwrap());
            }
            for i in 0..200u32 {
                let event = consumer.poll().unwrap().unwrap();
                assert_eq!(event.key_code, round * 1000 + i);
            }
        }
        assert_eq!(producer.pushed(), 1000);
        assert_eq!(producer.available_space().unwrap(), INPUT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_unknown_tag_skipped() {
        let (region, mut producer, mut consumer) = queue();
        producer.push(&InputEvent::key_down(1)).unwrap();
        producer.push(&InputEvent::key_down(2)).unwrap();

        region
            .view()
            .store_u32(input_event_offset(0) + EVENT_KIND, 77, Ordering::Relaxed)
            .unwrap();

        let event = consumer.poll().unwrap().unwrap();
        assert_eq!(event.kind, InputKind::KeyDown);
        assert_eq!(event.key_code, 2);
        assert_eq!(consumer.skipped(), 1);
        assert_eq!(consumer.poll().unwrap(), None);
    }
}
