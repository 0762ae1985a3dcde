#[cfg(test)]
mod queue_tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use anyhow::anyhow;
    use river_core::config::QueueConfig;
    use river_core::queue::{Forward, IngestionQueue};
    use river_core::scheduler::{FixedDeadline, ManualScheduler};
    use river_core::telemetry::TelemetryRecorder;

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------

    fn config(max_batch: usize) -> QueueConfig {
        // Generous slice so only the item bound matters.
        QueueConfig { max_batch, time_slice_ms: 1_000, timeout_ms: 2_000 }
    }

    fn queue_with(cfg: &QueueConfig) -> (Arc<ManualScheduler>, IngestionQueue<u32>) {
        let sched = Arc::new(ManualScheduler::new());
        let queue = IngestionQueue::new(cfg, sched.clone(), TelemetryRecorder::new());
        (sched, queue)
    }

    fn collector(seen: &Arc<Mutex<Vec<u32>>>) -> Forward<u32> {
        let seen = seen.clone();
        Arc::new(move |item| {
            seen.lock().unwrap().push(item);
            Ok(())
        })
    }

    fn drained(seen: &Arc<Mutex<Vec<u32>>>) -> Vec<u32> {
        seen.lock().unwrap().clone()
    }

    // ------------------------------------------------------------
    // Batching
    // ------------------------------------------------------------

    #[test]
    fn twenty_events_drain_as_fifteen_then_five() {
        let (sched, queue) = queue_with(&config(15));
        let seen = Arc::new(Mutex::new(Vec::new()));
        queue.connect(collector(&seen));

        for i in 0..20 {
            queue.enqueue(i);
        }
        queue.start();
        assert_eq!(sched.pending_idle(), 1);

        assert!(sched.run_next_idle_with(&FixedDeadline::generous()));
        assert_eq!(drained(&seen).len(), 15);
        assert_eq!(queue.len(), 5);
        assert_eq!(sched.pending_idle(), 1, "remaining items need a second cycle");

        assert!(sched.run_next_idle_with(&FixedDeadline::generous()));
        assert_eq!(drained(&seen), (0..20).collect::<Vec<_>>());
        assert!(queue.is_empty());
        assert!(!queue.is_scheduled());
        assert_eq!(sched.pending_idle(), 0);

        let stats = queue.stats();
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.forwarded, 20);
    }

    #[test]
    fn reconfigured_budget_applies_to_buffered_items() {
        let (sched, queue) = queue_with(&config(15));
        let seen = Arc::new(Mutex::new(Vec::new()));
        queue.connect(collector(&seen));
        for i in 0..5 {
            queue.enqueue(i);
        }

        queue.configure(&QueueConfig { max_batch: 2, time_slice_ms: 1_000, timeout_ms: 300 });
        assert_eq!(queue.policy().max_batch, 2);

        queue.start();
        assert_eq!(sched.next_idle_timeout(), Some(Duration::from_millis(300)));
        assert!(sched.run_next_idle_with(&FixedDeadline::generous()));
        assert_eq!(drained(&seen), vec![0, 1]);

        sched.run_until_idle();
        assert_eq!(drained(&seen), (0..5).collect::<Vec<_>>());
        assert_eq!(queue.stats().cycles, 3);
    }

    #[test]
    fn nothing_is_lost_or_forwarded_before_start() {
        let (sched, queue) = queue_with(&config(15));
        let seen = Arc::new(Mutex::new(Vec::new()));
        queue.connect(collector(&seen));

        for i in 0..100 {
            queue.enqueue(i);
        }
        assert_eq!(sched.idle_requests(), 0);
        assert_eq!(sched.run_until_idle(), 0);
        assert!(drained(&seen).is_empty());
        assert_eq!(queue.len(), 100);

        queue.start();
        sched.run_until_idle();
        assert_eq!(drained(&seen), (0..100).collect::<Vec<_>>());
    }

    // ------------------------------------------------------------
    // Single flight
    // ------------------------------------------------------------

    #[test]
    fn only_one_cycle_is_requested_at_a_time() {
        let (sched, queue) = queue_with(&config(15));
        let seen = Arc::new(Mutex::new(Vec::new()));
        queue.connect(collector(&seen));
        queue.start();

        for i in 0..10 {
            queue.enqueue(i);
        }
        assert_eq!(sched.idle_requests(), 1);
        assert!(queue.is_scheduled());

        sched.run_until_idle();
        assert!(!queue.is_scheduled());

        queue.enqueue(10);
        assert_eq!(sched.idle_requests(), 2, "empty queue re-arms on next enqueue");
        sched.run_until_idle();

        assert_eq!(drained(&seen).len(), 11);
        assert_eq!(queue.stats().max_in_flight, 1);
    }

    #[test]
    fn consumer_may_enqueue_reentrantly() {
        let (sched, queue) = queue_with(&config(15));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let q = queue.clone();
        let s = seen.clone();
        queue.connect(Arc::new(move |item: u32| {
            s.lock().unwrap().push(item);
            if item < 3 {
                q.enqueue(item + 10);
            }
            Ok(())
        }));

        queue.start();
        queue.enqueue(0);
        queue.enqueue(1);
        sched.run_until_idle();

        assert_eq!(drained(&seen), vec![0, 1, 10, 11]);
        assert_eq!(sched.idle_requests(), 1);
    }

    // ------------------------------------------------------------
    // Cycle bounds
    // ------------------------------------------------------------

    #[test]
    fn exhausted_host_slice_defers_work() {
        let (sched, queue) = queue_with(&config(15));
        let seen = Arc::new(Mutex::new(Vec::new()));
        queue.connect(collector(&seen));
        queue.start();
        queue.enqueue(1);

        assert!(sched.run_next_idle_with(&FixedDeadline::exhausted()));
        assert!(drained(&seen).is_empty());
        assert!(queue.is_scheduled());
        assert_eq!(sched.pending_idle(), 1);

        // A timed-out request runs regardless of remaining time.
        assert!(sched.expire_next_idle());
        assert_eq!(drained(&seen), vec![1]);
    }

    #[test]
    fn time_slice_ends_a_cycle_early() {
        let cfg = QueueConfig { max_batch: 100, time_slice_ms: 5, timeout_ms: 2_000 };
        let (sched, queue) = queue_with(&cfg);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        queue.connect(Arc::new(move |item: u32| {
            thread::sleep(Duration::from_millis(3));
            s.lock().unwrap().push(item);
            Ok(())
        }));

        for i in 0..10 {
            queue.enqueue(i);
        }
        queue.start();
        sched.run_next_idle_with(&FixedDeadline::generous());

        let first = drained(&seen).len();
        assert!((1..=3).contains(&first), "first cycle forwarded {first}");

        sched.run_until_idle();
        assert_eq!(drained(&seen).len(), 10);
    }

    // ------------------------------------------------------------
    // Failure containment
    // ------------------------------------------------------------

    #[test]
    fn failing_consumer_does_not_stop_the_drain() {
        let (sched, queue) = queue_with(&config(15));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        queue.connect(Arc::new(move |item: u32| {
            if item == 4 {
                panic!("consumer blew up on {item}");
            }
            if item % 2 == 1 {
                return Err(anyhow!("odd item {item} rejected"));
            }
            s.lock().unwrap().push(item);
            Ok(())
        }));

        queue.start();
        for i in 0..8 {
            queue.enqueue(i);
        }
        sched.run_until_idle();

        assert_eq!(drained(&seen), vec![0, 2, 6]);
        let stats = queue.stats();
        assert_eq!(stats.forwarded, 3, "only accepted items count");
        assert_eq!(stats.forward_failures, 5);
    }

    #[test]
    fn start_without_consumer_keeps_items() {
        let (sched, queue) = queue_with(&config(15));
        queue.enqueue(1);
        queue.start();
        sched.run_until_idle();
        assert_eq!(queue.len(), 1);
        assert!(!queue.is_scheduled());

        let seen = Arc::new(Mutex::new(Vec::new()));
        queue.connect(collector(&seen));
        queue.enqueue(2);
        sched.run_until_idle();
        assert_eq!(drained(&seen), vec![1, 2]);
    }

    // ------------------------------------------------------------
    // Stop
    // ------------------------------------------------------------

    #[test]
    fn stop_discards_pending_and_invalidates_scheduled_cycle() {
        let (sched, queue) = queue_with(&config(15));
        let seen = Arc::new(Mutex::new(Vec::new()));
        queue.connect(collector(&seen));
        queue.start();

        for i in 0..5 {
            queue.enqueue(i);
        }
        queue.stop();
        assert!(queue.is_empty());
        assert!(!queue.is_started());
        assert!(!queue.is_scheduled());

        sched.run_until_idle();
        assert!(drained(&seen).is_empty());

        queue.start();
        queue.enqueue(42);
        sched.run_until_idle();
        assert_eq!(drained(&seen), vec![42]);
    }

    #[test]
    fn stop_mid_cycle_finishes_current_item_only() {
        let (sched, queue) = queue_with(&config(15));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let q = queue.clone();
        let s = seen.clone();
        queue.connect(Arc::new(move |item: u32| {
            s.lock().unwrap().push(item);
            if item == 2 {
                q.stop();
            }
            Ok(())
        }));

        for i in 0..6 {
            queue.enqueue(i);
        }
        queue.start();
        sched.run_until_idle();

        assert_eq!(drained(&seen), vec![0, 1, 2]);
        assert!(queue.is_empty());
        assert_eq!(sched.pending_idle(), 0);
    }

    #[test]
    fn idle_request_carries_configured_timeout() {
        let cfg = QueueConfig { max_batch: 15, time_slice_ms: 5, timeout_ms: 750 };
        let (sched, queue) = queue_with(&cfg);
        queue.start();
        queue.enqueue(1);
        assert_eq!(sched.next_idle_timeout(), Some(Duration::from_millis(750)));
    }
}
