#[cfg(test)]
mod scheduler_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crossbeam::channel::unbounded;
    use river_core::config::QueueConfig;
    use river_core::queue::IngestionQueue;
    use river_core::scheduler::{
        DrainPolicy, FixedDeadline, IdleDeadline, LoopScheduler, ManualScheduler, Scheduler, SliceDeadline,
    };
    use river_core::telemetry::TelemetryRecorder;

    // ------------------------------------------------------------
    // Deadlines and policy
    // ------------------------------------------------------------

    #[test]
    fn fixed_deadlines() {
        assert!(FixedDeadline::generous().time_remaining() > Duration::from_millis(1));
        assert_eq!(FixedDeadline::exhausted().time_remaining(), Duration::ZERO);
        assert!(FixedDeadline::forced().did_timeout());
        assert!(!FixedDeadline::generous().did_timeout());
    }

    #[test]
    fn slice_deadline_counts_down() {
        let d = SliceDeadline::new(Duration::from_millis(50), false);
        assert!(d.time_remaining() <= Duration::from_millis(50));
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(d.time_remaining(), Duration::ZERO);
    }

    #[test]
    fn drain_policy_bounds() {
        let policy = DrainPolicy::new(15, Duration::from_millis(5));
        let generous = FixedDeadline::generous();

        assert!(policy.should_continue(0, Duration::ZERO, &generous));
        assert!(!policy.should_continue(15, Duration::ZERO, &generous), "batch bound");
        assert!(!policy.should_continue(1, Duration::from_millis(5), &generous), "time slice");
        assert!(!policy.should_continue(0, Duration::ZERO, &FixedDeadline::exhausted()), "host budget");
        assert!(policy.should_continue(0, Duration::ZERO, &FixedDeadline::forced()), "timed out runs anyway");
    }

    // ------------------------------------------------------------
    // ManualScheduler
    // ------------------------------------------------------------

    #[test]
    fn manual_scheduler_runs_in_request_order() {
        let sched = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let o = order.clone();
            sched.request_idle(Duration::from_millis(100), Box::new(move |_| o.lock().unwrap().push(i)));
        }
        assert_eq!(sched.pending_idle(), 3);
        assert_eq!(sched.next_idle_timeout(), Some(Duration::from_millis(100)));

        assert!(sched.run_next_idle());
        assert_eq!(*order.lock().unwrap(), vec![0]);
        assert_eq!(sched.run_until_idle(), 2);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert!(!sched.run_next_idle());
    }

    #[test]
    fn task_scheduled_from_a_task_waits_its_turn() {
        let sched = Arc::new(ManualScheduler::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let s = sched.clone();
        let o = order.clone();
        sched.defer(Box::new(move || {
            o.lock().unwrap().push("outer");
            let o = o.clone();
            s.defer(Box::new(move || o.lock().unwrap().push("inner")));
        }));

        assert_eq!(sched.run_deferred(), 2);
        assert_eq!(*order.lock().unwrap(), vec!["outer", "inner"]);
        assert_eq!(sched.pending_deferred(), 0);
    }

    // ------------------------------------------------------------
    // LoopScheduler
    // ------------------------------------------------------------

    #[test]
    fn loop_scheduler_runs_deferred_and_idle_on_agent_thread() {
        let sched = LoopScheduler::spawn().unwrap();
        let (tx, rx) = unbounded();

        let t = tx.clone();
        sched.defer(Box::new(move || {
            let _ = t.send(("deferred", std::thread::current().name().map(String::from)));
        }));
        sched.request_idle(
            Duration::from_millis(500),
            Box::new(move |_| {
                let _ = tx.send(("idle", std::thread::current().name().map(String::from)));
            }),
        );

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first, ("deferred", Some("river-agent".to_string())));
        assert_eq!(second.0, "idle");
        assert_eq!(second.1.as_deref(), Some("river-agent"));
        sched.shutdown();
    }

    #[test]
    fn loop_scheduler_forces_idle_task_at_timeout() {
        // Never quiet for long enough: idle_after is far beyond the timeout.
        let sched = LoopScheduler::spawn_with(Duration::from_secs(10)).unwrap();
        let (tx, rx) = unbounded();

        sched.request_idle(
            Duration::from_millis(20),
            Box::new(move |deadline: &dyn IdleDeadline| {
                let _ = tx.send(deadline.did_timeout());
            }),
        );
        assert!(rx.recv_timeout(Duration::from_secs(2)).unwrap());
    }

    #[test]
    fn loop_scheduler_drains_queue_end_to_end() {
        let sched: Arc<dyn Scheduler> = Arc::new(LoopScheduler::spawn().unwrap());
        let queue = IngestionQueue::new(&QueueConfig::default(), sched, TelemetryRecorder::new());
        let (tx, rx) = unbounded();

        queue.connect(Arc::new(move |item: u32| -> anyhow::Result<()> {
            tx.send(item)?;
            Ok(())
        }));
        queue.start();
        for i in 0..40 {
            queue.enqueue(i);
        }

        let got: Vec<u32> = (0..40).map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap()).collect();
        assert_eq!(got, (0..40).collect::<Vec<_>>());
        assert!(queue.stats().cycles >= 2, "15 per cycle at most");
    }
}
