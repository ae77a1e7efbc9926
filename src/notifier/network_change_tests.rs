//! Tests for `NetworkChangeNotifier` behavior.

use super::test_fixtures::{
    Counter, MockEnumerator, ethernet_record, loopback_records, snapshot_a, snapshot_b,
    snapshot_with,
};
use super::*;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::StreamExt;

fn notifier_over(enumerator: &MockEnumerator) -> NetworkChangeNotifier<MockEnumerator> {
    NetworkChangeNotifier::new(enumerator.clone(), NotifierOptions::new()).unwrap()
}

fn count_changes<E>(notifier: &NetworkChangeNotifier<E>) -> Counter {
    let counter = Counter::new();
    let handler = counter.clone();
    notifier.on_change(move || handler.hit());
    counter
}

fn count_errors<E>(notifier: &NetworkChangeNotifier<E>) -> Counter {
    let counter = Counter::new();
    let handler = counter.clone();
    notifier.on_error(move |_| handler.hit());
    counter
}

mod construction {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn baseline_matches_current_serialization() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);

        assert_eq!(notifier.baseline(), notifier.interfaces_serialized().unwrap());
        assert_eq!(notifier.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn starts_polling_immediately() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);

        assert!(notifier.is_running());
        assert_eq!(enumerator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn uses_default_interval_and_filter() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);

        assert_eq!(notifier.poll_interval(), Duration::from_millis(1000));
        assert!(notifier.filter().matches(&loopback_records()[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn fails_fast_when_enumeration_fails() {
        let result = NetworkChangeNotifier::new(MockEnumerator::failing(), NotifierOptions::new());

        assert!(matches!(result, Err(NotifierError::Fetch(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_unschedulable_interval() {
        let result = NetworkChangeNotifier::new(
            MockEnumerator::returning(snapshot_a()),
            NotifierOptions::new().with_poll_interval(Duration::MAX),
        );

        assert!(matches!(result, Err(NotifierError::InvalidInterval { .. })));
    }

    #[test]
    fn requires_a_runtime() {
        let result =
            NetworkChangeNotifier::new(MockEnumerator::returning(snapshot_a()), NotifierOptions::new());

        assert!(matches!(result, Err(NotifierError::NoRuntime)));
    }

    #[test]
    fn with_runtime_accepts_explicit_handle() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let notifier = NetworkChangeNotifier::with_runtime(
            MockEnumerator::returning(snapshot_a()),
            NotifierOptions::new(),
            runtime.handle().clone(),
        )
        .unwrap();

        assert!(notifier.is_running());
        drop(notifier);
    }

    #[tokio::test(start_paused = true)]
    async fn debug_shows_state() {
        let notifier = notifier_over(&MockEnumerator::returning(snapshot_a()));
        let debug = format!("{notifier:?}");

        assert!(debug.contains("running: true"));
        assert!(debug.contains("listeners: 0"));
    }
}

mod filtering {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn excluding_internal_keeps_empty_group() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = NetworkChangeNotifier::new(
            enumerator,
            NotifierOptions::new().with_filter(|record| !record.internal),
        )
        .unwrap();

        let expected = format!(
            "[[],[{}]]",
            serde_json::to_string(&ethernet_record(10)).unwrap()
        );
        assert_eq!(notifier.interfaces_serialized().unwrap(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn keeping_internal_only_empties_external_group() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = NetworkChangeNotifier::new(
            enumerator,
            NotifierOptions::new().with_filter(|record| record.internal),
        )
        .unwrap();

        let expected = format!(
            "[{},[]]",
            serde_json::to_string(&loopback_records()).unwrap()
        );
        assert_eq!(notifier.interfaces_serialized().unwrap(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn changes_hidden_by_filter_are_not_reported() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = NetworkChangeNotifier::new(
            enumerator.clone(),
            NotifierOptions::new().with_filter(|record| record.internal),
        )
        .unwrap();
        let changes = count_changes(&notifier);

        enumerator.set(snapshot_b());
        sleep(Duration::from_millis(3500)).await;

        assert_eq!(changes.get(), 0);
    }
}

mod polling {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unchanged_interfaces_emit_nothing() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let changes = count_changes(&notifier);

        sleep(Duration::from_millis(5500)).await;

        assert_eq!(changes.get(), 0);
        assert_eq!(enumerator.calls(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn change_emits_exactly_once() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let changes = count_changes(&notifier);

        enumerator.set(snapshot_b());
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(changes.get(), 1);

        sleep(Duration::from_millis(3000)).await;
        assert_eq!(changes.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_interval() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let changes = count_changes(&notifier);

        enumerator.set(snapshot_b());
        sleep(Duration::from_millis(900)).await;

        assert_eq!(changes.get(), 0);
        assert_eq!(enumerator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn each_distinct_change_is_reported() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let changes = count_changes(&notifier);

        enumerator.set(snapshot_b());
        sleep(Duration::from_millis(1500)).await;
        enumerator.set(snapshot_a());
        sleep(Duration::from_millis(1000)).await;
        enumerator.set(snapshot_with(30));
        sleep(Duration::from_millis(1000)).await;

        assert_eq!(changes.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn baseline_advances_after_change() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let original = notifier.baseline();

        enumerator.set(snapshot_b());
        sleep(Duration::from_millis(1500)).await;

        assert_ne!(notifier.baseline(), original);
        assert_eq!(notifier.baseline(), notifier.interfaces_serialized().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn group_order_is_significant() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let changes = count_changes(&notifier);

        let mut groups = snapshot_a().groups().to_vec();
        groups.reverse();
        enumerator.set(groups.into());
        sleep(Duration::from_millis(1500)).await;

        assert_eq!(changes.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_reports_change_once() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = NetworkChangeNotifier::new(
            enumerator.clone(),
            NotifierOptions::new().with_poll_interval(Duration::ZERO),
        )
        .unwrap();
        let changes = count_changes(&notifier);

        enumerator.set(snapshot_b());
        sleep(Duration::from_millis(10)).await;

        assert_eq!(changes.get(), 1);
        assert!(enumerator.calls() > 2);
    }

    #[tokio::test(start_paused = true)]
    async fn every_listener_is_called_in_order() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let order = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));

        for label in ["first", "second"] {
            let order = std::sync::Arc::clone(&order);
            notifier.on_change(move || order.lock().unwrap().push(label));
        }

        enumerator.set(snapshot_b());
        sleep(Duration::from_millis(1500)).await;

        assert_eq!(*order.lock().unwrap(), ["first", "second"]);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_ticks() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let changes = count_changes(&notifier);

        notifier.stop();
        enumerator.set(snapshot_b());
        sleep(Duration::from_secs(10)).await;

        assert!(!notifier.is_running());
        assert_eq!(changes.get(), 0);
        assert_eq!(enumerator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let notifier = notifier_over(&MockEnumerator::returning(snapshot_a()));

        notifier.stop();
        notifier.stop();

        assert!(!notifier.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_detects_change_made_while_stopped() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let changes = count_changes(&notifier);

        notifier.stop();
        enumerator.set(snapshot_b());
        sleep(Duration::from_secs(5)).await;
        assert_eq!(changes.get(), 0);

        notifier.start();
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(changes.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_keeps_a_single_timer() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);

        notifier.start();
        notifier.start();
        sleep(Duration::from_millis(1500)).await;

        // Baseline plus one tick.
        assert_eq!(enumerator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_from_inside_listener() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let controller = notifier.controller();
        let changes = Counter::new();
        let handler = changes.clone();
        notifier.on_change(move || {
            handler.hit();
            controller.stop();
        });

        enumerator.set(snapshot_b());
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(changes.get(), 1);
        assert!(!notifier.is_running());

        enumerator.set(snapshot_a());
        sleep(Duration::from_secs(5)).await;
        assert_eq!(changes.get(), 1);
        assert_eq!(enumerator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_notifier_stops_polling() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);

        drop(notifier);
        sleep(Duration::from_secs(5)).await;

        assert_eq!(enumerator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn controller_is_inert_after_drop() {
        let notifier = notifier_over(&MockEnumerator::returning(snapshot_a()));
        let controller = notifier.controller();
        assert!(controller.is_running());

        drop(notifier);

        assert!(!controller.is_running());
        assert!(!controller.start());
        assert!(!controller.stop());
    }

    #[tokio::test(start_paused = true)]
    async fn controller_restarts_notifier() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let controller = notifier.controller();

        assert!(controller.stop());
        assert!(!notifier.is_running());
        assert!(controller.clone().start());
        assert!(notifier.is_running());
    }
}

mod errors {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn poll_failure_reaches_error_listeners() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let changes = count_changes(&notifier);
        let errors = count_errors(&notifier);
        let baseline = notifier.baseline();

        enumerator.fail();
        sleep(Duration::from_millis(1500)).await;

        assert_eq!(errors.get(), 1);
        assert_eq!(changes.get(), 0);
        assert_eq!(notifier.baseline(), baseline);
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_compares_against_last_good_value() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let changes = count_changes(&notifier);
        let errors = count_errors(&notifier);

        enumerator.fail();
        sleep(Duration::from_millis(1500)).await;
        enumerator.set(snapshot_a());
        sleep(Duration::from_millis(1000)).await;
        assert_eq!(changes.get(), 0);

        enumerator.set(snapshot_b());
        sleep(Duration::from_millis(1000)).await;
        assert_eq!(changes.get(), 1);
        assert_eq!(errors.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_continues_without_error_listeners() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);

        enumerator.fail();
        sleep(Duration::from_millis(2500)).await;

        assert!(notifier.is_running());
        assert_eq!(enumerator.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn error_listener_receives_fetch_error() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let seen = std::sync::Arc::new(std::sync::Mutex::new(None));
        let handler_seen = std::sync::Arc::clone(&seen);
        notifier.on_error(move |error| {
            *handler_seen.lock().unwrap() = Some(matches!(error, NotifierError::Fetch(_)));
        });

        enumerator.fail();
        sleep(Duration::from_millis(1500)).await;

        assert_eq!(*seen.lock().unwrap(), Some(true));
    }
}

mod listeners {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn removed_listener_is_not_called() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let changes = Counter::new();
        let handler = changes.clone();
        let id = notifier.on_change(move || handler.hit());

        assert!(notifier.remove_listener(id));
        assert!(!notifier.remove_listener(id));

        enumerator.set(snapshot_b());
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(changes.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribe_yields_change_events() {
        let enumerator = MockEnumerator::returning(snapshot_a());
        let notifier = notifier_over(&enumerator);
        let mut stream = notifier.subscribe();

        enumerator.set(snapshot_b());
        let next = tokio::time::timeout(Duration::from_secs(2), stream.next()).await;

        assert!(matches!(next, Ok(Some(()))));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stream_unregisters() {
        let notifier = notifier_over(&MockEnumerator::returning(snapshot_a()));
        let stream = notifier.subscribe();
        assert_eq!(notifier.listener_count(), 1);

        drop(stream);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stream_ends_when_notifier_dropped() {
        let notifier = notifier_over(&MockEnumerator::returning(snapshot_a()));
        let mut stream = notifier.subscribe();

        drop(notifier);

        assert_eq!(stream.next().await, None);
    }
}
