use coaster_core::mocks::MemoryNotifier;
use coaster_core::{CommandCfg, Controller, DeviceCfg, VERSION};
use coaster_traits::clock::test_clock::{ManualWallClock, TestClock};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

fn controller_with(commands: CommandCfg) -> (Controller<MemoryNotifier>, TestClock, MemoryNotifier) {
    let clock = TestClock::new();
    let notifier = MemoryNotifier::new();
    let cfg = DeviceCfg {
        commands,
        ..DeviceCfg::default()
    };
    let c = Controller::new(
        cfg,
        Arc::new(clock.clone()),
        Arc::new(ManualWallClock::new(1_000)),
        notifier.clone(),
    )
    .unwrap();
    (c, clock, notifier)
}

fn controller() -> (Controller<MemoryNotifier>, TestClock, MemoryNotifier) {
    controller_with(CommandCfg::default())
}

#[rstest]
#[case::fresh(0, true)]
#[case::just_under(999, true)]
#[case::at_threshold(1000, true)]
#[case::just_over(1001, false)]
#[case::very_old(5000, false)]
fn staleness_threshold(#[case] age_ms: u64, #[case] dispatched: bool) {
    let (mut c, clock, notifier) = controller();
    let mut conn = c.ingress().connect();
    assert_eq!(conn.on_bytes(b"getVersion\n"), 1);
    clock.advance(Duration::from_millis(age_ms));

    let report = c.drain_commands();
    assert_eq!(report.dispatched, usize::from(dispatched));
    assert_eq!(report.stale, usize::from(!dispatched));
    let expected: Vec<String> = if dispatched {
        vec![VERSION.to_string()]
    } else {
        vec![]
    };
    assert_eq!(notifier.take(), expected);
}

#[test]
fn fifo_order_across_chunks() {
    let (mut c, _clock, notifier) = controller();
    let mut conn = c.ingress().connect();
    conn.on_bytes(b"stopLog");
    conn.on_bytes(b"ging\r\ngetStatus\nstartLogging\n");
    conn.on_bytes(b"getStatus\n");

    assert_eq!(c.drain_commands().dispatched, 4);
    assert_eq!(
        notifier.take(),
        vec![
            r#"{"status":"ok"}"#,
            r#"{"logging":false,"bufferSize":0,"rateHz":40}"#,
            r#"{"status":"ok"}"#,
            r#"{"logging":true,"bufferSize":0,"rateHz":40}"#,
        ]
    );
}

#[test]
fn concurrent_connections_never_interleave() {
    let (mut c, _clock, notifier) = controller_with(CommandCfg {
        stale_ms: 1000,
        queue_capacity: 256,
    });
    let ingress = c.ingress();
    std::thread::scope(|s| {
        for _ in 0..2 {
            let ingress = ingress.clone();
            s.spawn(move || {
                let mut conn = ingress.connect();
                for _ in 0..50 {
                    for b in b"getVersion\n" {
                        conn.on_bytes(std::slice::from_ref(b));
                        std::thread::yield_now();
                    }
                }
            });
        }
    });

    let report = c.drain_commands();
    assert_eq!(report.dispatched, 100);
    let sent = notifier.take();
    assert_eq!(sent.len(), 100);
    assert!(sent.iter().all(|s| s == VERSION));
}

#[test]
fn full_queue_rejects_new_lines() {
    let (mut c, _clock, notifier) = controller_with(CommandCfg {
        stale_ms: 1000,
        queue_capacity: 2,
    });
    let ingress = c.ingress();
    let mut conn = ingress.connect();
    assert_eq!(conn.on_bytes(b"getVersion\ngetVersion\ngetVersion\n"), 2);
    assert_eq!(ingress.queue().rejected(), 1);
    assert_eq!(c.drain_commands().dispatched, 2);
    assert_eq!(notifier.take().len(), 2);
}

#[test]
fn dropped_connection_discards_partial_line() {
    let (mut c, _clock, notifier) = controller();
    {
        let mut conn = c.ingress().connect();
        conn.on_bytes(b"getStatus\ngetVer");
    }
    let mut conn = c.ingress().connect();
    conn.on_bytes(b"sion\n");
    c.drain_commands();
    assert_eq!(
        notifier.take(),
        vec![
            r#"{"logging":true,"bufferSize":0,"rateHz":40}"#.to_string(),
            r#"{"status":"error","message":"Unknown command: 'sion'"}"#.to_string(),
        ]
    );
}

#[test]
fn no_peer_means_no_notification_but_effects_apply() {
    let (mut c, _clock, notifier) = controller();
    notifier.set_connected(false);
    c.ingress().connect().on_bytes(b"setSamplingRate 10\n");
    assert_eq!(c.drain_commands().dispatched, 1);
    assert!(notifier.take().is_empty());
    assert_eq!(c.context().rate_hz(), 10);
}

#[test]
fn reset_rebuilds_state_and_discards_rest_of_batch() {
    let (mut c, _clock, notifier) = controller();
    c.tick(120.0);
    let mut conn = c.ingress().connect();
    conn.on_bytes(b"setSamplingRate 10\nsetTime 1700000000\nreset\ngetStatus\n");

    let report = c.drain_commands();
    assert!(report.restart);
    assert_eq!(report.dispatched, 3);
    assert_eq!(notifier.take().len(), 2);

    let ctx = c.context();
    assert_eq!(ctx.rate_hz(), 40);
    assert_eq!(ctx.clock.offset(), 0);
    assert!(ctx.records.is_empty());
    assert_eq!(ctx.conditioner.last(), None);
    assert!(c.ingress().queue().is_empty());

    conn.on_bytes(b"getStatus\n");
    c.drain_commands();
    assert_eq!(
        notifier.take(),
        vec![r#"{"logging":true,"bufferSize":0,"rateHz":40}"#]
    );
}

#[test]
fn period_follows_sampling_rate() {
    let (mut c, _clock, _n) = controller();
    assert_eq!(c.period(), Duration::from_millis(25));
    c.ingress().connect().on_bytes(b"setSamplingRate 4\n");
    c.drain_commands();
    assert_eq!(c.period(), Duration::from_millis(250));

    c.ingress().connect().on_bytes(b"setSamplingRate 600\n");
    c.drain_commands();
    assert_eq!(c.period(), Duration::from_micros(1_666));

    c.ingress().connect().on_bytes(b"setSamplingRate 4000000000\n");
    c.drain_commands();
    assert_eq!(c.context().rate_hz(), 600);
    assert_eq!(c.period(), Duration::from_micros(1_666));
}

#[test]
fn restart_drops_commands_still_queued() {
    let (mut c, _clock, notifier) = controller();
    let mut conn = c.ingress().connect();
    assert_eq!(conn.on_bytes(b"getVersion\ngetStatus\n"), 2);
    assert_eq!(c.ingress().queue().len(), 2);

    c.restart();
    assert!(c.ingress().queue().is_empty());
    assert_eq!(c.drain_commands().dispatched, 0);
    assert!(notifier.take().is_empty());
}
