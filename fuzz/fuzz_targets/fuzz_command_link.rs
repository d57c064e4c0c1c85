#![no_main]
use coaster_core::mocks::MemoryNotifier;
use coaster_core::{CommandCfg, Controller, DeviceCfg, VERSION};
use coaster_traits::clock::test_clock::{ManualWallClock, TestClock};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let notifier = MemoryNotifier::new();
    let cfg = DeviceCfg {
        commands: CommandCfg {
            stale_ms: 1000,
            queue_capacity: 1024,
        },
        ..DeviceCfg::default()
    };
    let Ok(mut c) = Controller::new(
        cfg,
        Arc::new(TestClock::new()),
        Arc::new(ManualWallClock::new(1_700_000_000)),
        notifier.clone(),
    ) else {
        return;
    };

    // Arbitrary bytes split at an arbitrary point, interleaved with ticks.
    let cut = data.first().map_or(0, |&b| usize::from(b)).min(data.len());
    let mut conn = c.ingress().connect();
    conn.on_bytes(&data[..cut]);
    c.drain_commands();
    c.tick(f32::from(data.len() as u16));
    conn.on_bytes(&data[cut..]);
    conn.on_bytes(b"\n");
    c.drain_commands();

    // Every response is the version string or a JSON object.
    for reply in notifier.take() {
        if reply != VERSION {
            let v: serde_json::Value = serde_json::from_str(&reply).expect("response is JSON");
            assert!(v.is_object());
        }
    }
});
