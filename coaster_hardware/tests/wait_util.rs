use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::thread;
use std::time::Duration;

use coaster_hardware::error::HwError;
use coaster_hardware::util::{RollingAverage, wait_until_low_with_timeout};

#[test]
fn wait_until_low_success_path() {
    let high = Arc::new(AtomicBool::new(true));
    let high_bg = high.clone();
    // Flip low after a short delay
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(3));
        high_bg.store(false, Ordering::Relaxed);
    });

    let res = wait_until_low_with_timeout(
        || high.load(Ordering::Relaxed),
        Duration::from_millis(50),
        Duration::from_micros(200),
    );
    assert!(res.is_ok(), "expected success, got {res:?}");
}

#[test]
fn wait_until_low_timeout_path() {
    let high = Arc::new(AtomicBool::new(true));

    let err = wait_until_low_with_timeout(
        || high.load(Ordering::Relaxed),
        Duration::from_millis(5),
        Duration::from_micros(200),
    )
    .expect_err("expected timeout error");

    match err {
        HwError::DataReadyTimeout => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rolling_average_drops_oldest() {
    let mut avg = RollingAverage::new(3);
    assert_eq!(avg.push(3), 3.0);
    assert_eq!(avg.push(6), 4.5);
    assert_eq!(avg.push(9), 6.0);
    assert_eq!(avg.push(12), 9.0);
    assert_eq!(avg.len(), 3);
    avg.clear();
    assert!(avg.is_empty());
}
