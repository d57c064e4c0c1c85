use coaster_core::{DeviceCfg, DeviceContext, PrinterId, Record, Reply, VERSION, dispatch};
use coaster_traits::clock::test_clock::ManualWallClock;
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn ctx() -> DeviceContext {
    DeviceContext::new(&DeviceCfg::default(), Arc::new(ManualWallClock::new(100))).unwrap()
}

/// Context holding the three records peers see in the protocol examples.
#[fixture]
fn ctx3(mut ctx: DeviceContext) -> DeviceContext {
    ctx.records.append(Record::measurement(1, 2, 3.0));
    ctx.records.append(Record::refill(4, 5, 6.0));
    ctx.records.append(Record::sip(7, 8, 9.0));
    ctx
}

fn text(reply: Reply) -> String {
    match reply {
        Reply::Text(s) => s,
        other => panic!("expected a text reply, got {other:?}"),
    }
}

#[rstest]
fn get_status_snapshot(mut ctx3: DeviceContext) {
    assert_eq!(
        text(dispatch(&mut ctx3, "getStatus")),
        r#"{"logging":true,"bufferSize":3,"rateHz":40}"#
    );
}

#[rstest]
fn read_buffer_page(mut ctx3: DeviceContext) {
    assert_eq!(
        text(dispatch(&mut ctx3, "readBuffer 1 2")),
        concat!(
            r#"{"length":2,"records":["#,
            r#"{"start_time":4,"end_time":5,"grams":6.000000,"type":"refill"},"#,
            r#"{"start_time":7,"end_time":8,"grams":9.000000,"type":"sip"}]}"#
        )
    );
}

#[rstest]
#[case::defaults("readBuffer", 3)]
#[case::offset_only("readBuffer 2", 1)]
#[case::past_end("readBuffer 10 5", 0)]
#[case::zero_length("readBuffer 0 0", 0)]
fn read_buffer_lengths(mut ctx3: DeviceContext, #[case] line: &str, #[case] n: u64) {
    let body: serde_json::Value = serde_json::from_str(&text(dispatch(&mut ctx3, line))).unwrap();
    assert_eq!(body["length"], n);
    assert_eq!(body["records"].as_array().map(Vec::len), Some(n as usize));
}

#[rstest]
fn drop_records_hit_and_miss(mut ctx3: DeviceContext) {
    assert_eq!(
        text(dispatch(&mut ctx3, "dropRecords 1 1")),
        r#"{"status":"ok","offset":1,"length":1}"#
    );
    assert_eq!(ctx3.records.len(), 2);
    assert_eq!(ctx3.records.records()[1].kind, coaster_core::RecordKind::Sip);
    assert_eq!(
        text(dispatch(&mut ctx3, "dropRecords 5 1")),
        r#"{"status":"error","offset":5,"length":1}"#
    );
    assert_eq!(ctx3.records.len(), 2);
}

#[rstest]
fn unknown_verb_is_escaped(mut ctx: DeviceContext) {
    assert_eq!(
        text(dispatch(&mut ctx, "foo")),
        r#"{"status":"error","message":"Unknown command: 'foo'"}"#
    );
    assert_eq!(
        text(dispatch(&mut ctx, r#"fo"o bar"#)),
        r#"{"status":"error","message":"Unknown command: 'fo\"o'"}"#
    );
}

#[rstest]
#[case("setTime", "Invalid arguments")]
#[case("setTime abc", "Invalid number: 'abc'")]
#[case("setTime 0", "Invalid timestamp")]
#[case("setTime -5", "Invalid timestamp")]
#[case("setSamplingRate 0", "Invalid rate")]
#[case("setSamplingRate -3", "Invalid rate")]
#[case("setSamplingRate 1001", "Invalid rate")]
#[case("setSamplingRate 4000000000", "Invalid rate")]
#[case("setSamplingRate fast", "Invalid number: 'fast'")]
#[case("setLogLevel raw", "Invalid format")]
#[case("setLogLevel ble 1", "Unknown printer: 'ble'")]
#[case("setLogLevel raw 9", "Invalid level")]
#[case("dropRecords 1", "Invalid format")]
#[case("dropRecords x 1", "Invalid number: 'x'")]
#[case("readBuffer -1", "Invalid number: '-1'")]
#[case("readBuffer 1 2 3", "Invalid arguments")]
#[case("calibrate 1 2", "Invalid arguments")]
#[case("calibrate 1 2 heavy", "Invalid number: 'heavy'")]
fn argument_errors(mut ctx3: DeviceContext, #[case] line: &str, #[case] message: &str) {
    let body: serde_json::Value = serde_json::from_str(&text(dispatch(&mut ctx3, line))).unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], message);
    // No side effects on failure.
    assert_eq!(ctx3.records.len(), 3);
    assert_eq!(ctx3.rate_hz(), 40);
    assert_eq!(ctx3.clock.offset(), 0);
}

#[rstest]
fn simple_acks(mut ctx3: DeviceContext) {
    let ok = r#"{"status":"ok"}"#;
    assert_eq!(text(dispatch(&mut ctx3, "stopLogging")), ok);
    assert!(!ctx3.is_logging());
    assert!(!ctx3.records.append(Record::sip(9, 9, 1.0)));
    assert_eq!(text(dispatch(&mut ctx3, "startLogging")), ok);
    assert!(ctx3.is_logging());
    assert_eq!(text(dispatch(&mut ctx3, "clearBuffer")), ok);
    assert!(ctx3.records.is_empty());
}

#[rstest]
fn sampling_rate_changes(mut ctx: DeviceContext) {
    assert_eq!(
        text(dispatch(&mut ctx, "setSamplingRate 10")),
        r#"{"status":"ok","rate":10}"#
    );
    assert_eq!(ctx.rate_hz(), 10);
    assert_eq!(
        text(dispatch(&mut ctx, "setSamplingRate 1000")),
        r#"{"status":"ok","rate":1000}"#
    );
    assert_eq!(ctx.rate_hz(), 1000);
}

#[rstest]
fn set_time_reports_offset(mut ctx: DeviceContext) {
    let body: serde_json::Value =
        serde_json::from_str(&text(dispatch(&mut ctx, "setTime 1700000000"))).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["offset"], 1_699_999_900_i64);
    assert!(body["time"].as_str().is_some_and(|t| t.starts_with("2023-11-1")));

    let now: serde_json::Value = serde_json::from_str(&text(dispatch(&mut ctx, "getNow"))).unwrap();
    assert_eq!(now["epoch"], 1_700_000_000_i64);
    assert_eq!(now["local"], body["time"]);
}

#[rstest]
fn log_levels(mut ctx: DeviceContext) {
    assert_eq!(
        text(dispatch(&mut ctx, "setLogLevel all 2")),
        r#"{"status":"ok","printer":"all","level":2}"#
    );
    assert_eq!(ctx.printers.get(PrinterId::Raw).level(), 2);
    assert_eq!(
        text(dispatch(&mut ctx, "setLogLevel event 0")),
        r#"{"status":"ok","printer":"event","level":0}"#
    );
    assert_eq!(ctx.printers.get(PrinterId::Event).level(), 0);
    assert_eq!(ctx.printers.get(PrinterId::Status).level(), 2);
}

#[rstest]
fn version_calibrate_and_reset(mut ctx: DeviceContext) {
    assert_eq!(dispatch(&mut ctx, "getVersion"), Reply::Text(VERSION.to_string()));
    assert_eq!(dispatch(&mut ctx, "calibrate -400 998000 950"), Reply::Silent);
    assert_eq!(dispatch(&mut ctx, "reset"), Reply::Restart);
}
