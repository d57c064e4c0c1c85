use coaster_core::conditioner::{Ema, StabilityWindow};
use coaster_core::{ConditionerCfg, Record, RecordStore, SignalConditioner};
use proptest::prelude::*;

proptest! {
    #[test]
    fn ema_is_fixed_point_for_constant_input(x in 0.1f32..100_000.0, n in 1usize..64) {
        let mut ema = Ema::new(0.6);
        for _ in 0..n {
            prop_assert_eq!(ema.update(x), x);
        }
    }

    #[test]
    fn conditioner_output_stays_within_input_range(
        xs in proptest::collection::vec(0.0f32..2_000.0, 1..200),
        alpha in 0.05f32..=1.0,
    ) {
        let mut c = SignalConditioner::new(&ConditionerCfg { ema_alpha: alpha, ..ConditionerCfg::default() });
        let hi = xs.iter().copied().fold(0.0f32, f32::max);
        for &x in &xs {
            let out = c.condition(x);
            prop_assert!(out.grams >= 0.0);
            prop_assert!(out.grams <= hi + 1e-3);
        }
    }

    #[test]
    fn one_outlier_blocks_stability_for_a_full_window(
        n in 2usize..32,
        v in 0.0f32..1_000.0,
        jump in 1.5f32..500.0,
    ) {
        let mut w = StabilityWindow::new(n, 1.0);
        for i in 0..n {
            prop_assert_eq!(w.push(v), i + 1 == n);
        }
        prop_assert!(!w.push(v + jump));
        for _ in 1..n {
            prop_assert!(!w.push(v));
        }
        prop_assert!(w.push(v));
    }
}

#[derive(Debug, Clone)]
enum Op {
    Append(i64, i64, f32),
    Drop(usize, usize),
    Clear,
    Logging(bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0i64..1_000, 0i64..1_000, 0.0f32..500.0).prop_map(|(s, e, g)| Op::Append(s, e, g)),
        3 => (0usize..40, 0usize..40).prop_map(|(o, l)| Op::Drop(o, l)),
        1 => Just(Op::Clear),
        1 => any::<bool>().prop_map(Op::Logging),
    ]
}

proptest! {
    #[test]
    fn store_matches_vec_model(ops in proptest::collection::vec(op(), 0..120), offset in 0usize..50, len in 0usize..50) {
        let mut store = RecordStore::new();
        let mut model: Vec<Record> = Vec::new();
        let mut logging = true;
        for op in ops {
            match op {
                Op::Append(s, e, g) => {
                    let r = Record::sip(s, e, g);
                    prop_assert_eq!(store.append(r), logging);
                    if logging {
                        model.push(r);
                    }
                }
                Op::Drop(o, l) => {
                    let hit = o < model.len();
                    prop_assert_eq!(store.drop_range(o, l), hit);
                    if hit {
                        let end = (o + l).min(model.len());
                        model.drain(o..end);
                    }
                }
                Op::Clear => {
                    store.clear();
                    model.clear();
                }
                Op::Logging(on) => {
                    store.set_logging(on);
                    logging = on;
                }
            }
            prop_assert_eq!(store.records(), model.as_slice());
        }
        let (page, n) = store.paginate(offset, len);
        let start = offset.min(model.len());
        let expected = &model[start..(start + len).min(model.len())];
        prop_assert_eq!(page, expected);
        prop_assert_eq!(n, len.min(model.len().saturating_sub(offset)));
        prop_assert!(page.iter().all(|r| r.end_time == 0 || r.end_time >= r.start_time));
    }
}
