//! Store registration and concurrency contract.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::thread;

use vitals_core::{DistributionStats, Store, Value, VitalsError};

#[derive(Clone, Copy, Debug)]
enum Kind {
    Counter,
    Gauge,
    Label,
    Distribution,
}

const KINDS: [Kind; 4] = [Kind::Counter, Kind::Gauge, Kind::Label, Kind::Distribution];

fn register(store: &Store, kind: Kind, name: &str) -> Result<(), VitalsError> {
    match kind {
        Kind::Counter => store.register_counter(name).map(|_| ()),
        Kind::Gauge => store.register_gauge(name).map(|_| ()),
        Kind::Label => store.register_label(name).map(|_| ()),
        Kind::Distribution => store.register_distribution(name).map(|_| ()),
    }
}

#[test]
fn distinct_names_appear_with_initial_values() {
    let store = Store::new();
    store.register_counter("c").unwrap();
    store.register_gauge("ns.g").unwrap();
    store.register_label("ns.l").unwrap();
    store.register_distribution("other.d").unwrap();

    let snap = store.snapshot();
    let names: Vec<&str> = snap.keys().map(String::as_str).collect();
    assert_eq!(names, ["c", "ns.g", "ns.l", "other.d"]);
    assert_eq!(snap["c"], Value::Counter(0));
    assert_eq!(snap["ns.g"], Value::Gauge(0));
    assert_eq!(snap["ns.l"], Value::Label(String::new()));
    assert_eq!(snap["other.d"], Value::Distribution(DistributionStats::default()));
}

#[test]
fn duplicate_name_fails_for_every_kind_pair() {
    for first in KINDS {
        for second in KINDS {
            let store = Store::new();
            register(&store, first, "x").unwrap();
            let before = store.snapshot();

            let err = register(&store, second, "x").unwrap_err();
            assert_eq!(err, VitalsError::DuplicateName("x".into()), "{first:?} then {second:?}");
            assert!(err.is_registration_error());
            assert_eq!(store.snapshot(), before, "{first:?} then {second:?}");
        }
    }
}

#[test]
fn duplicate_does_not_replace_the_original_handle() {
    let store = Store::new();
    let c = store.register_counter("hits").unwrap();
    c.add(3);
    assert!(store.register_gauge("hits").is_err());
    assert!(store.register_counter_fn("hits", || 99).is_err());
    c.inc();
    assert_eq!(store.sample("hits"), Some(Value::Counter(4)));
}

#[test]
fn namespace_prefix_registrations_conflict() {
    let store = Store::new();
    store.register_counter("foo.bar").unwrap();

    let err = store.register_gauge("foo").unwrap_err();
    assert_eq!(
        err,
        VitalsError::PrefixConflict { name: "foo".into(), existing: "foo.bar".into() }
    );
    let err = store.register_label("foo.bar.baz").unwrap_err();
    assert!(matches!(err, VitalsError::PrefixConflict { .. }));

    // Sharing a textual prefix without a segment boundary is fine.
    store.register_counter("foobar").unwrap();
    store.register_counter("foo.barn").unwrap();
    assert_eq!(store.len(), 3);
}

#[test]
fn concurrent_increments_are_not_lost() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 10_000;

    let store = Store::new();
    let counter = store.register_counter("work.done").unwrap();
    let gauge = store.register_gauge("work.balance").unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let c = counter.clone();
            let g = gauge.clone();
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    c.inc();
                    g.inc();
                    g.dec();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.sample("work.done"), Some(Value::Counter(THREADS * PER_THREAD)));
    assert_eq!(store.sample("work.balance"), Some(Value::Gauge(0)));
}

#[test]
fn snapshots_run_alongside_writers() {
    let store = Store::new();
    let label = store.register_label("state").unwrap();
    let dist = store.register_distribution("lat").unwrap();

    let writer = {
        let (label, dist) = (label.clone(), dist.clone());
        thread::spawn(move || {
            for i in 0..5_000u32 {
                label.set(if i % 2 == 0 { "even" } else { "odd" });
                dist.add(f64::from(i % 10));
            }
        })
    };

    for _ in 0..200 {
        let snap = store.snapshot();
        match &snap["state"] {
            Value::Label(s) => assert!(s.is_empty() || s == "even" || s == "odd", "torn label {s:?}"),
            other => panic!("unexpected {other:?}"),
        }
        match &snap["lat"] {
            Value::Distribution(d) => assert!(d.count == 0 || (d.min >= 0.0 && d.max <= 9.0)),
            other => panic!("unexpected {other:?}"),
        }
    }
    writer.join().unwrap();

    let Some(Value::Distribution(d)) = store.sample("lat") else { panic!("missing lat") };
    assert_eq!(d.count, 5_000);
    assert_eq!(d.sum, 22_500.0);
}

#[test]
fn concurrent_registration_keeps_names_unique() {
    let store = Store::new();
    let wins: Vec<_> = (0..8)
        .map(|_| {
            let s = store.clone();
            thread::spawn(move || s.register_counter("race").is_ok())
        })
        .collect();
    let ok = wins.into_iter().map(|h| h.join().unwrap()).filter(|w| *w).count();
    assert_eq!(ok, 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn view_restricts_registration_and_reads() {
    let store = Store::new();
    store.register_counter("app.requests").unwrap();

    let rts = store.prefixed("rts");
    let gc = rts.register_counter("rts.gc.count").unwrap();
    gc.add(2);
    rts.register_gauge_fn("rts.threads", || 4).unwrap();

    let err = rts.register_counter("app.sneaky").unwrap_err();
    assert_eq!(err, VitalsError::OutsideView("app.sneaky".into()));
    assert!(rts.sample("app.requests").is_none());

    let view_names: Vec<String> = rts.snapshot().into_keys().collect();
    assert_eq!(view_names, ["rts.gc.count", "rts.threads"]);

    // Registered through the view, visible in the full store.
    assert_eq!(store.sample("rts.gc.count"), Some(Value::Counter(2)));
    assert_eq!(store.names(), ["app.requests", "rts.gc.count", "rts.threads"]);
}

#[test]
fn subset_accepts_arbitrary_predicates() {
    let store = Store::new();
    let view = store.subset(|name| name.ends_with("_ms"));
    assert!(view.register_distribution("db.query_ms").is_ok());
    assert!(view.register_distribution("db.query_us").is_err());
    assert!(view.contains("x_ms"));
    assert_eq!(store.len(), 1);
}
