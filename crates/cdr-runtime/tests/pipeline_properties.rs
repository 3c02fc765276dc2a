//! End-to-end properties of the fan-out/reduce pipeline.

use std::fmt::Write as _;
use std::time::Duration;

use cdr_runtime::core::calculations::compute;
use cdr_runtime::core::models::Totals;
use cdr_runtime::pipeline::{Pipeline, PipelineConfig};
use rand::Rng;

fn config(workers: usize, queue_depth: usize) -> PipelineConfig {
    PipelineConfig {
        workers,
        queue_depth,
        ..PipelineConfig::default()
    }
}

/// Build a document with `n` records alternating inbound/outbound, with
/// deterministic per-record values.
fn generated_document(n: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<cdrs>\n");
    for i in 0..n {
        let direction = if i % 2 == 0 { "inbound" } else { "outbound" };
        writeln!(
            xml,
            r#"  <session durationMinutes="{}" totalCharges="{}.{:02}" transportCharges="0.01" direction="{}"><outboundDialString description="d{}" prefix="{}"/></session>"#,
            i % 60,
            i % 10,
            i % 100,
            direction,
            i,
            i % 9
        )
        .unwrap();
    }
    xml.push_str("</cdrs>\n");
    xml
}

fn assert_totals_close(a: &Totals, b: &Totals) {
    let eps = 1e-6;
    assert_eq!(a.count, b.count);
    assert_eq!(a.calls, b.calls);
    assert_eq!(a.excluded, b.excluded);
    for (x, y) in [
        (a.duration, b.duration),
        (a.transport, b.transport),
        (a.total_charges, b.total_charges),
        (a.platform_rate, b.platform_rate),
        (a.transfer, b.transfer),
        (a.recording, b.recording),
        (a.conferencing, b.conferencing),
        (a.payphone, b.payphone),
    ] {
        assert!((x.inbound - y.inbound).abs() < eps, "{x:?} vs {y:?}");
        assert!((x.outbound - y.outbound).abs() < eps, "{x:?} vs {y:?}");
    }
}

#[tokio::test]
async fn three_record_example() {
    let xml = r#"<cdrs>
        <session durationMinutes="10" totalCharges="1.50" direction="inbound"/>
        <session durationMinutes="5" totalCharges="2.25" direction="inbound"/>
        <session durationMinutes="20" totalCharges="3.00" direction="outbound"/>
    </cdrs>"#;

    let outcome = Pipeline::new(config(3, 4))
        .run(xml.as_bytes())
        .await
        .unwrap();
    let totals = outcome.totals;

    assert_eq!(totals.count, 3);
    assert!((totals.total_charges.inbound - 3.75).abs() < 1e-9);
    assert!((totals.total_charges.outbound - 3.00).abs() < 1e-9);
    assert_eq!(totals.duration.inbound, 15.0);
    assert_eq!(totals.duration.outbound, 20.0);
    assert_eq!(totals.calls.inbound, 2);
    assert_eq!(totals.calls.outbound, 1);
    assert_eq!(outcome.metadata.records_extracted, 3);
}

#[tokio::test]
async fn count_matches_well_formed_records() {
    for n in [0usize, 1, 2, 17, 250] {
        let xml = generated_document(n);
        let outcome = Pipeline::new(config(4, 8))
            .run(std::io::Cursor::new(xml.into_bytes()))
            .await
            .unwrap();
        assert_eq!(outcome.totals.count, n as u64);
        assert_eq!(outcome.totals.calls.total(), n as u64);
        assert_eq!(outcome.totals.excluded, 0);
    }
}

#[tokio::test]
async fn non_numeric_field_contributes_zero() {
    let xml = r#"<cdrs>
        <session durationMinutes="abc" totalCharges="2.00" payphoneCharges="1.2.3" direction="outbound"/>
        <session durationMinutes="4" totalCharges="1.00" direction="outbound"/>
    </cdrs>"#;

    let totals = Pipeline::new(config(2, 2))
        .run(xml.as_bytes())
        .await
        .unwrap()
        .totals;

    assert_eq!(totals.count, 2);
    assert_eq!(totals.duration.outbound, 4.0);
    assert_eq!(totals.payphone.outbound, 0.0);
    assert!((totals.total_charges.outbound - 3.0).abs() < 1e-9);
    assert_eq!(totals.invalid_fields, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn randomized_delays_do_not_change_totals() {
    let xml = generated_document(300);
    let baseline = Pipeline::new(config(1, 1))
        .run(std::io::Cursor::new(xml.clone().into_bytes()))
        .await
        .unwrap()
        .totals;

    for _ in 0..5 {
        let totals = Pipeline::new(config(8, 4))
            .run_with(std::io::Cursor::new(xml.clone().into_bytes()), |session| {
                let delay = rand::thread_rng().gen_range(0..=500u64);
                async move {
                    tokio::time::sleep(Duration::from_micros(delay)).await;
                    compute(session)
                }
            })
            .await
            .unwrap()
            .totals;
        assert_totals_close(&baseline, &totals);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn stress_never_loses_a_result() {
    let n = 20_000;
    let xml = generated_document(n);

    for (workers, queue_depth) in [(1, 1), (2, 1), (64, 2), (256, 1024)] {
        let outcome = Pipeline::new(config(workers, queue_depth))
            .run_with(std::io::Cursor::new(xml.clone().into_bytes()), |session| async move {
                tokio::task::yield_now().await;
                compute(session)
            })
            .await
            .unwrap();
        assert_eq!(outcome.totals.count, n as u64, "workers={workers}");
        assert_eq!(outcome.metadata.records_extracted, n as u64);
        assert_eq!(outcome.totals.calls.inbound, (n / 2) as u64);
        assert_eq!(outcome.totals.calls.outbound, (n / 2) as u64);
    }
}

#[tokio::test]
async fn unknown_directions_are_counted_and_excluded() {
    let xml = r#"<cdrs>
        <session durationMinutes="10" totalCharges="1" direction="inbound"/>
        <session durationMinutes="10" totalCharges="1" direction="Outbound"/>
        <session durationMinutes="10" totalCharges="1"/>
    </cdrs>"#;

    let totals = Pipeline::new(config(2, 2))
        .run(xml.as_bytes())
        .await
        .unwrap()
        .totals;

    assert_eq!(totals.count, 3);
    assert_eq!(totals.excluded, 2);
    assert_eq!(totals.calls.total() + totals.excluded, totals.count);
    assert_eq!(totals.duration.total(), 10.0);
}
