//! Benchmarks for the update hot path
//!
//! Covers the work done for every websocket message:
//! - frame decoding of deflated action and data frames
//! - applying an update packet to a populated snapshot (merge + delta)
//! - applying a motion event with its camera back-references
//!
//! Platform: Cross-platform (synthetic fixtures, CI-safe)

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use nvrsync::Snapshot;
use nvrsync::test_utils::{CAMERA_ID, action_json, add_packet, packet_bytes, sample_bootstrap, sample_event};
use nvrsync::wire::WsPacket;
use serde_json::json;
use std::hint::black_box;
use uuid::Uuid;

fn snapshot() -> Snapshot {
    let bootstrap = sample_bootstrap();
    Snapshot::from_wire(bootstrap.as_object().expect("bootstrap is an object")).expect("bootstrap loads")
}

fn stats_update() -> Vec<u8> {
    packet_bytes(
        action_json("update", "camera", Some(CAMERA_ID), Uuid::from_u128(1)),
        json!({
            "micVolume": 42,
            "stats": {"rxBytes": 53945386, "txBytes": 2356366294u64,
                      "video": {"recordingEnd": 1632106567254i64, "recordingEndLQ": 1632106582266i64}}
        }),
    )
}

fn bench_packet_decode(c: &mut Criterion) {
    let raw = stats_update();

    let mut group = c.benchmark_group("packet_decode");
    group.throughput(Throughput::Bytes(raw.len() as u64));

    group.bench_function("header_and_data", |b| {
        b.iter(|| {
            let packet = WsPacket::new(black_box(raw.clone()));
            let header = packet.header().expect("header decodes");
            black_box((header, packet.data().map(|d| d.len()).ok()))
        })
    });

    group.finish();
}

fn bench_apply_update(c: &mut Criterion) {
    let raw = stats_update();
    let base = snapshot();

    c.bench_function("apply_update_with_delta", |b| {
        b.iter_batched(
            || (base.clone(), WsPacket::new(raw.clone())),
            |(mut snapshot, packet)| black_box(snapshot.apply_packet(&packet).expect("update applies")),
            BatchSize::SmallInput,
        )
    });

    // Same values again: merge runs, delta comes out empty.
    let mut settled = base.clone();
    let _ = settled.apply_packet(&WsPacket::new(raw.clone()));
    c.bench_function("apply_update_no_change", |b| {
        b.iter_batched(
            || (settled.clone(), WsPacket::new(raw.clone())),
            |(mut snapshot, packet)| black_box(snapshot.apply_packet(&packet).expect("update applies")),
            BatchSize::SmallInput,
        )
    });
}

fn bench_apply_event(c: &mut Criterion) {
    let base = snapshot();
    let event = sample_event("event-bench", "motion", CAMERA_ID, 1632106600000, None);

    c.bench_function("apply_motion_event", |b| {
        b.iter_batched(
            || (base.clone(), add_packet("event", Uuid::from_u128(2), event.clone())),
            |(mut snapshot, packet)| black_box(snapshot.apply_packet(&packet).expect("event applies")),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_packet_decode, bench_apply_update, bench_apply_event);
criterion_main!(benches);
