// ABOUTME: Benchmark suite for RIL parcel and PDU performance testing
// ABOUTME: Measures PDU parsing, serialization, and stream reassembly throughput

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ril::parcel::{MAX_PARCEL_SIZE, Parcel};
use ril::pdu::{SubmitPdu, parse_message};
use ril::transport::Reassembler;
use std::time::Duration;

const DELIVER_HELLO: &str = "0004068121436500006210512103544005E8329BFD06";

fn sample_submit(text_len: usize) -> SubmitPdu {
    SubmitPdu::new("+447911123456", &"a".repeat(text_len))
}

fn wire_frames(count: usize) -> Vec<u8> {
    let body = {
        let mut body = 1u32.to_be_bytes().to_vec();
        body.extend_from_slice(&1003u32.to_be_bytes());
        body.extend_from_slice(DELIVER_HELLO.as_bytes());
        body
    };
    let mut wire = Vec::new();
    for _ in 0..count {
        wire.extend_from_slice(&(body.len() as u32).to_be_bytes());
        wire.extend_from_slice(&body);
    }
    wire
}

fn bench_pdu_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("pdu_parse");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("deliver_hello", |b| {
        b.iter(|| parse_message(black_box(DELIVER_HELLO)).unwrap())
    });

    let long = sample_submit(160).to_hex().unwrap();
    group.bench_function("submit_160_chars", |b| {
        b.iter(|| parse_message(black_box(&long)).unwrap())
    });

    group.finish();
}

fn bench_pdu_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("pdu_serialize");
    group.measurement_time(Duration::from_secs(10));

    for &len in &[10usize, 50, 100, 160] {
        let pdu = sample_submit(len);
        group.bench_with_input(BenchmarkId::new("submit", len), &pdu, |b, pdu| {
            b.iter(|| black_box(pdu).to_hex().unwrap())
        });
    }

    group.finish();
}

fn bench_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassembly");
    group.measurement_time(Duration::from_secs(10));

    let wire = wire_frames(100);

    group.bench_function("single_chunk_100_parcels", |b| {
        b.iter(|| {
            let mut reassembler = Reassembler::new(MAX_PARCEL_SIZE);
            reassembler.feed(black_box(&wire)).unwrap()
        })
    });

    group.bench_function("byte_at_a_time_100_parcels", |b| {
        b.iter(|| {
            let mut reassembler = Reassembler::new(MAX_PARCEL_SIZE);
            let mut total = 0;
            for byte in black_box(&wire) {
                total += reassembler.feed(std::slice::from_ref(byte)).unwrap().len();
            }
            total
        })
    });

    group.finish();
}

fn bench_frame_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");
    group.measurement_time(Duration::from_secs(10));

    let pdu = sample_submit(160).to_hex().unwrap();
    let parcel = Parcel::request(25, 1, pdu.into_bytes().into());

    group.bench_function("send_sms_request", |b| {
        b.iter(|| black_box(&parcel).encode_frame())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_pdu_parse,
    bench_pdu_serialize,
    bench_reassembly,
    bench_frame_encode
);
criterion_main!(benches);
