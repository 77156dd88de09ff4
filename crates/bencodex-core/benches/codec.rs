//! Encode/decode throughput benchmarks.
//!
//! Run with: cargo bench --bench codec

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use bencodex_core::{decode, encode, Decoder, Key, MemoryReader, Value};

/// Builds a block-like document with `n` transaction records.
fn document(n: usize) -> Value {
    let txs = (0..n)
        .map(|i| {
            Value::dictionary([
                (Key::from("nonce"), Value::from(i as u64)),
                (Key::from("signer"), Value::from(vec![(i % 251) as u8; 20])),
                (Key::from("memo"), Value::from(format!("transfer #{i} 단팥"))),
                (Key::from(&b"sig"[..]), Value::from(vec![0xabu8; 64])),
                (Key::from("actions"), Value::List(vec![Value::Null, Value::from(true)])),
            ])
        })
        .collect::<Vec<_>>();
    Value::dictionary([
        (Key::from("index"), Value::from(n as u64)),
        (Key::from("transactions"), Value::List(txs)),
    ])
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for n in [10usize, 100, 1_000] {
        let value = document(n);
        let size = encode(&value).map(|b| b.len()).unwrap_or(0);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &value, |b, value| {
            b.iter(|| encode(black_box(value)))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for n in [10usize, 100, 1_000] {
        let bytes = encode(&document(n)).unwrap_or_default();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &bytes, |b, bytes| {
            b.iter(|| decode(black_box(bytes)))
        });
    }
    group.finish();
}

fn bench_decode_strict(c: &mut Criterion) {
    let bytes = bytes::Bytes::from(encode(&document(100)).unwrap_or_default());
    let decoder = Decoder::default().with_strict(true);
    c.bench_function("decode_strict/100", |b| {
        b.iter(|| decoder.decode(&mut MemoryReader::new(black_box(bytes.clone()))))
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_decode_strict);
criterion_main!(benches);
