use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lbin::value::{Table, Value};
use lbin::{Algorithm, wire};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

const ALGORITHMS: [Algorithm; 4] = [
    Algorithm::None,
    Algorithm::Snappy,
    Algorithm::Zlib,
    Algorithm::Zstd,
];

fn gen_scalar(rng: &mut StdRng) -> Value {
    match rng.random_range(0..6) {
        0 => Value::Boolean(rng.random_bool(0.5)),
        1 => Value::Integer(rng.random_range(0..300)),
        2 => Value::Integer(rng.random()),
        3 => Value::Real(rng.random::<f64>() * 1000.0),
        4 => Value::from(format!("name-{}", rng.random_range(0..64))),
        _ => Value::Nil,
    }
}

/// Record-like tables: a short array part plus string-keyed fields.
fn gen_record(rng: &mut StdRng, depth: usize) -> Value {
    let mut t = Table::new();
    for _ in 0..rng.random_range(0..6) {
        t.push(gen_scalar(rng));
    }
    for i in 0..rng.random_range(2..10) {
        let value = if depth > 0 && rng.random_bool(0.2) {
            gen_record(rng, depth - 1)
        } else {
            gen_scalar(rng)
        };
        let _ = t.insert(format!("field{i}"), value);
    }
    Value::Table(t)
}

fn gen_values(count: usize, seed: u64) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| gen_record(&mut rng, 3)).collect()
}

fn write_ratio_snapshot() {
    let values = gen_values(2000, 123);
    let raw = wire::encode(&values).unwrap().len();
    let mut csv = String::from("algorithm,level,packed_bytes,raw_bytes,ratio\n");
    for algo in ALGORITHMS.iter().filter(|a| a.is_available()) {
        let levels: &[i32] = match algo {
            Algorithm::Zlib => &[1, 6, 9],
            Algorithm::Zstd => &[1, 3, 9, 19],
            _ => &[1],
        };
        for &level in levels {
            let packed = lbin::pack(&values, algo.clone(), level).unwrap();
            let ratio = packed.len() as f64 / raw as f64;
            csv.push_str(&format!("{algo},{level},{},{raw},{ratio}\n", packed.len()));
        }
    }
    let out_dir = Path::new("target/criterion/custom_reports");
    let _ = fs::create_dir_all(out_dir);
    let _ = fs::write(out_dir.join("ratio_snapshot.csv"), csv);
}

fn bench_encode(c: &mut Criterion) {
    let mut g = c.benchmark_group("wire_encode");
    for count in [100usize, 1000, 10_000] {
        let values = gen_values(count, 1);
        let bytes = wire::encode(&values).unwrap().len();
        g.throughput(Throughput::Bytes(bytes as u64));
        g.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(wire::encode(black_box(&values)).unwrap()));
        });
    }
    g.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut g = c.benchmark_group("wire_decode");
    for count in [100usize, 1000, 10_000] {
        let bytes = wire::encode(&gen_values(count, 2)).unwrap();
        g.throughput(Throughput::Bytes(bytes.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(wire::decode_all(black_box(&bytes)).unwrap()));
        });
    }
    g.finish();
}

fn bench_pack_by_algorithm(c: &mut Criterion) {
    write_ratio_snapshot();
    let mut g = c.benchmark_group("pack_by_algorithm");
    let values = gen_values(2000, 3);
    let raw = wire::encode(&values).unwrap().len();
    g.throughput(Throughput::Bytes(raw as u64));
    for algo in ALGORITHMS.iter().filter(|a| a.is_available()) {
        g.bench_function(algo.name(), |b| {
            b.iter(|| black_box(lbin::pack(black_box(&values), algo.clone(), 1).unwrap()));
        });
    }
    g.finish();
}

fn bench_unpack_by_algorithm(c: &mut Criterion) {
    let mut g = c.benchmark_group("unpack_by_algorithm");
    let values = gen_values(2000, 4);
    let raw = wire::encode(&values).unwrap().len();
    g.throughput(Throughput::Bytes(raw as u64));
    for algo in ALGORITHMS.iter().filter(|a| a.is_available()) {
        let packed = lbin::pack(&values, algo.clone(), 1).unwrap();
        g.bench_function(algo.name(), |b| {
            b.iter(|| black_box(lbin::unpack(black_box(&packed), algo.clone()).unwrap()));
        });
    }
    g.finish();
}

fn bench_large_strings(c: &mut Criterion) {
    let mut g = c.benchmark_group("large_strings");
    for size in [64 * 1024usize, 1024 * 1024] {
        let mut rng = StdRng::seed_from_u64(size as u64);
        let data: Vec<u8> = (0..size).map(|_| rng.random_range(b'a'..=b'h')).collect();
        let values = [Value::String(data)];
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let bytes = wire::encode(black_box(&values)).unwrap();
                black_box(wire::decode_all(&bytes).unwrap());
            });
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_pack_by_algorithm,
    bench_unpack_by_algorithm,
    bench_large_strings
);
criterion_main!(benches);
