//! Cipher and key derivation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sealstore_bench::{random_data, BENCH_PASSPHRASE, PAYLOAD_SIZES};
use sealstore_crypto::{derive_key, CipherAlgorithm, DerivedKey, KdfParams};

/// Benchmark sealing values with each algorithm.
fn bench_seal(c: &mut Criterion) {
    for algorithm in CipherAlgorithm::ALL {
        let mut group = c.benchmark_group(format!("seal/{algorithm}"));
        let key = DerivedKey::generate(algorithm);

        for size in PAYLOAD_SIZES {
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
                let data = random_data(size);
                b.iter(|| {
                    let sealed = algorithm.seal(&key, black_box(&data), b"bench").unwrap();
                    black_box(sealed);
                });
            });
        }

        group.finish();
    }
}

/// Benchmark opening sealed values with each algorithm.
fn bench_open(c: &mut Criterion) {
    for algorithm in CipherAlgorithm::ALL {
        let mut group = c.benchmark_group(format!("open/{algorithm}"));
        let key = DerivedKey::generate(algorithm);

        for size in PAYLOAD_SIZES {
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
                let sealed = algorithm.seal(&key, &random_data(size), b"bench").unwrap();
                b.iter(|| {
                    let plain = algorithm.open(&key, black_box(&sealed), b"bench").unwrap();
                    black_box(plain);
                });
            });
        }

        group.finish();
    }
}

/// Benchmark passphrase key derivation at default and low cost.
fn bench_derive(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_key");
    group.sample_size(10);

    for (name, params) in [("default", KdfParams::default()), ("low_cost", KdfParams::low_cost())] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let key = derive_key(
                    black_box(BENCH_PASSPHRASE),
                    CipherAlgorithm::Aes256Gcm,
                    &params,
                )
                .unwrap();
                black_box(key);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_seal, bench_open, bench_derive);
criterion_main!(benches);
