//! Throughput of every mode of operation for both ciphers, plus key
//! schedule cost.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crypto::{Algorithm, EncryptionContext, Mode, Padding};

const KEY: &[u8] = b"benchmark key of thirty-two byte";
const IV: &[u8] = b"0123456789abcdef";
const MESSAGE_SIZE: usize = 64 * 1024;

fn bench_key_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_schedule");

    for algorithm in Algorithm::ALL {
        group.bench_function(algorithm.as_str(), |b| {
            b.iter(|| algorithm.new_cipher(black_box(KEY)).unwrap());
        });
    }

    group.finish();
}

fn bench_encrypt(c: &mut Criterion) {
    let message = vec![0xA5u8; MESSAGE_SIZE];

    for algorithm in Algorithm::ALL {
        let mut group = c.benchmark_group(format!("encrypt_{algorithm}"));
        group.throughput(Throughput::Bytes(MESSAGE_SIZE as u64));

        for mode in Mode::ALL {
            let ctx = EncryptionContext::new(KEY, algorithm, mode, Padding::Pkcs7, IV).unwrap();

            group.bench_with_input(BenchmarkId::from_parameter(mode), &message, |b, m| {
                b.iter(|| ctx.encrypt(black_box(m)).unwrap());
            });
        }

        group.finish();
    }
}

fn bench_decrypt(c: &mut Criterion) {
    for algorithm in Algorithm::ALL {
        let mut group = c.benchmark_group(format!("decrypt_{algorithm}"));
        group.throughput(Throughput::Bytes(MESSAGE_SIZE as u64));

        for mode in Mode::ALL {
            let ctx = EncryptionContext::new(KEY, algorithm, mode, Padding::Pkcs7, IV).unwrap();
            let ciphertext = ctx.encrypt(&vec![0x5Au8; MESSAGE_SIZE]).unwrap();

            group.bench_with_input(BenchmarkId::from_parameter(mode), &ciphertext, |b, c| {
                b.iter(|| ctx.decrypt(black_box(c)).unwrap());
            });
        }

        group.finish();
    }
}

criterion_group!(benches, bench_key_schedule, bench_encrypt, bench_decrypt);
criterion_main!(benches);
