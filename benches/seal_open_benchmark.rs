use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use notevault::keys::{self, ServerSecret};
use notevault::NoteVault;

const SIZES: [(&str, usize); 3] = [("100B", 100), ("1KB", 1024), ("10KB", 10 * 1024)];

fn secret() -> ServerSecret {
    ServerSecret::from_bytes(b"benchmark server secret".to_vec()).unwrap()
}

fn benchmark_seal(c: &mut Criterion) {
    let vault = NoteVault::new(secret());
    let subject = "bench-user";

    let mut group = c.benchmark_group("seal");
    for (name, size) in SIZES {
        let payload = vec![0u8; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            criterion::BenchmarkId::from_parameter(name),
            &payload,
            |b, payload| {
                b.iter(|| {
                    // Each iteration pays for derivation and sealing, the
                    // same cost profile as one write request.
                    vault
                        .seal(black_box(subject), black_box(payload))
                        .unwrap()
                });
            },
        );
    }
    group.finish();
}

fn benchmark_open(c: &mut Criterion) {
    let vault = NoteVault::new(secret());
    let subject = "bench-user";

    let mut group = c.benchmark_group("open");
    for (name, size) in SIZES {
        let payload = vec![0u8; size];
        let sealed = vault.seal(subject, &payload).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            criterion::BenchmarkId::from_parameter(name),
            &sealed,
            |b, sealed| {
                b.iter(|| vault.open(black_box(subject), black_box(sealed)).unwrap());
            },
        );
    }
    group.finish();
}

fn benchmark_derivation(c: &mut Criterion) {
    // Bare derivation cost, isolated from the cipher. This is the price of
    // the no-key-cache policy, paid once per request.
    let secret = secret();

    c.bench_function("derive_user_key", |b| {
        b.iter(|| keys::derive_user_key(black_box(&secret), black_box("bench-user")).unwrap());
    });
}

criterion_group!(benches, benchmark_seal, benchmark_open, benchmark_derivation);
criterion_main!(benches);
