//! # Invoice Ledger Benchmarks
//!
//! | Area | Operation | Target |
//! |------|-----------|--------|
//! | Proof of work | Seal at difficulty 1-3 | < 50ms at 3 |
//! | Validation | Full walk of 100 blocks | < 10ms |
//! | Hashing | Canonical hash of an invoice | < 50µs |
//! | Merkle | Root over 256 leaves | < 1ms |

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ledger_chain::test_utils::{build_chain, make_candidate, test_signer, ZERO_HASH};
use ledger_chain::{hash_payload, merkle_root, sha256_hex, ChainValidator, ProofOfWork};
use rand::Rng;
use serde_json::json;

// ============================================================================
// Proof of work
// ============================================================================

fn bench_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("proof-of-work");
    group.measurement_time(Duration::from_secs(10));

    for difficulty in 1..=3u32 {
        let pow = ProofOfWork::new(difficulty, 50_000_000).expect("valid difficulty");
        group.bench_with_input(
            BenchmarkId::new("seal", difficulty),
            &difficulty,
            |b, _| {
                let mut index = 0u64;
                b.iter(|| {
                    index += 1;
                    let candidate = make_candidate(index, ZERO_HASH);
                    black_box(pow.seal(&candidate).expect("seal within budget"))
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Validation
// ============================================================================

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    let signer = test_signer();

    for len in [10u64, 100] {
        let blocks = build_chain(len, 1, Some(&signer));
        let validator = ChainValidator::new().with_difficulty(1);

        group.throughput(Throughput::Elements(len));
        group.bench_with_input(BenchmarkId::new("validate_chain", len), &blocks, |b, blocks| {
            b.iter(|| {
                let report = validator.validate(black_box(blocks), Some(&signer));
                assert!(report.valid);
                report
            })
        });
    }

    group.finish();
}

// ============================================================================
// Hashing
// ============================================================================

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");
    let mut rng = rand::thread_rng();

    let line_items: Vec<_> = (0..20)
        .map(|i| json!({"sku": format!("SKU-{i}"), "qty": rng.gen_range(1..10), "price": rng.gen_range(1..10_000)}))
        .collect();
    let invoice = json!({
        "invoice_number": "INV-00042",
        "vendor_id": 101,
        "buyer_gstin": "29ABCDE0042F1Z5",
        "currency": "INR",
        "line_items": line_items,
    });

    group.bench_function("hash_payload_invoice", |b| {
        b.iter(|| black_box(hash_payload(black_box(&invoice)).expect("object hashes")))
    });

    for size in [16usize, 256] {
        let leaves: Vec<String> = (0..size)
            .map(|_| sha256_hex(&rng.gen::<[u8; 32]>()))
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("merkle_root", size), &leaves, |b, leaves| {
            b.iter(|| black_box(merkle_root(leaves).expect("hex leaves")))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_seal, bench_validate, bench_hashing);
criterion_main!(benches);
