//! TLS directive compilation benchmarks
//!
//! Measures assembly of typical host blocks and the OpenSSL context build.
//!
//! Run with: cargo bench --bench assemble

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tlspolicy::tls::{assemble, HostContext, ServerContext, SubDirective, TlsDirective};

fn minimal_directive() -> TlsDirective {
    TlsDirective::new(1, ["admin@example.com"])
}

fn full_directive() -> TlsDirective {
    TlsDirective::new(1, Vec::<String>::new()).with_block(vec![
        SubDirective::new(2, "protocols", ["tls1.2", "tls1.3"]),
        SubDirective::new(
            3,
            "ciphers",
            [
                "ECDHE-ECDSA-AES256-GCM-SHA384",
                "ECDHE-RSA-AES256-GCM-SHA384",
                "ECDHE-ECDSA-WITH-CHACHA20-POLY1305",
                "ECDHE-RSA-WITH-CHACHA20-POLY1305",
            ],
        ),
        SubDirective::new(4, "curves", ["x25519", "p256"]),
        SubDirective::new(5, "clients", ["verify_if_given", "ca1.crt", "ca2.crt"]),
        SubDirective::new(6, "key_type", ["p384"]),
        SubDirective::new(7, "alpn", ["h2", "http/1.1"]),
        SubDirective::flag(8, "must_staple"),
        SubDirective::flag(9, "wildcard"),
    ])
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");
    let host = HostContext::new("www.example.com");
    let minimal = minimal_directive();
    let full = full_directive();

    group.bench_function("email_only", |b| {
        b.iter(|| black_box(assemble(black_box(&host), black_box(&minimal)).unwrap()));
    });

    group.bench_function("full_block", |b| {
        b.iter(|| black_box(assemble(black_box(&host), black_box(&full)).unwrap()));
    });

    group.finish();
}

fn bench_server_context(c: &mut Criterion) {
    let host = HostContext::new("www.example.com");
    let config = assemble(&host, &TlsDirective::new(1, ["self_signed"])).unwrap();

    c.bench_function("server_context_self_signed", |b| {
        b.iter(|| black_box(ServerContext::from_config(black_box(&config)).unwrap()));
    });
}

criterion_group!(benches, bench_assemble, bench_server_context);
criterion_main!(benches);
