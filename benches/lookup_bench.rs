// Benchmarks for registry lookups and content sniffing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use npmime::{MimeRegistry, SystemDatabaseConfig};
use tokio::runtime::Runtime;

fn registry() -> MimeRegistry {
    MimeRegistry::builder()
        .system_config(SystemDatabaseConfig::builtin_only())
        .build()
}

fn bench_get_extension(c: &mut Criterion) {
    let reg = registry();
    let mut group = c.benchmark_group("get_extension");

    // registered override, static table fallback, miss
    for extension in ["md", "png", "not-a-thing"] {
        group.bench_with_input(BenchmarkId::from_parameter(extension), &extension, |b, ext| {
            b.iter(|| reg.get_extension(black_box(ext)));
        });
    }

    group.finish();
}

fn bench_is_plain_text(c: &mut Criterion) {
    let reg = registry();
    let mut group = c.benchmark_group("is_plain_text");

    // charset hit, hierarchy walk, hierarchy miss
    for mime in ["text/markdown; charset=utf-8", "application/xml", "application/x-unknown"] {
        group.bench_with_input(BenchmarkId::from_parameter(mime), &mime, |b, mime| {
            b.iter(|| reg.is_plain_text(black_box(mime)));
        });
    }

    group.finish();
}

fn bench_mime(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let reg = registry();
    let test_dir = tempfile::tempdir().unwrap();

    let by_extension = test_dir.path().join("notes.md");
    let by_content = test_dir.path().join("image");
    std::fs::write(&by_extension, vec![b'a'; 1024]).unwrap();
    std::fs::write(&by_content, b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR").unwrap();

    let mut group = c.benchmark_group("mime");
    group.bench_function("extension", |b| b.iter(|| reg.mime(black_box(&by_extension))));
    group.bench_function("content", |b| b.iter(|| reg.mime(black_box(&by_content))));
    group.bench_function("content_async", |b| {
        b.to_async(&rt).iter(|| async { reg.mime_async(black_box(&by_content)).await });
    });
    group.finish();
}

criterion_group!(benches, bench_get_extension, bench_is_plain_text, bench_mime);
criterion_main!(benches);
