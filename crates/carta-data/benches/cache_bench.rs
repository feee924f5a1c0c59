use carta_core::renderer::{ResourceHandle, ResourceId, ResourceKind};
use carta_data::{CacheBudgets, Footprint, GeometryKey, RenderDataCache};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

struct Model([f32; 16]);

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("Render-data cache");

    group.bench_function("Insert under eviction pressure", |b| {
        let cache = RenderDataCache::new(CacheBudgets {
            gpu_max_bytes: 1_000 * 4096,
            ..CacheBudgets::default()
        });
        let mut next = 0u32;
        b.iter(|| {
            let handle =
                ResourceHandle::new(ResourceId(next as u64), ResourceKind::Texture, 4096);
            let key = GeometryKey::from_raw_parts(next, 0);
            next = next.wrapping_add(1);
            black_box(
                cache
                    .insert(key, Model([0.0; 16]), Footprint::host(64).with_handle(handle))
                    .is_ok(),
            );
        });
    });

    group.bench_function("Lookup hit", |b| {
        let cache = RenderDataCache::default();
        for i in 0..10_000u32 {
            let _ = cache.insert(
                GeometryKey::from_raw_parts(i, 0),
                Model([i as f32; 16]),
                Footprint::host(64),
            );
        }
        let mut i = 0u32;
        b.iter(|| {
            let key = GeometryKey::from_raw_parts(i % 10_000, 0);
            i = i.wrapping_add(1);
            black_box(cache.get_cache_association::<Model>(key, None).is_some());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cache);
criterion_main!(benches);
