use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sonoslice::{
    phantom, RealTimeUpdateService, SectionVisualizationService, Segment, UpdateSettings, Vector3,
    VisualizationOptions,
};

fn bench_cache_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_section_miss");

    for (n_lat, n_lon) in [(32u32, 64u32), (100, 200)] {
        let mesh = phantom::uv_sphere(Vector3::zero(), 50.0, n_lat, n_lon).unwrap();
        let settings = UpdateSettings {
            cache_size_limit: 0,
            ..Default::default()
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(mesh.num_triangles()),
            &mesh,
            |b, mesh| {
                let mut service = RealTimeUpdateService::new(settings.clone()).unwrap();
                let mut z = 0.0;
                b.iter(|| {
                    // Walk the probe so temporal coherence sees realistic motion.
                    z = if z > 40.0 { -40.0 } else { z + 0.37 };
                    black_box(service.update_section(
                        Vector3::new(0.0, 0.0, z),
                        Vector3::new(0.1, 0.05, 1.0),
                        black_box(mesh),
                    ))
                })
            },
        );
    }

    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let mesh = phantom::uv_sphere(Vector3::zero(), 50.0, 100, 200).unwrap();
    let mut service = RealTimeUpdateService::default();
    let position = Vector3::new(0.0, 0.0, 12.5);
    service.update_section(position, Vector3::z_axis(), &mesh);

    c.bench_function("update_section_hit", |b| {
        b.iter(|| black_box(service.update_section(position, Vector3::z_axis(), black_box(&mesh))))
    });
}

fn bench_visualization_config(c: &mut Criterion) {
    let lines: Vec<Segment> = (0..10_000)
        .map(|i| {
            let t = i as f64 * 0.01;
            Segment::new(Vector3::new(t, 0.0, 0.0), Vector3::new(t, 1.0, 0.0))
        })
        .collect();
    let options = VisualizationOptions {
        opacity: Some(0.8),
        highlight: true,
        ..Default::default()
    };

    c.bench_function("visualization_config_10k", |b| {
        b.iter(|| {
            black_box(SectionVisualizationService.get_visualization_config(black_box(&lines), &options))
        })
    });
}

criterion_group!(
    benches,
    bench_cache_miss,
    bench_cache_hit,
    bench_visualization_config
);
criterion_main!(benches);
