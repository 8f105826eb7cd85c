use criterion::{black_box, criterion_group, criterion_main, Criterion};
use exercise_catalog::{
    matching::{find_candidates, normalize, select_best},
    ExerciseRecord, ImageAsset, ImageMatcher, Snapshot, SourcePriority,
};

const WORDS: &[&str] = &[
    "curl", "press", "remo", "sentadilla", "biceps", "banca", "mancuerna", "barra", "polea",
    "inclinado",
];

fn create_test_records(count: usize) -> Vec<ExerciseRecord> {
    (0..count)
        .map(|i| {
            let a = WORDS[i % WORDS.len()];
            let b = WORDS[(i / WORDS.len()) % WORDS.len()];
            let slug = format!("{}-{}-{}", a, b, i);
            let name = format!("{} de {} {}", a, b, i);
            let source = if i % 2 == 0 { "a.json" } else { "b.json" };
            ExerciseRecord::new(source, Some(i as i64), Some(slug.as_str()), name)
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_stem", |b| {
        b.iter(|| black_box(normalize("Curl_De-Bíceps  con  MANCUERNA (v2)")));
    });
}

fn bench_find_and_select(c: &mut Criterion) {
    let priority = SourcePriority::new(["b.json", "a.json"]);

    for count in [100usize, 1000] {
        let records = create_test_records(count);
        c.bench_function(&format!("find_select_{}", count), |b| {
            b.iter(|| {
                let candidates = find_candidates("curl_biceps_mancuerna", &records);
                black_box(select_best(&candidates, &priority).map(|s| s.score))
            });
        });
    }
}

fn bench_pipeline_run(c: &mut Criterion) {
    let images: Vec<ImageAsset> = (0..50)
        .map(|i| ImageAsset::new(format!("/static/images/{}_{}.png", WORDS[i % WORDS.len()], i)))
        .collect();
    let snapshot = Snapshot::new(images, create_test_records(500));
    let matcher = ImageMatcher::new(SourcePriority::new(["a.json"]));

    c.bench_function("pipeline_50x500", |b| {
        b.iter(|| black_box(matcher.run(&snapshot).summary));
    });
}

criterion_group!(benches, bench_normalize, bench_find_and_select, bench_pipeline_run);
criterion_main!(benches);
