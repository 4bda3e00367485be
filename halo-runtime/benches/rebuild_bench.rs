use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use halo_dom::Document;
use halo_runtime::{Config, Instance, Options};
use serde_json::{Value, json};

fn rows(count: usize, tag: &str) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| json!({ "id": i, "label": format!("{tag}-{i}") }))
        .collect();
    Value::Array(items)
}

fn mount(count: usize) -> Instance {
    Instance::new(
        Options::new()
            .document(Document::parse(r#"<div id="app"></div>"#).unwrap())
            .el("#app")
            .template(r#"<ul><li m-for="row in rows" title="{{row.id}}">{{row.label}}</li></ul><p m-if="ok">{{count}}</p>"#)
            .data(json!({ "rows": rows(count, "a"), "ok": true, "count": 0 }))
            .config(Config {
                silent: true,
                ..Config::default()
            }),
    )
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    group.sample_size(20);
    for &count in &[50usize, 200, 1000] {
        group.bench_with_input(BenchmarkId::new("scalar_set", count), &count, |b, &n| {
            let mut vm = mount(n);
            let mut i = 0;
            b.iter(|| {
                i += 1;
                vm.set("count", json!(i));
            });
        });
        group.bench_with_input(BenchmarkId::new("replace_rows", count), &count, |b, &n| {
            let mut vm = mount(n);
            let (a, z) = (rows(n, "a"), rows(n, "z"));
            let mut flip = false;
            b.iter(|| {
                flip = !flip;
                vm.set("rows", if flip { z.clone() } else { a.clone() });
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rebuild);
criterion_main!(benches);
