//! Aggregation planner (C5) throughput: stacking the three aggregation
//! levels atop a handful of per-resource plans.
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use query::aggregate::{build_aggregate_plan, CellField, ColumnSpec};
use query::plan::{build_resource_plan, Selection};
use schema::{FieldCatalogue, FieldDescriptor, FieldType, Label, ResourceConfig, ResourceField};

fn fixture_resources(n: usize) -> (FieldCatalogue, Vec<ResourceConfig>) {
    let mut fields = indexmap::IndexMap::new();
    for name in ["entry_word", "part_of_speech"] {
        fields.insert(
            name.to_string(),
            FieldDescriptor {
                name: name.to_string(),
                field_type: FieldType::Text,
                collection: false,
                label: Label::Plain(name.to_string()),
                fields: None,
                resource_id: Vec::new(),
            },
        );
    }
    let catalogue = FieldCatalogue { fields };

    let resources = (0..n)
        .map(|i| ResourceConfig {
            resource_id: format!("resource_{i}"),
            fields: vec![
                ResourceField { name: "entry_word".to_string(), primary: true },
                ResourceField { name: "part_of_speech".to_string(), primary: false },
            ],
            label: Default::default(),
            description: None,
            entry_word: schema::EntryWord { field: "entry_word".to_string(), description: None },
            updated: None,
            size: None,
            link: None,
            tags: Vec::new(),
            limited_access: false,
        })
        .collect();
    (catalogue, resources)
}

fn bench_build_aggregate_plan(c: &mut Criterion) {
    let (catalogue, resources) = fixture_resources(8);
    let query = query::parse_query("").unwrap();
    let compile = vec!["part_of_speech".to_string()];
    let columns = ColumnSpec { explode_field: "resource_id".to_string(), cell_field: CellField::Count };

    c.bench_function("build_aggregate_plan_8_resources", |b| {
        b.iter(|| {
            let per_resource: Vec<_> = resources
                .iter()
                .filter_map(|r| build_resource_plan(&catalogue, r, &Selection::All, &query, &[]).unwrap())
                .collect();
            let plan = build_aggregate_plan(black_box(per_resource), black_box(&compile), black_box(&columns), &[]).unwrap();
            black_box(plan);
        })
    });
}

criterion_group!(benches, bench_build_aggregate_plan);
criterion_main!(benches);
