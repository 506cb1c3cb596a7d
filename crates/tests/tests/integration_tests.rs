use query::aggregate::CellField;
use query::plan::{build_resource_plan, Selection};
use storage::{assemble_count, assemble_search, AggregateRow, ExplodedCell, Header, ResourceHits};
use tests::{catalogue, hit, resource_ao, resource_saldo};

/// S1: a single resource, every hit matches the query exactly, and
/// `resource_hits["ao"]` accounts for the whole total.
#[test]
fn test_s1_search_single_resource() {
    let catalogue = catalogue();
    let ao = resource_ao();
    let query = query::parse_query("equals|entry_word|eventuell").unwrap();

    let plan = build_resource_plan(&catalogue, &ao, &Selection::All, &query, &[]).unwrap();
    assert!(plan.is_some(), "ao declares entry_word, so it must not be schema-firewalled");

    // Stand in for the decoded rows a live fetch against that plan would
    // have produced: one matching hit.
    let result = assemble_search(
        vec![ResourceHits {
            resource_id: "ao".to_string(),
            fields: vec!["entry_word".to_string()],
            rows: vec![vec![serde_json::Value::String("eventuell".to_string())]],
            total_count: 1,
        }],
        25,
    );

    assert_eq!(result.total, 1);
    assert_eq!(result.resource_hits.get("ao"), Some(&1));
    assert_eq!(result.hits, vec![hit("ao", "eventuell")]);
}

/// S2: `compile=[entry_word]`, `columns=resourceId=_count` default headers
/// are `[compile(entry_word), total, count(ao)]`, and the row's last cell
/// carries the per-resource count.
#[test]
fn test_s2_count_default_headers() {
    let cell_field = CellField::from_name("_count");
    let row = AggregateRow {
        compile_values: vec![serde_json::Value::String("eventuell".to_string())],
        cells: vec![ExplodedCell { explode_value: serde_json::Value::String("ao".to_string()), count: 3, values: Vec::new() }],
    };

    let result = assemble_count(&["entry_word".to_string()], "resource_id", &cell_field, vec![row], None);

    assert_eq!(
        result.headers,
        vec![
            Header::Compile { column_field: "entry_word".to_string() },
            Header::Total,
            Header::Count { header_field: "resource_id".to_string(), header_value: "ao".to_string() },
        ]
    );
    assert_eq!(result.rows[0].last().unwrap().count, 3);
    assert_eq!(result.rows[0][0].value, Some(serde_json::Value::String("eventuell".to_string())));
}

/// S3: only `saldo` declares `part_of_speech`; `ao` must be dropped by the
/// schema firewall rather than erroring.
#[test]
fn test_s3_heterogeneous_resources_drop_unsupported() {
    let catalogue = catalogue();
    let ao = resource_ao();
    let saldo = resource_saldo();
    let query = query::parse_query("equals|part_of_speech|nn").unwrap();

    let ao_plan = build_resource_plan(&catalogue, &ao, &Selection::All, &query, &[]).unwrap();
    let saldo_plan = build_resource_plan(&catalogue, &saldo, &Selection::All, &query, &[]).unwrap();

    assert!(ao_plan.is_none(), "ao has no part_of_speech field and must be dropped, not errored");
    assert!(saldo_plan.is_some());

    let resource_order: Vec<String> = [ao_plan, saldo_plan]
        .into_iter()
        .zip(["ao", "saldo"])
        .filter_map(|(plan, id)| plan.map(|_| id.to_string()))
        .collect();
    assert_eq!(resource_order, vec!["saldo".to_string()]);
}

/// S4: stitching a 7-row and a 5-row resource at from=5, size=10. Only 7 rows
/// exist past offset 5, so the page is 7 rows, not 10 — see the pagination
/// arithmetic tests in `storage::pager` for the derivation.
#[test]
fn test_s4_pagination_stitch_assembles_in_resource_order() {
    let a_rows: Vec<Vec<serde_json::Value>> = (5..7).map(|i| vec![serde_json::Value::String(format!("a{i}"))]).collect();
    let b_rows: Vec<Vec<serde_json::Value>> = (0..5).map(|i| vec![serde_json::Value::String(format!("b{i}"))]).collect();

    let result = assemble_search(
        vec![
            ResourceHits { resource_id: "a".to_string(), fields: vec!["entry_word".to_string()], rows: a_rows, total_count: 7 },
            ResourceHits { resource_id: "b".to_string(), fields: vec!["entry_word".to_string()], rows: b_rows, total_count: 5 },
        ],
        10,
    );

    assert_eq!(result.hits.len(), 7);
    assert_eq!(result.resource_order, vec!["a".to_string(), "b".to_string()]);
    assert!(result.hits[..2].iter().all(|h| h.resource_id == "a"));
    assert!(result.hits[2..].iter().all(|h| h.resource_id == "b"));
}
