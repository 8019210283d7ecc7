use alloc_tracer::aggregator::CountTable;
use alloc_tracer::output::{
    build_report, read_report, render_lifetime_html, render_table, render_table_html,
    write_report, write_text, KeyCell, RawClassIds,
};
use alloc_tracer::{AllocationEvent, AllocationObserver, AllocationTracer, FreeEvent, ObjectId, ValueType};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn traced() -> AllocationTracer {
    let tracer = AllocationTracer::new();
    tracer.setup(&["path", "line", "class"]).unwrap();
    tracer.lifetime_table_setup(true);
    let user = tracer.intern_class("User");

    tracer.start().unwrap();
    for (object, line) in [(1u64, 10u32), (2, 10), (3, 20)] {
        tracer.notify_allocate(&AllocationEvent {
            object: ObjectId(object),
            path: Some("app.rb"),
            line,
            value_type: ValueType::Object,
            class: Some(user),
        });
    }
    tracer.generation_tick();
    tracer.notify_free(&FreeEvent {
        object: ObjectId(3),
        value_type: ValueType::Object,
        size_bytes: 80,
        is_old: false,
    });
    tracer
}

#[test]
fn test_render_table_resolves_class_names() {
    let tracer = traced();
    let result = tracer.stop().unwrap();

    assert_eq!(
        render_table(&result, None, &tracer),
        "path\tline\tclass\tcount\told_count\ttotal_age\tmin_age\tmax_age\ttotal_memsize\n\
         app.rb\t10\tUser\t2\t0\t0\t0\t0\t0\n\
         app.rb\t20\tUser\t1\t0\t1\t1\t1\t80\n"
    );
    assert!(render_table(&result, None, &RawClassIds).contains("#<class:0>"));
}

#[test]
fn test_render_table_sorted_by_memsize() {
    let tracer = traced();
    let result = tracer.stop().unwrap();

    let text = render_table(&result, Some(8), &tracer);
    let first_row = text.lines().nth(1).unwrap();
    assert!(first_row.starts_with("app.rb\t20\t"));
}

#[test]
fn test_html_outputs() {
    let tracer = traced();
    let result = tracer.stop().unwrap();

    let html = render_table_html(&result, None, &tracer);
    assert!(html.contains("<th><a href='./?s=2'>class</a></th>"));
    assert!(html.contains("<td>User</td>"));

    let lifetime = tracer.lifetime_table().unwrap();
    let html = render_lifetime_html(&lifetime);
    assert!(html.contains("<tr><td>object</td><td>0</td><td>1</td></tr>"));
}

#[test]
fn test_write_and_read_report() {
    let tracer = traced();
    let result = tracer.stop().unwrap();
    let lifetime = tracer.lifetime_table();

    let report = build_report(
        &result,
        lifetime.as_ref(),
        &tracer.allocated_count_table(),
        &tracer.freed_count_table(),
        &tracer,
    );
    let temp_file = NamedTempFile::new().unwrap();
    write_report(&report, temp_file.path()).unwrap();

    let loaded = read_report(temp_file.path()).unwrap();
    assert_eq!(loaded, report);
    assert_eq!(
        loaded.rows[0].key,
        vec![
            KeyCell::Text("app.rb".to_string()),
            KeyCell::Number(10),
            KeyCell::Text("User".to_string())
        ]
    );
    assert_eq!(loaded.allocated_counts["object"], 3);
    assert_eq!(loaded.lifetime.unwrap()["object"], vec![0, 1]);
}

#[test]
fn test_report_without_lifetime_omits_field() {
    let tracer = AllocationTracer::new();
    let result = tracer.trace(|| {}).unwrap();
    let report = build_report(
        &result,
        None,
        &CountTable::new(),
        &CountTable::new(),
        &RawClassIds,
    );

    let value = serde_json::to_value(&report).unwrap();
    assert!(value.get("lifetime").is_none());
    assert_eq!(value["rows"], serde_json::json!([]));
}

#[test]
fn test_write_text_creates_parent_dirs() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("table.tsv");

    write_text("path\tline\n", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "path\tline\n");
}

#[test]
fn test_write_text_rejects_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    assert!(write_text("x", temp_dir.path()).is_err());
}
