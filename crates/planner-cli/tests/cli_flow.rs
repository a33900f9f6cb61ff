use std::ffi::OsString;
use std::fs;
use std::path::Path;

use planner_cli::datastore::DataStore;
use tempfile::tempdir;

const CREATE: &str = r#"{"type":"PATCH_TASKS","created":[{"id":"hw","order":2,"name":"HW 3","tag":"NONE","complete":false,"inFocus":true,"metadata":{"type":"ONE_TIME","date":"2026-10-21T23:59:00Z"}},{"id":"lab","order":1,"name":"Lab report","tag":"NONE","complete":false,"inFocus":false,"metadata":{"type":"ONE_TIME","date":"2026-10-21T15:00:00Z"}}]}"#;

fn run(rc: &Path, data: &Path, rest: &[&str]) -> anyhow::Result<()> {
    let mut args: Vec<OsString> = vec![
        "planner".into(),
        "--plannerrc".into(),
        rc.into(),
        "--data".into(),
        data.into(),
    ];
    args.extend(rest.iter().map(OsString::from));
    planner_cli::run(args)
}

#[test]
fn apply_persists_and_rejected_batches_leave_snapshot_alone() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("plannerrc");
    fs::write(&rc, "color = off\ntimezone = UTC\n").expect("write rc");
    let data = temp.path().join("data");

    let create = temp.path().join("create.jsonl");
    fs::write(&create, format!("{CREATE}\n")).expect("write patch");
    run(&rc, &data, &["apply", create.to_str().expect("utf8 path")]).expect("apply create");

    let store = DataStore::open(&data).expect("open datastore");
    let saved = store.load_state().expect("load state");
    assert_eq!(saved.tasks.len(), 2);
    let day = chrono::NaiveDate::from_ymd_opt(2026, 10, 21).expect("valid date");
    assert_eq!(saved.date_task_map[&day].len(), 2);

    let bad = temp.path().join("bad.jsonl");
    fs::write(
        &bad,
        concat!(
            r#"{"type":"PATCH_TASKS","deleted":["hw"]}"#,
            "\n",
            r#"{"type":"PATCH_TASKS","deleted":["ghost"]}"#,
            "\n"
        ),
    )
    .expect("write patch");
    let err = run(&rc, &data, &["apply", bad.to_str().expect("utf8 path")])
        .expect_err("missing task is rejected by default");
    assert!(format!("{err:#}").contains("ghost"));
    assert_eq!(store.load_state().expect("reload"), saved);

    run(
        &rc,
        &data,
        &["rc.store.missing_task=skip", "apply", bad.to_str().expect("utf8 path")],
    )
    .expect("skip policy tolerates missing ids");
    let after = store.load_state().expect("reload");
    assert!(!after.tasks.contains_key("hw"));
    assert!(after.tasks.contains_key("lab"));
}

#[test]
fn read_only_commands_run_against_the_snapshot() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("plannerrc");
    fs::write(&rc, "color = off\n").expect("write rc");
    let data = temp.path().join("data");

    let create = temp.path().join("create.jsonl");
    fs::write(&create, format!("{CREATE}\n")).expect("write patch");
    run(&rc, &data, &["apply", create.to_str().expect("utf8 path")]).expect("apply");

    run(&rc, &data, &["show"]).expect("show");
    run(&rc, &data, &["day", "2026-10-21"]).expect("day");
    run(&rc, &data, &["focus"]).expect("focus");
    assert!(run(&rc, &data, &["occurrences", "hw", "2026-10-01", "2026-10-31"]).is_err());

    let list = temp.path().join("list.json");
    fs::write(&list, r#"[{"id":"a","order":1},{"id":"b","order":2}]"#).expect("write list");
    run(
        &rc,
        &data,
        &["reorder", list.to_str().expect("utf8 path"), "--from", "2", "--to", "1"],
    )
    .expect("reorder");
}
