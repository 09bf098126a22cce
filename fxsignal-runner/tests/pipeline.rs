//! Integration tests for the full run: CSV in, enriched table out, and
//! the written outputs read back as inputs.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use fxsignal_core::diagnostics::Diagnostic;
use fxsignal_core::schema::{columns, ENRICHED_SCHEMA};
use fxsignal_runner::{prepare, run, RunConfig};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "fxsignal_runner_pipeline_{}_{id}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// 120 hourly EUR/USD-like bars with two rows swapped, one duplicate and
/// one unreadable timestamp.
fn write_messy_csv(dir: &Path) -> PathBuf {
    let mut rows: Vec<String> = (0..120)
        .map(|i| {
            let close = 1.10 + 0.003 * (i as f64 * 0.25).sin() + 0.00002 * i as f64;
            let open = close - 0.0004;
            format!(
                "2024-03-{:02} {:02}:00:00,{open:.5},{:.5},{:.5},{close:.5},{}",
                4 + i / 24,
                i % 24,
                close + 0.0008,
                open - 0.0008,
                100 + i
            )
        })
        .collect();
    rows.swap(10, 11);
    rows.insert(50, rows[49].clone());
    rows.insert(70, "garbage,1.1,1.2,1.0,1.1,5".to_string());

    let path = dir.join("eurusd.csv");
    let body = format!("Timestamp,Open,High,Low,Close,Volume\n{}\n", rows.join("\n"));
    std::fs::write(&path, body).unwrap();
    path
}

fn config(input: &str, output: Option<(&Path, &str)>) -> RunConfig {
    let mut toml = format!("pair = \"EURUSD\"\n\n[source]\n{input}\n");
    if let Some((path, format)) = output {
        toml.push_str(&format!(
            "\n[output]\npath = {:?}\nformat = \"{format}\"\n",
            path.display().to_string()
        ));
    }
    RunConfig::from_toml(&toml).unwrap()
}

fn csv_input(path: &Path) -> String {
    format!("type = \"csv\"\npath = {:?}", path.display().to_string())
}

#[test]
fn messy_csv_is_canonicalised_and_reported() {
    let dir = temp_dir();
    let csv = write_messy_csv(&dir);
    let (table, report) = prepare(&config(&csv_input(&csv), None)).unwrap();

    assert_eq!(table.len(), 120);
    assert!(table
        .bars()
        .windows(2)
        .all(|w| w[0].timestamp < w[1].timestamp));

    let has = |f: fn(&Diagnostic) -> bool| report.diagnostics.iter().any(f);
    assert!(has(|d| matches!(d, Diagnostic::Reordered)));
    assert!(has(|d| matches!(d, Diagnostic::DuplicateTimestamps { count: 1, .. })));
    assert!(has(|d| matches!(d, Diagnostic::UnparseableTimestamps { count: 1, .. })));
    assert!(!report.synthetic);
}

#[test]
fn csv_output_reads_back_to_the_same_table() {
    let dir = temp_dir();
    let csv = write_messy_csv(&dir);
    let out = dir.join("out/enriched.csv");
    let (first, _) = run(&config(&csv_input(&csv), Some((out.as_path(), "csv")))).unwrap();

    let (second, _) = prepare(&config(&csv_input(&out), None)).unwrap();
    assert_eq!(second.len(), first.len());
    assert_eq!(second.fingerprint(), first.fingerprint());
}

#[test]
fn parquet_output_reads_back_to_the_same_table() {
    let dir = temp_dir();
    let csv = write_messy_csv(&dir);
    let out = dir.join("enriched.parquet");
    let (first, report) =
        run(&config(&csv_input(&csv), Some((out.as_path(), "parquet")))).unwrap();
    assert_eq!(report.output.as_deref(), Some(out.as_path()));

    let input = format!("type = \"parquet\"\npath = {:?}", out.display().to_string());
    let (second, _) = prepare(&config(&input, None)).unwrap();
    assert_eq!(second.fingerprint(), first.fingerprint());
}

#[test]
fn json_output_has_one_object_per_bar() {
    let dir = temp_dir();
    let csv = write_messy_csv(&dir);
    let out = dir.join("enriched.jsonl");
    run(&config(&csv_input(&csv), Some((out.as_path(), "json")))).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    let rows: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), 120);
    for row in &rows {
        assert_eq!(row["pair"], "EUR/USD");
        for field in ENRICHED_SCHEMA {
            assert!(row.get(field.name).is_some(), "missing {}", field.name);
        }
    }
    assert!(rows[119][columns::ATR].as_f64().unwrap() > 0.0);
}

#[test]
fn date_window_and_resample_apply_before_enrichment() {
    let dir = temp_dir();
    let csv = write_messy_csv(&dir);
    let toml = format!(
        "pair = \"EUR/USD\"\nstart = \"2024-03-05\"\nend = \"2024-03-06\"\nresample_minutes = 120\n\n[source]\n{}\n",
        csv_input(&csv)
    );
    let (table, _) = prepare(&RunConfig::from_toml(&toml).unwrap()).unwrap();
    // two full days of hourly bars in two-hour buckets
    assert_eq!(table.len(), 24);
    assert_eq!(
        table.bars()[0].timestamp.format("%Y-%m-%d %H:%M").to_string(),
        "2024-03-05 00:00"
    );
}

#[test]
fn missing_input_file_is_a_load_error() {
    let dir = temp_dir();
    let missing = dir.join("nope.csv");
    let err = prepare(&config(&csv_input(&missing), None)).unwrap_err();
    assert!(matches!(err, fxsignal_runner::RunError::Load(_)));
}
