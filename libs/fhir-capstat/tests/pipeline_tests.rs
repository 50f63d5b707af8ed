use ferrum_capstat::{
    extract, process_document, read_table_file, ConformanceRecord, DefaultsStore, Error,
    Extraction, Outcome, COLUMNS,
};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const PLACER: &str = "CapabilityStatement-au-erequesting-placer.xml";
const FILLER: &str = "CapabilityStatement-au-erequesting-filler.xml";
const BROKEN: &str = "CapabilityStatement-au-erequesting-broken.xml";

/// Helper to get test data directory
fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

fn defaults_path() -> PathBuf {
    test_data_dir().join("actor.json")
}

fn run(document: &str, out: &TempDir) -> Outcome {
    process_document(test_data_dir().join(document), out.path(), defaults_path())
        .expect("processing failed")
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_placer_table_rows() {
    let out = TempDir::new().unwrap();
    let outcome = run(PLACER, &out);

    let Outcome::Written {
        actor,
        output,
        records,
        ..
    } = outcome
    else {
        panic!("expected a written table, got {outcome:?}");
    };
    assert_eq!(actor, "placer");
    assert_eq!(records, 3);
    assert_eq!(output, out.path().join("placer.tsv"));

    let rows = read_table_file(&output).unwrap();
    assert_eq!(
        rows[0],
        ConformanceRecord {
            resource: "Patient".into(),
            resource_conformance: "SHALL".into(),
            default_resource_conformance: "SHALL".into(),
            profile_conformance: "my-patient:SHOULD".into(),
            default_profile_conformance: "SHOULD".into(),
            interaction: "SHALL read, SHOULD create".into(),
            default_interaction: "SHALL read, SHOULD search-type".into(),
            search_params: "name:SHALL".into(),
            default_search_params: "_id:SHALL,patient:SHOULD".into(),
        }
    );
    assert_eq!(rows[1].resource, "ServiceRequest");
    assert_eq!(
        rows[1].profile_conformance,
        "au-erequesting-servicerequest-path:SHALL,au-erequesting-servicerequest-imag:SHALL"
    );
    assert_eq!(rows[1].interaction, "SHALL search-type, SHALL update");
    assert_eq!(rows[1].search_params, "");

    assert_eq!(rows[2].resource, "Encounter");
    assert_eq!(rows[2].resource_conformance, "");
    assert_eq!(rows[2].default_resource_conformance, "SHALL");
}

#[test]
fn test_header_is_fixed() {
    let out = TempDir::new().unwrap();
    run(PLACER, &out);

    let content = fs::read_to_string(out.path().join("placer.tsv")).unwrap();
    let header = content.split("\r\n").next().unwrap();
    assert_eq!(header.split('\t').collect::<Vec<_>>(), COLUMNS);
}

#[test]
fn test_rerun_is_byte_identical() {
    let out = TempDir::new().unwrap();
    run(PLACER, &out);
    let first = fs::read(out.path().join("placer.tsv")).unwrap();
    run(PLACER, &out);
    let second = fs::read(out.path().join("placer.tsv")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_row_count_matches_resources() {
    let xml = fs::read_to_string(test_data_dir().join(PLACER)).unwrap();
    let doc = ferrum_capstat::CapabilityDocument::parse(&xml).unwrap();
    let out = TempDir::new().unwrap();
    run(PLACER, &out);
    let rows = read_table_file(out.path().join("placer.tsv")).unwrap();
    assert_eq!(rows.len(), doc.resource_count());
}

// ============================================================================
// Degraded inputs
// ============================================================================

#[test]
fn test_document_without_resources_writes_nothing() {
    let out = TempDir::new().unwrap();
    let outcome = run(FILLER, &out);
    assert!(matches!(outcome, Outcome::NoResources { .. }));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_document_without_resources_ignores_malformed_defaults() {
    let out = TempDir::new().unwrap();
    let defaults = out.path().join("actor.json");
    fs::write(&defaults, "{ broken").unwrap();

    let outcome =
        process_document(test_data_dir().join(FILLER), out.path(), &defaults).unwrap();
    assert!(matches!(outcome, Outcome::NoResources { .. }));
}

#[test]
fn test_malformed_document_is_an_error() {
    let out = TempDir::new().unwrap();
    let err = process_document(test_data_dir().join(BROKEN), out.path(), defaults_path())
        .unwrap_err();
    assert!(matches!(err, Error::Xml { .. }), "unexpected error: {err}");
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_document_is_an_io_error() {
    let out = TempDir::new().unwrap();
    let err = process_document(
        test_data_dir().join("CapabilityStatement-absent-placer.xml"),
        out.path(),
        defaults_path(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn test_non_xml_name_is_skipped() {
    let out = TempDir::new().unwrap();
    let outcome = process_document(
        test_data_dir().join("actor.json"),
        out.path(),
        defaults_path(),
    )
    .unwrap();
    assert!(matches!(outcome, Outcome::Skipped { .. }));
}

#[test]
fn test_missing_defaults_file_gives_empty_defaults() {
    let out = TempDir::new().unwrap();
    process_document(
        test_data_dir().join(PLACER),
        out.path(),
        out.path().join("no-such-actor.json"),
    )
    .unwrap();

    let rows = read_table_file(out.path().join("placer.tsv")).unwrap();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.default_resource_conformance, "");
        assert_eq!(row.default_profile_conformance, "");
        assert_eq!(row.default_interaction, "");
        assert_eq!(row.default_search_params, "");
    }
    assert_eq!(rows[0].resource_conformance, "SHALL");
}

#[test]
fn test_malformed_defaults_fail_the_document() {
    let out = TempDir::new().unwrap();
    let defaults = out.path().join("actor.json");
    fs::write(&defaults, "{\"resourceConformance\": ").unwrap();

    let err = process_document(test_data_dir().join(PLACER), out.path(), &defaults).unwrap_err();
    assert!(matches!(err, Error::Defaults { .. }));
    assert!(!out.path().join("placer.tsv").exists());
}

// ============================================================================
// Defaults fallback
// ============================================================================

#[test]
fn test_defaults_apply_only_to_configured_actor() {
    let defaults = DefaultsStore::load(defaults_path()).unwrap();
    let path = test_data_dir().join(PLACER);

    let Extraction::Records(filler) = extract(&path, "filler", &defaults).unwrap() else {
        panic!("expected records");
    };
    assert_eq!(filler[0].default_resource_conformance, "SHOULD");
    assert_eq!(filler[0].default_profile_conformance, "");
    assert_eq!(filler[0].default_interaction, "");

    let Extraction::Records(other) = extract(&path, "pathology", &defaults).unwrap() else {
        panic!("expected records");
    };
    assert!(other.iter().all(|r| r.default_resource_conformance.is_empty()));
}

// ============================================================================
// Notices
// ============================================================================

/// Shared buffer collecting formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Run `f` with an INFO-level subscriber writing into a fresh buffer.
fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.lines())
}

#[test]
fn test_empty_document_logs_one_notice() {
    let out = TempDir::new().unwrap();
    let (outcome, lines) = capture_logs(|| run(FILLER, &out));
    assert!(matches!(outcome, Outcome::NoResources { .. }));

    let notices: Vec<_> = lines
        .iter()
        .filter(|l| l.contains("No resource elements found"))
        .collect();
    assert_eq!(notices.len(), 1, "{lines:?}");
    assert!(notices[0].contains(FILLER));
    assert!(!lines.iter().any(|l| l.contains("Processed CapabilityStatement")));
}

#[test]
fn test_processed_document_logs_completion() {
    let out = TempDir::new().unwrap();
    let (_, lines) = capture_logs(|| run(PLACER, &out));

    let completions: Vec<_> = lines
        .iter()
        .filter(|l| l.contains("Processed CapabilityStatement"))
        .collect();
    assert_eq!(completions.len(), 1, "{lines:?}");
    let line = completions[0];
    assert!(line.contains("actor=placer"), "{line}");
    assert!(line.contains(&format!("source={PLACER}")), "{line}");
    assert!(
        line.contains(&format!("output={}", out.path().join("placer.tsv").display())),
        "{line}"
    );
}
