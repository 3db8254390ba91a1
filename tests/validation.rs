use lpkit::document::Status;
use lpkit::validate::{self, Diagnostic, Rule, Severity};
use lpkit::{Corpus, LocalStorage, LpkitConfig, RangePolicy, RangeRegistry, Storage};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_doc(dir: &Path, name: &str, header: &str, body: &str) {
    fs::write(dir.join(name), format!("---\n{}---\n{}", header, body)).unwrap();
}

fn load(root: &Path) -> (LpkitConfig, Corpus) {
    let config = LpkitConfig::load(root).unwrap();
    let storage = LocalStorage::open(config.documents_path(root)).unwrap();
    let corpus = Corpus::load(&storage, &config).unwrap();
    (config, corpus)
}

fn errors(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics.iter().filter(|d| d.is_error()).collect()
}

fn policy(low: u32, high: u32, name: &str, allowed: &[Status], forbidden: &[Status]) -> RangePolicy {
    RangePolicy {
        low,
        high,
        name: name.to_string(),
        allowed_statuses: allowed.iter().copied().collect(),
        required_status: None,
        forbidden_statuses: forbidden.iter().copied().collect(),
    }
}

#[test]
fn forbidden_status_yields_exactly_one_status_error() {
    let dir = tempdir().unwrap();
    let docs = dir.path().join("LPs");
    fs::create_dir(&docs).unwrap();
    write_doc(&docs, "lp-0100-base.md", "lp: 100\ntitle: Base\nstatus: Final\n", "");
    write_doc(&docs, "lp-0150-trial.md", "lp: 150\ntitle: Trial\nstatus: Final\n", "");

    let registry = RangeRegistry::new(vec![
        policy(100, 149, "Open", &[Status::Draft, Status::Final], &[]),
        policy(
            150,
            199,
            "Experimental",
            &[Status::Draft, Status::Final],
            &[Status::Final],
        ),
    ])
    .unwrap();

    let (_, corpus) = load(dir.path());
    let diagnostics = validate::validate(&corpus, &registry);
    let errors = errors(&diagnostics);

    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert_eq!(errors[0].rule, Rule::Status);
    assert_eq!(errors[0].document_id, Some(150));
}

#[test]
fn configured_ranges_replace_the_stock_table() {
    let dir = tempdir().unwrap();
    let docs = dir.path().join("LPs");
    fs::create_dir(&docs).unwrap();
    fs::write(
        dir.path().join("lpkit.json"),
        r#"{
            "ranges": [
                { "low": 100, "high": 199, "name": "Experimental",
                  "allowed_statuses": ["Draft", "Final"],
                  "forbidden_statuses": ["Final"] }
            ]
        }"#,
    )
    .unwrap();
    write_doc(&docs, "lp-0150-trial.md", "lp: 150\ntitle: Trial\nstatus: Final\n", "");

    let (config, corpus) = load(dir.path());
    let report = validate::run(&corpus, &config.registry().unwrap());

    assert!(!report.passed());
    assert_eq!(report.errors, 1);
    assert_eq!(report.diagnostics[0].rule, Rule::Status);
}

#[test]
fn superseded_without_successor_warns_once() {
    let dir = tempdir().unwrap();
    write_doc(dir.path(), "lp-0100-old.md", "lp: 100\ntitle: Old\nstatus: Superseded\n", "");
    write_doc(
        dir.path(),
        "lp-0101-older.md",
        "lp: 101\ntitle: Older\nstatus: Superseded\nsuperseded-by: 100\n",
        "",
    );

    let storage = LocalStorage::open(dir.path()).unwrap();
    let corpus = Corpus::load(&storage, &LpkitConfig::default()).unwrap();
    let report = validate::run(&corpus, &RangeRegistry::default());

    let superseded: Vec<&Diagnostic> = report
        .diagnostics
        .iter()
        .filter(|d| d.rule == Rule::Superseded)
        .collect();
    assert_eq!(superseded.len(), 1);
    assert_eq!(superseded[0].severity, Severity::Warning);
    assert_eq!(superseded[0].document_id, Some(100));
    assert!(report.passed());
}

#[test]
fn missing_requires_target_is_one_reference_error() {
    let dir = tempdir().unwrap();
    write_doc(dir.path(), "lp-0100-base.md", "lp: 100\ntitle: Base\nstatus: Final\n", "");
    write_doc(
        dir.path(),
        "lp-0200-user.md",
        "lp: 200\ntitle: User\nstatus: Draft\nrequires: [100, 404]\n",
        "",
    );

    let storage = LocalStorage::open(dir.path()).unwrap();
    let corpus = Corpus::load(&storage, &LpkitConfig::default()).unwrap();
    let diagnostics = validate::validate(&corpus, &RangeRegistry::default());

    let references: Vec<&Diagnostic> = diagnostics
        .iter()
        .filter(|d| d.rule == Rule::Reference)
        .collect();
    assert_eq!(references.len(), 1);
    assert!(references[0].is_error());
    assert_eq!(references[0].storage_name, "lp-0200-user.md");
    assert!(references[0].message.contains("LP-404"));
}

#[test]
fn block_list_requires_are_checked() {
    let dir = tempdir().unwrap();
    write_doc(dir.path(), "lp-0100-base.md", "lp: 100\ntitle: Base\nstatus: Final\n", "");
    write_doc(
        dir.path(),
        "lp-0300-user.md",
        "lp: 300\ntitle: User\nstatus: Draft\nrequires:\n  - 100\n  - 777\ndescription: >-\n  Extends LP-100\n",
        "",
    );

    let storage = LocalStorage::open(dir.path()).unwrap();
    let corpus = Corpus::load(&storage, &LpkitConfig::default()).unwrap();
    let diagnostics = validate::validate(&corpus, &RangeRegistry::default());

    let references: Vec<&Diagnostic> = diagnostics
        .iter()
        .filter(|d| d.rule == Rule::Reference)
        .collect();
    assert_eq!(references.len(), 1, "{:?}", references);
    assert!(references[0].message.contains("LP-777"));
    assert_eq!(
        corpus.get(300).unwrap().record().unwrap().requires,
        vec![100, 777]
    );
}

#[test]
fn every_issue_is_collected_in_one_run() {
    let dir = tempdir().unwrap();
    write_doc(dir.path(), "lp-0100-a.md", "lp: 100\ntitle: A\nstatus: Final\n", "");
    write_doc(dir.path(), "lp-0100-b.md", "lp: 100\ntitle: B\nstatus: Final\n", "");
    write_doc(dir.path(), "lp-0300-c.md", "lp: 300\nstatus: Bogus\n", "See LP-777.\n");
    fs::write(dir.path().join("lp-0400-d.md"), "no header at all\n").unwrap();
    fs::write(dir.path().join("TEMPLATE.md"), "---\nlp: x\n---\n").unwrap();

    let storage = LocalStorage::open(dir.path()).unwrap();
    let corpus = Corpus::load(&storage, &LpkitConfig::default()).unwrap();
    let diagnostics = validate::validate(&corpus, &RangeRegistry::default());

    let rules: BTreeSet<Rule> = diagnostics.iter().map(|d| d.rule).collect();
    for rule in [
        Rule::Parse,
        Rule::Duplicate,
        Rule::Status,
        Rule::Required,
        Rule::Reference,
    ] {
        assert!(rules.contains(&rule), "missing {:?} in {:?}", rule, diagnostics);
    }
    assert!(diagnostics.iter().all(|d| d.storage_name != "TEMPLATE.md"));

    // Unparseable documents sort first, then by id.
    assert_eq!(diagnostics[0].document_id, None);
    let ids: Vec<u32> = diagnostics.iter().filter_map(|d| d.document_id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[test]
fn validation_is_deterministic() {
    let dir = tempdir().unwrap();
    write_doc(dir.path(), "lp-0100-a.md", "lp: 100\nstatus: Superseded\n", "LP-9 LP-8\n");
    write_doc(dir.path(), "lp-0200-b.md", "lp: 200\ntitle: B\nstatus: Odd\n", "");

    let storage = LocalStorage::open(dir.path()).unwrap();
    let corpus = Corpus::load(&storage, &LpkitConfig::default()).unwrap();

    let first = validate::validate(&corpus, &RangeRegistry::default());
    let second = validate::validate(&corpus, &RangeRegistry::default());
    assert_eq!(first, second);
    assert_eq!(storage.list().unwrap().len(), 2);
}
