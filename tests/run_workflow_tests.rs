// End-to-end run lifecycle against a real git repository.
// dbt is scripted; git, the filesystem and the state layout are real.

mod fixtures;

use dbt_state_runner::config::ToolSettings;
use dbt_state_runner::external::{DbtCli, GitClient, ProcessCommandExecutor, DEFAULT_SELECTION};
use dbt_state_runner::{ProjectLayout, RunOrchestrator, RunOutcome, TerminalPrompt, WarehouseIdentity, WorkflowError};
use fixtures::test_harness::{PLAIN_MACRO, UDF_MACRO, UDF_SOURCE};
use fixtures::{ScriptedDbt, TestHarness};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

fn orchestrator(harness: &TestHarness, dbt: Arc<ScriptedDbt>, identity: WarehouseIdentity) -> RunOrchestrator {
    let root = harness.path().canonicalize().unwrap();
    let layout = ProjectLayout::new(&root);
    let dbt_cli = DbtCli::new(dbt, &ToolSettings::default(), layout.dbt_dir());
    let git = GitClient::new(Arc::new(ProcessCommandExecutor), &root);
    RunOrchestrator::new(layout, identity, dbt_cli, Arc::new(git))
}

fn acct1() -> WarehouseIdentity {
    WarehouseIdentity::new("acct1", "db1", "schema1")
}

fn answering(input: &str) -> TerminalPrompt<Cursor<String>, Vec<u8>> {
    TerminalPrompt::new(Cursor::new(input.to_string()), Vec::new())
}

fn assert_macros_pristine(harness: &TestHarness) {
    assert_eq!(harness.read_file("dbt/macros/udfs.sql").unwrap(), UDF_MACRO);
    assert_eq!(harness.read_file("dbt/macros/money.sql").unwrap(), PLAIN_MACRO);
    assert!(harness.unstaged_files().unwrap().is_empty());
}

#[tokio::test]
async fn test_first_run_stages_state_and_restores_macros() {
    let harness = TestHarness::new().unwrap();
    let dbt = Arc::new(ScriptedDbt::succeeding());
    let orchestrator = orchestrator(&harness, dbt.clone(), acct1());

    let report = orchestrator
        .execute(Some(DEFAULT_SELECTION), &mut answering("y\n"))
        .await
        .unwrap();

    assert!(matches!(report.outcome, RunOutcome::Completed { used_prior_state: false, .. }));

    let runs = dbt.runs();
    assert_eq!(runs.len(), 1);
    assert!(!runs[0].args.contains(&"--state".to_string()));
    assert_eq!(&runs[0].args[runs[0].args.len() - 2..], ["--select", "state:modified+"]);

    let during = dbt.macros_during_run();
    assert_eq!(
        during[0],
        format!(
            "{{% macro create_udfs() %}}\r\ncreate or replace function normalize(x string)\r\nreturns string language python as $$\r\n{UDF_SOURCE}\r\n$$;\r\n{{% endmacro %}}\r\n"
        )
    );

    assert_macros_pristine(&harness);
    let mut staged = harness.staged_files().unwrap();
    staged.sort();
    assert_eq!(
        staged,
        vec![
            "dbt/state/acct1/db1/schema1/manifest.json",
            "dbt/state/acct1/db1/schema1/run_results.json"
        ]
    );
}

#[tokio::test]
async fn test_second_run_compares_against_committed_state() {
    let harness = TestHarness::new().unwrap();
    let dbt = Arc::new(ScriptedDbt::succeeding());
    let orchestrator = orchestrator(&harness, dbt.clone(), acct1());

    orchestrator
        .execute(Some(DEFAULT_SELECTION), &mut answering("y\n"))
        .await
        .unwrap();
    harness.commit_all("Record dbt state").unwrap();

    let prior = orchestrator.resolve_prior_run().await.unwrap().unwrap();
    assert_eq!(prior.last_editor.as_deref(), Some("Ada Lovelace"));
    assert_eq!(prior.results.as_ref().unwrap().results.len(), 2);

    let report = orchestrator
        .execute(Some("tag:finance"), &mut answering("y\n"))
        .await
        .unwrap();

    assert!(matches!(report.outcome, RunOutcome::Completed { used_prior_state: true, .. }));
    let second = &dbt.runs()[1];
    let state_index = second.args.iter().position(|arg| arg == "--state").unwrap();
    assert_eq!(PathBuf::from(&second.args[state_index + 1]), orchestrator.state_path());
    assert_eq!(harness.staged_files().unwrap(), vec!["dbt/state/acct1/db1/schema1/manifest.json"]);
    assert_macros_pristine(&harness);
}

#[tokio::test]
async fn test_decline_leaves_repository_untouched() {
    let harness = TestHarness::new().unwrap();
    harness
        .create_file("dbt/state/acct1/db1/schema1/manifest.json", "{\"prior\": true}")
        .unwrap();
    harness
        .create_file("dbt/state/acct1/db1/schema1/run_results.json", fixtures::scripted_dbt::RUN_RESULTS)
        .unwrap();
    harness.commit_all("Prior state").unwrap();
    let dbt = Arc::new(ScriptedDbt::succeeding());
    let orchestrator = orchestrator(&harness, dbt.clone(), acct1());

    let report = orchestrator
        .execute(Some(DEFAULT_SELECTION), &mut answering("n\n"))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Declined);
    assert!(dbt.runs().is_empty());
    assert_eq!(
        harness.read_file("dbt/state/acct1/db1/schema1/manifest.json").unwrap(),
        "{\"prior\": true}"
    );
    assert!(harness.staged_files().unwrap().is_empty());
    assert_macros_pristine(&harness);
}

#[tokio::test]
async fn test_failed_run_restores_macros_and_stages_nothing() {
    let harness = TestHarness::new().unwrap();
    let dbt = Arc::new(ScriptedDbt::failing(2));
    let orchestrator = orchestrator(&harness, dbt.clone(), acct1());

    let err = orchestrator
        .execute(Some(DEFAULT_SELECTION), &mut answering("y\n"))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::RunFailed { exit_code: 2, .. }));
    assert_eq!(dbt.runs().len(), 1);
    assert!(!orchestrator.state_path().exists());
    assert!(harness.staged_files().unwrap().is_empty());
    assert_macros_pristine(&harness);
}

#[tokio::test]
async fn test_unresolvable_directive_aborts_before_dbt() {
    let harness = TestHarness::new().unwrap();
    harness
        .create_file("dbt/macros/broken.sql", "select 1;\n!!python/missing.py!!\n")
        .unwrap();
    harness.commit_all("Add macro with a dangling directive").unwrap();
    let dbt = Arc::new(ScriptedDbt::succeeding());
    let orchestrator = orchestrator(&harness, dbt.clone(), acct1());
    let mut prompt = answering("y\n");

    let err = orchestrator.execute(Some(DEFAULT_SELECTION), &mut prompt).await.unwrap_err();

    assert!(matches!(err, WorkflowError::MissingInterpolationSource { .. }));
    assert!(prompt.into_output().is_empty());
    assert!(dbt.runs().is_empty());
    assert_macros_pristine(&harness);
}

#[tokio::test]
async fn test_identities_keep_separate_state() {
    let harness = TestHarness::new().unwrap();
    let dbt = Arc::new(ScriptedDbt::succeeding());

    for identity in [acct1(), WarehouseIdentity::new("acct1", "db1", "schema2")] {
        orchestrator(&harness, dbt.clone(), identity)
            .execute(Some(DEFAULT_SELECTION), &mut answering("y\n"))
            .await
            .unwrap();
    }

    let staged = harness.staged_files().unwrap();
    assert!(staged.contains(&"dbt/state/acct1/db1/schema1/manifest.json".to_string()));
    assert!(staged.contains(&"dbt/state/acct1/db1/schema2/manifest.json".to_string()));
    assert_eq!(dbt.runs().len(), 2);
}

#[tokio::test]
async fn test_project_without_macros_runs_cleanly() {
    let harness = TestHarness::new().unwrap();
    harness.git(&["rm", "-r", "--quiet", "dbt/macros"]).unwrap();
    harness.commit_all("Drop macros").unwrap();
    let dbt = Arc::new(ScriptedDbt::succeeding());
    let orchestrator = orchestrator(&harness, dbt.clone(), acct1());

    let declined = orchestrator
        .execute(Some(DEFAULT_SELECTION), &mut answering("n\n"))
        .await
        .unwrap();
    assert_eq!(declined.outcome, RunOutcome::Declined);
    assert!(dbt.runs().is_empty());

    let report = orchestrator
        .execute(Some(DEFAULT_SELECTION), &mut answering("y\n"))
        .await
        .unwrap();

    assert!(matches!(report.outcome, RunOutcome::Completed { .. }));
    assert_eq!(dbt.runs().len(), 1);
    assert_eq!(harness.staged_files().unwrap().len(), 2);
    assert!(!harness.path().join("dbt/macros").exists());
}

#[tokio::test]
async fn test_untracked_template_with_directive_is_never_rewritten() {
    let harness = TestHarness::new().unwrap();
    let untracked = "select 1;\n!!python/normalize.py!!\n";
    harness.create_file("dbt/macros/new_udf.sql", untracked).unwrap();
    let dbt = Arc::new(ScriptedDbt::succeeding());
    let orchestrator = orchestrator(&harness, dbt.clone(), acct1());

    for answer in ["n\n", "y\n"] {
        let err = orchestrator
            .execute(Some(DEFAULT_SELECTION), &mut answering(answer))
            .await
            .unwrap_err();

        match err {
            WorkflowError::UntrackedTemplate { path } => assert!(path.ends_with("dbt/macros/new_udf.sql")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(harness.read_file("dbt/macros/new_udf.sql").unwrap(), untracked);
    assert!(dbt.runs().is_empty());
    assert!(harness.staged_files().unwrap().is_empty());
    assert_macros_pristine(&harness);
}
