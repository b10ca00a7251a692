use std::time::{Duration, Instant};

use codebox::Executor;
use codebox::output::NO_OUTPUT;
use codebox::types::{ExecutionRequest, ExecutionStatus};

use super::{leftover_entries, stub_config};

#[tokio::test]
async fn test_run_hello() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor.run_code("python", "echo hello").await;

    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.text(), "hello\n");
    assert_eq!(result.exit_code(), Some(0));
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test]
async fn test_language_tag_is_case_insensitive() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor.run_code("  PyThOn3 ", "echo ok").await;
    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.text(), "ok\n");
}

#[tokio::test]
async fn test_no_output_sentinel() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor.run_code("python", "true").await;

    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.text(), NO_OUTPUT);
}

#[tokio::test]
async fn test_stderr_is_merged() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor
        .run_code("python", "echo out\necho err >&2")
        .await;

    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.text(), "out\nerr\n");
}

#[tokio::test]
async fn test_interleaved_streams_keep_order() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let source = "for i in 1 2 3 4 5; do echo out$i; echo err$i >&2; done";
    let result = executor.run_code("python", source).await;

    let expected: String = (1..=5).map(|i| format!("out{i}\nerr{i}\n")).collect();
    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.text(), expected);
}

#[tokio::test]
async fn test_runtime_failure_keeps_output() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor.run_code("python", "echo boom >&2\nexit 3").await;

    assert_eq!(result.status(), ExecutionStatus::RuntimeFailure);
    assert_eq!(result.text(), "boom\n");
    assert_eq!(result.exit_code(), Some(3));
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test]
async fn test_silent_runtime_failure() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor.run_code("python", "exit 4").await;

    assert_eq!(result.status(), ExecutionStatus::RuntimeFailure);
    assert_eq!(result.text(), "Process exited with status 4.");
}

#[tokio::test]
async fn test_killed_by_signal() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor.run_code("python", "kill -9 $$").await;

    assert_eq!(result.status(), ExecutionStatus::RuntimeFailure);
    assert_eq!(result.text(), "Process terminated by a signal.");
    assert_eq!(result.exit_code(), None);
}

#[tokio::test]
async fn test_timeout_kills_process_tree() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let started = Instant::now();
    let result = executor
        .run_code("python", "echo started\nsleep 30\necho never")
        .await;

    assert_eq!(result.status(), ExecutionStatus::Timeout);
    assert_eq!(
        result.text(),
        "Execution Error: Timeout exceeded (1 seconds)."
    );
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test]
async fn test_escaped_source_is_decoded() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let request = ExecutionRequest::escaped("python", r#"echo \"a\/b\"\necho second"#);
    let result = executor.execute(&request).await;

    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.text(), "a/b\nsecond\n");
}

#[tokio::test]
async fn test_raw_source_is_not_decoded() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor.run_code("python", r"printf '%s\n' 'a\tb'").await;

    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.text(), "a\\tb\n");
}

#[tokio::test]
async fn test_source_written_to_fixed_name() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor.run_code("python", "ls").await;

    assert_eq!(result.text(), "main.py\n");
}

#[tokio::test]
async fn test_configured_env_is_applied() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor
        .run_code("python", "echo \"$PYTHONUNBUFFERED\"")
        .await;

    assert_eq!(result.text(), "1\n");
}

#[tokio::test]
async fn test_stdin_is_closed() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor
        .run_code("python", "cat\necho done")
        .await;

    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.text(), "done\n");
}

#[tokio::test]
async fn test_unsupported_language_creates_nothing() {
    let root = tempfile::tempdir().unwrap();
    let workspace_root = root.path().join("workspaces");
    let executor = Executor::new(stub_config(&workspace_root));

    let result = executor.run_code("ruby", "puts 'hi'").await;

    assert_eq!(result.status(), ExecutionStatus::UnsupportedLanguage);
    assert_eq!(result.text(), "Unsupported language: ruby");
    assert!(!workspace_root.exists());
}
