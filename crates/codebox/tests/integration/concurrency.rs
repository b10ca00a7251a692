use std::time::{Duration, Instant};

use codebox::Executor;
use codebox::types::ExecutionStatus;

use super::{leftover_entries, stub_config};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_class_name_runs_concurrently() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let executor = executor.clone();
            tokio::spawn(async move {
                let source = format!("public class Main {{\n// out: run {i}\n}}\n");
                (i, executor.run_code("java", &source).await)
            })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.await.unwrap();
        assert_eq!(result.status(), ExecutionStatus::Success, "{}", result.text());
        assert_eq!(result.text(), format!("run {i}\nclass Main\n"));
    }
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_languages_concurrently() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let requests = [
        ("python", "echo py".to_owned(), "py\n"),
        ("cpp", "#!/bin/sh\necho native".to_owned(), "native\n"),
        ("java", "public class Main {\n// out: jvm\n}".to_owned(), "jvm\nclass Main\n"),
    ];

    let handles: Vec<_> = requests
        .into_iter()
        .map(|(language, source, expected)| {
            let executor = executor.clone();
            tokio::spawn(async move { (expected, executor.run_code(language, &source).await) })
        })
        .collect();

    for handle in handles {
        let (expected, result) = handle.await.unwrap();
        assert_eq!(result.status(), ExecutionStatus::Success);
        assert_eq!(result.text(), expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_admission_gate_bounds_concurrency() {
    let root = tempfile::tempdir().unwrap();
    let mut config = stub_config(root.path());
    config.max_concurrent = 1;
    config.timeout = 5.0;
    let executor = Executor::new(config);

    let started = Instant::now();
    let first = tokio::spawn({
        let executor = executor.clone();
        async move { executor.run_code("python", "sleep 0.4").await }
    });
    let second = tokio::spawn({
        let executor = executor.clone();
        async move { executor.run_code("python", "sleep 0.4").await }
    });

    assert!(first.await.unwrap().is_success());
    assert!(second.await.unwrap().is_success());
    assert!(started.elapsed() >= Duration::from_millis(800));
    assert_eq!(executor.available_slots(), 1);
}

#[tokio::test]
async fn test_unsupported_language_does_not_wait_for_gate() {
    let root = tempfile::tempdir().unwrap();
    let mut config = stub_config(root.path());
    config.max_concurrent = 1;
    config.timeout = 5.0;
    let executor = Executor::new(config);

    let busy = tokio::spawn({
        let executor = executor.clone();
        async move { executor.run_code("python", "sleep 1").await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    let result = executor.run_code("cobol", "DISPLAY 'HI'.").await;
    assert_eq!(result.status(), ExecutionStatus::UnsupportedLanguage);
    assert!(started.elapsed() < Duration::from_millis(500));

    assert!(busy.await.unwrap().is_success());
}
