use codebox::Executor;
use codebox::output::MISSING_ENTRY_POINT;
use codebox::types::ExecutionStatus;

use super::{args, leftover_entries, stub_config};

fn program(out: &str) -> String {
    format!(
        "public class Main {{\n// out: {out}\n    public static void main(String[] args) {{}}\n}}\n"
    )
}

#[tokio::test]
async fn test_entry_point_is_renamed_and_restored() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let result = executor.run_code("java", &program("hello")).await;

    assert_eq!(result.status(), ExecutionStatus::Success);
    // The stub prints the generated class name, which is mapped back
    assert_eq!(result.text(), "hello\nclass Main\n");
    assert_eq!(leftover_entries(root.path()), 0);
}

#[tokio::test]
async fn test_missing_entry_point_skips_compiler() {
    let root = tempfile::tempdir().unwrap();
    let marker = root.path().join("compiler-ran");
    let mut config = stub_config(&root.path().join("workspaces"));
    if let Some(compile) = config.languages.java.compile.as_mut() {
        compile.command = vec![
            "/bin/sh".to_owned(),
            "-c".to_owned(),
            format!("touch '{}'", marker.display()),
        ];
    }
    let executor = Executor::new(config);

    let result = executor
        .run_code("java", "class Main { public static void main(String[] a) {} }")
        .await;

    assert_eq!(result.status(), ExecutionStatus::CompileError);
    assert_eq!(result.text(), MISSING_ENTRY_POINT);
    assert!(!marker.exists());
    assert_eq!(leftover_entries(&root.path().join("workspaces")), 0);
}

#[tokio::test]
async fn test_compile_error_names_original_class() {
    let root = tempfile::tempdir().unwrap();
    let mut config = stub_config(root.path());
    if let Some(compile) = config.languages.java.compile.as_mut() {
        compile.command = args(&[
            "/bin/sh",
            "-c",
            "echo \"$0:3: error: cannot find symbol in class $1\"; exit 1",
            "{source}",
            "{binary}",
        ]);
    }
    let executor = Executor::new(config);

    let result = executor.run_code("java", &program("x")).await;

    assert_eq!(result.status(), ExecutionStatus::CompileError);
    assert_eq!(
        result.text(),
        "Compilation Error:\nMain.java:3: error: cannot find symbol in class Main\n"
    );
}

#[tokio::test]
async fn test_runtime_failure_names_original_class() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    let source = format!("{}// exit: 1\n", program("Exception in thread \"main\""));
    let result = executor.run_code("java", &source).await;

    assert_eq!(result.status(), ExecutionStatus::RuntimeFailure);
    assert_eq!(
        result.text(),
        "Exception in thread \"main\"\nclass Main\n"
    );
    assert_eq!(result.exit_code(), Some(1));
}

#[tokio::test]
async fn test_strings_and_comments_are_not_renamed() {
    let root = tempfile::tempdir().unwrap();
    let mut config = stub_config(root.path());
    // Count the lines of the compiled source that mention the generated name
    config.languages.java.run.command =
        args(&["/bin/sh", "-c", "grep -c \"$0\" \"$0.class\"", "{binary}"]);
    let executor = Executor::new(config);

    let source = concat!(
        "public final class Main {\n",
        "// Main stays Main\n",
        "  String s = \"Main\";\n",
        "  Main self;\n}\n"
    );
    let result = executor.run_code("java", source).await;

    assert_eq!(result.status(), ExecutionStatus::Success);
    assert_eq!(result.text(), "2\n");
}

#[tokio::test]
async fn test_other_type_kinds() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::new(stub_config(root.path()));

    for (source, expected) in [
        ("public enum Color { RED }\n", "class Color\n"),
        ("public record Point(int x) { }\n", "class Point\n"),
    ] {
        let result = executor.run_code("java", source).await;
        assert_eq!(result.status(), ExecutionStatus::Success, "{source}");
        assert_eq!(result.text(), expected);
    }
}
