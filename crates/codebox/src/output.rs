//! Output normalization
//!
//! Renders the text reported for each kind of outcome, and owns the single
//! decode pass for source text that arrives with transport escapes still in it.

use std::borrow::Cow;
use std::time::Duration;

/// Reported when a successful program printed nothing
pub const NO_OUTPUT: &str = "Execution successful (No output).";

/// Reported when Java source has no public top-level type to run
pub const MISSING_ENTRY_POINT: &str = "Compilation Error: No 'public class' found in Java code.";

/// Substitute the no-output sentinel for empty text
pub fn normalize(text: &str) -> &str {
    if text.is_empty() {
        NO_OUTPUT
    } else {
        text
    }
}

/// Decode the transport's escape sequences in one left-to-right pass
///
/// The transport only ever produces `\n`, `\r`, `\t`, `\"`, `\\` and `\/`.
/// Any other backslash sequence, and a trailing lone backslash, is kept as
/// written. Text without a backslash is returned borrowed.
pub fn decode_escapes(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    let mut decoded = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some('r') => decoded.push('\r'),
            Some('t') => decoded.push('\t'),
            Some('"') => decoded.push('"'),
            Some('\\') => decoded.push('\\'),
            Some('/') => decoded.push('/'),
            Some(other) => {
                decoded.push('\\');
                decoded.push(other);
            }
            None => decoded.push('\\'),
        }
    }
    Cow::Owned(decoded)
}

/// Text for a failed build step
pub fn compile_error(compiler_output: &str, exit_code: Option<i32>) -> String {
    if compiler_output.is_empty() {
        match exit_code {
            Some(code) => format!("Compilation Error:\nCompiler exited with status {code}."),
            None => "Compilation Error:\nCompiler terminated by a signal.".to_owned(),
        }
    } else {
        format!("Compilation Error:\n{compiler_output}")
    }
}

/// Text for a step that ran past its wall-clock limit
pub fn timeout(limit: Duration) -> String {
    format!(
        "Execution Error: Timeout exceeded ({} seconds).",
        limit.as_secs_f64()
    )
}

/// Text for a program that exited unsuccessfully
///
/// The program's own output is the diagnostic; only silence is replaced.
pub fn runtime_failure(program_output: &str, exit_code: Option<i32>) -> String {
    if !program_output.is_empty() {
        return program_output.to_owned();
    }
    match exit_code {
        Some(code) => format!("Process exited with status {code}."),
        None => "Process terminated by a signal.".to_owned(),
    }
}

/// Text for a host-level failure
pub fn internal_error(error: &dyn std::error::Error) -> String {
    format!("An unexpected error occurred: {error}")
}
