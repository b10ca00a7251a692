use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::output;

/// Error returned when a language tag does not name a supported language
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

/// A supported language, which also selects the pipeline variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Interpreted, no build step
    Python,

    /// Compiled to bytecode, entry point renamed per execution
    Java,

    /// Compiled ahead of time to a native binary
    Cpp,
}

impl Language {
    /// All supported languages, in display order
    pub const ALL: [Language; 3] = [Language::Python, Language::Java, Language::Cpp];

    /// Canonical tag for the language
    pub fn id(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    /// Whether the language has a build step
    pub fn is_compiled(&self) -> bool {
        !matches!(self, Language::Python)
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    /// Parse a language tag, ignoring case and surrounding whitespace
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "cpp" | "c++" => Ok(Language::Cpp),
            _ => Err(UnsupportedLanguage(tag.to_owned())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// How the source text of a request is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEncoding {
    /// Source is exactly the program text
    #[default]
    Raw,

    /// Source still carries the transport's backslash escapes
    Escaped,
}

/// A request to execute one snippet of source code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Language tag as submitted (matched case-insensitively)
    pub language: String,

    /// Source code
    #[serde(alias = "code")]
    pub source: String,

    /// Encoding of `source`
    #[serde(default)]
    pub encoding: SourceEncoding,
}

impl ExecutionRequest {
    /// Create a request for raw source text
    pub fn new(language: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source: source.into(),
            encoding: SourceEncoding::Raw,
        }
    }

    /// Create a request whose source still carries transport escapes
    pub fn escaped(language: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            encoding: SourceEncoding::Escaped,
            ..Self::new(language, source)
        }
    }

    /// The program text, with transport escapes decoded exactly once
    pub fn program_text(&self) -> Cow<'_, str> {
        match self.encoding {
            SourceEncoding::Raw => Cow::Borrowed(&self.source),
            SourceEncoding::Escaped => output::decode_escapes(&self.source),
        }
    }
}

/// Classification of a finished execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Program ran and exited with code 0
    Success,

    /// Build step failed, or the entry point could not be found
    CompileError,

    /// Program exited with a nonzero code or was killed by a signal
    RuntimeFailure,

    /// Build or run step exceeded the wall-clock limit
    Timeout,

    /// Language tag was not recognized
    UnsupportedLanguage,

    /// Host-level failure unrelated to the submitted code
    InternalError,
}

impl ExecutionStatus {
    /// Whether the failure lies outside the submitted code
    ///
    /// These are reported through the error channel of the transport rather
    /// than as program output.
    #[must_use]
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::UnsupportedLanguage | ExecutionStatus::InternalError
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::CompileError => "compile_error",
            ExecutionStatus::RuntimeFailure => "runtime_failure",
            ExecutionStatus::Timeout => "timeout",
            ExecutionStatus::UnsupportedLanguage => "unsupported_language",
            ExecutionStatus::InternalError => "internal_error",
        };
        f.write_str(name)
    }
}

/// Result of one execution
///
/// Built once by the pipeline and stamped with its duration by the executor;
/// there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    status: ExecutionStatus,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(default)]
    elapsed: Duration,
}

impl ExecutionResult {
    /// Create a result with the given status and text
    pub fn new(status: ExecutionStatus, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
            exit_code: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Attach the exit code of the run step
    pub fn with_exit_code(self, exit_code: Option<i32>) -> Self {
        Self { exit_code, ..self }
    }

    /// Attach the total wall time of the execution
    pub fn finished(self, elapsed: Duration) -> Self {
        Self { elapsed, ..self }
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Rendered result text (program output or diagnostic)
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Wall time from dispatch to workspace release
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Check if the program ran and exited with code 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, ExecutionStatus::Success)
    }

    /// Consume the result, keeping only its text
    pub fn into_text(self) -> String {
        self.text
    }
}
