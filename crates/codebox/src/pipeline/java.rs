//! Java pipeline: the public entry point type is renamed per execution
//!
//! Locating and renaming the entry point works on a minimal token stream
//! that skips comments and literals. It is not a Java parser; it only knows
//! enough to find `public [modifiers] class Name` at brace depth zero and to
//! tell identifiers apart from text inside strings and comments.

use std::ops::Range;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::Toolchain;
use crate::output;
use crate::pipeline::{PipelineError, StepTimeouts, build_step, run_step};
use crate::process::ProcessOutput;
use crate::types::{ExecutionResult, ExecutionStatus};
use crate::workspace::Workspace;

const TYPE_MODIFIERS: [&str; 4] = ["abstract", "final", "strictfp", "sealed"];
const TYPE_KEYWORDS: [&str; 4] = ["class", "interface", "enum", "record"];

/// Compiled language whose entry point gets a unique name per execution
#[derive(Debug, Clone)]
pub struct IdentityRewrite {
    pub(crate) toolchain: Toolchain,
    pub(crate) timeouts: StepTimeouts,
}

impl IdentityRewrite {
    #[instrument(skip_all, fields(workspace = %workspace.id()))]
    pub async fn execute(
        &self,
        workspace: &Workspace,
        source: &str,
    ) -> Result<ExecutionResult, PipelineError> {
        let Some(original) = find_entry_point(source) else {
            debug!("no public top-level type found");
            return Ok(ExecutionResult::new(
                ExecutionStatus::CompileError,
                output::MISSING_ENTRY_POINT,
            ));
        };

        let class_name = unique_name(original, workspace.id());
        let rewritten = rename_identifier(source, original, &class_name);
        let source_name = self.toolchain.source_name_for(&class_name);

        workspace
            .write_file(&source_name, rewritten.as_bytes())
            .await?;
        debug!(original, class_name, "wrote renamed source");

        let compile = self
            .toolchain
            .compile
            .as_ref()
            .ok_or_else(|| PipelineError::NotCompiled(self.toolchain.name.clone()))?;
        let restore = |out: ProcessOutput| out.replace_in_output(&class_name, original);

        if let Some(failed) = build_step(
            workspace,
            compile,
            &source_name,
            &class_name,
            self.timeouts.build,
            restore,
        )
        .await?
        {
            return Ok(failed);
        }

        run_step(
            workspace,
            &self.toolchain.run,
            &source_name,
            &class_name,
            self.timeouts.run,
            restore,
        )
        .await
    }
}

/// Generate the per-execution name for an entry point type
fn unique_name(original: &str, id: Uuid) -> String {
    format!("{original}_{}", id.simple())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Ident,
    Punct(char),
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    span: Range<usize>,
}

/// Token stream over Java source, skipping whitespace and comments
struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_until(&mut self, terminator: &str) {
        match self.rest().find(terminator) {
            Some(offset) => self.pos += offset + terminator.len(),
            None => self.pos = self.src.len(),
        }
    }

    /// Skip whitespace and comments; returns false at end of input
    fn skip_trivia(&mut self) -> bool {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                self.skip_until("\n");
            } else if rest.starts_with("/*") {
                self.pos += 2;
                self.skip_until("*/");
            } else {
                match self.peek_char() {
                    Some(c) if c.is_whitespace() => {
                        self.bump();
                    }
                    Some(_) => return true,
                    None => return false,
                }
            }
        }
    }

    /// Skip a quoted literal whose opening quote has been consumed
    fn skip_quoted(&mut self, quote: char) {
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                '\n' => return,
                c if c == quote => return,
                _ => {}
            }
        }
    }

    /// Skip a text block whose opening `"""` has been consumed
    fn skip_text_block(&mut self) {
        while !self.rest().is_empty() {
            if self.rest().starts_with("\"\"\"") {
                self.pos += 3;
                return;
            }
            if self.bump() == Some('\\') {
                self.bump();
            }
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if !self.skip_trivia() {
            return None;
        }

        let start = self.pos;
        if self.rest().starts_with("\"\"\"") {
            self.pos += 3;
            self.skip_text_block();
            return Some(Token {
                kind: TokenKind::Literal,
                span: start..self.pos,
            });
        }

        let c = self.bump()?;
        let kind = match c {
            '"' | '\'' => {
                self.skip_quoted(c);
                TokenKind::Literal
            }
            c if is_ident_start(c) => {
                while self.peek_char().is_some_and(is_ident_part) {
                    self.bump();
                }
                TokenKind::Ident
            }
            c if c.is_ascii_digit() => {
                while self
                    .peek_char()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
                {
                    self.bump();
                }
                TokenKind::Literal
            }
            c => TokenKind::Punct(c),
        };

        Some(Token {
            kind,
            span: start..self.pos,
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Find the name of the first public top-level type declaration
///
/// Matches `public`, any of the type modifiers, a type keyword and then the
/// type name, at brace depth zero. Declarations nested inside another type
/// and text inside comments or literals are never matched.
pub fn find_entry_point(source: &str) -> Option<&str> {
    let tokens: Vec<Token> = Tokens::new(source).collect();

    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Punct('{') => depth += 1,
            TokenKind::Punct('}') => depth = depth.saturating_sub(1),
            TokenKind::Ident if depth == 0 && is_word(source, token, "public") => {
                let rest = skip_modifiers(source, &tokens[i + 1..]);
                let keyword = rest.first()?;
                if !is_any_word(source, keyword, &TYPE_KEYWORDS) {
                    continue;
                }
                match rest.get(1) {
                    Some(name) if name.kind == TokenKind::Ident => {
                        return Some(&source[name.span.clone()]);
                    }
                    _ => continue,
                }
            }
            _ => {}
        }
    }
    None
}

/// Drop leading type modifiers, including the hyphenated `non-sealed`
fn skip_modifiers<'t>(source: &str, mut tokens: &'t [Token]) -> &'t [Token] {
    loop {
        match tokens {
            [first, rest @ ..] if is_any_word(source, first, &TYPE_MODIFIERS) => tokens = rest,
            [non, dash, sealed, rest @ ..]
                if is_word(source, non, "non")
                    && dash.kind == TokenKind::Punct('-')
                    && is_word(source, sealed, "sealed") =>
            {
                tokens = rest
            }
            _ => return tokens,
        }
    }
}

fn is_word(source: &str, token: &Token, word: &str) -> bool {
    token.kind == TokenKind::Ident && source[token.span.clone()] == *word
}

fn is_any_word(source: &str, token: &Token, words: &[&str]) -> bool {
    words.iter().any(|word| is_word(source, token, word))
}

/// Rename every identifier token equal to `from`, leaving comments and
/// literals untouched
pub fn rename_identifier(source: &str, from: &str, to: &str) -> String {
    let mut renamed = String::with_capacity(source.len() + to.len());
    let mut copied = 0;
    for token in Tokens::new(source) {
        if token.kind == TokenKind::Ident && &source[token.span.clone()] == from {
            renamed.push_str(&source[copied..token.span.start]);
            renamed.push_str(to);
            copied = token.span.end;
        }
    }
    renamed.push_str(&source[copied..]);
    renamed
}
