// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading and parsing test scripts.
//!
//! A [`ParsedScript`] records every function defined at the top level of a script. The bodies of
//! brace-delimited functions are split into [`Step`]s: the top-level statements that are
//! instrumented before a test runs.

mod lexer;

pub(crate) use lexer::split_statements;

use crate::errors::{ScriptParseError, ScriptReadError, ScriptSyntaxError};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use smol_str::SmolStr;
use std::{ops::Range, sync::LazyLock};

/// The text of a test script, along with an index of its lines.
#[derive(Clone, Debug)]
pub struct ScriptSource {
    path: Utf8PathBuf,
    contents: String,
    line_starts: Vec<usize>,
}

impl ScriptSource {
    /// Reads a script from disk.
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Result<Self, ScriptReadError> {
        let path = path.into();
        let contents =
            std::fs::read_to_string(&path).map_err(|err| ScriptReadError::new(&path, err))?;
        Ok(Self::new(path, contents))
    }

    /// Creates a script from in-memory contents.
    pub fn new(path: impl Into<Utf8PathBuf>, contents: impl Into<String>) -> Self {
        let contents = contents.into();
        let line_starts = std::iter::once(0)
            .chain(contents.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self {
            path: path.into(),
            contents,
            line_starts,
        }
    }

    /// Returns the path the script was loaded from.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the full text of the script.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Returns the number of lines in the script.
    pub fn line_count(&self) -> usize {
        if self.contents.ends_with('\n') {
            self.line_starts.len() - 1
        } else {
            self.line_starts.len()
        }
    }

    /// Returns the 1-based line number containing the byte at `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// Returns the text of a 1-based line, without its line terminator.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        if line == 0 || line > self.line_count() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map_or(self.contents.len(), |next| next - 1);
        Some(self.contents[start..end].trim_end_matches('\r'))
    }

    fn parse_error(&self, offset: usize, error: ScriptSyntaxError) -> ScriptParseError {
        ScriptParseError::new(&self.path, &self.contents, self.line_of(offset), error)
    }
}

/// A script along with the functions defined in it.
#[derive(Clone, Debug)]
pub struct ParsedScript {
    source: ScriptSource,
    functions: Vec<FunctionDef>,
}

impl ParsedScript {
    /// Splits the script into statements and records every function defined at the top level.
    pub fn parse(source: ScriptSource) -> Result<Self, ScriptParseError> {
        let text = source.contents();
        let statements = split_statements(text, 0..text.len())
            .map_err(|(offset, error)| source.parse_error(offset, error))?;

        let mut functions = Vec::new();
        for range in statements {
            if let Some(function) = FunctionDef::parse(&source, range)? {
                functions.push(function);
            }
        }

        Ok(Self { source, functions })
    }

    /// Returns the source of the script.
    pub fn source(&self) -> &ScriptSource {
        &self.source
    }

    /// Returns the path the script was loaded from.
    pub fn path(&self) -> &Utf8Path {
        self.source.path()
    }

    /// Returns every top-level function definition, in declaration order.
    pub fn functions(&self) -> &[FunctionDef] {
        &self.functions
    }

    /// Returns the definition of `name` that takes effect: the last one in the script.
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().rev().find(|f| f.name == name)
    }
}

/// A function defined at the top level of a script.
#[derive(Clone, Debug)]
pub struct FunctionDef {
    name: SmolStr,
    line: usize,
    end_line: usize,
    body: FunctionBody,
}

/// The body of a function definition.
#[derive(Clone, Debug)]
pub enum FunctionBody {
    /// A `{ ... }` body, split into top-level steps.
    Steps(Vec<Step>),

    /// A `( ... )` body. It runs in a subshell and is treated as a single opaque step.
    Subshell,
}

static KEYWORD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^function\s+([^\s(){}<>|&;]+)\s*(?:\(\s*\)\s*)?([{(])").expect("regex is valid")
});

static POSIX_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([^\s(){}<>|&;=$"'`]+)\s*\(\s*\)\s*([{(])"#).expect("regex is valid")
});

impl FunctionDef {
    fn parse(source: &ScriptSource, range: Range<usize>) -> Result<Option<Self>, ScriptParseError> {
        let text = &source.contents()[range.clone()];
        let Some(captures) = KEYWORD_HEADER
            .captures(text)
            .or_else(|| POSIX_HEADER.captures(text))
        else {
            return Ok(None);
        };

        let name = SmolStr::new(&captures[1]);
        let line = source.line_of(range.start);
        let opener = captures.get(2).expect("opener group always matches");
        if opener.as_str() == "(" {
            return Ok(Some(Self {
                name,
                line,
                end_line: source.line_of(range.end.saturating_sub(1)),
                body: FunctionBody::Subshell,
            }));
        }

        let body_start = range.start + opener.end();
        let body_end = range.start + text.rfind('}').unwrap_or(text.len());
        let end_line = source.line_of(body_end.min(range.end.saturating_sub(1)));
        let statements = split_statements(source.contents(), body_start..body_end)
            .map_err(|(offset, error)| source.parse_error(offset, error))?;
        let steps = statements
            .into_iter()
            .map(|range| Step::new(source.line_of(range.start), &source.contents()[range]))
            .collect();

        Ok(Some(Self {
            name,
            line,
            end_line,
            body: FunctionBody::Steps(steps),
        }))
    }

    /// Returns the name of the function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the 1-based line the definition starts on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the 1-based line the body is closed on.
    pub fn end_line(&self) -> usize {
        self.end_line
    }

    /// Returns the body of the function.
    pub fn body(&self) -> &FunctionBody {
        &self.body
    }

    /// Returns the top-level steps of a brace-delimited body, or an empty slice for a subshell
    /// body.
    pub fn steps(&self) -> &[Step] {
        match &self.body {
            FunctionBody::Steps(steps) => steps,
            FunctionBody::Subshell => &[],
        }
    }
}

/// A top-level statement within a function body.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Step {
    /// The 1-based line the statement starts on.
    pub line: usize,

    /// The full text of the statement, which may span several lines.
    pub text: String,

    /// What kind of statement this is.
    pub kind: StepKind,
}

impl Step {
    pub(crate) fn new(line: usize, text: &str) -> Self {
        Self {
            line,
            text: text.to_owned(),
            kind: StepKind::classify(text),
        }
    }
}

/// The kind of a [`Step`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StepKind {
    /// A description directive: `it`, `describe` or `this_test`.
    Describe,

    /// A skip directive.
    Skip,

    /// Any other statement.
    Command,
}

impl StepKind {
    /// The words that introduce a description directive.
    pub const DESCRIBE_WORDS: &'static [&'static str] = &["it", "describe", "this_test"];

    fn classify(text: &str) -> Self {
        match first_word(text) {
            word if Self::DESCRIBE_WORDS.contains(&word) => StepKind::Describe,
            "skip" => StepKind::Skip,
            _ => StepKind::Command,
        }
    }
}

fn first_word(text: &str) -> &str {
    let end = text
        .find(|c: char| c.is_whitespace() || matches!(c, ';' | '&' | '|' | '(' | ')' | '<' | '>'))
        .unwrap_or(text.len());
    &text[..end]
}
