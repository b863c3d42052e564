// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A scanner that splits shell text into complete statements.
//!
//! This is not a shell parser. It tracks just enough of the grammar (quoting, substitutions,
//! heredocs and compound-command nesting) to tell where one complete command ends and the next
//! begins. Statement boundaries are unquoted newlines and `;` at nesting depth zero.

use crate::errors::ScriptSyntaxError;
use smol_str::SmolStr;
use std::ops::Range;

/// A syntax error together with the byte offset it should be attributed to.
pub(crate) type ScanError = (usize, ScriptSyntaxError);

/// Splits `text[range]` into statements, returning their byte ranges within `text`.
///
/// Returned ranges start at the first byte of the statement and end after its last byte, with
/// surrounding whitespace, terminators and trailing comments excluded. Comment-only lines produce
/// no statement.
pub(crate) fn split_statements(
    text: &str,
    range: Range<usize>,
) -> Result<Vec<Range<usize>>, ScanError> {
    let mut scanner = Scanner::new(text, range.start, range.end, Mode::Statements);
    scanner.run()?;
    Ok(scanner.statements)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Mode {
    /// Collect statements until the end of the range.
    Statements,

    /// Stop at the `)` that closes a `$(` command substitution.
    Substitution,
}

#[derive(Clone, Debug)]
struct Frame {
    kind: FrameKind,
    start: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum FrameKind {
    If,
    Case { in_seen: bool },
    Loop,
    Brace,
    Paren,
}

impl FrameKind {
    fn keyword(self) -> &'static str {
        match self {
            FrameKind::If => "if",
            FrameKind::Case { .. } => "case",
            FrameKind::Loop => "do",
            FrameKind::Brace => "{",
            FrameKind::Paren => "(",
        }
    }
}

#[derive(Clone, Debug)]
struct Heredoc {
    delimiter: String,
    strip_tabs: bool,
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    end: usize,
    mode: Mode,

    stack: Vec<Frame>,
    pending_heredocs: Vec<Heredoc>,
    // The next word is in command position, where reserved words are recognized.
    cmd_pos: bool,
    // The last token was `|`, `&&` or `||`, so a newline does not end the statement.
    continuation: bool,
    // `function` was seen and the next word is the function name.
    function_keyword: bool,
    // A function header was seen but its body hasn't been opened yet.
    function_pending: bool,
    // Inside a `case`, between `in`/`;;` and the `)` that ends a pattern.
    case_pattern: bool,

    stmt_start: Option<usize>,
    last_content_end: usize,
    statements: Vec<Range<usize>>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, start: usize, end: usize, mode: Mode) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: start,
            end,
            mode,
            stack: Vec::new(),
            pending_heredocs: Vec::new(),
            cmd_pos: true,
            continuation: false,
            function_keyword: false,
            function_pending: false,
            case_pattern: false,
            stmt_start: None,
            last_content_end: start,
            statements: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        let idx = self.pos + offset;
        (idx < self.end).then(|| self.bytes[idx])
    }

    /// Runs the scanner. In substitution mode, returns the position just past the closing `)`.
    fn run(&mut self) -> Result<usize, ScanError> {
        let open = self.pos.saturating_sub(2);
        while self.pos < self.end {
            let start = self.pos;
            match self.bytes[start] {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\n' => {
                    self.pos += 1;
                    if !self.pending_heredocs.is_empty() {
                        self.read_heredoc_bodies();
                    }
                    self.end_of_line();
                }
                b'#' => self.skip_comment(),
                b';' => self.semicolon(),
                b'&' => {
                    match self.peek(1) {
                        Some(b'&') => {
                            self.pos += 2;
                            self.continuation = true;
                        }
                        // &> and &>> redirect both streams.
                        Some(b'>') => {
                            self.pos += 2;
                            if self.peek(0) == Some(b'>') {
                                self.pos += 1;
                            }
                            self.continuation = false;
                        }
                        _ => {
                            self.pos += 1;
                            self.continuation = false;
                        }
                    }
                    self.cmd_pos = true;
                    self.mark(start);
                }
                b'|' => {
                    self.pos += match self.peek(1) {
                        Some(b'|') | Some(b'&') => 2,
                        _ => 1,
                    };
                    self.continuation = true;
                    self.cmd_pos = true;
                    self.mark(start);
                }
                b'(' => self.open_paren()?,
                b')' => {
                    if self.close_paren() {
                        return Ok(self.pos);
                    }
                }
                b'<' | b'>' => self.redirection()?,
                b'\\' if self.peek(1) == Some(b'\n') => {
                    // Line continuation.
                    self.pos += 2;
                }
                _ => self.word()?,
            }
        }

        if self.mode == Mode::Substitution {
            return Err((
                open,
                ScriptSyntaxError::UnterminatedSubstitution((open, 2).into()),
            ));
        }
        if let Some(frame) = self.stack.first() {
            return Err((
                frame.start,
                ScriptSyntaxError::UnclosedCompound {
                    keyword: SmolStr::new_static(frame.kind.keyword()),
                    span: (frame.start, frame.kind.keyword().len()).into(),
                },
            ));
        }
        self.finish_statement();
        Ok(self.pos)
    }

    fn mark(&mut self, start: usize) {
        if self.stmt_start.is_none() {
            self.stmt_start = Some(start);
        }
        self.last_content_end = self.pos;
    }

    fn at_boundary(&self) -> bool {
        self.stack.is_empty() && !self.continuation && !self.function_pending
    }

    fn finish_statement(&mut self) {
        if let Some(start) = self.stmt_start.take() {
            if self.mode == Mode::Statements {
                self.statements.push(start..self.last_content_end);
            }
        }
        self.cmd_pos = true;
        self.continuation = false;
    }

    fn end_of_line(&mut self) {
        if self.at_boundary() {
            self.finish_statement();
        } else {
            self.cmd_pos = true;
        }
    }

    fn skip_comment(&mut self) {
        while self.pos < self.end && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn semicolon(&mut self) {
        let start = self.pos;
        if self.peek(1) == Some(b';') || self.peek(1) == Some(b'&') {
            // Case item terminators: ;; ;& ;;&
            self.pos += 2;
            if self.peek(0) == Some(b'&') {
                self.pos += 1;
            }
            self.mark(start);
            if matches!(self.stack.last(), Some(frame) if matches!(frame.kind, FrameKind::Case { .. }))
            {
                self.case_pattern = true;
            }
            self.cmd_pos = true;
            return;
        }

        self.pos += 1;
        self.continuation = false;
        if self.at_boundary() {
            self.finish_statement();
        } else {
            self.mark(start);
            self.cmd_pos = true;
        }
    }

    fn open_paren(&mut self) -> Result<(), ScanError> {
        let start = self.pos;
        if self.cmd_pos && self.peek(1) == Some(b'(') {
            // (( arithmetic command ))
            self.skip_arithmetic(start)?;
            self.cmd_pos = false;
            self.continuation = false;
            self.mark(start);
            return Ok(());
        }

        self.pos += 1;
        self.continuation = false;
        if self.case_pattern {
            // Optional leading paren of a case pattern.
            self.mark(start);
            return Ok(());
        }

        // A `()` right after a word is a function header.
        let mut lookahead = self.pos;
        while lookahead < self.end && matches!(self.bytes[lookahead], b' ' | b'\t') {
            lookahead += 1;
        }
        if lookahead < self.end && self.bytes[lookahead] == b')' {
            self.pos = lookahead + 1;
            self.function_keyword = false;
            self.function_pending = true;
            self.cmd_pos = true;
            self.mark(start);
            return Ok(());
        }

        self.function_pending = false;
        self.stack.push(Frame {
            kind: FrameKind::Paren,
            start,
        });
        self.cmd_pos = true;
        self.mark(start);
        Ok(())
    }

    /// Handles a `)`. Returns true if this closes the enclosing command substitution.
    fn close_paren(&mut self) -> bool {
        let start = self.pos;
        self.pos += 1;
        self.continuation = false;

        if self.case_pattern {
            self.case_pattern = false;
            self.cmd_pos = true;
            self.mark(start);
            return false;
        }

        match self.stack.last().map(|frame| frame.kind) {
            Some(FrameKind::Paren) => {
                self.stack.pop();
                self.cmd_pos = false;
                self.mark(start);
                false
            }
            None if self.mode == Mode::Substitution => true,
            _ => {
                self.cmd_pos = true;
                self.mark(start);
                false
            }
        }
    }

    fn redirection(&mut self) -> Result<(), ScanError> {
        let start = self.pos;
        let first = self.bytes[start];
        if first == b'<' && self.peek(1) == Some(b'<') {
            if self.peek(2) == Some(b'<') {
                // <<< here-string.
                self.pos += 3;
            } else {
                self.pos += 2;
                let strip_tabs = self.peek(0) == Some(b'-');
                if strip_tabs {
                    self.pos += 1;
                }
                while matches!(self.peek(0), Some(b' ' | b'\t')) {
                    self.pos += 1;
                }
                let delimiter = self.heredoc_delimiter(start)?;
                self.pending_heredocs.push(Heredoc {
                    delimiter,
                    strip_tabs,
                });
            }
        } else if self.peek(1) == Some(b'(') {
            // Process substitution <(...) or >(...): the paren is handled as a subshell.
            self.pos += 1;
        } else {
            self.pos += 1;
            if matches!(self.peek(0), Some(b'>' | b'&' | b'|')) {
                self.pos += 1;
            }
        }
        self.continuation = false;
        self.mark(start);
        Ok(())
    }

    /// Reads a heredoc delimiter word, removing any quoting.
    fn heredoc_delimiter(&mut self, start: usize) -> Result<String, ScanError> {
        let mut delimiter = String::new();
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\n' | b';' | b'&' | b'|' | b'<' | b'>' | b'(' | b')' => break,
                b'\'' | b'"' => {
                    let quote = self.bytes[self.pos];
                    let open = self.pos;
                    self.pos += 1;
                    let content_start = self.pos;
                    while self.pos < self.end && self.bytes[self.pos] != quote {
                        self.pos += 1;
                    }
                    if self.pos >= self.end {
                        let err = if quote == b'\'' {
                            ScriptSyntaxError::UnterminatedSingleQuote((open, 1).into())
                        } else {
                            ScriptSyntaxError::UnterminatedDoubleQuote((open, 1).into())
                        };
                        return Err((open, err));
                    }
                    delimiter.push_str(&self.text[content_start..self.pos]);
                    self.pos += 1;
                }
                b'\\' => {
                    self.pos += 1;
                }
                _ => {
                    let ch_start = self.pos;
                    self.pos += 1;
                    while self.pos < self.end && !self.text.is_char_boundary(self.pos) {
                        self.pos += 1;
                    }
                    delimiter.push_str(&self.text[ch_start..self.pos]);
                }
            }
        }
        if delimiter.is_empty() {
            // `<<` with nothing after it: bash rejects this, but treat it as a plain redirect.
            self.pos = self.pos.max(start + 2);
        }
        Ok(delimiter)
    }

    /// Consumes the bodies of all pending heredocs, starting at the beginning of a line.
    fn read_heredoc_bodies(&mut self) {
        let heredocs = std::mem::take(&mut self.pending_heredocs);
        for heredoc in heredocs {
            if heredoc.delimiter.is_empty() {
                continue;
            }
            while self.pos < self.end {
                let line_end = self.text[self.pos..self.end]
                    .find('\n')
                    .map_or(self.end, |idx| self.pos + idx);
                let line = &self.text[self.pos..line_end];
                let candidate = if heredoc.strip_tabs {
                    line.trim_start_matches('\t')
                } else {
                    line
                };
                self.pos = (line_end + 1).min(self.end);
                self.last_content_end = line_end;
                if candidate == heredoc.delimiter {
                    break;
                }
            }
        }
    }

    fn skip_arithmetic(&mut self, start: usize) -> Result<(), ScanError> {
        let mut depth = 0usize;
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b'(' => depth += 1,
                b')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.pos += 1;
                        return Ok(());
                    }
                }
                b'\\' => self.pos += 1,
                b'\'' => {
                    self.skip_single_quote()?;
                    continue;
                }
                b'"' => {
                    self.skip_double_quote()?;
                    continue;
                }
                b'$' if self.peek(1) == Some(b'(') && self.peek(2) != Some(b'(') => {
                    self.skip_dollar(false)?;
                    continue;
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err((
            start,
            ScriptSyntaxError::UnterminatedSubstitution((start, 2).into()),
        ))
    }

    fn word(&mut self) -> Result<(), ScanError> {
        let start = self.pos;
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' | b'\n' | b';' | b'&' | b'|' | b'(' | b')' | b'<' | b'>' => {
                    break;
                }
                b'\\' => {
                    self.pos = (self.pos + 2).min(self.end);
                }
                b'\'' => self.skip_single_quote()?,
                b'"' => self.skip_double_quote()?,
                b'`' => self.skip_backquote()?,
                b'$' => self.skip_dollar(false)?,
                _ => self.pos += 1,
            }
        }

        if self.pos == start {
            // Nothing was consumed: step over the byte to guarantee progress.
            self.pos += 1;
        }
        self.continuation = false;
        self.mark(start);
        let text = self.text;
        let word = &text[start..self.pos];
        self.classify_word(word, start);
        Ok(())
    }

    fn classify_word(&mut self, word: &str, start: usize) {
        if self.function_keyword {
            // The function name: its body may follow after `()` or directly.
            self.function_keyword = false;
            self.function_pending = true;
            self.cmd_pos = true;
            return;
        }

        if self.case_pattern {
            if word == "esac" {
                self.case_pattern = false;
                self.close_frame(|kind| matches!(kind, FrameKind::Case { .. }));
                self.cmd_pos = false;
            }
            return;
        }

        if let Some(frame) = self.stack.last_mut() {
            if frame.kind == (FrameKind::Case { in_seen: false }) && word == "in" {
                frame.kind = FrameKind::Case { in_seen: true };
                self.case_pattern = true;
                return;
            }
        }

        if !self.cmd_pos {
            return;
        }

        match word {
            "if" => self.open_frame(FrameKind::If, start, true),
            "case" => self.open_frame(FrameKind::Case { in_seen: false }, start, false),
            "while" | "until" => self.open_frame(FrameKind::Loop, start, true),
            "for" | "select" => self.open_frame(FrameKind::Loop, start, false),
            "{" => {
                self.function_pending = false;
                self.open_frame(FrameKind::Brace, start, true);
            }
            "then" | "else" | "elif" | "do" | "!" | "time" => self.cmd_pos = true,
            "fi" => {
                self.close_frame(|kind| kind == FrameKind::If);
                self.cmd_pos = false;
            }
            "done" => {
                self.close_frame(|kind| kind == FrameKind::Loop);
                self.cmd_pos = false;
            }
            "esac" => {
                self.close_frame(|kind| matches!(kind, FrameKind::Case { .. }));
                self.cmd_pos = false;
            }
            "}" => {
                self.close_frame(|kind| kind == FrameKind::Brace);
                self.cmd_pos = false;
            }
            "function" => {
                self.function_keyword = true;
                self.cmd_pos = false;
            }
            _ => self.cmd_pos = false,
        }
    }

    fn open_frame(&mut self, kind: FrameKind, start: usize, cmd_pos: bool) {
        self.stack.push(Frame { kind, start });
        self.cmd_pos = cmd_pos;
    }

    fn close_frame(&mut self, matches: impl Fn(FrameKind) -> bool) {
        if let Some(frame) = self.stack.last() {
            if matches(frame.kind) {
                self.stack.pop();
            }
        }
    }

    fn skip_single_quote(&mut self) -> Result<(), ScanError> {
        let open = self.pos;
        self.pos += 1;
        while self.pos < self.end {
            if self.bytes[self.pos] == b'\'' {
                self.pos += 1;
                return Ok(());
            }
            self.pos += 1;
        }
        Err((
            open,
            ScriptSyntaxError::UnterminatedSingleQuote((open, 1).into()),
        ))
    }

    fn skip_ansi_c_quote(&mut self) -> Result<(), ScanError> {
        // Positioned at the `'` of `$'`.
        let open = self.pos - 1;
        self.pos += 1;
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'\'' => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err((
            open,
            ScriptSyntaxError::UnterminatedSingleQuote((open, 2).into()),
        ))
    }

    fn skip_double_quote(&mut self) -> Result<(), ScanError> {
        let open = self.pos;
        self.pos += 1;
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return Ok(());
                }
                b'`' => self.skip_backquote()?,
                b'$' => self.skip_dollar(true)?,
                _ => self.pos += 1,
            }
        }
        Err((
            open,
            ScriptSyntaxError::UnterminatedDoubleQuote((open, 1).into()),
        ))
    }

    fn skip_backquote(&mut self) -> Result<(), ScanError> {
        let open = self.pos;
        self.pos += 1;
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err((
            open,
            ScriptSyntaxError::UnterminatedBackquote((open, 1).into()),
        ))
    }

    /// Skips a `$` expansion starting at the current position.
    fn skip_dollar(&mut self, in_double_quote: bool) -> Result<(), ScanError> {
        let open = self.pos;
        match self.peek(1) {
            Some(b'(') if self.peek(2) == Some(b'(') => {
                self.pos += 1;
                self.skip_arithmetic(open)
            }
            Some(b'(') => {
                let mut nested = Scanner::new(self.text, self.pos + 2, self.end, Mode::Substitution);
                self.pos = nested.run()?;
                Ok(())
            }
            Some(b'{') => self.skip_parameter_expansion(),
            Some(b'\'') if !in_double_quote => {
                self.pos += 1;
                self.skip_ansi_c_quote()
            }
            Some(b'"') if !in_double_quote => {
                self.pos += 1;
                self.skip_double_quote()
            }
            _ => {
                self.pos += 1;
                Ok(())
            }
        }
    }

    fn skip_parameter_expansion(&mut self) -> Result<(), ScanError> {
        let open = self.pos;
        self.pos += 2;
        let mut depth = 1usize;
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'\'' => self.skip_single_quote()?,
                b'"' => self.skip_double_quote()?,
                b'`' => self.skip_backquote()?,
                b'$' => self.skip_dollar(false)?,
                _ => self.pos += 1,
            }
        }
        Err((
            open,
            ScriptSyntaxError::UnterminatedSubstitution((open, 2).into()),
        ))
    }
}
