// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::script::{Step, StepKind};
use itertools::Itertools;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Extracts the description a test declares with `it`, `describe` or `this_test`.
///
/// The last directive in the body wins. Quoted arguments are unquoted and joined with single
/// spaces, and embedded newlines collapse to one space.
///
/// Returns `None` if the body has no directive, or if the winning directive has no arguments.
/// Callers fall back to the test identifier in that case. An explicit empty string returns
/// `Some("")`.
pub fn extract_description(steps: &[Step]) -> Option<String> {
    let step = steps
        .iter()
        .rev()
        .find(|step| step.kind == StepKind::Describe)?;

    let words = match shell_words::split(command_prefix(&step.text)) {
        Ok(words) => words,
        Err(err) => {
            debug!(
                "could not split description directive at line {}: {err}",
                step.line
            );
            return None;
        }
    };

    let args = words.get(1..).filter(|args| !args.is_empty())?;
    let joined = args.iter().join(" ");
    Some(NEWLINE_RUN.replace_all(&joined, " ").into_owned())
}

static NEWLINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r]*\n\s*").expect("regex is valid"));

/// Returns the part of a statement before its first unquoted control operator or comment.
fn command_prefix(text: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut word_start = true;

    for (idx, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            word_start = false;
            continue;
        }
        match ch {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ';' | '&' | '|' if !in_single && !in_double => return &text[..idx],
            '#' if word_start && !in_single && !in_double => return &text[..idx],
            _ => {}
        }
        word_start = ch.is_whitespace() && !in_single && !in_double;
    }
    text
}
