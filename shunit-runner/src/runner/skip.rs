// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::script::{Step, StepKind};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// A test body with the skip rewrite applied.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SkipRewrite {
    /// The steps to run.
    pub steps: Vec<Step>,

    /// The line of the skip directive the body now returns after, if any.
    pub skip_line: Option<usize>,
}

static SKIP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(skip)(?:[ \t;]|$)").expect("regex is valid"));

/// Rewrites a test body so that it returns successfully right after its first skip directive.
///
/// A top-level `skip` step is followed by `return 0` and the steps after it are dropped. A `skip`
/// nested inside a compound step has `; return 0` appended to the skip command. With `force_run`
/// the body is left unchanged.
pub fn rewrite_skip(steps: &[Step], force_run: bool) -> SkipRewrite {
    let unchanged = || SkipRewrite {
        steps: steps.to_vec(),
        skip_line: None,
    };
    if force_run {
        return unchanged();
    }

    for (idx, step) in steps.iter().enumerate() {
        if step.kind == StepKind::Skip {
            let mut steps = steps[..=idx].to_vec();
            steps.push(Step {
                line: step.line,
                text: "return 0".to_owned(),
                kind: StepKind::Command,
            });
            return SkipRewrite {
                steps,
                skip_line: Some(step.line),
            };
        }

        let Some(captures) = SKIP_LINE.captures(&step.text) else {
            continue;
        };
        let skip_start = captures.get(1).expect("group 1 always matches").start();
        let line = step.line + step.text[..skip_start].matches('\n').count();
        match inject_return(&step.text, skip_start) {
            Some(text) => {
                let mut steps = steps.to_vec();
                steps[idx].text = text;
                return SkipRewrite {
                    steps,
                    skip_line: Some(line),
                };
            }
            None => {
                debug!("skip directive at line {line} can't be rewritten, the body runs in full");
                return unchanged();
            }
        }
    }

    unchanged()
}

/// Appends `; return 0` to the skip command starting at `start`.
///
/// Returns `None` if the command is part of a pipeline or an `&&`/`||` list, or continues onto the
/// next line.
fn inject_return(text: &str, start: usize) -> Option<String> {
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut word_start = false;
    let mut end = text.len();

    for (offset, ch) in text[start..].char_indices() {
        let idx = start + offset;
        if escaped {
            if ch == '\n' {
                return None;
            }
            escaped = false;
            word_start = false;
            continue;
        }
        let quoted = in_single || in_double;
        match ch {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '&' | '|' if !quoted => return None,
            ';' | ')' | '\n' if !quoted => {
                end = idx;
                break;
            }
            '#' if word_start && !quoted => {
                end = idx;
                break;
            }
            _ => {}
        }
        word_start = ch.is_whitespace() && !in_single && !in_double;
    }
    if escaped || in_single || in_double {
        return None;
    }

    let command_end = start + text[start..end].trim_end().len();
    let mut out = String::with_capacity(text.len() + 10);
    out.push_str(&text[..command_end]);
    out.push_str("; return 0");
    out.push_str(&text[command_end..]);
    Some(out)
}
