// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Selecting tests based on user-specified specs.
//!
//! The main structure in this module is [`TestFilter`], which is created by a [`TestFilterBuilder`].
//!
//! Each spec is one of:
//! * a numeric index into the discovered tests,
//! * a test identifier pattern (anything starting with `testcase_`), matched case-sensitively,
//! * a description pattern, matched case-insensitively.
//!
//! Patterns support `*`, `?` and `[...]` wildcards. Every spec must match at least one test.

use crate::{
    errors::{SelectionError, TestFilterBuilderError},
    list::{TestCase, TestList},
};
use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

/// Resolved specs, ready to be applied to a [`TestList`].
#[derive(Clone, Debug)]
pub struct TestFilterBuilder {
    specs: Vec<TestSpec>,
}

#[derive(Clone, Debug)]
enum TestSpec {
    Index { raw: String, index: Option<usize> },
    Identifier { raw: String, matcher: GlobMatcher },
    Description { raw: String, matcher: GlobMatcher },
}

impl TestSpec {
    fn new(raw: &str) -> Result<Self, TestFilterBuilderError> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(TestSpec::Index {
                raw: raw.to_owned(),
                // Indexes too large for usize are out of range for any list.
                index: raw.parse().ok(),
            });
        }

        let is_identifier = raw.starts_with(TestList::TEST_PREFIX);
        let matcher = GlobBuilder::new(raw)
            .case_insensitive(!is_identifier)
            .build()
            .map_err(|err| TestFilterBuilderError::new(raw, err))?
            .compile_matcher();
        let raw = raw.to_owned();
        Ok(if is_identifier {
            TestSpec::Identifier { raw, matcher }
        } else {
            TestSpec::Description { raw, matcher }
        })
    }

    /// Marks the tests this spec matches in `selected`.
    fn apply(&self, list: &TestList, selected: &mut [bool]) -> Result<(), SelectionError> {
        match self {
            TestSpec::Index { raw, index } => match index.filter(|index| *index < list.len()) {
                Some(index) => {
                    selected[index] = true;
                    Ok(())
                }
                None => Err(SelectionError::IndexOutOfRange {
                    index: raw.clone(),
                    test_count: list.len(),
                }),
            },
            TestSpec::Identifier { raw, matcher } => {
                let matched = mark_matches(list, selected, |test| matcher.is_match(test.name()));
                if matched {
                    Ok(())
                } else {
                    Err(SelectionError::NoIdentifierMatch { spec: raw.clone() })
                }
            }
            TestSpec::Description { raw, matcher } => {
                let matched =
                    mark_matches(list, selected, |test| matcher.is_match(test.description()));
                if matched {
                    Ok(())
                } else {
                    Err(SelectionError::NoDescriptionMatch { spec: raw.clone() })
                }
            }
        }
    }
}

fn mark_matches(
    list: &TestList,
    selected: &mut [bool],
    is_match: impl Fn(&TestCase) -> bool,
) -> bool {
    let mut matched = false;
    for test in list.iter().filter(|&test| is_match(test)) {
        selected[test.index()] = true;
        matched = true;
    }
    matched
}

impl TestFilterBuilder {
    /// Parses specs as passed in on the command line.
    ///
    /// An empty list of specs selects every test.
    pub fn new<I, S>(specs: I) -> Result<Self, TestFilterBuilderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let specs = specs
            .into_iter()
            .map(|spec| TestSpec::new(spec.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { specs })
    }

    /// Creates a builder that selects every test.
    pub fn default_set() -> Self {
        Self { specs: Vec::new() }
    }

    /// Resolves the specs against `list`.
    ///
    /// Fails with the first spec that doesn't match any test.
    pub fn build<'list>(&self, list: &'list TestList) -> Result<TestFilter<'list>, SelectionError> {
        let mut selected = vec![self.specs.is_empty(); list.len()];
        for spec in &self.specs {
            spec.apply(list, &mut selected)?;
        }

        let filter = TestFilter { list, selected };
        debug!(
            "selected {} of {} tests from {} specs",
            filter.len(),
            list.len(),
            self.specs.len(),
        );
        Ok(filter)
    }
}

/// The set of tests selected to run, in discovery order.
#[derive(Clone, Debug)]
pub struct TestFilter<'list> {
    list: &'list TestList,
    selected: Vec<bool>,
}

impl<'list> TestFilter<'list> {
    /// Returns true if `test` is selected.
    pub fn is_selected(&self, test: &TestCase) -> bool {
        self.selected.get(test.index()).copied().unwrap_or(false)
    }

    /// Returns the number of selected tests.
    pub fn len(&self) -> usize {
        self.selected.iter().filter(|selected| **selected).count()
    }

    /// Returns true if no tests are selected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the selected tests in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &'list TestCase> + '_ {
        self.list.iter().filter(|test| self.is_selected(test))
    }

    /// Collects the selected tests in discovery order.
    pub fn to_vec(&self) -> Vec<&'list TestCase> {
        self.iter().collect()
    }
}
