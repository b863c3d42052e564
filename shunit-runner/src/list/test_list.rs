// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::extract_description;
use crate::{
    config::{DiscoveryConfig, DiscoveryOrder},
    errors::{DuplicateTest, DuplicateTestError},
    helpers::plural,
    script::{FunctionDef, ParsedScript},
};
use camino::Utf8Path;
use owo_colors::{OwoColorize, Style};
use std::{collections::HashMap, io, io::Write};
use tracing::debug;

/// A single test discovered in a script.
#[derive(Clone, Debug)]
pub struct TestCase {
    index: usize,
    description: String,
    explicit_description: bool,
    definition: FunctionDef,
}

impl TestCase {
    /// Returns the test identifier: the name of the function.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Returns the position of this test in discovery order, starting from 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the description of this test.
    ///
    /// This is the identifier if the test doesn't declare a description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns true if the description was declared in the test body.
    pub fn has_explicit_description(&self) -> bool {
        self.explicit_description
    }

    /// Returns the 1-based line the test's definition starts on.
    pub fn line(&self) -> usize {
        self.definition.line()
    }

    /// Returns the function definition backing this test.
    pub fn definition(&self) -> &FunctionDef {
        &self.definition
    }
}

/// The list of tests discovered in a script, along with its fixtures.
#[derive(Clone, Debug)]
pub struct TestList {
    script: ParsedScript,
    tests: Vec<TestCase>,
    setup: Option<FunctionDef>,
    teardown: Option<FunctionDef>,
}

impl TestList {
    /// Functions whose names start with this prefix are tests.
    pub const TEST_PREFIX: &'static str = "testcase_";

    /// The name of the fixture run before each test.
    pub const SETUP_FN: &'static str = "setup";

    /// The name of the fixture run after each test.
    pub const TEARDOWN_FN: &'static str = "teardown";

    /// Discovers the tests defined in `script`.
    pub fn new(script: ParsedScript, config: &DiscoveryConfig) -> Result<Self, DuplicateTestError> {
        // Group definitions by name, keeping the order each name is first seen in.
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<Vec<(usize, &FunctionDef)>> = Vec::new();
        for (position, function) in script.functions().iter().enumerate() {
            if !function.name().starts_with(Self::TEST_PREFIX) {
                continue;
            }
            match positions.get(function.name()) {
                Some(&group) => groups[group].push((position, function)),
                None => {
                    positions.insert(function.name(), groups.len());
                    groups.push(vec![(position, function)]);
                }
            }
        }

        if config.check_duplicates {
            let duplicates: Vec<_> = groups
                .iter()
                .filter(|defs| defs.len() > 1)
                .map(|defs| DuplicateTest {
                    name: defs[0].1.name().into(),
                    lines: defs.iter().map(|(_, def)| def.line()).collect(),
                })
                .collect();
            if !duplicates.is_empty() {
                return Err(DuplicateTestError::new(script.path(), duplicates));
            }
        }

        // The last definition takes effect, at the position it was declared in.
        let mut effective: Vec<(usize, &FunctionDef)> = groups
            .iter()
            .filter_map(|defs| defs.last().copied())
            .collect();
        match config.order {
            DiscoveryOrder::Declaration => effective.sort_by_key(|(position, _)| *position),
            DiscoveryOrder::Sorted => effective.sort_by(|(_, a), (_, b)| a.name().cmp(b.name())),
        }

        let tests: Vec<_> = effective
            .into_iter()
            .enumerate()
            .map(|(index, (_, definition))| {
                let explicit = extract_description(definition.steps());
                TestCase {
                    index,
                    explicit_description: explicit.is_some(),
                    description: explicit.unwrap_or_else(|| definition.name().to_owned()),
                    definition: definition.clone(),
                }
            })
            .collect();

        let setup = script.function(Self::SETUP_FN).cloned();
        let teardown = script.function(Self::TEARDOWN_FN).cloned();
        debug!(
            "discovered {} {} in {} (setup: {}, teardown: {})",
            tests.len(),
            plural::tests_str(tests.len()),
            script.path(),
            setup.is_some(),
            teardown.is_some(),
        );

        Ok(Self {
            script,
            tests,
            setup,
            teardown,
        })
    }

    /// Returns the parsed script the tests were discovered in.
    pub fn script(&self) -> &ParsedScript {
        &self.script
    }

    /// Returns the path to the script.
    pub fn path(&self) -> &Utf8Path {
        self.script.path()
    }

    /// Returns the number of discovered tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if no tests were discovered.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Returns the test at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&TestCase> {
        self.tests.get(index)
    }

    /// Iterates over the discovered tests in discovery order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TestCase> + '_ {
        self.tests.iter()
    }

    /// Returns the setup fixture, if the script defines one.
    pub fn setup(&self) -> Option<&FunctionDef> {
        self.setup.as_ref()
    }

    /// Returns the teardown fixture, if the script defines one.
    pub fn teardown(&self) -> Option<&FunctionDef> {
        self.teardown.as_ref()
    }

    /// Writes `selected` in list format: a count, then `index:description:identifier` per test.
    pub fn write(
        &self,
        selected: &[&TestCase],
        mut writer: impl Write,
        colorize: bool,
    ) -> io::Result<()> {
        let mut styles = Styles::default();
        if colorize {
            styles.colorize();
        }

        writeln!(
            writer,
            "{} {}",
            selected.len().style(styles.count),
            plural::tests_str(selected.len()),
        )?;
        for test in selected {
            writeln!(
                writer,
                "{}:{}:{}",
                test.index().style(styles.index),
                test.description(),
                test.name().style(styles.name),
            )?;
        }
        writer.flush()
    }
}

#[derive(Clone, Debug, Default)]
struct Styles {
    count: Style,
    index: Style,
    name: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.index = Style::new().yellow().bold();
        self.name = Style::new().blue().bold();
    }
}
