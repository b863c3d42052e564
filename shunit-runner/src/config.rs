// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for shunit.
//!
//! Configuration is read from an embedded default config, layered with `.config/shunit.toml` in
//! the current directory or with a file passed in on the command line.

use crate::errors::{ConfigParseError, DiscoveryOrderParseError};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use regex::Regex;
use serde::Deserialize;
use std::{fmt, str::FromStr, sync::LazyLock, time::Duration};

/// Overall configuration for shunit.
#[derive(Clone, Debug)]
pub struct ShunitConfig {
    inner: ShunitConfigImpl,
}

impl ShunitConfig {
    /// The default location of the config within a directory: `.config/shunit.toml`.
    pub const CONFIG_PATH: &'static str = ".config/shunit.toml";

    /// Contains the default config as a TOML file.
    ///
    /// User configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the shunit config from the given file, or if not specified from
    /// `.config/shunit.toml` in `dir`.
    ///
    /// A file passed in explicitly must exist. If it isn't specified and `dir` doesn't have a
    /// config, the default config options are used.
    pub fn from_sources(
        dir: impl AsRef<Utf8Path>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = dir.as_ref().join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let inner = Self::build_and_deserialize_config(&builder)
            .map_err(|err| ConfigParseError::new(config_file, err))?;
        Ok(Self { inner })
    }

    /// Returns the default shunit config.
    pub fn default_config() -> Self {
        let inner = Self::build_and_deserialize_config(&Self::make_default_config())
            .expect("default config is always valid");
        Self { inner }
    }

    /// Returns discovery-related settings.
    pub fn discovery(&self) -> &DiscoveryConfig {
        &self.inner.discovery
    }

    /// Returns execution-related settings.
    pub fn run(&self) -> &RunConfig {
        &self.inner.run
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<ShunitConfigImpl, ConfigError> {
        let config: ShunitConfigImpl = builder.build_cloned()?.try_deserialize()?;
        if !SHELL_IDENTIFIER.is_match(&config.run.entry_point) {
            return Err(ConfigError::Message(format!(
                "run.entry-point `{}` is not a valid shell function name",
                config.run.entry_point
            )));
        }
        Ok(config)
    }
}

static SHELL_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("regex is valid"));

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ShunitConfigImpl {
    discovery: DiscoveryConfig,
    run: RunConfig,
}

/// Settings that control how tests are discovered.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// The order tests are discovered (and run) in.
    pub order: DiscoveryOrder,

    /// Whether more than one definition of a test identifier is an error.
    pub check_duplicates: bool,
}

/// Settings that control how tests are run.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunConfig {
    /// The shell used to run tests.
    pub shell: String,

    /// The name of the function a script calls to hand control to the harness.
    pub entry_point: String,

    /// Whether skip directives are ignored.
    pub force_run: bool,

    /// An optional per-test timeout.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// The order in which discovered tests are listed, indexed and run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryOrder {
    /// The order in which functions are declared in the script.
    #[default]
    Declaration,

    /// Sorted by test identifier.
    Sorted,
}

impl DiscoveryOrder {
    /// String representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["declaration", "sorted"]
    }
}

impl FromStr for DiscoveryOrder {
    type Err = DiscoveryOrderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "declaration" => DiscoveryOrder::Declaration,
            "sorted" => DiscoveryOrder::Sorted,
            other => return Err(DiscoveryOrderParseError::new(other)),
        };
        Ok(val)
    }
}

impl fmt::Display for DiscoveryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryOrder::Declaration => write!(f, "declaration"),
            DiscoveryOrder::Sorted => write!(f, "sorted"),
        }
    }
}
