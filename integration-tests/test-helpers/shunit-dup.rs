// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! This is a duplicate of shunit's main.rs, so that integration tests can run the binary without
//! depending on how the `shunit` package's own binary target is built.

use color_eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = enable_ansi_support::enable_ansi_support();

    shunit::main_impl()
}
