// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for shunit's integration tests.

pub mod shunit_cli;
