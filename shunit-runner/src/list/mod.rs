// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovering the tests in a script.
//!
//! The main data structure in this module is [`TestList`], which holds every [`TestCase`] found in
//! a script in discovery order.

mod description;
mod test_list;

pub use description::*;
pub use test_list::*;
