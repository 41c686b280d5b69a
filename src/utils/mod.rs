// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signgpt contributors

//! Utility modules
//!
//! Common utilities for the signgpt CLI.

pub mod spinner;

pub use spinner::*;
