/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Shared utilities for inkpress

pub mod version;

pub use version::{cargo_version, cli_version};
