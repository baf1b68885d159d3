/*
 * inkpress-system-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * Runtime abstraction layer for running external tools.
 *
 * This crate provides a trait-based abstraction for process execution,
 * so that the build pipeline can run `git` or a typesetter natively while
 * tests substitute a runtime that records invocations instead.
 */

mod native;
mod traits;

// Re-export core types (API surface)
pub use traits::{CommandOutput, RuntimeError, RuntimeResult, SystemRuntime};

// Re-export runtime implementations
pub use native::NativeRuntime;
