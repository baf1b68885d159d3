//! Command implementations for the inkpress CLI
//!
//! Each command module handles the CLI interface and delegates to
//! inkpress-core for actual implementation.

pub mod build;
