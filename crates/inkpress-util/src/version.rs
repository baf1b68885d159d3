/*
 * version.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Version handling for inkpress
//!
//! While the crate version is 0.x.y the CLI reports it with a `-dev`
//! suffix, so output produced by a pre-release build is recognizable.
//! From 1.0.0 on the Cargo version is reported unchanged.

/// Get the version string that should be reported by the CLI
pub fn cli_version() -> &'static str {
    if cargo_version().starts_with("0.") {
        concat!(env!("CARGO_PKG_VERSION"), "-dev")
    } else {
        cargo_version()
    }
}

/// Get the Cargo package version (for internal use)
pub fn cargo_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = cli_version();
        assert!(version.starts_with(cargo_version()));
        if cargo_version().starts_with("0.") {
            assert_eq!(version, format!("{}-dev", cargo_version()));
        } else {
            assert_eq!(version, cargo_version());
        }
    }

    #[test]
    fn test_cargo_version() {
        let version = cargo_version();
        assert_eq!(version.split('.').count(), 3, "expected a semver triple");
    }
}
