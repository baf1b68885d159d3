/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Build configuration files (`inkpress.yml`).
 */

//! Build configuration.
//!
//! A build configuration names the input workspace, the output directory
//! and the rules to apply:
//!
//! ```yaml
//! input: docs/workspace.json
//! format: json
//! output: dist
//! cache-dir: .inkpress-cache
//! rules:
//!   - id: manual
//!     template: https://github.com/acme/latex-book.git
//!     name: manual-pdf
//! ```
//!
//! Relative paths resolve against the directory holding the file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use inkpress_model::{CodecResult, Workspace, unmarshal_file};
use serde::Deserialize;
use tracing::debug;

use crate::build::BuildRule;
use crate::error::{ConfigError, ConfigResult};
use crate::provision::TemplateSource;

/// File names searched for by [`BuildConfig::discover`], in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["inkpress.yml", "inkpress.yaml"];

/// Serialization format of the input workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum InputFormat {
    #[default]
    Json,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Json => "json",
        }
    }

    /// Read a workspace stored in this format.
    pub fn load(&self, path: &Path) -> CodecResult<Workspace> {
        match self {
            InputFormat::Json => unmarshal_file(path),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(InputFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for InputFormat {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Parsed `inkpress.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildConfig {
    /// Serialized workspace to build from
    pub input: PathBuf,

    /// Format of `input`
    #[serde(default)]
    pub format: InputFormat,

    /// Directory receiving one folder per rule
    pub output: PathBuf,

    /// Persistent scratch directory; a temporary one is used when absent
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    pub rules: Vec<BuildRule>,
}

impl BuildConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: BuildConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate(path)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.input = base.join(&config.input);
        config.output = base.join(&config.output);
        config.cache_dir = config.cache_dir.map(|dir| base.join(dir));
        for rule in &mut config.rules {
            if let TemplateSource::Local(dir) = TemplateSource::parse(&rule.template)
                && dir.is_relative()
            {
                rule.template = base.join(dir).to_string_lossy().into_owned();
            }
        }
        debug!(config = %path.display(), rules = config.rules.len(), "loaded build configuration");
        Ok(config)
    }

    /// Find a configuration file in `start` or any of its parents.
    pub fn discover(start: impl AsRef<Path>) -> Option<PathBuf> {
        start.as_ref().ancestors().find_map(|dir| {
            CONFIG_FILE_NAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }

    fn validate(&self, path: &Path) -> ConfigResult<()> {
        let invalid = |message: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        };
        if self.rules.is_empty() {
            return Err(invalid("no rules".to_string()));
        }
        for (i, rule) in self.rules.iter().enumerate() {
            for (field, value) in [("id", &rule.id), ("template", &rule.template), ("name", &rule.name)] {
                if value.trim().is_empty() {
                    return Err(invalid(format!("rule {} has an empty {}", i + 1, field)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
input: docs/workspace.json
output: dist
cache-dir: .cache
rules:
  - id: manual
    template: templates/book
    name: manual-pdf
  - id: site
    template: https://example.com/site.git
    name: site
"#;

    #[test]
    fn test_load_resolves_relative_paths() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("inkpress.yml");
        fs::write(&path, CONFIG).unwrap();

        let config = BuildConfig::load(&path).unwrap();
        assert_eq!(config.format, InputFormat::Json);
        assert_eq!(config.input, temp.path().join("docs/workspace.json"));
        assert_eq!(config.output, temp.path().join("dist"));
        assert_eq!(config.cache_dir, Some(temp.path().join(".cache")));
        assert_eq!(
            config.rules,
            vec![
                BuildRule::new(
                    "manual",
                    temp.path().join("templates/book").to_string_lossy(),
                    "manual-pdf"
                ),
                BuildRule::new("site", "https://example.com/site.git", "site"),
            ]
        );
    }

    #[test]
    fn test_unsupported_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("inkpress.yml");
        fs::write(&path, format!("format: xml\n{}", CONFIG)).unwrap();

        let err = BuildConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("xml"));
        assert!(matches!(
            "xml".parse::<InputFormat>(),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert_eq!("JSON".parse::<InputFormat>().unwrap(), InputFormat::Json);
    }

    #[test]
    fn test_rules_are_validated() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("inkpress.yml");

        fs::write(&path, "input: a.json\noutput: out\nrules: []\n").unwrap();
        assert!(matches!(BuildConfig::load(&path), Err(ConfigError::Invalid { .. })));

        fs::write(
            &path,
            "input: a.json\noutput: out\nrules:\n  - {id: x, template: t, name: ''}\n",
        )
        .unwrap();
        let err = BuildConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("rule 1 has an empty name"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("inkpress.yml");
        fs::write(&path, format!("outptu: typo\n{}", CONFIG)).unwrap();
        assert!(matches!(BuildConfig::load(&path), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn test_discover_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(BuildConfig::discover(&nested), None);

        fs::write(temp.path().join("a/inkpress.yaml"), CONFIG).unwrap();
        assert_eq!(
            BuildConfig::discover(&nested),
            Some(temp.path().join("a/inkpress.yaml"))
        );
    }
}
