/*
 * provision.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Making template projects available on the local filesystem.
 */

//! Template provisioning.
//!
//! A template reference is either a local directory or a git URL. Remote
//! templates are cloned once into the cache and pulled on every later use.
//! The clone stays share-locked for as long as the returned
//! [`ProvisionedTemplate`] is alive, so no other build pulls into it while
//! it is being read.

use std::fs;
use std::path::{Path, PathBuf};

use inkpress_system_runtime::SystemRuntime;
use tracing::{debug, info, warn};

use crate::cache::{CacheLayout, CacheLock, create_dir_if_absent};
use crate::error::{BuildError, BuildResult};

/// Version control tool used for remote templates.
pub const GIT: &str = "git";

/// Where a template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A directory on the local filesystem.
    Local(PathBuf),
    /// A git repository reachable over http(s).
    Remote(String),
}

impl TemplateSource {
    /// Classify a template reference.
    ///
    /// References starting with `http` (any case) are remote.
    pub fn parse(reference: &str) -> Self {
        if reference.to_lowercase().starts_with("http") {
            TemplateSource::Remote(reference.to_string())
        } else {
            TemplateSource::Local(PathBuf::from(reference))
        }
    }
}

/// A template directory ready to be read.
#[derive(Debug)]
pub struct ProvisionedTemplate {
    dir: PathBuf,
    _lock: Option<CacheLock>,
}

impl ProvisionedTemplate {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Resolves template references to local directories.
pub struct Provisioner<'a> {
    layout: &'a CacheLayout,
    runtime: &'a dyn SystemRuntime,
}

impl<'a> Provisioner<'a> {
    pub fn new(layout: &'a CacheLayout, runtime: &'a dyn SystemRuntime) -> Self {
        Self { layout, runtime }
    }

    /// Return a local directory holding the referenced template.
    pub fn provision(&self, reference: &str) -> BuildResult<ProvisionedTemplate> {
        match TemplateSource::parse(reference) {
            TemplateSource::Local(dir) => {
                if dir.exists() {
                    Ok(ProvisionedTemplate { dir, _lock: None })
                } else {
                    Err(BuildError::TemplateNotFound {
                        reference: reference.to_string(),
                    })
                }
            }
            TemplateSource::Remote(url) => self.provision_remote(&url),
        }
    }

    fn provision_remote(&self, url: &str) -> BuildResult<ProvisionedTemplate> {
        let dir = self.layout.template_dir(url);
        let lock = CacheLock::acquire(&dir).map_err(|e| BuildError::io(&dir, e))?;

        let created = create_dir_if_absent(&dir).map_err(|e| BuildError::io(&dir, e))?;
        if !created {
            self.run(&dir, &["pull"])?;
        } else if let Err(err) = self.run(&dir, &["clone", url, "."]) {
            // Leave no half-cloned entry behind for the next pull.
            if let Err(e) = fs::remove_dir_all(&dir) {
                warn!(dir = %dir.display(), error = %e, "Failed to remove failed clone");
            }
            return Err(err);
        }

        lock.downgrade().map_err(|e| BuildError::io(&dir, e))?;
        Ok(ProvisionedTemplate {
            dir,
            _lock: Some(lock),
        })
    }

    fn run(&self, dir: &Path, args: &[&str]) -> BuildResult<()> {
        info!(dir = %dir.display(), "{} {}", GIT, args.join(" "));
        let output = self
            .runtime
            .exec_command(GIT, args, Some(dir))
            .map_err(|source| BuildError::Runtime {
                tool: GIT.to_string(),
                source,
            })?;
        debug!(output = %output.combined_output(), "{} finished", GIT);

        if !output.success() {
            return Err(BuildError::ToolFailed {
                tool: format!("{} {}", GIT, args.join(" ")),
                dir: dir.to_path_buf(),
                code: output.code,
                output: output.combined_output(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs2::FileExt;
    use inkpress_system_runtime::{CommandOutput, RuntimeError, RuntimeResult};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct ScriptedGit {
        calls: Mutex<Vec<Vec<String>>>,
        fail_with: Option<i32>,
    }

    impl ScriptedGit {
        fn new(fail_with: Option<i32>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with,
            }
        }
    }

    impl SystemRuntime for ScriptedGit {
        fn exec_command(
            &self,
            command: &str,
            args: &[&str],
            _cwd: Option<&Path>,
        ) -> RuntimeResult<CommandOutput> {
            if command != GIT {
                return Err(RuntimeError::CommandNotFound(command.to_string()));
            }
            self.calls
                .lock()
                .unwrap()
                .push(args.iter().map(|a| a.to_string()).collect());
            Ok(CommandOutput {
                code: self.fail_with.unwrap_or(0),
                stdout: vec![],
                stderr: b"fatal: could not read from remote".to_vec(),
            })
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            TemplateSource::parse("HTTPS://example.com/t.git"),
            TemplateSource::Remote("HTTPS://example.com/t.git".to_string())
        );
        assert_eq!(
            TemplateSource::parse("./templates/book"),
            TemplateSource::Local(PathBuf::from("./templates/book"))
        );
    }

    #[test]
    fn test_local_template() {
        let temp = TempDir::new().unwrap();
        let layout = CacheLayout::new(temp.path().join("scratch"));
        let runtime = ScriptedGit::new(None);
        let provisioner = Provisioner::new(&layout, &runtime);

        let reference = temp.path().to_string_lossy().into_owned();
        assert_eq!(provisioner.provision(&reference).unwrap().dir(), temp.path());

        let missing = temp.path().join("missing").to_string_lossy().into_owned();
        assert!(matches!(
            provisioner.provision(&missing),
            Err(BuildError::TemplateNotFound { .. })
        ));
        assert!(runtime.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remote_clone_then_pull() {
        let temp = TempDir::new().unwrap();
        let layout = CacheLayout::new(temp.path());
        let runtime = ScriptedGit::new(None);
        let provisioner = Provisioner::new(&layout, &runtime);
        let url = "https://example.com/t.git";

        let first = provisioner.provision(url).unwrap().dir().to_path_buf();
        let second = provisioner.provision(url).unwrap().dir().to_path_buf();
        assert_eq!(first, second);
        assert_eq!(first, layout.template_dir(url));

        let calls = runtime.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                vec!["clone".to_string(), url.to_string(), ".".to_string()],
                vec!["pull".to_string()],
            ]
        );
    }

    #[test]
    fn test_clone_is_share_locked_while_held() {
        let temp = TempDir::new().unwrap();
        let layout = CacheLayout::new(temp.path());
        let runtime = ScriptedGit::new(None);
        let provisioner = Provisioner::new(&layout, &runtime);
        let url = "https://example.com/t.git";

        let template = provisioner.provision(url).unwrap();
        let lock_file = temp.path().join("template").join(format!(
            "{}.lock",
            template.dir().file_name().unwrap().to_string_lossy()
        ));
        let other = fs::File::open(&lock_file).unwrap();
        assert!(other.try_lock_shared().is_ok());
        FileExt::unlock(&other).unwrap();
        assert!(other.try_lock_exclusive().is_err());

        drop(template);
        assert!(other.try_lock_exclusive().is_ok());
    }

    #[test]
    fn test_failed_clone_is_removed() {
        let temp = TempDir::new().unwrap();
        let layout = CacheLayout::new(temp.path());
        let runtime = ScriptedGit::new(Some(128));
        let provisioner = Provisioner::new(&layout, &runtime);
        let url = "https://example.com/private.git";

        let err = provisioner.provision(url).unwrap_err();
        match &err {
            BuildError::ToolFailed { code, output, .. } => {
                assert_eq!(*code, 128);
                assert!(output.contains("could not read from remote"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!layout.template_dir(url).exists());
    }
}
