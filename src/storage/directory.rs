//! A filesystem backed collection of casks
//!
//! The [`Directory`] finds cask sources below a root, parses them in parallel
//! and audits every one of them against a [`DomainRegistry`].

use std::{
    ffi::OsStr,
    fmt,
    path::{Path, PathBuf},
};

use nonempty::NonEmpty;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::{Config, DomainRegistry, audit},
    report::FileReport,
    storage::{CaskFile, LoadError},
};

/// A directory whose casks have been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    casks: Vec<CaskFile>,
    config: Config,
}

/// A directory that has not been read yet.
#[derive(Debug, PartialEq, Eq)]
pub struct Unloaded;

/// A filesystem backed collection of casks.
pub struct Directory<S> {
    /// The directory (or single file) casks are read from.
    root: PathBuf,
    state: S,
}

impl<S> Directory<S> {
    /// The directory (or single file) casks are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Directory<Unloaded> {
    /// Opens a directory at the given path.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self {
            root,
            state: Unloaded,
        }
    }

    /// Load all casks from disk.
    ///
    /// # Errors
    ///
    /// This method has different behaviour depending on the configuration file
    /// in the root. If `allow_unparseable` is `true`, then any files that
    /// cannot be read or parsed as casks are skipped. If `allow_unparseable`
    /// is `false` (the default), every failure is collected and returned.
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub fn load_all(self) -> Result<Directory<Loaded>, DirectoryLoadError> {
        let config = load_config(&self.root);
        let paths = collect_cask_paths(&self.root, &config);

        let (casks, failures): (Vec<_>, Vec<_>) = paths
            .par_iter()
            .map(|path| CaskFile::load(path).map_err(|error| (path.clone(), error)))
            .partition(Result::is_ok);

        let casks: Vec<_> = casks.into_iter().filter_map(Result::ok).collect();
        let failures: Vec<_> = failures.into_iter().filter_map(Result::err).collect();

        if config.allow_unparseable {
            for (path, error) in &failures {
                tracing::debug!("Skipping unparseable cask {}: {error}", path.display());
            }
        } else if let Some(failures) = NonEmpty::from_vec(failures) {
            return Err(DirectoryLoadError::Unparseable(failures));
        }

        tracing::debug!("Loaded {} casks", casks.len());

        Ok(Directory {
            root: self.root,
            state: Loaded { casks, config },
        })
    }
}

impl Directory<Loaded> {
    /// The parsed casks.
    pub fn casks(&self) -> impl Iterator<Item = &CaskFile> {
        self.state.casks.iter()
    }

    /// The configuration the directory was loaded with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.state.config
    }

    /// Audits every cask, in parallel.
    ///
    /// Returns one report per cask, sorted by path.
    #[must_use]
    #[instrument(level = "debug", skip_all)]
    pub fn audit<R>(&self, registry: &R) -> Vec<FileReport>
    where
        R: DomainRegistry + Sync + ?Sized,
    {
        let mut reports: Vec<_> = self
            .state
            .casks
            .par_iter()
            .map(|cask| FileReport {
                path: cask.path().to_path_buf(),
                diagnostics: audit(cask.document(), registry),
            })
            .collect();
        reports.sort_by(|a, b| a.path.cmp(&b.path));
        reports
    }
}

/// Errors that can occur when loading a directory of casks.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryLoadError {
    /// Some files could not be loaded.
    Unparseable(NonEmpty<(PathBuf, LoadError)>),
}

impl fmt::Display for DirectoryLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_DISPLAY: usize = 5;

        match self {
            Self::Unparseable(failures) => {
                write!(f, "unparseable casks: ")?;
                for (i, (path, error)) in failures.iter().take(MAX_DISPLAY).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {error}", path.display())?;
                    if let LoadError::Parse(source) = error {
                        write!(f, ": {source}")?;
                    }
                }
                if failures.len() > MAX_DISPLAY {
                    write!(f, "... (and {} more)", failures.len() - MAX_DISPLAY)?;
                }
                Ok(())
            }
        }
    }
}

fn load_config(root: &Path) -> Config {
    let path = root.join(Config::FILE_NAME);
    if !path.exists() {
        return Config::default();
    }
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

fn collect_cask_paths(root: &Path, config: &Config) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(OsStr::to_str)
                .is_some_and(|extension| config.is_cask_extension(extension))
        })
        .filter(|entry| {
            let excluded = entry
                .path()
                .file_stem()
                .and_then(OsStr::to_str)
                .is_some_and(|token| config.is_excluded(token));
            if excluded {
                tracing::debug!("Skipping excluded cask {}", entry.path().display());
            }
            !excluded
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}
