use std::path::Path;

use serde::Deserialize;

/// Configuration for a directory of casks.
///
/// Read from `.cask-audit.toml` in the directory root. Every field is
/// optional; a missing file means the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Versions")]
pub struct Config {
    /// File extensions (without the dot) that are treated as cask sources.
    extensions: Vec<String>,

    /// Whether files that cannot be parsed as casks are skipped instead of
    /// failing the whole run.
    pub allow_unparseable: bool,

    /// Cask tokens (file stems) that are never audited.
    exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            allow_unparseable: false,
            exclude: Vec::new(),
        }
    }
}

impl Config {
    /// The conventional file name of the configuration.
    pub const FILE_NAME: &'static str = ".cask-audit.toml";

    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// The extensions of files treated as cask sources.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// The excluded cask tokens.
    #[must_use]
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Whether a file with this extension is a cask source.
    #[must_use]
    pub fn is_cask_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }

    /// Whether the cask with this token is excluded from auditing.
    #[must_use]
    pub fn is_excluded(&self, token: &str) -> bool {
        self.exclude.iter().any(|t| t == token)
    }
}

fn default_extensions() -> Vec<String> {
    vec!["rb".to_string()]
}

/// The on-disk versions of the configuration, tagged with `_version`.
#[derive(Debug, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_extensions")]
        extensions: Vec<String>,

        #[serde(default)]
        allow_unparseable: bool,

        #[serde(default)]
        exclude: Vec<String>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                extensions,
                allow_unparseable,
                exclude,
            } => Self {
                extensions,
                allow_unparseable,
                exclude,
            },
        }
    }
}
