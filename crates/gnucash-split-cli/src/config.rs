use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOutput {
    pub compress: Option<bool>,
    /// Relative to the directory of the config file.
    pub statement_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigWindow {
    pub end_year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output: ConfigOutput,
    #[serde(default)]
    pub window: ConfigWindow,
    /// Extra or replaced namespace aliases, `alias = "uri"`.
    #[serde(default)]
    pub namespaces: BTreeMap<String, String>,
}

/// Looked up in the working directory when no config file is named.
const CONFIG_FILES: [&str; 2] = ["gnucash-split.toml", ".gnucash-split.toml"];

impl Config {
    /// Read `path`; relative paths inside it are resolved against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let base_dir = path.parent().unwrap_or(Path::new(""));
        if let Some(dir) = config.output.statement_dir.as_mut() {
            *dir = base_dir.join(&*dir);
        }
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// The first of [`CONFIG_FILES`] present in `dir`, if any.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .map(|path| Self::load(&path))
            .transpose()
    }
}
