//! Merge configuration file (JSON)
//!
//! Names where the latest table comes from and, optionally, the published
//! table to read and where to write the merged result. Nothing here changes
//! how rows are matched or merged.

use crate::error::{Error, Result};
use crate::source::LatestSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Producer of the latest table
    pub latest: LatestSource,
    /// Published table to read; stdin when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing: Option<PathBuf>,
    /// Where to write the merged table; stdout when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl MergeConfig {
    /// Create a config reading the latest table from `latest`
    pub fn new(latest: LatestSource) -> Self {
        Self {
            latest,
            existing: None,
            output: None,
        }
    }

    /// Template written by `create-config`
    pub fn template() -> Self {
        Self {
            latest: LatestSource::Command {
                program: "xslt3".to_string(),
                args: vec![
                    "-xsl:src/supported.xsl".to_string(),
                    "-s:src/schema.xsd".to_string(),
                ],
                cwd: Some(PathBuf::from(".")),
            },
            existing: Some(PathBuf::from("doc/supported.md")),
            output: None,
        }
    }

    /// Load a config file. Relative paths inside it are taken relative to
    /// the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: MergeConfig =
            serde_json::from_str(&content).map_err(|e| Error::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if let Some(base) = path.parent() {
            config.resolve_against(base);
        }
        Ok(config)
    }

    /// Save the config to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn resolve_against(&mut self, base: &Path) {
        self.latest.resolve_against(base);
        for path in [&mut self.existing, &mut self.output].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merge.json");

        let config = MergeConfig {
            latest: LatestSource::file(dir.path().join("latest.md")),
            existing: Some(dir.path().join("supported.md")),
            output: None,
        };
        config.save(&path).unwrap();

        let loaded = MergeConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_relative_paths_follow_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merge.json");
        fs::write(
            &path,
            r#"{"latest": {"type": "file", "path": "build/latest.md"}, "output": "out.md"}"#,
        )
        .unwrap();

        let loaded = MergeConfig::load(&path).unwrap();
        assert_eq!(
            loaded.latest,
            LatestSource::file(dir.path().join("build/latest.md"))
        );
        assert_eq!(loaded.output, Some(dir.path().join("out.md")));
        assert_eq!(loaded.existing, None);
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merge.json");
        fs::write(&path, r#"{"latest": {"type": "ftp"}}"#).unwrap();

        let err = MergeConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_template_is_command() {
        let template = MergeConfig::template();
        assert!(matches!(template.latest, LatestSource::Command { .. }));
        assert_eq!(template.existing, Some(PathBuf::from("doc/supported.md")));
    }
}
