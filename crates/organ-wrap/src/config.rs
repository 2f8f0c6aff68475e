//! Batch configuration.
//!
//! Settings come from built-in defaults, optionally overridden by a TOML
//! file, then by command-line flags.
//!
//! ```toml
//! relative_alpha = 50.0
//! relative_offset = 600.0
//! extension = "off"
//! max_cells = 16777216
//!
//! [fallback]
//! from = "/data/hra/body"
//! to = "/data/hra/plain"
//! ```

use std::path::{Path, PathBuf};

use mesh_soup::MeshFormat;
use mesh_wrap::offset::DEFAULT_MAX_CELLS;
use mesh_wrap::{RelativeParams, DEFAULT_RELATIVE_ALPHA, DEFAULT_RELATIVE_OFFSET};
use serde::{Deserialize, Serialize};

use crate::error::{BatchError, BatchResult};

/// Maps a structure path to its fallback counterpart by swapping a leading
/// directory prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackMapping {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl FallbackMapping {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// The counterpart path for `path`, or `None` when `path` does not start
    /// with the `from` prefix.
    ///
    /// Relative and absolute spellings are compared against the current
    /// directory, so `body/kidney` matches a `from` of `/data/body` when run
    /// from `/data`.
    pub fn map(&self, path: &Path) -> Option<PathBuf> {
        if let Ok(rest) = path.strip_prefix(&self.from) {
            return Some(self.to.join(rest));
        }

        let path = std::path::absolute(path).ok()?;
        let from = std::path::absolute(&self.from).ok()?;
        path.strip_prefix(&from).ok().map(|rest| self.to.join(rest))
    }
}

/// Settings shared by the batch modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Divisor of the bounding box diagonal giving the wrap's alpha.
    pub relative_alpha: f64,

    /// Divisor of the bounding box diagonal giving the wrap's offset.
    pub relative_offset: f64,

    /// Extension (and format) of the written meshes.
    pub extension: String,

    /// Cell budget of the offset wrapper.
    pub max_cells: usize,

    /// Optional replacement lookup for structures that are not watertight.
    pub fallback: Option<FallbackMapping>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            relative_alpha: DEFAULT_RELATIVE_ALPHA,
            relative_offset: DEFAULT_RELATIVE_OFFSET,
            extension: "off".to_string(),
            max_cells: DEFAULT_MAX_CELLS,
            fallback: None,
        }
    }
}

impl BatchConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> BatchResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BatchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| BatchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Relative wrap parameters, validated.
    pub fn relative_params(&self) -> BatchResult<RelativeParams> {
        Ok(RelativeParams::new(self.relative_alpha, self.relative_offset)?)
    }

    /// Output mesh format, validated.
    pub fn output_format(&self) -> BatchResult<MeshFormat> {
        MeshFormat::from_extension(self.extension.trim_start_matches('.'))
            .ok_or_else(|| BatchError::UnsupportedExtension(self.extension.clone()))
    }

    /// Check every setting without running anything.
    pub fn validate(&self) -> BatchResult<()> {
        self.relative_params()?;
        self.output_format()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.relative_alpha, 50.0);
        assert_eq!(config.relative_offset, 600.0);
        assert_eq!(config.extension, "off");
        assert!(config.fallback.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BatchConfig::from_toml("relative_alpha = 20.0\n").unwrap();
        assert_eq!(config.relative_alpha, 20.0);
        assert_eq!(config.relative_offset, 600.0);
        assert_eq!(config.extension, "off");
    }

    #[test]
    fn test_fallback_section() {
        let config = BatchConfig::from_toml(
            r#"
            extension = "stl"

            [fallback]
            from = "/data/body"
            to = "/data/plain"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_format().unwrap(), MeshFormat::Stl);
        let fallback = config.fallback.unwrap();
        assert_eq!(
            fallback.map(Path::new("/data/body/kidney/cortex.off")),
            Some(PathBuf::from("/data/plain/kidney/cortex.off"))
        );
        assert_eq!(fallback.map(Path::new("/elsewhere/kidney/cortex.off")), None);
    }

    #[test]
    fn test_fallback_matches_relative_and_absolute_spellings() {
        let cwd = std::env::current_dir().unwrap();
        let expected = Some(PathBuf::from("/data/plain/kidney/cortex.off"));

        let absolute_from = FallbackMapping::new(cwd.join("body"), "/data/plain");
        assert_eq!(absolute_from.map(Path::new("body/kidney/cortex.off")), expected);
        assert_eq!(absolute_from.map(Path::new("./body/kidney/cortex.off")), expected);

        let relative_from = FallbackMapping::new("body", "/data/plain");
        assert_eq!(relative_from.map(&cwd.join("body/kidney/cortex.off")), expected);
        assert_eq!(relative_from.map(Path::new("other/kidney/cortex.off")), None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(BatchConfig::from_toml("relative_alfa = 20.0\n").is_err());
    }

    #[test]
    fn test_invalid_settings() {
        let config = BatchConfig {
            relative_offset: 0.0,
            ..BatchConfig::default()
        };
        assert!(matches!(config.validate(), Err(BatchError::Parameters(_))));

        let config = BatchConfig {
            extension: "ply".to_string(),
            ..BatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BatchError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = BatchConfig {
            fallback: Some(FallbackMapping::new("a", "b")),
            ..BatchConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(BatchConfig::from_toml(&text).unwrap(), config);
    }
}
