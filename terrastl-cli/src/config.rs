/// Run configuration: JSON file plus command-line overrides.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use terrastl_core::{ExportOptions, StlFormat, TerrainConfig, TerrainKind};

/// Everything one `terrastl` run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub terrain: TerrainConfig,
    pub export: ExportOptions,
    /// Destination file
    pub output: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainConfig::default(),
            export: ExportOptions::default(),
            output: PathBuf::from("terrain.stl"),
        }
    }
}

impl RunConfig {
    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        let terrain = &mut self.terrain;
        if let Some(width) = overrides.width {
            terrain.width = width;
        }
        if let Some(height) = overrides.height {
            terrain.height = height;
        }
        if let Some(max_height) = overrides.max_height {
            terrain.max_height = max_height;
        }
        if let Some(kind) = overrides.kind {
            terrain.kind = kind;
        }
        if let Some(scale) = overrides.scale {
            terrain.scale = scale;
        }
        if let Some(cell_size) = overrides.cell_size {
            terrain.cell_size = cell_size;
        }
        if let Some(seed) = overrides.seed {
            terrain.seed = Some(seed);
        }
        if let Some(format) = overrides.format {
            self.export.format = format;
        }
        if let Some(output) = &overrides.output {
            self.output = output.clone();
        }
    }

    /// Random terrain without a seed gets a fresh one, so the run can be
    /// reproduced from the logged value.
    pub fn resolve_seed(&mut self) -> Option<u64> {
        if self.terrain.kind == TerrainKind::Random && self.terrain.seed.is_none() {
            let seed = rand::random();
            self.terrain.seed = Some(seed);
            return Some(seed);
        }
        None
    }
}

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub max_height: Option<f32>,
    pub kind: Option<TerrainKind>,
    pub scale: Option<f32>,
    pub cell_size: Option<f32>,
    pub seed: Option<u64>,
    pub format: Option<StlFormat>,
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.export.format, StlFormat::Ascii);
        assert_eq!(config.output, PathBuf::from("terrain.stl"));
        assert!(config.terrain.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: RunConfig = serde_json::from_str(
            r#"{ "terrain": { "kind": "sine", "max_height": 2.5 }, "export": { "format": "binary" } }"#,
        )
        .unwrap();

        assert_eq!(config.terrain.kind, TerrainKind::Sine);
        assert_eq!(config.terrain.max_height, 2.5);
        assert_eq!(config.terrain.width, 32);
        assert_eq!(config.export.format, StlFormat::Binary);
        assert_eq!(config.output, PathBuf::from("terrain.stl"));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = RunConfig::default();
        config.apply(&Overrides {
            width: Some(5),
            format: Some(StlFormat::Binary),
            output: Some(PathBuf::from("out.stl")),
            ..Overrides::default()
        });

        assert_eq!(config.terrain.width, 5);
        assert_eq!(config.terrain.height, 32);
        assert_eq!(config.export.format, StlFormat::Binary);
        assert_eq!(config.output, PathBuf::from("out.stl"));
    }

    #[test]
    fn test_resolve_seed_only_for_unseeded_random() {
        let mut hill = RunConfig::default();
        assert_eq!(hill.resolve_seed(), None);
        assert_eq!(hill.terrain.seed, None);

        let mut random = RunConfig::default();
        random.terrain.kind = TerrainKind::Random;
        let seed = random.resolve_seed();
        assert!(seed.is_some());
        assert_eq!(random.terrain.seed, seed);
        assert_eq!(random.resolve_seed(), None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RunConfig::load(Path::new("/nonexistent/terrastl.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
