/// Terrastl command-line front end
///
/// Builds a terrain scene from a [`RunConfig`], exports it through the core
/// exporter and saves the result.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use nalgebra::Point3;
use terrastl_core::stl::parse_stl;
use terrastl_core::{terrain_scene, Error, StlExporter, StlFormat};
use tracing::{info, warn};

pub mod args;
pub mod config;
pub mod report;
pub mod save;

pub use args::{parse_args, Command};
pub use config::{Overrides, RunConfig};

/// What a run produced
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Saved {
        path: PathBuf,
        format: StlFormat,
        triangles: usize,
        bytes: usize,
    },
    /// The scene had no triangles; nothing was written.
    Empty,
}

pub fn run(config: &RunConfig) -> anyhow::Result<RunOutcome> {
    let scene = terrain_scene(&config.terrain).context("failed to build terrain")?;
    let export = StlExporter::new(config.export)
        .export(&scene)
        .context("failed to export STL")?;

    let export = match export.require_triangles() {
        Ok(export) => export,
        Err(Error::EmptyExportTarget) => {
            warn!("scene has no triangles, skipping {}", config.output.display());
            return Ok(RunOutcome::Empty);
        }
        Err(e) => return Err(e.into()),
    };

    save::save_stl(&config.output, &export.buffer)
        .with_context(|| format!("failed to save {}", config.output.display()))?;

    info!(
        path = %config.output.display(),
        triangles = export.triangle_count,
        bytes = export.buffer.len(),
        "saved terrain"
    );

    Ok(RunOutcome::Saved {
        path: config.output.clone(),
        format: export.buffer.format(),
        triangles: export.triangle_count,
        bytes: export.buffer.len(),
    })
}

/// Summary of an STL file on disk
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub path: PathBuf,
    pub name: Option<String>,
    pub facets: usize,
    /// Axis-aligned bounds, `None` for an empty file
    pub bounds: Option<(Point3<f32>, Point3<f32>)>,
}

pub fn inspect(path: &Path) -> anyhow::Result<Inspection> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let solid = parse_stl(&data).with_context(|| format!("failed to parse {}", path.display()))?;

    let bounds = solid
        .facets
        .iter()
        .flat_map(|f| f.vertices)
        .fold(None, |acc: Option<(Point3<f32>, Point3<f32>)>, v| match acc {
            None => Some((v, v)),
            Some((min, max)) => Some((min.inf(&v), max.sup(&v))),
        });

    Ok(Inspection {
        path: path.to_path_buf(),
        name: solid.name.clone(),
        facets: solid.len(),
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrastl_core::{ExportOptions, TerrainConfig, TerrainKind};

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("terrastl_run_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_run_then_inspect() {
        let output = temp_file("hill.stl");
        let config = RunConfig {
            terrain: TerrainConfig {
                width: 5,
                height: 4,
                kind: TerrainKind::Hill,
                ..TerrainConfig::default()
            },
            export: ExportOptions::binary(),
            output: output.clone(),
        };

        let outcome = run(&config).unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Saved {
                path: output.clone(),
                format: StlFormat::Binary,
                triangles: 24,
                bytes: 84 + 50 * 24,
            }
        );

        let inspection = inspect(&output).unwrap();
        assert_eq!(inspection.facets, 24);
        assert_eq!(inspection.name, None);
        let (min, max) = inspection.bounds.unwrap();
        assert_eq!((min.x, max.x), (-2.0, 2.0));
        // elevations run along -Z after the axis correction
        assert!(min.z < 0.0 && max.z <= 0.0);

        std::fs::remove_file(output).unwrap();
    }

    #[test]
    fn test_run_ascii_is_named() {
        let output = temp_file("flat.stl");
        let config = RunConfig {
            terrain: TerrainConfig {
                width: 2,
                height: 2,
                kind: TerrainKind::Flat,
                ..TerrainConfig::default()
            },
            export: ExportOptions::ascii(),
            output: output.clone(),
        };

        run(&config).unwrap();
        let inspection = inspect(&output).unwrap();
        assert_eq!(inspection.name.as_deref(), Some("exported"));
        assert_eq!(inspection.facets, 2);

        std::fs::remove_file(output).unwrap();
    }

    #[test]
    fn test_invalid_terrain_writes_nothing() {
        let output = temp_file("invalid.stl");
        let mut config = RunConfig::default();
        config.terrain.max_height = -1.0;
        config.output = output.clone();

        let err = run(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("max height must be positive"));
        assert!(!output.exists());
    }

    #[test]
    fn test_inspect_missing_file() {
        assert!(inspect(Path::new("/nonexistent/terrain.stl")).is_err());
    }
}
