/// Synthetic height-fields and their conversion to a renderable mesh.
///
/// Every kind is a closed-form per-cell formula. With `x` the column, `y`
/// the row, `(cx, cy)` the grid centre and `d` the distance to the centre
/// divided by the centre-to-corner distance:
///
/// | kind   | elevation                                      |
/// |--------|------------------------------------------------|
/// | flat   | `0`                                            |
/// | random | uniform in `[0, M]`                            |
/// | sine   | `M * (1 + sin(2πx/(W-1)) * cos(2πy/(H-1))) / 2` |
/// | hill   | `M * (1 - d)`                                  |
/// | valley | `M * d`                                        |
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use nalgebra::Point3;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::MeshData;
use crate::scene::SceneNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    Flat,
    Random,
    Sine,
    #[default]
    Hill,
    Valley,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 5] = [
        TerrainKind::Flat,
        TerrainKind::Random,
        TerrainKind::Sine,
        TerrainKind::Hill,
        TerrainKind::Valley,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TerrainKind::Flat => "flat",
            TerrainKind::Random => "random",
            TerrainKind::Sine => "sine",
            TerrainKind::Hill => "hill",
            TerrainKind::Valley => "valley",
        }
    }
}

impl fmt::Display for TerrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TerrainKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(TerrainKind::Flat),
            "random" => Ok(TerrainKind::Random),
            "sine" => Ok(TerrainKind::Sine),
            "hill" | "radial-hill" => Ok(TerrainKind::Hill),
            "valley" | "radial-valley" => Ok(TerrainKind::Valley),
            other => Err(Error::InvalidConfig(format!(
                "unknown terrain kind `{}` (expected flat, random, sine, hill or valley)",
                other
            ))),
        }
    }
}

/// Terrain generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Columns, at least 2
    pub width: usize,
    /// Rows, at least 2
    pub height: usize,
    /// Upper bound of the generated elevations
    pub max_height: f32,
    pub kind: TerrainKind,
    /// Multiplier applied to elevations when building the mesh
    pub scale: f32,
    /// Spacing between neighbouring grid vertices
    pub cell_size: f32,
    /// Seed for the random kind; 0 when unset
    pub seed: Option<u64>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            max_height: 5.0,
            kind: TerrainKind::Hill,
            scale: 1.0,
            cell_size: 1.0,
            seed: None,
        }
    }
}

impl TerrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width < 2 || self.height < 2 {
            return Err(Error::InvalidConfig(format!(
                "grid must be at least 2x2, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.max_height.is_finite() && self.max_height > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max height must be positive, got {}",
                self.max_height
            )));
        }
        if !self.scale.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "scale must be finite, got {}",
                self.scale
            )));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "cell size must be positive, got {}",
                self.cell_size
            )));
        }
        Ok(())
    }
}

/// A `height x width` grid of elevations, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    width: usize,
    height: usize,
    elevations: Vec<f32>,
}

impl HeightField {
    /// Generates the field described by `config`.
    pub fn generate(config: &TerrainConfig) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or(0));
        Self::generate_with_rng(config, &mut rng)
    }

    /// Like [`HeightField::generate`] but draws random elevations from `rng`.
    pub fn generate_with_rng<R: Rng>(config: &TerrainConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let (w, h, m) = (config.width, config.height, config.max_height);
        let cx = (w - 1) as f32 / 2.0;
        let cy = (h - 1) as f32 / 2.0;
        let radius = cx.hypot(cy);

        let mut elevations = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                let (xf, yf) = (x as f32, y as f32);
                let d = (xf - cx).hypot(yf - cy) / radius;

                let elevation = match config.kind {
                    TerrainKind::Flat => 0.0,
                    TerrainKind::Random => rng.gen_range(0.0..=m),
                    TerrainKind::Sine => {
                        let wave_x = (TAU * xf / (w - 1) as f32).sin();
                        let wave_y = (TAU * yf / (h - 1) as f32).cos();
                        m * (1.0 + wave_x * wave_y) / 2.0
                    }
                    TerrainKind::Hill => m * (1.0 - d),
                    TerrainKind::Valley => m * d,
                };
                elevations.push(elevation);
            }
        }

        debug!(kind = %config.kind, width = w, height = h, "generated height field");

        Ok(Self {
            width: w,
            height: h,
            elevations,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Elevation at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.elevations[y * self.width + x])
        } else {
            None
        }
    }

    pub fn elevations(&self) -> &[f32] {
        &self.elevations
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.elevations.chunks(self.width)
    }

    /// Planar grid mesh in XZ centred on the origin, `y = elevation * scale`.
    ///
    /// Each cell is split into two triangles wound so a flat field faces +Y.
    pub fn to_mesh(&self, scale: f32, cell_size: f32) -> MeshData {
        let (w, h) = (self.width, self.height);
        let half_w = (w - 1) as f32 * cell_size / 2.0;
        let half_h = (h - 1) as f32 * cell_size / 2.0;

        let mut positions = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                positions.push(Point3::new(
                    x as f32 * cell_size - half_w,
                    self.elevations[y * w + x] * scale,
                    y as f32 * cell_size - half_h,
                ));
            }
        }

        let mut indices = Vec::with_capacity((w - 1) * (h - 1) * 6);
        for y in 0..h - 1 {
            for x in 0..w - 1 {
                let a = (x + w * y) as u32;
                let b = (x + w * (y + 1)) as u32;
                let c = (x + 1 + w * (y + 1)) as u32;
                let d = (x + 1 + w * y) as u32;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        MeshData::indexed(positions, indices)
    }
}

/// Scene with a single terrain mesh under a root group
pub fn terrain_scene(config: &TerrainConfig) -> Result<SceneNode> {
    let field = HeightField::generate(config)?;
    let mesh = field.to_mesh(config.scale, config.cell_size);
    Ok(SceneNode::group("scene").with_child(SceneNode::mesh("terrain", mesh)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn config(kind: TerrainKind) -> TerrainConfig {
        TerrainConfig {
            width: 4,
            height: 4,
            max_height: 5.0,
            kind,
            ..TerrainConfig::default()
        }
    }

    #[test]
    fn test_validate() {
        assert!(TerrainConfig::default().validate().is_ok());

        let narrow = TerrainConfig {
            width: 1,
            ..TerrainConfig::default()
        };
        assert!(matches!(narrow.validate(), Err(Error::InvalidConfig(_))));

        let flat_max = TerrainConfig {
            max_height: 0.0,
            ..TerrainConfig::default()
        };
        assert!(flat_max.validate().is_err());

        let bad_cell = TerrainConfig {
            cell_size: f32::NAN,
            ..TerrainConfig::default()
        };
        assert!(bad_cell.validate().is_err());
    }

    #[test]
    fn test_kind_from_str() {
        for kind in TerrainKind::ALL {
            assert_eq!(kind.as_str().parse::<TerrainKind>().unwrap(), kind);
        }
        assert_eq!("Radial-Hill".parse::<TerrainKind>().unwrap(), TerrainKind::Hill);
        assert!("mountain".parse::<TerrainKind>().is_err());
    }

    #[test]
    fn test_random_is_bounded_and_seeded() {
        let cfg = TerrainConfig {
            seed: Some(42),
            ..config(TerrainKind::Random)
        };
        let a = HeightField::generate(&cfg).unwrap();
        let b = HeightField::generate(&cfg).unwrap();

        assert_eq!(a, b);
        assert!(a.elevations().iter().all(|&e| (0.0..=5.0).contains(&e)));
    }

    #[test]
    fn test_sine_range() {
        let field = HeightField::generate(&config(TerrainKind::Sine)).unwrap();
        for &e in field.elevations() {
            assert!((-1e-5..=5.0 + 1e-5).contains(&e));
        }
        // sin(0) = 0 at the first column
        assert_relative_eq!(field.get(0, 0).unwrap(), 2.5);
    }

    #[test]
    fn test_valley_mirrors_hill() {
        let hill = HeightField::generate(&config(TerrainKind::Hill)).unwrap();
        let valley = HeightField::generate(&config(TerrainKind::Valley)).unwrap();

        for (h, v) in hill.elevations().iter().zip(valley.elevations()) {
            assert_relative_eq!(h + v, 5.0, epsilon = 1e-5);
        }
        // corners sit at the full radius
        assert_relative_eq!(hill.get(0, 0).unwrap(), 0.0, epsilon = 1e-5);
        assert_relative_eq!(valley.get(3, 3).unwrap(), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let field = HeightField::generate(&config(TerrainKind::Flat)).unwrap();
        assert_eq!(field.get(4, 0), None);
        assert_eq!(field.get(0, 4), None);
        assert_eq!(field.rows().count(), 4);
    }

    #[test]
    fn test_mesh_shape() {
        let cfg = TerrainConfig {
            width: 3,
            height: 2,
            ..config(TerrainKind::Flat)
        };
        let field = HeightField::generate(&cfg).unwrap();
        let mesh = field.to_mesh(1.0, 2.0);

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.validate(), Ok(4));
        assert_eq!(mesh.positions[0], Point3::new(-2.0, 0.0, -1.0));
        assert_eq!(mesh.positions[5], Point3::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn test_flat_mesh_faces_up() {
        let field = HeightField::generate(&config(TerrainKind::Flat)).unwrap();
        let mesh = field.to_mesh(1.0, 1.0);

        for t in 0..mesh.validate().unwrap() {
            let [a, b, c] = mesh.triangle_indices(t);
            let triangle = Triangle::new(mesh.positions[a], mesh.positions[b], mesh.positions[c]);
            assert_relative_eq!(triangle.face_normal(), Vector3::new(0.0, 1.0, 0.0));
        }
    }

    #[test]
    fn test_scale_applies_to_elevation() {
        let field = HeightField::generate(&config(TerrainKind::Valley)).unwrap();
        let mesh = field.to_mesh(2.0, 1.0);
        assert_relative_eq!(mesh.positions[0].y, 10.0, epsilon = 1e-5);
    }

    #[test]
    fn test_terrain_scene() {
        let scene = terrain_scene(&config(TerrainKind::Hill)).unwrap();
        assert_eq!(scene.name, "scene");
        assert_eq!(scene.children.len(), 1);
        let mesh = scene.children[0].kind.geometry().unwrap();
        assert_eq!(mesh.triangle_count(), Ok(18));
    }
}
