/// Node transforms and the Y-up to Z-up axis correction
use nalgebra::{Matrix4, Point3, Vector3};

/// Euler rotation around three axes (in radians), applied X, then Y, then Z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerAngles {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

impl Default for EulerAngles {
    fn default() -> Self {
        Self::zero()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation of -90 degrees about X, with exact entries.
    ///
    /// Maps the renderer's Y-up frame onto STL's Z-up frame:
    /// `(x, y, z) -> (x, z, -y)`.
    #[rustfmt::skip]
    pub fn axis_correction() -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, -1.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Create a rotation matrix from Euler angles
    pub fn rotation_matrix(rotation: &EulerAngles) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        // Apply rotations in order: X, Y, Z
        rz * ry * rx
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Local matrix from translation, rotation and scale (`T * R * S`)
    pub fn compose(
        translation: &Vector3<f32>,
        rotation: &EulerAngles,
        scale: &Vector3<f32>,
    ) -> Matrix4<f32> {
        Self::translation_matrix(translation.x, translation.y, translation.z)
            * Self::rotation_matrix(rotation)
            * Self::scale_matrix(scale.x, scale.y, scale.z)
    }

    pub fn apply(matrix: &Matrix4<f32>, point: &Point3<f32>) -> Point3<f32> {
        matrix.transform_point(point)
    }
}
