//! Math type re-exports and FBX-specific transform helpers.
//!
//! FBX stores every transform component in double precision, so this module
//! re-exports the `glam` double types and adds Euler composition for the six
//! FBX rotation orders.

pub use glam::{DMat3, DMat4, DQuat, DVec2, DVec3, DVec4};

/// Euler rotation order as stored in the `RotationOrder` enum property.
///
/// The name lists the axes in application order: `Xyz` rotates about X first,
/// then Y, then Z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RotationOrder {
    #[default]
    Xyz = 0,
    Xzy = 1,
    Yzx = 2,
    Yxz = 3,
    Zxy = 4,
    Zyx = 5,
    /// Spheric XYZ, evaluated like `Xyz`.
    SphericXyz = 6,
}

impl RotationOrder {
    /// Convert from the raw enum property value. Unknown values map to `Xyz`.
    pub const fn from_i32(v: i32) -> Self {
        match v {
            1 => Self::Xzy,
            2 => Self::Yzx,
            3 => Self::Yxz,
            4 => Self::Zxy,
            5 => Self::Zyx,
            6 => Self::SphericXyz,
            _ => Self::Xyz,
        }
    }

    /// Axes in application order (0 = X, 1 = Y, 2 = Z).
    const fn axes(self) -> [usize; 3] {
        match self {
            Self::Xyz | Self::SphericXyz => [0, 1, 2],
            Self::Xzy => [0, 2, 1],
            Self::Yzx => [1, 2, 0],
            Self::Yxz => [1, 0, 2],
            Self::Zxy => [2, 0, 1],
            Self::Zyx => [2, 1, 0],
        }
    }
}

/// Rotation matrix from Euler angles in degrees.
///
/// The first axis of `order` is applied first, so for `Xyz` the result is
/// `Rz * Ry * Rx` in column-vector convention.
pub fn euler_to_matrix(degrees: DVec3, order: RotationOrder) -> DMat4 {
    let radians = [
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    ];

    order.axes().iter().fold(DMat4::IDENTITY, |acc, &axis| {
        let r = match axis {
            0 => DMat4::from_rotation_x(radians[0]),
            1 => DMat4::from_rotation_y(radians[1]),
            _ => DMat4::from_rotation_z(radians[2]),
        };
        r * acc
    })
}

/// Decode a 4x4 matrix from 16 doubles (FBX order, column by column).
///
/// Returns `None` when fewer than 16 values are present.
pub fn matrix_from_slice(values: &[f64]) -> Option<DMat4> {
    let cols: &[f64; 16] = values.get(..16)?.try_into().ok()?;
    Some(DMat4::from_cols_array(cols))
}

/// Encode a 4x4 matrix as 16 doubles (FBX order, column by column).
#[inline]
pub fn matrix_to_vec(m: &DMat4) -> Vec<f64> {
    m.to_cols_array().to_vec()
}

/// Approximate matrix equality with an absolute tolerance.
pub fn matrix_approx_eq(a: &DMat4, b: &DMat4, eps: f64) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| (x - y).abs() <= eps)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_euler_single_axis() {
        let m = euler_to_matrix(DVec3::new(0.0, 0.0, 90.0), RotationOrder::Xyz);
        let p = m.transform_point3(DVec3::X);
        assert!((p - DVec3::Y).length() < EPS);
    }

    #[test]
    fn test_euler_order_matters() {
        let angles = DVec3::new(90.0, 90.0, 0.0);
        let xyz = euler_to_matrix(angles, RotationOrder::Xyz);
        let yxz = euler_to_matrix(angles, RotationOrder::Yxz);
        assert!(!matrix_approx_eq(&xyz, &yxz, EPS));

        // Xyz applies X first: Ry * Rx
        let expected = DMat4::from_rotation_y(90f64.to_radians()) * DMat4::from_rotation_x(90f64.to_radians());
        assert!(matrix_approx_eq(&xyz, &expected, EPS));
    }

    #[test]
    fn test_rotation_order_from_i32() {
        assert_eq!(RotationOrder::from_i32(0), RotationOrder::Xyz);
        assert_eq!(RotationOrder::from_i32(5), RotationOrder::Zyx);
        assert_eq!(RotationOrder::from_i32(42), RotationOrder::Xyz);
    }

    #[test]
    fn test_matrix_slice_codec() {
        let m = DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0));
        let v = matrix_to_vec(&m);
        assert_eq!(v.len(), 16);
        assert_eq!(matrix_from_slice(&v), Some(m));
        assert_eq!(matrix_from_slice(&v[..15]), None);
    }
}
