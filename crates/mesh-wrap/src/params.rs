//! Wrap parameters derived from the size of the input.

use mesh_soup::Mesh;
use tracing::debug;

use crate::error::{WrapError, WrapResult};

/// Default divisor of the bounding box diagonal giving `alpha`.
pub const DEFAULT_RELATIVE_ALPHA: f64 = 50.0;

/// Default divisor of the bounding box diagonal giving `offset`.
pub const DEFAULT_RELATIVE_OFFSET: f64 = 600.0;

/// Wrap parameters relative to the bounding box diagonal `D`.
///
/// Larger values give finer wraps: `alpha = D / relative_alpha` and
/// `offset = D / relative_offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeParams {
    pub relative_alpha: f64,
    pub relative_offset: f64,
}

impl Default for RelativeParams {
    fn default() -> Self {
        Self {
            relative_alpha: DEFAULT_RELATIVE_ALPHA,
            relative_offset: DEFAULT_RELATIVE_OFFSET,
        }
    }
}

impl RelativeParams {
    /// Create relative parameters, rejecting non-positive or non-finite factors.
    pub fn new(relative_alpha: f64, relative_offset: f64) -> WrapResult<Self> {
        let params = Self {
            relative_alpha,
            relative_offset,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check that both factors are finite and strictly positive.
    pub fn validate(&self) -> WrapResult<()> {
        check_positive("relative_alpha", self.relative_alpha)?;
        check_positive("relative_offset", self.relative_offset)
    }
}

/// Absolute wrap parameters in the units of the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapParams {
    /// Feature size: cavities and gaps much narrower than this are closed over.
    pub alpha: f64,
    /// Distance between the wrap surface and the input.
    pub offset: f64,
}

impl WrapParams {
    /// Create absolute parameters, rejecting non-positive or non-finite values.
    pub fn new(alpha: f64, offset: f64) -> WrapResult<Self> {
        check_positive("alpha", alpha)?;
        check_positive("offset", offset)?;
        Ok(Self { alpha, offset })
    }

    /// Derive absolute parameters from the bounding box diagonal of `mesh`.
    ///
    /// Fails with [`WrapError::DegenerateBounds`] when the diagonal is zero
    /// (no vertices, or all vertices coincident).
    pub fn from_mesh(mesh: &Mesh, relative: &RelativeParams) -> WrapResult<Self> {
        relative.validate()?;

        let diagonal = mesh.diagonal_length();
        if diagonal <= 0.0 || !diagonal.is_finite() {
            return Err(WrapError::DegenerateBounds);
        }

        let params = Self::new(
            diagonal / relative.relative_alpha,
            diagonal / relative.relative_offset,
        )?;
        debug!(
            "Wrap parameters: diagonal={:.6}, alpha={:.6}, offset={:.6}",
            diagonal, params.alpha, params.offset
        );

        Ok(params)
    }
}

fn check_positive(name: &'static str, value: f64) -> WrapResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(WrapError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_soup::Vertex;

    fn segment_mesh(length: f64) -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(length, 0.0, 0.0));
        mesh
    }

    #[test]
    fn test_default_relative_params() {
        let params = RelativeParams::default();
        assert_eq!(params.relative_alpha, 50.0);
        assert_eq!(params.relative_offset, 600.0);
    }

    #[test]
    fn test_from_mesh_scales_with_diagonal() {
        let params = WrapParams::from_mesh(&segment_mesh(10.0), &RelativeParams::default()).unwrap();
        assert_relative_eq!(params.alpha, 0.2);
        assert_relative_eq!(params.offset, 10.0 / 600.0);
        assert_relative_eq!(params.offset, 0.016667, epsilon = 1e-6);
    }

    #[test]
    fn test_diagonal_of_box() {
        let mut mesh = segment_mesh(0.0);
        mesh.vertices.push(Vertex::from_coords(3.0, 4.0, 12.0));
        let params = WrapParams::from_mesh(&mesh, &RelativeParams::new(13.0, 26.0).unwrap()).unwrap();
        assert_relative_eq!(params.alpha, 1.0);
        assert_relative_eq!(params.offset, 0.5);
    }

    #[test]
    fn test_zero_diagonal_is_degenerate() {
        let err = WrapParams::from_mesh(&segment_mesh(0.0), &RelativeParams::default()).unwrap_err();
        assert!(matches!(err, WrapError::DegenerateBounds));

        let err = WrapParams::from_mesh(&Mesh::new(), &RelativeParams::default()).unwrap_err();
        assert!(matches!(err, WrapError::DegenerateBounds));
    }

    #[test]
    fn test_invalid_factors_are_rejected() {
        for (ra, ro) in [(0.0, 600.0), (-50.0, 600.0), (50.0, 0.0), (f64::NAN, 600.0), (50.0, f64::INFINITY)] {
            assert!(matches!(
                RelativeParams::new(ra, ro),
                Err(WrapError::InvalidParameter { .. })
            ));
        }

        let relative = RelativeParams {
            relative_alpha: -1.0,
            relative_offset: 600.0,
        };
        let err = WrapParams::from_mesh(&segment_mesh(10.0), &relative).unwrap_err();
        assert!(matches!(
            err,
            WrapError::InvalidParameter { name: "relative_alpha", .. }
        ));
    }
}
