//! Finite-difference stencil coefficients for the curl operator.
//!
//! Implements the Cole-Karkkainen-Cowan (CKC) coefficients of
//! Cowan et al., PRST-AB 16, 041303 (2013), and the plain Yee stencil as the
//! degenerate case with no transverse smoothing.

use pic_math::Axis;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GridError, Result};
use crate::geometry::Dimensionality;

/// Which stencil the field advance uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Yee,
    Ckc,
}

/// Coefficients of the derivative along one axis.
///
/// `beta[0]` weights the diagonal neighbours along the first of the two
/// other axes in cyclic order (`Axis::others`), `beta[1]` the second.
/// `gamma` already carries the inverse spacing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisStencil {
    pub inv_d: f64,
    pub alpha: f64,
    pub beta: [f64; 2],
    pub gamma: f64,
}

impl AxisStencil {
    /// Sum of all weights applied to a unit-slope field: alpha + 2β₁ + 2β₂ + 4γ.
    ///
    /// Equals `inv_d` for every consistent stencil.
    pub fn weight_sum(&self) -> f64 {
        self.alpha + 2.0 * self.beta[0] + 2.0 * self.beta[1] + 4.0 * self.gamma
    }
}

/// Stencil coefficients for all three axes. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilCoefficients {
    pub dim: Dimensionality,
    pub kind: SolverKind,
    axes: [AxisStencil; 3],
}

impl StencilCoefficients {
    /// Build the coefficients of `kind` for the given cell size.
    pub fn new(kind: SolverKind, dim: Dimensionality, spacing: [f64; 3]) -> Result<Self> {
        match kind {
            SolverKind::Yee => Self::yee(dim, spacing),
            SolverKind::Ckc => Self::ckc(dim, spacing),
        }
    }

    /// Plain two-point stencil: alpha = 1/d, no diagonal terms.
    pub fn yee(dim: Dimensionality, spacing: [f64; 3]) -> Result<Self> {
        let inv = inverse_spacing(dim, spacing)?;
        let mut axes = [AxisStencil::default(); 3];
        for axis in dim.active_axes() {
            let a = axis.index();
            axes[a] = AxisStencil {
                inv_d: inv[a],
                alpha: inv[a],
                ..AxisStencil::default()
            };
        }
        debug!(?dim, ?spacing, "built Yee stencil");
        Ok(Self {
            dim,
            kind: SolverKind::Yee,
            axes,
        })
    }

    /// Cole-Karkkainen-Cowan coefficients.
    ///
    /// In 3D the transverse weights are tuned so the scheme is
    /// dispersion-free along the axis with the finest spacing. On an XZ grid
    /// beta is fixed at 1/8 and gamma vanishes.
    pub fn ckc(dim: Dimensionality, spacing: [f64; 3]) -> Result<Self> {
        let inv = inverse_spacing(dim, spacing)?;
        let mut axes = [AxisStencil::default(); 3];

        match dim {
            Dimensionality::ThreeD => {
                let delta = inv[0].max(inv[1]).max(inv[2]);
                let r = [
                    (inv[0] / delta).powi(2),
                    (inv[1] / delta).powi(2),
                    (inv[2] / delta).powi(2),
                ];
                let r_fac = ratio_denominator(r);
                let beta = 0.125 * (1.0 - r[0] * r[1] * r[2] / r_fac);

                for axis in Axis::ALL {
                    let a = axis.index();
                    let (b, c) = axis.others();
                    let (rb, rc) = (r[b.index()], r[c.index()]);
                    let gamma = rb * rc * (0.0625 - 0.125 * rb * rc / r_fac);
                    axes[a] = AxisStencil {
                        inv_d: inv[a],
                        alpha: (1.0 - 2.0 * rb * beta - 2.0 * rc * beta - 4.0 * gamma) * inv[a],
                        beta: [rb * beta * inv[a], rc * beta * inv[a]],
                        gamma: gamma * inv[a],
                    };
                }
            }
            Dimensionality::Xz => {
                let (x, z) = (Axis::X.index(), Axis::Z.index());
                let delta = inv[x].max(inv[z]);
                let rx = (inv[x] / delta).powi(2);
                let rz = (inv[z] / delta).powi(2);
                let beta = 0.125;

                // x sees (y, z), z sees (x, y): only the z and x diagonals survive
                axes[x] = AxisStencil {
                    inv_d: inv[x],
                    alpha: (1.0 - 2.0 * rz * beta) * inv[x],
                    beta: [0.0, beta * rz * inv[x]],
                    gamma: 0.0,
                };
                axes[z] = AxisStencil {
                    inv_d: inv[z],
                    alpha: (1.0 - 2.0 * rx * beta) * inv[z],
                    beta: [beta * rx * inv[z], 0.0],
                    gamma: 0.0,
                };
            }
        }

        debug!(?dim, ?spacing, "built CKC stencil");
        Ok(Self {
            dim,
            kind: SolverKind::Ckc,
            axes,
        })
    }

    /// Coefficients along `axis`. All zero along an inactive axis.
    #[inline]
    pub fn along(&self, axis: Axis) -> &AxisStencil {
        &self.axes[axis.index()]
    }
}

/// ry·rz + rz·rx + rx·ry. Strictly positive: the largest ratio is exactly 1
/// and the others are positive.
#[inline]
pub fn ratio_denominator(r: [f64; 3]) -> f64 {
    r[1] * r[2] + r[2] * r[0] + r[0] * r[1]
}

fn inverse_spacing(dim: Dimensionality, spacing: [f64; 3]) -> Result<[f64; 3]> {
    let mut inv = [0.0; 3];
    for axis in dim.active_axes() {
        let d = spacing[axis.index()];
        if !(d.is_finite() && d > 0.0) {
            return Err(GridError::InvalidSpacing {
                axis: ['x', 'y', 'z'][axis.index()],
                value: d,
            });
        }
        inv[axis.index()] = 1.0 / d;
    }
    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_yee_cubic_is_centered_difference() {
        let dx = 0.2;
        let s = StencilCoefficients::yee(Dimensionality::ThreeD, [dx; 3]).unwrap();
        for axis in Axis::ALL {
            let c = s.along(axis);
            assert_eq!(c.beta, [0.0, 0.0]);
            assert_eq!(c.gamma, 0.0);
            assert_relative_eq!(c.alpha, 1.0 / dx);
            assert_relative_eq!(c.inv_d, 1.0 / dx);
        }
    }

    #[test]
    fn test_ckc_cubic_values() {
        let dx = 0.5;
        let s = StencilCoefficients::ckc(Dimensionality::ThreeD, [dx; 3]).unwrap();
        for axis in Axis::ALL {
            let c = s.along(axis);
            // r = 1: beta = 1/12, gamma = 1/48, alpha = 7/12
            assert_relative_eq!(c.beta[0], 1.0 / 12.0 / dx, epsilon = 1e-14);
            assert_relative_eq!(c.beta[1], 1.0 / 12.0 / dx, epsilon = 1e-14);
            assert_relative_eq!(c.gamma, 1.0 / 48.0 / dx, epsilon = 1e-14);
            assert_relative_eq!(c.alpha, 7.0 / 12.0 / dx, epsilon = 1e-14);
            assert_relative_eq!(c.weight_sum(), 1.0 / dx, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_ckc_anisotropic_ordering() {
        // x is the finest axis, so rx = 1 and the y/z ratios shrink
        let s = StencilCoefficients::ckc(Dimensionality::ThreeD, [0.1, 0.2, 0.4]).unwrap();
        let x = s.along(Axis::X);
        let z = s.along(Axis::Z);
        // betaxy = ry·beta/dx with ry = 1/4; betaxz with rz = 1/16
        assert_relative_eq!(x.beta[0] / x.beta[1], 4.0, epsilon = 1e-12);
        // betazx = rx·beta/dz, betazy = ry·beta/dz
        assert_relative_eq!(z.beta[0] / z.beta[1], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ckc_xz() {
        let (dx, dz) = (0.1, 0.3);
        let s = StencilCoefficients::ckc(Dimensionality::Xz, [dx, 7.0, dz]).unwrap();
        let x = s.along(Axis::X);
        let z = s.along(Axis::Z);
        let rz = (dx / dz).powi(2);
        assert_eq!(x.gamma, 0.0);
        assert_eq!(x.beta[0], 0.0);
        assert_relative_eq!(x.beta[1], 0.125 * rz / dx);
        assert_relative_eq!(x.alpha, (1.0 - 0.25 * rz) / dx);
        assert_eq!(z.beta[1], 0.0);
        assert_relative_eq!(z.beta[0], 0.125 / dz);
        assert_relative_eq!(z.alpha, 0.75 / dz);
        assert_eq!(*s.along(Axis::Y), AxisStencil::default());
    }

    #[test]
    fn test_rejects_bad_spacing() {
        assert!(StencilCoefficients::ckc(Dimensionality::ThreeD, [0.1, 0.0, 0.1]).is_err());
        assert!(StencilCoefficients::yee(Dimensionality::Xz, [f64::NAN, 1.0, 0.1]).is_err());
        // the inactive y spacing is never inspected
        assert!(StencilCoefficients::ckc(Dimensionality::Xz, [0.1, -1.0, 0.1]).is_ok());
    }
}
