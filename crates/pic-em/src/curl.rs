//! Directional derivatives for the discrete curl.
//!
//! `upward` differentiates a field that is nodal along the derivative axis
//! and lands on cell-centered positions (used for B ← ∇×E). `downward`
//! differentiates a cell-centered field and lands on nodes (E ← ∇×B). Both
//! are read-only, need one guard cell on every axis the stencil touches, and
//! may be evaluated for any number of cells in parallel.

use pic_math::Axis;

use crate::array::GridArray;
use crate::stencil::StencilCoefficients;

#[inline]
fn shift(p: [isize; 3], axis: Axis, by: isize) -> [isize; 3] {
    let mut q = p;
    q[axis.index()] += by;
    q
}

/// Forward difference `F(p + ê_axis) - F(p)`.
#[inline]
fn forward(f: &GridArray, p: [isize; 3], axis: Axis) -> f64 {
    f.at(shift(p, axis, 1)) - f.at(p)
}

/// Derivative along `axis` at cell-centered position `p` of a field nodal
/// along `axis`.
///
/// alpha weights the direct neighbours, beta the diagonal pairs on each of
/// the two other axes, gamma the four triple diagonals. Terms along an axis
/// the grid does not resolve are never read; the derivative along such an
/// axis is exactly zero.
#[inline]
pub fn upward(f: &GridArray, coefs: &StencilCoefficients, axis: Axis, p: [isize; 3]) -> f64 {
    if !coefs.dim.is_active(axis) {
        return 0.0;
    }
    let c = coefs.along(axis);
    let (b, cc) = axis.others();
    let b_active = coefs.dim.is_active(b);
    let c_active = coefs.dim.is_active(cc);

    let mut d = c.alpha * forward(f, p, axis);

    if b_active {
        d += c.beta[0] * (forward(f, shift(p, b, 1), axis) + forward(f, shift(p, b, -1), axis));
    }
    if c_active {
        d += c.beta[1] * (forward(f, shift(p, cc, 1), axis) + forward(f, shift(p, cc, -1), axis));
    }
    if b_active && c_active && c.gamma != 0.0 {
        let mut g = 0.0;
        for sb in [1, -1] {
            for sc in [1, -1] {
                g += forward(f, shift(shift(p, b, sb), cc, sc), axis);
            }
        }
        d += c.gamma * g;
    }
    d
}

/// Derivative along `axis` at nodal position `p` of a field cell-centered
/// along `axis`: `inv_d · (F(p) - F(p - ê_axis))`.
#[inline]
pub fn downward(f: &GridArray, coefs: &StencilCoefficients, axis: Axis, p: [isize; 3]) -> f64 {
    if !coefs.dim.is_active(axis) {
        return 0.0;
    }
    coefs.along(axis).inv_d * (f.at(p) - f.at(shift(p, axis, -1)))
}
