//! Positions and directions in the model frame (cm).

pub mod point;
pub mod vector;

/// Relative geometric precision
const EPS: f64 = 1e-13;

/// Equal to within `EPS` relative to the larger magnitude (absolute below 1).
fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPS * a.abs().max(b.abs()).max(1.0)
}
