use serde::{Deserialize, Serialize};

use crate::Vector;
use crate::constants::VLIGHT;

/// Frame transformation used when Doppler shifting into the co-moving frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativityMode {
    /// Special-relativistic transform, `gamma * (1 - v.n / c)`.
    #[default]
    Full,
    /// First order in `v / c`, `1 - v.n / c`.
    Linear,
}

impl RelativityMode {
    /// Ratio of co-moving to lab-frame frequency for a photon travelling along
    /// `direction` through material moving with `velocity` (cm/s).
    pub fn doppler_factor(self, velocity: Vector, direction: Vector) -> f64 {
        let beta_n = velocity.dot(direction) / VLIGHT;
        match self {
            Self::Linear => 1.0 - beta_n,
            Self::Full => {
                let beta2 = velocity.dot(velocity) / (VLIGHT * VLIGHT);
                (1.0 - beta_n) / (1.0 - beta2).sqrt()
            }
        }
    }

    /// Converts `kappa_local * ds` into a lab-frame optical depth.
    ///
    /// `kappa * ds` is invariant, so the full transform scales the co-moving
    /// extinction by the Doppler factor. The linear mode ignores the
    /// correction.
    pub fn path_factor(self, doppler: f64) -> f64 {
        match self {
            Self::Full => doppler,
            Self::Linear => 1.0,
        }
    }
}
