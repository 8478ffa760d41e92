use serde::{Deserialize, Serialize};

use crate::constants::THOMSON;
use crate::model::{AtomicData, CellPlasma};

/// Density integrated into the column density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMode {
    /// Mass density (g cm^-2 column).
    #[default]
    Mass,
    /// Total hydrogen number density (cm^-2 column).
    Hydrogen,
    /// Number density of a single ion (cm^-2 column).
    Ion(usize),
}

impl ColumnMode {
    pub fn density(self, plasma: &CellPlasma) -> f64 {
        match self {
            Self::Mass => plasma.rho,
            Self::Hydrogen => plasma.n_h,
            Self::Ion(n) => plasma.ion(n),
        }
    }

    pub fn ion(self) -> Option<usize> {
        match self {
            Self::Ion(n) => Some(n),
            _ => None,
        }
    }

    pub fn units(self) -> &'static str {
        match self {
            Self::Mass => "g cm^-2",
            Self::Hydrogen | Self::Ion(_) => "cm^-2",
        }
    }
}

/// Extinction sources included in the optical depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extinction {
    /// Thomson scattering by free electrons.
    ElectronScattering,
    /// Electron scattering plus bound-free absorption by every ion.
    #[default]
    Continuum,
    /// Bound-free absorption by a single ion.
    Ion(usize),
}

impl Extinction {
    /// Extinction coefficient (cm^-1) at the co-moving frequency `freq`.
    pub fn coefficient(self, plasma: &CellPlasma, atomic: &AtomicData, freq: f64) -> f64 {
        match self {
            Self::ElectronScattering => THOMSON * plasma.n_e,
            Self::Continuum => {
                let bound_free: f64 = atomic
                    .ions
                    .iter()
                    .zip(&plasma.ion_density)
                    .map(|(ion, &density)| density * ion.cross_section(freq))
                    .sum();
                THOMSON * plasma.n_e + bound_free
            }
            Self::Ion(n) => atomic
                .ion(n)
                .map_or(0.0, |ion| plasma.ion(n) * ion.cross_section(freq)),
        }
    }

    pub fn ion(self) -> Option<usize> {
        match self {
            Self::Ion(n) => Some(n),
            _ => None,
        }
    }
}
