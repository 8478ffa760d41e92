use serde::{Deserialize, Serialize};

use crate::bands::{BandError, BandMode, BandTable};

/// Observer line of sight of a spectral cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    /// Inclination from the +z axis (degrees).
    pub inclination: f64,
    /// Orbital phase in [0, 1).
    #[serde(default = "default_phase")]
    pub phase: f64,
}

fn default_phase() -> f64 {
    0.5
}

impl Observer {
    pub fn new(inclination: f64, phase: f64) -> Self {
        Self { inclination, phase }
    }
}

/// Spectral cycle configuration stored with a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumSetup {
    /// Shortest wavelength of the extracted spectra (Angstrom).
    pub wavelength_min: f64,
    /// Longest wavelength of the extracted spectra (Angstrom).
    pub wavelength_max: f64,
    #[serde(default)]
    pub observers: Vec<Observer>,
}

/// Photon frequency sampling configuration stored with a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingSetup {
    pub mode: BandMode,
    /// Reference temperature (K) for the temperature mode.
    #[serde(default)]
    pub temperature: f64,
    /// Global lower frequency limit (Hz).
    #[serde(default)]
    pub f_min: f64,
    /// Global upper frequency limit (Hz).
    #[serde(default)]
    pub f_max: f64,
}

impl SamplingSetup {
    pub fn band_table(&self) -> Result<BandTable, BandError> {
        BandTable::new(&self.mode, self.temperature, self.f_min, self.f_max)
    }
}
