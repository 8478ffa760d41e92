//! Optical depth diagnostics along observer sightlines.
//!
//! Three drivers share the same machinery: a photon is created at the
//! emission origin for every (sightline, frequency) pair and integrated
//! through the model. Sightlines are independent, so each driver processes
//! them in parallel over the read-only model.
//!
//! - [`optical_depth_spectrum`]: optical depth against frequency
//! - [`evaluate_edges`]: optical depth at fixed photoionization edges
//! - [`locate_photosphere`]: surface where a stopping depth is reached
//!
//! Result buffers are allocated before any integration starts. A photon that
//! cannot be created or integrated is logged and leaves its result at the
//! default value, the rest of the batch is unaffected.

pub mod edges;
pub mod photosphere;
pub mod report;
pub mod sightlines;
pub mod spectrum;

use thiserror::Error;

use crate::Vector;
use crate::model::FlowModel;
use crate::transport::{
    ColumnMode, DEFAULT_MAX_CROSSINGS, Extinction, IntegrationError, IntegrationOptions,
    IntegrationResult, PhotonError, PhotonFactory, RelativityMode, integrate,
};

pub use edges::{Edge, EdgeReport, PHOTOIONIZATION_EDGES, evaluate_edges, evaluate_edges_at};
pub use photosphere::{PHOTOSPHERE_SENTINEL, PhotosphereReport, locate_photosphere};
pub use sightlines::{DefaultSightlines, SightLine, SightlineProvider};
pub use spectrum::{N_FREQ_BINS, TauSpectrum, optical_depth_spectrum, spectrum_range};

/// Frequency of the photons used to locate the photosphere (Hz).
pub const PHOTOSPHERE_FREQUENCY: f64 = 8e14;

#[derive(Debug, Error, PartialEq)]
pub enum DiagnosticError {
    #[error("cannot allocate {bytes} bytes for {what}")]
    Allocation { what: &'static str, bytes: usize },
    #[error("ion number {ion} is invalid: {nions} ions have been loaded")]
    InvalidIon { ion: usize, nions: usize },
    #[error("no sightlines to evaluate")]
    NoSightlines,
    #[error("invalid diagnostic configuration: {0}")]
    InvalidConfig(String),
}

/// Why a single (sightline, frequency) sample produced no result.
#[derive(Debug, Error)]
pub enum SampleFailure {
    #[error(transparent)]
    Photon(#[from] PhotonError),
    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

/// Settings shared by the diagnostic drivers.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticConfig {
    pub relativity: RelativityMode,
    pub column: ColumnMode,
    /// Number of frequency samples per optical depth spectrum.
    pub n_freq_bins: usize,
    /// Electron-scattering optical depth defining the photosphere.
    pub stop_depth: f64,
    /// Frequency of the photosphere photons (Hz).
    pub photosphere_frequency: f64,
    /// Step budget of a single integration.
    pub max_crossings: usize,
}

impl DiagnosticConfig {
    pub fn new() -> Self {
        Self {
            relativity: RelativityMode::Full,
            column: ColumnMode::Mass,
            n_freq_bins: N_FREQ_BINS,
            stop_depth: 1.0,
            photosphere_frequency: PHOTOSPHERE_FREQUENCY,
            max_crossings: DEFAULT_MAX_CROSSINGS,
        }
    }

    /// Options for the spectrum and edge drivers.
    ///
    /// The single-ion column mode also restricts the extinction to that ion.
    pub fn integration_options(&self) -> IntegrationOptions {
        let extinction = match self.column {
            ColumnMode::Ion(n) => Extinction::Ion(n),
            ColumnMode::Mass | ColumnMode::Hydrogen => Extinction::Continuum,
        };
        IntegrationOptions::new()
            .with_relativity(self.relativity)
            .with_column(self.column)
            .with_extinction(extinction)
            .with_max_crossings(self.max_crossings)
    }

    /// Options for the photosphere driver: electron scattering only, stopping
    /// at `stop_depth`. The column selection does not apply here.
    pub fn photosphere_options(&self) -> IntegrationOptions {
        IntegrationOptions::new()
            .with_relativity(self.relativity)
            .with_column(ColumnMode::Mass)
            .with_extinction(Extinction::ElectronScattering)
            .with_stop_depth(self.stop_depth)
            .with_max_crossings(self.max_crossings)
    }

    /// Checks the configuration against the model before any photon is made.
    pub fn validate<M: FlowModel + ?Sized>(&self, model: &M) -> Result<(), DiagnosticError> {
        if let ColumnMode::Ion(ion) = self.column {
            let nions = model.atomic().nions();
            if ion >= nions {
                return Err(DiagnosticError::InvalidIon { ion, nions });
            }
        }
        self.validate_photosphere()
    }

    /// Checks for the photosphere driver, which ignores the column selection.
    pub fn validate_photosphere(&self) -> Result<(), DiagnosticError> {
        if self.n_freq_bins == 0 {
            return Err(DiagnosticError::InvalidConfig(
                "at least one frequency bin is required".into(),
            ));
        }
        if !(self.stop_depth.is_finite() && self.stop_depth >= 0.0) {
            return Err(DiagnosticError::InvalidConfig(format!(
                "stopping optical depth must be non-negative, got {}",
                self.stop_depth
            )));
        }
        if !(self.photosphere_frequency.is_finite() && self.photosphere_frequency > 0.0) {
            return Err(DiagnosticError::InvalidConfig(format!(
                "photosphere frequency must be positive, got {:e}",
                self.photosphere_frequency
            )));
        }
        Ok(())
    }
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates one photon and integrates it through the model.
pub fn trace_photon<M, F>(
    model: &M,
    factory: &F,
    frequency: f64,
    direction: Vector,
    options: &IntegrationOptions,
) -> Result<IntegrationResult, SampleFailure>
where
    M: FlowModel + ?Sized,
    F: PhotonFactory + ?Sized,
{
    let mut photon = factory.create(frequency, direction)?;
    Ok(integrate(model, &mut photon, options)?)
}

/// Zero-filled buffer of `len` values, reserved before use so that running
/// out of memory is reported instead of aborting.
pub(crate) fn allocate<T: Clone>(
    len: usize,
    fill: T,
    what: &'static str,
) -> Result<Vec<T>, DiagnosticError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| DiagnosticError::Allocation {
            what,
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buffer.resize(len, fill);
    Ok(buffer)
}

/// Buffer for a `rows x cols` result table. An element count that overflows
/// `usize` is reported as an allocation failure.
pub(crate) fn allocate_table<T: Clone>(
    rows: usize,
    cols: usize,
    fill: T,
    what: &'static str,
) -> Result<Vec<T>, DiagnosticError> {
    let len = rows
        .checked_mul(cols)
        .ok_or(DiagnosticError::Allocation {
            what,
            bytes: usize::MAX,
        })?;
    allocate(len, fill, what)
}

fn check_sightlines(sightlines: &[SightLine]) -> Result<(), DiagnosticError> {
    if sightlines.is_empty() {
        Err(DiagnosticError::NoSightlines)
    } else {
        Ok(())
    }
}
