use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::constants::{angstrom_to_freq, freq_to_angstrom};
use crate::model::{FlowModel, SpectrumSetup};
use crate::transport::PhotonFactory;

use super::{
    DiagnosticConfig, DiagnosticError, SightLine, allocate, allocate_table, check_sightlines,
    trace_photon,
};

/// Default number of frequency samples per spectrum.
pub const N_FREQ_BINS: usize = 100;

/// Default wavelength range (Angstrom) when no spectra are configured.
pub const DEFAULT_WAVELENGTH_MIN: f64 = 100.0;
pub const DEFAULT_WAVELENGTH_MAX: f64 = 10_000.0;

/// Optical depth as a function of frequency for every sightline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TauSpectrum {
    pub sightlines: Vec<SightLine>,
    /// Sample frequencies (Hz), strictly increasing.
    pub frequencies: Vec<f64>,
    /// Optical depth indexed by `[sightline, frequency bin]`.
    pub tau: Array2<f64>,
    /// Number of samples that could not be computed.
    pub failures: usize,
}

impl TauSpectrum {
    pub fn freq_min(&self) -> f64 {
        self.frequencies.first().copied().unwrap_or(0.0)
    }

    pub fn freq_max(&self) -> f64 {
        self.frequencies.last().copied().unwrap_or(0.0)
    }

    /// Spectrum of sightline `i`.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.tau.row(i)
    }

    /// Wavelength (Angstrom) of every frequency sample.
    pub fn wavelengths(&self) -> Vec<f64> {
        self.frequencies.iter().map(|&f| freq_to_angstrom(f)).collect()
    }
}

/// Frequency limits (Hz) of the optical depth spectrum.
///
/// Without a spectral setup (or with both wavelength limits at zero) the
/// spectrum spans 100 - 10,000 Angstrom. A limit that comes out non-finite or
/// non-positive is replaced by its default.
pub fn spectrum_range(setup: Option<&SpectrumSetup>) -> (f64, f64) {
    let default_min = angstrom_to_freq(DEFAULT_WAVELENGTH_MAX);
    let default_max = angstrom_to_freq(DEFAULT_WAVELENGTH_MIN);

    let setup = match setup {
        Some(s) if !(s.wavelength_min == 0.0 && s.wavelength_max == 0.0) => s,
        _ => {
            info!("No spectral setup, defaulting spectral wavelength range to 100 - 10,000 Angstrom");
            return (default_min, default_max);
        }
    };

    let mut freq_min = angstrom_to_freq(setup.wavelength_max);
    let mut freq_max = angstrom_to_freq(setup.wavelength_min);
    if !(freq_min.is_finite() && freq_min > 0.0) {
        freq_min = default_min;
        warn!("freq_min has an invalid value, setting to {:e}", freq_min);
    }
    if !(freq_max.is_finite() && freq_max > 0.0) {
        freq_max = default_max;
        warn!("freq_max has an invalid value, setting to {:e}", freq_max);
    }
    if freq_min >= freq_max {
        warn!(
            "spectral range [{:e}, {:e}] is empty, using the default range",
            freq_min, freq_max
        );
        return (default_min, default_max);
    }
    (freq_min, freq_max)
}

/// `n` equally spaced frequencies from `freq_min` to `freq_max` inclusive.
pub fn frequency_grid(
    freq_min: f64,
    freq_max: f64,
    n: usize,
) -> Result<Vec<f64>, DiagnosticError> {
    let mut grid = allocate(n, freq_min, "frequency_grid")?;
    if n > 1 {
        let d_freq = (freq_max - freq_min) / (n - 1) as f64;
        for (j, freq) in grid.iter_mut().enumerate() {
            *freq = freq_min + j as f64 * d_freq;
        }
        grid[n - 1] = freq_max;
    }
    Ok(grid)
}

/// Creates optical depth spectra for each sightline.
///
/// A photon is launched from the central source towards each observer for
/// every frequency sample and integrated until it escapes. Samples that fail
/// are logged and keep an optical depth of zero.
pub fn optical_depth_spectrum<M, F>(
    model: &M,
    factory: &F,
    sightlines: &[SightLine],
    setup: Option<&SpectrumSetup>,
    config: &DiagnosticConfig,
) -> Result<TauSpectrum, DiagnosticError>
where
    M: FlowModel + ?Sized,
    F: PhotonFactory + ?Sized,
{
    config.validate(model)?;
    check_sightlines(sightlines)?;

    let n_bins = config.n_freq_bins;
    let (freq_min, freq_max) = spectrum_range(setup);
    let mut buffer = allocate_table(sightlines.len(), n_bins, 0.0, "tau_spectrum")?;
    let frequencies = frequency_grid(freq_min, freq_max, n_bins)?;
    let options = config.integration_options();

    info!(
        "Creating optical depth spectra: {} sightlines, {} bins, {:.3e} - {:.3e} Hz",
        sightlines.len(),
        n_bins,
        freq_min,
        freq_max
    );

    let failures: usize = buffer
        .par_chunks_mut(n_bins)
        .zip(sightlines.par_iter())
        .map(|(row, line)| {
            info!("  - Creating spectrum: {}", line.name);
            let mut failed = 0;
            for (tau, &freq) in row.iter_mut().zip(&frequencies) {
                match trace_photon(model, factory, freq, line.direction, &options) {
                    Ok(result) => *tau = result.optical_depth,
                    Err(err) => {
                        warn!("{}: skipping photon of frequency {:e}: {}", line.name, freq, err);
                        failed += 1;
                    }
                }
            }
            failed
        })
        .sum();

    let tau = Array2::from_shape_vec((sightlines.len(), n_bins), buffer)
        .map_err(|e| DiagnosticError::InvalidConfig(e.to_string()))?;

    Ok(TauSpectrum {
        sightlines: sightlines.to_vec(),
        frequencies,
        tau,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::VLIGHT;

    #[test]
    fn test_default_range() {
        let (fmin, fmax) = spectrum_range(None);
        assert!((fmin - VLIGHT / 1e-4).abs() / fmin < 1e-12);
        assert!((fmax - VLIGHT / 1e-6).abs() / fmax < 1e-12);

        let zeros = SpectrumSetup {
            wavelength_min: 0.0,
            wavelength_max: 0.0,
            observers: vec![],
        };
        assert_eq!(spectrum_range(Some(&zeros)), (fmin, fmax));
    }

    #[test]
    fn test_configured_range() {
        let setup = SpectrumSetup {
            wavelength_min: 1000.0,
            wavelength_max: 2000.0,
            observers: vec![],
        };
        let (fmin, fmax) = spectrum_range(Some(&setup));
        assert_eq!(fmin, angstrom_to_freq(2000.0));
        assert_eq!(fmax, angstrom_to_freq(1000.0));
    }

    #[test]
    fn test_insane_range_falls_back() {
        // wavelength_min = 0 gives an infinite upper frequency
        let setup = SpectrumSetup {
            wavelength_min: 0.0,
            wavelength_max: 2000.0,
            observers: vec![],
        };
        let (fmin, fmax) = spectrum_range(Some(&setup));
        assert_eq!(fmin, angstrom_to_freq(2000.0));
        assert_eq!(fmax, angstrom_to_freq(DEFAULT_WAVELENGTH_MIN));

        let negative = SpectrumSetup {
            wavelength_min: 500.0,
            wavelength_max: -1.0,
            observers: vec![],
        };
        let (fmin, _) = spectrum_range(Some(&negative));
        assert_eq!(fmin, angstrom_to_freq(DEFAULT_WAVELENGTH_MAX));
    }

    #[test]
    fn test_frequency_grid() {
        let (fmin, fmax) = spectrum_range(None);
        let grid = frequency_grid(fmin, fmax, N_FREQ_BINS).unwrap();
        assert_eq!(grid.len(), N_FREQ_BINS);
        assert_eq!(grid[0], VLIGHT / (10_000.0 * 1e-8));
        assert_eq!(grid[N_FREQ_BINS - 1], VLIGHT / (100.0 * 1e-8));

        let step = grid[1] - grid[0];
        for pair in grid.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(((pair[1] - pair[0]) - step).abs() / step < 1e-6);
        }

        assert_eq!(frequency_grid(1.0, 2.0, 1).unwrap(), vec![1.0]);
        assert!(frequency_grid(1.0, 2.0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_grid_is_an_error() {
        assert!(matches!(
            frequency_grid(1.0, 2.0, usize::MAX / 4),
            Err(DiagnosticError::Allocation { what: "frequency_grid", .. })
        ));
    }

    #[test]
    fn test_oversized_spectrum_is_an_error() {
        use crate::model::{CartesianGrid, CellPlasma, Model};
        use crate::transport::CentralSource;
        use crate::{Point, Vector};

        let grid = CartesianGrid::uniform(
            Point::new(-1.0, -1.0, -1.0),
            [1.0; 3],
            [2, 2, 2],
            CellPlasma::new(1e-14, 1e10, 1e10),
        )
        .unwrap();
        let model = Model::new("m", 0.0, vec![grid]);
        let view = model.view(0).unwrap();
        let source = CentralSource::for_model(&view);
        let lines = vec![
            SightLine::new("x", Vector::new(1., 0., 0.)).unwrap(),
            SightLine::new("y", Vector::new(0., 1., 0.)).unwrap(),
        ];

        let mut config = DiagnosticConfig::new();
        config.n_freq_bins = usize::MAX / 2 + 1;
        let err = optical_depth_spectrum(&view, &source, &lines, None, &config).unwrap_err();
        assert!(matches!(err, DiagnosticError::Allocation { what: "tau_spectrum", .. }));

        config.n_freq_bins = 1 << 60;
        let err = optical_depth_spectrum(&view, &source, &lines, None, &config).unwrap_err();
        assert!(matches!(err, DiagnosticError::Allocation { .. }));
    }
}
