use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::Point;
use crate::model::FlowModel;
use crate::transport::PhotonFactory;

use super::{
    DiagnosticConfig, DiagnosticError, SightLine, allocate, check_sightlines, trace_photon,
};

/// Position reported for sightlines whose photon could not be integrated.
pub const PHOTOSPHERE_SENTINEL: Point = Point {
    x: -1.0,
    y: -1.0,
    z: -1.0,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotosphereReport {
    pub sightlines: Vec<SightLine>,
    pub stop_depth: f64,
    /// Photon frequency (Hz).
    pub frequency: f64,
    /// Where the stopping depth was reached, or the escape point if it never
    /// was. [`PHOTOSPHERE_SENTINEL`] marks failures.
    pub positions: Vec<Point>,
    pub failures: usize,
}

impl PhotosphereReport {
    pub fn is_resolved(&self, i: usize) -> bool {
        self.positions
            .get(i)
            .is_some_and(|p| *p != PHOTOSPHERE_SENTINEL)
    }
}

/// Finds where the electron-scattering optical depth from the central source
/// reaches `config.stop_depth` along each sightline.
pub fn locate_photosphere<M, F>(
    model: &M,
    factory: &F,
    sightlines: &[SightLine],
    config: &DiagnosticConfig,
) -> Result<PhotosphereReport, DiagnosticError>
where
    M: FlowModel + ?Sized,
    F: PhotonFactory + ?Sized,
{
    config.validate_photosphere()?;
    check_sightlines(sightlines)?;

    let mut positions = allocate(sightlines.len(), PHOTOSPHERE_SENTINEL, "photosphere")?;
    let options = config.photosphere_options();
    let frequency = config.photosphere_frequency;

    info!(
        "Locating the tau = {} surface at {:.3e} Hz along {} sightlines",
        config.stop_depth,
        frequency,
        sightlines.len()
    );

    let failures: usize = positions
        .par_iter_mut()
        .zip(sightlines.par_iter())
        .map(|(position, line)| {
            match trace_photon(model, factory, frequency, line.direction, &options) {
                Ok(result) => {
                    *position = result.position;
                    0
                }
                Err(err) => {
                    warn!("{}: photosphere not found: {}", line.name, err);
                    1
                }
            }
        })
        .sum();

    Ok(PhotosphereReport {
        sightlines: sightlines.to_vec(),
        stop_depth: config.stop_depth,
        frequency,
        positions,
        failures,
    })
}
