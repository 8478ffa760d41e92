//! Read-only flow, plasma and opacity state consumed by the path integrator.
//!
//! A [`Model`] holds one or more Cartesian domains sharing a central object
//! and an atomic data table. Integrations never touch the model directly:
//! they receive a [`FlowModel`] view of a single domain.

pub mod atomic;
pub mod grid;
pub mod io;
pub mod setup;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Point, Vector};

pub use atomic::{AtomicData, Ion};
pub use grid::{CartesianGrid, CellPlasma, CellWalk, Segment};
pub use setup::{Observer, SamplingSetup, SpectrumSetup};

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("invalid grid geometry: {0}")]
    InvalidGeometry(String),
    #[error("grid needs {expected} cells, got {got}")]
    CellCountMismatch { expected: usize, got: usize },
    #[error("model has no domains")]
    NoDomains,
    #[error("domain {domain} does not exist, the model has {ndomains} domain(s)")]
    DomainOutOfRange { domain: usize, ndomains: usize },
    #[error("cell {cell} of domain {domain} tracks {got} ions, the atomic data has {nions}")]
    IonCountMismatch {
        domain: usize,
        cell: usize,
        got: usize,
        nions: usize,
    },
    #[error("central object radius must be finite and non-negative, got {0:e}")]
    InvalidCoreRadius(f64),
}

/// Grid and opacity state as seen by the path integrator.
///
/// Implementations must be immutable while diagnostics run; they are shared
/// across worker threads.
pub trait FlowModel: Sync {
    /// Axis-aligned extent of the computational domain (min, max).
    fn bounds(&self) -> (Point, Point);

    /// Radius of the opaque central object at the origin (0 if none).
    fn core_radius(&self) -> f64;

    /// Cell segments crossed by `origin + t * direction`, or None if `origin`
    /// lies outside the domain.
    fn walk(&self, origin: Point, direction: Vector) -> Option<CellWalk<'_>>;

    /// Plasma state of a cell returned by [`FlowModel::walk`].
    fn plasma(&self, cell: usize) -> Option<&CellPlasma>;

    fn atomic(&self) -> &AtomicData;

    /// Checks if a point lies inside the domain (boundaries included).
    fn contains(&self, pos: Point) -> bool {
        let (min, max) = self.bounds();
        (0..3).all(|a| {
            let c = pos.coordinate(a);
            c >= min.coordinate(a) && c <= max.coordinate(a)
        })
    }
}

/// A simulation model as loaded from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    /// Radius of the central object (cm).
    #[serde(default)]
    pub core_radius: f64,
    pub domains: Vec<CartesianGrid>,
    #[serde(default)]
    pub atomic: AtomicData,
    /// Spectral cycle setup, if any spectra were configured.
    #[serde(default)]
    pub spectrum: Option<SpectrumSetup>,
    /// Photon frequency sampling setup.
    #[serde(default)]
    pub sampling: Option<SamplingSetup>,
}

impl Model {
    pub fn new(name: &str, core_radius: f64, domains: Vec<CartesianGrid>) -> Self {
        Self {
            name: name.to_string(),
            core_radius,
            domains,
            atomic: AtomicData::default(),
            spectrum: None,
            sampling: None,
        }
    }

    pub fn with_atomic(mut self, atomic: AtomicData) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn with_spectrum(mut self, spectrum: SpectrumSetup) -> Self {
        self.spectrum = Some(spectrum);
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingSetup) -> Self {
        self.sampling = Some(sampling);
        self
    }

    pub fn ndomains(&self) -> usize {
        self.domains.len()
    }

    /// Checks the geometry of all domains and the per-cell ion tables.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.domains.is_empty() {
            return Err(ModelError::NoDomains);
        }
        if !(self.core_radius.is_finite() && self.core_radius >= 0.0) {
            return Err(ModelError::InvalidCoreRadius(self.core_radius));
        }
        let nions = self.atomic.nions();
        for (domain, grid) in self.domains.iter().enumerate() {
            grid.validate()?;
            // Cells may omit ion densities entirely, but never track a subset
            if let Some((cell, plasma)) = grid
                .cells
                .iter()
                .enumerate()
                .find(|(_, c)| !c.ion_density.is_empty() && c.ion_density.len() != nions)
            {
                return Err(ModelError::IonCountMismatch {
                    domain,
                    cell,
                    got: plasma.ion_density.len(),
                    nions,
                });
            }
        }
        Ok(())
    }

    /// Read-only view of domain `domain` for the path integrator.
    pub fn view(&self, domain: usize) -> Result<DomainView<'_>, ModelError> {
        let grid = self
            .domains
            .get(domain)
            .ok_or(ModelError::DomainOutOfRange {
                domain,
                ndomains: self.domains.len(),
            })?;
        Ok(DomainView {
            grid,
            atomic: &self.atomic,
            core_radius: self.core_radius,
        })
    }
}

/// One domain of a [`Model`] together with the shared model state.
#[derive(Debug, Clone, Copy)]
pub struct DomainView<'a> {
    pub grid: &'a CartesianGrid,
    pub atomic: &'a AtomicData,
    pub core_radius: f64,
}

impl FlowModel for DomainView<'_> {
    fn bounds(&self) -> (Point, Point) {
        self.grid.bounds()
    }

    fn core_radius(&self) -> f64 {
        self.core_radius
    }

    fn walk(&self, origin: Point, direction: Vector) -> Option<CellWalk<'_>> {
        self.grid.walk(origin, direction)
    }

    fn plasma(&self, cell: usize) -> Option<&CellPlasma> {
        self.grid.cell(cell)
    }

    fn atomic(&self) -> &AtomicData {
        self.atomic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> CartesianGrid {
        CartesianGrid::uniform(
            Point::new(-1.0, -1.0, -1.0),
            [1.0; 3],
            [2, 2, 2],
            CellPlasma::new(1e-14, 1e10, 1.2e10),
        )
        .unwrap()
    }

    #[test]
    fn test_model_validate() {
        let model = Model::new("m", 0.1, vec![small_grid()]);
        assert!(model.validate().is_ok());

        let empty = Model::new("m", 0.1, vec![]);
        assert_eq!(empty.validate().unwrap_err(), ModelError::NoDomains);

        let bad_core = Model::new("m", f64::NAN, vec![small_grid()]);
        assert!(matches!(
            bad_core.validate(),
            Err(ModelError::InvalidCoreRadius(_))
        ));
    }

    #[test]
    fn test_model_validate_ion_count() {
        let mut grid = small_grid();
        grid.cells[3].ion_density = vec![1.0];
        let model = Model::new("m", 0.0, vec![grid]);
        assert_eq!(
            model.validate().unwrap_err(),
            ModelError::IonCountMismatch {
                domain: 0,
                cell: 3,
                got: 1,
                nions: 3
            }
        );
    }

    #[test]
    fn test_domain_view() {
        let model = Model::new("m", 0.25, vec![small_grid()]);
        let view = model.view(0).unwrap();
        assert_eq!(view.core_radius(), 0.25);
        assert!(view.contains(Point::origin()));
        assert!(!view.contains(Point::new(0.0, 0.0, 1.5)));
        assert!(view.plasma(7).is_some());
        assert!(view.plasma(8).is_none());

        assert_eq!(
            model.view(1).unwrap_err(),
            ModelError::DomainOutOfRange {
                domain: 1,
                ndomains: 1
            }
        );
    }
}
