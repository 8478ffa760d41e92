use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::model::FlowModel;
use crate::{Point, Vector};

use super::frame::RelativityMode;
use super::opacity::{ColumnMode, Extinction};
use super::photon::{Photon, PhotonError, PhotonState};

/// Default limit on the number of cell segments per integration.
pub const DEFAULT_MAX_CROSSINGS: usize = 1_000_000;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntegrationError {
    #[error("photon is no longer alive ({0:?})")]
    NotAlive(PhotonState),
    #[error(transparent)]
    InvalidPhoton(#[from] PhotonError),
    #[error("photon starts outside the computational domain at {0}")]
    OutsideDomain(Point),
    #[error("photon starts inside the central object (r = {radius:e} < {core_radius:e})")]
    InsideCentralObject { radius: f64, core_radius: f64 },
    #[error("photon hit the central object at {0}")]
    HitCentralObject(Point),
    #[error("stopping optical depth must be finite and non-negative, got {0}")]
    InvalidStopDepth(f64),
    #[error("ion {ion} is not in the atomic data ({nions} ions loaded)")]
    UnknownIon { ion: usize, nions: usize },
    #[error("grid returned unknown cell {0}")]
    UnknownCell(usize),
    #[error("non-finite optical depth increment in cell {0}")]
    NonFiniteOpacity(usize),
    #[error("path too long: more than {0} cell crossings")]
    PathTooLong(usize),
}

/// Settings of a single line-of-sight integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntegrationOptions {
    pub relativity: RelativityMode,
    pub column: ColumnMode,
    pub extinction: Extinction,
    /// Stop once the optical depth exceeds this value.
    pub stop_depth: Option<f64>,
    /// Step budget; exceeding it fails the integration.
    pub max_crossings: usize,
}

impl IntegrationOptions {
    pub fn new() -> Self {
        Self {
            relativity: RelativityMode::Full,
            column: ColumnMode::Mass,
            extinction: Extinction::Continuum,
            stop_depth: None,
            max_crossings: DEFAULT_MAX_CROSSINGS,
        }
    }

    pub fn with_relativity(mut self, relativity: RelativityMode) -> Self {
        self.relativity = relativity;
        self
    }

    pub fn with_column(mut self, column: ColumnMode) -> Self {
        self.column = column;
        self
    }

    pub fn with_extinction(mut self, extinction: Extinction) -> Self {
        self.extinction = extinction;
        self
    }

    pub fn with_stop_depth(mut self, stop_depth: f64) -> Self {
        self.stop_depth = Some(stop_depth);
        self
    }

    pub fn with_max_crossings(mut self, max_crossings: usize) -> Self {
        self.max_crossings = max_crossings;
        self
    }
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// The photon left the domain.
    Escaped,
    /// The stopping optical depth was reached inside the domain.
    ReachedDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntegrationResult {
    pub optical_depth: f64,
    pub column_density: f64,
    /// Photon position at termination.
    pub position: Point,
    pub termination: Termination,
    /// Number of cell segments traversed.
    pub crossings: usize,
}

/// Integrates optical depth and column density along the photon's path.
///
/// The photon moves in a straight line from its current position until it
/// leaves the domain or the accumulated optical depth exceeds
/// `options.stop_depth`. On success its position is the escape point or the
/// point where the stopping depth was crossed. The model is only read.
pub fn integrate<M: FlowModel + ?Sized>(
    model: &M,
    photon: &mut Photon,
    options: &IntegrationOptions,
) -> Result<IntegrationResult, IntegrationError> {
    if !photon.is_alive() {
        return Err(IntegrationError::NotAlive(photon.state));
    }
    photon.check()?;
    if let Some(stop) = options.stop_depth
        && !(stop.is_finite() && stop >= 0.0)
    {
        return Err(IntegrationError::InvalidStopDepth(stop));
    }
    let nions = model.atomic().nions();
    for ion in [options.column.ion(), options.extinction.ion()].into_iter().flatten() {
        if ion >= nions {
            return Err(IntegrationError::UnknownIon { ion, nions });
        }
    }

    let start = photon.position;
    let dir = photon.direction;
    let core_radius = model.core_radius();
    if core_radius > 0.0 && start.radius() < core_radius {
        return Err(IntegrationError::InsideCentralObject {
            radius: start.radius(),
            core_radius,
        });
    }
    let t_core = core_intersection(start, dir, core_radius);

    let walk = model
        .walk(start, dir)
        .ok_or(IntegrationError::OutsideDomain(start))?;
    let atomic = model.atomic();

    let mut tau = 0.0;
    let mut column = 0.0;
    let mut t_end = 0.0;
    let mut crossings = 0;

    for segment in walk {
        crossings += 1;
        if crossings > options.max_crossings {
            photon.position = start + dir * t_end;
            return Err(IntegrationError::PathTooLong(options.max_crossings));
        }

        // Truncate the segment where it enters the central object
        let mut length = segment.length;
        let mut hits_core = false;
        if let Some(t_hit) = t_core
            && t_hit < segment.t_start + length
        {
            length = (t_hit - segment.t_start).max(0.0);
            hits_core = true;
        }

        let plasma = model
            .plasma(segment.cell)
            .ok_or(IntegrationError::UnknownCell(segment.cell))?;
        let doppler = options.relativity.doppler_factor(plasma.velocity, dir);
        let kappa = options
            .extinction
            .coefficient(plasma, atomic, photon.frequency * doppler);
        let dtau = kappa * length * options.relativity.path_factor(doppler);
        if !dtau.is_finite() {
            return Err(IntegrationError::NonFiniteOpacity(segment.cell));
        }
        let density = options.column.density(plasma);

        if let Some(stop) = options.stop_depth
            && tau + dtau > stop
        {
            let fraction = if dtau > 0.0 { (stop - tau) / dtau } else { 0.0 };
            let distance = length * fraction;
            column += density * distance;
            photon.position = start + dir * (segment.t_start + distance);
            debug!(
                tau = stop,
                crossings, "photon reached stopping depth at {:.3}", photon.position
            );
            return Ok(IntegrationResult {
                optical_depth: stop,
                column_density: column,
                position: photon.position,
                termination: Termination::ReachedDepth,
                crossings,
            });
        }

        tau += dtau;
        column += density * length;
        t_end = segment.t_start + length;

        if hits_core {
            photon.position = start + dir * t_end;
            photon.state = PhotonState::Absorbed;
            return Err(IntegrationError::HitCentralObject(photon.position));
        }
    }

    photon.position = start + dir * t_end;
    photon.state = PhotonState::Escaped;
    debug!(tau, column, crossings, "photon escaped at {:.3}", photon.position);

    Ok(IntegrationResult {
        optical_depth: tau,
        column_density: column,
        position: photon.position,
        termination: Termination::Escaped,
        crossings,
    })
}

/// Distance along the ray to the central object surface, if the ray hits it.
fn core_intersection(origin: Point, dir: Vector, core_radius: f64) -> Option<f64> {
    if core_radius <= 0.0 {
        return None;
    }
    let to_origin = Vector::from_points(Point::origin(), origin);
    let b = to_origin.dot(dir);
    let c = to_origin.dot(to_origin) - core_radius * core_radius;
    let disc = b * b - c;
    if b >= 0.0 || disc <= 0.0 {
        return None;
    }
    Some((-b - disc.sqrt()).max(0.0))
}
