use serde::Serialize;
use thiserror::Error;

use crate::model::FlowModel;
use crate::{Point, Vector};

/// Relative offset from the central object surface at which photons start.
pub const LAUNCH_FUDGE: f64 = 1e-6;

/// Allowed deviation of the direction length from one.
const UNIT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhotonError {
    #[error("photon frequency must be positive and finite, got {0:e}")]
    InvalidFrequency(f64),
    #[error("photon direction {0} is not a finite unit vector")]
    InvalidDirection(Vector),
    #[error("photon position {0} is not finite")]
    InvalidPosition(Point),
    #[error("launch point {0} lies outside the computational domain")]
    OutsideDomain(Point),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhotonState {
    Alive,
    Escaped,
    Absorbed,
}

/// A non-interacting probe photon.
#[derive(Debug, Clone, PartialEq)]
pub struct Photon {
    pub position: Point,
    /// Unit direction of travel.
    pub direction: Vector,
    /// Lab-frame frequency (Hz).
    pub frequency: f64,
    pub state: PhotonState,
}

impl Photon {
    /// Creates a live photon. The direction is normalized.
    pub fn new(position: Point, direction: Vector, frequency: f64) -> Result<Self, PhotonError> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(PhotonError::InvalidFrequency(frequency));
        }
        if !position.is_finite() {
            return Err(PhotonError::InvalidPosition(position));
        }
        let direction = direction
            .normalize()
            .ok_or(PhotonError::InvalidDirection(direction))?;
        Ok(Self {
            position,
            direction,
            frequency,
            state: PhotonState::Alive,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.state == PhotonState::Alive
    }

    /// Re-checks the fields, which are public and may have been changed
    /// after construction.
    pub fn check(&self) -> Result<(), PhotonError> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(PhotonError::InvalidFrequency(self.frequency));
        }
        if !self.position.is_finite() {
            return Err(PhotonError::InvalidPosition(self.position));
        }
        let unit = self.direction.is_finite()
            && (self.direction.length() - 1.0).abs() <= UNIT_TOLERANCE;
        if !unit {
            return Err(PhotonError::InvalidDirection(self.direction));
        }
        Ok(())
    }
}

/// Creates photons at the emission origin.
pub trait PhotonFactory: Sync {
    fn create(&self, frequency: f64, direction: Vector) -> Result<Photon, PhotonError>;
}

/// Emits photons radially from the surface of the central object.
///
/// With a zero core radius photons start at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralSource {
    pub core_radius: f64,
    /// Relative distance above the core surface of the launch point.
    pub launch_fudge: f64,
    /// Domain extent used to reject launch points outside the grid.
    pub bounds: Option<(Point, Point)>,
}

impl CentralSource {
    pub fn new(core_radius: f64) -> Self {
        Self {
            core_radius,
            launch_fudge: LAUNCH_FUDGE,
            bounds: None,
        }
    }

    /// Source matching the central object and extent of `model`.
    pub fn for_model<M: FlowModel + ?Sized>(model: &M) -> Self {
        Self {
            core_radius: model.core_radius(),
            launch_fudge: LAUNCH_FUDGE,
            bounds: Some(model.bounds()),
        }
    }

    fn launch_point(&self, direction: Vector) -> Point {
        Point::origin() + direction * (self.core_radius * (1.0 + self.launch_fudge))
    }
}

impl PhotonFactory for CentralSource {
    fn create(&self, frequency: f64, direction: Vector) -> Result<Photon, PhotonError> {
        let unit = direction
            .normalize()
            .ok_or(PhotonError::InvalidDirection(direction))?;
        let position = self.launch_point(unit);

        if let Some((min, max)) = self.bounds {
            let inside = (0..3).all(|a| {
                let c = position.coordinate(a);
                c >= min.coordinate(a) && c <= max.coordinate(a)
            });
            if !inside {
                return Err(PhotonError::OutsideDomain(position));
            }
        }

        Photon::new(position, unit, frequency)
    }
}
