use std::f64::consts::PI;

use serde::Serialize;

use crate::Vector;
use crate::model::{Model, Observer};

/// Inclinations (degrees) used when a model defines no observers.
pub const DEFAULT_INCLINATIONS: [f64; 8] = [0.0, 10.0, 30.0, 45.0, 60.0, 75.0, 85.0, 90.0];

/// Orbital phase of the default sightlines.
pub const DEFAULT_PHASE: f64 = 0.5;

/// A named observer direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SightLine {
    pub name: String,
    /// Unit vector pointing from the source towards the observer.
    pub direction: Vector,
}

impl SightLine {
    /// Creates a sightline, normalizing `direction`.
    pub fn new(name: &str, direction: Vector) -> Option<Self> {
        Some(Self {
            name: name.to_string(),
            direction: direction.normalize()?,
        })
    }

    /// Sightline of an observer at `inclination` degrees and orbital `phase`.
    ///
    /// The observer sits at azimuth `-2 pi phase`.
    pub fn from_observer(observer: &Observer) -> Self {
        let name = format!("A{:02.0}P{:04.2}", observer.inclination, observer.phase);
        let direction = Vector::from_angles(
            observer.inclination.to_radians(),
            -2.0 * PI * observer.phase,
        );
        Self { name, direction }
    }
}

/// Supplies the ordered list of sightlines for a diagnostic run.
pub trait SightlineProvider {
    fn sightlines(&self) -> Vec<SightLine>;
}

/// The built-in set of inclinations at the default phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSightlines;

impl SightlineProvider for DefaultSightlines {
    fn sightlines(&self) -> Vec<SightLine> {
        DEFAULT_INCLINATIONS
            .iter()
            .map(|&inclination| SightLine::from_observer(&Observer::new(inclination, DEFAULT_PHASE)))
            .collect()
    }
}

impl SightlineProvider for [Observer] {
    fn sightlines(&self) -> Vec<SightLine> {
        self.iter().map(SightLine::from_observer).collect()
    }
}

impl SightlineProvider for Vec<SightLine> {
    fn sightlines(&self) -> Vec<SightLine> {
        self.clone()
    }
}

/// Uses the observers of the model's spectral setup, falling back to the
/// default inclinations when there are none.
impl SightlineProvider for Model {
    fn sightlines(&self) -> Vec<SightLine> {
        match &self.spectrum {
            Some(setup) if !setup.observers.is_empty() => setup.observers.sightlines(),
            _ => DefaultSightlines.sightlines(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;
    use crate::model::{CartesianGrid, CellPlasma, SpectrumSetup};

    #[test]
    fn test_default_sightlines() {
        let lines = DefaultSightlines.sightlines();
        assert_eq!(lines.len(), DEFAULT_INCLINATIONS.len());
        assert_eq!(lines[0].name, "A00P0.50");
        assert_eq!(lines[1].name, "A10P0.50");
        assert_eq!(lines[7].name, "A90P0.50");
        for line in &lines {
            assert!((line.direction.length() - 1.0).abs() < 1e-12);
        }
        // Pole-on observer looks down the z axis
        assert!((lines[0].direction.dz - 1.0).abs() < 1e-12);
        // Edge-on observer at phase 0.5 sits on the -x axis
        assert!((lines[7].direction.dx + 1.0).abs() < 1e-12);
        assert!(lines[7].direction.dz.abs() < 1e-12);
    }

    #[test]
    fn test_sightline_new() {
        let line = SightLine::new("x", Vector::new(2.0, 0.0, 0.0)).unwrap();
        assert_eq!(line.direction, Vector::new(1.0, 0.0, 0.0));
        assert!(SightLine::new("zero", Vector::zero()).is_none());
    }

    #[test]
    fn test_model_observers() {
        let grid = CartesianGrid::uniform(Point::origin(), [1.0; 3], [1, 1, 1], CellPlasma::default())
            .unwrap();
        let model = Model::new("m", 0.0, vec![grid]);
        assert_eq!(model.sightlines().len(), DEFAULT_INCLINATIONS.len());

        let model = model.with_spectrum(SpectrumSetup {
            wavelength_min: 1000.0,
            wavelength_max: 2000.0,
            observers: vec![Observer::new(20.0, 0.0), Observer::new(70.0, 0.25)],
        });
        let lines = model.sightlines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].name, "A70P0.25");
    }
}
