//! Frequency bands for stratified photon sampling.
//!
//! Pure luminosity-weighted sampling starves rare, high-energy photons. The
//! emitted spectrum is therefore split into contiguous bands, each of which is
//! guaranteed a minimum share of the photon budget. The band table is built
//! once per run and handed by value to whatever generates photons.

mod mode;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::{BOLTZMANN, H, HEV, ev_to_freq};

pub use mode::{BandMode, UserBands};

/// Maximum number of bands a table can hold.
pub const MAX_BANDS: usize = 10;

/// Internal edges (eV) and minimum fractions of the accretion-disk bands.
const CV_EDGES_EV: [f64; 3] = [13.599, 24.588, 54.418];
const CV_MIN_FRACTIONS: [f64; 4] = [0.0, 0.1, 0.1, 0.1];

/// Internal edges (eV) and minimum fractions of the young-stellar-object bands.
const YSO_EDGES_EV: [f64; 3] = [1.511, 3.3998, 6.0];
const YSO_MIN_FRACTIONS: [f64; 4] = [0.0, 0.1, 0.2, 0.2];

/// Tolerance on the sum of minimum fractions.
const FRACTION_TOL: f64 = 1e-12;

#[derive(Debug, Error, PartialEq)]
pub enum BandError {
    #[error("unknown band sampling mode `{0}`")]
    UnknownMode(String),
    #[error("user-defined band mode requires a band description")]
    MissingUserBands,
    #[error("temperature must be positive and finite, got {0:e}")]
    InvalidTemperature(f64),
    #[error("invalid frequency range [{f1:e}, {f2:e}]")]
    InvalidRange { f1: f64, f2: f64 },
    #[error("f1 ({f1:e}) lies above the first band edge ({edge:e})")]
    LowerBoundAboveEdge { f1: f64, edge: f64 },
    #[error("f2 ({f2:e}) lies below the last band edge ({edge:e})")]
    UpperBoundBelowEdge { f2: f64, edge: f64 },
    #[error("at least one band is required")]
    NoBands,
    #[error("{requested} bands requested, at most {max} are supported")]
    TooManyBands { requested: usize, max: usize },
    #[error("{nbands} bands need {expected} internal boundaries, got {got}")]
    BoundaryCountMismatch {
        nbands: usize,
        expected: usize,
        got: usize,
    },
    #[error("band boundary {index} ({value} eV) is not strictly increasing within the energy range")]
    NonMonotonicBoundary { index: usize, value: f64 },
    #[error("minimum fraction {value} of band {index} is outside [0, 1]")]
    MinFractionOutOfRange { index: usize, value: f64 },
    #[error("minimum fractions sum to {0}, which exceeds 1")]
    MinFractionSum(f64),
    #[error("band {index} does not start where the previous band ends")]
    NonContiguous { index: usize },
}

/// One contiguous frequency interval.
///
/// Only `f1`, `f2` and `min_fraction` are set when the table is built. The
/// remaining fields belong to the photon generation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Lower frequency bound (Hz).
    pub f1: f64,
    /// Upper frequency bound (Hz).
    pub f2: f64,
    /// Minimum share of the photon budget guaranteed to this band.
    pub min_fraction: f64,
    /// Share of the intrinsic luminosity falling in the band.
    pub nat_fraction: f64,
    /// Share of photons actually sampled in the band.
    pub used_fraction: f64,
    /// Luminosity within the band.
    pub flux: f64,
    /// Statistical weight per photon.
    pub weight: f64,
    /// Number of photons allotted to the band.
    pub nphot: usize,
}

impl Band {
    fn new(f1: f64, f2: f64, min_fraction: f64) -> Self {
        Self {
            f1,
            f2,
            min_fraction,
            ..Default::default()
        }
    }

    /// Half-open containment test, `f1 <= freq < f2`.
    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.f1 && freq < self.f2
    }
}

/// Ordered, contiguous set of bands.
///
/// Deserialized tables go through the same checks as built ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBandTable")]
pub struct BandTable {
    bands: Vec<Band>,
}

#[derive(Deserialize)]
struct RawBandTable {
    bands: Vec<Band>,
}

impl TryFrom<RawBandTable> for BandTable {
    type Error = BandError;

    fn try_from(raw: RawBandTable) -> Result<Self, Self::Error> {
        check_table(&raw.bands)?;
        Ok(Self { bands: raw.bands })
    }
}

impl BandTable {
    /// Builds the bands for `mode`.
    ///
    /// - `t`: temperature (K), only used by [`BandMode::Temperature`]
    /// - `f1`, `f2`: global frequency limits (Hz); ignored by the temperature
    ///   and user-defined modes
    pub fn new(mode: &BandMode, t: f64, f1: f64, f2: f64) -> Result<Self, BandError> {
        let bands = match mode {
            BandMode::Temperature => {
                if !(t.is_finite() && t > 0.0) {
                    return Err(BandError::InvalidTemperature(t));
                }
                let kt_h = BOLTZMANN * t / H;
                vec![Band::new(0.05 * kt_h, 20.0 * kt_h, 1.0)]
            }
            BandMode::FrequencyRange => {
                check_range(f1, f2)?;
                vec![Band::new(f1, f2, 1.0)]
            }
            BandMode::Cv => tuned_bands(f1, f2, &CV_EDGES_EV, &CV_MIN_FRACTIONS)?,
            BandMode::Yso => tuned_bands(f1, f2, &YSO_EDGES_EV, &YSO_MIN_FRACTIONS)?,
            BandMode::UserDefined(user) => user_bands(user)?,
        };
        check_table(&bands)?;

        let table = Self { bands };
        info!(
            mode = mode.name(),
            nbands = table.nbands(),
            "Frequency bands initialised"
        );
        for (i, band) in table.bands.iter().enumerate() {
            debug!(
                "For band {}, f1={:10.3e}, f2={:10.3e}, frac={:.2}",
                i, band.f1, band.f2, band.min_fraction
            );
        }
        Ok(table)
    }

    pub fn nbands(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band(&self, i: usize) -> Option<&Band> {
        self.bands.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Band> {
        self.bands.iter()
    }

    /// Lowest frequency covered by the table.
    pub fn f_min(&self) -> Option<f64> {
        self.bands.first().map(|b| b.f1)
    }

    /// Highest frequency covered by the table.
    pub fn f_max(&self) -> Option<f64> {
        self.bands.last().map(|b| b.f2)
    }

    pub fn total_min_fraction(&self) -> f64 {
        self.bands.iter().map(|b| b.min_fraction).sum()
    }

    /// Index of the band containing `freq`. The top edge of the last band
    /// belongs to the last band.
    pub fn locate(&self, freq: f64) -> Option<usize> {
        if let Some(i) = self.bands.iter().position(|b| b.contains(freq)) {
            return Some(i);
        }
        match self.bands.last() {
            Some(last) if freq == last.f2 => Some(self.bands.len() - 1),
            _ => None,
        }
    }
}

impl<'a> IntoIterator for &'a BandTable {
    type Item = &'a Band;
    type IntoIter = std::slice::Iter<'a, Band>;

    fn into_iter(self) -> Self::IntoIter {
        self.bands.iter()
    }
}

fn check_range(f1: f64, f2: f64) -> Result<(), BandError> {
    if f1.is_finite() && f2.is_finite() && f1 >= 0.0 && f1 < f2 {
        Ok(())
    } else {
        Err(BandError::InvalidRange { f1, f2 })
    }
}

/// Size, ordering, contiguity and minimum fractions of a finished table.
fn check_table(bands: &[Band]) -> Result<(), BandError> {
    if bands.is_empty() {
        return Err(BandError::NoBands);
    }
    if bands.len() > MAX_BANDS {
        return Err(BandError::TooManyBands {
            requested: bands.len(),
            max: MAX_BANDS,
        });
    }
    for band in bands {
        let (f1, f2) = (band.f1, band.f2);
        if !(f1.is_finite() && f2.is_finite() && f1 >= 0.0 && f1 <= f2) {
            return Err(BandError::InvalidRange { f1, f2 });
        }
    }
    for (i, pair) in bands.windows(2).enumerate() {
        if pair[0].f2 != pair[1].f1 {
            return Err(BandError::NonContiguous { index: i + 1 });
        }
    }
    for (index, band) in bands.iter().enumerate() {
        if !(0.0..=1.0).contains(&band.min_fraction) {
            return Err(BandError::MinFractionOutOfRange {
                index,
                value: band.min_fraction,
            });
        }
    }
    let total: f64 = bands.iter().map(|b| b.min_fraction).sum();
    if total > 1.0 + FRACTION_TOL {
        return Err(BandError::MinFractionSum(total));
    }
    Ok(())
}

/// Four bands with three fixed internal edges between `f1` and `f2`.
///
/// The requested global range must contain the tuned edges.
fn tuned_bands(
    f1: f64,
    f2: f64,
    edges_ev: &[f64; 3],
    min_fractions: &[f64; 4],
) -> Result<Vec<Band>, BandError> {
    let edges = edges_ev.map(|e| e / HEV);

    if !(f1.is_finite() && f2.is_finite()) {
        return Err(BandError::InvalidRange { f1, f2 });
    }
    if f1 > edges[0] {
        return Err(BandError::LowerBoundAboveEdge { f1, edge: edges[0] });
    }
    if f2 < edges[2] {
        return Err(BandError::UpperBoundBelowEdge { f2, edge: edges[2] });
    }

    let bounds = [f1, edges[0], edges[1], edges[2], f2];
    Ok(bounds
        .windows(2)
        .zip(min_fractions)
        .map(|(w, &frac)| Band::new(w[0], w[1], frac))
        .collect())
}

fn user_bands(user: &UserBands) -> Result<Vec<Band>, BandError> {
    let nbands = user.nbands();
    if nbands == 0 {
        return Err(BandError::NoBands);
    }
    if nbands > MAX_BANDS {
        return Err(BandError::TooManyBands {
            requested: nbands,
            max: MAX_BANDS,
        });
    }
    if user.boundaries_ev.len() != nbands - 1 {
        return Err(BandError::BoundaryCountMismatch {
            nbands,
            expected: nbands - 1,
            got: user.boundaries_ev.len(),
        });
    }

    let f1 = ev_to_freq(user.energy_min_ev);
    let f2 = ev_to_freq(user.energy_max_ev);
    check_range(f1, f2)?;

    // Boundaries must increase strictly from the lower to the upper limit
    let mut previous = user.energy_min_ev;
    for (index, &value) in user.boundaries_ev.iter().enumerate() {
        if !(value.is_finite() && value > previous && value < user.energy_max_ev) {
            return Err(BandError::NonMonotonicBoundary { index, value });
        }
        previous = value;
    }

    for (index, &value) in user.min_fractions.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(BandError::MinFractionOutOfRange { index, value });
        }
    }
    let total: f64 = user.min_fractions.iter().sum();
    if total > 1.0 + FRACTION_TOL {
        return Err(BandError::MinFractionSum(total));
    }

    let mut bounds = Vec::with_capacity(nbands + 1);
    bounds.push(f1);
    bounds.extend(user.boundaries_ev.iter().map(|&e| ev_to_freq(e)));
    bounds.push(f2);

    Ok(bounds
        .windows(2)
        .zip(&user.min_fractions)
        .map(|(w, &frac)| Band::new(w[0], w[1], frac))
        .collect())
}
