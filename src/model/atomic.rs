use serde::{Deserialize, Serialize};

use crate::constants::ev_to_freq;

/// An ion with a single ground-state photoionization edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ion {
    pub name: String,
    /// Atomic number.
    pub z: u32,
    /// Ionization state (1 = neutral).
    pub istate: u32,
    /// Threshold frequency of the edge (Hz).
    pub threshold: f64,
    /// Cross-section at threshold (cm^2).
    pub sigma0: f64,
}

impl Ion {
    pub fn new(name: &str, z: u32, istate: u32, threshold_ev: f64, sigma0: f64) -> Self {
        Self {
            name: name.to_string(),
            z,
            istate,
            threshold: ev_to_freq(threshold_ev),
            sigma0,
        }
    }

    /// Photoionization cross-section (cm^2) at `freq`.
    ///
    /// Hydrogenic approximation: `sigma0 * (freq / threshold)^-3` above the
    /// edge, zero below it.
    pub fn cross_section(&self, freq: f64) -> f64 {
        if freq < self.threshold {
            return 0.0;
        }
        let x = self.threshold / freq;
        self.sigma0 * x * x * x
    }
}

/// Ions available to the opacity calculation.
///
/// The order of `ions` defines the ion numbers used by per-cell densities and
/// by the single-ion column mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicData {
    pub ions: Vec<Ion>,
}

impl AtomicData {
    pub fn new(ions: Vec<Ion>) -> Self {
        Self { ions }
    }

    pub fn nions(&self) -> usize {
        self.ions.len()
    }

    pub fn ion(&self, n: usize) -> Option<&Ion> {
        self.ions.get(n)
    }
}

impl Default for AtomicData {
    /// H I, He I and He II ground-state edges.
    fn default() -> Self {
        Self::new(vec![
            Ion::new("H I", 1, 1, 13.598, 6.30e-18),
            Ion::new("He I", 2, 1, 24.587, 7.42e-18),
            Ion::new("He II", 2, 2, 54.418, 1.58e-18),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_section_edge() {
        let h = Ion::new("H I", 1, 1, 13.598, 6.30e-18);
        assert_eq!(h.cross_section(h.threshold * 0.999), 0.0);
        assert_eq!(h.cross_section(h.threshold), 6.30e-18);
        let sigma = h.cross_section(2.0 * h.threshold);
        assert!((sigma - 6.30e-18 / 8.0).abs() < 1e-30);
    }

    #[test]
    fn test_default_table() {
        let atomic = AtomicData::default();
        assert_eq!(atomic.nions(), 3);
        assert_eq!(atomic.ion(2).unwrap().name, "He II");
        assert!(atomic.ion(3).is_none());
    }
}
