use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::BandError;

/// Band boundaries and minimum fractions supplied by the user.
///
/// Energies are in eV. `boundaries_ev` holds the internal boundaries only, so
/// it must have one entry fewer than `min_fractions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBands {
    /// Lowest photon energy to be considered (eV).
    pub energy_min_ev: f64,
    /// Highest photon energy to be considered (eV).
    pub energy_max_ev: f64,
    /// Internal band boundaries in increasing eV.
    #[serde(default)]
    pub boundaries_ev: Vec<f64>,
    /// Minimum fraction of photons in each band. Must sum to <= 1.
    pub min_fractions: Vec<f64>,
}

impl UserBands {
    pub fn new(
        energy_min_ev: f64,
        energy_max_ev: f64,
        boundaries_ev: Vec<f64>,
        min_fractions: Vec<f64>,
    ) -> Self {
        Self {
            energy_min_ev,
            energy_max_ev,
            boundaries_ev,
            min_fractions,
        }
    }

    pub fn nbands(&self) -> usize {
        self.min_fractions.len()
    }
}

/// How the frequency bands are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandMode {
    /// Single band set by a temperature.
    Temperature,
    /// Single band spanning the global frequency limits.
    FrequencyRange,
    /// Four bands tuned for a hot (~1e5 K) accretion disk.
    Cv,
    /// Four bands tuned for young stellar objects.
    Yso,
    /// Arbitrary bands described by the user.
    UserDefined(UserBands),
}

impl BandMode {
    /// Maps the numeric sampling selector (0=T, 1=(f1,f2), 2=cv, 3=yso,
    /// 4=user defined) onto a mode.
    pub fn from_selector(selector: i32, user: Option<UserBands>) -> Result<Self, BandError> {
        match selector {
            0 => Ok(Self::Temperature),
            1 => Ok(Self::FrequencyRange),
            2 => Ok(Self::Cv),
            3 => Ok(Self::Yso),
            4 => user
                .map(Self::UserDefined)
                .ok_or(BandError::MissingUserBands),
            other => Err(BandError::UnknownMode(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Temperature => "t",
            Self::FrequencyRange => "range",
            Self::Cv => "cv",
            Self::Yso => "yso",
            Self::UserDefined(_) => "user",
        }
    }
}

impl FromStr for BandMode {
    type Err = BandError;

    /// Parses the named modes. `user` cannot be parsed because it needs a
    /// band description; use [`BandMode::UserDefined`] directly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t" | "temperature" => Ok(Self::Temperature),
            "range" | "f1f2" => Ok(Self::FrequencyRange),
            "cv" => Ok(Self::Cv),
            "yso" => Ok(Self::Yso),
            "user" | "user_defined" => Err(BandError::MissingUserBands),
            other => Err(BandError::UnknownMode(other.to_string())),
        }
    }
}
