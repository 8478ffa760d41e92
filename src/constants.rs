//! Physical constants in CGS units.

/// Speed of light (cm/s)
pub const VLIGHT: f64 = 2.997_924_58e10;

/// Planck constant (erg s)
pub const H: f64 = 6.626_070_15e-27;

/// Boltzmann constant (erg/K)
pub const BOLTZMANN: f64 = 1.380_649e-16;

/// One electron volt (erg)
pub const EV2ERGS: f64 = 1.602_176_634e-12;

/// Planck constant in eV s, so that `energy_ev / HEV` is a frequency in Hz.
pub const HEV: f64 = H / EV2ERGS;

/// One Angstrom (cm)
pub const ANGSTROM: f64 = 1.0e-8;

/// Thomson cross-section (cm^2)
pub const THOMSON: f64 = 6.652_458_732e-25;


/// Converts a photon energy in eV to a frequency in Hz.
pub fn ev_to_freq(energy_ev: f64) -> f64 {
    energy_ev / HEV
}

/// Converts a wavelength in Angstrom to a frequency in Hz.
pub fn angstrom_to_freq(wavelength: f64) -> f64 {
    VLIGHT / (wavelength * ANGSTROM)
}

/// Converts a frequency in Hz to a wavelength in Angstrom.
pub fn freq_to_angstrom(freq: f64) -> f64 {
    VLIGHT / freq / ANGSTROM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lyman_edge_frequency() {
        // 13.6 eV is ~3.29e15 Hz
        let nu = ev_to_freq(13.598);
        assert!((nu - 3.288e15).abs() / 3.288e15 < 1e-3);
    }

    #[test]
    fn test_wavelength_conversion() {
        let nu = angstrom_to_freq(5000.0);
        assert!((freq_to_angstrom(nu) - 5000.0).abs() < 1e-9);
        assert!((nu - 5.9958e14).abs() / 5.9958e14 < 1e-4);
    }
}
