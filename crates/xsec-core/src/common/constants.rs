//! Physical constants and unit conversions used at formula boundaries.
//!
//! Spectra are exchanged in nm; the cross-section formulas work in cm, eV
//! and seconds. CODATA 2018 values.

/// Planck constant times speed of light [eV cm].
pub const HC_EV_CM: f64 = 1.239_841_984e-4;
/// Boltzmann constant [eV/K].
pub const BOLTZMANN_EV_PER_K: f64 = 8.617_333_262e-5;
/// Speed of light [cm/s].
pub const SPEED_OF_LIGHT_CM_PER_S: f64 = 2.997_924_58e10;

pub const NM_TO_CM: f64 = 1.0e-7;
pub const M_TO_CM: f64 = 1.0e2;
pub const M_TO_NM: f64 = 1.0e9;
pub const MM_TO_CM: f64 = 1.0e-1;
pub const PER_M3_TO_PER_CM3: f64 = 1.0e-6;
/// Wavenumber of a wavelength given in metres, in cm⁻¹ (`1e-2 / λ`).
pub const PER_M_TO_PER_CM: f64 = 1.0e-2;

/// Room-temperature `kT` [eV] assumed when a material record has no temperature.
pub const DEFAULT_THERMAL_ENERGY_EV: f64 = 0.025_266;
/// Temperature [K] matching [`DEFAULT_THERMAL_ENERGY_EV`], about 293.2 K.
pub const DEFAULT_TEMPERATURE_K: f64 = DEFAULT_THERMAL_ENERGY_EV / BOLTZMANN_EV_PER_K;
pub const DEFAULT_SUBLEVEL_DEGENERACY: f64 = 2.0;
/// Half width of the McCumber/Füchtbauer handover around the ZPL [nm].
pub const DEFAULT_BLEND_HALF_WIDTH_NM: f64 = 10.0;

pub const fn nm_to_cm(wavelength_nm: f64) -> f64 {
    wavelength_nm * NM_TO_CM
}

/// Photon energy [eV] of a wavelength in nm.
pub fn photon_energy_ev(wavelength_nm: f64) -> f64 {
    HC_EV_CM / nm_to_cm(wavelength_nm)
}

/// Thermal energy `kT` [eV].
pub const fn thermal_energy_ev(temperature_k: f64) -> f64 {
    BOLTZMANN_EV_PER_K * temperature_k
}
