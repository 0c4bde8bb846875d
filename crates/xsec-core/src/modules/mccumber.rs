//! McCumber reciprocity between absorption and emission cross sections.
//!
//! σe(λ) = (Z_l / Z_u) · exp[(E_zpl − hc/λ) / kT] · σa(λ), and the exact
//! inverse. Sublevel energies arrive in cm⁻¹ and are converted to eV with
//! `hc`; each manifold is referenced to its own lowest sublevel.

use crate::common::constants::{HC_EV_CM, nm_to_cm, thermal_energy_ev};
use crate::common::{ManifoldLevels, MaterialParameters};
use crate::domain::{CrossSectionPair, Spectrum, XsecError, XsecResult};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McCumberConverter {
    z_lower: f64,
    z_upper: f64,
    zero_phonon_ev: f64,
    kt_ev: f64,
}

impl McCumberConverter {
    pub fn new(
        lower: &ManifoldLevels,
        upper: &ManifoldLevels,
        temperature_k: f64,
    ) -> XsecResult<Self> {
        if !temperature_k.is_finite() || temperature_k <= 0.0 {
            return Err(XsecError::configuration(
                "CONFIG.OUT_OF_RANGE",
                format!("temperature must be finite and > 0, got {}", temperature_k),
            ));
        }
        let kt_ev = thermal_energy_ev(temperature_k);
        let lower_ev = levels_ev(lower);
        let upper_ev = levels_ev(upper);
        let zero_phonon_ev = upper_ev[0] - lower_ev[0];

        let z_lower =
            partition_function(&relative_to_first(&lower_ev), lower.degeneracies(), kt_ev);
        let z_upper =
            partition_function(&relative_to_first(&upper_ev), upper.degeneracies(), kt_ev);
        if !(z_lower.is_finite() && z_upper.is_finite() && z_lower > 0.0 && z_upper > 0.0) {
            return Err(XsecError::numerical(
                "NUMERIC.PARTITION_FUNCTION",
                format!(
                    "partition functions must be finite and positive, got Z_lower={}, Z_upper={}",
                    z_lower, z_upper
                ),
            ));
        }

        debug!(
            z_lower,
            z_upper,
            zero_phonon_ev,
            kt_ev,
            "McCumber partition functions"
        );
        Ok(Self {
            z_lower,
            z_upper,
            zero_phonon_ev,
            kt_ev,
        })
    }

    pub fn from_material(material: &MaterialParameters) -> XsecResult<Self> {
        Self::new(
            material.lower_manifold(),
            material.upper_manifold(),
            material.temperature_k(),
        )
    }

    /// `(Z_lower, Z_upper)`.
    pub fn partition_functions(&self) -> (f64, f64) {
        (self.z_lower, self.z_upper)
    }

    pub fn zero_phonon_energy_ev(&self) -> f64 {
        self.zero_phonon_ev
    }

    pub fn thermal_energy_ev(&self) -> f64 {
        self.kt_ev
    }

    /// σe/σa at `wavelength_nm`.
    pub fn emission_to_absorption_ratio(&self, wavelength_nm: f64) -> f64 {
        let photon_ev = HC_EV_CM / nm_to_cm(wavelength_nm);
        self.z_lower / self.z_upper * ((self.zero_phonon_ev - photon_ev) / self.kt_ev).exp()
    }

    /// Absorption → emission, or emission → absorption when `inverse`.
    pub fn convert(&self, spectrum: &Spectrum, inverse: bool) -> XsecResult<Spectrum> {
        if let Some((start, _)) = spectrum.domain()
            && start <= 0.0
        {
            return Err(XsecError::domain(
                "DOMAIN.WAVELENGTH",
                format!("McCumber relation needs positive wavelengths, got {} nm", start),
            ));
        }

        let converted = spectrum.map_values(|wavelength, value| {
            let ratio = self.emission_to_absorption_ratio(wavelength);
            if inverse { value / ratio } else { value * ratio }
        });
        if let Some((index, value)) = converted.first_non_finite() {
            return Err(XsecError::numerical(
                "NUMERIC.MCCUMBER_OVERFLOW",
                format!(
                    "McCumber {} is not finite at {:.3} nm: {}",
                    if inverse { "absorption" } else { "emission" },
                    converted.wavelengths()[index],
                    value
                ),
            ));
        }
        Ok(converted)
    }
}

/// Σ gᵢ·exp(−Eᵢ/kT) over one manifold.
pub fn partition_function(energies_ev: &[f64], degeneracies: &[f64], kt_ev: f64) -> f64 {
    energies_ev
        .iter()
        .zip(degeneracies)
        .map(|(energy, degeneracy)| degeneracy * (-energy / kt_ev).exp())
        .sum()
}

/// Inversion fraction β = σa / (σa + σe) at which the medium is transparent.
///
/// Wavelengths where both cross sections vanish get β = 0.
pub fn beta_equilibrium(pair: &CrossSectionPair) -> XsecResult<Spectrum> {
    let values = pair
        .absorption()
        .values()
        .iter()
        .zip(pair.emission().values())
        .map(|(absorption, emission)| {
            let total = absorption + emission;
            if total == 0.0 { 0.0 } else { absorption / total }
        })
        .collect();
    Ok(pair.absorption().with_values(values)?)
}

/// Net gain cross section β·σe − (1 − β)·σa at inversion `beta`.
pub fn gain_cross_section(pair: &CrossSectionPair, beta: f64) -> XsecResult<Spectrum> {
    if !(0.0..=1.0).contains(&beta) {
        return Err(XsecError::configuration(
            "CONFIG.OUT_OF_RANGE",
            format!("inversion fraction must lie in [0, 1], got {}", beta),
        ));
    }
    let values = pair
        .absorption()
        .values()
        .iter()
        .zip(pair.emission().values())
        .map(|(absorption, emission)| beta * emission - (1.0 - beta) * absorption)
        .collect();
    Ok(pair.absorption().with_values(values)?)
}

fn levels_ev(levels: &ManifoldLevels) -> Vec<f64> {
    levels
        .energies_per_cm()
        .iter()
        .map(|energy| energy * HC_EV_CM)
        .collect()
}

fn relative_to_first(energies: &[f64]) -> Vec<f64> {
    let first = energies.first().copied().unwrap_or(0.0);
    energies.iter().map(|energy| energy - first).collect()
}
