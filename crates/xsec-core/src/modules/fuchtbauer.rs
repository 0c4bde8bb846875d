//! Füchtbauer-Ladenburg emission cross section from a fluorescence lineshape.

use crate::common::MaterialParameters;
use crate::common::constants::{SPEED_OF_LIGHT_CM_PER_S, nm_to_cm};
use crate::domain::{Extrapolation, Spectrum, XsecError, XsecResult};
use crate::numerics::special::integrate_simpson;
use std::f64::consts::PI;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuchtbauerLadenburg {
    refractive_index: f64,
    lifetime_s: f64,
    doping_per_cm3: f64,
    depth_cm: f64,
}

impl FuchtbauerLadenburg {
    pub fn new(
        refractive_index: f64,
        lifetime_s: f64,
        doping_per_cm3: f64,
        depth_cm: f64,
    ) -> XsecResult<Self> {
        for (field, value) in [("n", refractive_index), ("tau_f", lifetime_s)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(XsecError::configuration(
                    "CONFIG.OUT_OF_RANGE",
                    format!("'{}' must be finite and > 0, got {}", field, value),
                ));
            }
        }
        for (field, value) in [("N_dop", doping_per_cm3), ("absorption_depth", depth_cm)] {
            if !value.is_finite() || value < 0.0 {
                return Err(XsecError::configuration(
                    "CONFIG.OUT_OF_RANGE",
                    format!("'{}' must be finite and >= 0, got {}", field, value),
                ));
            }
        }

        Ok(Self {
            refractive_index,
            lifetime_s,
            doping_per_cm3,
            depth_cm,
        })
    }

    /// Material constants with the reabsorption depth taken from the record
    /// unless `depth_override_mm` is given.
    pub fn from_material(
        material: &MaterialParameters,
        depth_override_mm: Option<f64>,
    ) -> XsecResult<Self> {
        let material = match depth_override_mm {
            Some(depth_mm) => material.with_absorption_depth_mm(depth_mm)?,
            None => material.clone(),
        };
        Self::new(
            material.refractive_index(),
            material.lifetime_s(),
            material.doping_per_cm3(),
            material.absorption_depth_cm(),
        )
    }

    pub fn depth_cm(&self) -> f64 {
        self.depth_cm
    }

    /// A(λ) = exp(N · σa(λ) · depth) on the lineshape grid; σa is zero
    /// outside its own domain and A ≡ 1 without an absorption curve.
    pub fn reabsorption(
        &self,
        lineshape: &Spectrum,
        sigma_a: Option<&Spectrum>,
    ) -> XsecResult<Spectrum> {
        let Some(sigma_a) = sigma_a.filter(|sigma_a| !sigma_a.is_empty()) else {
            return Ok(lineshape.map_values(|_, _| 1.0));
        };
        let sigma_on_grid = sigma_a.resample_onto(lineshape.wavelengths(), Extrapolation::Zero)?;
        Ok(sigma_on_grid
            .map_values(|_, sigma| (self.doping_per_cm3 * sigma * self.depth_cm).exp()))
    }

    /// σe(λ) = λ² / (8π n² τ) · λ³/c · I·A / ∫ I·λ·A dλ, with λ in cm.
    pub fn emission(
        &self,
        lineshape: &Spectrum,
        sigma_a: Option<&Spectrum>,
    ) -> XsecResult<Spectrum> {
        if lineshape.len() < 2 {
            return Err(XsecError::load(
                "LOAD.CHANNEL_EMPTY",
                format!(
                    "Füchtbauer-Ladenburg needs at least two lineshape samples, got {}",
                    lineshape.len()
                ),
            ));
        }

        let correction = self.reabsorption(lineshape, sigma_a)?;
        let wavelengths_cm: Vec<f64> = lineshape
            .wavelengths()
            .iter()
            .copied()
            .map(nm_to_cm)
            .collect();
        let weighted: Vec<f64> = lineshape
            .values()
            .iter()
            .zip(correction.values())
            .map(|(intensity, correction)| intensity * correction)
            .collect();
        let integrand: Vec<f64> = weighted
            .iter()
            .zip(&wavelengths_cm)
            .map(|(weighted, wavelength)| weighted * wavelength)
            .collect();

        let integral = integrate_simpson(&wavelengths_cm, &integrand).map_err(|error| {
            XsecError::numerical(
                "NUMERIC.FL_INTEGRAL",
                format!("lineshape integral failed: {}", error),
            )
        })?;
        if integral == 0.0 || !integral.is_finite() {
            return Err(XsecError::numerical(
                "NUMERIC.FL_INTEGRAL",
                format!(
                    "lineshape integral must be finite and non-zero, got {}",
                    integral
                ),
            ));
        }

        let prefactor = 1.0
            / (8.0
                * PI
                * self.refractive_index.powi(2)
                * self.lifetime_s
                * SPEED_OF_LIGHT_CM_PER_S
                * integral);
        let values = wavelengths_cm
            .iter()
            .zip(&weighted)
            .map(|(wavelength, weighted)| prefactor * wavelength.powi(5) * weighted)
            .collect();
        let sigma_e = lineshape.with_values(values)?;
        debug!(
            integral,
            depth_cm = self.depth_cm,
            corrected = sigma_a.is_some(),
            peak = ?sigma_e.peak(),
            "Füchtbauer-Ladenburg emission derived"
        );
        Ok(sigma_e)
    }
}

#[cfg(test)]
mod tests {
    use super::FuchtbauerLadenburg;
    use crate::common::constants::SPEED_OF_LIGHT_CM_PER_S;
    use crate::domain::{Spectrum, XsecErrorCategory};
    use std::f64::consts::PI;

    fn lineshape() -> Spectrum {
        let wavelengths: Vec<f64> = (0..=400).map(|index| 980.0 + 0.25 * index as f64).collect();
        let values: Vec<f64> = wavelengths
            .iter()
            .map(|x| (-0.5 * ((x - 1030.0) / 5.0).powi(2)).exp())
            .collect();
        Spectrum::new(wavelengths, values)
            .expect("lineshape")
            .normalize_total()
            .expect("normalize")
    }

    #[test]
    fn emission_integrates_to_the_radiative_rate() {
        // ∫ σe c / (λ⁴) 8π n² dλ = 1/τ holds for the uncorrected relation
        let calculator = FuchtbauerLadenburg::new(1.82, 9.5e-4, 1.0e20, 0.0).expect("calculator");
        let sigma_e = calculator.emission(&lineshape(), None).expect("emission");

        let peak = sigma_e.peak().expect("peak");
        assert!((peak.0 - 1030.0).abs() <= 1.0);
        assert!(peak.1 > 1.0e-21 && peak.1 < 1.0e-18, "peak {:e}", peak.1);

        let rate: f64 = sigma_e
            .pairs()
            .collect::<Vec<_>>()
            .windows(2)
            .map(|pair| {
                let term = |(x, s): (f64, f64)| {
                    let x = x * 1.0e-7;
                    8.0 * PI * 1.82_f64.powi(2) * SPEED_OF_LIGHT_CM_PER_S * s / x.powi(4)
                };
                0.5 * (term(pair[0]) + term(pair[1])) * (pair[1].0 - pair[0].0) * 1.0e-7
            })
            .sum();
        assert!((rate * 9.5e-4 - 1.0).abs() <= 1.0e-3, "rate*tau = {}", rate * 9.5e-4);
    }

    #[test]
    fn reabsorption_is_unity_without_absorption_or_depth() {
        let shape = lineshape();
        let calculator = FuchtbauerLadenburg::new(1.5, 1.0e-3, 1.0e20, 0.0).expect("calculator");
        let sigma_a = shape.map_values(|_, _| 1.0e-20);

        let plain = calculator.reabsorption(&shape, None).expect("plain");
        let zero_depth = calculator.reabsorption(&shape, Some(&sigma_a)).expect("zero depth");
        assert!(plain.values().iter().all(|value| *value == 1.0));
        assert!(zero_depth.values().iter().all(|value| *value == 1.0));
    }

    #[test]
    fn reabsorption_uses_zero_outside_the_absorption_domain() {
        let shape = lineshape();
        let calculator = FuchtbauerLadenburg::new(1.5, 1.0e-3, 1.0e20, 0.1).expect("calculator");
        let sigma_a =
            Spectrum::from_pairs(&[(1000.0, 2.0e-20), (1020.0, 2.0e-20)]).expect("sigma_a");

        let correction = calculator.reabsorption(&shape, Some(&sigma_a)).expect("correction");
        let inside = correction.nearest_index(1010.0).expect("inside");
        let outside = correction.nearest_index(1050.0).expect("outside");
        assert!((correction.values()[inside] - (0.2_f64).exp()).abs() <= 1.0e-12);
        assert_eq!(correction.values()[outside], 1.0);
    }

    #[test]
    fn corrected_emission_is_boosted_where_absorption_is_strong() {
        let shape = lineshape();
        let calculator = FuchtbauerLadenburg::new(1.82, 9.5e-4, 1.0e20, 0.05).expect("calculator");
        let sigma_a = Spectrum::from_pairs(&[(980.0, 5.0e-20), (1030.0, 0.0), (1080.0, 0.0)])
            .expect("sigma_a");

        let plain = calculator.emission(&shape, None).expect("plain");
        let corrected = calculator.emission(&shape, Some(&sigma_a)).expect("corrected");
        let blue = shape.nearest_index(1015.0).expect("blue");
        let red = shape.nearest_index(1045.0).expect("red");
        let boost = |index: usize| corrected.values()[index] / plain.values()[index];
        assert!(boost(blue) > boost(red));
    }

    #[test]
    fn zero_lineshape_is_a_numerical_error() {
        let shape = Spectrum::new(vec![1000.0, 1001.0, 1002.0], vec![0.0; 3]).expect("shape");
        let calculator = FuchtbauerLadenburg::new(1.5, 1.0e-3, 1.0e20, 0.0).expect("calculator");
        let error = calculator.emission(&shape, None).expect_err("zero integral");
        assert_eq!(error.category(), XsecErrorCategory::NumericalError);
        assert_eq!(error.placeholder(), "NUMERIC.FL_INTEGRAL");
    }

    #[test]
    fn invalid_lifetime_is_rejected() {
        let error = FuchtbauerLadenburg::new(1.5, 0.0, 1.0e20, 0.0).expect_err("zero lifetime");
        assert_eq!(error.category(), XsecErrorCategory::ConfigurationError);
    }
}
