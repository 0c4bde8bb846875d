//! Absorption cross section from calibrated absorption and reference curves.

use super::baseline::{BaselineCalibrator, CalibrationStrategy};
use super::filters::{FrequencyBandFilter, PolynomialSmoother};
use super::traits::SpectralTransform;
use crate::common::{CalibrationWindow, MaterialParameters, ProcessingParameters};
use crate::domain::{Extrapolation, PipelineStage, Spectrum, XsecError, XsecResult};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsorptionSettings {
    pub filter_width: f64,
    pub savgol_window: usize,
    pub savgol_order: usize,
    pub doping_per_cm3: f64,
    pub length_cm: f64,
    pub calibration: CalibrationWindow,
}

impl AbsorptionSettings {
    pub fn from_parameters(
        material: &MaterialParameters,
        processing: &ProcessingParameters,
    ) -> Self {
        Self {
            filter_width: processing.absorption_filter_width,
            savgol_window: processing.savgol_window,
            savgol_order: processing.savgol_order,
            doping_per_cm3: material.doping_per_cm3(),
            length_cm: material.length_cm(),
            calibration: material.calibration(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbsorptionResult {
    /// σa [cm²].
    pub sigma_a: Spectrum,
    /// Trimmed and filtered absorption channel.
    pub absorption: Spectrum,
    /// Reference channel on the absorption grid, filtered and rescaled.
    pub reference: Spectrum,
    /// Baseline ratio applied to the reference.
    pub ratio: Spectrum,
    pub calibration: &'static str,
}

/// σa(λ) = |ln(ratio·reference / absorption)| / (N·L).
pub fn absorption_cross_section(
    absorption: &Spectrum,
    reference: &Spectrum,
    settings: &AbsorptionSettings,
) -> XsecResult<AbsorptionResult> {
    let (absorption, reference) = common_domain(absorption, reference)?;
    debug!(
        samples = absorption.len(),
        reference_resampled = absorption.wavelengths() != reference.wavelengths(),
        "trimmed absorption and reference to their common domain"
    );
    let reference = if absorption.wavelengths() == reference.wavelengths() {
        reference
    } else {
        reference.resample_onto(absorption.wavelengths(), Extrapolation::HoldBoundary)?
    };

    let filter = FrequencyBandFilter::new(settings.filter_width)?;
    let absorption = filter.apply(&absorption)?;
    let reference = filter.apply(&reference)?;

    let domain = absorption.domain().ok_or_else(|| {
        XsecError::domain("DOMAIN.NO_OVERLAP", "absorption curve is empty after trimming")
    })?;
    let calibrator = BaselineCalibrator::select(settings.calibration, domain);
    let ratio = calibrator.ratio(&absorption, &reference)?;
    debug!(
        stage = %PipelineStage::Baseline,
        strategy = calibrator.name(),
        "baseline ratio calibrated"
    );
    let reference = reference.with_values(
        reference
            .values()
            .iter()
            .zip(ratio.values())
            .map(|(value, scale)| value * scale)
            .collect(),
    )?;

    let path = settings.doping_per_cm3 * settings.length_cm;
    let sigma_a = absorption.with_values(
        reference
            .values()
            .iter()
            .zip(absorption.values())
            .map(|(reference, absorption)| (reference / absorption).ln().abs() / path)
            .collect(),
    )?;
    if let Some((index, value)) = sigma_a.first_non_finite() {
        return Err(XsecError::numerical(
            "NUMERIC.CROSS_SECTION",
            format!(
                "absorption cross section is not finite at {:.3} nm: {}",
                sigma_a.wavelengths()[index],
                value
            ),
        ));
    }

    let sigma_a =
        PolynomialSmoother::new(settings.savgol_window, settings.savgol_order).apply(&sigma_a)?;
    debug!(
        calibration = calibrator.name(),
        peak = ?sigma_a.peak(),
        "absorption cross section derived"
    );

    Ok(AbsorptionResult {
        sigma_a,
        absorption,
        reference,
        ratio,
        calibration: calibrator.name(),
    })
}

fn common_domain(absorption: &Spectrum, reference: &Spectrum) -> XsecResult<(Spectrum, Spectrum)> {
    let (Some((abs_start, abs_end)), Some((ref_start, ref_end))) =
        (absorption.domain(), reference.domain())
    else {
        return Err(XsecError::load(
            "LOAD.CHANNEL_EMPTY",
            "absorption and reference curves must both contain samples",
        ));
    };

    let start = abs_start.max(ref_start);
    let end = abs_end.min(ref_end);
    let absorption = absorption.trim(start, end);
    let reference = reference.trim(start, end);
    if start > end || absorption.is_empty() || reference.is_empty() {
        return Err(XsecError::domain(
            "DOMAIN.NO_OVERLAP",
            format!(
                "absorption [{:.3}, {:.3}] nm and reference [{:.3}, {:.3}] nm do not overlap",
                abs_start, abs_end, ref_start, ref_end
            ),
        ));
    }
    Ok((absorption, reference))
}
