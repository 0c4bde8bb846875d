//! Fluorescence lineshape: low/high temperature reconciliation, banded
//! smoothing, total-power normalization and frequency filtering.

use super::filters::{FrequencyBandFilter, MovingAverage};
use super::traits::{SpectralTransform, apply_chain};
use crate::common::FluorescenceSettings;
use crate::domain::{Extrapolation, Spectrum, XsecError, XsecResult};
use crate::numerics::within_tolerance;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum FluorescenceCurves {
    Single(Spectrum),
    TemperaturePair { low: Spectrum, high: Spectrum },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluorescenceResult {
    /// Normalized lineshape, values sum to 1.
    pub lineshape: Spectrum,
    /// Normalized low-temperature curve before merging.
    pub low: Option<Spectrum>,
    /// Normalized high-temperature curve on the low-temperature grid.
    pub high: Option<Spectrum>,
}

pub fn normalize_fluorescence(
    curves: &FluorescenceCurves,
    filter_width: f64,
    settings: &FluorescenceSettings,
) -> XsecResult<FluorescenceResult> {
    let filter = FrequencyBandFilter::new(filter_width)?;
    let (merged, low, high) = match curves {
        FluorescenceCurves::Single(curve) => {
            require_samples("fluorescence", curve)?;
            (curve.clone(), None, None)
        }
        FluorescenceCurves::TemperaturePair { low, high } => {
            let (merged, low, high) =
                reconcile_pair(low, high, settings.reconciliation_tolerance)?;
            (merged, Some(low), Some(high))
        }
    };

    let smoothers: Vec<MovingAverage> = settings
        .smoothing_bands
        .iter()
        .map(|band| MovingAverage::within(band.window, band.start_nm, band.end_nm))
        .collect();
    let chain: Vec<&dyn SpectralTransform> = smoothers
        .iter()
        .map(|smoother| smoother as &dyn SpectralTransform)
        .collect();
    let smoothed = apply_chain(&chain, &merged)?;
    let lineshape = filter.apply(&smoothed.normalize_total()?)?;

    debug!(
        samples = lineshape.len(),
        bands = smoothers.len(),
        filter_width,
        total = lineshape.total(),
        "fluorescence lineshape normalized"
    );
    Ok(FluorescenceResult {
        lineshape,
        low,
        high,
    })
}

/// Normalize both curves and keep `min(low, high)` wherever they differ by
/// more than `tolerance`, the low-temperature value elsewhere.
///
/// Returns `(merged, low, high)` on the low-temperature grid.
pub fn reconcile_pair(
    low: &Spectrum,
    high: &Spectrum,
    tolerance: f64,
) -> XsecResult<(Spectrum, Spectrum, Spectrum)> {
    require_samples("low-temperature fluorescence", low)?;
    require_samples("high-temperature fluorescence", high)?;

    let high = if high.wavelengths() == low.wavelengths() {
        high.clone()
    } else {
        high.resample_onto(low.wavelengths(), Extrapolation::HoldBoundary)?
    };
    let low = low.normalize_total()?;
    let high = high.normalize_total()?;

    let mut replaced = 0_usize;
    let merged = low.with_values(
        low.values()
            .iter()
            .zip(high.values())
            .map(|(low, high)| {
                if within_tolerance(*low, *high, tolerance, 0.0) {
                    *low
                } else {
                    replaced += 1;
                    low.min(*high)
                }
            })
            .collect(),
    )?;
    debug!(
        samples = merged.len(),
        replaced, "reconciled low/high temperature fluorescence"
    );
    Ok((merged, low, high))
}

fn require_samples(label: &str, curve: &Spectrum) -> XsecResult<()> {
    if curve.is_empty() {
        return Err(XsecError::load(
            "LOAD.CHANNEL_EMPTY",
            format!("{} curve has no samples", label),
        ));
    }
    Ok(())
}
