//! End-to-end derivation of every cross-section curve from raw channels.
//!
//! [`derive`] is a pure function of its inputs; callers that want to reuse
//! results key them by [`ProcessingParameters::cache_key`] themselves.

use super::absorption::{AbsorptionResult, AbsorptionSettings, absorption_cross_section};
use super::blend::{BlendResult, SpectralBlender};
use super::fluorescence::{FluorescenceCurves, FluorescenceResult, normalize_fluorescence};
use super::fuchtbauer::FuchtbauerLadenburg;
use super::mccumber::{McCumberConverter, beta_equilibrium};
use super::stitch::stitch_channel;
use crate::common::{MaterialParameters, ProcessingParameters};
use crate::domain::{
    CrossSectionPair, FluorescenceChannel, PipelineStage, RawChannelSet, Spectrum, XsecResult,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSpectra {
    pub absorption: AbsorptionResult,
    pub fluorescence: Option<FluorescenceResult>,
    /// Füchtbauer-Ladenburg σe on the fluorescence grid.
    pub fuchtbauer_emission: Option<Spectrum>,
    /// McCumber σe on the absorption grid.
    pub mccumber_emission: Option<Spectrum>,
    pub blend: Option<BlendResult>,
    /// Blended σe and its McCumber absorption counterpart.
    pub composite: Option<CrossSectionPair>,
    pub beta_equilibrium: Option<Spectrum>,
}

impl DerivedSpectra {
    /// Every available curve with its export label, in pipeline order.
    pub fn named_curves(&self) -> Vec<(&'static str, &Spectrum)> {
        let mut curves = vec![
            ("sigma_a", &self.absorption.sigma_a),
            ("absorption", &self.absorption.absorption),
            ("reference", &self.absorption.reference),
            ("ratio", &self.absorption.ratio),
        ];
        if let Some(fluorescence) = &self.fluorescence {
            curves.push(("lineshape", &fluorescence.lineshape));
            if let Some(low) = &fluorescence.low {
                curves.push(("fluorescence_low", low));
            }
            if let Some(high) = &fluorescence.high {
                curves.push(("fluorescence_high", high));
            }
        }
        if let Some(emission) = &self.fuchtbauer_emission {
            curves.push(("sigma_e_fl", emission));
        }
        if let Some(emission) = &self.mccumber_emission {
            curves.push(("sigma_e_mc", emission));
        }
        if let Some(composite) = &self.composite {
            curves.push(("sigma_e", composite.emission()));
            curves.push(("sigma_a_composite", composite.absorption()));
        }
        if let Some(beta) = &self.beta_equilibrium {
            curves.push(("beta_eq", beta));
        }
        curves
    }
}

pub fn derive(
    raw: &RawChannelSet,
    material: &MaterialParameters,
    processing: &ProcessingParameters,
) -> XsecResult<DerivedSpectra> {
    processing.validate()?;
    debug!(
        material = material.name(),
        cache_key = processing.cache_key(),
        "deriving cross sections"
    );

    let absorption_curve = stitch_channel(&raw.absorption)?;
    let reference_curve = stitch_channel(&raw.reference)?;
    let absorption = absorption_cross_section(
        &absorption_curve,
        &reference_curve,
        &AbsorptionSettings::from_parameters(material, processing),
    )?;
    debug!(
        stage = %PipelineStage::Absorption,
        samples = absorption.sigma_a.len(),
        calibration = absorption.calibration,
        "stage complete"
    );

    let (fluorescence, fuchtbauer_emission) = match &raw.fluorescence {
        Some(channel) if processing.use_fuchtbauer => {
            let curves = fluorescence_curves(channel, material)?;
            let lineshape = normalize_fluorescence(
                &curves,
                processing.fluorescence_filter_width,
                &processing.fluorescence,
            )?;
            debug!(
                stage = %PipelineStage::Fluorescence,
                samples = lineshape.lineshape.len(),
                "stage complete"
            );
            let calculator =
                FuchtbauerLadenburg::from_material(material, processing.absorption_depth_mm)?;
            let emission = calculator.emission(&lineshape.lineshape, Some(&absorption.sigma_a))?;
            debug!(
                stage = %PipelineStage::Fuchtbauer,
                samples = emission.len(),
                "stage complete"
            );
            (Some(lineshape), Some(emission))
        }
        _ => (None, None),
    };

    let converter = if processing.use_mccumber {
        Some(McCumberConverter::from_material(material)?)
    } else {
        None
    };
    let mccumber_emission = match &converter {
        Some(converter) => {
            let emission = converter.convert(&absorption.sigma_a, false)?;
            debug!(
                stage = %PipelineStage::McCumber,
                partition_functions = ?converter.partition_functions(),
                "stage complete"
            );
            Some(emission)
        }
        None => None,
    };

    let (blend, composite, beta) = match (&fuchtbauer_emission, &mccumber_emission, &converter) {
        (Some(fuchtbauer), Some(mccumber), Some(converter)) => {
            let blender = SpectralBlender::from_parameters(material, processing)?;
            let blend = blender.blend(fuchtbauer, mccumber)?;
            let composite_absorption = converter.convert(&blend.composite, true)?;
            let pair = CrossSectionPair::new(composite_absorption, blend.composite.clone())?;
            let beta = beta_equilibrium(&pair)?;
            debug!(
                stage = %PipelineStage::Blend,
                samples = pair.wavelengths().len(),
                "stage complete"
            );
            (Some(blend), Some(pair), Some(beta))
        }
        _ => (None, None, None),
    };

    Ok(DerivedSpectra {
        absorption,
        fluorescence,
        fuchtbauer_emission,
        mccumber_emission,
        blend,
        composite,
        beta_equilibrium: beta,
    })
}

fn fluorescence_curves(
    channel: &FluorescenceChannel,
    material: &MaterialParameters,
) -> XsecResult<FluorescenceCurves> {
    match channel {
        FluorescenceChannel::Single(set) => {
            if material.expects_temperature_pair() {
                warn!(
                    material = material.name(),
                    "material expects a low/high temperature pair, \
                     using the single fluorescence curve"
                );
            }
            Ok(FluorescenceCurves::Single(stitch_channel(set)?))
        }
        FluorescenceChannel::TemperaturePair { low, high } => {
            Ok(FluorescenceCurves::TemperaturePair {
                low: stitch_channel(low)?,
                high: stitch_channel(high)?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::derive;
    use crate::common::{MaterialParameters, ProcessingParameters};
    use crate::domain::{ChannelSet, FluorescenceChannel, RawChannelSet, Spectrum};

    fn material() -> MaterialParameters {
        MaterialParameters::from_json_str(
            r#"{"name": "test", "date": "20240101", "N_dop": 1.0e26, "length": 5.0e-3,
                "tau_f": 1.0e-3, "n": 1.8, "ZPL": 970.0e-9,
                "energy_lower_level": [0, 500], "energy_upper_level": [10309, 10600]}"#,
        )
        .expect("material")
    }

    fn channel(label: &str, f: impl Fn(f64) -> f64) -> ChannelSet {
        let wavelengths: Vec<f64> = (0..=800).map(|index| 900.0 + 0.25 * index as f64).collect();
        let values = wavelengths.iter().map(|x| f(*x)).collect();
        ChannelSet::single(label, Spectrum::new(wavelengths, values).expect("curve"))
            .expect("channel")
    }

    fn raw() -> RawChannelSet {
        let sigma = |x: f64| 1.0e-20 * (-0.5 * ((x - 940.0) / 6.0).powi(2)).exp();
        RawChannelSet::new(
            channel("absorption", |x| 1000.0 * (-sigma(x) * 1.0e20 * 0.5).exp()),
            channel("reference", |_| 1000.0),
        )
        .with_fluorescence(FluorescenceChannel::Single(channel("fluorescence", |x| {
            let main = (-0.5 * ((x - 1030.0) / 8.0).powi(2)).exp();
            let zero_line = (-0.5 * ((x - 970.0) / 3.0).powi(2)).exp();
            main + 0.2 * zero_line
        })))
    }

    #[test]
    fn full_derivation_produces_every_curve() {
        let derived =
            derive(&raw(), &material(), &ProcessingParameters::default()).expect("derive");

        assert!(derived.fluorescence.is_some());
        assert!(derived.fuchtbauer_emission.is_some());
        assert!(derived.mccumber_emission.is_some());
        let composite = derived.composite.as_ref().expect("composite");
        assert_eq!(composite.absorption().len(), composite.emission().len());
        let labels: Vec<&str> = derived.named_curves().iter().map(|(label, _)| *label).collect();
        assert_eq!(
            labels,
            vec![
                "sigma_a",
                "absorption",
                "reference",
                "ratio",
                "lineshape",
                "sigma_e_fl",
                "sigma_e_mc",
                "sigma_e",
                "sigma_a_composite",
                "beta_eq"
            ]
        );
    }

    #[test]
    fn switches_skip_emission_derivations() {
        let processing = ProcessingParameters {
            use_mccumber: false,
            ..ProcessingParameters::default()
        };
        let derived = derive(&raw(), &material(), &processing).expect("derive");
        assert!(derived.mccumber_emission.is_none());
        assert!(derived.fuchtbauer_emission.is_some());
        assert!(derived.composite.is_none() && derived.blend.is_none());

        let processing = ProcessingParameters {
            use_fuchtbauer: false,
            ..ProcessingParameters::default()
        };
        let derived = derive(&raw(), &material(), &processing).expect("derive");
        assert!(derived.fluorescence.is_none() && derived.fuchtbauer_emission.is_none());
        assert!(derived.mccumber_emission.is_some());
    }

    #[test]
    fn invalid_processing_parameters_fail_before_any_stage() {
        let processing = ProcessingParameters {
            absorption_filter_width: 2.0,
            ..ProcessingParameters::default()
        };
        let error = derive(&raw(), &material(), &processing).expect_err("invalid width");
        assert_eq!(error.placeholder(), "CONFIG.FILTER_WIDTH");
    }

    #[test]
    fn derivation_is_deterministic() {
        let processing = ProcessingParameters::default();
        let first = derive(&raw(), &material(), &processing).expect("first");
        let second = derive(&raw(), &material(), &processing).expect("second");
        assert_eq!(first, second);
    }
}
