//! Material and processing configuration.
//!
//! [`MaterialRecord`] mirrors the external material record (JSON, SI units,
//! original key names). [`MaterialParameters`] is the validated, frozen form
//! the pipeline reads; it keeps the record so callers can override single
//! fields and re-validate. [`ProcessingParameters`] holds the filter and
//! blending knobs a caller tunes between recomputations.

use super::constants::{
    DEFAULT_BLEND_HALF_WIDTH_NM, DEFAULT_SUBLEVEL_DEGENERACY, DEFAULT_TEMPERATURE_K, M_TO_CM,
    M_TO_NM, MM_TO_CM, PER_M_TO_PER_CM, PER_M3_TO_PER_CM3,
};
use crate::domain::{XsecError, XsecResult};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
    /// Doping concentration [m⁻³].
    #[serde(rename = "N_dop")]
    pub doping_per_m3: f64,
    /// Crystal length [m].
    #[serde(rename = "length")]
    pub length_m: f64,
    /// Radiative lifetime [s].
    #[serde(rename = "tau_f")]
    pub lifetime_s: f64,
    #[serde(rename = "n")]
    pub refractive_index: f64,
    #[serde(rename = "temperature", default, skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<f64>,
    /// Zero-phonon line [m].
    #[serde(rename = "ZPL")]
    pub zero_phonon_line_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_lower_level: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_upper_level: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degeneracy_lower: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degeneracy_upper: Option<Vec<f64>>,
    /// Calibration window width [nm]; 0 selects the two-point linear baseline.
    #[serde(default)]
    pub zero_absorption_width: f64,
    /// Calibration centres [nm]; defaults to the absorption domain ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_absorption_wavelength: Option<(f64, f64)>,
    /// Effective reabsorption depth [mm].
    #[serde(default)]
    pub absorption_depth: f64,
    #[serde(rename = "FL_min", default, skip_serializing_if = "Option::is_none")]
    pub fl_min_nm: Option<f64>,
    #[serde(rename = "MC_max", default, skip_serializing_if = "Option::is_none")]
    pub mc_max_nm: Option<f64>,
    #[serde(default)]
    pub correct_temp: bool,
}

impl MaterialRecord {
    pub fn from_json_str(source: &str) -> XsecResult<Self> {
        serde_json::from_str(source).map_err(|error| {
            XsecError::configuration(
                "CONFIG.MATERIAL_RECORD",
                format!("invalid material record: {}", error),
            )
        })
    }
}

/// Stark sublevels of one manifold: energies [cm⁻¹] and degeneracies.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifoldLevels {
    energies_per_cm: Vec<f64>,
    degeneracies: Vec<f64>,
}

impl ManifoldLevels {
    pub fn new(energies_per_cm: Vec<f64>, degeneracies: Option<Vec<f64>>) -> XsecResult<Self> {
        if energies_per_cm.is_empty() {
            return Err(XsecError::configuration(
                "CONFIG.MANIFOLD_EMPTY",
                "manifold requires at least one sublevel energy",
            ));
        }
        if let Some(energy) = energies_per_cm.iter().find(|energy| !energy.is_finite()) {
            return Err(XsecError::configuration(
                "CONFIG.MANIFOLD_ENERGY",
                format!("sublevel energy must be finite, got {}", energy),
            ));
        }

        let degeneracies = match degeneracies {
            Some(degeneracies) => {
                if degeneracies.len() != energies_per_cm.len() {
                    return Err(XsecError::configuration(
                        "CONFIG.MANIFOLD_DEGENERACY",
                        format!(
                            "expected {} degeneracies, got {}",
                            energies_per_cm.len(),
                            degeneracies.len()
                        ),
                    ));
                }
                if let Some(value) = degeneracies
                    .iter()
                    .find(|value| !value.is_finite() || **value <= 0.0)
                {
                    return Err(XsecError::configuration(
                        "CONFIG.MANIFOLD_DEGENERACY",
                        format!("degeneracy must be finite and > 0, got {}", value),
                    ));
                }
                degeneracies
            }
            None => vec![DEFAULT_SUBLEVEL_DEGENERACY; energies_per_cm.len()],
        };

        Ok(Self {
            energies_per_cm,
            degeneracies,
        })
    }

    pub fn energies_per_cm(&self) -> &[f64] {
        &self.energies_per_cm
    }

    pub fn degeneracies(&self) -> &[f64] {
        &self.degeneracies
    }
}

/// Zero-absorption calibration regions of the baseline fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationWindow {
    /// Window width [nm]; 0 selects the two-point linear baseline.
    pub width_nm: f64,
    /// Centre wavelengths [nm]; `None` uses the domain ends.
    pub centers_nm: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParameters {
    record: MaterialRecord,
    temperature_k: f64,
    lower: ManifoldLevels,
    upper: ManifoldLevels,
}

impl TryFrom<MaterialRecord> for MaterialParameters {
    type Error = XsecError;

    fn try_from(record: MaterialRecord) -> XsecResult<Self> {
        require_positive("N_dop", record.doping_per_m3)?;
        require_positive("length", record.length_m)?;
        require_positive("tau_f", record.lifetime_s)?;
        require_positive("n", record.refractive_index)?;
        require_positive("ZPL", record.zero_phonon_line_m)?;
        let temperature_k = record.temperature_k.unwrap_or(DEFAULT_TEMPERATURE_K);
        require_positive("temperature", temperature_k)?;
        require_non_negative("zero_absorption_width", record.zero_absorption_width)?;
        require_non_negative("absorption_depth", record.absorption_depth)?;

        if let Some((first, second)) = record.zero_absorption_wavelength {
            require_finite("zero_absorption_wavelength", first)?;
            require_finite("zero_absorption_wavelength", second)?;
            if first >= second {
                return Err(XsecError::configuration(
                    "CONFIG.CALIBRATION_CENTERS",
                    format!(
                        "calibration centres must be increasing, got ({}, {})",
                        first, second
                    ),
                ));
            }
        }
        for (field, value) in [("FL_min", record.fl_min_nm), ("MC_max", record.mc_max_nm)] {
            if let Some(value) = value {
                require_finite(field, value)?;
            }
        }

        let lower = ManifoldLevels::new(
            record.energy_lower_level.clone().unwrap_or_else(|| vec![0.0]),
            record.degeneracy_lower.clone(),
        )?;
        let upper = ManifoldLevels::new(
            record
                .energy_upper_level
                .clone()
                .unwrap_or_else(|| vec![PER_M_TO_PER_CM / record.zero_phonon_line_m]),
            record.degeneracy_upper.clone(),
        )?;

        Ok(Self {
            record,
            temperature_k,
            lower,
            upper,
        })
    }
}

impl MaterialParameters {
    pub fn from_json_str(source: &str) -> XsecResult<Self> {
        MaterialRecord::from_json_str(source)?.try_into()
    }

    pub fn record(&self) -> &MaterialRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Folder identifier `<date>_<name>` of the measurement set.
    pub fn folder(&self) -> String {
        format!("{}_{}", self.record.date, self.record.name)
    }

    pub fn doping_per_cm3(&self) -> f64 {
        self.record.doping_per_m3 * PER_M3_TO_PER_CM3
    }

    pub fn length_cm(&self) -> f64 {
        self.record.length_m * M_TO_CM
    }

    pub fn lifetime_s(&self) -> f64 {
        self.record.lifetime_s
    }

    pub fn refractive_index(&self) -> f64 {
        self.record.refractive_index
    }

    pub fn temperature_k(&self) -> f64 {
        self.temperature_k
    }

    pub fn zero_phonon_line_nm(&self) -> f64 {
        self.record.zero_phonon_line_m * M_TO_NM
    }

    pub fn lower_manifold(&self) -> &ManifoldLevels {
        &self.lower
    }

    pub fn upper_manifold(&self) -> &ManifoldLevels {
        &self.upper
    }

    pub fn calibration(&self) -> CalibrationWindow {
        CalibrationWindow {
            width_nm: self.record.zero_absorption_width,
            centers_nm: self.record.zero_absorption_wavelength,
        }
    }

    pub fn absorption_depth_cm(&self) -> f64 {
        self.record.absorption_depth * MM_TO_CM
    }

    pub fn expects_temperature_pair(&self) -> bool {
        self.record.correct_temp
    }

    /// Füchtbauer cut-on and McCumber cut-off [nm], ZPL ± 10 nm by default.
    pub fn blend_cutoffs_nm(&self) -> (f64, f64) {
        let zpl = self.zero_phonon_line_nm();
        (
            self.record
                .fl_min_nm
                .unwrap_or(zpl - DEFAULT_BLEND_HALF_WIDTH_NM),
            self.record
                .mc_max_nm
                .unwrap_or(zpl + DEFAULT_BLEND_HALF_WIDTH_NM),
        )
    }

    /// Apply caller overrides to a copy of the record and validate again.
    pub fn with_overrides(&self, apply: impl FnOnce(&mut MaterialRecord)) -> XsecResult<Self> {
        let mut record = self.record.clone();
        apply(&mut record);
        record.try_into()
    }

    pub fn with_doping_per_m3(&self, doping_per_m3: f64) -> XsecResult<Self> {
        self.with_overrides(|record| record.doping_per_m3 = doping_per_m3)
    }

    pub fn with_length_m(&self, length_m: f64) -> XsecResult<Self> {
        self.with_overrides(|record| record.length_m = length_m)
    }

    pub fn with_lifetime_s(&self, lifetime_s: f64) -> XsecResult<Self> {
        self.with_overrides(|record| record.lifetime_s = lifetime_s)
    }

    pub fn with_calibration(
        &self,
        width_nm: f64,
        centers_nm: Option<(f64, f64)>,
    ) -> XsecResult<Self> {
        self.with_overrides(|record| {
            record.zero_absorption_width = width_nm;
            record.zero_absorption_wavelength = centers_nm;
        })
    }

    pub fn with_absorption_depth_mm(&self, depth_mm: f64) -> XsecResult<Self> {
        self.with_overrides(|record| record.absorption_depth = depth_mm)
    }
}

/// Moving-average band applied to the fluorescence lineshape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingBand {
    pub start_nm: f64,
    pub end_nm: f64,
    pub window: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FluorescenceSettings {
    /// Low/high curves closer than this are treated as equal.
    pub reconciliation_tolerance: f64,
    /// Applied in order, later bands see the output of earlier ones.
    pub smoothing_bands: Vec<SmoothingBand>,
}

impl Default for FluorescenceSettings {
    fn default() -> Self {
        Self {
            reconciliation_tolerance: 1.0e-5,
            smoothing_bands: vec![
                SmoothingBand {
                    start_nm: 990.0,
                    end_nm: 1150.0,
                    window: 4,
                },
                SmoothingBand {
                    start_nm: 1000.0,
                    end_nm: 1060.0,
                    window: 6,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingParameters {
    pub absorption_filter_width: f64,
    pub fluorescence_filter_width: f64,
    pub savgol_window: usize,
    pub savgol_order: usize,
    pub fluorescence: FluorescenceSettings,
    pub use_mccumber: bool,
    pub use_fuchtbauer: bool,
    pub fl_min_nm: Option<f64>,
    pub mc_max_nm: Option<f64>,
    pub absorption_depth_mm: Option<f64>,
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            absorption_filter_width: 0.0,
            fluorescence_filter_width: 0.6,
            savgol_window: 20,
            savgol_order: 3,
            fluorescence: FluorescenceSettings::default(),
            use_mccumber: true,
            use_fuchtbauer: true,
            fl_min_nm: None,
            mc_max_nm: None,
            absorption_depth_mm: None,
        }
    }
}

impl ProcessingParameters {
    pub fn validate(&self) -> XsecResult<()> {
        if !(0.0..=1.0).contains(&self.absorption_filter_width) {
            return Err(XsecError::configuration(
                "CONFIG.FILTER_WIDTH",
                format!(
                    "absorption filter width must lie in [0, 1], got {}",
                    self.absorption_filter_width
                ),
            ));
        }
        // A full-width band also removes the DC bin and with it the lineshape normalization.
        if !(0.0..1.0).contains(&self.fluorescence_filter_width) {
            return Err(XsecError::configuration(
                "CONFIG.FILTER_WIDTH",
                format!(
                    "fluorescence filter width must lie in [0, 1), got {}",
                    self.fluorescence_filter_width
                ),
            ));
        }
        let tolerance = self.fluorescence.reconciliation_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(XsecError::configuration(
                "CONFIG.RECONCILIATION_TOLERANCE",
                format!("reconciliation tolerance must be finite and >= 0, got {}", tolerance),
            ));
        }
        for band in &self.fluorescence.smoothing_bands {
            let ordered = band.start_nm.is_finite()
                && band.end_nm.is_finite()
                && band.start_nm < band.end_nm;
            if !ordered {
                return Err(XsecError::configuration(
                    "CONFIG.SMOOTHING_BAND",
                    format!(
                        "smoothing band bounds must be finite and increasing, got ({}, {})",
                        band.start_nm, band.end_nm
                    ),
                ));
            }
            if band.window == 0 {
                return Err(XsecError::configuration(
                    "CONFIG.SMOOTHING_BAND",
                    "smoothing band window must be >= 1",
                ));
            }
        }
        for (field, value) in [("fl_min_nm", self.fl_min_nm), ("mc_max_nm", self.mc_max_nm)] {
            if let Some(value) = value {
                require_finite(field, value)?;
            }
        }
        if let Some(depth) = self.absorption_depth_mm {
            require_non_negative("absorption_depth_mm", depth)?;
        }

        Ok(())
    }

    /// Stable hash of every parameter, for caller-side memoization.
    pub fn cache_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.absorption_filter_width.to_bits().hash(&mut hasher);
        self.fluorescence_filter_width.to_bits().hash(&mut hasher);
        self.savgol_window.hash(&mut hasher);
        self.savgol_order.hash(&mut hasher);
        self.fluorescence
            .reconciliation_tolerance
            .to_bits()
            .hash(&mut hasher);
        for band in &self.fluorescence.smoothing_bands {
            band.start_nm.to_bits().hash(&mut hasher);
            band.end_nm.to_bits().hash(&mut hasher);
            band.window.hash(&mut hasher);
        }
        self.use_mccumber.hash(&mut hasher);
        self.use_fuchtbauer.hash(&mut hasher);
        for value in [self.fl_min_nm, self.mc_max_nm, self.absorption_depth_mm] {
            value.map(f64::to_bits).hash(&mut hasher);
        }
        hasher.finish()
    }
}

fn require_finite(field: &'static str, value: f64) -> XsecResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(XsecError::configuration(
            "CONFIG.OUT_OF_RANGE",
            format!("'{}' must be finite, got {}", field, value),
        ))
    }
}

fn require_positive(field: &'static str, value: f64) -> XsecResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(XsecError::configuration(
            "CONFIG.OUT_OF_RANGE",
            format!("'{}' must be finite and > 0, got {}", field, value),
        ))
    }
}

fn require_non_negative(field: &'static str, value: f64) -> XsecResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(XsecError::configuration(
            "CONFIG.OUT_OF_RANGE",
            format!("'{}' must be finite and >= 0, got {}", field, value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{MaterialParameters, MaterialRecord, ProcessingParameters};
    use crate::common::constants::DEFAULT_TEMPERATURE_K;
    use crate::domain::XsecErrorCategory;

    const YB_YAG: &str = r#"{
        "name": "YbYAG",
        "date": "20240110",
        "N_dop": 1.38e27,
        "length": 2.0e-3,
        "tau_f": 9.5e-4,
        "n": 1.82,
        "ZPL": 968.8e-9,
        "energy_lower_level": [0, 565, 612, 785],
        "energy_upper_level": [10327, 10624, 10679],
        "zero_absorption_width": 5,
        "zero_absorption_wavelength": [880.0, 1100.0],
        "absorption_depth": 0.5,
        "correct_temp": true
    }"#;

    #[test]
    fn record_converts_to_internal_units() {
        let material = MaterialParameters::from_json_str(YB_YAG).expect("material");

        assert_eq!(material.folder(), "20240110_YbYAG");
        assert!((material.doping_per_cm3() - 1.38e21).abs() <= 1.0e9);
        assert!((material.length_cm() - 0.2).abs() <= 1.0e-15);
        assert!((material.zero_phonon_line_nm() - 968.8).abs() <= 1.0e-9);
        assert!((material.absorption_depth_cm() - 0.05).abs() <= 1.0e-15);
        assert_eq!(material.temperature_k(), DEFAULT_TEMPERATURE_K);
        assert_eq!(material.lower_manifold().degeneracies(), &[2.0; 4]);
        assert!(material.expects_temperature_pair());
        let (fl_min, mc_max) = material.blend_cutoffs_nm();
        assert!((fl_min - 958.8).abs() <= 1.0e-9);
        assert!((mc_max - 978.8).abs() <= 1.0e-9);
    }

    #[test]
    fn missing_levels_default_to_single_sublevels() {
        let record = MaterialRecord::from_json_str(
            r#"{"N_dop": 1e26, "length": 1e-3, "tau_f": 1e-3, "n": 1.5, "ZPL": 1.0e-6}"#,
        )
        .expect("record");
        let material = MaterialParameters::try_from(record).expect("material");

        assert_eq!(material.lower_manifold().energies_per_cm(), &[0.0]);
        let upper = material.upper_manifold().energies_per_cm();
        assert_eq!(upper.len(), 1);
        assert!((upper[0] - 10_000.0).abs() <= 1.0e-9);
        assert_eq!(material.calibration().width_nm, 0.0);
        assert!(material.calibration().centers_nm.is_none());
    }

    #[test]
    fn unknown_keys_and_out_of_range_values_are_rejected() {
        let unknown = MaterialParameters::from_json_str(
            r#"{"N_dop": 1e26, "length": 1e-3, "tau_f": 1e-3, "n": 1.5, "ZPL": 1e-6, "colour": 1}"#,
        )
        .expect_err("unknown key");
        assert_eq!(unknown.category(), XsecErrorCategory::ConfigurationError);

        let negative = MaterialParameters::from_json_str(
            r#"{"N_dop": -1, "length": 1e-3, "tau_f": 1e-3, "n": 1.5, "ZPL": 1e-6}"#,
        )
        .expect_err("negative doping");
        assert_eq!(negative.placeholder(), "CONFIG.OUT_OF_RANGE");
    }

    #[test]
    fn degeneracy_override_must_match_levels() {
        let error = MaterialParameters::from_json_str(
            r#"{"N_dop": 1e26, "length": 1e-3, "tau_f": 1e-3, "n": 1.5, "ZPL": 1e-6,
                "energy_lower_level": [0, 100], "degeneracy_lower": [2]}"#,
        )
        .expect_err("degeneracy mismatch");
        assert_eq!(error.placeholder(), "CONFIG.MANIFOLD_DEGENERACY");
    }

    #[test]
    fn overrides_revalidate_and_leave_the_source_untouched() {
        let material = MaterialParameters::from_json_str(YB_YAG).expect("material");
        let thicker = material.with_length_m(4.0e-3).expect("override");
        assert!((thicker.length_cm() - 0.4).abs() <= 1.0e-15);
        assert!((material.length_cm() - 0.2).abs() <= 1.0e-15);

        assert!(material.with_lifetime_s(0.0).is_err());
        assert!(material.with_calibration(5.0, Some((1000.0, 900.0))).is_err());
    }

    #[test]
    fn processing_defaults_validate_and_hash_stably() {
        let parameters = ProcessingParameters::default();
        parameters.validate().expect("defaults are valid");
        assert_eq!(parameters.cache_key(), ProcessingParameters::default().cache_key());

        let tweaked = ProcessingParameters {
            absorption_filter_width: 0.2,
            ..ProcessingParameters::default()
        };
        assert_ne!(parameters.cache_key(), tweaked.cache_key());
    }

    #[test]
    fn processing_rejects_full_width_fluorescence_filter() {
        let parameters = ProcessingParameters {
            fluorescence_filter_width: 1.0,
            ..ProcessingParameters::default()
        };
        let error = parameters.validate().expect_err("full-width band");
        assert_eq!(error.placeholder(), "CONFIG.FILTER_WIDTH");
    }

    #[test]
    fn processing_parameters_deserialize_with_defaults() {
        let parameters: ProcessingParameters =
            serde_json::from_str(r#"{"absorption_filter_width": 0.1, "use_mccumber": false}"#)
                .expect("processing json");
        assert_eq!(parameters.absorption_filter_width, 0.1);
        assert!(!parameters.use_mccumber);
        assert_eq!(parameters.savgol_window, 20);
        assert_eq!(parameters.fluorescence.smoothing_bands.len(), 2);
    }
}
