use super::CliError;
use super::helpers::*;
use std::path::PathBuf;
use xsec_core::common::ProcessingParameters;
use xsec_core::domain::{FluorescenceChannel, RawChannelSet, Spectrum};
use xsec_core::modules::absorption::{AbsorptionSettings, absorption_cross_section};
use xsec_core::modules::fluorescence::{FluorescenceCurves, normalize_fluorescence};
use xsec_core::modules::stitch::stitch_channel;
use xsec_core::modules::{DerivedSpectra, derive};

#[derive(clap::Args)]
pub(super) struct IoArgs {
    /// Material record (JSON)
    #[arg(long)]
    material: PathBuf,

    /// Header lines skipped in every curve file
    #[arg(long, default_value_t = DEFAULT_SKIP_HEADER)]
    skip_header: usize,

    /// Tab-delimited table path; printed to stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct AbsorptionChannelArgs {
    /// Absorption scan segments, in acquisition order
    #[arg(long, num_args = 1.., required = true)]
    absorption: Vec<PathBuf>,

    /// Reference scan segments, in acquisition order
    #[arg(long, num_args = 1.., required = true)]
    reference: Vec<PathBuf>,
}

#[derive(clap::Args)]
#[command(group(
    clap::ArgGroup::new("fluorescence_input")
        .required(true)
        .args(["fluorescence", "low"])
))]
pub(super) struct FluorescenceChannelArgs {
    /// Fluorescence scan segments
    #[arg(long, num_args = 1.., conflicts_with_all = ["low", "high"])]
    fluorescence: Vec<PathBuf>,

    /// Low-temperature fluorescence segments
    #[arg(long, num_args = 1.., requires = "high")]
    low: Vec<PathBuf>,

    /// High-temperature fluorescence segments
    #[arg(long, num_args = 1.., requires = "low")]
    high: Vec<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct SmoothingArgs {
    /// Savitzky-Golay window applied to sigma_a (disabled when not above the order)
    #[arg(long)]
    savgol_window: Option<usize>,

    /// Savitzky-Golay polynomial order
    #[arg(long)]
    savgol_order: Option<usize>,
}

#[derive(clap::Args)]
pub(super) struct AbsorptionArgs {
    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    channels: AbsorptionChannelArgs,

    /// Fraction of the spectrum around the Nyquist bin removed from both scans
    #[arg(long)]
    filter_width: Option<f64>,

    #[command(flatten)]
    smoothing: SmoothingArgs,
}

#[derive(clap::Args)]
pub(super) struct FluorescenceArgs {
    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    channels: FluorescenceChannelArgs,

    /// Fraction of the spectrum around the Nyquist bin removed from the lineshape
    #[arg(long)]
    filter_width: Option<f64>,
}

#[derive(clap::Args)]
pub(super) struct CrossSectionsArgs {
    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    absorption: AbsorptionChannelArgs,

    #[command(flatten)]
    fluorescence: FluorescenceChannelArgs,

    #[command(flatten)]
    smoothing: SmoothingArgs,

    /// Frequency filter width for the absorption and reference scans
    #[arg(long)]
    absorption_filter_width: Option<f64>,

    /// Frequency filter width for the fluorescence lineshape
    #[arg(long)]
    fluorescence_filter_width: Option<f64>,

    /// Skip the McCumber emission derivation
    #[arg(long)]
    no_mccumber: bool,

    /// Skip the Füchtbauer-Ladenburg emission derivation
    #[arg(long)]
    no_fuchtbauer: bool,

    /// Reabsorption depth [mm], replacing the material record value
    #[arg(long)]
    absorption_depth: Option<f64>,

    /// Lower edge of the blend handover [nm]
    #[arg(long)]
    fl_min: Option<f64>,

    /// Upper edge of the blend handover [nm]
    #[arg(long)]
    mc_max: Option<f64>,
}

impl SmoothingArgs {
    fn apply(&self, processing: &mut ProcessingParameters) {
        if let Some(window) = self.savgol_window {
            processing.savgol_window = window;
        }
        if let Some(order) = self.savgol_order {
            processing.savgol_order = order;
        }
    }
}

impl AbsorptionArgs {
    fn processing(&self) -> ProcessingParameters {
        let mut processing = ProcessingParameters::default();
        if let Some(width) = self.filter_width {
            processing.absorption_filter_width = width;
        }
        self.smoothing.apply(&mut processing);
        processing
    }
}

impl FluorescenceArgs {
    fn processing(&self) -> ProcessingParameters {
        let mut processing = ProcessingParameters::default();
        if let Some(width) = self.filter_width {
            processing.fluorescence_filter_width = width;
        }
        processing
    }
}

impl CrossSectionsArgs {
    fn processing(&self) -> ProcessingParameters {
        let mut processing = ProcessingParameters::default();
        if let Some(width) = self.absorption_filter_width {
            processing.absorption_filter_width = width;
        }
        if let Some(width) = self.fluorescence_filter_width {
            processing.fluorescence_filter_width = width;
        }
        self.smoothing.apply(&mut processing);
        processing.use_mccumber = !self.no_mccumber;
        processing.use_fuchtbauer = !self.no_fuchtbauer;
        processing.absorption_depth_mm = self.absorption_depth;
        processing.fl_min_nm = self.fl_min;
        processing.mc_max_nm = self.mc_max;
        processing
    }
}

pub(super) fn run_absorption_command(args: AbsorptionArgs) -> Result<i32, CliError> {
    let processing = args.processing();
    processing.validate().map_err(CliError::Compute)?;
    let material = load_material(&args.io.material)?;
    let absorption = load_channel("absorption", &args.channels.absorption, args.io.skip_header)?;
    let reference = load_channel("reference", &args.channels.reference, args.io.skip_header)?;

    let result = absorption_cross_section(
        &stitch_channel(&absorption).map_err(CliError::Compute)?,
        &stitch_channel(&reference).map_err(CliError::Compute)?,
        &AbsorptionSettings::from_parameters(&material, &processing),
    )
    .map_err(CliError::Compute)?;

    let curves = [
        ("sigma_a", &result.sigma_a),
        ("absorption", &result.absorption),
        ("reference", &result.reference),
        ("ratio", &result.ratio),
    ];
    if let Some(path) = emit_table(args.io.output.as_deref(), &curves)? {
        println!(
            "{}: {} ({} calibration); wrote {} curves to {}",
            material.name(),
            describe_peak("sigma_a", &result.sigma_a),
            result.calibration,
            curves.len(),
            path.display()
        );
    }
    Ok(0)
}

pub(super) fn run_fluorescence_command(args: FluorescenceArgs) -> Result<i32, CliError> {
    let processing = args.processing();
    processing.validate().map_err(CliError::Compute)?;
    let material = load_material(&args.io.material)?;
    let channel = load_fluorescence(
        &args.channels.fluorescence,
        &args.channels.low,
        &args.channels.high,
        args.io.skip_header,
    )?;
    let curves = match &channel {
        FluorescenceChannel::Single(set) => {
            FluorescenceCurves::Single(stitch_channel(set).map_err(CliError::Compute)?)
        }
        FluorescenceChannel::TemperaturePair { low, high } => {
            FluorescenceCurves::TemperaturePair {
                low: stitch_channel(low).map_err(CliError::Compute)?,
                high: stitch_channel(high).map_err(CliError::Compute)?,
            }
        }
    };

    let result = normalize_fluorescence(
        &curves,
        processing.fluorescence_filter_width,
        &processing.fluorescence,
    )
    .map_err(CliError::Compute)?;

    let mut table: Vec<(&str, &Spectrum)> = vec![("lineshape", &result.lineshape)];
    if let Some(low) = &result.low {
        table.push(("fluorescence_low", low));
    }
    if let Some(high) = &result.high {
        table.push(("fluorescence_high", high));
    }
    if let Some(path) = emit_table(args.io.output.as_deref(), &table)? {
        let (start, end) = result.lineshape.domain().unwrap_or((0.0, 0.0));
        println!(
            "{}: lineshape over {:.2}-{:.2} nm ({} samples); wrote {} curves to {}",
            material.name(),
            start,
            end,
            result.lineshape.len(),
            table.len(),
            path.display()
        );
    }
    Ok(0)
}

pub(super) fn run_cross_sections_command(args: CrossSectionsArgs) -> Result<i32, CliError> {
    let processing = args.processing();
    processing.validate().map_err(CliError::Compute)?;
    let material = load_material(&args.io.material)?;
    let raw = RawChannelSet::new(
        load_channel("absorption", &args.absorption.absorption, args.io.skip_header)?,
        load_channel("reference", &args.absorption.reference, args.io.skip_header)?,
    )
    .with_fluorescence(load_fluorescence(
        &args.fluorescence.fluorescence,
        &args.fluorescence.low,
        &args.fluorescence.high,
        args.io.skip_header,
    )?);

    let derived = derive(&raw, &material, &processing).map_err(CliError::Compute)?;
    let curves = derived.named_curves();
    if let Some(path) = emit_table(args.io.output.as_deref(), &curves)? {
        println!(
            "{}: {}; {}; wrote {} curves to {}",
            material.name(),
            describe_peak("sigma_a", &derived.absorption.sigma_a),
            emission_summary(&derived),
            curves.len(),
            path.display()
        );
    }
    Ok(0)
}

fn emission_summary(derived: &DerivedSpectra) -> String {
    let emission = derived
        .composite
        .as_ref()
        .map(|pair| pair.emission())
        .or(derived.fuchtbauer_emission.as_ref())
        .or(derived.mccumber_emission.as_ref());
    match emission {
        Some(curve) => describe_peak("sigma_e", curve),
        None => "sigma_e not derived".to_string(),
    }
}
