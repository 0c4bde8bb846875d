use super::CliError;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use xsec_core::common::MaterialParameters;
use xsec_core::domain::{ChannelSet, FluorescenceChannel, Spectrum, XsecError};
use xsec_core::modules::serialization::{format_scientific, render_columns, write_columns};

pub(super) const DEFAULT_SKIP_HEADER: usize = 2;

pub(super) fn load_material(path: &Path) -> Result<MaterialParameters, CliError> {
    let source = fs::read_to_string(path).map_err(|source| {
        CliError::Compute(XsecError::load(
            "LOAD.MATERIAL_READ",
            format!("failed to read material record '{}': {}", path.display(), source),
        ))
    })?;
    MaterialParameters::from_json_str(&source).map_err(CliError::Compute)
}

/// Reads a two-column curve (wavelength in nm, value) sorted by wavelength.
pub(super) fn load_curve(path: &Path, skip_header: usize) -> Result<Spectrum, CliError> {
    let source = fs::read_to_string(path).map_err(|source| {
        CliError::Compute(XsecError::load(
            "LOAD.CURVE_READ",
            format!("failed to read curve '{}': {}", path.display(), source),
        ))
    })?;
    let mut pairs = parse_two_columns(&source, skip_header)
        .with_context(|| format!("failed to parse curve '{}'", path.display()))
        .map_err(|error| {
            CliError::Compute(XsecError::load("LOAD.CURVE_PARSE", format!("{error:#}")))
        })?;
    if pairs.is_empty() {
        return Err(CliError::Compute(XsecError::load(
            "LOAD.CURVE_EMPTY",
            format!("curve '{}' contains no samples", path.display()),
        )));
    }

    pairs.sort_by(|left, right| left.0.total_cmp(&right.0));
    debug!(path = %path.display(), samples = pairs.len(), "loaded curve");
    Spectrum::from_pairs(&pairs).map_err(|error| {
        CliError::Compute(XsecError::load(
            "LOAD.INVALID_SPECTRUM",
            format!("curve '{}': {}", path.display(), error),
        ))
    })
}

pub(super) fn load_channel(
    label: &str,
    paths: &[PathBuf],
    skip_header: usize,
) -> Result<ChannelSet, CliError> {
    let segments = paths
        .iter()
        .map(|path| load_curve(path, skip_header))
        .collect::<Result<Vec<_>, _>>()?;
    ChannelSet::new(label, segments).map_err(CliError::Compute)
}

pub(super) fn load_fluorescence(
    single: &[PathBuf],
    low: &[PathBuf],
    high: &[PathBuf],
    skip_header: usize,
) -> Result<FluorescenceChannel, CliError> {
    if !single.is_empty() {
        return Ok(FluorescenceChannel::Single(load_channel(
            "fluorescence",
            single,
            skip_header,
        )?));
    }
    if low.is_empty() || high.is_empty() {
        return Err(CliError::Usage(
            "fluorescence input requires --fluorescence or both --low and --high".to_string(),
        ));
    }
    Ok(FluorescenceChannel::TemperaturePair {
        low: load_channel("fluorescence_low", low, skip_header)?,
        high: load_channel("fluorescence_high", high, skip_header)?,
    })
}

/// Writes the table to `output`, or prints it when no path is given.
///
/// Returns the path written to.
pub(super) fn emit_table<'a>(
    output: Option<&'a Path>,
    curves: &[(&str, &Spectrum)],
) -> Result<Option<&'a Path>, CliError> {
    let Some(path) = output else {
        print!("{}", render_columns(curves));
        return Ok(None);
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    write_columns(path, curves).map_err(CliError::Compute)?;
    debug!(path = %path.display(), curves = curves.len(), "exported curve table");
    Ok(Some(path))
}

pub(super) fn describe_peak(label: &str, curve: &Spectrum) -> String {
    match curve.peak() {
        Some((wavelength, value)) => format!(
            "{} peak {} cm^2 at {:.2} nm",
            label,
            format_scientific(value),
            wavelength
        ),
        None => format!("{} empty", label),
    }
}

fn parse_two_columns(source: &str, skip_header: usize) -> anyhow::Result<Vec<(f64, f64)>> {
    let mut pairs = Vec::new();
    for (index, line) in source.lines().enumerate().skip(skip_header) {
        let line_number = index + 1;
        let mut fields = line
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|field| !field.is_empty());
        let Some(first) = fields.next() else {
            continue;
        };
        let second = fields
            .next()
            .with_context(|| format!("line {} has a single column", line_number))?;
        let wavelength = first
            .parse::<f64>()
            .with_context(|| format!("line {}: invalid wavelength '{}'", line_number, first))?;
        let value = second
            .parse::<f64>()
            .with_context(|| format!("line {}: invalid value '{}'", line_number, second))?;
        pairs.push((wavelength, value));
    }
    Ok(pairs)
}
