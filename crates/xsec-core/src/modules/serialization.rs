//! Tab-delimited export of named curves as paired `X`/`Y` columns.

use crate::domain::{Spectrum, XsecError, XsecResult};
use std::fs;
use std::path::Path;

/// Scientific notation with five mantissa decimals and a signed, at least
/// two-digit exponent, e.g. `1.23457e+03`.
pub fn format_scientific(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    let formatted = format!("{value:.5e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

/// Header `X{i}_{name}\tY{i}_{name}` per curve, then one row per sample
/// index; curves shorter than the longest one leave empty cells.
pub fn render_columns(curves: &[(&str, &Spectrum)]) -> String {
    let header: Vec<String> = curves
        .iter()
        .enumerate()
        .flat_map(|(index, (name, _))| {
            let name = column_name(name);
            [format!("X{index}_{name}"), format!("Y{index}_{name}")]
        })
        .collect();
    let rows = curves
        .iter()
        .map(|(_, spectrum)| spectrum.len())
        .max()
        .unwrap_or(0);

    let mut content = header.join("\t");
    content.push('\n');
    for row in 0..rows {
        let cells: Vec<String> = curves
            .iter()
            .flat_map(|(_, spectrum)| {
                match (spectrum.wavelengths().get(row), spectrum.values().get(row)) {
                    (Some(x), Some(y)) => [format_scientific(*x), format_scientific(*y)],
                    _ => [String::new(), String::new()],
                }
            })
            .collect();
        content.push_str(&cells.join("\t"));
        content.push('\n');
    }
    content
}

pub fn write_columns(path: &Path, curves: &[(&str, &Spectrum)]) -> XsecResult<()> {
    fs::write(path, render_columns(curves)).map_err(|source| {
        XsecError::io_system(
            "IO.EXPORT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

/// Header-safe curve name: whitespace becomes `_`.
fn column_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{format_scientific, render_columns, write_columns};
    use crate::domain::{Spectrum, XsecErrorCategory};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn scientific_format_uses_signed_two_digit_exponents() {
        assert_eq!(format_scientific(1234.567), "1.23457e+03");
        assert_eq!(format_scientific(2.5e-21), "2.50000e-21");
        assert_eq!(format_scientific(0.0), "0.00000e+00");
        assert_eq!(format_scientific(-7.0e120), "-7.00000e+120");
        assert_eq!(format_scientific(f64::NAN), "nan");
    }

    #[test]
    fn shorter_curves_are_padded_with_empty_cells() {
        let long =
            Spectrum::from_pairs(&[(900.0, 1.0), (901.0, 2.0), (902.0, 3.0)]).expect("long");
        let short = Spectrum::from_pairs(&[(1000.0, 0.5)]).expect("short");

        let rendered = render_columns(&[("sigma_a", &long), ("sigma_e", &short)]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "X0_sigma_a\tY0_sigma_a\tX1_sigma_e\tY1_sigma_e");
        assert_eq!(
            lines[1],
            "9.00000e+02\t1.00000e+00\t1.00000e+03\t5.00000e-01"
        );
        assert_eq!(lines[3], "9.02000e+02\t3.00000e+00\t\t");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn whitespace_in_curve_names_cannot_break_the_header() {
        let curve = Spectrum::from_pairs(&[(1.0, 2.0)]).expect("curve");
        let rendered = render_columns(&[("low T\r\nrun", &curve)]);
        assert_eq!(rendered.lines().next(), Some("X0_low_T__run\tY0_low_T__run"));
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn repeated_exports_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("cross_sections.dat");
        let curve = Spectrum::from_pairs(&[(1.0, 2.0), (3.0, 4.0)]).expect("curve");

        write_columns(&path, &[("curve", &curve)]).expect("first write should succeed");
        let first = fs::read(&path).expect("export should be readable");
        write_columns(&path, &[("curve", &curve)]).expect("second write should succeed");
        let second = fs::read(&path).expect("export should be readable");

        assert_eq!(first, second);
        assert_eq!(
            String::from_utf8(second).expect("utf8"),
            "X0_curve\tY0_curve\n1.00000e+00\t2.00000e+00\n3.00000e+00\t4.00000e+00\n"
        );
    }

    #[test]
    fn export_into_missing_directory_is_an_io_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("missing").join("out.dat");
        let curve = Spectrum::from_pairs(&[(1.0, 2.0)]).expect("curve");

        let error = write_columns(&path, &[("curve", &curve)]).expect_err("missing directory");
        assert_eq!(error.category(), XsecErrorCategory::IoSystemError);
    }
}
