#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearInterpolationInput<'a> {
    pub grid: &'a [f64],
    pub values: &'a [f64],
}

impl<'a> LinearInterpolationInput<'a> {
    pub fn new(grid: &'a [f64], values: &'a [f64]) -> Self {
        Self { grid, values }
    }
}

/// What to return for queries outside the sampled grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutOfRange {
    /// Hold the first/last sample value.
    Clamp,
    /// Return a fixed value.
    Fill(f64),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpolationError {
    #[error("interpolation requires at least 1 grid point")]
    EmptyGrid,
    #[error("interpolation input length mismatch: grid={grid}, values={values}")]
    LengthMismatch { grid: usize, values: usize },
    #[error("interpolation query must be finite, got {value}")]
    NonFiniteQuery { value: f64 },
}

/// Piecewise-linear interpolation of `queries` on an increasing grid.
pub fn resample_linear(
    input: LinearInterpolationInput<'_>,
    queries: &[f64],
    out_of_range: OutOfRange,
) -> Result<Vec<f64>, InterpolationError> {
    validate_input(input)?;
    queries
        .iter()
        .map(|query| evaluate(input, *query, out_of_range))
        .collect()
}

fn evaluate(
    input: LinearInterpolationInput<'_>,
    query: f64,
    out_of_range: OutOfRange,
) -> Result<f64, InterpolationError> {
    if !query.is_finite() {
        return Err(InterpolationError::NonFiniteQuery { value: query });
    }

    let grid = input.grid;
    let values = input.values;
    let last = grid.len() - 1;

    if query < grid[0] || query > grid[last] {
        return Ok(match out_of_range {
            OutOfRange::Clamp if query < grid[0] => values[0],
            OutOfRange::Clamp => values[last],
            OutOfRange::Fill(fill) => fill,
        });
    }

    match grid.binary_search_by(|node| node.total_cmp(&query)) {
        Ok(index) => Ok(values[index]),
        Err(upper) => {
            let lower = upper - 1;
            let x0 = grid[lower];
            let x1 = grid[upper];
            let fraction = (query - x0) / (x1 - x0);
            Ok(values[lower] + (values[upper] - values[lower]) * fraction)
        }
    }
}

fn validate_input(input: LinearInterpolationInput<'_>) -> Result<(), InterpolationError> {
    if input.grid.is_empty() {
        return Err(InterpolationError::EmptyGrid);
    }
    if input.grid.len() != input.values.len() {
        return Err(InterpolationError::LengthMismatch {
            grid: input.grid.len(),
            values: input.values.len(),
        });
    }

    Ok(())
}
