use super::special::{DenseRealMatrix, LuDecomposition, LuError, lu_factorize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SmoothingError {
    #[error("polynomial window {window} exceeds the {length} available samples")]
    WindowExceedsLength { window: usize, length: usize },
    #[error("polynomial fit of order {order} over {window} samples is singular: {source}")]
    SingularFit {
        window: usize,
        order: usize,
        source: LuError,
    },
}

/// Centered moving average with edge clamping.
///
/// Output `i` is the mean of the `window` samples starting at `i - window/2`.
/// The first and last `window/2` outputs repeat the first and last raw
/// samples. `window <= 1`, or fewer samples than `window`, leaves the input
/// unchanged.
pub fn centered_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let length = values.len();
    if window <= 1 || length < window {
        return values.to_vec();
    }

    let half = window / 2;
    let mut prefix = Vec::with_capacity(length + 1);
    prefix.push(0.0);
    for value in values {
        let running = prefix[prefix.len() - 1] + value;
        prefix.push(running);
    }

    (0..length)
        .map(|index| {
            if index < half {
                values[0]
            } else if index >= length - half {
                values[length - 1]
            } else {
                let start = index - half;
                (prefix[start + window] - prefix[start]) / window as f64
            }
        })
        .collect()
}

/// Local least-squares polynomial smoothing (Savitzky-Golay).
///
/// Interior samples are replaced by the value at the sample of a polynomial
/// of degree `order` fitted over `window` neighbours (`(window - 1) / 2`
/// before, the rest after). The first and last half-windows are evaluated
/// from the polynomial fitted to the first and last full window. Callers skip
/// the filter when `window <= order`; here that combination returns the input.
pub fn savitzky_golay(
    values: &[f64],
    window: usize,
    order: usize,
) -> Result<Vec<f64>, SmoothingError> {
    if window <= order || window <= 1 {
        return Ok(values.to_vec());
    }
    let length = values.len();
    if length < window {
        return Err(SmoothingError::WindowExceedsLength { window, length });
    }

    let fit = LocalPolynomialFit::new(window, order)?;
    let before = (window - 1) / 2;
    let after = window - 1 - before;

    let centre_weights = fit.weights_at(0.0)?;
    let mut smoothed = vec![0.0; length];
    for index in before..(length - after) {
        smoothed[index] = dot(&centre_weights, &values[index - before..=index + after]);
    }

    let head = &values[..window];
    for index in 0..before {
        let weights = fit.weights_at(index as f64 - before as f64)?;
        smoothed[index] = dot(&weights, head);
    }

    let tail_start = length - window;
    let tail = &values[tail_start..];
    for index in (length - after)..length {
        let offset = index as f64 - (tail_start + before) as f64;
        let weights = fit.weights_at(offset)?;
        smoothed[index] = dot(&weights, tail);
    }

    Ok(smoothed)
}

/// Normal equations of a polynomial fit over sample offsets
/// `-before..=after`, in offsets scaled by the half width.
struct LocalPolynomialFit {
    offsets: Vec<f64>,
    order: usize,
    scale: f64,
    window: usize,
    normal: LuDecomposition,
}

impl LocalPolynomialFit {
    fn new(window: usize, order: usize) -> Result<Self, SmoothingError> {
        let before = (window - 1) / 2;
        let after = window - 1 - before;
        let scale = before.max(after).max(1) as f64;
        let offsets: Vec<f64> = (0..window)
            .map(|position| (position as f64 - before as f64) / scale)
            .collect();

        let terms = order + 1;
        let normal = DenseRealMatrix::from_fn(terms, terms, |row, col| {
            offsets.iter().map(|t| t.powi((row + col) as i32)).sum()
        });
        let normal = lu_factorize(&normal).map_err(|source| SmoothingError::SingularFit {
            window,
            order,
            source,
        })?;

        Ok(Self {
            offsets,
            order,
            scale,
            window,
            normal,
        })
    }

    /// Weights that evaluate the fitted polynomial at `offset` samples from
    /// the window anchor.
    fn weights_at(&self, offset: f64) -> Result<Vec<f64>, SmoothingError> {
        let t = offset / self.scale;
        let basis: Vec<f64> = (0..=self.order).map(|power| t.powi(power as i32)).collect();
        let coefficients = self
            .normal
            .solve(&basis)
            .map_err(|source| SmoothingError::SingularFit {
                window: self.window,
                order: self.order,
                source,
            })?;

        Ok(self
            .offsets
            .iter()
            .map(|x| {
                coefficients
                    .iter()
                    .enumerate()
                    .map(|(power, c)| c * x.powi(power as i32))
                    .sum()
            })
            .collect())
    }
}

fn dot(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values.iter()).map(|(w, v)| w * v).sum()
}
