//! Dense real LU with partial pivoting for the small systems of the
//! calibration cubic and the local polynomial fits.

use super::DenseRealMatrix;

/// Pivots below this fraction of the largest matrix entry count as zero.
const RELATIVE_PIVOT_FLOOR: f64 = 1.0e-13;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LuError {
    #[error("expected a non-empty square matrix, got {rows}x{cols}")]
    Shape { rows: usize, cols: usize },
    #[error("matrix is singular in column {column}")]
    Singular { column: usize },
    #[error("right-hand side has {actual} entries, system has {expected}")]
    RhsLength { expected: usize, actual: usize },
}

/// `P A = L U` packed into one matrix; `L` has an implied unit diagonal and
/// `permutation[i]` is the source row of row `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct LuDecomposition {
    packed: DenseRealMatrix,
    permutation: Vec<usize>,
}

impl LuDecomposition {
    pub fn dimension(&self) -> usize {
        self.packed.nrows()
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    pub fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
        let n = self.dimension();
        if rhs.len() != n {
            return Err(LuError::RhsLength {
                expected: n,
                actual: rhs.len(),
            });
        }

        let lu = &self.packed;
        let mut x: Vec<f64> = self.permutation.iter().map(|source| rhs[*source]).collect();
        for row in 1..n {
            let correction: f64 = (0..row).map(|col| lu[(row, col)] * x[col]).sum();
            x[row] -= correction;
        }
        for row in (0..n).rev() {
            let correction: f64 = (row + 1..n).map(|col| lu[(row, col)] * x[col]).sum();
            x[row] = (x[row] - correction) / lu[(row, row)];
        }
        Ok(x)
    }
}

pub fn lu_factorize(matrix: &DenseRealMatrix) -> Result<LuDecomposition, LuError> {
    let (rows, cols) = (matrix.nrows(), matrix.ncols());
    if rows == 0 || rows != cols {
        return Err(LuError::Shape { rows, cols });
    }

    let largest = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .map(|index| matrix[index].abs())
        .fold(0.0_f64, f64::max);
    let floor = RELATIVE_PIVOT_FLOOR * largest;

    let mut packed = matrix.clone();
    let mut permutation: Vec<usize> = (0..rows).collect();
    for column in 0..rows {
        let magnitude = |row: &usize| packed[(*row, column)].abs();
        let pivot_row = (column..rows)
            .max_by(|lhs, rhs| magnitude(lhs).total_cmp(&magnitude(rhs)))
            .unwrap_or(column);
        let pivot = packed[(pivot_row, column)];
        if !pivot.is_finite() || pivot.abs() <= floor {
            return Err(LuError::Singular { column });
        }
        if pivot_row != column {
            for col in 0..cols {
                let held = packed[(column, col)];
                packed[(column, col)] = packed[(pivot_row, col)];
                packed[(pivot_row, col)] = held;
            }
            permutation.swap(column, pivot_row);
        }

        for row in column + 1..rows {
            let factor = packed[(row, column)] / pivot;
            packed[(row, column)] = factor;
            for col in column + 1..cols {
                let eliminated = packed[(row, col)] - factor * packed[(column, col)];
                packed[(row, col)] = eliminated;
            }
        }
    }

    Ok(LuDecomposition {
        packed,
        permutation,
    })
}

pub fn lu_solve(matrix: &DenseRealMatrix, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
    lu_factorize(matrix)?.solve(rhs)
}
