//! Dense matrices of [`Var`] with faer interop.
//!
//! Storage is column-major, matching faer. Products are built from
//! [`dot_product`] nodes, so an `m x k` by `k x n` product records `m * n`
//! nodes regardless of `k`.

use faer::{Mat, MatRef};
use smallvec::SmallVec;

use super::tape::with_tape;
use super::var::Var;
use super::vector::{dot_product, dot_product_const, dot_self, sum};
use crate::check::check_size_match;
use crate::error::AdError;

/// Column-major matrix of differentiable values.
#[derive(Debug, Clone)]
pub struct VarMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Var>,
}

impl VarMatrix {
    /// Create a matrix of new independent variables with the given values.
    pub fn from_values(values: MatRef<'_, f64>) -> Self {
        Self::from_fn(values.nrows(), values.ncols(), |i, j| {
            Var::new(values[(i, j)])
        })
    }

    /// Create a matrix by evaluating `f(i, j)` in column-major order.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Var) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for j in 0..cols {
            for i in 0..rows {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Wrap existing handles laid out in column-major order.
    pub fn from_vars(rows: usize, cols: usize, data: Vec<Var>) -> Result<Self, AdError> {
        check_size_match("VarMatrix::from_vars", rows * cols, data.len())?;
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> Result<Var, AdError> {
        let len = self.data.len();
        if i >= self.rows || j >= self.cols {
            return Err(AdError::IndexOutOfBounds {
                index: i + j * self.rows,
                len,
            });
        }
        Ok(self.data[i + j * self.rows])
    }

    /// All elements in column-major order.
    pub fn as_slice(&self) -> &[Var] {
        &self.data
    }

    /// Column `j` as a contiguous slice.
    pub fn column(&self, j: usize) -> Option<&[Var]> {
        (j < self.cols).then(|| &self.data[j * self.rows..(j + 1) * self.rows])
    }

    fn row(&self, i: usize) -> SmallVec<[Var; 16]> {
        (0..self.cols).map(|j| self.data[i + j * self.rows]).collect()
    }

    /// Forward values.
    pub fn values(&self) -> Mat<f64> {
        Mat::from_fn(self.rows, self.cols, |i, j| self.data[i + j * self.rows].val())
    }

    /// Current adjoints, read from the thread-local tape.
    pub fn adjoints(&self) -> Mat<f64> {
        with_tape(|tape| {
            Mat::from_fn(self.rows, self.cols, |i, j| {
                tape.adjoint(self.data[i + j * self.rows].id())
            })
        })
    }

    /// Matrix product `self * rhs`.
    pub fn multiply(&self, rhs: &VarMatrix) -> Result<VarMatrix, AdError> {
        check_size_match("VarMatrix::multiply", self.cols, rhs.rows)?;
        let mut data = Vec::with_capacity(self.rows * rhs.cols);
        for j in 0..rhs.cols {
            let col = &rhs.data[j * rhs.rows..(j + 1) * rhs.rows];
            for i in 0..self.rows {
                data.push(dot_product(&self.row(i), col)?);
            }
        }
        Ok(VarMatrix {
            rows: self.rows,
            cols: rhs.cols,
            data,
        })
    }

    /// Matrix product `self * rhs` with a constant right factor.
    pub fn multiply_const(&self, rhs: MatRef<'_, f64>) -> Result<VarMatrix, AdError> {
        check_size_match("VarMatrix::multiply_const", self.cols, rhs.nrows())?;
        let mut data = Vec::with_capacity(self.rows * rhs.ncols());
        for j in 0..rhs.ncols() {
            let weights: SmallVec<[f64; 16]> = (0..rhs.nrows()).map(|k| rhs[(k, j)]).collect();
            for i in 0..self.rows {
                data.push(dot_product_const(&self.row(i), &weights)?);
            }
        }
        Ok(VarMatrix {
            rows: self.rows,
            cols: rhs.ncols(),
            data,
        })
    }

    /// Transpose. Rearranges handles only; records nothing.
    pub fn transpose(&self) -> VarMatrix {
        VarMatrix::from_fn(self.cols, self.rows, |i, j| self.data[j + i * self.rows])
    }

    /// Sum of all elements.
    pub fn sum(&self) -> Var {
        sum(&self.data)
    }

    /// Sum of the diagonal of a square matrix.
    pub fn trace(&self) -> Result<Var, AdError> {
        check_size_match("VarMatrix::trace", self.rows, self.cols)?;
        let diag: SmallVec<[Var; 16]> = (0..self.rows)
            .map(|i| self.data[i + i * self.rows])
            .collect();
        Ok(sum(&diag))
    }

    /// Squared Frobenius norm.
    pub fn dot_self(&self) -> Var {
        dot_self(&self.data)
    }
}
