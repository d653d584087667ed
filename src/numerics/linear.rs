use std::collections::BTreeMap;

use nalgebra::DVector;

use crate::error::SolverError;
use crate::numerics::Convergence;

/// Compressed sparse row matrix with f64 entries.
pub struct CsrMatrix {
    nrows: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Assemble from `(row, col, value)` triplets, summing duplicates.
    pub fn from_triplets(n: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut rows: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        for &(i, j, v) in triplets {
            *rows[i].entry(j).or_insert(0.0) += v;
        }

        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for row in rows {
            for (j, v) in row {
                col_idx.push(j);
                values.push(v);
            }
            row_ptr.push(col_idx.len());
        }

        Self {
            nrows: n,
            row_ptr,
            col_idx,
            values,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut y = DVector::zeros(self.nrows);
        for i in 0..self.nrows {
            let mut acc = 0.0;
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                acc += self.values[idx] * x[self.col_idx[idx]];
            }
            y[i] = acc;
        }
        y
    }

    pub fn diagonal(&self) -> DVector<f64> {
        let mut d = DVector::zeros(self.nrows);
        for i in 0..self.nrows {
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                if self.col_idx[idx] == i {
                    d[i] = self.values[idx];
                }
            }
        }
        d
    }

    /// `beta * self + alpha * diag(d)`, sharing the sparsity pattern.
    /// Every diagonal position must be structurally present.
    pub fn combine(&self, beta: f64, d: &DVector<f64>, alpha: f64) -> CsrMatrix {
        let mut values: Vec<f64> = self.values.iter().map(|v| v * beta).collect();
        for i in 0..self.nrows {
            let mut found = false;
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                if self.col_idx[idx] == i {
                    values[idx] += alpha * d[i];
                    found = true;
                }
            }
            assert!(found, "row {i} is missing an explicit diagonal entry");
        }
        CsrMatrix {
            nrows: self.nrows,
            row_ptr: self.row_ptr.clone(),
            col_idx: self.col_idx.clone(),
            values,
        }
    }

    /// Iterate `(row, col, value)` over all stored entries.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.nrows).flat_map(move |i| {
            (self.row_ptr[i]..self.row_ptr[i + 1])
                .map(move |idx| (i, self.col_idx[idx], self.values[idx]))
        })
    }
}

/// Jacobi-preconditioned conjugate gradient for symmetric positive
/// definite systems. Returns the solution and the iteration count.
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    x0: DVector<f64>,
    convergence: &Convergence,
    max_iterations: u32,
) -> Result<(DVector<f64>, u32), SolverError> {
    let b_norm = convergence.norm(b);
    if b_norm == 0.0 {
        return Ok((DVector::zeros(a.nrows()), 0));
    }

    let diag = a.diagonal();
    let precondition = |r: &DVector<f64>| -> DVector<f64> {
        DVector::from_fn(r.len(), |i, _| r[i] / diag[i])
    };

    let mut x = x0;
    let mut r = b - a.matvec(&x);
    let mut z = precondition(&r);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iteration in 0..max_iterations {
        let r_norm = convergence.norm(&r);
        if convergence.check_tolerance(r_norm, b_norm) {
            return Ok((x, iteration));
        }

        let ap = a.matvec(&p);
        let alpha = rz / p.dot(&ap);
        x += &p * alpha;
        r -= &ap * alpha;

        z = precondition(&r);
        let rz_next = r.dot(&z);
        p = &z + &p * (rz_next / rz);
        rz = rz_next;
    }

    let r_norm = convergence.norm(&r);
    if convergence.check_tolerance(r_norm, b_norm) {
        return Ok((x, max_iterations));
    }
    Err(SolverError::IterativeSolveFailed {
        iterations: max_iterations,
        residual: r_norm,
    })
}
