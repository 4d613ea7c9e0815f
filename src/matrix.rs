//! Matrix payload type: the unit of work staged through the buffer.

use std::fmt;

/// An owned rows x cols matrix of integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
}

/// Errors from matrix operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// Left operand's column count does not equal right operand's row count.
    ShapeMismatch,
}

impl Matrix {
    /// Create a matrix from row-major data.
    pub fn new(rows: usize, cols: usize, data: Vec<i64>) -> Self {
        assert_eq!(data.len(), rows * cols, "row-major data length must be rows * cols");
        Self { rows, cols, data }
    }

    /// Create a matrix with every element set to `value`.
    pub fn filled(rows: usize, cols: usize, value: i64) -> Self {
        Self::new(rows, cols, vec![value; rows * cols])
    }

    /// (rows, cols) of this matrix.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.data[row * self.cols + col]
    }

    /// Sum of all elements; the reduction recorded in run statistics.
    pub fn element_sum(&self) -> i64 {
        self.data.iter().sum()
    }

    /// Standard matrix product. Fails when the inner dimensions disagree;
    /// that is a normal domain outcome, not a fault.
    pub fn multiply(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols != rhs.rows {
            return Err(MatrixError::ShapeMismatch);
        }
        let mut data = vec![0i64; self.rows * rhs.cols];
        for i in 0..self.rows {
            for j in 0..rhs.cols {
                let mut acc = 0i64;
                for k in 0..self.cols {
                    acc += self.get(i, k) * rhs.get(k, j);
                }
                data[i * rhs.cols + j] = acc;
            }
        }
        Ok(Matrix::new(self.rows, rhs.cols, data))
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            write!(f, "|")?;
            for col in 0..self.cols {
                write!(f, " {:4}", self.get(row, col))?;
            }
            writeln!(f, " |")?;
        }
        Ok(())
    }
}
