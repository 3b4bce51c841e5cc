//! Cross-check of a device matrix-multiplication dump against a software
//! reference.

use std::fmt;

use crate::{HexWord, MatrixError, word_to_f32};

pub const DEFAULT_TOLERANCE: f32 = 1e-3;

/// Row-major `f32` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, MatrixError> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(MatrixError::ShapeMismatch {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.cols.max(1)) {
            let cells: Vec<String> = row.iter().map(|x| format!("{x:8.3}")).collect();
            writeln!(f, "  {}", cells.join("  "))?;
        }
        Ok(())
    }
}

/// The three matrices of a device dump: operands and the device result.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixDump {
    pub a: Matrix,
    pub b: Matrix,
    pub c: Matrix,
}

struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    line: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
            line: 0,
        }
    }

    /// Next non-blank line, trimmed, with its 1-based line number.
    fn next_nonblank(&mut self, expected: &'static str) -> Result<(usize, &'a str), MatrixError> {
        for (idx, line) in self.inner.by_ref() {
            self.line = idx + 1;
            let line = line.trim();
            if !line.is_empty() {
                return Ok((self.line, line));
            }
        }
        Err(MatrixError::Truncated {
            expected,
            line: self.line + 1,
        })
    }
}

/// Parses `X:<rows>,Y:<cols>`; the labels are informational only.
fn parse_header(line_no: usize, text: &str) -> Result<(usize, usize), MatrixError> {
    let bad = || MatrixError::BadHeader {
        line: line_no,
        text: text.to_string(),
    };
    let mut dims = text.split(',').map(|part| {
        part.split_once(':')
            .map_or(part, |(_, value)| value)
            .trim()
            .parse::<usize>()
            .map_err(|_| bad())
    });
    let rows = dims.next().ok_or_else(bad)??;
    let cols = dims.next().ok_or_else(bad)??;
    if dims.next().is_some() {
        return Err(bad());
    }
    Ok((rows, cols))
}

fn parse_matrix(lines: &mut Lines<'_>, header: &'static str) -> Result<Matrix, MatrixError> {
    let (line_no, text) = lines.next_nonblank(header)?;
    let (rows, cols) = parse_header(line_no, text)?;
    let len = rows.checked_mul(cols).ok_or_else(|| MatrixError::BadHeader {
        line: line_no,
        text: text.to_string(),
    })?;
    let mut data = Vec::new();
    for _ in 0..len {
        let (line_no, text) = lines.next_nonblank("matrix element")?;
        let word: HexWord = text.parse().map_err(|_| MatrixError::BadValue {
            line: line_no,
            text: text.to_string(),
        })?;
        data.push(word_to_f32(word.0));
    }
    Matrix::new(rows, cols, data)
}

/// Parses a device dump: three `dims` headers, each followed by its elements
/// as big-endian IEEE-754 hex words, one per line.
pub fn parse_dump(text: &str) -> Result<MatrixDump, MatrixError> {
    let mut lines = Lines::new(text);
    let a = parse_matrix(&mut lines, "M:<m>,K:<k> header")?;
    let b = parse_matrix(&mut lines, "K:<k>,N:<n> header")?;
    let c = parse_matrix(&mut lines, "M:<m>,N:<n> header")?;
    if a.cols != b.rows {
        return Err(dimension_mismatch(&a, &b));
    }
    Ok(MatrixDump { a, b, c })
}

fn dimension_mismatch(lhs: &Matrix, rhs: &Matrix) -> MatrixError {
    MatrixError::DimensionMismatch {
        lhs_rows: lhs.rows,
        lhs_cols: lhs.cols,
        rhs_rows: rhs.rows,
        rhs_cols: rhs.cols,
    }
}

/// Software reference product.
pub fn matmul(a: &Matrix, b: &Matrix) -> Result<Matrix, MatrixError> {
    if a.cols != b.rows {
        return Err(dimension_mismatch(a, b));
    }
    let len = a
        .rows
        .checked_mul(b.cols)
        .ok_or_else(|| dimension_mismatch(a, b))?;
    let mut data = Vec::with_capacity(len);
    for i in 0..a.rows {
        for j in 0..b.cols {
            let acc = (0..a.cols).fold(0.0f32, |acc, k| acc + a.at(i, k) * b.at(k, j));
            data.push(acc);
        }
    }
    Matrix::new(a.rows, b.cols, data)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementCheck {
    pub row: usize,
    pub col: usize,
    pub device: f32,
    pub software: f32,
    pub matches: bool,
}

impl fmt::Display for ElementCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C[{}][{}] => DUT: {:.6} | SW: {:.6} --> {}",
            self.row,
            self.col,
            self.device,
            self.software,
            if self.matches { "✅" } else { "❌" }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub elements: Vec<ElementCheck>,
}

impl Comparison {
    pub fn passed(&self) -> bool {
        self.elements.iter().all(|e| e.matches)
    }

    pub fn max_difference(&self) -> f32 {
        self.elements
            .iter()
            .map(|e| (e.device - e.software).abs())
            .fold(0.0, f32::max)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            writeln!(f, "{element}")?;
        }
        if self.passed() {
            write!(f, "✅ ALL PASS")
        } else {
            write!(f, "❌ MISMATCH DETECTED")
        }
    }
}

/// Element-wise comparison with an absolute tolerance.
pub fn compare(
    software: &Matrix,
    device: &Matrix,
    tolerance: f32,
) -> Result<Comparison, MatrixError> {
    if software.rows != device.rows || software.cols != device.cols {
        return Err(dimension_mismatch(software, device));
    }
    let elements = software
        .data
        .iter()
        .zip(&device.data)
        .enumerate()
        .map(|(idx, (&sw, &dut))| ElementCheck {
            row: idx / software.cols,
            col: idx % software.cols,
            device: dut,
            software: sw,
            matches: (sw - dut).abs() < tolerance,
        })
        .collect();
    Ok(Comparison { elements })
}
