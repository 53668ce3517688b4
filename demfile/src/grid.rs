//! Sampling over row-major, big-endian `i16` grids.
//!
//! Both GL1 tiles and the GL30 raster store their samples this way;
//! they differ only in how a geographic position maps onto a
//! fractional (row, column).

use crate::{
    sample::{Altitude, RawSample, VOID_SAMPLE},
    DemError,
};
use byteorder::{BigEndian as BE, ByteOrder};
use std::mem::size_of;

#[derive(Clone, Copy)]
pub(crate) struct BeGrid<'a> {
    samples: &'a [u8],
    /// Number of (rows, columns).
    dimensions: (usize, usize),
}

impl<'a> BeGrid<'a> {
    pub(crate) fn new(
        samples: &'a [u8],
        dimensions @ (rows, cols): (usize, usize),
    ) -> Result<Self, DemError> {
        let expected = rows * cols * size_of::<i16>();
        if rows < 2 || cols < 2 || samples.len() != expected {
            return Err(DemError::format(
                "grid",
                format!(
                    "{} bytes do not hold {rows}x{cols} samples",
                    samples.len()
                ),
            ));
        }
        Ok(Self {
            samples,
            dimensions,
        })
    }

    fn get_xy(&self, row: usize, col: usize) -> i16 {
        let start = (row * self.dimensions.1 + col) * size_of::<i16>();
        BE::read_i16(&self.samples[start..start + size_of::<i16>()])
    }

    /// Returns the sample at the truncated (`row_pos`, `col_pos`).
    ///
    /// Positions must lie in `[0, rows - 1] x [0, cols - 1]`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn nearest(&self, row_pos: f64, col_pos: f64) -> RawSample {
        let row = (row_pos.trunc() as usize).min(self.dimensions.0 - 1);
        let col = (col_pos.trunc() as usize).min(self.dimensions.1 - 1);
        RawSample::new(self.get_xy(row, col))
    }

    /// Bilinearly interpolates the 2x2 neighborhood of
    /// (`row_pos`, `col_pos`).
    ///
    /// Positions must lie in `[0, rows - 1] x [0, cols - 1]`. The
    /// upper/left sample is weighted by `1 - fract(pos)`. A void
    /// neighbor with non-zero weight makes the result "no data".
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn bilinear(&self, row_pos: f64, col_pos: f64) -> Altitude {
        let row = (row_pos.floor() as usize).min(self.dimensions.0 - 2);
        let col = (col_pos.floor() as usize).min(self.dimensions.1 - 2);

        #[allow(clippy::cast_precision_loss)]
        let row_coeff = 1.0 - (row_pos - row as f64);
        #[allow(clippy::cast_precision_loss)]
        let col_coeff = 1.0 - (col_pos - col as f64);

        // [a, b]
        // [c, d]
        let weighted = |sample: i16, weight: f64| -> Option<f64> {
            match (sample, weight) {
                (VOID_SAMPLE, w) if w == 0.0 => Some(0.0),
                (VOID_SAMPLE, _) => None,
                (s, _) => Some(f64::from(s)),
            }
        };
        let corners = (
            weighted(self.get_xy(row, col), row_coeff * col_coeff),
            weighted(self.get_xy(row, col + 1), row_coeff * (1.0 - col_coeff)),
            weighted(self.get_xy(row + 1, col), (1.0 - row_coeff) * col_coeff),
            weighted(
                self.get_xy(row + 1, col + 1),
                (1.0 - row_coeff) * (1.0 - col_coeff),
            ),
        );
        let (Some(a), Some(b), Some(c), Some(d)) = corners else {
            return Altitude::NONE;
        };

        let upper = col_coeff.mul_add(a - b, b);
        let lower = col_coeff.mul_add(c - d, d);
        Altitude::new(row_coeff.mul_add(upper - lower, lower))
    }

    /// Iterates every sample in file order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = i16> + 'a {
        let samples: &'a [u8] = self.samples;
        samples.chunks_exact(size_of::<i16>()).map(BE::read_i16)
    }
}
