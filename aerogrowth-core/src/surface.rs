//! Concentration surface: particle number-size distribution over time.
//!
//! Rows are timestamps, columns are diameter channels in nanometers.
//! Absent cells are stored as NaN.

use crate::time::{Epoch, RequestedWindow};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// A validated concentration surface.
///
/// Invariants upheld by every constructor:
/// - timestamps are strictly increasing (and therefore unique)
/// - diameters are finite and strictly increasing
/// - every column holds at least one defined value
#[derive(Debug, Clone)]
pub struct ConcentrationSurface {
    times: Vec<NaiveDateTime>,
    diameters: Vec<f64>,
    values: Array2<f64>,
}

impl ConcentrationSurface {
    /// Builds a surface from rows whose timestamps need no alignment.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateTimestamp`] if two rows share a timestamp and
    /// [`Error::DataFormat`] if the shape or diameter axis is invalid.
    pub fn new(
        times: Vec<NaiveDateTime>,
        diameters: Vec<f64>,
        values: Array2<f64>,
    ) -> Result<Self> {
        let original = times.clone();
        Self::from_aligned(&original, times, diameters, values)
    }

    /// Builds a surface from aligned rows, reporting `original` stamps on
    /// collision.
    ///
    /// Rows are ordered by aligned time, columns by diameter, and columns
    /// without any defined value are dropped.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateTimestamp`] if two aligned rows collide and
    /// [`Error::DataFormat`] if the shape or diameter axis is invalid.
    pub fn from_aligned(
        original: &[NaiveDateTime],
        aligned: Vec<NaiveDateTime>,
        diameters: Vec<f64>,
        values: Array2<f64>,
    ) -> Result<Self> {
        if values.dim() != (aligned.len(), diameters.len()) {
            return Err(Error::DataFormat(format!(
                "concentration shape {:?} does not match {} timestamps x {} diameters",
                values.dim(),
                aligned.len(),
                diameters.len()
            )));
        }
        if let Some(bad) = diameters.iter().find(|d| !d.is_finite() || **d <= 0.0) {
            return Err(Error::DataFormat(format!("invalid diameter channel: {bad}")));
        }

        let mut row_order: Vec<usize> = (0..aligned.len()).collect();
        row_order.sort_by_key(|&row| aligned[row]);

        let duplicates: Vec<NaiveDateTime> = row_order
            .windows(2)
            .filter(|pair| aligned[pair[0]] == aligned[pair[1]])
            .map(|pair| aligned[pair[0]])
            .collect();
        if !duplicates.is_empty() {
            let mut duplicates = duplicates;
            duplicates.dedup();
            return Err(Error::DuplicateTimestamp {
                original: original.to_vec(),
                duplicates,
            });
        }

        let mut col_order: Vec<usize> = (0..diameters.len())
            .filter(|&col| values.column(col).iter().any(|v| !v.is_nan()))
            .collect();
        col_order.sort_by(|&a, &b| diameters[a].total_cmp(&diameters[b]));
        if let Some(pair) = col_order
            .windows(2)
            .find(|pair| diameters[pair[0]] >= diameters[pair[1]])
        {
            return Err(Error::DataFormat(format!(
                "duplicate diameter channel: {} nm",
                diameters[pair[1]]
            )));
        }

        let values = values
            .select(Axis(0), &row_order)
            .select(Axis(1), &col_order);
        Ok(Self {
            times: row_order.iter().map(|&row| aligned[row]).collect(),
            diameters: col_order.iter().map(|&col| diameters[col]).collect(),
            values,
        })
    }

    /// Returns the timestamps (rows).
    #[must_use]
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Returns the diameter channels in nanometers (columns).
    #[must_use]
    pub fn diameters(&self) -> &[f64] {
        &self.diameters
    }

    /// Returns the concentration grid.
    #[must_use]
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Returns one diameter channel over time.
    #[must_use]
    pub fn channel(&self, col: usize) -> ArrayView1<'_, f64> {
        self.values.column(col)
    }

    /// Returns the concentration at a cell, `None` if absent.
    #[must_use]
    pub fn concentration(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied().filter(|v| !v.is_nan())
    }

    /// Number of timestamps.
    #[must_use]
    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    /// Number of diameter channels.
    #[must_use]
    pub fn n_diameters(&self) -> usize {
        self.diameters.len()
    }

    /// Returns true if the surface has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// First and last timestamp.
    #[must_use]
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((*self.times.first()?, *self.times.last()?))
    }

    /// First and last timestamp as day offsets from `epoch`.
    #[must_use]
    pub fn day_range(&self, epoch: &Epoch) -> Option<(f64, f64)> {
        let (first, last) = self.time_range()?;
        Some((epoch.days_since(first), epoch.days_since(last)))
    }

    /// Returns the channel closest to `diameter` on a logarithmic axis.
    #[must_use]
    pub fn nearest_diameter(&self, diameter: f64) -> Option<f64> {
        let target = diameter.ln();
        self.diameters
            .iter()
            .copied()
            .min_by(|a, b| (a.ln() - target).abs().total_cmp(&(b.ln() - target).abs()))
    }

    /// Compares two surfaces bit for bit, treating absent cells as equal.
    #[must_use]
    pub fn bitwise_eq(&self, other: &Self) -> bool {
        self.times == other.times
            && self.diameters.len() == other.diameters.len()
            && self
                .diameters
                .iter()
                .zip(&other.diameters)
                .all(|(a, b)| a.to_bits() == b.to_bits())
            && self.values.dim() == other.values.dim()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    /// Returns the rows within `[from, to]`, dropping channels left empty.
    #[must_use]
    pub fn slice_time(&self, from: NaiveDateTime, to: NaiveDateTime) -> Self {
        let rows: Vec<usize> = self
            .times
            .iter()
            .enumerate()
            .filter(|(_, t)| **t >= from && **t <= to)
            .map(|(row, _)| row)
            .collect();
        let values = self.values.select(Axis(0), &rows);
        let cols: Vec<usize> = (0..self.diameters.len())
            .filter(|&col| values.column(col).iter().any(|v| !v.is_nan()))
            .collect();
        Self {
            times: rows.iter().map(|&row| self.times[row]).collect(),
            diameters: cols.iter().map(|&col| self.diameters[col]).collect(),
            values: values.select(Axis(1), &cols),
        }
    }
}

/// The pair of surfaces produced by one load.
#[derive(Debug, Clone)]
pub struct LoadedSurfaces {
    /// Requested window extended by the detection padding.
    pub padded: ConcentrationSurface,
    /// Requested window only.
    pub display: ConcentrationSurface,
    /// Window the surfaces were cut to.
    pub window: RequestedWindow,
}

impl LoadedSurfaces {
    /// The run epoch.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.window.epoch()
    }
}
