//! Raw record grid shared by the loaders.
//!
//! Both loaders parse their source into a [`RawGrid`], which then resolves
//! the padded and display windows into validated surfaces.

use crate::Result;
use aerogrowth_core::time::TEXT_TIME_FORMAT;
use aerogrowth_core::{ConcentrationSurface, LoadedSurfaces, RequestedWindow};
use chrono::NaiveDateTime;
use log::{debug, info};
use ndarray::{Array2, Axis};

/// Parsed records before windowing.
///
/// `recorded` holds the timestamps as they appear in the source. `aligned`
/// holds the timestamps used as surface rows, which differ from `recorded`
/// only when the loader snaps stamps to the instrument cadence.
#[derive(Debug, Clone)]
pub struct RawGrid {
    recorded: Vec<NaiveDateTime>,
    aligned: Vec<NaiveDateTime>,
    diameters: Vec<f64>,
    values: Array2<f64>,
}

impl RawGrid {
    /// Creates a grid whose recorded timestamps are used unchanged.
    #[must_use]
    pub fn new(times: Vec<NaiveDateTime>, diameters: Vec<f64>, values: Array2<f64>) -> Self {
        Self {
            aligned: times.clone(),
            recorded: times,
            diameters,
            values,
        }
    }

    /// Replaces each row timestamp by `align(recorded)`.
    #[must_use]
    pub fn with_alignment(mut self, align: impl Fn(NaiveDateTime) -> NaiveDateTime) -> Self {
        self.aligned = self.recorded.iter().copied().map(align).collect();
        self
    }

    /// Recorded timestamps in source order.
    #[must_use]
    pub fn recorded(&self) -> &[NaiveDateTime] {
        &self.recorded
    }

    /// Row timestamps after alignment.
    #[must_use]
    pub fn aligned(&self) -> &[NaiveDateTime] {
        &self.aligned
    }

    /// Diameter channels in source order (nm).
    #[must_use]
    pub fn diameters(&self) -> &[f64] {
        &self.diameters
    }

    /// Concentrations, rows in source order; absent cells are NaN.
    #[must_use]
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Diameter channels holding at least one value, with the smallest and
    /// largest of them.
    #[must_use]
    pub fn channel_summary(&self) -> (usize, Option<(f64, f64)>) {
        let populated: Vec<f64> = (0..self.diameters.len())
            .filter(|&col| self.values.column(col).iter().any(|v| !v.is_nan()))
            .map(|col| self.diameters[col])
            .collect();
        let range = populated
            .iter()
            .copied()
            .fold(None, |acc: Option<(f64, f64)>, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            });
        (populated.len(), range)
    }

    /// First and last recorded timestamp.
    #[must_use]
    pub fn period(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.recorded.iter().min()?;
        let last = self.recorded.iter().max()?;
        Some((*first, *last))
    }

    /// Logs the period covered by the whole record.
    pub fn log_period(&self) {
        if let Some((first, last)) = self.period() {
            info!("start of period: {}", first.format(TEXT_TIME_FORMAT));
            info!("end of period: {}", last.format(TEXT_TIME_FORMAT));
        }
    }

    /// Cuts the padded and display surfaces for `window`.
    ///
    /// Rows are selected by their recorded timestamp, then validated on
    /// their aligned timestamp.
    ///
    /// # Errors
    /// Returns [`aerogrowth_core::Error::DuplicateTimestamp`] if aligned rows
    /// collide within either window.
    pub fn into_surfaces(self, window: &RequestedWindow) -> Result<LoadedSurfaces> {
        let padded = self.cut(window.padded_start(), window.padded_end())?;
        let display = self.cut(window.start(), window.end())?;
        debug!(
            "loaded {}x{} padded and {}x{} display surfaces",
            padded.n_times(),
            padded.n_diameters(),
            display.n_times(),
            display.n_diameters()
        );
        Ok(LoadedSurfaces {
            padded,
            display,
            window: *window,
        })
    }

    fn cut(&self, from: NaiveDateTime, to: NaiveDateTime) -> Result<ConcentrationSurface> {
        let rows: Vec<usize> = self
            .recorded
            .iter()
            .enumerate()
            .filter(|(_, t)| **t >= from && **t <= to)
            .map(|(row, _)| row)
            .collect();
        let recorded: Vec<NaiveDateTime> = rows.iter().map(|&row| self.recorded[row]).collect();
        let aligned: Vec<NaiveDateTime> = rows.iter().map(|&row| self.aligned[row]).collect();
        let values = self.values.select(Axis(0), &rows);

        let surface =
            ConcentrationSurface::from_aligned(&recorded, aligned, self.diameters.clone(), values)?;
        let dropped = self.diameters.len() - surface.n_diameters();
        if dropped > 0 {
            debug!("dropped {dropped} empty diameter channels between {from} and {to}");
        }
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerogrowth_core::time::align_to_half_hour;
    use aerogrowth_core::Error as CoreError;
    use chrono::{Duration, NaiveDate};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2004, 9, 20)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_windows_cut_by_recorded_time() {
        let start = at(0, 0) - Duration::days(1);
        let times: Vec<NaiveDateTime> = (0..72).map(|h| start + Duration::hours(h)).collect();
        let values = Array2::from_elem((times.len(), 2), 5.0);
        let grid = RawGrid::new(times, vec![3.0, 10.0], values);

        let window = RequestedWindow::parse("2004-09-20", "2004-09-20").unwrap();
        let surfaces = grid.into_surfaces(&window).unwrap();

        assert_eq!(surfaces.display.time_range(), Some((at(0, 0), at(23, 0))));
        assert_eq!(
            surfaces.padded.time_range(),
            Some((at(0, 0) - Duration::hours(12), at(23, 0) + Duration::hours(12)))
        );
    }

    #[test]
    fn test_duplicate_after_alignment_reports_recorded_stamps() {
        let times = vec![at(11, 50), at(12, 5), at(12, 40)];
        let values = Array2::from_elem((3, 1), 1.0);
        let grid = RawGrid::new(times.clone(), vec![10.0], values).with_alignment(align_to_half_hour);

        let window = RequestedWindow::parse("2004-09-20", "2004-09-20").unwrap();
        let err = grid.into_surfaces(&window).unwrap_err();
        match err {
            crate::Error::CoreError(CoreError::DuplicateTimestamp {
                original,
                duplicates,
            }) => {
                assert_eq!(original, times);
                assert_eq!(duplicates, vec![at(12, 15)]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_channel_dropped_per_window() {
        let times = vec![at(1, 0), at(2, 0), at(23, 0) + Duration::hours(6)];
        let mut values = Array2::from_elem((3, 2), f64::NAN);
        values[[0, 0]] = 1.0;
        values[[1, 0]] = 2.0;
        values[[2, 1]] = 3.0;
        let grid = RawGrid::new(times, vec![5.0, 20.0], values);

        let window = RequestedWindow::parse("2004-09-20", "2004-09-20").unwrap();
        let surfaces = grid.into_surfaces(&window).unwrap();
        assert_eq!(surfaces.display.diameters(), &[5.0]);
        assert_eq!(surfaces.padded.diameters(), &[5.0, 20.0]);
    }
}
