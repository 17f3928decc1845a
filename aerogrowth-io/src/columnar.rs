//! Columnar (NetCDF4/HDF5) dataset loader.
//!
//! Reads the `time` and `bin` coordinate variables and a 2-D concentration
//! variable dimensioned `(time, bin)`. Bins are stored in meters.
#![allow(clippy::cast_possible_truncation)]

use crate::grid::RawGrid;
use crate::loader::SurfaceLoader;
use crate::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use hdf5::types::{H5Type, VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, File};
use log::debug;
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Default concentration variable.
pub const DEFAULT_VARIABLE: &str = "PNSD";

/// Meters to nanometers.
pub const BIN_TO_NANOMETERS: f64 = 1e9;

/// Loader for NetCDF4/HDF5 size-distribution datasets.
#[derive(Debug, Clone)]
pub struct ColumnarLoader {
    path: PathBuf,
    variable: String,
}

impl ColumnarLoader {
    /// Creates a loader reading [`DEFAULT_VARIABLE`].
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            variable: DEFAULT_VARIABLE.to_string(),
        }
    }

    /// Sets the concentration variable.
    #[must_use]
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }
}

impl SurfaceLoader for ColumnarLoader {
    fn grid(&self) -> Result<RawGrid> {
        let file = File::open(&self.path)?;

        let time_ds = file
            .dataset("time")
            .map_err(|_| Error::data_format("missing variable 'time'"))?;
        let units = read_attr_string(&time_ds, "units")?
            .ok_or_else(|| Error::data_format("variable 'time' has no units"))?;
        let offsets = time_ds.read_raw::<f64>()?;
        let times = decode_cf_times(&offsets, &units)?;

        let bins = file
            .dataset("bin")
            .map_err(|_| Error::data_format("missing variable 'bin'"))?
            .read_raw::<f64>()?;
        let diameters: Vec<f64> = bins.iter().map(|bin| bin * BIN_TO_NANOMETERS).collect();

        let data_ds = file
            .dataset(&self.variable)
            .map_err(|_| Error::data_format(format!("missing variable '{}'", self.variable)))?;
        let values = orient(data_ds.read_2d::<f64>()?, times.len(), diameters.len())?;
        let values = match read_attr_opt::<f64>(&data_ds, "_FillValue") {
            Some(fill) => values.mapv(|v| if v.to_bits() == fill.to_bits() { f64::NAN } else { v }),
            None => values,
        };

        debug!(
            "read {} x {} '{}' from {}",
            times.len(),
            diameters.len(),
            self.variable,
            self.path.display()
        );
        Ok(RawGrid::new(times, diameters, values))
    }

    fn name(&self) -> &'static str {
        "columnar"
    }
}

/// Brings the concentration grid into `(time, bin)` order.
fn orient(values: Array2<f64>, n_times: usize, n_bins: usize) -> Result<Array2<f64>> {
    match values.dim() {
        (rows, cols) if rows == n_times && cols == n_bins => Ok(values),
        (rows, cols) if rows == n_bins && cols == n_times => Ok(values.reversed_axes()),
        dim => Err(Error::data_format(format!(
            "concentration shape {dim:?} does not match {n_times} times x {n_bins} bins"
        ))),
    }
}

/// Decodes CF time offsets (`<unit> since <reference>`), rounded to
/// milliseconds.
///
/// # Errors
/// Returns a data format error for unknown units or an unparsable reference.
pub fn decode_cf_times(offsets: &[f64], units: &str) -> Result<Vec<NaiveDateTime>> {
    let (unit, reference) = units
        .split_once(" since ")
        .ok_or_else(|| Error::data_format(format!("undecodable time units '{units}'")))?;
    let millis_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "days" | "day" | "d" => 86_400_000.0,
        "hours" | "hour" | "h" => 3_600_000.0,
        "minutes" | "minute" | "min" => 60_000.0,
        "seconds" | "second" | "s" => 1_000.0,
        other => {
            return Err(Error::data_format(format!("unsupported time unit '{other}'")));
        }
    };
    let origin = parse_reference(reference)
        .ok_or_else(|| Error::data_format(format!("undecodable time reference '{reference}'")))?;

    offsets
        .iter()
        .map(|&offset| {
            if offset.is_finite() {
                Ok(origin + Duration::milliseconds((offset * millis_per_unit).round() as i64))
            } else {
                Err(Error::data_format(format!("non-finite time offset {offset}")))
            }
        })
        .collect()
}

fn parse_reference(reference: &str) -> Option<NaiveDateTime> {
    let cleaned = reference
        .trim()
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim()
        .replace('T', " ");
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(&cleaned, pattern).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn read_attr_opt<T: H5Type + Clone>(dataset: &Dataset, name: &str) -> Option<T> {
    dataset.attr(name).ok()?.read_scalar::<T>().ok()
}

fn read_attr_string(dataset: &Dataset, name: &str) -> Result<Option<String>> {
    let Ok(attr) = dataset.attr(name) else {
        return Ok(None);
    };
    if let Ok(value) = attr.read_scalar::<VarLenUnicode>() {
        return Ok(Some(value.to_string()));
    }
    let value: VarLenAscii = attr.read_scalar()?;
    Ok(Some(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerogrowth_core::RequestedWindow;
    use approx::assert_relative_eq;
    use ndarray::{arr1, ArrayView1};
    use std::str::FromStr;
    use tempfile::NamedTempFile;

    const FILL: f64 = -999.0;

    fn write_dataset(path: &Path, time_units: &str, times: &[f64], values: &Array2<f64>) {
        let file = File::create(path).unwrap();
        let time_ds = file.new_dataset::<f64>().shape((times.len(),)).create("time").unwrap();
        time_ds.write(ArrayView1::from(times)).unwrap();
        time_ds
            .new_attr::<VarLenUnicode>()
            .create("units")
            .unwrap()
            .write_scalar(&VarLenUnicode::from_str(time_units).unwrap())
            .unwrap();

        let bins = arr1(&[3e-9, 10e-9, 25e-9]);
        let bin_ds = file.new_dataset::<f64>().shape((3,)).create("bin").unwrap();
        bin_ds.write(&bins).unwrap();

        let data_ds = file
            .new_dataset::<f64>()
            .shape(values.dim())
            .create(DEFAULT_VARIABLE)
            .unwrap();
        data_ds.write(values).unwrap();
        data_ds
            .new_attr::<f64>()
            .create("_FillValue")
            .unwrap()
            .write_scalar(&FILL)
            .unwrap();
    }

    #[test]
    fn test_decode_cf_times() {
        let times = decode_cf_times(&[0.0, 0.5, 1.25], "days since 2004-09-20 00:00:00").unwrap();
        assert_eq!(times[1].to_string(), "2004-09-20 12:00:00");
        assert_eq!(times[2].to_string(), "2004-09-21 06:00:00");

        let times = decode_cf_times(&[90.0], "minutes since 2004-09-20T00:00:00Z").unwrap();
        assert_eq!(times[0].to_string(), "2004-09-20 01:30:00");

        assert!(decode_cf_times(&[0.0], "fortnights since 2004-09-20").is_err());
        assert!(decode_cf_times(&[0.0], "days").is_err());
    }

    #[test]
    fn test_load_columnar_dataset() {
        let file = NamedTempFile::new().unwrap();
        // 2004-09-19 00:00 .. 2004-09-21 21:00, three-hourly
        let times: Vec<f64> = (0..24).map(|i| f64::from(i) * 3.0).collect();
        let mut values = Array2::from_elem((times.len(), 3), 100.0);
        values.column_mut(2).fill(FILL);
        write_dataset(file.path(), "hours since 2004-09-19 00:00:00", &times, &values);

        let loader = ColumnarLoader::new(file.path());
        let window = RequestedWindow::parse("2004-09-20", "2004-09-20").unwrap();
        let surfaces = loader.load(&window).unwrap();

        // fill-only channel is dropped, bins are converted to nm
        assert_eq!(surfaces.display.n_diameters(), 2);
        assert_relative_eq!(surfaces.display.diameters()[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(surfaces.display.diameters()[1], 10.0, epsilon = 1e-9);

        let (first, last) = surfaces.display.time_range().unwrap();
        assert_eq!(first.to_string(), "2004-09-20 00:00:00");
        assert_eq!(last.to_string(), "2004-09-20 21:00:00");
        let (first, last) = surfaces.padded.time_range().unwrap();
        assert_eq!(first.to_string(), "2004-09-19 12:00:00");
        assert_eq!(last.to_string(), "2004-09-21 09:00:00");

        let again = loader.load(&window).unwrap();
        assert!(again.padded.bitwise_eq(&surfaces.padded));
        assert!(again.display.bitwise_eq(&surfaces.display));
    }

    #[test]
    fn test_missing_variable() {
        let file = NamedTempFile::new().unwrap();
        let values = Array2::from_elem((2, 3), 1.0);
        write_dataset(file.path(), "days since 2004-09-20", &[0.0, 0.5], &values);

        let err = ColumnarLoader::new(file.path())
            .with_variable("PNSD_std")
            .grid()
            .unwrap_err();
        assert!(matches!(err, Error::CoreError(aerogrowth_core::Error::DataFormat(_))));
    }
}
