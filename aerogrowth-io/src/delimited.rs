//! Delimited-file loader.
//!
//! Records carry `Year,Month,Day,Hour,Minute,Second` columns followed by one
//! column per diameter bin, with the bin encoded in the header as a
//! mantissa/exponent pair (`HYY_DMPS.d112e2` is 11.2 nm).
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::grid::RawGrid;
use crate::loader::SurfaceLoader;
use crate::{Error, Result};
use aerogrowth_core::time::align_to_half_hour;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::debug;
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Names of the time columns, in order.
pub const TIME_COLUMNS: [&str; 6] = ["Year", "Month", "Day", "Hour", "Minute", "Second"];

/// Diameter assigned to the open-ended top bin (nm).
pub const SENTINEL_DIAMETER: f64 = 1000.0;

/// A decoded diameter-bin header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinLabel {
    /// Mantissa digits as an integer.
    pub mantissa: u32,
    /// Number of mantissa digits before the decimal point.
    pub exponent: u32,
    /// Decoded diameter (nm).
    pub diameter: f64,
}

impl BinLabel {
    /// Sort key of the bin columns.
    #[must_use]
    pub fn order_key(&self) -> (u32, u32) {
        (self.exponent, self.mantissa)
    }
}

/// Decodes a header such as `HYY_DMPS.d112e2` into 11.2 nm.
///
/// # Errors
/// Returns a data format error if the mantissa or exponent is not numeric,
/// or if the exponent points past the mantissa digits.
pub fn decode_bin_label(label: &str) -> Result<BinLabel> {
    let code = label.rsplit_once('.').map_or(label, |(_, code)| code).trim();
    let (mantissa, exponent) = code
        .strip_prefix('d')
        .and_then(|rest| rest.split_once('e'))
        .ok_or_else(|| Error::data_format(format!("malformed diameter bin label '{label}'")))?;

    let numeric = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !numeric(mantissa) || !numeric(exponent) {
        return Err(Error::data_format(format!(
            "non-numeric mantissa/exponent in diameter bin label '{label}'"
        )));
    }

    let position: usize = exponent
        .parse()
        .map_err(|e| Error::data_format(format!("bad exponent in '{label}': {e}")))?;
    if position > mantissa.len() {
        return Err(Error::data_format(format!(
            "exponent {position} exceeds mantissa digits in '{label}'"
        )));
    }

    let diameter: f64 = format!("{}.{}", &mantissa[..position], &mantissa[position..])
        .parse()
        .map_err(|e| Error::data_format(format!("bad mantissa in '{label}': {e}")))?;
    let mantissa_value: u32 = mantissa
        .parse()
        .map_err(|e| Error::data_format(format!("bad mantissa in '{label}': {e}")))?;

    Ok(BinLabel {
        mantissa: mantissa_value,
        exponent: position as u32,
        diameter,
    })
}

/// Decodes bin headers into diameters in column order, remapping the
/// highest bin to [`SENTINEL_DIAMETER`].
///
/// # Errors
/// Returns a data format error if any header cannot be decoded.
pub fn decode_bin_headers<'a, I>(labels: I) -> Result<Vec<f64>>
where
    I: IntoIterator<Item = &'a str>,
{
    let bins = labels
        .into_iter()
        .map(decode_bin_label)
        .collect::<Result<Vec<_>>>()?;
    let mut diameters: Vec<f64> = bins.iter().map(|bin| bin.diameter).collect();
    if let Some(top) = (0..bins.len()).max_by_key(|&i| bins[i].order_key()) {
        diameters[top] = SENTINEL_DIAMETER;
    }
    Ok(diameters)
}

/// Loader for comma-separated size-distribution records.
#[derive(Debug, Clone)]
pub struct DelimitedLoader {
    path: PathBuf,
    delimiter: u8,
}

impl DelimitedLoader {
    /// Creates a loader for a comma-separated file.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter: b',',
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn read_records<R: std::io::Read>(&self, reader: R) -> Result<RawGrid> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let time_index = TIME_COLUMNS
            .iter()
            .map(|name| {
                headers.iter().position(|h| h == *name).ok_or_else(|| {
                    Error::data_format(format!("missing time column '{name}'"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let bin_index: Vec<usize> = (0..headers.len())
            .filter(|i| !time_index.contains(i))
            .collect();
        let diameters = decode_bin_headers(bin_index.iter().map(|&i| &headers[i]))?;

        let mut times = Vec::new();
        let mut cells = Vec::new();
        for (line, record) in csv.records().enumerate() {
            let record = record?;
            let fields: Vec<&str> = time_index.iter().map(|&i| &record[i]).collect();
            times.push(parse_time_fields(&fields).map_err(|e| {
                Error::data_format(format!("record {}: {e}", line + 1))
            })?);
            for &i in &bin_index {
                cells.push(parse_concentration(record.get(i).unwrap_or_default())?);
            }
        }

        let values = Array2::from_shape_vec((times.len(), diameters.len()), cells)
            .map_err(|e| Error::InvalidFormat(format!("ragged delimited record: {e}")))?;
        debug!(
            "read {} records with {} diameter bins from {}",
            times.len(),
            diameters.len(),
            self.path.display()
        );
        Ok(RawGrid::new(times, diameters, values).with_alignment(align_to_half_hour))
    }

    /// Parses the whole file without windowing.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a header or cell is
    /// malformed.
    pub fn read_grid(&self) -> Result<RawGrid> {
        let file = std::fs::File::open(&self.path)?;
        self.read_records(std::io::BufReader::new(file))
    }
}

impl SurfaceLoader for DelimitedLoader {
    fn grid(&self) -> Result<RawGrid> {
        self.read_grid()
    }

    fn name(&self) -> &'static str {
        "delimited"
    }
}

fn parse_time_fields(fields: &[&str]) -> std::result::Result<NaiveDateTime, String> {
    let number = |i: usize| -> std::result::Result<f64, String> {
        fields[i]
            .parse::<f64>()
            .map_err(|e| format!("{} '{}': {e}", TIME_COLUMNS[i], fields[i]))
    };
    let whole = |i: usize| -> std::result::Result<u32, String> {
        let value = number(i)?;
        if value.fract() != 0.0 || value < 0.0 {
            return Err(format!("{} '{}' is not a whole number", TIME_COLUMNS[i], fields[i]));
        }
        Ok(value as u32)
    };

    let year = number(0)? as i32;
    let date = NaiveDate::from_ymd_opt(year, whole(1)?, whole(2)?)
        .ok_or_else(|| format!("invalid date {}-{}-{}", fields[0], fields[1], fields[2]))?;
    let time = date
        .and_hms_opt(whole(3)?, whole(4)?, 0)
        .ok_or_else(|| format!("invalid time {}:{}", fields[3], fields[4]))?;
    let seconds = number(5)?;
    Ok(time + Duration::milliseconds((seconds * 1000.0).round() as i64))
}

fn parse_concentration(cell: &str) -> Result<f64> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|e| Error::data_format(format!("bad concentration '{cell}': {e}")))
}
