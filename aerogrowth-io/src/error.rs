//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited-file parsing error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HDF5/NetCDF4 error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5Error(#[from] hdf5::Error),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] aerogrowth_core::Error),
}

impl Error {
    /// Shorthand for a [`aerogrowth_core::Error::DataFormat`] error.
    pub(crate) fn data_format(message: impl Into<String>) -> Self {
        Self::CoreError(aerogrowth_core::Error::DataFormat(message.into()))
    }
}
