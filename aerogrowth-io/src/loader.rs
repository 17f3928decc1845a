//! Loader selection.

use crate::delimited::DelimitedLoader;
use crate::grid::RawGrid;
use crate::Result;
use aerogrowth_core::{LoadedSurfaces, RequestedWindow};
use std::path::Path;

/// File extensions read by the columnar loader.
pub const COLUMNAR_EXTENSIONS: [&str; 4] = ["nc", "nc4", "h5", "hdf5"];

/// A source of concentration surfaces.
pub trait SurfaceLoader {
    /// Parses the whole record without windowing.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read or is malformed.
    fn grid(&self) -> Result<RawGrid>;

    /// Loads the padded and display surfaces for `window`.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read, is malformed, or holds
    /// rows that collide on the same timestamp.
    fn load(&self, window: &RequestedWindow) -> Result<LoadedSurfaces> {
        let grid = self.grid()?;
        grid.log_period();
        grid.into_surfaces(window)
    }

    /// Returns the loader name.
    fn name(&self) -> &'static str;
}

/// Returns true if `path` names a columnar (NetCDF4/HDF5) dataset.
#[must_use]
pub fn is_columnar(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            COLUMNAR_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Picks the loader for `path` by its extension.
///
/// # Errors
/// Returns [`crate::Error::InvalidFormat`] for a columnar dataset when the
/// crate is built without the `hdf5` feature.
pub fn open_loader(path: &Path) -> Result<Box<dyn SurfaceLoader>> {
    if is_columnar(path) {
        columnar(path)
    } else {
        Ok(Box::new(DelimitedLoader::new(path)))
    }
}

#[cfg(feature = "hdf5")]
fn columnar(path: &Path) -> Result<Box<dyn SurfaceLoader>> {
    Ok(Box::new(crate::columnar::ColumnarLoader::new(path)))
}

#[cfg(not(feature = "hdf5"))]
fn columnar(path: &Path) -> Result<Box<dyn SurfaceLoader>> {
    Err(crate::Error::InvalidFormat(format!(
        "{} is a columnar dataset; rebuild with the `hdf5` feature to read it",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_extension_selection() {
        assert!(is_columnar(Path::new("Beijing.nc")));
        assert!(is_columnar(Path::new("data/record.NC4")));
        assert!(is_columnar(Path::new("record.hdf5")));
        assert!(!is_columnar(Path::new("HYY_DMPS.csv")));
        assert!(!is_columnar(Path::new("record")));
    }

    #[test]
    fn test_delimited_loader_selected() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Year,Month,Day,Hour,Minute,Second,HYY_DMPS.d112e2,HYY_DMPS.d200e2").unwrap();
        writeln!(file, "2004,9,20,11,58,0,100,1").unwrap();
        writeln!(file, "2004,9,20,12,31,0,120,2").unwrap();
        file.flush().unwrap();

        let loader = open_loader(file.path()).unwrap();
        assert_eq!(loader.name(), "delimited");

        let window = RequestedWindow::parse("2004-09-20", "2004-09-20").unwrap();
        let surfaces = loader.load(&window).unwrap();
        assert_eq!(surfaces.display.n_times(), 2);
        assert_eq!(surfaces.display.diameters().last().copied(), Some(1000.0));
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn test_columnar_requires_feature() {
        let err = open_loader(Path::new("Beijing.nc")).err().unwrap();
        assert!(matches!(err, crate::Error::InvalidFormat(_)));
    }
}
