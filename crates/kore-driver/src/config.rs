//! Driver loading configuration.

use std::ffi::OsString;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::loader::{library_file_name, DRIVER_LIBRARY_STEM};

/// Environment variable overriding the driver library path.
pub const DRIVER_LIBRARY_ENV: &str = "KORE_CUDA_DRIVER_LIBRARY";

/// Where to find the CUDA driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Library to open instead of the platform default
    /// (`libcuda.so.1` / `nvcuda.dll`). A bare file name goes through the
    /// loader's search path; anything else is opened as-is.
    #[serde(default)]
    pub library: Option<PathBuf>,
}

impl DriverConfig {
    /// Config from `KORE_CUDA_DRIVER_LIBRARY`; empty values are ignored.
    pub fn from_env() -> Self {
        Self::from_override(std::env::var_os(DRIVER_LIBRARY_ENV))
    }

    fn from_override(value: Option<OsString>) -> Self {
        let library = value.filter(|v| !v.is_empty()).map(PathBuf::from);
        Self { library }
    }

    /// The library that will actually be opened.
    pub fn library_path(&self) -> PathBuf {
        self.library
            .clone()
            .unwrap_or_else(|| PathBuf::from(library_file_name(DRIVER_LIBRARY_STEM)))
    }
}
