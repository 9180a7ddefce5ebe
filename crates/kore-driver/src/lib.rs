//! # kore-driver
//!
//! Runtime-loaded CUDA driver API for Kore.
//!
//! Provides:
//! - One shared `CudaDriver` per process, opened lazily and closed when the
//!   last handle is dropped
//! - `dlopen` / `LoadLibrary` loading behind a single `DriverLibrary` trait
//! - A typed table of driver entry points, pinned to specific ABI versions
//!   (`cuLinkCreate_v2`, `cuMemcpyDtoH_v2`, ...)
//! - Pass-through forwarding methods returning the raw `CuResult`
//! - Launch-config tracing for `cuLaunchKernelEx`
//!
//! No build-time CUDA toolkit dependency: every call goes through pointers
//! resolved from the installed driver.

pub mod config;
pub mod driver;
pub mod error;
pub mod ffi;
pub mod instance;
pub mod launch;
pub mod loader;
pub mod table;

pub use config::DriverConfig;
pub use driver::CudaDriver;
pub use error::DriverError;
pub use instance::InstanceCell;
pub use launch::LaunchConfigDisplay;
pub use loader::{library_file_name, DriverLibrary, NativeLibrary, SymbolMap};
pub use table::{SymbolEntry, SYMBOLS};
