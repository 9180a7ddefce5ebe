//! Driver library loading.
//!
//! `DriverLibrary` is the only thing the symbol table sees. `NativeLibrary`
//! implements it with `dlopen(RTLD_LAZY)` on Unix and `LoadLibraryW` on
//! Windows; `SymbolMap` implements it from an in-process name → address map.

use std::collections::HashMap;
use std::ffi::{c_void, CStr, OsStr};
use std::ptr::NonNull;

use crate::error::DriverError;

/// Stem of the CUDA driver library, expanded by [`library_file_name`].
pub const DRIVER_LIBRARY_STEM: &str = "cuda";

/// Platform file name for a driver library stem.
///
/// `"cuda"` becomes `libcuda.so.1` on Unix and `nvcuda.dll` on Windows.
pub fn library_file_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("nv{}.dll", stem)
    } else {
        format!("lib{}.so.1", stem)
    }
}

/// A loaded library that can resolve exported symbols.
pub trait DriverLibrary: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Address of an exported symbol, or `None` if it is not exported.
    fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>>;

    /// Release the library. Called once, when the owning driver is dropped.
    fn close(self: Box<Self>) -> Result<(), DriverError>;
}

// ---------------------------------------------------------------------------
// Native loader
// ---------------------------------------------------------------------------

#[cfg(not(any(unix, windows)))]
compile_error!("kore-driver can only load the CUDA driver on Unix or Windows hosts");

#[cfg(unix)]
mod sys {
    use std::ffi::{c_void, CStr, OsStr};
    use std::ptr::NonNull;

    use libloading::os::unix::{Library, RTLD_LAZY};

    pub(super) type Handle = Library;

    pub(super) fn open(path: &OsStr) -> Result<Handle, libloading::Error> {
        unsafe { Library::open(Some(path), RTLD_LAZY) }
    }

    pub(super) fn symbol(lib: &Handle, name: &CStr) -> Option<NonNull<c_void>> {
        let sym = unsafe { lib.get::<*mut c_void>(name.to_bytes_with_nul()) }.ok()?;
        NonNull::new(*sym)
    }
}

#[cfg(windows)]
mod sys {
    use std::ffi::{c_void, CStr, OsStr};
    use std::ptr::NonNull;

    use libloading::os::windows::Library;

    pub(super) type Handle = Library;

    pub(super) fn open(path: &OsStr) -> Result<Handle, libloading::Error> {
        unsafe { Library::new(path) }
    }

    pub(super) fn symbol(lib: &Handle, name: &CStr) -> Option<NonNull<c_void>> {
        let sym = unsafe { lib.get::<*mut c_void>(name.to_bytes_with_nul()) }.ok()?;
        NonNull::new(*sym)
    }
}

/// The driver shared library opened through the host's dynamic loader.
pub struct NativeLibrary {
    name: String,
    handle: sys::Handle,
}

impl NativeLibrary {
    /// Open a library by file name (searched on the loader path) or full path.
    pub fn open(path: impl AsRef<OsStr>) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let name = path.to_string_lossy().into_owned();
        let handle = sys::open(path).map_err(|source| DriverError::LibraryOpen {
            library: name.clone(),
            source,
        })?;
        tracing::debug!("opened CUDA driver library {}", name);
        Ok(Self { name, handle })
    }

    /// Open the platform's default driver library (`libcuda.so.1` / `nvcuda.dll`).
    pub fn open_default() -> Result<Self, DriverError> {
        Self::open(library_file_name(DRIVER_LIBRARY_STEM))
    }
}

impl DriverLibrary for NativeLibrary {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>> {
        sys::symbol(&self.handle, name)
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        let NativeLibrary { name, handle } = *self;
        handle.close().map_err(|source| DriverError::LibraryClose { library: name, source })
    }
}

// ---------------------------------------------------------------------------
// In-process symbol map
// ---------------------------------------------------------------------------

/// A `DriverLibrary` backed by addresses already present in the process,
/// e.g. a statically linked driver shim or test doubles.
pub struct SymbolMap {
    name: String,
    symbols: HashMap<String, NonNull<c_void>>,
}

// The map only holds code addresses with 'static lifetime.
unsafe impl Send for SymbolMap {}
unsafe impl Sync for SymbolMap {}

impl SymbolMap {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), symbols: HashMap::new() }
    }

    /// Register `address` under the exported name `symbol`. Null addresses are ignored.
    pub fn insert(&mut self, symbol: &str, address: *const c_void) -> &mut Self {
        if let Some(ptr) = NonNull::new(address as *mut c_void) {
            self.symbols.insert(symbol.to_string(), ptr);
        }
        self
    }

    pub fn remove(&mut self, symbol: &str) -> &mut Self {
        self.symbols.remove(symbol);
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl DriverLibrary for SymbolMap {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>> {
        let name = name.to_str().ok()?;
        self.symbols.get(name).copied()
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        Ok(())
    }
}
