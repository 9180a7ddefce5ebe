//! The shared CUDA driver binding.
//!
//! `CudaDriver::instance()` hands out `Arc`s to a single live binding. The
//! binding owns the opened library and the resolved entry points; it is
//! destroyed, and the library closed, when the last `Arc` goes away. The next
//! `instance()` call after that opens the library again.

use std::ffi::{c_char, c_int, c_uint, c_void, CStr};
use std::sync::Arc;

use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::ffi::*;
use crate::instance::InstanceCell;
use crate::launch::{launch_check, LaunchConfigDisplay};
use crate::loader::{DriverLibrary, NativeLibrary};
use crate::table::DriverTable;

static DRIVER: InstanceCell<CudaDriver> = InstanceCell::new();

/// Runtime-loaded CUDA driver API.
pub struct CudaDriver {
    table: DriverTable,
    library: Option<Box<dyn DriverLibrary>>,
}

impl CudaDriver {
    /// The process-wide driver binding, opened on first use.
    ///
    /// # Panics
    /// If the driver library cannot be opened or lacks a bound symbol. A
    /// missing driver is treated as a broken environment; use
    /// [`CudaDriver::try_instance`] to probe instead.
    pub fn instance() -> Arc<Self> {
        match Self::try_instance() {
            Ok(driver) => driver,
            Err(e) => panic!("CUDA driver library is not open correctly: {}", e),
        }
    }

    /// Like [`CudaDriver::instance`], but reports load failures.
    pub fn try_instance() -> Result<Arc<Self>, DriverError> {
        DRIVER.get_or_try_init(|| Self::open(&DriverConfig::from_env()))
    }

    /// Open a private binding, independent of the shared instance.
    pub fn open(config: &DriverConfig) -> Result<Self, DriverError> {
        let library = NativeLibrary::open(config.library_path())?;
        Self::from_library(Box::new(library))
    }

    /// Bind to an already opened library. On failure the library is closed.
    pub fn from_library(library: Box<dyn DriverLibrary>) -> Result<Self, DriverError> {
        let table = match DriverTable::resolve(library.as_ref()) {
            Ok(table) => table,
            Err(e) => {
                if let Err(close_err) = library.close() {
                    tracing::warn!("{}", close_err);
                }
                return Err(e);
            }
        };
        tracing::debug!(
            "resolved {} CUDA driver entry points from {}",
            crate::SYMBOLS.len(),
            library.name()
        );
        Ok(Self { table, library: Some(library) })
    }

    /// Name of the library this binding was resolved from.
    pub fn library_name(&self) -> &str {
        self.library.as_deref().map_or("", |lib| lib.name())
    }

    // -----------------------------------------------------------------------
    // Result code helpers
    // -----------------------------------------------------------------------

    /// Symbolic name of a result code, e.g. `CUDA_ERROR_INVALID_VALUE`.
    pub fn error_name(&self, code: CuResult) -> String {
        let mut s: *const c_char = std::ptr::null();
        let rc = unsafe { self.cu_get_error_name(code, &mut s) };
        describe(rc, s).unwrap_or_else(|| format!("CUDA_ERROR_{}", code))
    }

    /// Driver description of a result code.
    pub fn error_string(&self, code: CuResult) -> String {
        let mut s: *const c_char = std::ptr::null();
        let rc = unsafe { self.cu_get_error_string(code, &mut s) };
        describe(rc, s).unwrap_or_else(|| "unrecognized error code".to_string())
    }

    /// Turn a forwarded result code into a `Result`.
    pub fn check(&self, code: CuResult, context: &str) -> Result<(), DriverError> {
        if code == CUDA_SUCCESS {
            return Ok(());
        }
        Err(DriverError::Cuda {
            code,
            name: self.error_name(code),
            message: self.error_string(code),
            context: context.to_string(),
        })
    }
}

fn describe(rc: CuResult, s: *const c_char) -> Option<String> {
    if rc != CUDA_SUCCESS || s.is_null() {
        return None;
    }
    // The driver returns pointers into static storage.
    Some(unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned())
}

impl Drop for CudaDriver {
    fn drop(&mut self) {
        if let Some(library) = self.library.take() {
            let name = library.name().to_string();
            match library.close() {
                Ok(()) => tracing::debug!("closed CUDA driver library {}", name),
                Err(e) => tracing::warn!("{}", e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Forwarding methods
// ---------------------------------------------------------------------------
//
// Arguments go to the driver untouched and the driver's result comes back
// untouched. Safety for every method: the arguments must satisfy the
// contract of the corresponding driver function, and `self` must stay alive
// for the duration of the call.

impl CudaDriver {
    #[inline]
    pub unsafe fn cu_get_error_name(&self, error: CuResult, p_str: *mut *const c_char) -> CuResult {
        (self.table.cu_get_error_name)(error, p_str)
    }

    #[inline]
    pub unsafe fn cu_get_error_string(&self, error: CuResult, p_str: *mut *const c_char) -> CuResult {
        (self.table.cu_get_error_string)(error, p_str)
    }

    #[inline]
    pub unsafe fn cu_func_set_attribute(
        &self,
        hfunc: CuFunction,
        attrib: CuFunctionAttribute,
        value: c_int,
    ) -> CuResult {
        (self.table.cu_func_set_attribute)(hfunc, attrib, value)
    }

    #[inline]
    pub unsafe fn cu_link_complete(
        &self,
        state: CuLinkState,
        cubin_out: *mut *mut c_void,
        size_out: *mut usize,
    ) -> CuResult {
        (self.table.cu_link_complete)(state, cubin_out, size_out)
    }

    #[inline]
    pub unsafe fn cu_module_unload(&self, hmod: CuModule) -> CuResult {
        (self.table.cu_module_unload)(hmod)
    }

    #[inline]
    pub unsafe fn cu_link_destroy(&self, state: CuLinkState) -> CuResult {
        (self.table.cu_link_destroy)(state)
    }

    #[inline]
    pub unsafe fn cu_module_load_data(&self, module: *mut CuModule, image: *const c_void) -> CuResult {
        (self.table.cu_module_load_data)(module, image)
    }

    /// Forwards to `cuLinkCreate_v2`.
    #[inline]
    pub unsafe fn cu_link_create(
        &self,
        num_options: c_uint,
        options: *mut CuJitOption,
        option_values: *mut *mut c_void,
        state_out: *mut CuLinkState,
    ) -> CuResult {
        (self.table.cu_link_create)(num_options, options, option_values, state_out)
    }

    #[inline]
    pub unsafe fn cu_module_get_function(
        &self,
        hfunc: *mut CuFunction,
        hmod: CuModule,
        name: *const c_char,
    ) -> CuResult {
        (self.table.cu_module_get_function)(hfunc, hmod, name)
    }

    /// Forwards to `cuModuleGetGlobal_v2`.
    #[inline]
    pub unsafe fn cu_module_get_global(
        &self,
        dptr: *mut CuDeviceptr,
        bytes: *mut usize,
        hmod: CuModule,
        name: *const c_char,
    ) -> CuResult {
        (self.table.cu_module_get_global)(dptr, bytes, hmod, name)
    }

    #[inline]
    pub unsafe fn cu_library_get_kernel(
        &self,
        p_kernel: *mut CuKernel,
        library: CuLibrary,
        name: *const c_char,
    ) -> CuResult {
        (self.table.cu_library_get_kernel)(p_kernel, library, name)
    }

    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub unsafe fn cu_library_load_data(
        &self,
        library: *mut CuLibrary,
        code: *const c_void,
        jit_options: *mut CuJitOption,
        jit_options_values: *mut *mut c_void,
        num_jit_options: c_uint,
        library_options: *mut CuLibraryOption,
        library_option_values: *mut *mut c_void,
        num_library_options: c_uint,
    ) -> CuResult {
        (self.table.cu_library_load_data)(
            library,
            code,
            jit_options,
            jit_options_values,
            num_jit_options,
            library_options,
            library_option_values,
            num_library_options,
        )
    }

    #[inline]
    pub unsafe fn cu_library_get_global(
        &self,
        dptr: *mut CuDeviceptr,
        bytes: *mut usize,
        library: CuLibrary,
        name: *const c_char,
    ) -> CuResult {
        (self.table.cu_library_get_global)(dptr, bytes, library, name)
    }

    #[inline]
    pub unsafe fn cu_library_unload(&self, library: CuLibrary) -> CuResult {
        (self.table.cu_library_unload)(library)
    }

    #[inline]
    pub unsafe fn cu_kernel_set_attribute(
        &self,
        attrib: CuFunctionAttribute,
        val: c_int,
        kernel: CuKernel,
        dev: CuDevice,
    ) -> CuResult {
        (self.table.cu_kernel_set_attribute)(attrib, val, kernel, dev)
    }

    #[inline]
    pub unsafe fn cu_ctx_get_device(&self, device: *mut CuDevice) -> CuResult {
        (self.table.cu_ctx_get_device)(device)
    }

    /// Forwards to `cuLinkAddFile_v2`.
    #[inline]
    pub unsafe fn cu_link_add_file(
        &self,
        state: CuLinkState,
        input_type: CuJitInputType,
        path: *const c_char,
        num_options: c_uint,
        options: *mut CuJitOption,
        option_values: *mut *mut c_void,
    ) -> CuResult {
        (self.table.cu_link_add_file)(state, input_type, path, num_options, options, option_values)
    }

    /// Forwards to `cuLinkAddData_v2`.
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub unsafe fn cu_link_add_data(
        &self,
        state: CuLinkState,
        input_type: CuJitInputType,
        data: *mut c_void,
        size: usize,
        name: *const c_char,
        num_options: c_uint,
        options: *mut CuJitOption,
        option_values: *mut *mut c_void,
    ) -> CuResult {
        (self.table.cu_link_add_data)(
            state,
            input_type,
            data,
            size,
            name,
            num_options,
            options,
            option_values,
        )
    }

    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub unsafe fn cu_launch_cooperative_kernel(
        &self,
        f: CuFunction,
        grid_dim_x: c_uint,
        grid_dim_y: c_uint,
        grid_dim_z: c_uint,
        block_dim_x: c_uint,
        block_dim_y: c_uint,
        block_dim_z: c_uint,
        shared_mem_bytes: c_uint,
        h_stream: CuStream,
        kernel_params: *mut *mut c_void,
    ) -> CuResult {
        (self.table.cu_launch_cooperative_kernel)(
            f,
            grid_dim_x,
            grid_dim_y,
            grid_dim_z,
            block_dim_x,
            block_dim_y,
            block_dim_z,
            shared_mem_bytes,
            h_stream,
            kernel_params,
        )
    }

    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub unsafe fn cu_launch_kernel(
        &self,
        f: CuFunction,
        grid_dim_x: c_uint,
        grid_dim_y: c_uint,
        grid_dim_z: c_uint,
        block_dim_x: c_uint,
        block_dim_y: c_uint,
        block_dim_z: c_uint,
        shared_mem_bytes: c_uint,
        h_stream: CuStream,
        kernel_params: *mut *mut c_void,
        extra: *mut *mut c_void,
    ) -> CuResult {
        (self.table.cu_launch_kernel)(
            f,
            grid_dim_x,
            grid_dim_y,
            grid_dim_z,
            block_dim_x,
            block_dim_y,
            block_dim_z,
            shared_mem_bytes,
            h_stream,
            kernel_params,
            extra,
        )
    }

    /// Launch with an extended config.
    ///
    /// Logs the rendered config at debug level before the call. Exactly one
    /// of `kernel_params` and `extra` must be non-null; this is asserted in
    /// debug builds and with the `checked-launch` feature.
    pub unsafe fn cu_launch_kernel_ex(
        &self,
        config: *const CuLaunchConfig,
        f: CuFunction,
        kernel_params: *mut *mut c_void,
        extra: *mut *mut c_void,
    ) -> CuResult {
        if let Some(cfg) = config.as_ref() {
            tracing::debug!("Launch config: {}", LaunchConfigDisplay::new(cfg));
        }
        launch_check!(
            crate::launch::params_are_exclusive(kernel_params, extra),
            "Exactly one of 'extra' and 'kernelParams' should be set."
        );
        (self.table.cu_launch_kernel_ex)(config, f, kernel_params, extra)
    }

    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub unsafe fn cu_tensor_map_encode_tiled(
        &self,
        tensor_map: *mut CuTensorMap,
        tensor_data_type: CuTensorMapDataType,
        tensor_rank: Cuuint32,
        global_address: *mut c_void,
        global_dim: *const Cuuint64,
        global_strides: *const Cuuint64,
        box_dim: *const Cuuint32,
        element_strides: *const Cuuint32,
        interleave: CuTensorMapInterleave,
        swizzle: CuTensorMapSwizzle,
        l2_promotion: CuTensorMapL2Promotion,
        oob_fill: CuTensorMapFloatOobFill,
    ) -> CuResult {
        (self.table.cu_tensor_map_encode_tiled)(
            tensor_map,
            tensor_data_type,
            tensor_rank,
            global_address,
            global_dim,
            global_strides,
            box_dim,
            element_strides,
            interleave,
            swizzle,
            l2_promotion,
            oob_fill,
        )
    }

    /// Forwards to `cuMemcpyDtoH_v2`.
    #[inline]
    pub unsafe fn cu_memcpy_dtoh(
        &self,
        dst_host: *mut c_void,
        src_device: CuDeviceptr,
        byte_count: usize,
    ) -> CuResult {
        (self.table.cu_memcpy_dtoh)(dst_host, src_device, byte_count)
    }

    #[inline]
    pub unsafe fn cu_device_get_attribute(
        &self,
        pi: *mut c_int,
        attrib: CuDeviceAttribute,
        dev: CuDevice,
    ) -> CuResult {
        (self.table.cu_device_get_attribute)(pi, attrib, dev)
    }

    #[inline]
    pub unsafe fn cu_occupancy_max_active_clusters(
        &self,
        max_active_clusters: *mut c_int,
        f: CuFunction,
        config: *const CuLaunchConfig,
    ) -> CuResult {
        (self.table.cu_occupancy_max_active_clusters)(max_active_clusters, f, config)
    }
}
