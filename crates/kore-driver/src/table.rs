//! The fixed table of driver entry points.
//!
//! Each row pairs the logical operation with the exact symbol exported by the
//! driver. Where the driver exports several ABI revisions of one operation the
//! row pins a single one (the `_v2` entry points), so the calling convention in
//! `ffi` always matches what was resolved.

use std::ffi::{c_void, CStr};

use crate::error::DriverError;
use crate::ffi::*;
use crate::loader::DriverLibrary;

/// One bound driver entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Logical operation name, as documented in the driver API.
    pub operation: &'static str,
    /// Symbol actually resolved from the library.
    pub exported: &'static CStr,
}

macro_rules! driver_table {
    ($( $field:ident : $ty:ty = $operation:literal => $exported:literal; )*) => {
        /// Resolved entry points. Every slot is non-null once built.
        pub(crate) struct DriverTable {
            $( pub(crate) $field: $ty, )*
        }

        /// Every symbol resolved when a `CudaDriver` is constructed, in resolution order.
        pub const SYMBOLS: &[SymbolEntry] = &[
            $( SymbolEntry { operation: $operation, exported: $exported }, )*
        ];

        impl DriverTable {
            /// Resolve every entry point from `library`, failing on the first missing one.
            pub(crate) fn resolve(library: &dyn DriverLibrary) -> Result<Self, DriverError> {
                Ok(Self {
                    $( $field: unsafe { resolve_fn::<$ty>(library, $operation, $exported)? }, )*
                })
            }
        }
    };
}

driver_table! {
    cu_get_error_name: FnCuGetErrorName = "cuGetErrorName" => c"cuGetErrorName";
    cu_get_error_string: FnCuGetErrorString = "cuGetErrorString" => c"cuGetErrorString";
    cu_func_set_attribute: FnCuFuncSetAttribute = "cuFuncSetAttribute" => c"cuFuncSetAttribute";
    cu_link_complete: FnCuLinkComplete = "cuLinkComplete" => c"cuLinkComplete";
    cu_module_unload: FnCuModuleUnload = "cuModuleUnload" => c"cuModuleUnload";
    cu_link_destroy: FnCuLinkDestroy = "cuLinkDestroy" => c"cuLinkDestroy";
    cu_module_load_data: FnCuModuleLoadData = "cuModuleLoadData" => c"cuModuleLoadData";
    cu_link_create: FnCuLinkCreate = "cuLinkCreate" => c"cuLinkCreate_v2";
    cu_module_get_function: FnCuModuleGetFunction = "cuModuleGetFunction" => c"cuModuleGetFunction";
    cu_module_get_global: FnCuModuleGetGlobal = "cuModuleGetGlobal" => c"cuModuleGetGlobal_v2";
    cu_library_get_kernel: FnCuLibraryGetKernel = "cuLibraryGetKernel" => c"cuLibraryGetKernel";
    cu_library_load_data: FnCuLibraryLoadData = "cuLibraryLoadData" => c"cuLibraryLoadData";
    cu_library_get_global: FnCuLibraryGetGlobal = "cuLibraryGetGlobal" => c"cuLibraryGetGlobal";
    cu_library_unload: FnCuLibraryUnload = "cuLibraryUnload" => c"cuLibraryUnload";
    cu_kernel_set_attribute: FnCuKernelSetAttribute = "cuKernelSetAttribute" => c"cuKernelSetAttribute";
    cu_ctx_get_device: FnCuCtxGetDevice = "cuCtxGetDevice" => c"cuCtxGetDevice";
    cu_link_add_file: FnCuLinkAddFile = "cuLinkAddFile" => c"cuLinkAddFile_v2";
    cu_link_add_data: FnCuLinkAddData = "cuLinkAddData" => c"cuLinkAddData_v2";
    cu_launch_cooperative_kernel: FnCuLaunchCooperativeKernel = "cuLaunchCooperativeKernel" => c"cuLaunchCooperativeKernel";
    cu_launch_kernel: FnCuLaunchKernel = "cuLaunchKernel" => c"cuLaunchKernel";
    cu_launch_kernel_ex: FnCuLaunchKernelEx = "cuLaunchKernelEx" => c"cuLaunchKernelEx";
    cu_tensor_map_encode_tiled: FnCuTensorMapEncodeTiled = "cuTensorMapEncodeTiled" => c"cuTensorMapEncodeTiled";
    cu_memcpy_dtoh: FnCuMemcpyDtoH = "cuMemcpyDtoH" => c"cuMemcpyDtoH_v2";
    cu_device_get_attribute: FnCuDeviceGetAttribute = "cuDeviceGetAttribute" => c"cuDeviceGetAttribute";
    cu_occupancy_max_active_clusters: FnCuOccupancyMaxActiveClusters = "cuOccupancyMaxActiveClusters" => c"cuOccupancyMaxActiveClusters";
}

/// Look up `exported` and reinterpret its address as the function pointer `F`.
///
/// # Safety
/// `F` must be an `extern` function pointer type matching the symbol's real signature.
unsafe fn resolve_fn<F: Copy>(
    library: &dyn DriverLibrary,
    operation: &'static str,
    exported: &'static CStr,
) -> Result<F, DriverError> {
    debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*mut c_void>());
    let address = library.symbol(exported).ok_or_else(|| DriverError::MissingSymbol {
        operation,
        symbol: exported.to_string_lossy().into_owned(),
    })?;
    Ok(std::mem::transmute_copy::<*mut c_void, F>(&address.as_ptr()))
}
