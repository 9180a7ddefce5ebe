//! CUDA driver ABI types and entry-point signatures.
//!
//! Layouts follow `cuda.h` for the 12.x driver. Only the types reachable from
//! the bound entry points are declared. Enumerations are plain `c_int`
//! aliases so unknown values coming back from newer drivers stay representable.

use std::ffi::{c_char, c_int, c_uint, c_void};

// ---------------------------------------------------------------------------
// Result codes
// ---------------------------------------------------------------------------

pub type CuResult = c_int;
pub const CUDA_SUCCESS: CuResult = 0;
pub const CUDA_ERROR_INVALID_VALUE: CuResult = 1;
pub const CUDA_ERROR_OUT_OF_MEMORY: CuResult = 2;
pub const CUDA_ERROR_NOT_INITIALIZED: CuResult = 3;
pub const CUDA_ERROR_DEINITIALIZED: CuResult = 4;
pub const CUDA_ERROR_NO_DEVICE: CuResult = 100;
pub const CUDA_ERROR_INVALID_CONTEXT: CuResult = 201;
pub const CUDA_ERROR_NOT_FOUND: CuResult = 500;
pub const CUDA_ERROR_NOT_SUPPORTED: CuResult = 801;
pub const CUDA_ERROR_UNKNOWN: CuResult = 999;

// ---------------------------------------------------------------------------
// Scalars and opaque handles
// ---------------------------------------------------------------------------

pub type CuDevice = c_int;
pub type CuDeviceptr = u64;
pub type Cuuint32 = u32;
pub type Cuuint64 = u64;

pub type CuModule = *mut c_void;
pub type CuFunction = *mut c_void;
pub type CuLibrary = *mut c_void;
pub type CuKernel = *mut c_void;
pub type CuLinkState = *mut c_void;
pub type CuStream = *mut c_void;
pub type CuEvent = *mut c_void;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

pub type CuFunctionAttribute = c_int;
pub const CU_FUNC_ATTRIBUTE_MAX_THREADS_PER_BLOCK: CuFunctionAttribute = 0;
pub const CU_FUNC_ATTRIBUTE_MAX_DYNAMIC_SHARED_SIZE_BYTES: CuFunctionAttribute = 8;
pub const CU_FUNC_ATTRIBUTE_REQUIRED_CLUSTER_WIDTH: CuFunctionAttribute = 11;
pub const CU_FUNC_ATTRIBUTE_REQUIRED_CLUSTER_HEIGHT: CuFunctionAttribute = 12;
pub const CU_FUNC_ATTRIBUTE_REQUIRED_CLUSTER_DEPTH: CuFunctionAttribute = 13;
pub const CU_FUNC_ATTRIBUTE_NON_PORTABLE_CLUSTER_SIZE_ALLOWED: CuFunctionAttribute = 14;

pub type CuDeviceAttribute = c_int;
pub const CU_DEVICE_ATTRIBUTE_MAX_THREADS_PER_BLOCK: CuDeviceAttribute = 1;
pub const CU_DEVICE_ATTRIBUTE_MULTIPROCESSOR_COUNT: CuDeviceAttribute = 16;
pub const CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MAJOR: CuDeviceAttribute = 75;
pub const CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MINOR: CuDeviceAttribute = 76;
pub const CU_DEVICE_ATTRIBUTE_MAX_SHARED_MEMORY_PER_BLOCK_OPTIN: CuDeviceAttribute = 97;

pub type CuJitOption = c_int;
pub const CU_JIT_MAX_REGISTERS: CuJitOption = 0;
pub const CU_JIT_INFO_LOG_BUFFER: CuJitOption = 3;
pub const CU_JIT_INFO_LOG_BUFFER_SIZE_BYTES: CuJitOption = 4;
pub const CU_JIT_ERROR_LOG_BUFFER: CuJitOption = 5;
pub const CU_JIT_ERROR_LOG_BUFFER_SIZE_BYTES: CuJitOption = 6;

pub type CuJitInputType = c_int;
pub const CU_JIT_INPUT_CUBIN: CuJitInputType = 0;
pub const CU_JIT_INPUT_PTX: CuJitInputType = 1;
pub const CU_JIT_INPUT_FATBINARY: CuJitInputType = 2;
pub const CU_JIT_INPUT_OBJECT: CuJitInputType = 3;
pub const CU_JIT_INPUT_LIBRARY: CuJitInputType = 4;

pub type CuLibraryOption = c_int;

pub type CuTensorMapDataType = c_int;
pub const CU_TENSOR_MAP_DATA_TYPE_UINT8: CuTensorMapDataType = 0;
pub const CU_TENSOR_MAP_DATA_TYPE_FLOAT16: CuTensorMapDataType = 6;
pub const CU_TENSOR_MAP_DATA_TYPE_FLOAT32: CuTensorMapDataType = 7;
pub const CU_TENSOR_MAP_DATA_TYPE_BFLOAT16: CuTensorMapDataType = 9;

pub type CuTensorMapInterleave = c_int;
pub const CU_TENSOR_MAP_INTERLEAVE_NONE: CuTensorMapInterleave = 0;

pub type CuTensorMapSwizzle = c_int;
pub const CU_TENSOR_MAP_SWIZZLE_NONE: CuTensorMapSwizzle = 0;
pub const CU_TENSOR_MAP_SWIZZLE_128B: CuTensorMapSwizzle = 3;

pub type CuTensorMapL2Promotion = c_int;
pub const CU_TENSOR_MAP_L2_PROMOTION_NONE: CuTensorMapL2Promotion = 0;
pub const CU_TENSOR_MAP_L2_PROMOTION_L2_128B: CuTensorMapL2Promotion = 2;

pub type CuTensorMapFloatOobFill = c_int;
pub const CU_TENSOR_MAP_FLOAT_OOB_FILL_NONE: CuTensorMapFloatOobFill = 0;

pub type CuLaunchAttributeId = c_int;
pub const CU_LAUNCH_ATTRIBUTE_IGNORE: CuLaunchAttributeId = 0;
pub const CU_LAUNCH_ATTRIBUTE_COOPERATIVE: CuLaunchAttributeId = 2;
pub const CU_LAUNCH_ATTRIBUTE_CLUSTER_DIMENSION: CuLaunchAttributeId = 4;
pub const CU_LAUNCH_ATTRIBUTE_PRIORITY: CuLaunchAttributeId = 8;

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// `CUtensorMap`: 128 opaque bytes, 64-byte aligned.
#[repr(C, align(64))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CuTensorMap {
    pub opaque: [Cuuint64; 16],
}

impl Default for CuTensorMap {
    fn default() -> Self {
        Self { opaque: [0; 16] }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CuClusterDim {
    pub x: c_uint,
    pub y: c_uint,
    pub z: c_uint,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct CuProgrammaticEvent {
    pub event: CuEvent,
    pub flags: c_int,
    pub trigger_at_block_start: c_int,
}

/// `CUlaunchAttributeValue`. Which member is live is given by the owning
/// attribute's `id`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union CuLaunchAttributeValue {
    pub pad: [c_char; 64],
    pub cooperative: c_int,
    pub cluster_dim: CuClusterDim,
    pub programmatic_event: CuProgrammaticEvent,
    pub priority: c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CuLaunchAttribute {
    pub id: CuLaunchAttributeId,
    pub pad: [c_char; 8 - std::mem::size_of::<CuLaunchAttributeId>()],
    pub value: CuLaunchAttributeValue,
}

impl CuLaunchAttribute {
    fn with_value(id: CuLaunchAttributeId, value: CuLaunchAttributeValue) -> Self {
        Self { id, pad: [0; 8 - std::mem::size_of::<CuLaunchAttributeId>()], value }
    }

    fn zeroed_value() -> CuLaunchAttributeValue {
        CuLaunchAttributeValue { pad: [0; 64] }
    }

    /// Thread block cluster shape.
    pub fn cluster_dim(x: u32, y: u32, z: u32) -> Self {
        let mut value = Self::zeroed_value();
        value.cluster_dim = CuClusterDim { x, y, z };
        Self::with_value(CU_LAUNCH_ATTRIBUTE_CLUSTER_DIMENSION, value)
    }

    pub fn priority(priority: i32) -> Self {
        let mut value = Self::zeroed_value();
        value.priority = priority;
        Self::with_value(CU_LAUNCH_ATTRIBUTE_PRIORITY, value)
    }

    pub fn cooperative(enabled: bool) -> Self {
        let mut value = Self::zeroed_value();
        value.cooperative = enabled as c_int;
        Self::with_value(CU_LAUNCH_ATTRIBUTE_COOPERATIVE, value)
    }

    /// An attribute with an arbitrary id and a zeroed payload.
    pub fn raw(id: CuLaunchAttributeId) -> Self {
        Self::with_value(id, Self::zeroed_value())
    }
}

/// `CUlaunchConfig` as consumed by `cuLaunchKernelEx` and
/// `cuOccupancyMaxActiveClusters`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct CuLaunchConfig {
    pub grid_dim_x: c_uint,
    pub grid_dim_y: c_uint,
    pub grid_dim_z: c_uint,
    pub block_dim_x: c_uint,
    pub block_dim_y: c_uint,
    pub block_dim_z: c_uint,
    pub shared_mem_bytes: c_uint,
    pub h_stream: CuStream,
    pub attrs: *mut CuLaunchAttribute,
    pub num_attrs: c_uint,
}

impl CuLaunchConfig {
    /// A config on the default stream with no attributes.
    pub fn new(grid_dim: (u32, u32, u32), block_dim: (u32, u32, u32), shared_mem_bytes: u32) -> Self {
        Self {
            grid_dim_x: grid_dim.0,
            grid_dim_y: grid_dim.1,
            grid_dim_z: grid_dim.2,
            block_dim_x: block_dim.0,
            block_dim_y: block_dim.1,
            block_dim_z: block_dim.2,
            shared_mem_bytes,
            h_stream: std::ptr::null_mut(),
            attrs: std::ptr::null_mut(),
            num_attrs: 0,
        }
    }

    /// Point the config at `attrs`. The slice must outlive every use of the config.
    pub fn with_attributes(mut self, attrs: &mut [CuLaunchAttribute]) -> Self {
        self.attrs = attrs.as_mut_ptr();
        self.num_attrs = attrs.len() as c_uint;
        self
    }

    pub fn with_stream(mut self, stream: CuStream) -> Self {
        self.h_stream = stream;
        self
    }
}

// ---------------------------------------------------------------------------
// Entry-point signatures
// ---------------------------------------------------------------------------
//
// CUDAAPI is __stdcall on Windows, hence "system".

pub type FnCuGetErrorName = unsafe extern "system" fn(CuResult, *mut *const c_char) -> CuResult;
pub type FnCuGetErrorString = unsafe extern "system" fn(CuResult, *mut *const c_char) -> CuResult;
pub type FnCuFuncSetAttribute =
    unsafe extern "system" fn(CuFunction, CuFunctionAttribute, c_int) -> CuResult;
pub type FnCuLinkComplete =
    unsafe extern "system" fn(CuLinkState, *mut *mut c_void, *mut usize) -> CuResult;
pub type FnCuModuleUnload = unsafe extern "system" fn(CuModule) -> CuResult;
pub type FnCuLinkDestroy = unsafe extern "system" fn(CuLinkState) -> CuResult;
pub type FnCuModuleLoadData = unsafe extern "system" fn(*mut CuModule, *const c_void) -> CuResult;
pub type FnCuLinkCreate = unsafe extern "system" fn(
    c_uint,               // numOptions
    *mut CuJitOption,     // options
    *mut *mut c_void,     // optionValues
    *mut CuLinkState,     // stateOut
) -> CuResult;
pub type FnCuModuleGetFunction =
    unsafe extern "system" fn(*mut CuFunction, CuModule, *const c_char) -> CuResult;
pub type FnCuModuleGetGlobal = unsafe extern "system" fn(
    *mut CuDeviceptr,
    *mut usize,
    CuModule,
    *const c_char,
) -> CuResult;
pub type FnCuLibraryGetKernel =
    unsafe extern "system" fn(*mut CuKernel, CuLibrary, *const c_char) -> CuResult;
pub type FnCuLibraryLoadData = unsafe extern "system" fn(
    *mut CuLibrary,
    *const c_void,          // code
    *mut CuJitOption,       // jitOptions
    *mut *mut c_void,       // jitOptionsValues
    c_uint,                 // numJitOptions
    *mut CuLibraryOption,   // libraryOptions
    *mut *mut c_void,       // libraryOptionValues
    c_uint,                 // numLibraryOptions
) -> CuResult;
pub type FnCuLibraryGetGlobal = unsafe extern "system" fn(
    *mut CuDeviceptr,
    *mut usize,
    CuLibrary,
    *const c_char,
) -> CuResult;
pub type FnCuLibraryUnload = unsafe extern "system" fn(CuLibrary) -> CuResult;
pub type FnCuKernelSetAttribute =
    unsafe extern "system" fn(CuFunctionAttribute, c_int, CuKernel, CuDevice) -> CuResult;
pub type FnCuCtxGetDevice = unsafe extern "system" fn(*mut CuDevice) -> CuResult;
pub type FnCuLinkAddFile = unsafe extern "system" fn(
    CuLinkState,
    CuJitInputType,
    *const c_char,        // path
    c_uint,               // numOptions
    *mut CuJitOption,
    *mut *mut c_void,
) -> CuResult;
pub type FnCuLinkAddData = unsafe extern "system" fn(
    CuLinkState,
    CuJitInputType,
    *mut c_void,          // data
    usize,                // size
    *const c_char,        // name
    c_uint,               // numOptions
    *mut CuJitOption,
    *mut *mut c_void,
) -> CuResult;
pub type FnCuLaunchCooperativeKernel = unsafe extern "system" fn(
    CuFunction,
    c_uint, c_uint, c_uint,   // grid x, y, z
    c_uint, c_uint, c_uint,   // block x, y, z
    c_uint,                   // shared mem bytes
    CuStream,
    *mut *mut c_void,         // kernel params
) -> CuResult;
pub type FnCuLaunchKernel = unsafe extern "system" fn(
    CuFunction,
    c_uint, c_uint, c_uint,   // grid x, y, z
    c_uint, c_uint, c_uint,   // block x, y, z
    c_uint,                   // shared mem bytes
    CuStream,
    *mut *mut c_void,         // kernel params
    *mut *mut c_void,         // extra
) -> CuResult;
pub type FnCuLaunchKernelEx = unsafe extern "system" fn(
    *const CuLaunchConfig,
    CuFunction,
    *mut *mut c_void,         // kernel params
    *mut *mut c_void,         // extra
) -> CuResult;
pub type FnCuTensorMapEncodeTiled = unsafe extern "system" fn(
    *mut CuTensorMap,
    CuTensorMapDataType,
    Cuuint32,                 // tensorRank
    *mut c_void,              // globalAddress
    *const Cuuint64,          // globalDim
    *const Cuuint64,          // globalStrides
    *const Cuuint32,          // boxDim
    *const Cuuint32,          // elementStrides
    CuTensorMapInterleave,
    CuTensorMapSwizzle,
    CuTensorMapL2Promotion,
    CuTensorMapFloatOobFill,
) -> CuResult;
pub type FnCuMemcpyDtoH = unsafe extern "system" fn(*mut c_void, CuDeviceptr, usize) -> CuResult;
pub type FnCuDeviceGetAttribute =
    unsafe extern "system" fn(*mut c_int, CuDeviceAttribute, CuDevice) -> CuResult;
pub type FnCuOccupancyMaxActiveClusters =
    unsafe extern "system" fn(*mut c_int, CuFunction, *const CuLaunchConfig) -> CuResult;
