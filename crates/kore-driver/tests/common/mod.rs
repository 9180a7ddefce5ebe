//! A fake CUDA driver: every bound symbol maps to a stub that records its
//! arguments and returns a result code unique to that symbol.

#![allow(dead_code)]

use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_uint, c_void, CStr};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kore_driver::ffi::*;
use kore_driver::{DriverError, DriverLibrary, SymbolMap};

/// One recorded stub invocation: exported symbol and its arguments as integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub symbol: &'static str,
    pub args: Vec<usize>,
}

thread_local! {
    static CALLS: RefCell<Vec<Call>> = const { RefCell::new(Vec::new()) };
}

fn record(symbol: &'static str, args: Vec<usize>) {
    CALLS.with(|c| c.borrow_mut().push(Call { symbol, args }));
}

/// Drain the calls recorded on this thread.
pub fn take_calls() -> Vec<Call> {
    CALLS.with(|c| std::mem::take(&mut *c.borrow_mut()))
}

/// Expect exactly one recorded call on this thread.
pub fn single_call() -> Call {
    let mut calls = take_calls();
    assert_eq!(calls.len(), 1, "expected one forwarded call, got {:?}", calls);
    calls.remove(0)
}

macro_rules! stubs {
    ($( $stub:ident = $exported:literal => $code:expr, ($($arg:ident : $ty:ty),*); )*) => {
        $(
            extern "system" fn $stub($($arg: $ty),*) -> CuResult {
                record($exported, vec![$($arg as usize),*]);
                $code
            }
        )*

        fn register_stubs(map: &mut SymbolMap) {
            $( map.insert($exported, $stub as usize as *const c_void); )*
        }

        /// Result code each stub returns, by exported name.
        pub fn stub_code(exported: &str) -> CuResult {
            match exported {
                $( $exported => $code, )*
                "cuGetErrorName" | "cuGetErrorString" => CUDA_SUCCESS,
                other => panic!("no stub for {}", other),
            }
        }
    };
}

stubs! {
    stub_func_set_attribute = "cuFuncSetAttribute" => 1003, (f: CuFunction, a: CuFunctionAttribute, v: c_int);
    stub_link_complete = "cuLinkComplete" => 1004, (s: CuLinkState, out: *mut *mut c_void, size: *mut usize);
    stub_module_unload = "cuModuleUnload" => 1005, (m: CuModule);
    stub_link_destroy = "cuLinkDestroy" => 1006, (s: CuLinkState);
    stub_module_load_data = "cuModuleLoadData" => 1007, (m: *mut CuModule, image: *const c_void);
    stub_link_create = "cuLinkCreate_v2" => 1008, (n: c_uint, o: *mut CuJitOption, v: *mut *mut c_void, s: *mut CuLinkState);
    stub_module_get_function = "cuModuleGetFunction" => 1009, (f: *mut CuFunction, m: CuModule, n: *const c_char);
    stub_module_get_global = "cuModuleGetGlobal_v2" => 1010, (d: *mut CuDeviceptr, b: *mut usize, m: CuModule, n: *const c_char);
    stub_library_get_kernel = "cuLibraryGetKernel" => 1011, (k: *mut CuKernel, l: CuLibrary, n: *const c_char);
    stub_library_load_data = "cuLibraryLoadData" => 1012, (l: *mut CuLibrary, code: *const c_void, jo: *mut CuJitOption, jv: *mut *mut c_void, jn: c_uint, lo: *mut CuLibraryOption, lv: *mut *mut c_void, ln: c_uint);
    stub_library_get_global = "cuLibraryGetGlobal" => 1013, (d: *mut CuDeviceptr, b: *mut usize, l: CuLibrary, n: *const c_char);
    stub_library_unload = "cuLibraryUnload" => 1014, (l: CuLibrary);
    stub_kernel_set_attribute = "cuKernelSetAttribute" => 1015, (a: CuFunctionAttribute, v: c_int, k: CuKernel, d: CuDevice);
    stub_ctx_get_device = "cuCtxGetDevice" => 1016, (d: *mut CuDevice);
    stub_link_add_file = "cuLinkAddFile_v2" => 1017, (s: CuLinkState, t: CuJitInputType, p: *const c_char, n: c_uint, o: *mut CuJitOption, v: *mut *mut c_void);
    stub_link_add_data = "cuLinkAddData_v2" => 1018, (s: CuLinkState, t: CuJitInputType, d: *mut c_void, size: usize, name: *const c_char, n: c_uint, o: *mut CuJitOption, v: *mut *mut c_void);
    stub_launch_cooperative_kernel = "cuLaunchCooperativeKernel" => 1019, (f: CuFunction, gx: c_uint, gy: c_uint, gz: c_uint, bx: c_uint, by: c_uint, bz: c_uint, sm: c_uint, st: CuStream, kp: *mut *mut c_void);
    stub_launch_kernel = "cuLaunchKernel" => 1020, (f: CuFunction, gx: c_uint, gy: c_uint, gz: c_uint, bx: c_uint, by: c_uint, bz: c_uint, sm: c_uint, st: CuStream, kp: *mut *mut c_void, ex: *mut *mut c_void);
    stub_launch_kernel_ex = "cuLaunchKernelEx" => 1021, (c: *const CuLaunchConfig, f: CuFunction, kp: *mut *mut c_void, ex: *mut *mut c_void);
    stub_tensor_map_encode_tiled = "cuTensorMapEncodeTiled" => 1022, (m: *mut CuTensorMap, dt: CuTensorMapDataType, r: Cuuint32, ga: *mut c_void, gd: *const Cuuint64, gs: *const Cuuint64, bd: *const Cuuint32, es: *const Cuuint32, il: CuTensorMapInterleave, sw: CuTensorMapSwizzle, l2: CuTensorMapL2Promotion, oob: CuTensorMapFloatOobFill);
    stub_memcpy_dtoh = "cuMemcpyDtoH_v2" => 1023, (dst: *mut c_void, src: CuDeviceptr, n: usize);
    stub_device_get_attribute = "cuDeviceGetAttribute" => 1024, (pi: *mut c_int, a: CuDeviceAttribute, d: CuDevice);
    stub_occupancy_max_active_clusters = "cuOccupancyMaxActiveClusters" => 1025, (n: *mut c_int, f: CuFunction, c: *const CuLaunchConfig);
}

// Error-name stubs write static strings, so they are written out by hand.

extern "system" fn stub_get_error_name(error: CuResult, p_str: *mut *const c_char) -> CuResult {
    record("cuGetErrorName", vec![error as usize, p_str as usize]);
    let name: &'static CStr = match error {
        CUDA_SUCCESS => c"CUDA_SUCCESS",
        CUDA_ERROR_INVALID_VALUE => c"CUDA_ERROR_INVALID_VALUE",
        _ => return CUDA_ERROR_INVALID_VALUE,
    };
    unsafe { *p_str = name.as_ptr() };
    CUDA_SUCCESS
}

extern "system" fn stub_get_error_string(error: CuResult, p_str: *mut *const c_char) -> CuResult {
    record("cuGetErrorString", vec![error as usize, p_str as usize]);
    let text: &'static CStr = match error {
        CUDA_SUCCESS => c"no error",
        CUDA_ERROR_INVALID_VALUE => c"invalid argument",
        _ => return CUDA_ERROR_INVALID_VALUE,
    };
    unsafe { *p_str = text.as_ptr() };
    CUDA_SUCCESS
}

/// A symbol map exposing every bound entry point.
pub fn fake_symbols() -> SymbolMap {
    let mut map = SymbolMap::new("fake-libcuda");
    map.insert("cuGetErrorName", stub_get_error_name as usize as *const c_void)
        .insert("cuGetErrorString", stub_get_error_string as usize as *const c_void);
    register_stubs(&mut map);
    map
}

/// Fake library that counts how often it is opened and closed.
pub struct CountingLibrary {
    symbols: SymbolMap,
    closes: Arc<AtomicUsize>,
}

#[derive(Clone, Default)]
pub struct Counters {
    pub opens: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl Counters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// "Open" a fake library, counting the open.
    pub fn open(&self, symbols: SymbolMap) -> Box<dyn DriverLibrary> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Box::new(CountingLibrary { symbols, closes: Arc::clone(&self.closes) })
    }
}

impl DriverLibrary for CountingLibrary {
    fn name(&self) -> &str {
        self.symbols.name()
    }

    fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>> {
        self.symbols.symbol(name)
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory sink for `tracing_subscriber::fmt`, so tests can read back
/// what was logged.
#[derive(Clone, Default)]
pub struct CapturedLog(Arc<parking_lot::Mutex<Vec<u8>>>);

impl CapturedLog {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl std::io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLog {
    type Writer = CapturedLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` under a DEBUG-level fmt subscriber and return everything it logged.
pub fn capture_debug_log(f: impl FnOnce()) -> String {
    let log = CapturedLog::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(log.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    log.contents()
}
