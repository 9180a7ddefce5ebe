//! Tests against the installed CUDA driver.
//! Run with: cargo test -p kore-driver --features cuda -- --nocapture

#![cfg(feature = "cuda")]

use std::ffi::{c_char, c_int, CStr};
use std::sync::Arc;

use kore_driver::ffi::*;
use kore_driver::{CudaDriver, DriverConfig, NativeLibrary, DriverLibrary, SYMBOLS};

#[test]
fn test_every_symbol_exported() {
    let lib = NativeLibrary::open_default().expect("CUDA driver library present");
    for entry in SYMBOLS {
        assert!(
            lib.symbol(entry.exported).is_some(),
            "{} missing from {}",
            entry.exported.to_string_lossy(),
            lib.name()
        );
    }
}

#[test]
fn test_instance_is_shared() {
    let a = CudaDriver::instance();
    let b = CudaDriver::instance();
    assert!(Arc::ptr_eq(&a, &b));
    println!("driver: {}", a.library_name());
}

#[test]
fn test_error_name_from_driver() {
    let driver = CudaDriver::instance();
    assert_eq!(driver.error_name(CUDA_SUCCESS), "CUDA_SUCCESS");
    assert_eq!(driver.error_name(CUDA_ERROR_INVALID_VALUE), "CUDA_ERROR_INVALID_VALUE");

    let mut s: *const c_char = std::ptr::null();
    let rc = unsafe { driver.cu_get_error_string(CUDA_ERROR_OUT_OF_MEMORY, &mut s) };
    assert_eq!(rc, CUDA_SUCCESS);
    println!("{}", unsafe { CStr::from_ptr(s) }.to_string_lossy());
}

#[test]
fn test_device_attribute_query() {
    // Nothing here calls cuInit; an uninitialized driver is a valid answer.
    let driver = CudaDriver::open(&DriverConfig::from_env()).unwrap();
    let mut sm_count: c_int = 0;
    let rc = unsafe {
        driver.cu_device_get_attribute(&mut sm_count, CU_DEVICE_ATTRIBUTE_MULTIPROCESSOR_COUNT, 0)
    };
    assert!(
        rc == CUDA_SUCCESS || rc == CUDA_ERROR_NOT_INITIALIZED,
        "unexpected result {}",
        driver.error_name(rc)
    );
    if rc == CUDA_SUCCESS {
        assert!(sm_count > 0);
        println!("device 0: {} SMs", sm_count);
    }
}
