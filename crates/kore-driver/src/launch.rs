//! `cuLaunchKernelEx` support: the argument contract check and the
//! human-readable launch-config trace.

use std::ffi::c_void;
use std::fmt;

use crate::ffi::{
    CuLaunchAttribute, CuLaunchConfig, CU_LAUNCH_ATTRIBUTE_CLUSTER_DIMENSION,
    CU_LAUNCH_ATTRIBUTE_PRIORITY,
};

/// Assert a launch contract in debug builds, or in any build with the
/// `checked-launch` feature. Expands to nothing otherwise.
macro_rules! launch_check {
    ($cond:expr, $($msg:tt)+) => {
        #[cfg(any(debug_assertions, feature = "checked-launch"))]
        {
            assert!($cond, $($msg)+);
        }
    };
}
pub(crate) use launch_check;

/// `cuLaunchKernelEx` takes its arguments either through `kernelParams` or
/// through `extra`, never both and never neither.
pub fn params_are_exclusive(kernel_params: *mut *mut c_void, extra: *mut *mut c_void) -> bool {
    kernel_params.is_null() != extra.is_null()
}

/// Renders a `CuLaunchConfig` as a multi-line trace:
///
/// ```text
/// Grid Dimensions: (128, 1, 1)
/// Block Dimensions: (256, 1, 1)
/// Shared Memory: 49152 bytes
/// Stream: Custom (0x7f3a2c000b60)
/// Attributes (2):
///   [0] Cluster Dimension: (2, 1, 1)
///   [1] Priority: -1
/// ```
pub struct LaunchConfigDisplay<'a> {
    config: &'a CuLaunchConfig,
}

impl<'a> LaunchConfigDisplay<'a> {
    /// # Safety
    /// If `config.num_attrs > 0`, `config.attrs` must point to that many
    /// initialized attributes for the lifetime of the returned value.
    pub unsafe fn new(config: &'a CuLaunchConfig) -> Self {
        Self { config }
    }

    fn attributes(&self) -> &'a [CuLaunchAttribute] {
        if self.config.attrs.is_null() || self.config.num_attrs == 0 {
            return &[];
        }
        // Validity guaranteed by the caller of `new`.
        unsafe { std::slice::from_raw_parts(self.config.attrs, self.config.num_attrs as usize) }
    }
}

fn write_attribute(f: &mut fmt::Formatter<'_>, attr: &CuLaunchAttribute) -> fmt::Result {
    match attr.id {
        CU_LAUNCH_ATTRIBUTE_CLUSTER_DIMENSION => {
            let dim = unsafe { attr.value.cluster_dim };
            write!(f, "Cluster Dimension: ({}, {}, {})", dim.x, dim.y, dim.z)
        }
        CU_LAUNCH_ATTRIBUTE_PRIORITY => {
            write!(f, "Priority: {}", unsafe { attr.value.priority })
        }
        id => write!(f, "Unknown Attribute (ID={})", id),
    }
}

impl fmt::Display for LaunchConfigDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.config;
        writeln!(f, "Grid Dimensions: ({}, {}, {})", c.grid_dim_x, c.grid_dim_y, c.grid_dim_z)?;
        writeln!(f, "Block Dimensions: ({}, {}, {})", c.block_dim_x, c.block_dim_y, c.block_dim_z)?;
        writeln!(f, "Shared Memory: {} bytes", c.shared_mem_bytes)?;
        let kind = if c.h_stream.is_null() { "Default" } else { "Custom" };
        writeln!(f, "Stream: {} ({:#x})", kind, c.h_stream as usize)?;
        writeln!(f, "Attributes ({}):", c.num_attrs)?;
        for (i, attr) in self.attributes().iter().enumerate() {
            write!(f, "  [{}] ", i)?;
            write_attribute(f, attr)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
