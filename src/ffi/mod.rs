// In src/ffi/mod.rs
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use crate::ffi::error::{ErrorCode, FFIError};
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::Runtime;

pub mod core;
pub mod error;
pub mod impact;
pub mod photo;
pub mod rotary_year;
pub mod service_project;
pub mod speaker;
pub mod timeline;

// Re-export FFIResult for convenience within the ffi module
pub use error::FFIResult;

lazy_static! {
    // One runtime for every FFI call; the SQLite pool is bound to it
    static ref RUNTIME: Result<Runtime, String> = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("club-timeline-ffi")
        .build()
        .map_err(|e| e.to_string());
}

/// Run an async future to completion on the shared Tokio runtime.
/// Must not be called from inside another runtime.
pub fn block_on_async<F, T, E>(future: F) -> FFIResult<T>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: Into<FFIError>,
{
    let rt = RUNTIME
        .as_ref()
        .map_err(|e| FFIError::internal(format!("Failed to create Tokio runtime: {}", e)))?;
    rt.block_on(future).map_err(Into::into)
}

/// Ensure pointer is not null
macro_rules! ensure_ptr {
    ($ptr:expr) => {
        if $ptr.is_null() {
            return Err($crate::ffi::error::FFIError::new(
                $crate::ffi::error::ErrorCode::NullPointer,
                concat!("null pointer: ", stringify!($ptr)),
            ));
        }
    };
}
pub(crate) use ensure_ptr;

/// Borrow a C string as UTF-8
///
/// # Safety
/// `ptr` must be non-null and point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn c_str<'a>(ptr: *const c_char) -> FFIResult<&'a str> {
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FFIError::new(ErrorCode::InvalidUtf8, "utf8"))
}

/// Decode a JSON payload from a C string
///
/// # Safety
/// Same contract as [`c_str`].
pub(crate) unsafe fn parse_payload<T: DeserializeOwned>(ptr: *const c_char) -> FFIResult<T> {
    let json = unsafe { c_str(ptr) }?;
    serde_json::from_str(json).map_err(|e| FFIError::invalid_argument(&format!("json {e}")))
}

/// Serialize `value` and hand it to the caller through `result`
///
/// # Safety
/// `result` must be non-null and valid for writes.
pub(crate) unsafe fn write_json<T: Serialize>(result: *mut *mut c_char, value: &T) -> FFIResult<()> {
    let json = serde_json::to_string(value).map_err(|e| FFIError::internal(format!("ser {e}")))?;
    let cstr = CString::new(json)?;
    unsafe { *result = cstr.into_raw() };
    Ok(())
}

/// Error handling helper for FFI boundaries (returns error code)
pub fn handle_status_result<F>(func: F) -> c_int
where
    F: FnOnce() -> FFIResult<()>,
{
    match func() {
        Ok(_) => {
            error::clear_last_error();
            ErrorCode::Success as c_int
        }
        Err(e) => {
            log::error!(
                "[Rust FFI Error] Code: {:?}, Message: {}, Details: {}",
                e.code,
                e.message,
                e.details.as_deref().unwrap_or("None")
            );
            error::set_last_error(&e);
            e.code as c_int
        }
    }
}

/// Handles results for FFI functions that return data, serializing Ok(T) or Err(FFIError) to JSON.
/// Returns a pointer to a C string (must be freed by the caller).
pub fn handle_json_result<F, T>(func: F) -> *mut c_char
where
    F: FnOnce() -> FFIResult<T>,
    T: Serialize,
{
    let json_string = match func() {
        Ok(value) => serde_json::to_string(&value),
        Err(ffi_error) => {
            error::set_last_error(&ffi_error);
            serde_json::to_string(&ffi_error)
        }
    };

    let final_json = json_string.unwrap_or_else(|e| {
        log::error!("[Rust FFI Error] Serialization failed: {}", e);
        serde_json::json!({
            "code": ErrorCode::InternalError,
            "message": format!("Failed to serialize result: {}", e),
            "details": null,
        })
        .to_string()
    });

    match CString::new(final_json) {
        Ok(c_string) => c_string.into_raw(),
        Err(e) => {
            log::error!("[Rust FFI Error] Failed to create CString: {}", e);
            std::ptr::null_mut()
        }
    }
}
