// src/ffi/core.rs
// ============================================================================
// Core FFI functions for library initialization and management
// ============================================================================

use crate::ffi::{handle_status_result, error::FFIError};
use std::ffi::{c_char, CStr, CString};
use std::os::raw::c_int;

/// Initialize the library against a SQLite database URL
/// Returns 0 on success, non-zero on error
#[unsafe(no_mangle)]
pub unsafe extern "C" fn initialize_library(db_url: *const c_char) -> c_int {
    let result = std::panic::catch_unwind(|| {
        if db_url.is_null() {
            return Err(FFIError::invalid_argument("Null pointer provided for initialization"));
        }

        let db_url_str = match unsafe { CStr::from_ptr(db_url) }.to_str() {
            Ok(s) => s.to_string(),
            Err(_) => return Err(FFIError::invalid_argument("Invalid db_url string")),
        };

        // Validate that we received a proper SQLite URL, not a file path
        if !db_url_str.starts_with("sqlite:") {
            return Err(FFIError::invalid_argument(
                "db_url must be a SQLite URL starting with 'sqlite:', not a file path"
            ));
        }

        crate::ffi::block_on_async(async { crate::initialize(&db_url_str).await })
    });

    match result {
        Ok(ffi_result) => {
            handle_status_result(|| ffi_result)
        }
        Err(panic_payload) => {
            let panic_msg = if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_payload.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Panicked during FFI call, but panic message is not a string".to_string()
            };
            log::error!("[Rust FFI Panic] in initialize_library: {}", panic_msg);
            handle_status_result(|| Err(FFIError::internal(format!("Panic during initialization: {}", panic_msg))))
        }
    }
}

/// Whether `initialize_library` has completed successfully
#[unsafe(no_mangle)]
pub extern "C" fn is_library_initialized() -> bool {
    crate::globals::is_initialized()
}

/// Frees a C string that was allocated by Rust and passed over FFI.
/// This function should be called by the host for any string
/// that was created in Rust using `CString::into_raw()`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        // Takes ownership of the CString and drops it
        let _ = unsafe { CString::from_raw(ptr) };
    }
}

/// Get library version
/// Returns allocated string that must be freed with free_string()
#[unsafe(no_mangle)]
pub extern "C" fn get_library_version() -> *mut c_char {
    CString::new(env!("CARGO_PKG_VERSION")).map_or(std::ptr::null_mut(), |cs| cs.into_raw())
}

/// Get last error of the calling thread as JSON
/// Returns allocated string that must be freed with free_string(), or null if no error
#[unsafe(no_mangle)]
pub extern "C" fn get_last_error() -> *mut c_char {
    crate::ffi::error::get_last_error_message()
}
