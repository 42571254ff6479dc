//! FFI bindings for Mastery Zone
//!
//! This module provides C-compatible functions for driving a controller from other
//! languages. Returned strings are allocated and must be freed by the caller using
//! `zpd_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::encoder::UpdateEncoder;
use crate::pipeline::{compute_performance, ZoneProcessor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute recency-weighted performance over `len` doubles.
///
/// # Safety
/// - `scores` must point to `len` readable doubles, or be NULL when `len` is 0.
/// - Returns NaN on error; call `zpd_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn zpd_compute_performance(scores: *const f64, len: usize) -> f64 {
    clear_last_error();

    let history: &[f64] = if len == 0 {
        &[]
    } else if scores.is_null() {
        set_last_error("Null scores pointer");
        return f64::NAN;
    } else {
        std::slice::from_raw_parts(scores, len)
    };

    match compute_performance(history) {
        Ok(performance) => performance,
        Err(e) => {
            set_last_error(&e.to_string());
            f64::NAN
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a ZoneProcessor
pub struct ZoneProcessorHandle {
    processor: ZoneProcessor,
    encoder: UpdateEncoder,
}

/// Create a new processor seeded with `initial_score`.
///
/// # Safety
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `zpd_processor_free`.
/// - Returns NULL if `initial_score` is outside `[1.0, 10.0]`.
#[no_mangle]
pub unsafe extern "C" fn zpd_processor_new(initial_score: f64) -> *mut ZoneProcessorHandle {
    clear_last_error();

    match ZoneProcessor::new(initial_score) {
        Ok(processor) => {
            let handle = Box::new(ZoneProcessorHandle {
                processor,
                encoder: UpdateEncoder::new(),
            });
            Box::into_raw(handle)
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `zpd_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn zpd_processor_free(processor: *mut ZoneProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Record one graded answer and return the update record as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `zpd_processor_new`.
/// - Returns a newly allocated string that must be freed with `zpd_free_string`.
/// - Returns NULL on error; call `zpd_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn zpd_processor_record_answer(
    processor: *mut ZoneProcessorHandle,
    answer_score: f64,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let event = match handle.processor.record_answer(answer_score) {
        Ok(event) => event,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match handle.encoder.encode_to_json(&event, None) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Current mastery-zone score of a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `zpd_processor_new`.
/// - Returns NaN for a NULL processor.
#[no_mangle]
pub unsafe extern "C" fn zpd_processor_current_score(
    processor: *const ZoneProcessorHandle,
) -> f64 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return f64::NAN;
    }

    (*processor).processor.current_score()
}

/// Save processor state to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `zpd_processor_new`.
/// - Returns a newly allocated string that must be freed with `zpd_free_string`.
/// - Returns NULL on error; call `zpd_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn zpd_processor_save_state(
    processor: *const ZoneProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.save_state() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load processor state from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `zpd_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error (state left unchanged).
/// - On error, call `zpd_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn zpd_processor_load_state(
    processor: *mut ZoneProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_state(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by zpd functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a zpd function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn zpd_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next zpd function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn zpd_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn zpd_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
