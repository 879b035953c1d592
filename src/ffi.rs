//! FFI bindings for Mind City Flux
//!
//! C-compatible entry points for embedding the feedback engine in the display
//! layer. Strings are null-terminated UTF-8. Returned strings are allocated here
//! and must be released with `mindcity_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::{assess_summary, FeedbackProcessor};
use crate::tracker::DEFAULT_SUMMARY_INTERVAL;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Caller frees the result with `mindcity_free_string`
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => {
            set_last_error("Output contained an interior NUL byte");
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Assess one summary payload and return the assessment JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `mindcity_free_string`.
/// - Returns NULL on error; call `mindcity_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mindcity_assess_summary(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    match assess_summary(json_str) {
        Ok(assessment) => string_to_cstr(&assessment),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a FeedbackProcessor
pub struct FeedbackProcessorHandle {
    processor: FeedbackProcessor,
}

/// Create a processor summarizing every `summary_interval` samples.
///
/// A non-positive interval selects the default of 50.
///
/// # Safety
/// - Returns a pointer that must be freed with `mindcity_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn mindcity_processor_new(summary_interval: i32) -> *mut FeedbackProcessorHandle {
    clear_last_error();

    let interval = if summary_interval <= 0 {
        DEFAULT_SUMMARY_INTERVAL
    } else {
        summary_interval as usize
    };

    let handle = Box::new(FeedbackProcessorHandle {
        processor: FeedbackProcessor::with_interval(interval),
    });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a pointer returned by `mindcity_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mindcity_processor_free(processor: *mut FeedbackProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Handle one wire message.
///
/// Returns the assessment JSON for a summary message. Returns NULL both on error
/// and for real-time frames; `mindcity_last_error` is NULL in the latter case.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mindcity_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - A non-NULL result must be freed with `mindcity_free_string`.
#[no_mangle]
pub unsafe extern "C" fn mindcity_processor_process_message(
    processor: *mut FeedbackProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    match handle.processor.process_message_json(&json_str) {
        Ok(Some(assessment)) => string_to_cstr(&assessment),
        Ok(None) => ptr::null_mut(),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Save tracker state to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mindcity_processor_new`.
/// - Returns a newly allocated string that must be freed with `mindcity_free_string`.
/// - Returns NULL on error; call `mindcity_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mindcity_processor_save_tracker(
    processor: *mut FeedbackProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    match handle.processor.save_tracker() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load tracker state from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mindcity_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error (see `mindcity_last_error`).
#[no_mangle]
pub unsafe extern "C" fn mindcity_processor_load_tracker(
    processor: *mut FeedbackProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return -1;
    };

    match handle.processor.load_tracker(&json_str) {
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

/// Free a string returned by this library.
///
/// # Safety
/// - `ptr` must be a pointer returned by a `mindcity_*` function, or NULL.
#[no_mangle]
pub unsafe extern "C" fn mindcity_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message for this thread.
///
/// # Safety
/// - The pointer is valid until the next `mindcity_*` call on this thread.
/// - Do NOT free the returned pointer. Returns NULL if the last call succeeded.
#[no_mangle]
pub unsafe extern "C" fn mindcity_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn mindcity_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"{
        "metrics": {
            "engagement_index": 0.55,
            "arousal_index": 0.3,
            "frustration_index": 0.2,
            "mindfulness_index": 22.5
        },
        "mental_state": {
            "relaxation": "high",
            "concentration": "medium",
            "calm": "high",
            "engagement": "high",
            "arousal": "low",
            "frustration": "low",
            "mindfulness": "high"
        },
        "timestamp": 1705327200.0
    }"#;

    fn uniform_metrics_message(value: f64) -> CString {
        CString::new(format!(
            r#"{{"type": "summary", "data": {{"metrics": {{"engagement_index": {value}, "arousal_index": {value}, "frustration_index": {value}, "mindfulness_index": {value}}}, "mental_state": {{"relaxation": "low", "concentration": "low", "calm": "low", "engagement": "low", "arousal": "low", "frustration": "low", "mindfulness": "low"}}}}}}"#
        ))
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        mindcity_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_assess_summary() {
        let json = CString::new(SUMMARY).unwrap();

        unsafe {
            let result = take_string(mindcity_assess_summary(json.as_ptr()));
            let value: serde_json::Value = serde_json::from_str(&result).unwrap();

            assert_eq!(value["verdict"]["reason"], "relaxed");
            assert!(mindcity_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = mindcity_processor_new(0);
            assert!(!processor.is_null());

            let realtime =
                CString::new(r#"{"type": "real_time", "data": {"timestamp": 1.0, "channels": {}}}"#)
                    .unwrap();
            let ignored = mindcity_processor_process_message(processor, realtime.as_ptr());
            assert!(ignored.is_null());
            assert!(mindcity_last_error().is_null());

            let summary = uniform_metrics_message(0.1);
            let assessment =
                take_string(mindcity_processor_process_message(processor, summary.as_ptr()));
            assert!(assessment.contains("disinterested"));

            let state = mindcity_processor_save_tracker(processor);
            assert!(!state.is_null());

            let processor2 = mindcity_processor_new(10);
            assert_eq!(mindcity_processor_load_tracker(processor2, state), 0);

            mindcity_free_string(state);
            mindcity_processor_free(processor);
            mindcity_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            let result = mindcity_assess_summary(invalid.as_ptr());
            assert!(result.is_null());

            let error = mindcity_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.starts_with("Invalid JSON"));

            assert!(mindcity_processor_process_message(ptr::null_mut(), invalid.as_ptr()).is_null());
            let error_str = CStr::from_ptr(mindcity_last_error()).to_str().unwrap();
            assert_eq!(error_str, "Null processor pointer");
        }
    }

    #[test]
    fn test_ffi_load_tracker_rejects_zero_interval() {
        unsafe {
            let processor = mindcity_processor_new(3);
            let state = CString::new(r#"{"window":[],"interval":0,"iterations":0}"#).unwrap();

            assert_eq!(mindcity_processor_load_tracker(processor, state.as_ptr()), -1);
            let error_str = CStr::from_ptr(mindcity_last_error()).to_str().unwrap();
            assert!(error_str.contains("interval must be at least 1"));

            // Processor still usable after the rejected load
            let summary = uniform_metrics_message(0.1);
            let assessment =
                take_string(mindcity_processor_process_message(processor, summary.as_ptr()));
            assert!(assessment.contains("disinterested"));

            mindcity_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = CStr::from_ptr(mindcity_version()).to_str().unwrap();
            assert_eq!(version, env!("CARGO_PKG_VERSION"));
        }
    }
}
