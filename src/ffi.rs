//! C ABI bridge for GUI front ends
//!
//! Exposes the engine through an opaque handle. All returned strings are
//! JSON-encoded and must be freed with `spacesweep_free_string`.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use crate::api::Engine;
use crate::common::config::Tier;
use crate::common::errors::ScanError;
use crate::scanner::targets::{ScanItem, ScanSummary};
use crate::scanner::{ScanHandle, ScanProgress};

/// Progress hook: percentage, phase label, items scanned, caller data
pub type ProgressCallback =
    extern "C" fn(percentage: u8, label: *const c_char, items_scanned: u64, user_data: *mut c_void);

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Convert a Rust string to a C string pointer. Caller must free with `spacesweep_free_string`.
fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Convert a JSON-serializable value to a C string pointer.
fn json_to_c<T: serde::Serialize>(val: &T) -> *mut c_char {
    match serde_json::to_string(val) {
        Ok(s) => to_c_string(&s),
        Err(e) => error_c(&format!("serialization failed: {}", e)),
    }
}

/// Return an error JSON as a C string.
fn error_c(msg: &str) -> *mut c_char {
    let val = serde_json::json!({ "error": msg });
    to_c_string(&val.to_string())
}

/// Borrow a C string argument, `None` when null or not UTF-8
fn c_str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn engine_ref<'a>(engine: *const Engine) -> Option<&'a Engine> {
    unsafe { engine.as_ref() }
}

// ─── Memory Management ──────────────────────────────────────────────────────

/// Free a string returned by any spacesweep FFI function.
#[no_mangle]
pub extern "C" fn spacesweep_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

/// Create an engine from the on-disk config. Null if the config is invalid.
#[no_mangle]
pub extern "C" fn spacesweep_engine_new() -> *mut Engine {
    match Engine::load() {
        Ok(engine) => Box::into_raw(Box::new(engine)),
        Err(e) => {
            tracing::error!(error = %e, "failed to create engine");
            std::ptr::null_mut()
        }
    }
}

/// Destroy an engine. No scan may be running on it.
#[no_mangle]
pub extern "C" fn spacesweep_engine_free(engine: *mut Engine) {
    if !engine.is_null() {
        unsafe {
            drop(Box::from_raw(engine));
        }
    }
}

// ─── Scan ────────────────────────────────────────────────────────────────────

fn parse_tier(tier: *const c_char) -> Result<Tier, String> {
    match c_str_arg(tier) {
        None | Some("restricted") => Ok(Tier::Restricted),
        Some("full") => Ok(Tier::Full),
        Some(other) => Err(format!("unknown tier '{}'", other)),
    }
}

fn forward_progress(callback: Option<ProgressCallback>, user_data: *mut c_void, progress: &ScanProgress) {
    if let Some(cb) = callback {
        let label = CString::new(progress.label.as_str()).unwrap_or_default();
        cb(
            progress.percentage,
            label.as_ptr(),
            progress.items_scanned as u64,
            user_data,
        );
    }
}

fn scan_outcome_c(result: Result<ScanSummary, ScanError>) -> *mut c_char {
    match result {
        Ok(summary) => json_to_c(&serde_json::json!({
            "status": "completed",
            "summary": summary,
        })),
        Err(ScanError::Cancelled { completed_phases }) => json_to_c(&serde_json::json!({
            "status": "cancelled",
            "completedPhases": completed_phases,
        })),
        Err(e) => error_c(&e.to_string()),
    }
}

/// Run a scan on the calling thread. `tier` is "restricted" or "full"
/// (null means restricted). Returns `{"status":"completed","summary":..}`,
/// `{"status":"cancelled",..}` or `{"error":..}`.
///
/// A cancel that arrives before this call has started the run is
/// discarded. Callers that cancel from another thread should use
/// `spacesweep_scan_spawn` and `spacesweep_scan_wait` instead.
#[no_mangle]
pub extern "C" fn spacesweep_scan(
    engine: *const Engine,
    tier: *const c_char,
    callback: Option<ProgressCallback>,
    user_data: *mut c_void,
) -> *mut c_char {
    let Some(engine) = engine_ref(engine) else {
        return error_c("engine is required");
    };
    let tier = match parse_tier(tier) {
        Ok(tier) => tier,
        Err(msg) => return error_c(&msg),
    };

    scan_outcome_c(engine.start_scan(tier, None, |progress| {
        forward_progress(callback, user_data, progress)
    }))
}

/// Start a scan on a worker thread. The run is live once this returns,
/// so any later `spacesweep_cancel` ends it as cancelled. Null when the
/// tier is unknown or already scanning. Pass the handle to
/// `spacesweep_scan_wait` exactly once.
#[no_mangle]
pub extern "C" fn spacesweep_scan_spawn(engine: *const Engine, tier: *const c_char) -> *mut ScanHandle {
    let Some(engine) = engine_ref(engine) else {
        return std::ptr::null_mut();
    };
    let Ok(tier) = parse_tier(tier) else {
        return std::ptr::null_mut();
    };

    match engine.spawn_scan(tier, None) {
        Ok(handle) => Box::into_raw(Box::new(handle)),
        Err(e) => {
            tracing::warn!(error = %e, "failed to spawn scan");
            std::ptr::null_mut()
        }
    }
}

/// Block until a spawned scan ends, delivering progress to `callback` on
/// the calling thread. Consumes the handle; the result JSON matches
/// `spacesweep_scan`.
#[no_mangle]
pub extern "C" fn spacesweep_scan_wait(
    handle: *mut ScanHandle,
    callback: Option<ProgressCallback>,
    user_data: *mut c_void,
) -> *mut c_char {
    if handle.is_null() {
        return error_c("scan handle is required");
    }
    let handle = unsafe { Box::from_raw(handle) };

    for progress in handle.progress().iter() {
        forward_progress(callback, user_data, &progress);
    }
    scan_outcome_c(handle.join())
}

/// Request cancellation of any scan running on this engine.
#[no_mangle]
pub extern "C" fn spacesweep_cancel(engine: *const Engine) {
    if let Some(engine) = engine_ref(engine) {
        engine.cancel_scan();
    }
}

// ─── Clean ───────────────────────────────────────────────────────────────────

/// Clean a JSON array of scan items. Returns the cleanup result as JSON.
#[no_mangle]
pub extern "C" fn spacesweep_clean_items(
    engine: *const Engine,
    items_json: *const c_char,
    dry_run: bool,
) -> *mut c_char {
    let Some(engine) = engine_ref(engine) else {
        return error_c("engine is required");
    };
    let Some(items_json) = c_str_arg(items_json) else {
        return error_c("items_json is required");
    };

    let items: Vec<ScanItem> = match serde_json::from_str(items_json) {
        Ok(items) => items,
        Err(e) => return error_c(&format!("invalid items: {}", e)),
    };

    json_to_c(&engine.clean_items(&items, dry_run))
}

// ─── Info ────────────────────────────────────────────────────────────────────

#[no_mangle]
pub extern "C" fn spacesweep_system_info(engine: *const Engine) -> *mut c_char {
    match engine_ref(engine) {
        Some(engine) => json_to_c(&engine.system_info()),
        None => error_c("engine is required"),
    }
}

#[no_mangle]
pub extern "C" fn spacesweep_version() -> *mut c_char {
    to_c_string(env!("CARGO_PKG_VERSION"))
}
