//! FFI bindings for sleep quality prediction
//!
//! This module provides C-compatible functions for calling the predictor from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `sleepq_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::PredictorConfig;
use crate::pipeline::Predictor;
use crate::record::PredictionEncoder;
use crate::schema::{FeatureSchema, SchemaId};

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
// Predictor API
// ============================================================================

/// Opaque handle to a loaded predictor
pub struct SleepqPredictorHandle {
    predictor: Predictor,
    encoder: PredictionEncoder,
}

/// Load a predictor from a JSON configuration.
///
/// The configuration has the same shape as the CLI's `--config` file.
/// Relative artifact paths resolve against the process working directory.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string.
/// - Returns a pointer that must be freed with `sleepq_predictor_free`.
/// - Returns NULL on error; call `sleepq_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepq_predictor_new(
    config_json: *const c_char,
) -> *mut SleepqPredictorHandle {
    clear_last_error();

    let json_str = match cstr_to_string(config_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        }
    };

    let predictor = match PredictorConfig::from_json(&json_str)
        .and_then(|config| Predictor::from_config(&config))
    {
        Ok(predictor) => predictor,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let handle = Box::new(SleepqPredictorHandle {
        predictor,
        encoder: PredictionEncoder::new(),
    });
    Box::into_raw(handle)
}

/// Free a predictor.
///
/// # Safety
/// - `predictor` must be a valid pointer returned by `sleepq_predictor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepq_predictor_free(predictor: *mut SleepqPredictorHandle) {
    if !predictor.is_null() {
        drop(Box::from_raw(predictor));
    }
}

/// Predict sleep quality for one JSON object of input attributes.
///
/// Returns the prediction record as JSON.
///
/// # Safety
/// - `predictor` must be a valid pointer returned by `sleepq_predictor_new`.
/// - `inputs_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sleepq_free_string`.
/// - Returns NULL on error; call `sleepq_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepq_predict(
    predictor: *const SleepqPredictorHandle,
    inputs_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if predictor.is_null() {
        set_last_error("Null predictor pointer");
        return ptr::null_mut();
    }

    let handle = &*predictor;

    let json_str = match cstr_to_string(inputs_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = handle
        .predictor
        .predict_json(&json_str)
        .and_then(|prediction| handle.encoder.encode_to_json(&prediction));

    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get a built-in feature schema as JSON.
///
/// # Safety
/// - `schema_id` must be a valid null-terminated C string such as `lifestyle.v1`.
/// - Returns a newly allocated string that must be freed with `sleepq_free_string`.
/// - Returns NULL on error; call `sleepq_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sleepq_schema_json(schema_id: *const c_char) -> *mut c_char {
    clear_last_error();

    let id_str = match cstr_to_string(schema_id) {
        Some(s) => s,
        None => {
            set_last_error("Invalid schema id string pointer");
            return ptr::null_mut();
        }
    };

    let result = id_str
        .parse::<SchemaId>()
        .and_then(|id| FeatureSchema::builtin(id).to_json());

    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by sleepq functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a sleepq function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sleepq_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next sleepq function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn sleepq_last_error() -> *const c_char {
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
pub unsafe extern "C" fn sleepq_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::tests::stress_classifier;
    use crate::model::ClassifierArtifact;
    use std::ffi::CString;
    use std::fs;

    /// Write a lifestyle model to a temp dir and return a config JSON for it
    fn config_json(dir: &tempfile::TempDir) -> CString {
        let schema = FeatureSchema::builtin(SchemaId::LifestyleV1);
        let artifact = ClassifierArtifact::LogisticRegression(stress_classifier(&schema));
        let model_path = dir.path().join("model.json");
        fs::write(&model_path, serde_json::to_string(&artifact).unwrap()).unwrap();

        let config = serde_json::json!({
            "schema": "lifestyle.v1",
            "classifier_path": model_path,
        });
        CString::new(config.to_string()).unwrap()
    }

    fn inputs_json() -> CString {
        CString::new(
            r#"{"age": 25, "gender": "Male", "screen_time": 3.5, "exercise": 30,
                "stress": 5, "caffeine": 100, "noise": 35}"#,
        )
        .unwrap()
    }

    unsafe fn last_error() -> String {
        let err = sleepq_last_error();
        assert!(!err.is_null());
        CStr::from_ptr(err).to_str().unwrap().to_string()
    }

    #[test]
    fn test_ffi_predict() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_json(&dir);
        let inputs = inputs_json();

        unsafe {
            let predictor = sleepq_predictor_new(config.as_ptr());
            assert!(!predictor.is_null());

            let result = sleepq_predict(predictor, inputs.as_ptr());
            assert!(!result.is_null());

            let json = CStr::from_ptr(result).to_str().unwrap();
            let record: serde_json::Value = serde_json::from_str(json).unwrap();
            assert_eq!(record["label"], "Moderate");
            assert_eq!(record["class_code"], 1);
            assert_eq!(record["features"]["StressLevel"], 1.0);
            assert_eq!(record["producer"]["name"], crate::PRODUCER_NAME);

            sleepq_free_string(result);
            sleepq_predictor_free(predictor);
        }
    }

    #[test]
    fn test_ffi_rejects_invalid_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_json(&dir);
        let inputs = CString::new(
            r#"{"age": 25, "gender": "Male", "screen_time": 3.5, "exercise": 30,
                "stress": 15, "caffeine": 100, "noise": 35}"#,
        )
        .unwrap();

        unsafe {
            let predictor = sleepq_predictor_new(config.as_ptr());
            assert!(!predictor.is_null());

            let result = sleepq_predict(predictor, inputs.as_ptr());
            assert!(result.is_null());
            assert!(last_error().contains("stress"));

            sleepq_predictor_free(predictor);
        }
    }

    #[test]
    fn test_ffi_missing_artifact() {
        let config = CString::new(r#"{"classifier_path": "/nonexistent/model.json"}"#).unwrap();

        unsafe {
            let predictor = sleepq_predictor_new(config.as_ptr());
            assert!(predictor.is_null());
            assert!(last_error().contains("/nonexistent/model.json"));
        }
    }

    #[test]
    fn test_ffi_null_pointers() {
        let inputs = inputs_json();

        unsafe {
            assert!(sleepq_predictor_new(ptr::null()).is_null());
            assert!(sleepq_predict(ptr::null(), inputs.as_ptr()).is_null());
            assert_eq!(last_error(), "Null predictor pointer");

            // Freeing NULL is a no-op
            sleepq_predictor_free(ptr::null_mut());
            sleepq_free_string(ptr::null_mut());
        }
    }

    #[test]
    fn test_ffi_schema_json() {
        let id = CString::new("health.v1").unwrap();
        let bogus = CString::new("health.v9").unwrap();

        unsafe {
            let result = sleepq_schema_json(id.as_ptr());
            assert!(!result.is_null());
            let json = CStr::from_ptr(result).to_str().unwrap();
            let schema = FeatureSchema::from_json(json).unwrap();
            assert_eq!(schema, FeatureSchema::builtin(SchemaId::HealthV1));
            sleepq_free_string(result);

            assert!(sleepq_schema_json(bogus.as_ptr()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = CStr::from_ptr(sleepq_version()).to_str().unwrap();
            assert_eq!(version, env!("CARGO_PKG_VERSION"));
        }
    }
}
