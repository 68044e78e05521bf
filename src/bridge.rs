//! Session registry for host applications (Android via JNI, or any embedder).
//!
//! Each handle owns an independent [`EmotionSession`]; the registry mutex
//! serializes frame processing so a session's window is never mutated
//! concurrently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};

use lazy_static::lazy_static;
use serde_json::json;
use tracing::{info, warn};

use crate::config::EmotionConfig;
use crate::core::EmotionSession;
use crate::error::{EmotionError, Result};

lazy_static! {
    static ref SESSIONS: Mutex<HashMap<i64, EmotionSession>> = Mutex::new(HashMap::new());
}

// Handle 0 is reserved for "creation failed".
static NEXT_HANDLE: AtomicI64 = AtomicI64::new(1);

pub fn create_session(config: EmotionConfig) -> i64 {
    let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
    SESSIONS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(handle, EmotionSession::new(config));
    info!(handle, "session created");
    handle
}

/// Empty input means the default configuration.
pub fn create_session_from_json(config_json: &str) -> Result<i64> {
    let config = if config_json.trim().is_empty() {
        EmotionConfig::default()
    } else {
        EmotionConfig::from_json_str(config_json)?
    };
    Ok(create_session(config))
}

pub fn with_session<T>(handle: i64, f: impl FnOnce(&mut EmotionSession) -> T) -> Result<T> {
    let mut sessions = SESSIONS.lock().unwrap_or_else(PoisonError::into_inner);
    let session = sessions
        .get_mut(&handle)
        .ok_or(EmotionError::UnknownSession(handle))?;
    Ok(f(session))
}

pub fn start_session(handle: i64) -> Result<()> {
    with_session(handle, EmotionSession::start)
}

pub fn stop_session(handle: i64) -> Result<()> {
    with_session(handle, EmotionSession::stop)
}

pub fn set_paused(handle: i64, paused: bool) -> Result<()> {
    with_session(handle, |s| if paused { s.pause() } else { s.resume() })
}

pub fn set_debug(handle: i64, enabled: bool) -> Result<()> {
    with_session(handle, |s| s.set_debug(enabled))
}

pub fn destroy_session(handle: i64) -> bool {
    let removed = SESSIONS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&handle)
        .is_some();
    if removed {
        info!(handle, "session destroyed");
    }
    removed
}

/// Processes one flat `[x, y, z, ...]` frame and returns JSON for the renderer:
/// a serialized `FrameReport`, `{"status":"skipped"}` when the session is not
/// running, or `{"status":"error"}` carrying the last good result.
pub fn process_frame_json(handle: i64, coords: &[f32]) -> String {
    let outcome = with_session(handle, |s| {
        let result = s.process_flat(coords);
        (result, s.last_result())
    });

    let response = match outcome {
        Ok((Ok(Some(report)), _)) => return report.to_json(),
        Ok((Ok(None), _)) => json!({ "status": "skipped" }),
        Ok((Err(e), last)) => json!({
            "status": "error",
            "message": e.to_string(),
            "last_result": last,
        }),
        Err(e) => {
            warn!(handle, error = %e, "frame for unknown session");
            json!({ "status": "error", "message": e.to_string() })
        }
    };
    response.to_string()
}

mod jni_exports {
    use jni::objects::{JClass, JFloatArray, JString};
    use jni::sys::{jboolean, jlong, jstring, JNI_FALSE, JNI_TRUE};
    use jni::JNIEnv;
    use tracing::warn;

    use super::*;

    fn log_failure(op: &str, result: Result<()>) {
        if let Err(e) = result {
            warn!(op, error = %e, "bridge call failed");
        }
    }

    #[no_mangle]
    pub extern "system" fn Java_com_example_recemotion_MainActivity_nativeCreateSession<'local>(
        mut env: JNIEnv<'local>,
        _class: JClass<'local>,
        config_json: JString<'local>,
    ) -> jlong {
        let raw: String = match env.get_string(&config_json) {
            Ok(s) => s.into(),
            Err(e) => {
                warn!(error = %e, "could not read config string");
                return 0;
            }
        };
        create_session_from_json(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "session creation failed");
            0
        })
    }

    #[no_mangle]
    pub extern "system" fn Java_com_example_recemotion_MainActivity_nativeStartSession(
        _env: JNIEnv,
        _class: JClass,
        handle: jlong,
    ) {
        log_failure("start", start_session(handle));
    }

    #[no_mangle]
    pub extern "system" fn Java_com_example_recemotion_MainActivity_nativeStopSession(
        _env: JNIEnv,
        _class: JClass,
        handle: jlong,
    ) {
        log_failure("stop", stop_session(handle));
    }

    #[no_mangle]
    pub extern "system" fn Java_com_example_recemotion_MainActivity_nativeSetPaused(
        _env: JNIEnv,
        _class: JClass,
        handle: jlong,
        paused: jboolean,
    ) {
        log_failure("pause", set_paused(handle, paused != JNI_FALSE));
    }

    #[no_mangle]
    pub extern "system" fn Java_com_example_recemotion_MainActivity_nativeSetDebug(
        _env: JNIEnv,
        _class: JClass,
        handle: jlong,
        enabled: jboolean,
    ) {
        log_failure("debug", set_debug(handle, enabled != JNI_FALSE));
    }

    #[no_mangle]
    pub extern "system" fn Java_com_example_recemotion_MainActivity_nativeDestroySession(
        _env: JNIEnv,
        _class: JClass,
        handle: jlong,
    ) -> jboolean {
        if destroy_session(handle) {
            JNI_TRUE
        } else {
            JNI_FALSE
        }
    }

    /// `coords` is the flat Face Mesh output; an empty array means no face.
    #[no_mangle]
    pub extern "system" fn Java_com_example_recemotion_MainActivity_nativeProcessLandmarks<'local>(
        mut env: JNIEnv<'local>,
        _class: JClass<'local>,
        handle: jlong,
        coords: JFloatArray<'local>,
    ) -> jstring {
        let response = match read_floats(&mut env, &coords) {
            Ok(buf) => process_frame_json(handle, &buf),
            Err(e) => json!({ "status": "error", "message": e.to_string() }).to_string(),
        };
        match env.new_string(response) {
            Ok(s) => s.into_raw(),
            Err(e) => {
                warn!(error = %e, "could not allocate result string");
                std::ptr::null_mut()
            }
        }
    }

    fn read_floats(env: &mut JNIEnv, coords: &JFloatArray) -> jni::errors::Result<Vec<f32>> {
        let len = env.get_array_length(coords)?;
        let mut buf = vec![0.0f32; usize::try_from(len).unwrap_or(0)];
        env.get_float_array_region(coords, 0, &mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facs::fixtures::{face, flat, FaceShape};

    #[test]
    fn test_session_lifecycle_through_registry() {
        let handle = create_session(EmotionConfig::responsive());
        let frame = flat(&face(&FaceShape::happy()));

        let skipped: serde_json::Value =
            serde_json::from_str(&process_frame_json(handle, &frame)).unwrap();
        assert_eq!(skipped["status"], "skipped");

        start_session(handle).unwrap();
        let report: serde_json::Value =
            serde_json::from_str(&process_frame_json(handle, &frame)).unwrap();
        assert_eq!(report["emotion"]["label"], "Happy");

        let error: serde_json::Value =
            serde_json::from_str(&process_frame_json(handle, &[0.5; 30])).unwrap();
        assert_eq!(error["status"], "error");
        assert_eq!(error["last_result"]["label"], "Happy");

        assert!(destroy_session(handle));
        assert!(!destroy_session(handle));
    }

    #[test]
    fn test_sessions_are_independent() {
        let a = create_session(EmotionConfig::default());
        let b = create_session(EmotionConfig::default());
        start_session(a).unwrap();
        start_session(b).unwrap();

        process_frame_json(a, &flat(&face(&FaceShape::happy())));
        let len_a = with_session(a, |s| s.window().len()).unwrap();
        let len_b = with_session(b, |s| s.window().len()).unwrap();
        assert_eq!((len_a, len_b), (1, 0));

        set_debug(b, true).unwrap();
        assert!(with_session(b, |s| s.debug_overlay()).unwrap());
        set_paused(b, true).unwrap();
        assert!(!with_session(b, |s| s.is_running()).unwrap());

        destroy_session(a);
        destroy_session(b);
    }

    #[test]
    fn test_unknown_handle() {
        assert!(matches!(start_session(-7), Err(EmotionError::UnknownSession(-7))));
        let out: serde_json::Value = serde_json::from_str(&process_frame_json(-7, &[])).unwrap();
        assert_eq!(out["status"], "error");
    }

    #[test]
    fn test_create_from_json() {
        let handle = create_session_from_json("").unwrap();
        assert!(handle > 0);
        destroy_session(handle);
        assert!(create_session_from_json(r#"{"smoothing":{"capacity":0}}"#).is_err());
    }
}
