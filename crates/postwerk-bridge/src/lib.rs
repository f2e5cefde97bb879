// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Postwerk native platform bridge abstractions.
//!
//! Defines the traits the composer needs from the host OS (device info,
//! file sharing, chooser launch) and the per-platform implementations behind
//! them. Android goes through JNI; other targets get a stub so the rest of
//! the workspace builds and tests on desktop/CI.

pub mod dry_run;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod stub;

/// Bridge for the current foreground context, if one exists.
///
/// RETURNS: `None` when no activity is hosting the native code, which the
/// composer reports as a failed precondition.
pub fn platform_bridge() -> Option<Box<dyn traits::PlatformBridge>> {
    #[cfg(target_os = "android")]
    {
        // Android: uses `jni-rs` to invoke methods on the hosting Activity.
        android::AndroidBridge::attach().map(|b| Box::new(b) as Box<dyn traits::PlatformBridge>)
    }
    #[cfg(not(target_os = "android"))]
    {
        // DESKTOP/CI: a stub that refuses every platform call.
        Some(Box::new(stub::StubBridge))
    }
}
