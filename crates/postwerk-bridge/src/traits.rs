// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.
//
// A bridge value stands for one foreground context: holding one means there
// is something to launch the chooser from.

use postwerk_core::error::Result;
use postwerk_core::types::{ChooserRequest, ContentUri};

/// Unified bridge that groups everything the composer needs from the OS.
pub trait PlatformBridge: NativeDeviceInfo + NativeFileSharing + NativeEmailChooser + Send + Sync {
    /// Human-readable platform name (e.g. "Android").
    fn platform_name(&self) -> &str;
}

/// Facts about the running OS and application.
pub trait NativeDeviceInfo {
    /// OS API level (Android `Build.VERSION.SDK_INT`).
    fn sdk_int(&self) -> Result<u32>;

    /// Application package name, used to build the file-provider authority.
    fn package_name(&self) -> Result<String>;
}

/// Share local files with other apps without exposing raw paths.
pub trait NativeFileSharing {
    /// Content reference for `path`, served by the provider registered under
    /// `authority`. The receiving app is granted read access at launch.
    fn uri_for_file(&self, authority: &str, path: &str) -> Result<ContentUri>;
}

/// Present the compose action through the OS app chooser.
pub trait NativeEmailChooser {
    /// Whether any installed app can handle the chooser.
    fn resolves(&self, chooser: &ChooserRequest) -> Result<bool>;

    /// Launch the chooser. Returns once the OS has taken it; the user's
    /// return is reported later under `chooser.request_code`.
    fn start_chooser(&self, chooser: &ChooserRequest) -> Result<()>;
}
